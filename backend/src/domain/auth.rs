//! Authorization predicate shared by every gated operation.
//!
//! Role checks live here and nowhere else so endpoint behavior cannot
//! drift.

use shared::User;

use crate::domain::error::{DomainError, DomainResult};

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_FACULTY: &str = "faculty";
pub const ROLE_STUDENT: &str = "student";

/// Whether the role set contains at least one of the required roles
pub fn has_any_role(roles: &[String], required: &[&str]) -> bool {
    roles.iter().any(|role| required.contains(&role.as_str()))
}

/// Gate an operation on role membership
pub fn require_any_role(caller: &User, required: &[&str]) -> DomainResult<()> {
    if has_any_role(&caller.roles, required) {
        Ok(())
    } else {
        Err(DomainError::forbidden(format!(
            "User does not have any of the required roles: {}",
            required.join(", ")
        )))
    }
}

/// Gate an operation on role membership or record ownership
pub fn require_any_role_or_owner(
    caller: &User,
    required: &[&str],
    owner_id: i64,
    what: &str,
) -> DomainResult<()> {
    if caller.id == owner_id || has_any_role(&caller.roles, required) {
        Ok(())
    } else {
        Err(DomainError::forbidden(format!(
            "Not enough permissions to access {}",
            what
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with_roles(id: i64, roles: &[&str]) -> User {
        User {
            id,
            email: format!("user{}@example.edu", id),
            full_name: None,
            is_active: true,
            roles: roles.iter().map(|r| r.to_string()).collect(),
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: None,
        }
    }

    #[test]
    fn test_has_any_role() {
        assert!(has_any_role(
            &["student".to_string(), "faculty".to_string()],
            &[ROLE_FACULTY, ROLE_ADMIN]
        ));
        assert!(!has_any_role(&["student".to_string()], &[ROLE_ADMIN]));
        assert!(!has_any_role(&[], &[ROLE_ADMIN]));
    }

    #[test]
    fn test_require_any_role() {
        let admin = user_with_roles(1, &[ROLE_ADMIN]);
        let student = user_with_roles(2, &[ROLE_STUDENT]);

        assert!(require_any_role(&admin, &[ROLE_ADMIN]).is_ok());
        assert!(matches!(
            require_any_role(&student, &[ROLE_ADMIN]),
            Err(DomainError::Forbidden(_))
        ));
    }

    #[test]
    fn test_owner_bypasses_role_requirement() {
        let student = user_with_roles(7, &[ROLE_STUDENT]);

        assert!(require_any_role_or_owner(&student, &[ROLE_ADMIN, ROLE_FACULTY], 7, "this receipt").is_ok());
        assert!(matches!(
            require_any_role_or_owner(&student, &[ROLE_ADMIN, ROLE_FACULTY], 8, "this receipt"),
            Err(DomainError::Forbidden(_))
        ));
    }
}
