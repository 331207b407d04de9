use anyhow::anyhow;
use chrono::Utc;
use tracing::info;

use crate::domain::auth::{self, ROLE_ADMIN};
use crate::domain::error::{DomainError, DomainResult};
use crate::storage::UserRepository;
use shared::{CreateUserRequest, UpdateUserRequest, User};

/// Service for managing user accounts and their role sets
#[derive(Clone)]
pub struct UserService {
    users: UserRepository,
}

impl UserService {
    pub fn new(users: UserRepository) -> Self {
        Self { users }
    }

    /// Resolve a caller identity for the request boundary.
    ///
    /// Deliberately ungated: it runs before any authorization decision.
    pub async fn find_caller(&self, user_id: i64) -> DomainResult<Option<User>> {
        Ok(self.users.get_user(user_id).await?)
    }

    /// Create a new user with its role set. Admin only.
    pub async fn create_user(&self, caller: &User, request: CreateUserRequest) -> DomainResult<User> {
        auth::require_any_role(caller, &[ROLE_ADMIN])?;

        let email = request.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(DomainError::bad_request("A valid email address is required"));
        }

        if self.users.find_user_id_by_email(email).await?.is_some() {
            return Err(DomainError::conflict(
                "The user with this email already exists in the system",
            ));
        }

        let now = Utc::now().to_rfc3339();
        let user_id = self
            .users
            .create_user(
                email,
                request.full_name.as_deref(),
                request.is_active.unwrap_or(true),
                &now,
            )
            .await?;
        self.users.set_roles(user_id, &request.roles).await?;

        let user = self
            .users
            .get_user(user_id)
            .await?
            .ok_or_else(|| DomainError::Internal(anyhow!("user {} missing after insert", user_id)))?;

        info!("Created user {} ({})", user.id, user.email);
        Ok(user)
    }

    /// Get a user by id. Admin only.
    pub async fn get_user(&self, caller: &User, user_id: i64) -> DomainResult<User> {
        auth::require_any_role(caller, &[ROLE_ADMIN])?;

        self.users.get_user(user_id).await?.ok_or_else(|| {
            DomainError::not_found("The user with this id does not exist in the system")
        })
    }

    /// List users. Admin only.
    pub async fn list_users(&self, caller: &User, limit: i64, offset: i64) -> DomainResult<Vec<User>> {
        auth::require_any_role(caller, &[ROLE_ADMIN])?;

        Ok(self.users.list_users(limit, offset).await?)
    }

    /// Update user fields and, when provided, replace the role set. Admin
    /// only.
    pub async fn update_user(
        &self,
        caller: &User,
        user_id: i64,
        request: UpdateUserRequest,
    ) -> DomainResult<User> {
        auth::require_any_role(caller, &[ROLE_ADMIN])?;

        let existing = self.users.get_user(user_id).await?.ok_or_else(|| {
            DomainError::not_found("The user with this id does not exist in the system")
        })?;

        let email = match &request.email {
            Some(email) => {
                let email = email.trim();
                if email.is_empty() || !email.contains('@') {
                    return Err(DomainError::bad_request("A valid email address is required"));
                }
                if email != existing.email
                    && self.users.find_user_id_by_email(email).await?.is_some()
                {
                    return Err(DomainError::conflict(
                        "The user with this email already exists in the system",
                    ));
                }
                email.to_string()
            }
            None => existing.email.clone(),
        };
        let full_name = request.full_name.or(existing.full_name);
        let is_active = request.is_active.unwrap_or(existing.is_active);

        let now = Utc::now().to_rfc3339();
        self.users
            .update_user(user_id, &email, full_name.as_deref(), is_active, &now)
            .await?;

        if let Some(roles) = &request.roles {
            self.users.set_roles(user_id, roles).await?;
        }

        let user = self
            .users
            .get_user(user_id)
            .await?
            .ok_or_else(|| DomainError::Internal(anyhow!("user {} missing after update", user_id)))?;

        info!("Updated user {}", user.id);
        Ok(user)
    }
}
