use chrono::Utc;
use tracing::info;

use crate::domain::auth::{self, has_any_role, ROLE_ADMIN, ROLE_FACULTY};
use crate::domain::error::{DomainError, DomainResult};
use crate::storage::{CourseRepository, FeeRepository, SemesterRepository, UserRepository};
use shared::{
    CreateStandardFeeRequest, CreateStudentFeeRequest, StandardFee, StudentFee,
    UpdateStandardFeeRequest, User,
};

/// Outcome of resolving a student fee amount.
///
/// The fallback policy lives in one place: an explicit amount wins, an
/// existing standard fee for the (course, semester) pair fills the gap, and
/// anything else is unresolvable.
#[derive(Debug, Clone, PartialEq)]
pub enum FeeResolution {
    /// Caller supplied the amount
    Explicit(f64),
    /// Amount (and default description) copied from the standard fee
    FromStandard {
        amount: f64,
        description: Option<String>,
    },
    /// No explicit amount and no standard fee to fall back on
    Unresolved,
}

impl FeeResolution {
    pub fn resolve(explicit: Option<f64>, standard: Option<&StandardFee>) -> Self {
        match (explicit, standard) {
            (Some(amount), _) => Self::Explicit(amount),
            (None, Some(standard)) => Self::FromStandard {
                amount: standard.amount,
                description: standard.description.clone(),
            },
            (None, None) => Self::Unresolved,
        }
    }
}

/// Service for standard fees and student fee obligations
#[derive(Clone)]
pub struct FeeService {
    fees: FeeRepository,
    courses: CourseRepository,
    semesters: SemesterRepository,
    users: UserRepository,
}

impl FeeService {
    pub fn new(
        fees: FeeRepository,
        courses: CourseRepository,
        semesters: SemesterRepository,
        users: UserRepository,
    ) -> Self {
        Self {
            fees,
            courses,
            semesters,
            users,
        }
    }

    /// Check that the course and semester exist and belong together
    async fn check_course_semester(&self, course_id: i64, semester_id: i64) -> DomainResult<()> {
        self.courses
            .get_course(course_id)
            .await?
            .ok_or_else(|| DomainError::not_found("The course with this id does not exist"))?;

        let semester = self
            .semesters
            .get_semester(semester_id)
            .await?
            .ok_or_else(|| DomainError::not_found("The semester with this id does not exist"))?;

        if semester.course_id != course_id {
            return Err(DomainError::bad_request(
                "The semester does not belong to the specified course",
            ));
        }
        Ok(())
    }

    /// Create a standard fee for a (course, semester) pair. Admin only.
    ///
    /// The pair is checked for a duplicate up front, but the store's unique
    /// constraint is what actually arbitrates concurrent creations: the
    /// loser surfaces as conflict either way.
    pub async fn create_standard_fee(
        &self,
        caller: &User,
        request: CreateStandardFeeRequest,
    ) -> DomainResult<StandardFee> {
        auth::require_any_role(caller, &[ROLE_ADMIN])?;

        self.check_course_semester(request.course_id, request.semester_id).await?;

        if request.amount < 0.0 {
            return Err(DomainError::bad_request("Fee amount must not be negative"));
        }

        if self.fees.pair_taken(request.course_id, request.semester_id, None).await? {
            return Err(DomainError::conflict(
                "A standard fee already exists for this course-semester combination",
            ));
        }

        let now = Utc::now().to_rfc3339();
        let standard_fee_id = self
            .fees
            .create_standard_fee(
                request.course_id,
                request.semester_id,
                &request.name,
                request.amount,
                request.description.as_deref(),
                &now,
            )
            .await
            .map_err(|e| match DomainError::from(e) {
                // Lost the race between pre-check and insert
                DomainError::Conflict(_) => DomainError::conflict(
                    "A standard fee already exists for this course-semester combination",
                ),
                other => other,
            })?;

        info!(
            "Created standard fee {} for course {} semester {}",
            standard_fee_id, request.course_id, request.semester_id
        );
        self.get_standard_fee_row(standard_fee_id).await
    }

    /// Update a standard fee. Admin only. The duplicate check excludes the
    /// record being updated.
    pub async fn update_standard_fee(
        &self,
        caller: &User,
        standard_fee_id: i64,
        request: UpdateStandardFeeRequest,
    ) -> DomainResult<StandardFee> {
        auth::require_any_role(caller, &[ROLE_ADMIN])?;

        self.fees
            .get_standard_fee(standard_fee_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Standard fee not found"))?;

        self.check_course_semester(request.course_id, request.semester_id).await?;

        if request.amount < 0.0 {
            return Err(DomainError::bad_request("Fee amount must not be negative"));
        }

        if self
            .fees
            .pair_taken(request.course_id, request.semester_id, Some(standard_fee_id))
            .await?
        {
            return Err(DomainError::conflict(
                "A standard fee already exists for this course-semester combination",
            ));
        }

        let now = Utc::now().to_rfc3339();
        self.fees
            .update_standard_fee(
                standard_fee_id,
                request.course_id,
                request.semester_id,
                &request.name,
                request.amount,
                request.description.as_deref(),
                &now,
            )
            .await?;

        info!("Updated standard fee {}", standard_fee_id);
        self.get_standard_fee_row(standard_fee_id).await
    }

    /// Delete a standard fee. Admin only.
    pub async fn delete_standard_fee(&self, caller: &User, standard_fee_id: i64) -> DomainResult<()> {
        auth::require_any_role(caller, &[ROLE_ADMIN])?;

        self.fees
            .get_standard_fee(standard_fee_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Standard fee not found"))?;

        self.fees.delete_standard_fee(standard_fee_id).await?;
        info!("Deleted standard fee {}", standard_fee_id);
        Ok(())
    }

    /// List standard fees. Admin and faculty only.
    pub async fn list_standard_fees(
        &self,
        caller: &User,
        course_id: Option<i64>,
        semester_id: Option<i64>,
        limit: i64,
        offset: i64,
    ) -> DomainResult<Vec<StandardFee>> {
        auth::require_any_role(caller, &[ROLE_ADMIN, ROLE_FACULTY])?;

        Ok(self
            .fees
            .list_standard_fees(course_id, semester_id, limit, offset)
            .await?)
    }

    /// Create a student fee obligation. Admin only.
    ///
    /// When no amount is given it is resolved from the pair's standard fee;
    /// creation fails if neither is available, and nothing is persisted.
    pub async fn create_student_fee(
        &self,
        caller: &User,
        request: CreateStudentFeeRequest,
    ) -> DomainResult<StudentFee> {
        auth::require_any_role(caller, &[ROLE_ADMIN])?;

        self.users
            .get_user(request.student_id)
            .await?
            .ok_or_else(|| DomainError::not_found("The student with this id does not exist"))?;

        self.check_course_semester(request.course_id, request.semester_id).await?;

        if !self.courses.is_enrolled(request.student_id, request.course_id).await? {
            return Err(DomainError::bad_request("The student is not enrolled in this course"));
        }

        if let Some(amount) = request.amount {
            if amount < 0.0 {
                return Err(DomainError::bad_request("Fee amount must not be negative"));
            }
        }

        let standard = self
            .fees
            .find_standard_fee_for_pair(request.course_id, request.semester_id)
            .await?;

        let (amount, description) = match FeeResolution::resolve(request.amount, standard.as_ref()) {
            FeeResolution::Explicit(amount) => (amount, request.description),
            FeeResolution::FromStandard { amount, description } => {
                (amount, request.description.or(description))
            }
            FeeResolution::Unresolved => {
                return Err(DomainError::bad_request(
                    "No amount provided and no standard fee found for this course-semester combination",
                ));
            }
        };

        let now = Utc::now().to_rfc3339();
        let student_fee_id = self
            .fees
            .create_student_fee(
                request.student_id,
                request.course_id,
                request.semester_id,
                amount,
                description.as_deref(),
                &now,
            )
            .await?;

        info!(
            "Created student fee {} for student {} (amount {:.2})",
            student_fee_id, request.student_id, amount
        );
        self.fees
            .get_student_fee(student_fee_id)
            .await?
            .ok_or_else(|| {
                DomainError::Internal(anyhow::anyhow!("student fee {} missing after insert", student_fee_id))
            })
    }

    /// List student fees. Students only ever see their own; admin and
    /// faculty may filter freely.
    pub async fn list_student_fees(
        &self,
        caller: &User,
        student_id: Option<i64>,
        semester_id: Option<i64>,
        limit: i64,
        offset: i64,
    ) -> DomainResult<Vec<StudentFee>> {
        let student_id = if has_any_role(&caller.roles, &[ROLE_ADMIN, ROLE_FACULTY]) {
            student_id
        } else {
            Some(caller.id)
        };

        Ok(self
            .fees
            .list_student_fees(student_id, semester_id, limit, offset)
            .await?)
    }

    async fn get_standard_fee_row(&self, standard_fee_id: i64) -> DomainResult<StandardFee> {
        self.fees
            .get_standard_fee(standard_fee_id)
            .await?
            .ok_or_else(|| {
                DomainError::Internal(anyhow::anyhow!("standard fee {} missing after write", standard_fee_id))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::DbConnection;
    use shared::SemesterKind;

    struct TestContext {
        service: FeeService,
        fees: FeeRepository,
        db: DbConnection,
        course_id: i64,
        semester_id: i64,
        other_semester_id: i64,
        student_id: i64,
    }

    fn admin_caller() -> User {
        User {
            id: 0,
            email: "root@example.edu".to_string(),
            full_name: None,
            is_active: true,
            roles: vec!["admin".to_string()],
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: None,
        }
    }

    /// Seed an institute, a course with two semesters, and one enrolled
    /// student
    async fn setup_test() -> TestContext {
        let db = DbConnection::init_test().await.expect("Failed to create test database");
        let institutes = crate::storage::InstituteRepository::new(db.clone());
        let courses = CourseRepository::new(db.clone());
        let semesters = SemesterRepository::new(db.clone());
        let users = UserRepository::new(db.clone());
        let fees = FeeRepository::new(db.clone());

        let now = "2026-01-01T00:00:00Z";
        let institute_id = institutes
            .create_institute("School of Engineering", "SOE", None, now)
            .await
            .expect("Failed to create institute");
        let course_id = courses
            .create_course(institute_id, "Computer Science", "BSC-CS", 3, None, true, now)
            .await
            .expect("Failed to create course");
        let semester_id = semesters
            .create_semester(course_id, "Fall 2026", SemesterKind::Semester, 1, "2026-09-01T00:00:00Z", "2026-12-20T00:00:00Z")
            .await
            .expect("Failed to create semester");
        let other_semester_id = semesters
            .create_semester(course_id, "Spring 2027", SemesterKind::Semester, 2, "2027-01-10T00:00:00Z", "2027-05-20T00:00:00Z")
            .await
            .expect("Failed to create semester");

        let student_id = users
            .create_user("stud@example.edu", Some("Stu Dent"), true, now)
            .await
            .expect("Failed to create user");
        users
            .set_roles(student_id, &["student".to_string()])
            .await
            .expect("Failed to set roles");
        courses
            .enroll(student_id, course_id, now)
            .await
            .expect("Failed to enroll");

        TestContext {
            service: FeeService::new(fees.clone(), courses, semesters, users),
            fees,
            db,
            course_id,
            semester_id,
            other_semester_id,
            student_id,
        }
    }

    fn standard_fee_request(ctx: &TestContext, amount: f64) -> CreateStandardFeeRequest {
        CreateStandardFeeRequest {
            course_id: ctx.course_id,
            semester_id: ctx.semester_id,
            name: "Tuition".to_string(),
            amount,
            description: Some("Standard tuition".to_string()),
        }
    }

    #[test]
    fn test_resolution_prefers_explicit_amount() {
        let standard = StandardFee {
            id: 1,
            course_id: 1,
            semester_id: 1,
            name: "Tuition".to_string(),
            amount: 1000.0,
            description: Some("Standard tuition".to_string()),
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: None,
        };

        assert_eq!(
            FeeResolution::resolve(Some(750.0), Some(&standard)),
            FeeResolution::Explicit(750.0)
        );
        assert_eq!(
            FeeResolution::resolve(None, Some(&standard)),
            FeeResolution::FromStandard {
                amount: 1000.0,
                description: Some("Standard tuition".to_string())
            }
        );
        assert_eq!(FeeResolution::resolve(None, None), FeeResolution::Unresolved);
    }

    #[tokio::test]
    async fn test_duplicate_standard_fee_is_conflict() {
        let ctx = setup_test().await;
        let admin = admin_caller();

        ctx.service
            .create_standard_fee(&admin, standard_fee_request(&ctx, 1000.0))
            .await
            .expect("First standard fee should succeed");

        let result = ctx
            .service
            .create_standard_fee(&admin, standard_fee_request(&ctx, 900.0))
            .await;
        assert!(matches!(result, Err(DomainError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_concurrent_standard_fee_creation_has_one_winner() {
        let ctx = setup_test().await;
        let admin = admin_caller();

        let service_a = ctx.service.clone();
        let service_b = ctx.service.clone();
        let request_a = standard_fee_request(&ctx, 1000.0);
        let request_b = standard_fee_request(&ctx, 900.0);
        let caller_a = admin.clone();
        let caller_b = admin;

        let (result_a, result_b) = tokio::join!(
            service_a.create_standard_fee(&caller_a, request_a),
            service_b.create_standard_fee(&caller_b, request_b),
        );

        let winners = [&result_a, &result_b].iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1, "Exactly one concurrent creation must win");

        let loser = if result_a.is_err() { result_a } else { result_b };
        assert!(matches!(loser, Err(DomainError::Conflict(_))));

        let remaining = ctx
            .fees
            .list_standard_fees(Some(ctx.course_id), Some(ctx.semester_id), -1, 0)
            .await
            .expect("Failed to list standard fees");
        assert_eq!(remaining.len(), 1);
    }

    #[tokio::test]
    async fn test_update_can_keep_its_own_pair() {
        let ctx = setup_test().await;
        let admin = admin_caller();

        let fee = ctx
            .service
            .create_standard_fee(&admin, standard_fee_request(&ctx, 1000.0))
            .await
            .expect("Failed to create standard fee");

        // Same pair, new amount: must not collide with itself
        let updated = ctx
            .service
            .update_standard_fee(
                &admin,
                fee.id,
                UpdateStandardFeeRequest {
                    course_id: ctx.course_id,
                    semester_id: ctx.semester_id,
                    name: "Tuition".to_string(),
                    amount: 1100.0,
                    description: None,
                },
            )
            .await
            .expect("Updating a fee onto its own pair should succeed");
        assert_eq!(updated.amount, 1100.0);
    }

    #[tokio::test]
    async fn test_update_onto_occupied_pair_is_conflict() {
        let ctx = setup_test().await;
        let admin = admin_caller();

        ctx.service
            .create_standard_fee(&admin, standard_fee_request(&ctx, 1000.0))
            .await
            .expect("Failed to create standard fee");
        let other = ctx
            .service
            .create_standard_fee(
                &admin,
                CreateStandardFeeRequest {
                    course_id: ctx.course_id,
                    semester_id: ctx.other_semester_id,
                    name: "Tuition".to_string(),
                    amount: 950.0,
                    description: None,
                },
            )
            .await
            .expect("Failed to create second standard fee");

        let result = ctx
            .service
            .update_standard_fee(
                &admin,
                other.id,
                UpdateStandardFeeRequest {
                    course_id: ctx.course_id,
                    semester_id: ctx.semester_id,
                    name: "Tuition".to_string(),
                    amount: 950.0,
                    description: None,
                },
            )
            .await;
        assert!(matches!(result, Err(DomainError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_student_fee_copies_standard_amount() {
        let ctx = setup_test().await;
        let admin = admin_caller();

        ctx.service
            .create_standard_fee(&admin, standard_fee_request(&ctx, 1000.0))
            .await
            .expect("Failed to create standard fee");

        let fee = ctx
            .service
            .create_student_fee(
                &admin,
                CreateStudentFeeRequest {
                    student_id: ctx.student_id,
                    course_id: ctx.course_id,
                    semester_id: ctx.semester_id,
                    amount: None,
                    description: None,
                },
            )
            .await
            .expect("Failed to create student fee");

        assert_eq!(fee.amount, 1000.0);
        assert_eq!(fee.description.as_deref(), Some("Standard tuition"));
    }

    #[tokio::test]
    async fn test_student_fee_without_amount_or_standard_fails_and_persists_nothing() {
        let ctx = setup_test().await;
        let admin = admin_caller();

        let result = ctx
            .service
            .create_student_fee(
                &admin,
                CreateStudentFeeRequest {
                    student_id: ctx.student_id,
                    course_id: ctx.course_id,
                    semester_id: ctx.semester_id,
                    amount: None,
                    description: None,
                },
            )
            .await;
        assert!(matches!(result, Err(DomainError::BadRequest(_))));

        let fees = ctx
            .fees
            .list_student_fees(Some(ctx.student_id), None, -1, 0)
            .await
            .expect("Failed to list student fees");
        assert!(fees.is_empty(), "A failed creation must persist nothing");
    }

    #[tokio::test]
    async fn test_student_fee_explicit_amount_overrides_standard() {
        let ctx = setup_test().await;
        let admin = admin_caller();

        ctx.service
            .create_standard_fee(&admin, standard_fee_request(&ctx, 1000.0))
            .await
            .expect("Failed to create standard fee");

        let fee = ctx
            .service
            .create_student_fee(
                &admin,
                CreateStudentFeeRequest {
                    student_id: ctx.student_id,
                    course_id: ctx.course_id,
                    semester_id: ctx.semester_id,
                    amount: Some(250.0),
                    description: Some("Scholarship adjusted".to_string()),
                },
            )
            .await
            .expect("Failed to create student fee");

        assert_eq!(fee.amount, 250.0);
        assert_eq!(fee.description.as_deref(), Some("Scholarship adjusted"));
    }

    #[tokio::test]
    async fn test_student_fee_requires_enrollment() {
        let ctx = setup_test().await;
        let admin = admin_caller();

        // A second student who is not enrolled anywhere
        let db_users = UserRepository::new(ctx.db.clone());
        let outsider_id = db_users
            .create_user("outsider@example.edu", None, true, "2026-01-01T00:00:00Z")
            .await
            .expect("Failed to create user");
        db_users
            .set_roles(outsider_id, &["student".to_string()])
            .await
            .expect("Failed to set roles");

        let result = ctx
            .service
            .create_student_fee(
                &admin,
                CreateStudentFeeRequest {
                    student_id: outsider_id,
                    course_id: ctx.course_id,
                    semester_id: ctx.semester_id,
                    amount: Some(100.0),
                    description: None,
                },
            )
            .await;
        assert!(matches!(result, Err(DomainError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_missing_semester_is_not_found() {
        let ctx = setup_test().await;

        let result = ctx
            .service
            .create_standard_fee(
                &admin_caller(),
                CreateStandardFeeRequest {
                    course_id: ctx.course_id,
                    semester_id: 9999,
                    name: "Tuition".to_string(),
                    amount: 100.0,
                    description: None,
                },
            )
            .await;
        assert!(matches!(result, Err(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_mismatched_semester_course_is_bad_request() {
        let ctx = setup_test().await;

        // A second course in the same institute; the first course's
        // semesters do not belong to it
        let courses = CourseRepository::new(ctx.db.clone());
        let other_course_id = courses
            .create_course(1, "Mathematics", "BSC-MATH", 3, None, true, "2026-01-01T00:00:00Z")
            .await
            .expect("Failed to create course");

        let result = ctx
            .service
            .create_standard_fee(
                &admin_caller(),
                CreateStandardFeeRequest {
                    course_id: other_course_id,
                    semester_id: ctx.semester_id,
                    name: "Tuition".to_string(),
                    amount: 100.0,
                    description: None,
                },
            )
            .await;
        assert!(matches!(result, Err(DomainError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_students_only_see_their_own_fees() {
        let ctx = setup_test().await;
        let admin = admin_caller();

        ctx.service
            .create_student_fee(
                &admin,
                CreateStudentFeeRequest {
                    student_id: ctx.student_id,
                    course_id: ctx.course_id,
                    semester_id: ctx.semester_id,
                    amount: Some(500.0),
                    description: None,
                },
            )
            .await
            .expect("Failed to create student fee");

        let other_student = User {
            id: ctx.student_id + 1000,
            email: "other@example.edu".to_string(),
            full_name: None,
            is_active: true,
            roles: vec!["student".to_string()],
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: None,
        };

        // Even with an explicit filter for someone else, a student is scoped
        // to their own fees
        let fees = ctx
            .service
            .list_student_fees(&other_student, Some(ctx.student_id), None, 100, 0)
            .await
            .expect("Failed to list student fees");
        assert!(fees.is_empty());
    }
}
