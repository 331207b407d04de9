use chrono::Utc;
use tracing::info;

use crate::domain::auth::{self, has_any_role, ROLE_ADMIN, ROLE_FACULTY};
use crate::domain::error::{DomainError, DomainResult};
use crate::storage::{CourseRepository, FeeRepository, PaymentRepository, SemesterRepository, UserRepository};
use shared::{CreatePaymentRequest, PaymentWithReceipt, User};

/// Build the human-readable receipt number for a payment.
///
/// Format: `RCPT-{payment_id}-{COURSE_CODE}-{SEMESTERNAME}-{timestamp}` with
/// the course code upper-cased, the semester name whitespace-stripped and
/// upper-cased, and the timestamp formatted to the second.
pub fn derive_receipt_number(
    payment_id: i64,
    course_code: &str,
    semester_name: &str,
    timestamp: &str,
) -> String {
    let course_code = course_code.to_uppercase();
    let semester_code: String = semester_name.split_whitespace().collect::<String>().to_uppercase();
    format!("RCPT-{}-{}-{}-{}", payment_id, course_code, semester_code, timestamp)
}

/// Service for recording payments and their receipts
#[derive(Clone)]
pub struct PaymentService {
    payments: PaymentRepository,
    fees: FeeRepository,
    courses: CourseRepository,
    semesters: SemesterRepository,
    users: UserRepository,
}

impl PaymentService {
    pub fn new(
        payments: PaymentRepository,
        fees: FeeRepository,
        courses: CourseRepository,
        semesters: SemesterRepository,
        users: UserRepository,
    ) -> Self {
        Self {
            payments,
            fees,
            courses,
            semesters,
            users,
        }
    }

    /// Record a payment against a student fee and derive its receipt. Admin
    /// only.
    ///
    /// Partial and over-payments are allowed: settlement may be spread over
    /// several payments, so no balance ceiling is enforced. The payment and
    /// receipt rows commit atomically; a failure after the payment insert
    /// rolls both back.
    pub async fn create_payment(
        &self,
        caller: &User,
        request: CreatePaymentRequest,
    ) -> DomainResult<PaymentWithReceipt> {
        auth::require_any_role(caller, &[ROLE_ADMIN])?;

        self.users
            .get_user(request.student_id)
            .await?
            .ok_or_else(|| DomainError::not_found("The student with this id does not exist"))?;

        let student_fee = self
            .fees
            .get_student_fee(request.student_fee_id)
            .await?
            .ok_or_else(|| DomainError::not_found("The student fee with this id does not exist"))?;

        if student_fee.student_id != request.student_id {
            return Err(DomainError::bad_request(
                "The payment student does not match the student on the fee",
            ));
        }
        if request.amount <= 0.0 {
            return Err(DomainError::bad_request("Payment amount must be positive"));
        }
        if request.payment_method.trim().is_empty() {
            return Err(DomainError::bad_request("Payment method is required"));
        }

        // Receipt number inputs come from the fee's course and semester
        let course = self
            .courses
            .get_course(student_fee.course_id)
            .await?
            .ok_or_else(|| {
                DomainError::Internal(anyhow::anyhow!("course {} missing for fee {}", student_fee.course_id, student_fee.id))
            })?;
        let semester = self
            .semesters
            .get_semester(student_fee.semester_id)
            .await?
            .ok_or_else(|| {
                DomainError::Internal(anyhow::anyhow!("semester {} missing for fee {}", student_fee.semester_id, student_fee.id))
            })?;

        let now = Utc::now();
        let payment_date = now.to_rfc3339();
        let stamp = now.format("%Y%m%d%H%M%S").to_string();

        let created = self
            .payments
            .create_payment_with_receipt(
                request.student_id,
                request.student_fee_id,
                request.amount,
                request.payment_method.trim(),
                request.transaction_id.as_deref(),
                request.notes.as_deref(),
                &payment_date,
                |payment_id| derive_receipt_number(payment_id, &course.code, &semester.name, &stamp),
            )
            .await
            .map_err(|e| match DomainError::from(e) {
                DomainError::Conflict(_) => {
                    DomainError::conflict("A payment with this transaction id already exists")
                }
                other => other,
            })?;

        info!(
            "Recorded payment {} with receipt {} for student {}",
            created.payment.id, created.receipt.receipt_number, created.payment.student_id
        );
        Ok(created)
    }

    /// List payments with their receipts. Students only ever see their own;
    /// admin and faculty may filter freely.
    #[allow(clippy::too_many_arguments)]
    pub async fn list_payments(
        &self,
        caller: &User,
        student_id: Option<i64>,
        student_fee_id: Option<i64>,
        start_date: Option<&str>,
        end_date: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> DomainResult<Vec<PaymentWithReceipt>> {
        let student_id = if has_any_role(&caller.roles, &[ROLE_ADMIN, ROLE_FACULTY]) {
            student_id
        } else {
            Some(caller.id)
        };

        Ok(self
            .payments
            .list_payments(student_id, student_fee_id, start_date, end_date, limit, offset)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{DbConnection, InstituteRepository};
    use shared::SemesterKind;
    use sqlx::Row;

    struct TestContext {
        service: PaymentService,
        db: DbConnection,
        student_id: i64,
        student_fee_id: i64,
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

    /// Seed the full chain down to one student fee of 1000.0
    async fn setup_test() -> TestContext {
        let db = DbConnection::init_test().await.expect("Failed to create test database");
        let institutes = InstituteRepository::new(db.clone());
        let courses = CourseRepository::new(db.clone());
        let semesters = SemesterRepository::new(db.clone());
        let users = UserRepository::new(db.clone());
        let fees = FeeRepository::new(db.clone());
        let payments = PaymentRepository::new(db.clone());

        let now = "2026-01-01T00:00:00Z";
        let institute_id = institutes
            .create_institute("School of Engineering", "SOE", None, now)
            .await
            .expect("Failed to create institute");
        let course_id = courses
            .create_course(institute_id, "Computer Science", "bsc-cs", 3, None, true, now)
            .await
            .expect("Failed to create course");
        let semester_id = semesters
            .create_semester(course_id, "Fall 2026", SemesterKind::Semester, 1, "2026-09-01T00:00:00Z", "2026-12-20T00:00:00Z")
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
        courses.enroll(student_id, course_id, now).await.expect("Failed to enroll");
        let student_fee_id = fees
            .create_student_fee(student_id, course_id, semester_id, 1000.0, Some("Tuition"), now)
            .await
            .expect("Failed to create student fee");

        TestContext {
            service: PaymentService::new(payments, fees, courses, semesters, users),
            db,
            student_id,
            student_fee_id,
        }
    }

    fn payment_request(ctx: &TestContext, amount: f64) -> CreatePaymentRequest {
        CreatePaymentRequest {
            student_id: ctx.student_id,
            student_fee_id: ctx.student_fee_id,
            amount,
            payment_method: "bank_transfer".to_string(),
            transaction_id: None,
            notes: None,
        }
    }

    #[test]
    fn test_receipt_number_derivation() {
        let number = derive_receipt_number(42, "bsc-cs", "Fall 2026", "20260915103000");
        assert_eq!(number, "RCPT-42-BSC-CS-FALL2026-20260915103000");

        // Deterministic for identical inputs
        assert_eq!(
            derive_receipt_number(42, "bsc-cs", "Fall 2026", "20260915103000"),
            number
        );
    }

    #[tokio::test]
    async fn test_payment_creates_exactly_one_receipt() {
        let ctx = setup_test().await;

        let created = ctx
            .service
            .create_payment(&admin_caller(), payment_request(&ctx, 600.0))
            .await
            .expect("Failed to create payment");

        assert_eq!(created.receipt.payment_id, created.payment.id);
        assert!(created.receipt.receipt_number.starts_with(&format!("RCPT-{}-BSC-CS-FALL2026-", created.payment.id)));

        // No payment row exists without a receipt row
        let orphans = sqlx::query(
            "SELECT COUNT(*) AS n FROM payments p LEFT JOIN receipts r ON r.payment_id = p.id WHERE r.id IS NULL",
        )
        .fetch_one(ctx.db.pool())
        .await
        .expect("Failed to count orphans");
        assert_eq!(orphans.get::<i64, _>("n"), 0);
    }

    #[tokio::test]
    async fn test_receipt_numbers_are_unique_across_payments() {
        let ctx = setup_test().await;
        let admin = admin_caller();

        let first = ctx
            .service
            .create_payment(&admin, payment_request(&ctx, 300.0))
            .await
            .expect("Failed to create first payment");
        let second = ctx
            .service
            .create_payment(&admin, payment_request(&ctx, 300.0))
            .await
            .expect("Failed to create second payment");

        assert_ne!(first.receipt.receipt_number, second.receipt.receipt_number);
    }

    #[tokio::test]
    async fn test_student_mismatch_is_bad_request() {
        let ctx = setup_test().await;

        let users = UserRepository::new(ctx.db.clone());
        let other_id = users
            .create_user("other@example.edu", None, true, "2026-01-01T00:00:00Z")
            .await
            .expect("Failed to create user");

        let result = ctx
            .service
            .create_payment(
                &admin_caller(),
                CreatePaymentRequest {
                    student_id: other_id,
                    student_fee_id: ctx.student_fee_id,
                    amount: 100.0,
                    payment_method: "cash".to_string(),
                    transaction_id: None,
                    notes: None,
                },
            )
            .await;
        assert!(matches!(result, Err(DomainError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_non_positive_amount_is_bad_request() {
        let ctx = setup_test().await;

        let result = ctx
            .service
            .create_payment(&admin_caller(), payment_request(&ctx, 0.0))
            .await;
        assert!(matches!(result, Err(DomainError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_duplicate_transaction_id_rolls_back_whole_payment() {
        let ctx = setup_test().await;
        let admin = admin_caller();

        let mut request = payment_request(&ctx, 100.0);
        request.transaction_id = Some("TXN-1".to_string());
        ctx.service
            .create_payment(&admin, request.clone())
            .await
            .expect("First payment should succeed");

        let result = ctx.service.create_payment(&admin, request).await;
        assert!(matches!(result, Err(DomainError::Conflict(_))));

        // The failed attempt must leave no partial rows behind
        let payments = sqlx::query("SELECT COUNT(*) AS n FROM payments")
            .fetch_one(ctx.db.pool())
            .await
            .expect("Failed to count payments");
        let receipts = sqlx::query("SELECT COUNT(*) AS n FROM receipts")
            .fetch_one(ctx.db.pool())
            .await
            .expect("Failed to count receipts");
        assert_eq!(payments.get::<i64, _>("n"), 1);
        assert_eq!(receipts.get::<i64, _>("n"), 1);
    }

    #[tokio::test]
    async fn test_overpayment_is_allowed() {
        let ctx = setup_test().await;

        // Fee is 1000.0; paying more is an accepted policy
        let created = ctx
            .service
            .create_payment(&admin_caller(), payment_request(&ctx, 1500.0))
            .await
            .expect("Overpayment should be accepted");
        assert_eq!(created.payment.amount, 1500.0);
    }

    #[tokio::test]
    async fn test_students_only_see_their_own_payments() {
        let ctx = setup_test().await;

        ctx.service
            .create_payment(&admin_caller(), payment_request(&ctx, 600.0))
            .await
            .expect("Failed to create payment");

        let stranger = User {
            id: ctx.student_id + 1000,
            email: "stranger@example.edu".to_string(),
            full_name: None,
            is_active: true,
            roles: vec!["student".to_string()],
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: None,
        };

        let visible = ctx
            .service
            .list_payments(&stranger, Some(ctx.student_id), None, None, None, 100, 0)
            .await
            .expect("Failed to list payments");
        assert!(visible.is_empty());

        let owner = User {
            id: ctx.student_id,
            email: "stud@example.edu".to_string(),
            full_name: None,
            is_active: true,
            roles: vec!["student".to_string()],
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: None,
        };
        let visible = ctx
            .service
            .list_payments(&owner, None, None, None, None, 100, 0)
            .await
            .expect("Failed to list payments");
        assert_eq!(visible.len(), 1);
    }
}
