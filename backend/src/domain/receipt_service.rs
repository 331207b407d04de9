use anyhow::anyhow;
use tracing::info;

use crate::domain::auth::{self, ROLE_ADMIN, ROLE_FACULTY};
use crate::domain::error::{DomainError, DomainResult};
use crate::render::{ReceiptContext, ReceiptRenderer, RenderedDocument};
use crate::storage::{FeeRepository, PaymentRepository, SemesterRepository, UserRepository};
use shared::{StudentReceiptsResponse, User};

/// Service for on-demand receipt document rendering
#[derive(Clone)]
pub struct ReceiptService {
    payments: PaymentRepository,
    fees: FeeRepository,
    semesters: SemesterRepository,
    users: UserRepository,
    renderer: ReceiptRenderer,
}

impl ReceiptService {
    pub fn new(
        payments: PaymentRepository,
        fees: FeeRepository,
        semesters: SemesterRepository,
        users: UserRepository,
        renderer: ReceiptRenderer,
    ) -> Self {
        Self {
            payments,
            fees,
            semesters,
            users,
            renderer,
        }
    }

    /// Render the receipt document. Admin, faculty, or the student who owns
    /// the underlying payment.
    ///
    /// The document is regenerated from the stored rows on every call;
    /// identical inputs produce identical content.
    pub async fn render_receipt(&self, caller: &User, receipt_id: i64) -> DomainResult<RenderedDocument> {
        let receipt = self
            .payments
            .get_receipt(receipt_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Receipt not found"))?;

        // The payment exists whenever its receipt does (atomic pairing)
        let payment = self
            .payments
            .get_payment(receipt.payment_id)
            .await?
            .ok_or_else(|| {
                DomainError::Internal(anyhow!("payment {} missing for receipt {}", receipt.payment_id, receipt.id))
            })?;

        auth::require_any_role_or_owner(
            caller,
            &[ROLE_ADMIN, ROLE_FACULTY],
            payment.student_id,
            "this receipt",
        )?;

        let student = self
            .users
            .get_user(payment.student_id)
            .await?
            .ok_or_else(|| {
                DomainError::Internal(anyhow!("student {} missing for payment {}", payment.student_id, payment.id))
            })?;
        let student_fee = self
            .fees
            .get_student_fee(payment.student_fee_id)
            .await?
            .ok_or_else(|| {
                DomainError::Internal(anyhow!("fee {} missing for payment {}", payment.student_fee_id, payment.id))
            })?;
        let semester = self
            .semesters
            .get_semester(student_fee.semester_id)
            .await?
            .ok_or_else(|| {
                DomainError::Internal(anyhow!("semester {} missing for fee {}", student_fee.semester_id, student_fee.id))
            })?;

        let document = self
            .renderer
            .render(&ReceiptContext {
                receipt: &receipt,
                payment: &payment,
                student: &student,
                student_fee: &student_fee,
                semester_name: &semester.name,
            })
            .map_err(DomainError::Internal)?;

        info!("Rendered receipt {} for caller {}", receipt.receipt_number, caller.id);
        Ok(document)
    }

    /// List a student's receipt ids. Admin, faculty, or the student
    /// themselves.
    pub async fn student_receipts(
        &self,
        caller: &User,
        student_id: i64,
    ) -> DomainResult<StudentReceiptsResponse> {
        auth::require_any_role_or_owner(caller, &[ROLE_ADMIN, ROLE_FACULTY], student_id, "these receipts")?;

        self.users
            .get_user(student_id)
            .await?
            .ok_or_else(|| DomainError::not_found("The student with this id does not exist"))?;

        let receipt_ids = self.payments.receipt_ids_for_student(student_id).await?;
        Ok(StudentReceiptsResponse { receipt_ids })
    }
}
