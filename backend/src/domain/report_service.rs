use std::collections::HashSet;

use tracing::info;

use crate::domain::auth::{self, ROLE_ADMIN, ROLE_FACULTY};
use crate::domain::error::DomainResult;
use crate::storage::{FeeRepository, PaymentRepository};
use shared::{FinanceSummary, User};

/// Service for financial reporting aggregates
#[derive(Clone)]
pub struct ReportService {
    fees: FeeRepository,
    payments: PaymentRepository,
}

impl ReportService {
    pub fn new(fees: FeeRepository, payments: PaymentRepository) -> Self {
        Self { fees, payments }
    }

    /// Financial summary over two independent filtered scans. Admin and
    /// faculty only.
    ///
    /// Fees are filtered by student/semester, payments by student/date
    /// range; `total_pending` subtracts across those two sets, so callers
    /// must apply matching filters to get a coherent pending figure.
    pub async fn financial_summary(
        &self,
        caller: &User,
        student_id: Option<i64>,
        semester_id: Option<i64>,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> DomainResult<FinanceSummary> {
        auth::require_any_role(caller, &[ROLE_ADMIN, ROLE_FACULTY])?;

        let fees = self.fees.list_student_fees(student_id, semester_id, -1, 0).await?;
        let payments = self
            .payments
            .list_payments(student_id, None, start_date, end_date, -1, 0)
            .await?;

        let total_fees: f64 = fees.iter().map(|fee| fee.amount).sum();
        let total_paid: f64 = payments.iter().map(|p| p.payment.amount).sum();
        let students: HashSet<i64> = fees.iter().map(|fee| fee.student_id).collect();

        let summary = FinanceSummary {
            total_fees,
            total_paid,
            total_pending: total_fees - total_paid,
            student_count: students.len() as i64,
            payment_count: payments.len() as i64,
        };

        info!(
            "Financial summary: fees {:.2}, paid {:.2}, pending {:.2} over {} students",
            summary.total_fees, summary.total_paid, summary.total_pending, summary.student_count
        );
        Ok(summary)
    }
}
