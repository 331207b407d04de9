use serde::{Deserialize, Serialize};

/// A user account known to the system.
///
/// Role membership drives authorization everywhere: `admin` manages the
/// catalog and finances, `faculty` reads financial data, `student` owns fees
/// and payments. Credential material is handled by the upstream auth gateway
/// and never stored here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    /// Unique login email
    pub email: String,
    pub full_name: Option<String>,
    pub is_active: bool,
    /// Role names attached to this user (`admin`, `faculty`, `student`, ...)
    pub roles: Vec<String>,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub full_name: Option<String>,
    /// Defaults to active when omitted
    pub is_active: Option<bool>,
    /// Role names to attach; unknown roles are created on the fly
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub is_active: Option<bool>,
    /// When present, replaces the user's role set wholesale
    pub roles: Option<Vec<String>>,
}

/// Top-level academic organizational unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Institute {
    pub id: i64,
    pub name: String,
    /// Short unique code, e.g. "SOE"
    pub code: String,
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateInstituteRequest {
    pub name: String,
    pub code: String,
    pub description: Option<String>,
}

/// A program of study owned by an institute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: i64,
    pub institute_id: i64,
    pub name: String,
    /// Unique course code, e.g. "BSC-CS"; upper-cased into receipt numbers
    pub code: String,
    pub duration_years: i64,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateCourseRequest {
    pub institute_id: i64,
    pub name: String,
    pub code: String,
    pub duration_years: i64,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

/// Granularity of a semester record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemesterKind {
    /// A half-year term
    Semester,
    /// A full academic year
    Year,
}

impl SemesterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SemesterKind::Semester => "semester",
            SemesterKind::Year => "year",
        }
    }
}

/// A time-bounded division of a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Semester {
    pub id: i64,
    pub course_id: i64,
    pub name: String,
    pub kind: SemesterKind,
    /// Ordinal position within the course (1-based)
    pub position: i64,
    /// RFC 3339; end_date is always >= start_date
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateSemesterRequest {
    pub course_id: i64,
    pub name: String,
    pub kind: SemesterKind,
    pub position: i64,
    pub start_date: String,
    pub end_date: String,
}

/// Default fee amount for a (course, semester) pair.
///
/// At most one standard fee exists per pair; it is the fallback when a
/// student fee is created without an explicit amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardFee {
    pub id: i64,
    pub course_id: i64,
    pub semester_id: i64,
    pub name: String,
    pub amount: f64,
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateStandardFeeRequest {
    pub course_id: i64,
    pub semester_id: i64,
    pub name: String,
    pub amount: f64,
    pub description: Option<String>,
}

/// Full-record update; the (course, semester) pair may move as long as the
/// destination pair is free.
pub type UpdateStandardFeeRequest = CreateStandardFeeRequest;

/// One student's fee obligation for a course semester.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentFee {
    pub id: i64,
    pub student_id: i64,
    pub course_id: i64,
    pub semester_id: i64,
    pub amount: f64,
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateStudentFeeRequest {
    pub student_id: i64,
    pub course_id: i64,
    pub semester_id: i64,
    /// When omitted, resolved from the matching standard fee
    pub amount: Option<f64>,
    pub description: Option<String>,
}

/// A monetary transaction against one student fee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub student_id: i64,
    pub student_fee_id: i64,
    pub amount: f64,
    pub payment_method: String,
    /// External transaction reference; unique when present
    pub transaction_id: Option<String>,
    pub notes: Option<String>,
    /// RFC 3339, set at insertion time
    pub payment_date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatePaymentRequest {
    pub student_id: i64,
    pub student_fee_id: i64,
    pub amount: f64,
    pub payment_method: String,
    pub transaction_id: Option<String>,
    pub notes: Option<String>,
}

/// Immutable proof-of-payment record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub id: i64,
    pub payment_id: i64,
    /// Derived as RCPT-{payment}-{COURSE}-{SEMESTER}-{timestamp}
    pub receipt_number: String,
    pub generated_at: String,
    /// Optional cached rendering; regeneration is deterministic so readers
    /// never depend on it
    pub document_path: Option<String>,
}

/// A payment together with the receipt created atomically alongside it.
///
/// The pairing is a store invariant: no payment is ever visible without its
/// receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentWithReceipt {
    pub payment: Payment,
    pub receipt: Receipt,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrollResponse {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentReceiptsResponse {
    pub receipt_ids: Vec<i64>,
}

/// Aggregates over independently filtered fee and payment scans.
///
/// `total_pending` is `total_fees - total_paid` across the two sets; callers
/// must apply matching filters to both scans for a coherent pending figure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinanceSummary {
    pub total_fees: f64,
    pub total_paid: f64,
    pub total_pending: f64,
    /// Distinct students among the filtered fees
    pub student_count: i64,
    /// Number of filtered payments
    pub payment_count: i64,
}
