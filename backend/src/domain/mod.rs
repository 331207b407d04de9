//! Domain layer: business rules and services.
//!
//! Services own validation, authorization, and the operation semantics;
//! repositories underneath own the SQL. Every service method that mutates
//! state takes the authenticated caller so role gating cannot be bypassed.

pub mod academic_service;
pub mod auth;
pub mod error;
pub mod fee_service;
pub mod payment_service;
pub mod receipt_service;
pub mod report_service;
pub mod user_service;

pub use academic_service::AcademicService;
pub use error::{DomainError, DomainResult};
pub use fee_service::{FeeResolution, FeeService};
pub use payment_service::PaymentService;
pub use receipt_service::ReceiptService;
pub use report_service::ReportService;
pub use user_service::UserService;
