//! # REST API Interface Layer
//!
//! HTTP endpoints for the university administration backend. This layer
//! handles:
//! - Request/response serialization
//! - Caller identity resolution (`X-User-Id` header)
//! - Error translation from the domain taxonomy to HTTP status codes
//! - Request logging
//!
//! Business logic stays in the domain layer; handlers are pure translation.

pub mod academic_apis;
pub mod error;
pub mod extractors;
pub mod fee_apis;
pub mod payment_apis;
pub mod receipt_apis;
pub mod report_apis;
pub mod user_apis;
