//! HTTP error envelope.
//!
//! Domain errors carry the taxonomy; this module maps them onto statuses
//! and a uniform JSON body so every endpoint fails the same way.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::domain::DomainError;

/// Structured API error response
#[derive(Debug)]
pub struct ApiError {
    pub message: String,
    pub status_code: StatusCode,
}

impl ApiError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: StatusCode::UNAUTHORIZED,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(error: DomainError) -> Self {
        let (status_code, message) = match error {
            DomainError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            DomainError::Conflict(message) => (StatusCode::CONFLICT, message),
            DomainError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            DomainError::Forbidden(message) => (StatusCode::FORBIDDEN, message),
            DomainError::Internal(cause) => {
                // Log the cause, surface a generic message
                error!("Internal error: {:?}", cause);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };
        Self { message, status_code }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": true,
            "message": self.message,
            "status": self.status_code.as_u16(),
        });
        (self.status_code, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
