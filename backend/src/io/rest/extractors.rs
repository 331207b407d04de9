//! Caller identity extractor.
//!
//! Token issuance and validation belong to the upstream gateway; requests
//! arrive with a trusted `X-User-Id` header. The extractor resolves it to a
//! user with its role set, rejecting unknown or inactive callers before any
//! role check runs.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::io::rest::error::ApiError;
use crate::AppState;
use shared::User;

const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated caller, with roles loaded
pub struct Caller(pub User);

#[axum::async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Missing X-User-Id header"))?;

        let user_id: i64 = raw
            .trim()
            .parse()
            .map_err(|_| ApiError::unauthorized("Invalid X-User-Id header"))?;

        let user = state
            .user_service
            .find_caller(user_id)
            .await
            .map_err(ApiError::from)?
            .ok_or_else(|| ApiError::unauthorized("Unknown user"))?;

        if !user.is_active {
            return Err(ApiError::unauthorized("Inactive user"));
        }

        Ok(Caller(user))
    }
}
