//! # REST API for User Management
//!
//! Admin-only endpoints for creating, retrieving, and updating users and
//! their role sets.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use tracing::info;

use crate::io::rest::error::ApiResult;
use crate::io::rest::extractors::Caller;
use crate::AppState;
use shared::{CreateUserRequest, UpdateUserRequest};

#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Create a new user
pub async fn create_user(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Json(request): Json<CreateUserRequest>,
) -> ApiResult<impl IntoResponse> {
    info!("POST /api/users - email: {}", request.email);

    let user = state.user_service.create_user(&caller, request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// List users
pub async fn list_users(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Query(query): Query<UserListQuery>,
) -> ApiResult<impl IntoResponse> {
    info!("GET /api/users");

    let users = state
        .user_service
        .list_users(&caller, query.limit.unwrap_or(100), query.offset.unwrap_or(0))
        .await?;
    Ok(Json(users))
}

/// Get a user by ID
pub async fn get_user(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(user_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    info!("GET /api/users/{}", user_id);

    let user = state.user_service.get_user(&caller, user_id).await?;
    Ok(Json(user))
}

/// Update a user
pub async fn update_user(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(user_id): Path<i64>,
    Json(request): Json<UpdateUserRequest>,
) -> ApiResult<impl IntoResponse> {
    info!("PUT /api/users/{}", user_id);

    let user = state.user_service.update_user(&caller, user_id, request).await?;
    Ok(Json(user))
}
