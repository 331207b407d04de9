//! # REST API for Fees
//!
//! Standard fee administration and student fee obligations.

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
use shared::{CreateStandardFeeRequest, CreateStudentFeeRequest, UpdateStandardFeeRequest};

#[derive(Debug, Deserialize)]
pub struct StandardFeeListQuery {
    pub course_id: Option<i64>,
    pub semester_id: Option<i64>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct StudentFeeListQuery {
    pub student_id: Option<i64>,
    pub semester_id: Option<i64>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Create a new standard fee
pub async fn create_standard_fee(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Json(request): Json<CreateStandardFeeRequest>,
) -> ApiResult<impl IntoResponse> {
    info!(
        "POST /api/standard-fees - course: {}, semester: {}",
        request.course_id, request.semester_id
    );

    let fee = state.fee_service.create_standard_fee(&caller, request).await?;
    Ok((StatusCode::CREATED, Json(fee)))
}

/// List standard fees
pub async fn list_standard_fees(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Query(query): Query<StandardFeeListQuery>,
) -> ApiResult<impl IntoResponse> {
    info!("GET /api/standard-fees - query: {:?}", query);

    let fees = state
        .fee_service
        .list_standard_fees(
            &caller,
            query.course_id,
            query.semester_id,
            query.limit.unwrap_or(100),
            query.offset.unwrap_or(0),
        )
        .await?;
    Ok(Json(fees))
}

/// Update a standard fee
pub async fn update_standard_fee(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(standard_fee_id): Path<i64>,
    Json(request): Json<UpdateStandardFeeRequest>,
) -> ApiResult<impl IntoResponse> {
    info!("PUT /api/standard-fees/{}", standard_fee_id);

    let fee = state
        .fee_service
        .update_standard_fee(&caller, standard_fee_id, request)
        .await?;
    Ok(Json(fee))
}

/// Delete a standard fee
pub async fn delete_standard_fee(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(standard_fee_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    info!("DELETE /api/standard-fees/{}", standard_fee_id);

    state.fee_service.delete_standard_fee(&caller, standard_fee_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Create a new student fee
pub async fn create_student_fee(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Json(request): Json<CreateStudentFeeRequest>,
) -> ApiResult<impl IntoResponse> {
    info!(
        "POST /api/student-fees - student: {}, course: {}, semester: {}",
        request.student_id, request.course_id, request.semester_id
    );

    let fee = state.fee_service.create_student_fee(&caller, request).await?;
    Ok((StatusCode::CREATED, Json(fee)))
}

/// List student fees (students see only their own)
pub async fn list_student_fees(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Query(query): Query<StudentFeeListQuery>,
) -> ApiResult<impl IntoResponse> {
    info!("GET /api/student-fees - query: {:?}", query);

    let fees = state
        .fee_service
        .list_student_fees(
            &caller,
            query.student_id,
            query.semester_id,
            query.limit.unwrap_or(100),
            query.offset.unwrap_or(0),
        )
        .await?;
    Ok(Json(fees))
}
