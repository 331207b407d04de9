//! # REST API for Receipts
//!
//! On-demand receipt document download and per-student receipt listing.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use tracing::info;

use crate::io::rest::error::{ApiError, ApiResult};
use crate::io::rest::extractors::Caller;
use crate::AppState;

/// Download a rendered receipt document
pub async fn download_receipt(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(receipt_id): Path<i64>,
) -> ApiResult<Response> {
    info!("GET /api/receipts/{}/download", receipt_id);

    let document = state.receipt_service.render_receipt(&caller, receipt_id).await?;

    let disposition = format!("attachment; filename=\"{}\"", document.file_name);
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, document.content_type)
        .header(header::CONTENT_DISPOSITION, disposition)
        .body(document.bytes.into())
        .map_err(|e| {
            tracing::error!("Failed to build receipt response: {}", e);
            ApiError::internal("Error generating receipt")
        })
}

/// List all receipt ids for a student
pub async fn get_student_receipts(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(student_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    info!("GET /api/students/{}/receipts", student_id);

    let receipts = state.receipt_service.student_receipts(&caller, student_id).await?;
    Ok(Json(receipts))
}
