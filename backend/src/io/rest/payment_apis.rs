//! # REST API for Payments
//!
//! Recording payments (with their atomically created receipts) and listing
//! payment history.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use tracing::info;

use crate::io::rest::error::ApiResult;
use crate::io::rest::extractors::Caller;
use crate::AppState;
use shared::CreatePaymentRequest;

#[derive(Debug, Deserialize)]
pub struct PaymentListQuery {
    pub student_id: Option<i64>,
    pub student_fee_id: Option<i64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Record a payment and derive its receipt
pub async fn create_payment(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Json(request): Json<CreatePaymentRequest>,
) -> ApiResult<impl IntoResponse> {
    info!(
        "POST /api/payments - student: {}, fee: {}, amount: {:.2}",
        request.student_id, request.student_fee_id, request.amount
    );

    let created = state.payment_service.create_payment(&caller, request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// List payments with receipts (students see only their own)
pub async fn list_payments(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Query(query): Query<PaymentListQuery>,
) -> ApiResult<impl IntoResponse> {
    info!("GET /api/payments - query: {:?}", query);

    let payments = state
        .payment_service
        .list_payments(
            &caller,
            query.student_id,
            query.student_fee_id,
            query.start_date.as_deref(),
            query.end_date.as_deref(),
            query.limit.unwrap_or(100),
            query.offset.unwrap_or(0),
        )
        .await?;
    Ok(Json(payments))
}
