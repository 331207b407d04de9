//! # REST API for Financial Reporting

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use tracing::info;

use crate::io::rest::error::ApiResult;
use crate::io::rest::extractors::Caller;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub student_id: Option<i64>,
    pub semester_id: Option<i64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Financial summary over filtered fee and payment scans
pub async fn get_finance_summary(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Query(query): Query<SummaryQuery>,
) -> ApiResult<impl IntoResponse> {
    info!("GET /api/finance/summary - query: {:?}", query);

    let summary = state
        .report_service
        .financial_summary(
            &caller,
            query.student_id,
            query.semester_id,
            query.start_date.as_deref(),
            query.end_date.as_deref(),
        )
        .await?;
    Ok(Json(summary))
}
