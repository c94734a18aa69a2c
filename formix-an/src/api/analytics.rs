//! Visit, submission and daily summary endpoints
//!
//! PUT /api/form-analytic/:form_id/visit
//! PUT /api/form-analytic/:form_id/submission
//! GET /api/form-analytic/:form_id?range=N

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;

use crate::error::ApiResult;
use crate::services::engine::DailySummary;
use crate::AppState;

/// Range used when the query string omits one
pub const DEFAULT_RANGE_DAYS: i64 = 7;

#[derive(Debug, Deserialize)]
pub struct SubmissionRequest {
    /// Seconds from form start to completion
    pub duration: i64,
}

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub range: Option<i64>,
}

/// PUT /api/form-analytic/:form_id/visit
pub async fn record_visit(
    State(state): State<AppState>,
    Path(form_id): Path<String>,
) -> ApiResult<StatusCode> {
    state.engine.record_visit(&form_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/form-analytic/:form_id/submission
///
/// Counts the submission and refreshes the form's field reports.
pub async fn record_submission(
    State(state): State<AppState>,
    Path(form_id): Path<String>,
    request: Result<Json<SubmissionRequest>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(request) = request?;
    let outcome = state
        .engine
        .complete_submission(&form_id, request.duration)
        .await?;

    tracing::debug!(form_id = %form_id, ?outcome, "Submission completed");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/form-analytic/:form_id?range=N
pub async fn get_summary(
    State(state): State<AppState>,
    Path(form_id): Path<String>,
    query: Result<Query<SummaryQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<DailySummary>>> {
    let Query(query) = query?;
    let range = query.range.unwrap_or(DEFAULT_RANGE_DAYS);
    let summary = state.engine.get_summary(&form_id, range).await?;
    Ok(Json(summary))
}

pub fn analytics_routes() -> Router<AppState> {
    Router::new()
        .route("/api/form-analytic/:form_id", get(get_summary))
        .route("/api/form-analytic/:form_id/visit", put(record_visit))
        .route("/api/form-analytic/:form_id/submission", put(record_submission))
}
