//! Field report endpoints

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::error::ApiResult;
use crate::services::engine::FormReport;
use crate::services::GenerateOutcome;
use crate::AppState;

/// POST /api/form-report/:form_id/generate response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    /// "refreshed" or the reason nothing was written
    pub status: String,
    pub fields_reported: usize,
    pub rows_changed: usize,
}

impl From<GenerateOutcome> for GenerateResponse {
    fn from(outcome: GenerateOutcome) -> Self {
        let (status, fields_reported, rows_changed) = match outcome {
            GenerateOutcome::MissingForm => ("missing_form", 0, 0),
            GenerateOutcome::NoFields => ("no_fields", 0, 0),
            GenerateOutcome::NoSubmissions => ("no_submissions", 0, 0),
            GenerateOutcome::Refreshed {
                fields_reported,
                rows_changed,
            } => ("refreshed", fields_reported, rows_changed),
        };

        Self {
            status: status.to_string(),
            fields_reported,
            rows_changed,
        }
    }
}

/// POST /api/form-report/:form_id/generate
pub async fn generate_report(
    State(state): State<AppState>,
    Path(form_id): Path<String>,
) -> ApiResult<Json<GenerateResponse>> {
    let outcome = state.engine.generate_report(&form_id).await?;
    Ok(Json(outcome.into()))
}

/// GET /api/form-report/:form_id
///
/// Refreshes the reports first, then returns them with the latest raw
/// answers of non-aggregated fields.
pub async fn get_report(
    State(state): State<AppState>,
    Path(form_id): Path<String>,
) -> ApiResult<Json<FormReport>> {
    let report = state.engine.read_report(&form_id).await?;
    Ok(Json(report))
}

pub fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/api/form-report/:form_id", get(get_report))
        .route("/api/form-report/:form_id/generate", post(generate_report))
}
