//! formix-an library - Response Analytics & Field Report Engine
//!
//! Daily visit/submission rollups and materialized per-field reports,
//! served over a small HTTP API.

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod cli;
pub mod db;
pub mod error;
pub mod logging;
pub mod services;
pub mod stores;
pub mod utils;

pub use services::AnalyticsEngine;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<AnalyticsEngine>,
    /// Service startup timestamp for uptime calculation
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(engine: Arc<AnalyticsEngine>) -> Self {
        Self {
            engine,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::analytics_routes())
        .merge(api::report_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
