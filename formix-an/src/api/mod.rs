//! HTTP API handlers for formix-an
//!
//! Handlers only extract request parts and call the engine; every
//! validation rule lives behind `AnalyticsEngine`.

pub mod analytics;
pub mod health;
pub mod reports;

pub use analytics::analytics_routes;
pub use health::health_routes;
pub use reports::report_routes;
