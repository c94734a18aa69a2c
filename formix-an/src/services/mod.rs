//! Analytics services

pub mod analytics_query;
pub mod engine;
pub mod field_report_aggregator;
pub mod kind_dispatch;
pub mod visit_counter;

pub use analytics_query::AnalyticsQueryService;
pub use engine::AnalyticsEngine;
pub use field_report_aggregator::{FieldReportAggregator, GenerateOutcome};
pub use visit_counter::VisitCounter;
