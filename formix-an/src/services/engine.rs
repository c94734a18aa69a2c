//! Analytics engine facade
//!
//! The only entry point that accepts opaque external ids. Every operation
//! validates its input and decodes ids before touching storage, and every
//! returned id is re-encoded.
//!
//! One engine is constructed per process and shared by reference (`Arc`)
//! with the request handlers; it holds no global state.

use chrono::{FixedOffset, NaiveDate};
use formix_common::config::ResolvedConfig;
use formix_common::db::{DailyAnalytic, Distribution, FieldReport};
use formix_common::forms::FieldKind;
use formix_common::{time, IdentifierCodec, Result, UuidIdCodec};
use serde::Serialize;
use serde_json::Value;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::db::field_reports;
use crate::services::analytics_query::{validate_range_days, AnalyticsQueryService};
use crate::services::field_report_aggregator::{FieldReportAggregator, GenerateOutcome};
use crate::services::kind_dispatch::handler_for;
use crate::services::visit_counter::VisitCounter;
use crate::stores::{
    FormSchemaStore, SqliteFormSchemaStore, SqliteSubmissionStore, SubmissionStore,
};

/// Raw answers listed per non-aggregated field on the report read path
pub const RECENT_ANSWER_LIMIT: u32 = 5;

/// Runtime knobs taken from the resolved configuration
#[derive(Debug, Clone, Copy)]
pub struct EngineSettings {
    pub utc_offset: FixedOffset,
    pub lock_retry_max_ms: u64,
}

impl From<&ResolvedConfig> for EngineSettings {
    fn from(config: &ResolvedConfig) -> Self {
        Self {
            utc_offset: config.utc_offset,
            lock_retry_max_ms: config.lock_retry_max_ms,
        }
    }
}

/// One day of the analytics series as returned to callers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    pub form_id: String,
    pub day: NaiveDate,
    pub day_start: i64,
    pub total_visits: i64,
    pub submission_count: i64,
    pub average_duration_seconds: i64,
}

/// A stored field report as returned to callers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldReportView {
    pub field_id: String,
    pub total: i64,
    pub count: i64,
    pub average: f64,
    pub distribution: Distribution,
}

/// Latest raw answers of a field that is not aggregated
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentAnswers {
    pub field_id: String,
    pub kind: FieldKind,
    pub answers: Vec<Value>,
}

/// Everything the report read path returns for one form
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormReport {
    pub responses: Vec<FieldReportView>,
    pub submissions: Vec<RecentAnswers>,
    pub total_submissions: i64,
}

pub struct AnalyticsEngine {
    codec: Arc<dyn IdentifierCodec>,
    forms: Arc<dyn FormSchemaStore>,
    submissions: Arc<dyn SubmissionStore>,
    visits: VisitCounter,
    aggregator: FieldReportAggregator,
    query: AnalyticsQueryService,
    pool: SqlitePool,
}

impl AnalyticsEngine {
    /// Engine over the SQLite stores of `pool`
    pub fn new(pool: SqlitePool, settings: EngineSettings, codec: Arc<dyn IdentifierCodec>) -> Self {
        let forms: Arc<dyn FormSchemaStore> = Arc::new(SqliteFormSchemaStore::new(pool.clone()));
        let submissions: Arc<dyn SubmissionStore> = Arc::new(SqliteSubmissionStore::new(pool.clone()));
        Self::with_stores(pool, settings, codec, forms, submissions)
    }

    /// Engine with the default `UuidIdCodec`
    pub fn with_default_codec(pool: SqlitePool, settings: EngineSettings) -> Self {
        Self::new(pool, settings, Arc::new(UuidIdCodec))
    }

    /// Engine reading forms and submissions through the given collaborators
    pub fn with_stores(
        pool: SqlitePool,
        settings: EngineSettings,
        codec: Arc<dyn IdentifierCodec>,
        forms: Arc<dyn FormSchemaStore>,
        submissions: Arc<dyn SubmissionStore>,
    ) -> Self {
        Self {
            codec,
            visits: VisitCounter::new(pool.clone(), settings.utc_offset, settings.lock_retry_max_ms),
            aggregator: FieldReportAggregator::new(forms.clone(), submissions.clone(), pool.clone()),
            query: AnalyticsQueryService::new(pool.clone()),
            forms,
            submissions,
            pool,
        }
    }

    pub async fn record_visit(&self, form_id: &str) -> Result<()> {
        let form_id = self.codec.decode(form_id)?;
        self.visits.record_visit(form_id).await
    }

    pub async fn record_submission(&self, form_id: &str, duration_seconds: i64) -> Result<()> {
        let form_id = self.codec.decode(form_id)?;
        self.visits.record_submission(form_id, duration_seconds).await
    }

    /// Count a completed submission, then refresh the form's field reports
    ///
    /// Only the counter write can fail the call, so an error always means the
    /// submission was not counted. A failed refresh is logged and reported as
    /// `None`; the next `generate_report` or report read catches up.
    pub async fn complete_submission(&self, form_id: &str, duration_seconds: i64) -> Result<Option<GenerateOutcome>> {
        let internal_id = self.codec.decode(form_id)?;
        self.visits.record_submission(internal_id, duration_seconds).await?;

        match self.aggregator.generate(internal_id).await {
            Ok(outcome) => Ok(Some(outcome)),
            Err(e) => {
                warn!(form_id = internal_id, error = %e, "Submission counted but report refresh failed");
                Ok(None)
            }
        }
    }

    /// Daily rows up to the end of today, newest first
    pub async fn get_summary(&self, form_id: &str, range_days: i64) -> Result<Vec<DailySummary>> {
        validate_range_days(range_days)?;
        let internal_id = self.codec.decode(form_id)?;

        let offset = *self.visits.utc_offset();
        let end_of_day = time::day_end(time::now(), &offset);
        let rows = self.query.daily_series(internal_id, end_of_day, range_days).await?;

        Ok(rows.into_iter().map(|row| self.summary_view(row, &offset)).collect())
    }

    pub async fn generate_report(&self, form_id: &str) -> Result<GenerateOutcome> {
        let internal_id = self.codec.decode(form_id)?;
        self.aggregator.generate(internal_id).await
    }

    /// Stored reports of the form's fields, in document order
    pub async fn get_report(&self, form_id: &str) -> Result<Vec<FieldReportView>> {
        let internal_id = self.codec.decode(form_id)?;
        let reports = field_reports::list_for_form(&self.pool, internal_id).await?;

        Ok(reports.into_iter().map(|report| self.report_view(report)).collect())
    }

    /// Latest raw answers of every answerable field that is not aggregated
    pub async fn recent_answers(&self, form_id: &str) -> Result<Vec<RecentAnswers>> {
        let internal_id = self.codec.decode(form_id)?;
        let Some(form) = self.forms.get_form(internal_id).await? else {
            return Ok(Vec::new());
        };

        let mut recent = Vec::new();
        for field in form.fields() {
            if field.kind.is_statement() || handler_for(&field.kind).is_some() {
                continue;
            }

            let answers = self
                .submissions
                .list_recent_answers(field.id, RECENT_ANSWER_LIMIT)
                .await?
                .into_iter()
                .map(|answer| answer.value)
                .filter(|value| !value.is_null())
                .collect();

            recent.push(RecentAnswers {
                field_id: self.codec.encode(field.id),
                kind: field.kind.clone(),
                answers,
            });
        }

        Ok(recent)
    }

    /// Refresh the reports, then read them back with the recent raw answers
    pub async fn read_report(&self, form_id: &str) -> Result<FormReport> {
        let internal_id = self.codec.decode(form_id)?;
        let outcome = self.aggregator.generate(internal_id).await?;
        debug!(form_id = internal_id, ?outcome, "Reports refreshed before read");

        Ok(FormReport {
            responses: self.get_report(form_id).await?,
            submissions: self.recent_answers(form_id).await?,
            total_submissions: self.submissions.count_submissions(internal_id).await?,
        })
    }

    fn summary_view(&self, row: DailyAnalytic, offset: &FixedOffset) -> DailySummary {
        DailySummary {
            form_id: self.codec.encode(row.form_id),
            day: time::day_label(row.day_start, offset),
            day_start: row.day_start,
            total_visits: row.total_visits,
            submission_count: row.submission_count,
            average_duration_seconds: row.average_duration_seconds,
        }
    }

    fn report_view(&self, report: FieldReport) -> FieldReportView {
        FieldReportView {
            field_id: self.codec.encode(report.field_id),
            total: report.total,
            count: report.count,
            average: report.average,
            distribution: report.distribution,
        }
    }
}
