//! Field report aggregator
//!
//! Rebuilds the materialized `FieldReport` rows of a form from the full
//! current set of submissions. Every run is a full recompute, so running it
//! twice, or twice concurrently, converges on the same rows.
//!
//! Each field is upserted in its own statement. A storage failure part way
//! through leaves earlier fields refreshed; the caller retries the whole run.

use formix_common::db::FieldReport;
use formix_common::forms::{Form, SubmissionRecord};
use formix_common::{time, Result};
use serde_json::Value;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::db::field_reports;
use crate::services::kind_dispatch::handler_for;
use crate::stores::{FormSchemaStore, SubmissionStore};

/// What a `generate` run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerateOutcome {
    /// Form does not exist
    MissingForm,
    /// Form has no groups or fields
    NoFields,
    /// Form has no submissions; existing reports were left in place
    NoSubmissions,
    Refreshed {
        /// Reports produced this run
        fields_reported: usize,
        /// Reports whose stored row was inserted or changed
        rows_changed: usize,
    },
}

pub struct FieldReportAggregator {
    forms: Arc<dyn FormSchemaStore>,
    submissions: Arc<dyn SubmissionStore>,
    pool: SqlitePool,
}

impl FieldReportAggregator {
    pub fn new(
        forms: Arc<dyn FormSchemaStore>,
        submissions: Arc<dyn SubmissionStore>,
        pool: SqlitePool,
    ) -> Self {
        Self {
            forms,
            submissions,
            pool,
        }
    }

    /// Recompute and store the reports of every aggregable field of a form
    pub async fn generate(&self, form_id: i64) -> Result<GenerateOutcome> {
        let Some(form) = self.forms.get_form(form_id).await? else {
            debug!(form_id, "Skipping report generation, form not found");
            return Ok(GenerateOutcome::MissingForm);
        };

        if !form.has_fields() {
            debug!(form_id, "Skipping report generation, form has no fields");
            return Ok(GenerateOutcome::NoFields);
        }

        let submissions = self.submissions.list_submissions(form_id).await?;
        if submissions.is_empty() {
            debug!(form_id, "Skipping report generation, no submissions");
            return Ok(GenerateOutcome::NoSubmissions);
        }

        let reports = build_reports(&form, &submissions);
        let now = time::now().timestamp();

        let mut rows_changed = 0;
        for report in &reports {
            if field_reports::upsert(&self.pool, report, now).await? {
                rows_changed += 1;
            }
        }

        info!(
            form_id,
            submissions = submissions.len(),
            fields_reported = reports.len(),
            rows_changed,
            "Field reports refreshed"
        );

        Ok(GenerateOutcome::Refreshed {
            fields_reported: reports.len(),
            rows_changed,
        })
    }
}

/// Compute reports for the aggregable fields of `form`, in document order
///
/// Fields without a handler, or with no non-null answers, produce nothing.
pub fn build_reports(form: &Form, submissions: &[SubmissionRecord]) -> Vec<FieldReport> {
    let total = submissions.len() as i64;

    let mut answers_by_field: HashMap<i64, Vec<&Value>> = HashMap::new();
    for submission in submissions {
        for answer in &submission.answers {
            if answer.value.is_null() {
                continue;
            }
            answers_by_field
                .entry(answer.field_id)
                .or_default()
                .push(&answer.value);
        }
    }

    let mut reports = Vec::new();
    for field in form.fields() {
        let Some(handler) = handler_for(&field.kind) else {
            continue;
        };

        let answers = answers_by_field
            .get(&field.id)
            .map(Vec::as_slice)
            .unwrap_or_default();
        if answers.is_empty() {
            continue;
        }

        let count = answers.len() as i64;
        let tally = handler(field, answers);

        reports.push(FieldReport {
            field_id: field.id,
            total,
            count,
            average: round_to_tenth(tally.sum / count as f64),
            distribution: tally.distribution,
        });
    }

    reports
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
