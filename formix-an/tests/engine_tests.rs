//! Opaque-id facade tests
//!
//! - Input validation happens before any storage access
//! - Returned ids are encoded, series are newest first and bounded
//! - Collaborator stores can be swapped out

mod common;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use common::*;
use formix_an::db::field_reports;
use formix_an::services::{AnalyticsEngine, GenerateOutcome, VisitCounter};
use formix_an::stores::{FormSchemaStore, SubmissionStore};
use formix_common::db::Distribution;
use formix_common::forms::{
    AnswerRecord, Field, FieldGroup, FieldKind, FieldProperties, Form, SubmissionRecord,
};
use formix_common::{Error, IdentifierCodec, Result, UuidIdCodec};
use serde_json::json;
use std::sync::Arc;

fn engine(pool: &sqlx::SqlitePool) -> AnalyticsEngine {
    AnalyticsEngine::with_default_codec(pool.clone(), settings())
}

fn external(id: i64) -> String {
    UuidIdCodec.encode(id)
}

#[tokio::test]
async fn test_range_rejected_before_storage() {
    let db = test_db().await;
    let engine = engine(&db.pool);
    db.pool.close().await;

    for range in [6, 400] {
        let result = engine.get_summary(&external(1), range).await;
        assert!(
            matches!(result, Err(Error::InvalidInput(_))),
            "range {} should be rejected as input, got {:?}",
            range,
            result
        );
    }

    // A valid range does reach the (closed) store
    let result = engine.get_summary(&external(1), 30).await;
    assert!(matches!(result, Err(Error::Database(_))), "got {:?}", result);
}

#[tokio::test]
async fn test_malformed_id_rejected_before_storage() {
    let db = test_db().await;
    let engine = engine(&db.pool);
    db.pool.close().await;

    assert!(matches!(engine.record_visit("not-an-id").await, Err(Error::InvalidInput(_))));
    assert!(matches!(engine.record_submission("", 10).await, Err(Error::InvalidInput(_))));
    assert!(matches!(engine.generate_report("12345").await, Err(Error::InvalidInput(_))));
    assert!(matches!(engine.get_report("zzz").await, Err(Error::InvalidInput(_))));
    assert!(matches!(
        engine.get_summary("00000000-0000-0000-0000-000000000000", 7).await,
        Err(Error::InvalidInput(_))
    ));
}

#[tokio::test]
async fn test_summary_newest_first_and_bounded() {
    let db = test_db().await;
    let engine = engine(&db.pool);
    let counter = VisitCounter::new(db.pool.clone(), utc(), 5000);
    let now = Utc::now();

    for days_ago in 0..10 {
        counter
            .record_visit_at(4, now - Duration::days(days_ago))
            .await
            .unwrap();
    }
    counter.record_visit_at(4, now + Duration::days(2)).await.unwrap();

    let summary = engine.get_summary(&external(4), 7).await.unwrap();

    assert_eq!(summary.len(), 7);
    assert!(summary.iter().all(|day| day.form_id == external(4)));
    assert!(summary.windows(2).all(|w| w[0].day_start > w[1].day_start));
    assert_eq!(summary[0].day, now.date_naive(), "tomorrow+1 is excluded");
}

#[tokio::test]
async fn test_visit_and_submission_through_engine() {
    let db = test_db().await;
    let engine = engine(&db.pool);
    let form = external(2);

    engine.record_visit(&form).await.unwrap();
    engine.record_visit(&form).await.unwrap();
    engine.record_submission(&form, 30).await.unwrap();
    engine.record_submission(&form, 45).await.unwrap();

    let summary = engine.get_summary(&form, 7).await.unwrap();
    assert_eq!(summary.len(), 1);
    assert_eq!(summary[0].total_visits, 2);
    assert_eq!(summary[0].submission_count, 2);
    assert_eq!(summary[0].average_duration_seconds, 37);
}

#[tokio::test]
async fn test_negative_duration_is_input_error() {
    let db = test_db().await;
    let result = engine(&db.pool).record_submission(&external(1), -1).await;
    assert!(matches!(result, Err(Error::InvalidInput(_))));
}

#[tokio::test]
async fn test_complete_submission_refreshes_reports() {
    let db = test_db().await;
    let form_id = insert_form(&db.pool, "Feedback").await;
    let group = insert_group(&db.pool, form_id, 0).await;
    let yes_no = insert_field(&db.pool, group, 0, "yes_no", Some(choices(&["yes", "no"]))).await;
    insert_submission(&db.pool, form_id, 1_700_000_000, &[(yes_no, "yes_no", json!("yes"))]).await;
    let engine = engine(&db.pool);

    let outcome = engine.complete_submission(&external(form_id), 12).await.unwrap();

    assert_eq!(outcome, Some(GenerateOutcome::Refreshed { fields_reported: 1, rows_changed: 1 }));
    let report = engine.get_report(&external(form_id)).await.unwrap();
    assert_eq!(report.len(), 1);
    assert_eq!(report[0].field_id, external(yes_no));
    assert_eq!(report[0].total, 1);
    let summary = engine.get_summary(&external(form_id), 7).await.unwrap();
    assert_eq!(summary[0].submission_count, 1);
}

#[tokio::test]
async fn test_report_in_document_order_with_encoded_ids() {
    let db = test_db().await;
    let form_id = insert_form(&db.pool, "Ordered").await;
    let second_group = insert_group(&db.pool, form_id, 1).await;
    let first_group = insert_group(&db.pool, form_id, 0).await;
    let late = insert_field(&db.pool, second_group, 0, "rating", None).await;
    let early_b = insert_field(&db.pool, first_group, 1, "opinion_scale", None).await;
    let early_a = insert_field(&db.pool, first_group, 0, "rating", None).await;
    insert_submission(
        &db.pool,
        form_id,
        1_700_000_000,
        &[
            (late, "rating", json!(1)),
            (early_b, "opinion_scale", json!(2)),
            (early_a, "rating", json!(3)),
        ],
    )
    .await;
    let engine = engine(&db.pool);

    engine.generate_report(&external(form_id)).await.unwrap();
    let ids: Vec<String> = engine
        .get_report(&external(form_id))
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.field_id)
        .collect();

    assert_eq!(ids, vec![external(early_a), external(early_b), external(late)]);
}

#[tokio::test]
async fn test_read_report_lists_recent_raw_answers() {
    let db = test_db().await;
    let form_id = insert_form(&db.pool, "Mixed").await;
    let group = insert_group(&db.pool, form_id, 0).await;
    let intro = insert_field(&db.pool, group, 0, "statement", None).await;
    let comment = insert_field(&db.pool, group, 1, "long_text", None).await;
    let rating = insert_field(&db.pool, group, 2, "rating", None).await;
    for i in 0..7 {
        insert_submission(
            &db.pool,
            form_id,
            1_700_000_000 + i,
            &[
                (comment, "long_text", json!(format!("comment {}", i))),
                (rating, "rating", json!(3)),
            ],
        )
        .await;
    }
    let engine = engine(&db.pool);

    let report = engine.read_report(&external(form_id)).await.unwrap();

    assert_eq!(report.total_submissions, 7);
    assert_eq!(report.responses.len(), 1);
    assert_eq!(report.responses[0].field_id, external(rating));
    assert_eq!(report.submissions.len(), 1, "statements and aggregated fields are not listed");
    assert_eq!(report.submissions[0].field_id, external(comment));
    assert_ne!(report.submissions[0].field_id, external(intro));
    assert_eq!(
        report.submissions[0].answers,
        vec![
            json!("comment 6"),
            json!("comment 5"),
            json!("comment 4"),
            json!("comment 3"),
            json!("comment 2"),
        ]
    );
}

/// In-memory collaborators standing in for the form CRUD layer
struct FixedForm(Form);

#[async_trait]
impl FormSchemaStore for FixedForm {
    async fn get_form(&self, form_id: i64) -> Result<Option<Form>> {
        Ok((form_id == self.0.id).then(|| self.0.clone()))
    }
}

struct FixedSubmissions(Vec<SubmissionRecord>);

#[async_trait]
impl SubmissionStore for FixedSubmissions {
    async fn list_submissions(&self, form_id: i64) -> Result<Vec<SubmissionRecord>> {
        Ok(self.0.iter().filter(|s| s.form_id == form_id).cloned().collect())
    }

    async fn list_answers_for_field(&self, field_id: i64) -> Result<Vec<AnswerRecord>> {
        Ok(self
            .0
            .iter()
            .flat_map(|s| s.answers.iter())
            .filter(|a| a.field_id == field_id)
            .cloned()
            .collect())
    }

    async fn count_submissions(&self, form_id: i64) -> Result<i64> {
        Ok(self.list_submissions(form_id).await?.len() as i64)
    }

    async fn list_recent_answers(&self, field_id: i64, limit: u32) -> Result<Vec<AnswerRecord>> {
        let mut answers = self.list_answers_for_field(field_id).await?;
        answers.reverse();
        answers.truncate(limit as usize);
        Ok(answers)
    }
}

#[tokio::test]
async fn test_injected_stores_drive_generation() {
    let db = test_db().await;
    let form = Form {
        id: 50,
        name: "Injected".to_string(),
        groups: vec![FieldGroup {
            id: 1,
            position: 0,
            title: None,
            fields: vec![Field {
                id: 500,
                kind: FieldKind::OpinionScale,
                title: Some("How likely?".to_string()),
                properties: FieldProperties {
                    choices: vec![],
                    total: Some(10),
                },
            }],
        }],
    };
    let submissions = (1..=3)
        .map(|id| SubmissionRecord {
            id,
            form_id: 50,
            start_at: 0,
            end_at: 10,
            answers: vec![AnswerRecord {
                submission_id: id,
                field_id: 500,
                kind: FieldKind::OpinionScale,
                value: json!(id * 3),
            }],
        })
        .collect();
    let engine = AnalyticsEngine::with_stores(
        db.pool.clone(),
        settings(),
        Arc::new(UuidIdCodec),
        Arc::new(FixedForm(form)),
        Arc::new(FixedSubmissions(submissions)),
    );

    let outcome = engine.generate_report(&external(50)).await.unwrap();

    assert_eq!(outcome, GenerateOutcome::Refreshed { fields_reported: 1, rows_changed: 1 });
    let report = field_reports::find_by_field(&db.pool, 500).await.unwrap().unwrap();
    assert_eq!(report.average, 6.0);
    assert_eq!(
        report.distribution,
        Distribution::Scale(vec![0, 0, 1, 0, 0, 1, 0, 0, 1, 0])
    );
}

/// Submission store whose reads always fail
struct UnavailableSubmissions;

#[async_trait]
impl SubmissionStore for UnavailableSubmissions {
    async fn list_submissions(&self, _form_id: i64) -> Result<Vec<SubmissionRecord>> {
        Err(Error::Internal("submission store unavailable".to_string()))
    }

    async fn list_answers_for_field(&self, _field_id: i64) -> Result<Vec<AnswerRecord>> {
        Err(Error::Internal("submission store unavailable".to_string()))
    }

    async fn count_submissions(&self, _form_id: i64) -> Result<i64> {
        Err(Error::Internal("submission store unavailable".to_string()))
    }

    async fn list_recent_answers(&self, _field_id: i64, _limit: u32) -> Result<Vec<AnswerRecord>> {
        Err(Error::Internal("submission store unavailable".to_string()))
    }
}

#[tokio::test]
async fn test_failed_refresh_does_not_fail_counted_submission() {
    let db = test_db().await;
    let form = Form {
        id: 60,
        name: "Unreachable".to_string(),
        groups: vec![FieldGroup {
            id: 1,
            position: 0,
            title: None,
            fields: vec![Field {
                id: 600,
                kind: FieldKind::Rating,
                title: None,
                properties: FieldProperties::default(),
            }],
        }],
    };
    let engine = AnalyticsEngine::with_stores(
        db.pool.clone(),
        settings(),
        Arc::new(UuidIdCodec),
        Arc::new(FixedForm(form)),
        Arc::new(UnavailableSubmissions),
    );

    let outcome = engine.complete_submission(&external(60), 30).await;

    assert!(matches!(outcome, Ok(None)), "got {:?}", outcome);
    let summary = engine.get_summary(&external(60), 7).await.unwrap();
    assert_eq!(summary[0].submission_count, 1);
    assert!(field_reports::find_by_field(&db.pool, 600).await.unwrap().is_none());
    assert!(engine.generate_report(&external(60)).await.is_err(), "explicit refresh still reports the failure");
}
