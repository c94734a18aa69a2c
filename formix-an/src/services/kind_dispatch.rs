//! Per-kind aggregation handlers
//!
//! `handler_for` is the single place that decides which field kinds are
//! reported and how. Every kind is listed explicitly so that adding a kind
//! forces a decision here. A malformed answer is logged and skipped; it never
//! aborts the field.

use formix_common::db::{ChoiceCount, Distribution};
use formix_common::forms::{Field, FieldKind};
use serde_json::Value;
use tracing::{debug, warn};

/// Scale size used when a rating/opinion-scale field does not configure one
pub const DEFAULT_SCALE_SIZE: usize = 5;

/// Largest scale size honoured from field properties
pub const MAX_SCALE_SIZE: usize = 100;

/// Output of one handler run over a field's non-null answers
#[derive(Debug, Clone, PartialEq)]
pub struct Tally {
    pub distribution: Distribution,
    /// Sum of accepted numeric answers; zero for choice-shaped kinds
    pub sum: f64,
}

/// Aggregates the non-null answers of one field
pub type KindHandler = fn(&Field, &[&Value]) -> Tally;

/// Handler for a field kind, or `None` when the kind is not reported
pub fn handler_for(kind: &FieldKind) -> Option<KindHandler> {
    match kind {
        FieldKind::YesNo => Some(tally_yes_no),
        FieldKind::MultipleChoice | FieldKind::PictureChoice => Some(tally_choices),
        FieldKind::Rating | FieldKind::OpinionScale => Some(tally_scale),

        FieldKind::Statement
        | FieldKind::ShortText
        | FieldKind::LongText
        | FieldKind::Number
        | FieldKind::FileUpload
        | FieldKind::Date
        | FieldKind::DateRange
        | FieldKind::Email
        | FieldKind::Url
        | FieldKind::PhoneNumber
        | FieldKind::Address
        | FieldKind::FullName
        | FieldKind::Unknown(_) => None,
    }
}

/// Yes/no answers are a single scalar choice id
fn tally_yes_no(field: &Field, answers: &[&Value]) -> Tally {
    count_choices(field, answers, |value| scalar_choice_id(value).map(|id| vec![id]))
}

/// Multiple/picture choice answers: a scalar, an array of ids, or
/// `{ "value": [ids], "other": "..." }`
fn tally_choices(field: &Field, answers: &[&Value]) -> Tally {
    count_choices(field, answers, selected_choice_ids)
}

fn count_choices<F>(field: &Field, answers: &[&Value], selection: F) -> Tally
where
    F: Fn(&Value) -> Option<Vec<String>>,
{
    let choices = &field.properties.choices;
    if choices.is_empty() {
        warn!(field_id = field.id, kind = %field.kind, "Choice field has no choices configured");
    }

    let mut counts: Vec<ChoiceCount> = choices
        .iter()
        .map(|choice| ChoiceCount {
            id: choice.id.clone(),
            label: choice.label.clone(),
            count: 0,
        })
        .collect();

    for &answer in answers {
        let Some(selected) = selection(answer) else {
            debug!(field_id = field.id, answer = %answer, "Skipping unreadable choice answer");
            continue;
        };

        for entry in counts.iter_mut() {
            if selected.iter().any(|id| *id == entry.id) {
                entry.count += 1;
            }
        }
    }

    Tally {
        distribution: Distribution::Choices(counts),
        sum: 0.0,
    }
}

/// Buckets are 1-based: value `v` lands in index `v - 1`
fn tally_scale(field: &Field, answers: &[&Value]) -> Tally {
    let size = scale_size(field);
    let mut buckets = vec![0_i64; size];
    let mut sum = 0.0_f64;

    for &answer in answers {
        match scale_value(answer) {
            Some(value) if (1..=size as i64).contains(&value) => {
                buckets[(value - 1) as usize] += 1;
                sum += value as f64;
            }
            _ => {
                debug!(field_id = field.id, answer = %answer, scale = size, "Skipping out-of-range scale answer");
            }
        }
    }

    Tally {
        distribution: Distribution::Scale(buckets),
        sum,
    }
}

fn scale_size(field: &Field) -> usize {
    match field.properties.total.map(|t| t as usize) {
        None | Some(0) => DEFAULT_SCALE_SIZE,
        Some(size) if size > MAX_SCALE_SIZE => {
            warn!(field_id = field.id, size, "Scale size too large, using default");
            DEFAULT_SCALE_SIZE
        }
        Some(size) => size,
    }
}

/// Integral number or numeric string
fn scale_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn scalar_choice_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn selected_choice_ids(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) => Some(items.iter().filter_map(scalar_choice_id).collect()),
        Value::Object(map) => map.get("value").and_then(selected_choice_ids),
        scalar => scalar_choice_id(scalar).map(|id| vec![id]),
    }
}
