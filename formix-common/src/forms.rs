//! Form schema and submission answer types
//!
//! These mirror what the form CRUD layer stores. The analytics engine only
//! reads them.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Closed set of field kinds
///
/// Tags this build does not know are kept as `Unknown` so that reading a
/// newer schema never fails; they are simply not aggregated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Statement,
    ShortText,
    LongText,
    Number,
    YesNo,
    MultipleChoice,
    PictureChoice,
    FileUpload,
    OpinionScale,
    Rating,
    Date,
    DateRange,
    Email,
    Url,
    PhoneNumber,
    Address,
    FullName,
    Unknown(String),
}

impl FieldKind {
    /// Parse a stored kind tag
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "statement" => FieldKind::Statement,
            "short_text" => FieldKind::ShortText,
            "long_text" => FieldKind::LongText,
            "number" => FieldKind::Number,
            "yes_no" => FieldKind::YesNo,
            "multiple_choice" => FieldKind::MultipleChoice,
            "picture_choice" => FieldKind::PictureChoice,
            "file_upload" => FieldKind::FileUpload,
            "opinion_scale" => FieldKind::OpinionScale,
            "rating" => FieldKind::Rating,
            "date" => FieldKind::Date,
            "date_range" => FieldKind::DateRange,
            "email" => FieldKind::Email,
            "url" => FieldKind::Url,
            "phone_number" => FieldKind::PhoneNumber,
            "address" => FieldKind::Address,
            "full_name" => FieldKind::FullName,
            other => FieldKind::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            FieldKind::Statement => "statement",
            FieldKind::ShortText => "short_text",
            FieldKind::LongText => "long_text",
            FieldKind::Number => "number",
            FieldKind::YesNo => "yes_no",
            FieldKind::MultipleChoice => "multiple_choice",
            FieldKind::PictureChoice => "picture_choice",
            FieldKind::FileUpload => "file_upload",
            FieldKind::OpinionScale => "opinion_scale",
            FieldKind::Rating => "rating",
            FieldKind::Date => "date",
            FieldKind::DateRange => "date_range",
            FieldKind::Email => "email",
            FieldKind::Url => "url",
            FieldKind::PhoneNumber => "phone_number",
            FieldKind::Address => "address",
            FieldKind::FullName => "full_name",
            FieldKind::Unknown(tag) => tag,
        }
    }

    /// Statement fields display content and never collect answers
    pub fn is_statement(&self) -> bool {
        matches!(self, FieldKind::Statement)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FieldKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FieldKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(FieldKind::from_tag(&tag))
    }
}

/// One selectable option of a choice field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub label: String,
}

/// Kind-specific field configuration. Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FieldProperties {
    /// Choice universe for yes/no, multiple-choice and picture-choice fields
    pub choices: Vec<Choice>,

    /// Scale size for rating and opinion-scale fields
    pub total: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub id: i64,
    pub kind: FieldKind,
    pub title: Option<String>,
    pub properties: FieldProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldGroup {
    pub id: i64,
    pub position: i64,
    pub title: Option<String>,
    /// Ordered by position
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Form {
    pub id: i64,
    pub name: String,
    /// Ordered by position
    pub groups: Vec<FieldGroup>,
}

impl Form {
    /// Fields in document order: group order, then field order within group
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.groups.iter().flat_map(|group| group.fields.iter())
    }

    pub fn has_fields(&self) -> bool {
        self.fields().next().is_some()
    }
}

/// One stored answer: a (submission, field) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub submission_id: i64,
    pub field_id: i64,
    pub kind: FieldKind,
    /// Shape depends on `kind`; `Value::Null` when absent or unreadable
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub id: i64,
    pub form_id: i64,
    pub start_at: i64,
    pub end_at: i64,
    pub answers: Vec<AnswerRecord>,
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}
