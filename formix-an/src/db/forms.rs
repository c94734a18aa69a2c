//! Read-only form schema queries

use formix_common::forms::{Field, FieldGroup, FieldKind, FieldProperties, Form};
use formix_common::Result;
use sqlx::{Row, SqlitePool};
use tracing::warn;

/// Load a form with its groups and fields in document order
///
/// Returns `None` when the form does not exist.
pub async fn load_form(pool: &SqlitePool, form_id: i64) -> Result<Option<Form>> {
    let form_row = sqlx::query("SELECT id, name FROM forms WHERE id = ?")
        .bind(form_id)
        .fetch_optional(pool)
        .await?;

    let Some(form_row) = form_row else {
        return Ok(None);
    };

    let group_rows = sqlx::query(
        "SELECT id, position, title FROM form_field_groups WHERE form_id = ? ORDER BY position, id",
    )
    .bind(form_id)
    .fetch_all(pool)
    .await?;

    let mut groups: Vec<FieldGroup> = group_rows
        .iter()
        .map(|row| FieldGroup {
            id: row.get("id"),
            position: row.get("position"),
            title: row.get("title"),
            fields: Vec::new(),
        })
        .collect();

    let field_rows = sqlx::query(
        r#"
        SELECT f.id, f.group_id, f.title, f.kind, f.properties
        FROM form_fields f
        INNER JOIN form_field_groups g ON g.id = f.group_id
        WHERE g.form_id = ?
        ORDER BY f.position, f.id
        "#,
    )
    .bind(form_id)
    .fetch_all(pool)
    .await?;

    for row in &field_rows {
        let group_id: i64 = row.get("group_id");
        let field_id: i64 = row.get("id");
        let kind: String = row.get("kind");
        let properties: Option<String> = row.get("properties");

        let field = Field {
            id: field_id,
            kind: FieldKind::from_tag(&kind),
            title: row.get("title"),
            properties: parse_properties(field_id, properties.as_deref()),
        };

        if let Some(group) = groups.iter_mut().find(|g| g.id == group_id) {
            group.fields.push(field);
        }
    }

    Ok(Some(Form {
        id: form_row.get("id"),
        name: form_row.get("name"),
        groups,
    }))
}

/// Unreadable properties degrade to defaults rather than failing the load
fn parse_properties(field_id: i64, raw: Option<&str>) -> FieldProperties {
    match raw.map(str::trim) {
        None | Some("") | Some("null") => FieldProperties::default(),
        Some(json) => serde_json::from_str(json).unwrap_or_else(|e| {
            warn!(field_id, error = %e, "Ignoring unreadable field properties");
            FieldProperties::default()
        }),
    }
}
