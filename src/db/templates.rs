//! Template rows: the durable side of the template model.
//!
//! The full template is stored as a JSON `definition` column; the flat
//! columns exist for listing and filtering without deserializing every row.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, Result, params};
use serde::Serialize;

use crate::domain::ProblemTemplate;
use crate::engine::practice::{StoreError, TemplateSource};

/// Flat listing row for browsers and the merged catalog.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateSummary {
  pub id: String,
  pub name: String,
  pub category: String,
  pub subcategory: Option<String>,
  pub difficulty: String,
  pub question_type: String,
  pub tags: Vec<String>,
  pub updated_at: DateTime<Utc>,
}

pub fn insert_template(conn: &Connection, template: &ProblemTemplate) -> Result<()> {
  let definition = to_json(template)?;
  let tags = serde_json::to_string(&template.tags).unwrap_or_else(|_| "[]".to_string());
  conn.execute(
    r#"
    INSERT INTO problem_templates (id, name, category, subcategory, difficulty, question_type,
                                   tags, definition, is_active, created_at, updated_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
    "#,
    params![
      template.id,
      template.name,
      template.category,
      template.subcategory,
      template.difficulty.as_str(),
      template.question_type.as_str(),
      tags,
      definition,
      template.is_active as i64,
      template.created_at.to_rfc3339(),
      template.updated_at.to_rfc3339(),
    ],
  )?;
  Ok(())
}

pub fn get_template(conn: &Connection, id: &str) -> Result<Option<ProblemTemplate>> {
  let mut stmt =
    conn.prepare("SELECT definition, is_active FROM problem_templates WHERE id = ?1")?;
  let mut rows = stmt.query(params![id])?;
  if let Some(row) = rows.next()? {
    let definition: String = row.get(0)?;
    let is_active: i64 = row.get(1)?;
    let mut template = from_json(&definition)?;
    // The column is authoritative: soft delete flips it without rewriting
    // the definition JSON
    template.is_active = is_active != 0;
    Ok(Some(template))
  } else {
    Ok(None)
  }
}

pub fn list_active_templates(conn: &Connection) -> Result<Vec<TemplateSummary>> {
  let mut stmt = conn.prepare(
    r#"
    SELECT id, name, category, subcategory, difficulty, question_type, tags, updated_at
    FROM problem_templates
    WHERE is_active = 1
    ORDER BY category, name
    "#,
  )?;

  let summaries = stmt
    .query_map([], row_to_summary)?
    .collect::<Result<Vec<_>>>()?;
  Ok(summaries)
}

/// Overwrite a template row in place (same id).
pub fn update_template(conn: &Connection, template: &ProblemTemplate) -> Result<bool> {
  let definition = to_json(template)?;
  let tags = serde_json::to_string(&template.tags).unwrap_or_else(|_| "[]".to_string());
  let changed = conn.execute(
    r#"
    UPDATE problem_templates
    SET name = ?2, category = ?3, subcategory = ?4, difficulty = ?5, question_type = ?6,
        tags = ?7, definition = ?8, is_active = ?9, updated_at = ?10
    WHERE id = ?1
    "#,
    params![
      template.id,
      template.name,
      template.category,
      template.subcategory,
      template.difficulty.as_str(),
      template.question_type.as_str(),
      tags,
      definition,
      template.is_active as i64,
      template.updated_at.to_rfc3339(),
    ],
  )?;
  Ok(changed > 0)
}

/// Soft delete: flip `is_active` off, never drop the row.
pub fn soft_delete_template(conn: &Connection, id: &str) -> Result<bool> {
  let changed = conn.execute(
    "UPDATE problem_templates SET is_active = 0, updated_at = ?2 WHERE id = ?1",
    params![id, Utc::now().to_rfc3339()],
  )?;
  Ok(changed > 0)
}

pub fn count_active_templates(conn: &Connection) -> Result<i64> {
  conn.query_row("SELECT COUNT(*) FROM problem_templates WHERE is_active = 1", [], |row| {
    row.get(0)
  })
}

fn row_to_summary(row: &rusqlite::Row) -> Result<TemplateSummary> {
  let tags_json: String = row.get(6)?;
  let updated_at_str: String = row.get(7)?;
  Ok(TemplateSummary {
    id: row.get(0)?,
    name: row.get(1)?,
    category: row.get(2)?,
    subcategory: row.get(3)?,
    difficulty: row.get(4)?,
    question_type: row.get(5)?,
    tags: serde_json::from_str(&tags_json).unwrap_or_default(),
    updated_at: DateTime::parse_from_rfc3339(&updated_at_str)
      .map(|dt| dt.with_timezone(&Utc))
      .unwrap_or_else(|_| Utc::now()),
  })
}

fn to_json(template: &ProblemTemplate) -> Result<String> {
  serde_json::to_string(template)
    .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

fn from_json(definition: &str) -> Result<ProblemTemplate> {
  serde_json::from_str(definition).map_err(|e| {
    rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
  })
}

/// [`TemplateSource`] over a borrowed connection, for the session manager.
pub struct SqliteTemplates<'a> {
  pub conn: &'a Connection,
}

impl TemplateSource for SqliteTemplates<'_> {
  fn get(&self, id: &str) -> std::result::Result<Option<ProblemTemplate>, StoreError> {
    get_template(self.conn, id).map_err(|e| StoreError(e.to_string()))
  }
}
