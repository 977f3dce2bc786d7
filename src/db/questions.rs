//! Published question bank rows.
//!
//! Publish persists generated problems durably, either `baked` (the literal
//! question JSON, frozen forever) or `dynamic` (only the generator reference;
//! the question is re-generated whenever the row is read, trading storage for
//! repeatable variety).

use chrono::{DateTime, Utc};
use rusqlite::{Connection, Result, params};
use serde::{Deserialize, Serialize};

use crate::domain::GeneratedProblem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishMode {
  Baked,
  Dynamic,
}

impl PublishMode {
  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "baked" => Some(Self::Baked),
      "dynamic" => Some(Self::Dynamic),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Baked => "baked",
      Self::Dynamic => "dynamic",
    }
  }
}

/// One row of the durable question bank.
#[derive(Debug, Clone, Serialize)]
pub struct PublishedQuestion {
  pub id: String,
  /// External generator reference (`tmpl:<id>` or bare catalog id)
  pub source: String,
  pub mode: PublishMode,
  /// Present for baked rows; None for dynamic rows
  pub question: Option<GeneratedProblem>,
  pub created_at: DateTime<Utc>,
}

pub fn insert_published_question(conn: &Connection, row: &PublishedQuestion) -> Result<()> {
  let question = match &row.question {
    Some(problem) => Some(
      serde_json::to_string(problem)
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?,
    ),
    None => None,
  };

  conn.execute(
    r#"
    INSERT INTO published_questions (id, source, mode, question, created_at)
    VALUES (?1, ?2, ?3, ?4, ?5)
    "#,
    params![row.id, row.source, row.mode.as_str(), question, row.created_at.to_rfc3339()],
  )?;
  Ok(())
}

pub fn list_published_questions(conn: &Connection) -> Result<Vec<PublishedQuestion>> {
  let mut stmt = conn.prepare(
    r#"
    SELECT id, source, mode, question, created_at
    FROM published_questions
    ORDER BY created_at DESC
    "#,
  )?;

  let rows = stmt
    .query_map([], |row| {
      let mode_str: String = row.get(2)?;
      let question_json: Option<String> = row.get(3)?;
      let created_at_str: String = row.get(4)?;
      Ok(PublishedQuestion {
        id: row.get(0)?,
        source: row.get(1)?,
        mode: PublishMode::from_str(&mode_str).unwrap_or(PublishMode::Baked),
        question: question_json.and_then(|json| serde_json::from_str(&json).ok()),
        created_at: DateTime::parse_from_rfc3339(&created_at_str)
          .map(|dt| dt.with_timezone(&Utc))
          .unwrap_or_else(|_| Utc::now()),
      })
    })?
    .collect::<Result<Vec<_>>>()?;
  Ok(rows)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog;
  use crate::domain::{Difficulty, mint_id};
  use crate::testing::TestEnv;

  #[test]
  fn test_publish_mode_roundtrip() {
    for mode in [PublishMode::Baked, PublishMode::Dynamic] {
      assert_eq!(PublishMode::from_str(mode.as_str()), Some(mode));
    }
    assert_eq!(PublishMode::from_str("frozen"), None);
  }

  #[test]
  fn test_baked_row_keeps_question() {
    let env = TestEnv::new().unwrap();
    let problem = catalog::generate("addition", Difficulty::Easy).unwrap();
    let row = PublishedQuestion {
      id: mint_id(32),
      source: "addition".to_string(),
      mode: PublishMode::Baked,
      question: Some(problem.clone()),
      created_at: Utc::now(),
    };
    insert_published_question(&env.conn, &row).unwrap();

    let rows = list_published_questions(&env.conn).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].mode, PublishMode::Baked);
    assert_eq!(rows[0].question.as_ref().unwrap().correct_answer, problem.correct_answer);
  }

  #[test]
  fn test_dynamic_row_stores_only_reference() {
    let env = TestEnv::new().unwrap();
    let row = PublishedQuestion {
      id: mint_id(32),
      source: "area-triangle".to_string(),
      mode: PublishMode::Dynamic,
      question: None,
      created_at: Utc::now(),
    };
    insert_published_question(&env.conn, &row).unwrap();

    let rows = list_published_questions(&env.conn).unwrap();
    assert_eq!(rows[0].mode, PublishMode::Dynamic);
    assert!(rows[0].question.is_none());
    assert_eq!(rows[0].source, "area-triangle");
  }
}
