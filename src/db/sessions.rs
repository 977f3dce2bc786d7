//! Session rows and the per-answer audit log.
//!
//! The full answer-bearing problem list rides in a JSON column; put is an
//! upsert so concurrent submits resolve last-write-wins, matching the
//! store's (lack of) consistency contract.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, Result, params};

use crate::domain::{CheckResult, PracticeSession, SessionStatus, SessionSummary};
use crate::engine::practice::{SessionStore, StoreError};

pub fn put_session(conn: &Connection, session: &PracticeSession) -> Result<()> {
  let config = serde_json::to_string(&session.config)
    .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
  let problems = serde_json::to_string(&session.problems)
    .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

  conn.execute(
    r#"
    INSERT OR REPLACE INTO practice_sessions
      (id, user_id, config, problems, status, total_problems, correct_answers,
       score_percent, time_spent_seconds, created_at, completed_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
    "#,
    params![
      session.id,
      session.user_id,
      config,
      problems,
      session.status.as_str(),
      session.total_problems as i64,
      session.correct_answers as i64,
      session.score_percent as i64,
      session.time_spent_seconds as i64,
      session.created_at.to_rfc3339(),
      session.completed_at.map(|dt| dt.to_rfc3339()),
    ],
  )?;
  Ok(())
}

pub fn get_session(conn: &Connection, id: &str) -> Result<Option<PracticeSession>> {
  let mut stmt = conn.prepare(
    r#"
    SELECT id, user_id, config, problems, status, total_problems, correct_answers,
           score_percent, time_spent_seconds, created_at, completed_at
    FROM practice_sessions WHERE id = ?1
    "#,
  )?;

  let mut rows = stmt.query(params![id])?;
  if let Some(row) = rows.next()? {
    Ok(Some(row_to_session(row)?))
  } else {
    Ok(None)
  }
}

pub fn list_completed_sessions(conn: &Connection) -> Result<Vec<SessionSummary>> {
  let mut stmt = conn.prepare(
    r#"
    SELECT id, user_id, config, problems, status, total_problems, correct_answers,
           score_percent, time_spent_seconds, created_at, completed_at
    FROM practice_sessions
    WHERE status = 'completed'
    ORDER BY completed_at DESC
    "#,
  )?;

  let sessions = stmt
    .query_map([], |row| Ok(row_to_session(row)?.summary()))?
    .collect::<Result<Vec<_>>>()?;
  Ok(sessions)
}

pub fn count_completed_sessions(conn: &Connection) -> Result<i64> {
  conn.query_row(
    "SELECT COUNT(*) FROM practice_sessions WHERE status = 'completed'",
    [],
    |row| row.get(0),
  )
}

/// Fold a grading result into the per-question audit log.
pub fn insert_answer_log(conn: &Connection, session_id: &str, result: &CheckResult) -> Result<()> {
  conn.execute(
    r#"
    INSERT INTO answer_logs (session_id, problem_id, user_answer, is_correct, is_close,
                             rounding_warning, checked_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
    "#,
    params![
      session_id,
      result.problem_id,
      result.user_answer,
      result.is_correct as i64,
      result.is_close as i64,
      result.rounding_warning,
      Utc::now().to_rfc3339(),
    ],
  )?;
  Ok(())
}

fn row_to_session(row: &rusqlite::Row) -> Result<PracticeSession> {
  let config_json: String = row.get(2)?;
  let problems_json: String = row.get(3)?;
  let status_str: String = row.get(4)?;
  let created_at_str: String = row.get(9)?;
  let completed_at_str: Option<String> = row.get(10)?;

  Ok(PracticeSession {
    id: row.get(0)?,
    user_id: row.get(1)?,
    config: serde_json::from_str(&config_json).unwrap_or_default(),
    problems: serde_json::from_str(&problems_json).map_err(|e| {
      rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?,
    status: SessionStatus::from_str(&status_str).unwrap_or(SessionStatus::Active),
    total_problems: row.get::<_, i64>(5)? as usize,
    correct_answers: row.get::<_, i64>(6)? as usize,
    score_percent: row.get::<_, i64>(7)? as u32,
    time_spent_seconds: row.get::<_, i64>(8)? as u64,
    created_at: DateTime::parse_from_rfc3339(&created_at_str)
      .map(|dt| dt.with_timezone(&Utc))
      .unwrap_or_else(|_| Utc::now()),
    completed_at: completed_at_str
      .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
      .map(|dt| dt.with_timezone(&Utc)),
  })
}

/// [`SessionStore`] over a borrowed connection.
pub struct SqliteSessions<'a> {
  pub conn: &'a Connection,
}

impl SessionStore for SqliteSessions<'_> {
  fn put(&self, session: &PracticeSession) -> std::result::Result<(), StoreError> {
    put_session(self.conn, session).map_err(|e| StoreError(e.to_string()))
  }

  fn get(&self, id: &str) -> std::result::Result<Option<PracticeSession>, StoreError> {
    get_session(self.conn, id).map_err(|e| StoreError(e.to_string()))
  }

  fn list_completed(&self) -> std::result::Result<Vec<SessionSummary>, StoreError> {
    list_completed_sessions(self.conn).map_err(|e| StoreError(e.to_string()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{Difficulty, GenerateEntry, GeneratedProblem, QuestionType};
  use crate::testing::TestEnv;

  fn sample_session(id: &str, status: SessionStatus) -> PracticeSession {
    PracticeSession {
      id: id.to_string(),
      user_id: Some("user-7".to_string()),
      problems: vec![GeneratedProblem {
        id: "p1".to_string(),
        question_text: "What is 1 + 1?".to_string(),
        question_type: QuestionType::NumericInput,
        options: vec![],
        correct_answer: "2".to_string(),
        solution_steps: vec!["1 + 1 = 2".to_string()],
        explanation: None,
        tolerance: 0.01,
        difficulty: Difficulty::Easy,
        category: "arithmetic".to_string(),
        subcategory: None,
        tags: vec![],
      }],
      config: vec![GenerateEntry { type_id: "addition".to_string(), count: 1 }],
      status,
      total_problems: 1,
      correct_answers: 0,
      score_percent: 0,
      time_spent_seconds: 0,
      created_at: Utc::now(),
      completed_at: None,
    }
  }

  #[test]
  fn test_put_get_roundtrip() {
    let env = TestEnv::new().unwrap();
    let session = sample_session("s1", SessionStatus::Active);
    put_session(&env.conn, &session).unwrap();

    let loaded = get_session(&env.conn, "s1").unwrap().unwrap();
    assert_eq!(loaded.id, "s1");
    assert_eq!(loaded.user_id.as_deref(), Some("user-7"));
    assert_eq!(loaded.status, SessionStatus::Active);
    assert_eq!(loaded.problems.len(), 1);
    assert_eq!(loaded.problems[0].correct_answer, "2");
    assert_eq!(loaded.config[0].type_id, "addition");
  }

  #[test]
  fn test_put_is_last_write_wins() {
    let env = TestEnv::new().unwrap();
    let mut session = sample_session("s1", SessionStatus::Active);
    put_session(&env.conn, &session).unwrap();

    session.status = SessionStatus::Completed;
    session.correct_answers = 1;
    session.score_percent = 100;
    session.completed_at = Some(Utc::now());
    put_session(&env.conn, &session).unwrap();

    let loaded = get_session(&env.conn, "s1").unwrap().unwrap();
    assert_eq!(loaded.status, SessionStatus::Completed);
    assert_eq!(loaded.score_percent, 100);
    assert!(loaded.completed_at.is_some());
  }

  #[test]
  fn test_list_completed_filters_and_orders() {
    let env = TestEnv::new().unwrap();
    put_session(&env.conn, &sample_session("open", SessionStatus::Active)).unwrap();

    let mut done = sample_session("done", SessionStatus::Completed);
    done.completed_at = Some(Utc::now());
    put_session(&env.conn, &done).unwrap();

    let summaries = list_completed_sessions(&env.conn).unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].id, "done");
    assert_eq!(count_completed_sessions(&env.conn).unwrap(), 1);
  }

  #[test]
  fn test_answer_log_insert() {
    let env = TestEnv::new().unwrap();
    let result = CheckResult {
      problem_id: "p1".to_string(),
      is_correct: true,
      is_close: true,
      user_answer: "2.01".to_string(),
      correct_answer: "2".to_string(),
      difference: Some(0.01),
      feedback: "ok".to_string(),
      rounding_warning: Some("close".to_string()),
    };
    insert_answer_log(&env.conn, "s1", &result).unwrap();

    let count: i64 = env
      .conn
      .query_row("SELECT COUNT(*) FROM answer_logs WHERE session_id = 's1'", [], |r| r.get(0))
      .unwrap();
    assert_eq!(count, 1);
  }
}
