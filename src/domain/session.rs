//! Practice session types and lifecycle.
//!
//! A session is a server-cached batch of generated problems tied to one
//! grading attempt. Two states only: `active` (created by generate) and
//! `completed` (set by submit, terminal).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::problem::GeneratedProblem;
use super::template::QuestionType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
  Active,
  Completed,
}

impl SessionStatus {
  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "active" => Some(Self::Active),
      "completed" => Some(Self::Completed),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Active => "active",
      Self::Completed => "completed",
    }
  }
}

/// One entry of the client's generation config: how many problems to draw
/// from which template (`tmpl:<id>`) or hardcoded generator (bare id).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateEntry {
  pub type_id: String,
  pub count: usize,
}

/// A durable practice session row.
///
/// The stored problem list carries correct answers; only the sanitized view
/// ever leaves the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PracticeSession {
  pub id: String,
  #[serde(default)]
  pub user_id: Option<String>,
  pub problems: Vec<GeneratedProblem>,
  pub config: Vec<GenerateEntry>,
  pub status: SessionStatus,
  pub total_problems: usize,
  pub correct_answers: usize,
  pub score_percent: u32,
  pub time_spent_seconds: u64,
  pub created_at: DateTime<Utc>,
  #[serde(default)]
  pub completed_at: Option<DateTime<Utc>>,
}

/// History row: a completed session without its problem payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
  pub id: String,
  #[serde(default)]
  pub user_id: Option<String>,
  pub config: Vec<GenerateEntry>,
  pub total_problems: usize,
  pub correct_answers: usize,
  pub score_percent: u32,
  pub time_spent_seconds: u64,
  pub created_at: DateTime<Utc>,
  #[serde(default)]
  pub completed_at: Option<DateTime<Utc>>,
}

impl PracticeSession {
  pub fn summary(&self) -> SessionSummary {
    SessionSummary {
      id: self.id.clone(),
      user_id: self.user_id.clone(),
      config: self.config.clone(),
      total_problems: self.total_problems,
      correct_answers: self.correct_answers,
      score_percent: self.score_percent,
      time_spent_seconds: self.time_spent_seconds,
      created_at: self.created_at,
      completed_at: self.completed_at,
    }
  }
}

/// One submitted answer.
///
/// The echoed `correct_answer`/`tolerance`/`question_type` fields are only
/// consulted on the degraded path when the stored session cannot be found;
/// a stored problem always wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmittedAnswer {
  pub problem_id: String,
  pub user_answer: String,
  #[serde(default)]
  pub correct_answer: Option<String>,
  #[serde(default)]
  pub tolerance: Option<f64>,
  #[serde(default)]
  pub question_type: Option<QuestionType>,
}

/// Aggregate outcome of a submit call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitSummary {
  pub total: usize,
  pub correct: usize,
  pub close: usize,
  pub incorrect: usize,
  pub score_percent: u32,
  pub passed: bool,
  pub time_spent_seconds: u64,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_session_status_roundtrip() {
    for s in [SessionStatus::Active, SessionStatus::Completed] {
      assert_eq!(SessionStatus::from_str(s.as_str()), Some(s));
    }
    assert_eq!(SessionStatus::from_str("open"), None);
  }

  #[test]
  fn test_generate_entry_uses_camel_case_type_id() {
    let entry: GenerateEntry =
      serde_json::from_str(r#"{"typeId":"area-triangle","count":3}"#).unwrap();
    assert_eq!(entry.type_id, "area-triangle");
    assert_eq!(entry.count, 3);
  }

  #[test]
  fn test_summary_drops_problems() {
    let session = PracticeSession {
      id: "s1".to_string(),
      user_id: None,
      problems: vec![],
      config: vec![],
      status: SessionStatus::Completed,
      total_problems: 3,
      correct_answers: 2,
      score_percent: 67,
      time_spent_seconds: 120,
      created_at: Utc::now(),
      completed_at: Some(Utc::now()),
    };
    let summary = session.summary();
    assert_eq!(summary.total_problems, 3);
    assert_eq!(summary.score_percent, 67);
  }
}
