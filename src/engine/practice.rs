//! Practice session manager.
//!
//! `generate` builds a batch of problems, persists the full answer-bearing
//! set under a fresh session id, and returns the sanitized view. `submit`
//! re-hydrates the stored problems, grades each answer against the
//! authoritative stored answer key, and closes the session. `see_solution`
//! reveals one stored solution without touching session status.
//!
//! The manager talks to storage through the narrow [`SessionStore`] and
//! [`TemplateSource`] interfaces so it carries no dependency on the backing
//! database client.

use chrono::Utc;
use rand::seq::SliceRandom;

use crate::config;
use crate::domain::{
  CheckResult, ClientProblem, GenerateEntry, GeneratedProblem, GeneratorRef, PracticeSession,
  ProblemTemplate, QuestionType, SessionStatus, SessionSummary, SubmitSummary, SubmittedAnswer,
  mint_id,
};
use crate::engine::{GenerationError, check, generate};

/// Write-once cache of answer-bearing sessions, keyed by session id.
pub trait SessionStore {
  fn put(&self, session: &PracticeSession) -> Result<(), StoreError>;
  fn get(&self, id: &str) -> Result<Option<PracticeSession>, StoreError>;
  fn list_completed(&self) -> Result<Vec<SessionSummary>, StoreError>;
}

/// Read access to template rows.
pub trait TemplateSource {
  fn get(&self, id: &str) -> Result<Option<ProblemTemplate>, StoreError>;
}

/// Row-store failure, opaque to the core.
#[derive(Debug)]
pub struct StoreError(pub String);

impl std::fmt::Display for StoreError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "Store error: {}", self.0)
  }
}

impl std::error::Error for StoreError {}

/// Why a practice operation failed.
#[derive(Debug)]
pub enum PracticeError {
  Generation(GenerationError),
  Store(StoreError),
  SessionNotFound(String),
  ProblemNotFound { session_id: String, problem_id: String },
  EmptyConfig,
}

impl std::fmt::Display for PracticeError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Generation(e) => write!(f, "{}", e),
      Self::Store(e) => write!(f, "{}", e),
      Self::SessionNotFound(id) => write!(f, "Session {} not found", id),
      Self::ProblemNotFound { session_id, problem_id } => {
        write!(f, "Problem {} not found in session {}", problem_id, session_id)
      }
      Self::EmptyConfig => write!(f, "Generation config is empty"),
    }
  }
}

impl std::error::Error for PracticeError {}

impl From<GenerationError> for PracticeError {
  fn from(e: GenerationError) -> Self {
    Self::Generation(e)
  }
}

impl From<StoreError> for PracticeError {
  fn from(e: StoreError) -> Self {
    Self::Store(e)
  }
}

/// Result of a generate call: the session id plus the sanitized problems.
#[derive(Debug)]
pub struct GeneratedBatch {
  pub session_id: String,
  pub problems: Vec<ClientProblem>,
  pub total: usize,
}

/// Result of a submit call.
#[derive(Debug)]
pub struct SubmitOutcome {
  pub results: Vec<CheckResult>,
  pub summary: SubmitSummary,
  /// False when grading fell back to client-supplied answer keys
  pub authoritative: bool,
}

/// One stored solution, revealed on demand.
#[derive(Debug)]
pub struct SolutionView {
  pub correct_answer: String,
  pub solution_steps: Vec<String>,
  pub explanation: Option<String>,
}

/// Generate a batch of problems and open a new active session.
///
/// Per-call output is capped server-side regardless of the requested counts;
/// generation is CPU-bound and the cap bounds per-request wall time.
pub fn generate_session(
  store: &dyn SessionStore,
  templates: &dyn TemplateSource,
  entries: &[GenerateEntry],
  randomize: bool,
  user_id: Option<String>,
) -> Result<GeneratedBatch, PracticeError> {
  if entries.is_empty() {
    return Err(PracticeError::EmptyConfig);
  }

  let mut rng = rand::rng();
  let mut problems: Vec<GeneratedProblem> = Vec::new();
  let mut budget = config::MAX_PROBLEMS_PER_REQUEST;

  for entry in entries {
    let count = entry.count.min(budget);
    let generator_ref = GeneratorRef::parse(&entry.type_id);

    for _ in 0..count {
      let problem = generate::generate_by_ref(
        &generator_ref,
        |id| match templates.get(id) {
          Ok(found) => found,
          Err(e) => {
            tracing::warn!("Template lookup failed for {}: {}", id, e);
            None
          }
        },
        &mut rng,
      )?;
      problems.push(problem);
    }

    budget -= count;
    if budget == 0 {
      tracing::debug!("Generation batch hit the per-request cap");
      break;
    }
  }

  if randomize {
    problems.shuffle(&mut rng);
  }

  let session = PracticeSession {
    id: mint_id(config::ID_LENGTH),
    user_id,
    total_problems: problems.len(),
    problems,
    config: entries.to_vec(),
    status: SessionStatus::Active,
    correct_answers: 0,
    score_percent: 0,
    time_spent_seconds: 0,
    created_at: Utc::now(),
    completed_at: None,
  };

  store.put(&session)?;

  Ok(GeneratedBatch {
    session_id: session.id.clone(),
    problems: session.problems.iter().map(GeneratedProblem::sanitized).collect(),
    total: session.total_problems,
  })
}

/// Grade a submitted answer set and complete the session.
///
/// When no stored session exists (expired cache, or grading without a prior
/// generate), grading degrades to the client-echoed answer keys so the
/// learner's work is not lost; that path trusts the client and is marked
/// non-authoritative. A session that is already completed returns its stored
/// aggregate unchanged - a re-submit never shifts the recorded score.
pub fn submit_session(
  store: &dyn SessionStore,
  session_id: &str,
  answers: &[SubmittedAnswer],
  time_spent_seconds: u64,
) -> Result<SubmitOutcome, PracticeError> {
  let Some(mut session) = store.get(session_id)? else {
    tracing::warn!("Session {} not in store; grading from client answer keys", session_id);
    return Ok(grade_degraded(answers, time_spent_seconds));
  };

  if session.status == SessionStatus::Completed {
    tracing::debug!("Session {} already completed; returning stored outcome", session_id);
    let summary = stored_summary(&session);
    return Ok(SubmitOutcome { results: Vec::new(), summary, authoritative: true });
  }

  let mut results = Vec::with_capacity(answers.len());
  for answer in answers {
    let result = match session.problems.iter().find(|p| p.id == answer.problem_id) {
      Some(problem) => check::check_answer(
        &problem.id,
        problem.question_type,
        &answer.user_answer,
        &problem.correct_answer,
        problem.tolerance,
      ),
      None => CheckResult {
        problem_id: answer.problem_id.clone(),
        is_correct: false,
        is_close: false,
        user_answer: answer.user_answer.clone(),
        correct_answer: String::new(),
        difference: None,
        feedback: "This problem is not part of the session.".to_string(),
        rounding_warning: None,
      },
    };
    results.push(result);
  }

  let summary = summarize(&results, session.total_problems, time_spent_seconds);

  session.status = SessionStatus::Completed;
  session.correct_answers = summary.correct;
  session.score_percent = summary.score_percent;
  session.time_spent_seconds = time_spent_seconds;
  session.completed_at = Some(Utc::now());
  store.put(&session)?;

  Ok(SubmitOutcome { results, summary, authoritative: true })
}

/// Reveal one stored solution without completing the session.
pub fn see_solution(
  store: &dyn SessionStore,
  session_id: &str,
  problem_id: &str,
) -> Result<SolutionView, PracticeError> {
  let session = store
    .get(session_id)?
    .ok_or_else(|| PracticeError::SessionNotFound(session_id.to_string()))?;

  let problem = session
    .problems
    .iter()
    .find(|p| p.id == problem_id)
    .ok_or_else(|| PracticeError::ProblemNotFound {
      session_id: session_id.to_string(),
      problem_id: problem_id.to_string(),
    })?;

  Ok(SolutionView {
    correct_answer: problem.correct_answer.clone(),
    solution_steps: problem.solution_steps.clone(),
    explanation: problem.explanation.clone(),
  })
}

/// Completed session history.
pub fn history(store: &dyn SessionStore) -> Result<Vec<SessionSummary>, PracticeError> {
  Ok(store.list_completed()?)
}

/// Degraded grading path: only the client-echoed answer keys are available.
fn grade_degraded(answers: &[SubmittedAnswer], time_spent_seconds: u64) -> SubmitOutcome {
  let results: Vec<CheckResult> = answers
    .iter()
    .map(|answer| {
      let correct = answer.correct_answer.clone().unwrap_or_default();
      let question_type = answer.question_type.unwrap_or(QuestionType::NumericInput);
      let tolerance = answer.tolerance.unwrap_or(0.01);
      check::check_answer(&answer.problem_id, question_type, &answer.user_answer, &correct, tolerance)
    })
    .collect();

  let summary = summarize(&results, answers.len(), time_spent_seconds);
  SubmitOutcome { results, summary, authoritative: false }
}

fn summarize(results: &[CheckResult], total: usize, time_spent_seconds: u64) -> SubmitSummary {
  let correct = results.iter().filter(|r| r.is_correct).count();
  let close = results.iter().filter(|r| r.is_close).count();
  let incorrect = total.saturating_sub(correct);
  let score_percent = if total == 0 {
    0
  } else {
    (correct as f64 / total as f64 * 100.0).round() as u32
  };

  SubmitSummary {
    total,
    correct,
    close,
    incorrect,
    score_percent,
    passed: score_percent >= config::PASS_THRESHOLD,
    time_spent_seconds,
  }
}

/// Rebuild the aggregate of an already-completed session.
fn stored_summary(session: &PracticeSession) -> SubmitSummary {
  SubmitSummary {
    total: session.total_problems,
    correct: session.correct_answers,
    close: 0,
    incorrect: session.total_problems.saturating_sub(session.correct_answers),
    score_percent: session.score_percent,
    passed: session.score_percent >= config::PASS_THRESHOLD,
    time_spent_seconds: session.time_spent_seconds,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::cell::RefCell;
  use std::collections::HashMap;

  /// In-memory store mirroring the narrow row-store contract.
  #[derive(Default)]
  struct MemoryStore {
    sessions: RefCell<HashMap<String, PracticeSession>>,
  }

  impl SessionStore for MemoryStore {
    fn put(&self, session: &PracticeSession) -> Result<(), StoreError> {
      self.sessions.borrow_mut().insert(session.id.clone(), session.clone());
      Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<PracticeSession>, StoreError> {
      Ok(self.sessions.borrow().get(id).cloned())
    }

    fn list_completed(&self) -> Result<Vec<SessionSummary>, StoreError> {
      Ok(
        self
          .sessions
          .borrow()
          .values()
          .filter(|s| s.status == SessionStatus::Completed)
          .map(PracticeSession::summary)
          .collect(),
      )
    }
  }

  struct NoTemplates;

  impl TemplateSource for NoTemplates {
    fn get(&self, _id: &str) -> Result<Option<ProblemTemplate>, StoreError> {
      Ok(None)
    }
  }

  fn entry(type_id: &str, count: usize) -> GenerateEntry {
    GenerateEntry { type_id: type_id.to_string(), count }
  }

  #[test]
  fn test_generate_returns_sanitized_problems() {
    let store = MemoryStore::default();
    let batch =
      generate_session(&store, &NoTemplates, &[entry("area-triangle", 3)], false, None).unwrap();

    assert_eq!(batch.total, 3);
    assert_eq!(batch.problems.len(), 3);
    let json = serde_json::to_string(&batch.problems).unwrap();
    assert!(!json.contains("correct_answer"));

    // Full set persisted server-side, status active
    let stored = store.get(&batch.session_id).unwrap().unwrap();
    assert_eq!(stored.status, SessionStatus::Active);
    assert_eq!(stored.problems.len(), 3);
    assert!(!stored.problems[0].correct_answer.is_empty());
  }

  #[test]
  fn test_generate_caps_requested_count() {
    let store = MemoryStore::default();
    let batch =
      generate_session(&store, &NoTemplates, &[entry("addition", 500)], false, None).unwrap();
    assert_eq!(batch.total, config::MAX_PROBLEMS_PER_REQUEST);
  }

  #[test]
  fn test_generate_mixes_entries() {
    let store = MemoryStore::default();
    let batch = generate_session(
      &store,
      &NoTemplates,
      &[entry("area-triangle", 2), entry("addition", 2)],
      false,
      None,
    )
    .unwrap();
    assert_eq!(batch.total, 4);
    let categories: Vec<&str> = batch.problems.iter().map(|p| p.category.as_str()).collect();
    assert_eq!(categories, vec!["geometry", "geometry", "arithmetic", "arithmetic"]);
  }

  #[test]
  fn test_generate_unknown_id_fails() {
    let store = MemoryStore::default();
    let err = generate_session(&store, &NoTemplates, &[entry("bogus", 1)], false, None)
      .unwrap_err();
    assert!(matches!(err, PracticeError::Generation(GenerationError::UnknownGenerator(_))));
  }

  #[test]
  fn test_generate_empty_config_fails() {
    let store = MemoryStore::default();
    assert!(matches!(
      generate_session(&store, &NoTemplates, &[], false, None),
      Err(PracticeError::EmptyConfig)
    ));
  }

  fn submitted(problem_id: &str, user_answer: &str) -> SubmittedAnswer {
    SubmittedAnswer {
      problem_id: problem_id.to_string(),
      user_answer: user_answer.to_string(),
      correct_answer: None,
      tolerance: None,
      question_type: None,
    }
  }

  #[test]
  fn test_submit_grades_against_stored_answers() {
    let store = MemoryStore::default();
    let batch =
      generate_session(&store, &NoTemplates, &[entry("area-triangle", 3)], false, None).unwrap();
    let stored = store.get(&batch.session_id).unwrap().unwrap();

    // Two right, one off by ~10%
    let wrong = format!("{}", stored.problems[2].correct_answer.parse::<f64>().unwrap() * 1.1 + 1.0);
    let answers = vec![
      submitted(&stored.problems[0].id, &stored.problems[0].correct_answer),
      submitted(&stored.problems[1].id, &stored.problems[1].correct_answer),
      submitted(&stored.problems[2].id, &wrong),
    ];

    let outcome = submit_session(&store, &batch.session_id, &answers, 120).unwrap();
    assert!(outcome.authoritative);
    assert_eq!(outcome.summary.total, 3);
    assert_eq!(outcome.summary.correct, 2);
    assert_eq!(outcome.summary.score_percent, 67);
    assert!(!outcome.summary.passed);

    let after = store.get(&batch.session_id).unwrap().unwrap();
    assert_eq!(after.status, SessionStatus::Completed);
    assert_eq!(after.correct_answers, 2);
    assert_eq!(after.time_spent_seconds, 120);
  }

  #[test]
  fn test_submit_ignores_client_answer_key_when_session_exists() {
    let store = MemoryStore::default();
    let batch =
      generate_session(&store, &NoTemplates, &[entry("addition", 1)], false, None).unwrap();
    let stored = store.get(&batch.session_id).unwrap().unwrap();

    // Client claims its wrong answer is the correct one; the stored key wins
    let mut lie = submitted(&stored.problems[0].id, "99999");
    lie.correct_answer = Some("99999".to_string());

    let outcome = submit_session(&store, &batch.session_id, &[lie], 10).unwrap();
    assert_eq!(outcome.summary.correct, 0);
  }

  #[test]
  fn test_resubmit_returns_stored_outcome() {
    let store = MemoryStore::default();
    let batch =
      generate_session(&store, &NoTemplates, &[entry("addition", 2)], false, None).unwrap();
    let stored = store.get(&batch.session_id).unwrap().unwrap();

    let answers = vec![
      submitted(&stored.problems[0].id, &stored.problems[0].correct_answer),
      submitted(&stored.problems[1].id, "wrong"),
    ];
    let first = submit_session(&store, &batch.session_id, &answers, 30).unwrap();
    assert_eq!(first.summary.correct, 1);

    // A second submit with different answers must not shift the score
    let all_right = vec![
      submitted(&stored.problems[0].id, &stored.problems[0].correct_answer),
      submitted(&stored.problems[1].id, &stored.problems[1].correct_answer),
    ];
    let second = submit_session(&store, &batch.session_id, &all_right, 60).unwrap();
    assert_eq!(second.summary.correct, 1);
    assert_eq!(second.summary.score_percent, first.summary.score_percent);
    assert!(second.results.is_empty());
  }

  #[test]
  fn test_submit_missing_session_degrades_to_client_keys() {
    let store = MemoryStore::default();
    let mut answer = submitted("p1", "12.5");
    answer.correct_answer = Some("12.5".to_string());
    answer.tolerance = Some(0.01);
    answer.question_type = Some(QuestionType::NumericInput);

    let outcome = submit_session(&store, "gone", &[answer], 15).unwrap();
    assert!(!outcome.authoritative);
    assert_eq!(outcome.summary.total, 1);
    assert_eq!(outcome.summary.correct, 1);
    assert!(outcome.summary.passed);
  }

  #[test]
  fn test_unanswered_problems_count_against_score() {
    let store = MemoryStore::default();
    let batch =
      generate_session(&store, &NoTemplates, &[entry("addition", 4)], false, None).unwrap();
    let stored = store.get(&batch.session_id).unwrap().unwrap();

    // Answer only one of four
    let answers = vec![submitted(&stored.problems[0].id, &stored.problems[0].correct_answer)];
    let outcome = submit_session(&store, &batch.session_id, &answers, 5).unwrap();
    assert_eq!(outcome.summary.total, 4);
    assert_eq!(outcome.summary.correct, 1);
    assert_eq!(outcome.summary.score_percent, 25);
  }

  #[test]
  fn test_see_solution_leaves_session_active() {
    let store = MemoryStore::default();
    let batch =
      generate_session(&store, &NoTemplates, &[entry("area-triangle", 1)], false, None).unwrap();
    let stored = store.get(&batch.session_id).unwrap().unwrap();

    let view = see_solution(&store, &batch.session_id, &stored.problems[0].id).unwrap();
    assert_eq!(view.correct_answer, stored.problems[0].correct_answer);
    assert!(!view.solution_steps.is_empty());

    let after = store.get(&batch.session_id).unwrap().unwrap();
    assert_eq!(after.status, SessionStatus::Active);
  }

  #[test]
  fn test_see_solution_unknown_ids() {
    let store = MemoryStore::default();
    assert!(matches!(
      see_solution(&store, "missing", "p1"),
      Err(PracticeError::SessionNotFound(_))
    ));

    let batch =
      generate_session(&store, &NoTemplates, &[entry("addition", 1)], false, None).unwrap();
    assert!(matches!(
      see_solution(&store, &batch.session_id, "not-a-problem"),
      Err(PracticeError::ProblemNotFound { .. })
    ));
  }

  #[test]
  fn test_history_lists_only_completed() {
    let store = MemoryStore::default();
    let open =
      generate_session(&store, &NoTemplates, &[entry("addition", 1)], false, None).unwrap();
    let done =
      generate_session(&store, &NoTemplates, &[entry("addition", 1)], false, None).unwrap();
    let stored = store.get(&done.session_id).unwrap().unwrap();
    let answers = vec![submitted(&stored.problems[0].id, &stored.problems[0].correct_answer)];
    submit_session(&store, &done.session_id, &answers, 9).unwrap();

    let summaries = history(&store).unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].id, done.session_id);
    assert_ne!(summaries[0].id, open.session_id);
  }
}
