//! Generated problem instances and grading results.

use serde::{Deserialize, Serialize};

use super::template::{Difficulty, QuestionType};

/// One immutable problem instantiation.
///
/// Fully determined by the sampled parameter values and the template or
/// generator that produced it; never mutated after creation. Carries the
/// correct answer, so it must never be sent to a learner verbatim - use
/// [`ClientProblem`] for that.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedProblem {
  pub id: String,
  pub question_text: String,
  pub question_type: QuestionType,
  /// Resolved, shuffled options (multiple-choice and true/false only)
  #[serde(default)]
  pub options: Vec<String>,
  pub correct_answer: String,
  #[serde(default)]
  pub solution_steps: Vec<String>,
  #[serde(default)]
  pub explanation: Option<String>,
  pub tolerance: f64,
  pub difficulty: Difficulty,
  pub category: String,
  #[serde(default)]
  pub subcategory: Option<String>,
  #[serde(default)]
  pub tags: Vec<String>,
}

impl GeneratedProblem {
  /// The answer-stripped view handed to the client.
  pub fn sanitized(&self) -> ClientProblem {
    ClientProblem {
      id: self.id.clone(),
      question_text: self.question_text.clone(),
      question_type: self.question_type,
      options: self.options.clone(),
      difficulty: self.difficulty,
      category: self.category.clone(),
      subcategory: self.subcategory.clone(),
      tags: self.tags.clone(),
    }
  }
}

/// What the learner's browser sees: no correct answer, no solution steps,
/// no explanation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientProblem {
  pub id: String,
  pub question_text: String,
  pub question_type: QuestionType,
  #[serde(default)]
  pub options: Vec<String>,
  pub difficulty: Difficulty,
  pub category: String,
  #[serde(default)]
  pub subcategory: Option<String>,
  #[serde(default)]
  pub tags: Vec<String>,
}

/// Grading outcome for a single submitted answer.
///
/// Ephemeral: folded into the session aggregate and the per-question answer
/// log, never persisted standalone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
  pub problem_id: String,
  pub is_correct: bool,
  /// Correct, but only via the extended tolerance band or relative-error rule
  pub is_close: bool,
  pub user_answer: String,
  pub correct_answer: String,
  /// Absolute numeric difference; None for non-numeric or unparseable input
  pub difference: Option<f64>,
  pub feedback: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub rounding_warning: Option<String>,
}
