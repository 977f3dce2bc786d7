//! Problem template types: the admin-authored recipe a generator runs.
//!
//! A template declares parameters to sample, computed variables derived from
//! them in strict left-to-right order, an answer formula, and token strings
//! for the question text and solution steps. Templates are durable rows;
//! everything they produce is ephemeral.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
  NumericInput,
  MathTemplate,
  MultipleChoice,
  TrueFalse,
  ShortAnswer,
}

impl QuestionType {
  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "numeric_input" => Some(Self::NumericInput),
      "math_template" => Some(Self::MathTemplate),
      "multiple_choice" => Some(Self::MultipleChoice),
      "true_false" => Some(Self::TrueFalse),
      "short_answer" => Some(Self::ShortAnswer),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::NumericInput => "numeric_input",
      Self::MathTemplate => "math_template",
      Self::MultipleChoice => "multiple_choice",
      Self::TrueFalse => "true_false",
      Self::ShortAnswer => "short_answer",
    }
  }

  /// Whether submitted answers are graded as floating-point values
  pub fn is_numeric(&self) -> bool {
    matches!(self, Self::NumericInput | Self::MathTemplate)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
  Easy,
  Medium,
  Hard,
}

impl Difficulty {
  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "easy" => Some(Self::Easy),
      "medium" => Some(Self::Medium),
      "hard" => Some(Self::Hard),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Easy => "easy",
      Self::Medium => "medium",
      Self::Hard => "hard",
    }
  }
}

/// A value drawn from an enumerated choice set.
///
/// Numeric choices participate in formulas; text choices only appear in
/// rendered question text and answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChoiceValue {
  Number(f64),
  Text(String),
}

/// How a parameter's value is drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParamKind {
  Integer {
    min: i64,
    max: i64,
    #[serde(default)]
    step: Option<i64>,
  },
  Float {
    min: f64,
    max: f64,
    #[serde(default)]
    step: Option<f64>,
  },
  Choice { options: Vec<ChoiceValue> },
}

/// One declared template parameter.
///
/// The optional constraint is a predicate expression over this parameter and
/// any earlier-declared parameter (e.g. `abs(angle1 - angle2) > 5`); the
/// sampler resamples until it holds or the retry cap is hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
  pub name: String,
  pub kind: ParamKind,
  #[serde(default)]
  pub constraint: Option<String>,
}

/// A derived variable, evaluated after all parameters are sampled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputedVar {
  pub name: String,
  pub formula: String,
}

/// Numeric answer presentation and grading window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnswerFormat {
  pub decimals: u8,
  pub tolerance: f64,
}

impl Default for AnswerFormat {
  fn default() -> Self {
    Self { decimals: 2, tolerance: 0.01 }
  }
}

/// Wrong-answer generation strategy for multiple-choice templates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum OptionsSpec {
  /// Author supplies explicit options elsewhere; nothing is generated
  #[default]
  None,
  /// Plausible wrong values clustered around the correct answer
  Distractors {
    count: usize,
    #[serde(default)]
    spread: Option<f64>,
  },
  /// Wrong values spread uniformly across a range, excluding a window
  /// around the correct answer
  Range {
    min: f64,
    max: f64,
    count: usize,
    #[serde(default)]
    exclusion: Option<f64>,
  },
}

/// A durable, admin-authored problem template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemTemplate {
  pub id: String,
  pub name: String,
  pub category: String,
  #[serde(default)]
  pub subcategory: Option<String>,
  pub difficulty: Difficulty,
  #[serde(default)]
  pub tags: Vec<String>,
  pub question_type: QuestionType,
  #[serde(default)]
  pub parameters: Vec<Parameter>,
  #[serde(default)]
  pub computed_vars: Vec<ComputedVar>,
  /// Expression producing the correct answer; absent when the template
  /// defers to a hardcoded generator via `generator_id`
  #[serde(default)]
  pub answer_formula: Option<String>,
  #[serde(default)]
  pub answer_format: AnswerFormat,
  pub question_template: String,
  #[serde(default)]
  pub solution_steps_template: Vec<String>,
  #[serde(default)]
  pub explanation: Option<String>,
  #[serde(default)]
  pub options: OptionsSpec,
  #[serde(default)]
  pub generator_id: Option<String>,
  pub is_active: bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Client-submittable template fields: everything except identity, the
/// soft-delete flag, and audit timestamps, which the server owns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateDraft {
  pub name: String,
  pub category: String,
  #[serde(default)]
  pub subcategory: Option<String>,
  pub difficulty: Difficulty,
  #[serde(default)]
  pub tags: Vec<String>,
  pub question_type: QuestionType,
  #[serde(default)]
  pub parameters: Vec<Parameter>,
  #[serde(default)]
  pub computed_vars: Vec<ComputedVar>,
  #[serde(default)]
  pub answer_formula: Option<String>,
  #[serde(default)]
  pub answer_format: AnswerFormat,
  pub question_template: String,
  #[serde(default)]
  pub solution_steps_template: Vec<String>,
  #[serde(default)]
  pub explanation: Option<String>,
  #[serde(default)]
  pub options: OptionsSpec,
  #[serde(default)]
  pub generator_id: Option<String>,
}

impl ProblemTemplate {
  /// Build a fresh template from a draft, minting server-owned fields.
  pub fn from_draft(id: String, draft: TemplateDraft) -> Self {
    let now = Utc::now();
    Self {
      id,
      name: draft.name,
      category: draft.category,
      subcategory: draft.subcategory,
      difficulty: draft.difficulty,
      tags: draft.tags,
      question_type: draft.question_type,
      parameters: draft.parameters,
      computed_vars: draft.computed_vars,
      answer_formula: draft.answer_formula,
      answer_format: draft.answer_format,
      question_template: draft.question_template,
      solution_steps_template: draft.solution_steps_template,
      explanation: draft.explanation,
      options: draft.options,
      generator_id: draft.generator_id,
      is_active: true,
      created_at: now,
      updated_at: now,
    }
  }

  /// Apply a draft over an existing template, preserving identity and
  /// creation time. The whitelisted field set is exactly the draft's fields.
  pub fn apply_draft(&mut self, draft: TemplateDraft) {
    self.name = draft.name;
    self.category = draft.category;
    self.subcategory = draft.subcategory;
    self.difficulty = draft.difficulty;
    self.tags = draft.tags;
    self.question_type = draft.question_type;
    self.parameters = draft.parameters;
    self.computed_vars = draft.computed_vars;
    self.answer_formula = draft.answer_formula;
    self.answer_format = draft.answer_format;
    self.question_template = draft.question_template;
    self.solution_steps_template = draft.solution_steps_template;
    self.explanation = draft.explanation;
    self.options = draft.options;
    self.generator_id = draft.generator_id;
    self.updated_at = Utc::now();
  }
}

/// A concrete value in a generation scope: sampled parameter or computed var.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
  Num(f64),
  Text(String),
}

impl Value {
  pub fn as_num(&self) -> Option<f64> {
    match self {
      Self::Num(n) => Some(*n),
      Self::Text(_) => None,
    }
  }
}

/// Resolved reference to something that can generate problems.
///
/// The external contract mixes template ids and catalog ids in one field,
/// disambiguated by a `tmpl:` prefix; this enum is the typed form that flows
/// through generation after the boundary parses it once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratorRef {
  Template(String),
  Hardcoded(String),
}

impl GeneratorRef {
  /// Parse an external type id: `tmpl:<id>` names a template row, anything
  /// else names a hardcoded catalog entry.
  pub fn parse(type_id: &str) -> Self {
    match type_id.strip_prefix("tmpl:") {
      Some(id) => Self::Template(id.to_string()),
      None => Self::Hardcoded(type_id.to_string()),
    }
  }

  /// The external string form, round-tripping `parse`.
  pub fn external_id(&self) -> String {
    match self {
      Self::Template(id) => format!("tmpl:{}", id),
      Self::Hardcoded(id) => id.clone(),
    }
  }
}
