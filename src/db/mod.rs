pub mod questions;
pub mod schema;
pub mod sessions;
pub mod templates;

use rusqlite::{Connection, Result};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::domain::{
  AnswerFormat, ComputedVar, Difficulty, OptionsSpec, ParamKind, Parameter, ProblemTemplate,
  QuestionType, TemplateDraft, mint_id,
};
use crate::engine::validate::validate_template;

// Re-export all public items from submodules
pub use questions::*;
pub use schema::run_migrations;
pub use sessions::*;
pub use templates::*;

pub type DbPool = Arc<Mutex<Connection>>;

/// Extension trait for logging errors before discarding them
pub trait LogOnError<T> {
  /// Log the error at warn level and return None
  fn log_warn(self, context: &str) -> Option<T>;
  /// Log the error at warn level and return the default
  fn log_warn_default(self, context: &str) -> T
  where
    T: Default;
}

impl<T, E: std::fmt::Display> LogOnError<T> for std::result::Result<T, E> {
  fn log_warn(self, context: &str) -> Option<T> {
    match self {
      Ok(v) => Some(v),
      Err(e) => {
        tracing::warn!("{}: {}", context, e);
        None
      }
    }
  }

  fn log_warn_default(self, context: &str) -> T
  where
    T: Default,
  {
    match self {
      Ok(v) => v,
      Err(e) => {
        tracing::warn!("{}: {}", context, e);
        T::default()
      }
    }
  }
}

/// Error returned when database lock cannot be acquired
#[derive(Debug)]
pub struct DbLockError;

impl std::fmt::Display for DbLockError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "Database unavailable")
  }
}

impl std::error::Error for DbLockError {}

/// Try to acquire the database lock, returning an error if poisoned
pub fn try_lock(pool: &DbPool) -> std::result::Result<MutexGuard<'_, Connection>, DbLockError> {
  pool.lock().map_err(|_: PoisonError<_>| {
    eprintln!("ERROR: Database mutex poisoned - a thread panicked while holding the lock");
    DbLockError
  })
}

pub fn init_db(path: &Path) -> Result<DbPool> {
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent).ok();
  }

  // Create backup before migrations if database exists
  if path.exists() {
    let backup_path = path.with_extension("db.backup");
    if let Err(e) = std::fs::copy(path, &backup_path) {
      eprintln!("Warning: Could not create database backup: {}", e);
    }
  }

  let conn = Connection::open(path)?;
  run_migrations(&conn)?;
  Ok(Arc::new(Mutex::new(conn)))
}

/// Seed starter templates on first run so the service generates problems
/// out of the box. No-op once any template row exists.
pub fn seed_builtin_templates(conn: &Connection) -> Result<()> {
  let count: i64 = conn.query_row("SELECT COUNT(*) FROM problem_templates", [], |row| row.get(0))?;
  if count > 0 {
    return Ok(());
  }

  for draft in builtin_template_drafts() {
    let template = ProblemTemplate::from_draft(mint_id(crate::config::ID_LENGTH), draft);
    let report = validate_template(&template);
    if !report.is_valid() {
      // A seed that fails its own validator is a programming error worth
      // hearing about, but must not block startup
      tracing::warn!("Skipping invalid seed template '{}': {:?}", template.name, report.errors);
      continue;
    }
    insert_template(conn, &template)?;
  }
  Ok(())
}

fn builtin_template_drafts() -> Vec<TemplateDraft> {
  vec![
    TemplateDraft {
      name: "Triangle area from base and height".to_string(),
      category: "geometry".to_string(),
      subcategory: Some("triangles".to_string()),
      difficulty: Difficulty::Easy,
      tags: vec!["area".to_string()],
      question_type: QuestionType::NumericInput,
      parameters: vec![
        Parameter {
          name: "base".to_string(),
          kind: ParamKind::Integer { min: 4, max: 30, step: Some(2) },
          constraint: None,
        },
        Parameter {
          name: "height".to_string(),
          kind: ParamKind::Integer { min: 3, max: 20, step: None },
          constraint: None,
        },
      ],
      computed_vars: vec![ComputedVar {
        name: "area".to_string(),
        formula: "0.5 * base * height".to_string(),
      }],
      answer_formula: Some("area".to_string()),
      answer_format: AnswerFormat { decimals: 2, tolerance: 0.01 },
      question_template:
        "A triangle has a base of {base} cm and a height of {height} cm. What is its area in square centimeters?"
          .to_string(),
      solution_steps_template: vec![
        "Area of a triangle = 1/2 * base * height".to_string(),
        "Area = 0.5 * {base} * {height} = {area} cm^2".to_string(),
      ],
      explanation: Some("Halve the product of the base and the height.".to_string()),
      options: OptionsSpec::None,
      generator_id: None,
    },
    TemplateDraft {
      name: "Angle difference".to_string(),
      category: "geometry".to_string(),
      subcategory: Some("angles".to_string()),
      difficulty: Difficulty::Easy,
      tags: vec!["angles".to_string()],
      question_type: QuestionType::NumericInput,
      parameters: vec![
        Parameter {
          name: "angle1".to_string(),
          kind: ParamKind::Integer { min: 20, max: 160, step: Some(5) },
          constraint: None,
        },
        Parameter {
          name: "angle2".to_string(),
          kind: ParamKind::Integer { min: 20, max: 160, step: Some(5) },
          constraint: Some("abs(angle2 - angle1) > 5".to_string()),
        },
      ],
      computed_vars: vec![ComputedVar {
        name: "difference".to_string(),
        formula: "abs(angle1 - angle2)".to_string(),
      }],
      answer_formula: Some("difference".to_string()),
      answer_format: AnswerFormat { decimals: 0, tolerance: 0.5 },
      question_template:
        "Two angles measure {angle1} and {angle2} degrees. By how many degrees do they differ?"
          .to_string(),
      solution_steps_template: vec![
        "Subtract the smaller angle from the larger one".to_string(),
        "|{angle1} - {angle2}| = {difference} degrees".to_string(),
      ],
      explanation: None,
      options: OptionsSpec::None,
      generator_id: None,
    },
    TemplateDraft {
      name: "Sales tax total".to_string(),
      category: "percentages".to_string(),
      subcategory: Some("tax".to_string()),
      difficulty: Difficulty::Medium,
      tags: vec!["percent".to_string(), "money".to_string()],
      question_type: QuestionType::MultipleChoice,
      parameters: vec![
        Parameter {
          name: "price".to_string(),
          kind: ParamKind::Integer { min: 20, max: 400, step: Some(5) },
          constraint: None,
        },
        Parameter {
          name: "tax_rate".to_string(),
          kind: ParamKind::Choice {
            options: vec![
              crate::domain::ChoiceValue::Number(5.0),
              crate::domain::ChoiceValue::Number(8.0),
              crate::domain::ChoiceValue::Number(10.0),
            ],
          },
          constraint: None,
        },
      ],
      computed_vars: vec![ComputedVar {
        name: "total".to_string(),
        formula: "price * (1 + tax_rate / 100)".to_string(),
      }],
      answer_formula: Some("total".to_string()),
      answer_format: AnswerFormat { decimals: 2, tolerance: 0.01 },
      question_template:
        "An item costs {price} before tax. With a sales tax of {tax_rate}%, what is the total price?"
          .to_string(),
      solution_steps_template: vec![
        "Total = price * (1 + tax rate / 100)".to_string(),
        "Total = {price} * (1 + {tax_rate} / 100) = {total}".to_string(),
      ],
      explanation: Some("Scale the price by one plus the tax rate as a decimal.".to_string()),
      options: OptionsSpec::Distractors { count: 3, spread: None },
      generator_id: None,
    },
  ]
}
