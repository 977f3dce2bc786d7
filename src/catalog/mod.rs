//! Hardcoded generator catalog.
//!
//! A fixed, named set of code-defined generator functions exposed through
//! the same generate-by-id contract as templates - the code is the template.
//! The catalog is a static table constructed at compile time and read-only
//! thereafter; there is no runtime registration.

mod arithmetic;
mod geometry;
mod payroll;
mod percentages;

use serde::Serialize;

use crate::domain::{Difficulty, GeneratedProblem};
use crate::engine::GenerationError;

/// One catalog entry: metadata plus the pure generator function.
pub struct GeneratorEntry {
  pub id: &'static str,
  pub name: &'static str,
  pub description: &'static str,
  pub category: &'static str,
  pub module: &'static str,
  pub difficulties: &'static [Difficulty],
  pub build: fn(Difficulty) -> GeneratedProblem,
}

use Difficulty::{Easy, Hard, Medium};

const ALL: &[Difficulty] = &[Easy, Medium, Hard];

/// The catalog, grouped by category.
static CATALOG: &[GeneratorEntry] = &[
  // --- Geometry ---
  GeneratorEntry {
    id: "area-triangle",
    name: "Triangle area",
    description: "Compute the area of a triangle from base and height",
    category: "geometry",
    module: "geometry",
    difficulties: ALL,
    build: geometry::area_triangle,
  },
  GeneratorEntry {
    id: "area-circle",
    name: "Circle area",
    description: "Compute the area of a circle from its radius",
    category: "geometry",
    module: "geometry",
    difficulties: ALL,
    build: geometry::area_circle,
  },
  GeneratorEntry {
    id: "hypotenuse",
    name: "Hypotenuse length",
    description: "Apply the Pythagorean theorem to two legs",
    category: "geometry",
    module: "geometry",
    difficulties: &[Medium, Hard],
    build: geometry::hypotenuse,
  },
  GeneratorEntry {
    id: "rectangle-perimeter",
    name: "Rectangle perimeter",
    description: "Compute the perimeter of a rectangle",
    category: "geometry",
    module: "geometry",
    difficulties: &[Easy, Medium],
    build: geometry::rectangle_perimeter,
  },
  // --- Arithmetic ---
  GeneratorEntry {
    id: "addition",
    name: "Addition",
    description: "Add two numbers scaled by difficulty",
    category: "arithmetic",
    module: "arithmetic",
    difficulties: ALL,
    build: arithmetic::addition,
  },
  GeneratorEntry {
    id: "subtraction",
    name: "Subtraction",
    description: "Subtract two numbers with a non-negative result",
    category: "arithmetic",
    module: "arithmetic",
    difficulties: ALL,
    build: arithmetic::subtraction,
  },
  GeneratorEntry {
    id: "division",
    name: "Whole division",
    description: "Divide with a whole-number quotient",
    category: "arithmetic",
    module: "arithmetic",
    difficulties: ALL,
    build: arithmetic::division,
  },
  // --- Percentages ---
  GeneratorEntry {
    id: "percent-of",
    name: "Percent of a number",
    description: "Find a percentage of a base value (multiple choice)",
    category: "percentages",
    module: "percentages",
    difficulties: ALL,
    build: percentages::percent_of,
  },
  GeneratorEntry {
    id: "percent-change",
    name: "Percent change",
    description: "Compute the percent change between two values",
    category: "percentages",
    module: "percentages",
    difficulties: &[Medium, Hard],
    build: percentages::percent_change,
  },
  // --- Payroll ---
  GeneratorEntry {
    id: "overtime-pay",
    name: "Overtime pay",
    description: "Weekly pay with time-and-a-half over 40 hours",
    category: "payroll",
    module: "payroll",
    difficulties: &[Medium, Hard],
    build: payroll::overtime_pay,
  },
  GeneratorEntry {
    id: "gross-pay-check",
    name: "Gross pay check",
    description: "Judge whether a stated gross pay figure is right (true/false)",
    category: "payroll",
    module: "payroll",
    difficulties: &[Easy, Medium],
    build: payroll::gross_pay_check,
  },
];

/// Catalog row for the read-only listing endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratorInfo {
  pub id: String,
  pub name: String,
  pub description: String,
  pub category: String,
  pub module: String,
  pub difficulties: Vec<Difficulty>,
}

impl From<&GeneratorEntry> for GeneratorInfo {
  fn from(entry: &GeneratorEntry) -> Self {
    Self {
      id: entry.id.to_string(),
      name: entry.name.to_string(),
      description: entry.description.to_string(),
      category: entry.category.to_string(),
      module: entry.module.to_string(),
      difficulties: entry.difficulties.to_vec(),
    }
  }
}

/// Every catalog entry, in declaration order (grouped by category).
pub fn all() -> &'static [GeneratorEntry] {
  CATALOG
}

/// Look up an entry by id.
pub fn find(id: &str) -> Option<&'static GeneratorEntry> {
  CATALOG.iter().find(|entry| entry.id == id)
}

/// Invoke a generator by id at a requested difficulty. A difficulty the
/// entry does not support falls back to the entry's first supported one.
pub fn generate(id: &str, difficulty: Difficulty) -> Result<GeneratedProblem, GenerationError> {
  let entry = find(id).ok_or_else(|| GenerationError::UnknownGenerator(id.to_string()))?;
  let effective = if entry.difficulties.contains(&difficulty) {
    difficulty
  } else {
    entry.difficulties[0]
  };
  Ok((entry.build)(effective))
}

/// Invoke a generator by id at medium difficulty.
pub fn generate_default(id: &str) -> Result<GeneratedProblem, GenerationError> {
  generate(id, Difficulty::Medium)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::engine::check::check_answer;
  use crate::engine::interpolate::collect_tokens;

  #[test]
  fn test_catalog_ids_are_unique() {
    let mut ids: Vec<&str> = CATALOG.iter().map(|e| e.id).collect();
    ids.sort();
    let before = ids.len();
    ids.dedup();
    assert_eq!(ids.len(), before);
  }

  #[test]
  fn test_every_entry_has_supported_difficulties() {
    for entry in CATALOG {
      assert!(!entry.difficulties.is_empty(), "{} has no difficulties", entry.id);
    }
  }

  #[test]
  fn test_every_generator_produces_well_formed_problems() {
    for entry in CATALOG {
      for &difficulty in entry.difficulties {
        let problem = (entry.build)(difficulty);
        assert!(!problem.question_text.is_empty(), "{} empty question", entry.id);
        assert!(!problem.correct_answer.is_empty(), "{} empty answer", entry.id);
        assert!(problem.tolerance > 0.0, "{} non-positive tolerance", entry.id);
        assert_eq!(problem.category, entry.category);
        assert!(
          collect_tokens(&problem.question_text).is_empty(),
          "{} left a token in question text",
          entry.id
        );
        if !problem.options.is_empty() {
          assert!(
            problem.options.contains(&problem.correct_answer),
            "{} options missing the correct answer",
            entry.id
          );
        }
      }
    }
  }

  #[test]
  fn test_grading_roundtrip_for_every_generator() {
    // check(correct, correct) must be exact for everything the catalog emits
    for entry in CATALOG {
      let problem = (entry.build)(entry.difficulties[0]);
      let result = check_answer(
        &problem.id,
        problem.question_type,
        &problem.correct_answer,
        &problem.correct_answer,
        problem.tolerance,
      );
      assert!(result.is_correct, "{} failed self-grading", entry.id);
      assert!(!result.is_close, "{} self-grading flagged close", entry.id);
    }
  }

  #[test]
  fn test_generate_by_id() {
    let problem = generate("area-triangle", Difficulty::Easy).unwrap();
    assert_eq!(problem.category, "geometry");
  }

  #[test]
  fn test_generate_unknown_id() {
    assert!(matches!(
      generate("no-such-id", Difficulty::Easy),
      Err(GenerationError::UnknownGenerator(_))
    ));
  }

  #[test]
  fn test_unsupported_difficulty_falls_back() {
    // hypotenuse supports medium/hard; easy falls back to medium
    let problem = generate("hypotenuse", Difficulty::Easy).unwrap();
    assert!(!problem.question_text.is_empty());
  }
}
