//! Basic arithmetic generators, difficulty-scaled by digit count.

use rand::Rng;

use crate::domain::{Difficulty, GeneratedProblem, QuestionType};
use crate::engine::generate::mint_problem_id;

/// Operand range per difficulty: single, double, triple digit.
fn operand_range(difficulty: Difficulty) -> (i64, i64) {
  match difficulty {
    Difficulty::Easy => (2, 9),
    Difficulty::Medium => (10, 99),
    Difficulty::Hard => (100, 999),
  }
}

fn numeric_problem(
  question_text: String,
  answer: i64,
  solution_steps: Vec<String>,
  difficulty: Difficulty,
  subcategory: &str,
  tags: Vec<String>,
) -> GeneratedProblem {
  GeneratedProblem {
    id: mint_problem_id(),
    question_text,
    question_type: QuestionType::NumericInput,
    options: vec![],
    correct_answer: answer.to_string(),
    solution_steps,
    explanation: None,
    tolerance: 0.01,
    difficulty,
    category: "arithmetic".to_string(),
    subcategory: Some(subcategory.to_string()),
    tags,
  }
}

pub(crate) fn addition(difficulty: Difficulty) -> GeneratedProblem {
  let mut rng = rand::rng();
  let (lo, hi) = operand_range(difficulty);
  let a = rng.random_range(lo..=hi);
  let b = rng.random_range(lo..=hi);

  numeric_problem(
    format!("What is {} + {}?", a, b),
    a + b,
    vec![format!("{} + {} = {}", a, b, a + b)],
    difficulty,
    "addition",
    vec!["mental-math".to_string()],
  )
}

pub(crate) fn subtraction(difficulty: Difficulty) -> GeneratedProblem {
  let mut rng = rand::rng();
  let (lo, hi) = operand_range(difficulty);
  let a = rng.random_range(lo..=hi);
  // Keep the result non-negative
  let b = rng.random_range(0..=a);

  numeric_problem(
    format!("What is {} - {}?", a, b),
    a - b,
    vec![format!("{} - {} = {}", a, b, a - b)],
    difficulty,
    "subtraction",
    vec!["mental-math".to_string()],
  )
}

pub(crate) fn division(difficulty: Difficulty) -> GeneratedProblem {
  let mut rng = rand::rng();
  let (lo, hi) = match difficulty {
    Difficulty::Easy => (1, 9),
    Difficulty::Medium => (2, 12),
    Difficulty::Hard => (5, 20),
  };
  // Build the dividend from the quotient so division is always whole
  let divisor = rng.random_range(2..=hi);
  let quotient = rng.random_range(lo..=hi);
  let dividend = divisor * quotient;

  numeric_problem(
    format!("What is {} / {}?", dividend, divisor),
    quotient,
    vec![
      format!("{} / {} asks how many times {} fits into {}", dividend, divisor, divisor, dividend),
      format!("{} * {} = {}, so the answer is {}", divisor, quotient, dividend, quotient),
    ],
    difficulty,
    "division",
    vec!["mental-math".to_string()],
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_addition_easy_stays_single_digit() {
    for _ in 0..20 {
      let p = addition(Difficulty::Easy);
      let answer: i64 = p.correct_answer.parse().unwrap();
      assert!((4..=18).contains(&answer));
    }
  }

  #[test]
  fn test_subtraction_never_negative() {
    for _ in 0..20 {
      let p = subtraction(Difficulty::Hard);
      let answer: i64 = p.correct_answer.parse().unwrap();
      assert!(answer >= 0);
    }
  }

  #[test]
  fn test_division_is_whole() {
    for _ in 0..20 {
      let p = division(Difficulty::Medium);
      let answer: f64 = p.correct_answer.parse().unwrap();
      assert_eq!(answer.fract(), 0.0);
    }
  }
}
