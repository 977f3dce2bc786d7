//! Percentage generators.

use rand::Rng;

use crate::domain::{Difficulty, GeneratedProblem, OptionsSpec, QuestionType};
use crate::engine::generate::mint_problem_id;
use crate::engine::interpolate::format_number;
use crate::engine::options::build_options;

pub(crate) fn percent_of(difficulty: Difficulty) -> GeneratedProblem {
  let mut rng = rand::rng();
  let (percents, bases): (&[i64], (i64, i64)) = match difficulty {
    Difficulty::Easy => (&[10, 20, 25, 50], (20, 200)),
    Difficulty::Medium => (&[5, 15, 30, 40, 60, 75], (50, 500)),
    Difficulty::Hard => (&[12, 18, 35, 45, 65, 85], (100, 2000)),
  };
  let percent = percents[rng.random_range(0..percents.len())];
  // Multiple-of-20 bases keep most answers whole without making them trivial
  let base = rng.random_range(bases.0 / 20..=bases.1 / 20) * 20;
  let answer = percent as f64 / 100.0 * base as f64;

  let spec = OptionsSpec::Distractors { count: 3, spread: Some((answer * 0.15).max(1.0)) };
  let options = build_options(&spec, answer, 2, &mut rng);

  GeneratedProblem {
    id: mint_problem_id(),
    question_text: format!("What is {}% of {}?", percent, base),
    question_type: QuestionType::MultipleChoice,
    options,
    correct_answer: format_number(answer, 2),
    solution_steps: vec![
      format!("{}% means {} / 100 = {}", percent, percent, format_number(percent as f64 / 100.0, 2)),
      format!(
        "{} * {} = {}",
        format_number(percent as f64 / 100.0, 2),
        base,
        format_number(answer, 2)
      ),
    ],
    explanation: Some("Convert the percentage to a decimal and multiply.".to_string()),
    tolerance: 0.01,
    difficulty,
    category: "percentages".to_string(),
    subcategory: None,
    tags: vec!["percent".to_string()],
  }
}

pub(crate) fn percent_change(difficulty: Difficulty) -> GeneratedProblem {
  let mut rng = rand::rng();
  let (lo, hi) = match difficulty {
    Difficulty::Easy | Difficulty::Medium => (40, 400),
    Difficulty::Hard => (150, 3000),
  };
  let old = rng.random_range(lo..=hi);
  // Shift in either direction; redraw until the rounded shift is non-zero
  let mut shift = 0;
  while shift == 0 {
    let delta = rng.random_range(-40..=60);
    shift = old * delta / 100;
  }
  let new = old + shift;
  let change = (new - old) as f64 / old as f64 * 100.0;

  GeneratedProblem {
    id: mint_problem_id(),
    question_text: format!(
      "A monthly report shows a figure moving from {} to {}. What is the percent change, to one decimal place? (Use a negative number for a decrease.)",
      old, new
    ),
    question_type: QuestionType::NumericInput,
    options: vec![],
    correct_answer: format_number(change, 1),
    solution_steps: vec![
      "Percent change = (new - old) / old * 100".to_string(),
      format!("({} - {}) / {} * 100 = {}", new, old, old, format_number(change, 1)),
    ],
    explanation: Some("Divide the difference by the original value, then scale to percent.".to_string()),
    tolerance: 0.1,
    difficulty,
    category: "percentages".to_string(),
    subcategory: None,
    tags: vec!["percent".to_string(), "change".to_string()],
  }
}
