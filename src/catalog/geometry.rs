//! Geometry generators.

use rand::Rng;

use crate::domain::{Difficulty, GeneratedProblem, QuestionType};
use crate::engine::generate::mint_problem_id;
use crate::engine::interpolate::format_number;

/// Difficulty-scaled integer side length.
fn side(difficulty: Difficulty, rng: &mut impl Rng) -> i64 {
  match difficulty {
    Difficulty::Easy => rng.random_range(2..=10),
    Difficulty::Medium => rng.random_range(5..=25),
    Difficulty::Hard => rng.random_range(10..=60),
  }
}

pub(crate) fn area_triangle(difficulty: Difficulty) -> GeneratedProblem {
  let mut rng = rand::rng();
  // Even base keeps half-products tidy at easy difficulty
  let base = side(difficulty, &mut rng) * 2;
  let height = side(difficulty, &mut rng);
  let area = 0.5 * base as f64 * height as f64;

  GeneratedProblem {
    id: mint_problem_id(),
    question_text: format!(
      "A triangle has a base of {} cm and a height of {} cm. What is its area in square centimeters?",
      base, height
    ),
    question_type: QuestionType::NumericInput,
    options: vec![],
    correct_answer: format_number(area, 2),
    solution_steps: vec![
      "Area of a triangle = 1/2 * base * height".to_string(),
      format!("Area = 0.5 * {} * {} = {}", base, height, format_number(area, 2)),
    ],
    explanation: Some("Halve the product of the base and the height.".to_string()),
    tolerance: 0.01,
    difficulty,
    category: "geometry".to_string(),
    subcategory: Some("triangles".to_string()),
    tags: vec!["area".to_string()],
  }
}

pub(crate) fn area_circle(difficulty: Difficulty) -> GeneratedProblem {
  let mut rng = rand::rng();
  let radius = side(difficulty, &mut rng);
  let area = std::f64::consts::PI * (radius * radius) as f64;

  GeneratedProblem {
    id: mint_problem_id(),
    question_text: format!(
      "A circle has a radius of {} cm. What is its area in square centimeters, to two decimal places?",
      radius
    ),
    question_type: QuestionType::NumericInput,
    options: vec![],
    correct_answer: format_number(area, 2),
    solution_steps: vec![
      "Area of a circle = pi * r^2".to_string(),
      format!("Area = pi * {}^2 = {}", radius, format_number(area, 2)),
    ],
    explanation: Some("Square the radius and multiply by pi.".to_string()),
    // Rounding pi mid-calculation is common; give a slightly wider window
    tolerance: 0.05,
    difficulty,
    category: "geometry".to_string(),
    subcategory: Some("circles".to_string()),
    tags: vec!["area".to_string(), "pi".to_string()],
  }
}

pub(crate) fn hypotenuse(difficulty: Difficulty) -> GeneratedProblem {
  let mut rng = rand::rng();
  let a = side(difficulty, &mut rng);
  let b = side(difficulty, &mut rng);
  let c = ((a * a + b * b) as f64).sqrt();

  GeneratedProblem {
    id: mint_problem_id(),
    question_text: format!(
      "A right triangle has legs of {} cm and {} cm. How long is the hypotenuse, to two decimal places?",
      a, b
    ),
    question_type: QuestionType::NumericInput,
    options: vec![],
    correct_answer: format_number(c, 2),
    solution_steps: vec![
      "By the Pythagorean theorem, c^2 = a^2 + b^2".to_string(),
      format!("c^2 = {}^2 + {}^2 = {}", a, b, a * a + b * b),
      format!("c = sqrt({}) = {}", a * a + b * b, format_number(c, 2)),
    ],
    explanation: Some("Take the square root of the sum of the squared legs.".to_string()),
    tolerance: 0.01,
    difficulty,
    category: "geometry".to_string(),
    subcategory: Some("triangles".to_string()),
    tags: vec!["pythagorean".to_string()],
  }
}

pub(crate) fn rectangle_perimeter(difficulty: Difficulty) -> GeneratedProblem {
  let mut rng = rand::rng();
  let width = side(difficulty, &mut rng);
  let length = width + rng.random_range(1..=10);
  let perimeter = 2 * (width + length);

  GeneratedProblem {
    id: mint_problem_id(),
    question_text: format!(
      "A rectangle is {} m long and {} m wide. What is its perimeter in meters?",
      length, width
    ),
    question_type: QuestionType::NumericInput,
    options: vec![],
    correct_answer: perimeter.to_string(),
    solution_steps: vec![
      "Perimeter = 2 * (length + width)".to_string(),
      format!("Perimeter = 2 * ({} + {}) = {}", length, width, perimeter),
    ],
    explanation: None,
    tolerance: 0.01,
    difficulty,
    category: "geometry".to_string(),
    subcategory: Some("rectangles".to_string()),
    tags: vec!["perimeter".to_string()],
  }
}
