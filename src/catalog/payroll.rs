//! Payroll generators. The host portal's learning content leans on payroll
//! arithmetic, so the catalog ships a couple of wage problems.

use rand::Rng;

use crate::domain::{Difficulty, GeneratedProblem, QuestionType};
use crate::engine::generate::mint_problem_id;
use crate::engine::interpolate::format_number;

pub(crate) fn overtime_pay(difficulty: Difficulty) -> GeneratedProblem {
  let mut rng = rand::rng();
  let rate = match difficulty {
    Difficulty::Easy | Difficulty::Medium => rng.random_range(12..=30) as f64,
    Difficulty::Hard => rng.random_range(24..=90) as f64 / 2.0,
  };
  let hours = rng.random_range(41..=60);
  let overtime_hours = hours - 40;
  let pay = 40.0 * rate + overtime_hours as f64 * rate * 1.5;

  GeneratedProblem {
    id: mint_problem_id(),
    question_text: format!(
      "An employee earns {} per hour and worked {} hours this week. Overtime beyond 40 hours pays time and a half. What is the gross pay for the week?",
      format_number(rate, 2),
      hours
    ),
    question_type: QuestionType::NumericInput,
    options: vec![],
    correct_answer: format_number(pay, 2),
    solution_steps: vec![
      format!("Regular pay: 40 * {} = {}", format_number(rate, 2), format_number(40.0 * rate, 2)),
      format!(
        "Overtime pay: {} * {} * 1.5 = {}",
        overtime_hours,
        format_number(rate, 2),
        format_number(overtime_hours as f64 * rate * 1.5, 2)
      ),
      format!(
        "Total: {} + {} = {}",
        format_number(40.0 * rate, 2),
        format_number(overtime_hours as f64 * rate * 1.5, 2),
        format_number(pay, 2)
      ),
    ],
    explanation: Some("Split the hours at 40 and apply the 1.5x multiplier to the overtime part.".to_string()),
    tolerance: 0.01,
    difficulty,
    category: "payroll".to_string(),
    subcategory: Some("wages".to_string()),
    tags: vec!["overtime".to_string()],
  }
}

pub(crate) fn gross_pay_check(difficulty: Difficulty) -> GeneratedProblem {
  let mut rng = rand::rng();
  let rate = rng.random_range(10..=40);
  let hours = match difficulty {
    Difficulty::Easy => rng.random_range(10..=25),
    _ => rng.random_range(20..=40),
  };
  let actual = rate * hours;

  // Half the time the stated figure is wrong by a plausible slip
  let truthy = rng.random_range(0..2) == 0;
  let stated = if truthy {
    actual
  } else {
    let slips = [actual + rate, actual - rate, actual + hours, rate * (hours + 2)];
    slips[rng.random_range(0..slips.len())]
  };
  let answer = if stated == actual { "True" } else { "False" };

  GeneratedProblem {
    id: mint_problem_id(),
    question_text: format!(
      "An employee earns {} per hour and worked {} hours. A timesheet lists the gross pay as {}. True or false: the figure is correct.",
      rate, hours, stated
    ),
    question_type: QuestionType::TrueFalse,
    options: vec!["True".to_string(), "False".to_string()],
    correct_answer: answer.to_string(),
    solution_steps: vec![
      format!("Gross pay = rate * hours = {} * {} = {}", rate, hours, actual),
      format!("The timesheet lists {}, so the statement is {}.", stated, answer.to_lowercase()),
    ],
    explanation: None,
    tolerance: 0.01,
    difficulty,
    category: "payroll".to_string(),
    subcategory: Some("wages".to_string()),
    tags: vec!["gross-pay".to_string()],
  }
}
