//! Answer grading.
//!
//! Grading is total: every pair of strings classifies to a result, malformed
//! input included. Numeric answers get a three-band treatment - exact
//! (within tolerance), close (within an extended band or under 0.1% relative
//! error, still counted correct but flagged with a rounding diagnostic), and
//! incorrect. Choice and text answers are compared case-insensitively.

use crate::config;
use crate::domain::{CheckResult, QuestionType};

/// Grade one submitted answer against the authoritative correct answer.
pub fn check_answer(
  problem_id: &str,
  question_type: QuestionType,
  user_answer: &str,
  correct_answer: &str,
  tolerance: f64,
) -> CheckResult {
  match question_type {
    QuestionType::NumericInput | QuestionType::MathTemplate => {
      check_numeric(problem_id, user_answer, correct_answer, tolerance)
    }
    QuestionType::MultipleChoice | QuestionType::TrueFalse => {
      check_choice(problem_id, user_answer, correct_answer)
    }
    QuestionType::ShortAnswer => check_short_answer(problem_id, user_answer, correct_answer),
  }
}

fn result(
  problem_id: &str,
  user_answer: &str,
  correct_answer: &str,
  is_correct: bool,
  is_close: bool,
  difference: Option<f64>,
  feedback: String,
  rounding_warning: Option<String>,
) -> CheckResult {
  CheckResult {
    problem_id: problem_id.to_string(),
    is_correct,
    is_close,
    user_answer: user_answer.to_string(),
    correct_answer: correct_answer.to_string(),
    difference,
    feedback,
    rounding_warning,
  }
}

// ============================================================================
// Numeric grading
// ============================================================================

fn check_numeric(
  problem_id: &str,
  user_answer: &str,
  correct_answer: &str,
  tolerance: f64,
) -> CheckResult {
  let user_value = match user_answer.trim().parse::<f64>() {
    Ok(v) if v.is_finite() => v,
    _ => {
      return result(
        problem_id,
        user_answer,
        correct_answer,
        false,
        false,
        None,
        format!("Could not read '{}' as a number.", user_answer.trim()),
        None,
      );
    }
  };

  let correct_value = match correct_answer.trim().parse::<f64>() {
    Ok(v) if v.is_finite() => v,
    _ => {
      // A stored answer that does not parse is an authoring defect; still
      // classify rather than error
      return result(
        problem_id,
        user_answer,
        correct_answer,
        false,
        false,
        None,
        "The stored answer for this problem is not numeric.".to_string(),
        None,
      );
    }
  };

  let diff = (user_value - correct_value).abs();
  let close_band = (tolerance * config::CLOSE_TOLERANCE_FACTOR).max(config::CLOSE_TOLERANCE_FLOOR);

  if diff <= tolerance {
    return result(
      problem_id,
      user_answer,
      correct_answer,
      true,
      false,
      Some(diff),
      "Correct!".to_string(),
      None,
    );
  }

  if diff <= close_band {
    let warning = rounding_diagnostic(user_answer, correct_answer, diff);
    return result(
      problem_id,
      user_answer,
      correct_answer,
      true,
      true,
      Some(diff),
      "Counted as correct - within the extended tolerance band.".to_string(),
      Some(warning),
    );
  }

  if correct_value != 0.0 {
    let relative = diff / correct_value.abs();
    if relative < config::RELATIVE_ERROR_CUTOFF {
      return result(
        problem_id,
        user_answer,
        correct_answer,
        true,
        true,
        Some(diff),
        "Counted as correct - relative error under 0.1%.".to_string(),
        Some(format!(
          "Your answer differs by {:.4}% relative error; check the rounding of your final result.",
          relative * 100.0
        )),
      );
    }
  }

  result(
    problem_id,
    user_answer,
    correct_answer,
    false,
    false,
    Some(diff),
    format!("Incorrect. The correct answer is {}.", correct_answer),
    None,
  )
}

/// Diagnose the likely cause of a close-but-not-exact numeric answer by
/// comparing the decimal-place counts of the two strings.
fn rounding_diagnostic(user_answer: &str, correct_answer: &str, diff: f64) -> String {
  let user_places = decimal_places(user_answer);
  let correct_places = decimal_places(correct_answer);

  if user_places != correct_places {
    format!(
      "Your answer has {} decimal place(s) but {} were expected - re-check your rounding.",
      user_places, correct_places
    )
  } else {
    format!(
      "Your intermediate values may have been rounded during calculation (off by {:.6}).",
      diff
    )
  }
}

/// Count digits after the decimal point in a numeric string.
fn decimal_places(s: &str) -> usize {
  match s.trim().split_once('.') {
    Some((_, frac)) => frac.chars().take_while(|c| c.is_ascii_digit()).count(),
    None => 0,
  }
}

// ============================================================================
// Choice and text grading
// ============================================================================

fn check_choice(problem_id: &str, user_answer: &str, correct_answer: &str) -> CheckResult {
  let matches = normalize(user_answer) == normalize(correct_answer);
  let feedback = if matches {
    "Correct!".to_string()
  } else {
    format!("Incorrect. The correct answer is {}.", correct_answer)
  };
  result(problem_id, user_answer, correct_answer, matches, false, None, feedback, None)
}

fn check_short_answer(problem_id: &str, user_answer: &str, correct_answer: &str) -> CheckResult {
  let user = normalize(user_answer);
  let correct = normalize(correct_answer);

  if user == correct {
    return result(
      problem_id,
      user_answer,
      correct_answer,
      true,
      false,
      None,
      "Correct!".to_string(),
      None,
    );
  }

  // Partial mode: containment in either direction forgives minor phrasing
  // differences ("the mean" vs "mean")
  if !user.is_empty() && (user.contains(&correct) || correct.contains(&user)) {
    return result(
      problem_id,
      user_answer,
      correct_answer,
      true,
      true,
      None,
      "Accepted - close enough to the expected phrasing.".to_string(),
      None,
    );
  }

  result(
    problem_id,
    user_answer,
    correct_answer,
    false,
    false,
    None,
    format!("Incorrect. The expected answer is {}.", correct_answer),
    None,
  )
}

fn normalize(s: &str) -> String {
  s.trim().to_lowercase()
}
