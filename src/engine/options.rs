//! Wrong-answer generation for multiple-choice problems.
//!
//! Two strategies: `distractors` clusters plausible wrong values around the
//! correct answer; `range` spreads them uniformly across a declared span,
//! skipping a window around the correct value. Either way the final list is
//! deduplicated against the correct answer and shuffled, so the correct
//! option's position is never predictable.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::config;
use crate::domain::OptionsSpec;
use crate::engine::interpolate::format_number;

/// Build the full option list (correct answer included) for a numeric
/// multiple-choice problem. Returns an empty list for `OptionsSpec::None`.
pub fn build_options(
  spec: &OptionsSpec,
  correct: f64,
  decimals: u8,
  rng: &mut impl Rng,
) -> Vec<String> {
  let correct_text = format_number(correct, decimals);

  let distractors = match spec {
    OptionsSpec::None => return Vec::new(),
    OptionsSpec::Distractors { count, spread } => {
      clustered_distractors(correct, decimals, *count, *spread, &correct_text, rng)
    }
    OptionsSpec::Range { min, max, count, exclusion } => {
      range_distractors(correct, decimals, *min, *max, *count, *exclusion, &correct_text)
    }
  };

  let mut choices = vec![correct_text];
  choices.extend(distractors);
  choices.shuffle(rng);
  choices
}

/// Wrong values near the correct answer: scaled offsets in both directions,
/// occasionally a doubled or halved value for sign/magnitude slips.
fn clustered_distractors(
  correct: f64,
  decimals: u8,
  count: usize,
  spread: Option<f64>,
  correct_text: &str,
  rng: &mut impl Rng,
) -> Vec<String> {
  let count = if count == 0 { config::DEFAULT_DISTRACTOR_COUNT } else { count };
  // Offset unit: explicit spread, or a magnitude-relative default
  let unit = spread.unwrap_or_else(|| (correct.abs() * 0.1).max(1.0));

  let mut out: Vec<String> = Vec::new();
  let mut attempts = 0;
  while out.len() < count && attempts < count * 20 {
    attempts += 1;
    let candidate = match attempts % 4 {
      0 => correct * 2.0,
      1 => correct + unit * rng.random_range(1..=3) as f64,
      2 => correct - unit * rng.random_range(1..=3) as f64,
      _ => {
        let sign = if rng.random_range(0..2) == 0 { 1.0 } else { -1.0 };
        correct + unit * rng.random_range(1..=5) as f64 * sign
      }
    };
    if !candidate.is_finite() {
      continue;
    }
    let text = format_number(candidate, decimals);
    if text != correct_text && !out.contains(&text) {
      out.push(text);
    }
  }
  out
}

/// Wrong values spread evenly across [min, max], excluding a window around
/// the correct answer.
fn range_distractors(
  correct: f64,
  decimals: u8,
  min: f64,
  max: f64,
  count: usize,
  exclusion: Option<f64>,
  correct_text: &str,
) -> Vec<String> {
  let count = if count == 0 { config::DEFAULT_DISTRACTOR_COUNT } else { count };
  let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
  let window = exclusion.unwrap_or((hi - lo) * 0.05);

  // Oversample the grid so exclusions still leave enough candidates
  let slots = (count * 2 + 1).max(4);
  let step = (hi - lo) / slots as f64;

  let mut out: Vec<String> = Vec::new();
  for i in 0..=slots {
    if out.len() >= count {
      break;
    }
    let candidate = lo + step * i as f64;
    if (candidate - correct).abs() <= window {
      continue;
    }
    let text = format_number(candidate, decimals);
    if text != correct_text && !out.contains(&text) {
      out.push(text);
    }
  }
  out
}
