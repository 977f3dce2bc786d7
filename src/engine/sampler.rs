//! Parameter sampling for template generation.
//!
//! Draws a concrete value for each declared parameter in order. A parameter
//! with a constraint predicate over earlier parameters is resampled up to a
//! bounded retry count; exceeding the bound is a generation error, never an
//! unbounded loop.

use rand::Rng;

use crate::config;
use crate::domain::{ChoiceValue, ParamKind, Parameter, Value};
use crate::engine::{eval, GenerationError, Scope};

/// Sample every parameter into a flat name -> value scope.
pub fn sample_parameters(
  parameters: &[Parameter],
  rng: &mut impl Rng,
) -> Result<Scope, GenerationError> {
  let mut scope = Scope::new();

  for param in parameters {
    let mut accepted = None;

    for _ in 0..config::MAX_CONSTRAINT_RETRIES {
      let candidate = draw(&param.kind, rng);

      let satisfied = match &param.constraint {
        None => true,
        Some(predicate) => {
          // The candidate participates in its own constraint
          scope.insert(param.name.clone(), candidate.clone());
          let ok = eval::eval_predicate(predicate, &scope).map_err(|source| {
            GenerationError::Formula { formula: predicate.clone(), source }
          })?;
          if !ok {
            scope.remove(&param.name);
          }
          ok
        }
      };

      if satisfied {
        accepted = Some(candidate);
        break;
      }
    }

    match accepted {
      Some(value) => {
        scope.insert(param.name.clone(), value);
      }
      None => {
        return Err(GenerationError::ConstraintUnsatisfiable { parameter: param.name.clone() });
      }
    }
  }

  Ok(scope)
}

/// Draw one value for a parameter kind.
fn draw(kind: &ParamKind, rng: &mut impl Rng) -> Value {
  match kind {
    ParamKind::Integer { min, max, step } => {
      let step = step.unwrap_or(1).max(1);
      let (lo, hi) = if min <= max { (*min, *max) } else { (*max, *min) };
      let slots = (hi - lo) / step;
      let value = lo + rng.random_range(0..=slots) * step;
      Value::Num(value as f64)
    }
    ParamKind::Float { min, max, step } => {
      let (lo, hi) = if min <= max { (*min, *max) } else { (*max, *min) };
      match step {
        Some(step) if *step > 0.0 => {
          let slots = ((hi - lo) / step).floor() as i64;
          let value = lo + rng.random_range(0..=slots) as f64 * step;
          Value::Num(value)
        }
        _ => Value::Num(rng.random_range(lo..=hi)),
      }
    }
    ParamKind::Choice { options } => {
      if options.is_empty() {
        // Validator flags empty choice sets; degrade to zero rather than panic
        return Value::Num(0.0);
      }
      let idx = rng.random_range(0..options.len());
      match &options[idx] {
        ChoiceValue::Number(n) => Value::Num(*n),
        ChoiceValue::Text(s) => Value::Text(s.clone()),
      }
    }
  }
}
