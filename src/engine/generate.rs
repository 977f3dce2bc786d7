//! Problem generation: sample, evaluate, render, attach options.
//!
//! One call produces one immutable [`GeneratedProblem`]. Sampling is random;
//! everything after the sampled scope is deterministic, so re-running the
//! evaluation and rendering over the same scope reproduces the same problem.
//! A sample whose formulas produce NaN or infinity is discarded and redrawn
//! up to a bounded retry count.

use rand::Rng;

use crate::catalog;
use crate::config;
use crate::domain::{
  GeneratedProblem, GeneratorRef, ProblemTemplate, QuestionType, Value, mint_id,
};
use crate::engine::{GenerationError, Scope, eval, interpolate, options, sampler};

/// Mint a problem id: short, unique within a session.
pub fn mint_problem_id() -> String {
  format!("q-{}", mint_id(12))
}

/// Generate one problem from a template.
///
/// A template linked to a hardcoded generator defers to it entirely - the
/// code is the template.
pub fn generate_from_template(
  template: &ProblemTemplate,
  rng: &mut impl Rng,
) -> Result<GeneratedProblem, GenerationError> {
  if let Some(generator_id) = &template.generator_id {
    return catalog::generate(generator_id, template.difficulty);
  }

  let formula = template
    .answer_formula
    .as_deref()
    .ok_or_else(|| GenerationError::NoAnswerSource(template.id.clone()))?;

  // A sample can land on a division by zero or a domain error (sqrt of a
  // negative); those are discarded and redrawn rather than surfaced
  let mut last_failure = formula;
  for _ in 0..config::MAX_GENERATION_RETRIES {
    let mut scope = sampler::sample_parameters(&template.parameters, rng)?;

    match extend_scope(&mut scope, template) {
      Ok(()) => {}
      Err(ExtendOutcome::NonFinite(name)) => {
        last_failure = name;
        continue;
      }
      Err(ExtendOutcome::Failed(e)) => return Err(e),
    }

    let answer = match eval::eval_formula(formula, &scope) {
      Ok(v) if v.is_finite() => v,
      Ok(_) => {
        last_failure = formula;
        continue;
      }
      Err(source) => {
        return Err(GenerationError::Formula { formula: formula.to_string(), source });
      }
    };

    return Ok(assemble(template, &scope, answer, rng));
  }

  Err(GenerationError::NonFinite { formula: last_failure.to_string() })
}

enum ExtendOutcome<'a> {
  NonFinite(&'a str),
  Failed(GenerationError),
}

/// Evaluate computed vars in declaration order, extending the scope.
fn extend_scope<'a>(
  scope: &mut Scope,
  template: &'a ProblemTemplate,
) -> Result<(), ExtendOutcome<'a>> {
  for var in &template.computed_vars {
    match eval::eval_formula(&var.formula, scope) {
      Ok(v) if v.is_finite() => {
        scope.insert(var.name.clone(), Value::Num(v));
      }
      Ok(_) => return Err(ExtendOutcome::NonFinite(&var.formula)),
      Err(source) => {
        return Err(ExtendOutcome::Failed(GenerationError::Formula {
          formula: var.formula.clone(),
          source,
        }));
      }
    }
  }
  Ok(())
}

/// Deterministic assembly of the final problem from a complete scope.
fn assemble(
  template: &ProblemTemplate,
  scope: &Scope,
  answer: f64,
  rng: &mut impl Rng,
) -> GeneratedProblem {
  let decimals = template.answer_format.decimals;
  // True/false formulas are predicates: any non-zero result means "True"
  let correct_answer = if template.question_type == QuestionType::TrueFalse {
    if answer != 0.0 { "True".to_string() } else { "False".to_string() }
  } else {
    interpolate::format_number(answer, decimals)
  };

  // The answer is visible to solution steps as a scope value
  let mut render_scope = scope.clone();
  render_scope.insert("answer".to_string(), Value::Num(answer));

  let question_text = interpolate::render(&template.question_template, &render_scope, decimals);
  let solution_steps = template
    .solution_steps_template
    .iter()
    .map(|step| interpolate::render(step, &render_scope, decimals))
    .collect();

  let opts = match template.question_type {
    QuestionType::MultipleChoice => {
      options::build_options(&template.options, answer, decimals, rng)
    }
    QuestionType::TrueFalse => vec!["True".to_string(), "False".to_string()],
    _ => Vec::new(),
  };

  GeneratedProblem {
    id: mint_problem_id(),
    question_text,
    question_type: template.question_type,
    options: opts,
    correct_answer,
    solution_steps,
    explanation: template.explanation.clone(),
    tolerance: template.answer_format.tolerance,
    difficulty: template.difficulty,
    category: template.category.clone(),
    subcategory: template.subcategory.clone(),
    tags: template.tags.clone(),
  }
}

/// Generate from a resolved reference, given a template lookup closure.
///
/// The lookup returns `None` for an unknown id; inactive templates are
/// refused here so no caller can generate from a soft-deleted row.
pub fn generate_by_ref<F>(
  generator_ref: &GeneratorRef,
  lookup: F,
  rng: &mut impl Rng,
) -> Result<GeneratedProblem, GenerationError>
where
  F: Fn(&str) -> Option<ProblemTemplate>,
{
  match generator_ref {
    GeneratorRef::Hardcoded(id) => catalog::generate_default(id),
    GeneratorRef::Template(id) => {
      let template =
        lookup(id).ok_or_else(|| GenerationError::UnknownGenerator(format!("tmpl:{}", id)))?;
      if !template.is_active {
        return Err(GenerationError::TemplateInactive(id.clone()));
      }
      generate_from_template(&template, rng)
    }
  }
}
