//! Static template validation.
//!
//! A template must pass validation before it may generate: every text token
//! resolves to a declared name, formulas parse and respect the strict
//! left-to-right dependency order of computed vars, and the tolerance is
//! positive. Blocking errors reject the template; warnings (unused
//! parameters, a multiple-choice template with no options strategy) are
//! reported but do not block.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::catalog;
use crate::domain::{OptionsSpec, ParamKind, ProblemTemplate, QuestionType};
use crate::engine::{eval, interpolate};

/// Outcome of validating one template.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationReport {
  pub errors: Vec<String>,
  pub warnings: Vec<String>,
}

impl ValidationReport {
  pub fn is_valid(&self) -> bool {
    self.errors.is_empty()
  }

  fn error(&mut self, msg: String) {
    self.errors.push(msg);
  }

  fn warn(&mut self, msg: String) {
    self.warnings.push(msg);
  }
}

/// Validate a template. Never panics; every defect becomes a report entry.
pub fn validate_template(template: &ProblemTemplate) -> ValidationReport {
  let mut report = ValidationReport::default();

  let mut declared: BTreeSet<String> = BTreeSet::new();
  let mut referenced: BTreeSet<String> = BTreeSet::new();

  // --- Parameters: unique names, sane ranges, constraints over earlier names ---
  for (idx, param) in template.parameters.iter().enumerate() {
    if !declared.insert(param.name.clone()) {
      report.error(format!("Duplicate parameter name '{}'", param.name));
    }

    match &param.kind {
      ParamKind::Integer { min, max, .. } => {
        if min > max {
          report.error(format!("Parameter '{}' has min > max", param.name));
        }
      }
      ParamKind::Float { min, max, .. } => {
        if min > max || !min.is_finite() || !max.is_finite() {
          report.error(format!("Parameter '{}' has an invalid range", param.name));
        }
      }
      ParamKind::Choice { options } => {
        if options.is_empty() {
          report.error(format!("Parameter '{}' has an empty choice set", param.name));
        }
      }
    }

    if let Some(predicate) = &param.constraint {
      match eval::parse(predicate) {
        Ok(expr) => {
          // A constraint may reference this parameter and any earlier one
          let visible: BTreeSet<String> = template.parameters[..=idx]
            .iter()
            .map(|p| p.name.clone())
            .collect();
          for name in eval::referenced_names(&expr) {
            if !visible.contains(&name) {
              report.error(format!(
                "Constraint on '{}' references '{}', which is not an earlier parameter",
                param.name, name
              ));
            } else {
              referenced.insert(name);
            }
          }
        }
        Err(e) => {
          report.error(format!("Constraint on '{}' does not parse: {}", param.name, e));
        }
      }
    }
  }

  // --- Computed vars: strict left-to-right chain, no forward references ---
  for var in &template.computed_vars {
    match eval::parse(&var.formula) {
      Ok(expr) => {
        for name in eval::referenced_names(&expr) {
          if name == var.name {
            report.error(format!("Computed var '{}' references itself", var.name));
          } else if !declared.contains(&name) {
            report.error(format!(
              "Computed var '{}' references '{}' before it is declared",
              var.name, name
            ));
          } else {
            referenced.insert(name);
          }
        }
      }
      Err(e) => {
        report.error(format!("Computed var '{}' does not parse: {}", var.name, e));
      }
    }
    if !declared.insert(var.name.clone()) {
      report.error(format!("Computed var '{}' shadows an earlier name", var.name));
    }
  }

  // --- Answer source: a formula or a generator link, and the formula parses ---
  match (&template.answer_formula, &template.generator_id) {
    (None, None) => {
      report.error("Template declares neither an answer formula nor a generator link".to_string());
    }
    (Some(formula), _) => match eval::parse(formula) {
      Ok(expr) => {
        for name in eval::referenced_names(&expr) {
          if !declared.contains(&name) {
            report.error(format!("Answer formula references undeclared name '{}'", name));
          } else {
            referenced.insert(name);
          }
        }
      }
      Err(e) => {
        report.error(format!("Answer formula does not parse: {}", e));
      }
    },
    (None, Some(_)) => {}
  }

  if let Some(generator_id) = &template.generator_id {
    if catalog::find(generator_id).is_none() {
      report.error(format!("Linked generator '{}' is not in the catalog", generator_id));
    }
  }

  // --- Text tokens: every {token} must be a declared name ---
  check_tokens(&template.question_template, "question_template", &declared, &mut referenced, &mut report);
  for (i, step) in template.solution_steps_template.iter().enumerate() {
    check_tokens(step, &format!("solution step {}", i + 1), &declared, &mut referenced, &mut report);
  }

  // --- Answer format ---
  if !(template.answer_format.tolerance > 0.0) {
    report.error("answer_format.tolerance must be > 0".to_string());
  }

  // --- Non-blocking warnings ---
  for param in &template.parameters {
    if !referenced.contains(&param.name) {
      report.warn(format!("Parameter '{}' is never used", param.name));
    }
  }
  if template.question_type == QuestionType::MultipleChoice
    && template.options == OptionsSpec::None
    && template.generator_id.is_none()
  {
    report.warn("Multiple-choice template has no options generator configured".to_string());
  }

  report
}

fn check_tokens(
  text: &str,
  where_: &str,
  declared: &BTreeSet<String>,
  referenced: &mut BTreeSet<String>,
  report: &mut ValidationReport,
) {
  for token in interpolate::collect_tokens(text) {
    if declared.contains(&token.name) {
      referenced.insert(token.name);
    } else {
      report.error(format!("Token '{{{}}}' in {} is not a declared name", token.name, where_));
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{
    AnswerFormat, ComputedVar, Difficulty, Parameter, ProblemTemplate, TemplateDraft,
  };

  fn base_draft() -> TemplateDraft {
    TemplateDraft {
      name: "Triangle area".to_string(),
      category: "geometry".to_string(),
      subcategory: Some("triangles".to_string()),
      difficulty: Difficulty::Easy,
      tags: vec![],
      question_type: QuestionType::NumericInput,
      parameters: vec![
        Parameter {
          name: "base".to_string(),
          kind: ParamKind::Integer { min: 2, max: 20, step: None },
          constraint: None,
        },
        Parameter {
          name: "height".to_string(),
          kind: ParamKind::Integer { min: 2, max: 20, step: None },
          constraint: None,
        },
      ],
      computed_vars: vec![ComputedVar {
        name: "area".to_string(),
        formula: "0.5 * base * height".to_string(),
      }],
      answer_formula: Some("area".to_string()),
      answer_format: AnswerFormat { decimals: 2, tolerance: 0.01 },
      question_template: "A triangle has base {base} and height {height}. What is its area?"
        .to_string(),
      solution_steps_template: vec![
        "Area = 1/2 * base * height".to_string(),
        "Area = 0.5 * {base} * {height} = {area}".to_string(),
      ],
      explanation: None,
      options: OptionsSpec::None,
      generator_id: None,
    }
  }

  fn template(draft: TemplateDraft) -> ProblemTemplate {
    ProblemTemplate::from_draft("t1".to_string(), draft)
  }

  #[test]
  fn test_valid_template_passes() {
    let report = validate_template(&template(base_draft()));
    assert!(report.is_valid(), "unexpected errors: {:?}", report.errors);
    assert!(report.warnings.is_empty(), "unexpected warnings: {:?}", report.warnings);
  }

  #[test]
  fn test_undeclared_token_is_blocking() {
    let mut draft = base_draft();
    draft.question_template = "What is {bogus}?".to_string();
    let report = validate_template(&template(draft));
    assert!(!report.is_valid());
    assert!(report.errors.iter().any(|e| e.contains("bogus")));
  }

  #[test]
  fn test_undeclared_token_in_solution_step_is_blocking() {
    let mut draft = base_draft();
    draft.solution_steps_template.push("Therefore {phantom}".to_string());
    let report = validate_template(&template(draft));
    assert!(report.errors.iter().any(|e| e.contains("phantom")));
  }

  #[test]
  fn test_forward_reference_in_computed_var_is_blocking() {
    let mut draft = base_draft();
    draft.computed_vars = vec![
      ComputedVar { name: "a".to_string(), formula: "b + 1".to_string() },
      ComputedVar { name: "b".to_string(), formula: "base * 2".to_string() },
    ];
    draft.answer_formula = Some("a + b".to_string());
    draft.question_template = "Base {base}, height {height}?".to_string();
    draft.solution_steps_template = vec![];
    let report = validate_template(&template(draft));
    assert!(report.errors.iter().any(|e| e.contains("'a' references 'b'")));
  }

  #[test]
  fn test_self_reference_is_blocking() {
    let mut draft = base_draft();
    draft.computed_vars = vec![ComputedVar {
      name: "loop_var".to_string(),
      formula: "loop_var + 1".to_string(),
    }];
    draft.answer_formula = Some("loop_var".to_string());
    draft.solution_steps_template = vec![];
    let report = validate_template(&template(draft));
    assert!(report.errors.iter().any(|e| e.contains("references itself")));
  }

  #[test]
  fn test_malformed_answer_formula_is_blocking() {
    let mut draft = base_draft();
    draft.answer_formula = Some("0.5 * base *".to_string());
    let report = validate_template(&template(draft));
    assert!(report.errors.iter().any(|e| e.contains("Answer formula does not parse")));
  }

  #[test]
  fn test_non_positive_tolerance_is_blocking() {
    let mut draft = base_draft();
    draft.answer_format.tolerance = 0.0;
    let report = validate_template(&template(draft));
    assert!(report.errors.iter().any(|e| e.contains("tolerance")));

    let mut draft = base_draft();
    draft.answer_format.tolerance = -1.0;
    let report = validate_template(&template(draft));
    assert!(!report.is_valid());
  }

  #[test]
  fn test_missing_answer_source_is_blocking() {
    let mut draft = base_draft();
    draft.answer_formula = None;
    let report = validate_template(&template(draft));
    assert!(report.errors.iter().any(|e| e.contains("neither an answer formula")));
  }

  #[test]
  fn test_unknown_generator_link_is_blocking() {
    let mut draft = base_draft();
    draft.generator_id = Some("no-such-generator".to_string());
    let report = validate_template(&template(draft));
    assert!(report.errors.iter().any(|e| e.contains("not in the catalog")));
  }

  #[test]
  fn test_unused_parameter_is_a_warning() {
    let mut draft = base_draft();
    draft.parameters.push(Parameter {
      name: "spare".to_string(),
      kind: ParamKind::Integer { min: 1, max: 5, step: None },
      constraint: None,
    });
    let report = validate_template(&template(draft));
    assert!(report.is_valid());
    assert!(report.warnings.iter().any(|w| w.contains("spare")));
  }

  #[test]
  fn test_multiple_choice_without_options_is_a_warning() {
    let mut draft = base_draft();
    draft.question_type = QuestionType::MultipleChoice;
    let report = validate_template(&template(draft));
    assert!(report.is_valid());
    assert!(report.warnings.iter().any(|w| w.contains("options generator")));
  }

  #[test]
  fn test_constraint_may_only_see_earlier_parameters() {
    let mut draft = base_draft();
    draft.parameters[0].constraint = Some("base < height".to_string());
    let report = validate_template(&template(draft));
    assert!(report.errors.iter().any(|e| e.contains("'base' references 'height'")));
  }

  #[test]
  fn test_duplicate_parameter_name_is_blocking() {
    let mut draft = base_draft();
    let dup = draft.parameters[0].clone();
    draft.parameters.push(dup);
    let report = validate_template(&template(draft));
    assert!(report.errors.iter().any(|e| e.contains("Duplicate parameter")));
  }
}
