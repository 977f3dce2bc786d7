pub mod problem;
pub mod session;
pub mod template;

pub use problem::{CheckResult, ClientProblem, GeneratedProblem};
pub use session::{
  GenerateEntry, PracticeSession, SessionStatus, SessionSummary, SubmitSummary, SubmittedAnswer,
};
pub use template::{
  AnswerFormat, ChoiceValue, ComputedVar, Difficulty, GeneratorRef, OptionsSpec, ParamKind,
  Parameter, ProblemTemplate, QuestionType, TemplateDraft, Value,
};

use rand::Rng;

/// Mint a random lowercase alphanumeric id of the given length.
///
/// Used for session ids, template ids, and problem ids. Collision odds at
/// 32 chars over base 36 are negligible for this service's write volume.
pub fn mint_id(len: usize) -> String {
  let mut rng = rand::rng();
  (0..len)
    .map(|_| {
      let idx = rng.random_range(0..36u8);
      if idx < 10 {
        (b'0' + idx) as char
      } else {
        (b'a' + idx - 10) as char
      }
    })
    .collect()
}
