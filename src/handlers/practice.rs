//! Practice session handlers.
//!
//! The external contract is action-dispatched: `GET /api/practice?action=...`
//! for generate/history, `POST /api/practice` with an `action` field for
//! check_answer/submit_session/see_solution. The stringly `tmpl:` prefixed
//! type ids are parsed into typed `GeneratorRef`s at this boundary and the
//! POST body deserializes straight into a tagged command enum.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use serde_json::json;

use crate::db::{self, DbPool, LogOnError, SqliteSessions, SqliteTemplates};
use crate::domain::{GenerateEntry, QuestionType, SubmittedAnswer};
use crate::engine::practice::{self, PracticeError};
use crate::engine::{GenerationError, check};

use super::{db_unavailable, json_error};

#[derive(Debug, Deserialize)]
pub struct PracticeQuery {
  pub action: String,
  /// JSON-encoded array of `{typeId, count}` entries
  pub config: Option<String>,
  pub randomize: Option<bool>,
  /// Owning user, resolved by the auth layer in front of this service
  pub user: Option<String>,
}

/// The POST side of the practice contract, tagged by `action`.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PracticeCommand {
  CheckAnswer {
    problem_id: String,
    user_answer: String,
    correct_answer: String,
    question_type: QuestionType,
    #[serde(default)]
    tolerance: Option<f64>,
  },
  SubmitSession {
    session_id: String,
    answers: Vec<SubmittedAnswer>,
    #[serde(default)]
    time_spent_seconds: u64,
  },
  SeeSolution {
    session_id: String,
    problem_id: String,
  },
}

pub async fn practice_query(
  State(pool): State<DbPool>,
  Query(query): Query<PracticeQuery>,
) -> Response {
  let conn = match db::try_lock(&pool) {
    Ok(conn) => conn,
    Err(_) => return db_unavailable(),
  };

  match query.action.as_str() {
    "generate" => {
      let Some(config_json) = query.config.as_deref() else {
        return json_error(StatusCode::BAD_REQUEST, "Missing config parameter");
      };
      let entries: Vec<GenerateEntry> = match serde_json::from_str(config_json) {
        Ok(entries) => entries,
        Err(e) => {
          return json_error(StatusCode::BAD_REQUEST, format!("Bad config: {}", e));
        }
      };

      let store = SqliteSessions { conn: &conn };
      let templates = SqliteTemplates { conn: &conn };
      match practice::generate_session(
        &store,
        &templates,
        &entries,
        query.randomize.unwrap_or(false),
        query.user.clone(),
      ) {
        Ok(batch) => Json(json!({
          "session_id": batch.session_id,
          "problems": batch.problems,
          "total": batch.total,
        }))
        .into_response(),
        Err(e) => practice_error_response(e),
      }
    }
    "history" => {
      let store = SqliteSessions { conn: &conn };
      match practice::history(&store) {
        Ok(sessions) => Json(json!({ "sessions": sessions })).into_response(),
        Err(e) => practice_error_response(e),
      }
    }
    other => json_error(StatusCode::BAD_REQUEST, format!("Unknown action: {}", other)),
  }
}

pub async fn practice_command(
  State(pool): State<DbPool>,
  Json(command): Json<PracticeCommand>,
) -> Response {
  let conn = match db::try_lock(&pool) {
    Ok(conn) => conn,
    Err(_) => return db_unavailable(),
  };

  match command {
    PracticeCommand::CheckAnswer {
      problem_id,
      user_answer,
      correct_answer,
      question_type,
      tolerance,
    } => {
      // Stateless spot-check for instant-feedback UI; the caller supplies
      // its own answer key here by design
      let result = check::check_answer(
        &problem_id,
        question_type,
        &user_answer,
        &correct_answer,
        tolerance.unwrap_or(0.01),
      );
      Json(result).into_response()
    }

    PracticeCommand::SubmitSession { session_id, answers, time_spent_seconds } => {
      let store = SqliteSessions { conn: &conn };
      match practice::submit_session(&store, &session_id, &answers, time_spent_seconds) {
        Ok(outcome) => {
          // The audit log is diagnostic only; a failed insert must not fail
          // the submit
          if outcome.authoritative {
            for result in &outcome.results {
              db::insert_answer_log(&conn, &session_id, result)
                .log_warn("Failed to insert answer log");
            }
          }
          Json(json!({
            "results": outcome.results,
            "summary": outcome.summary,
            "authoritative": outcome.authoritative,
          }))
          .into_response()
        }
        Err(e) => practice_error_response(e),
      }
    }

    PracticeCommand::SeeSolution { session_id, problem_id } => {
      let store = SqliteSessions { conn: &conn };
      match practice::see_solution(&store, &session_id, &problem_id) {
        Ok(view) => Json(json!({
          "correct_answer": view.correct_answer,
          "solution_steps": view.solution_steps,
          "explanation": view.explanation,
          "gave_up": true,
        }))
        .into_response(),
        Err(e) => practice_error_response(e),
      }
    }
  }
}

fn practice_error_response(error: PracticeError) -> Response {
  match &error {
    PracticeError::EmptyConfig => json_error(StatusCode::BAD_REQUEST, error.to_string()),
    PracticeError::SessionNotFound(_) | PracticeError::ProblemNotFound { .. } => {
      json_error(StatusCode::NOT_FOUND, error.to_string())
    }
    PracticeError::Generation(GenerationError::UnknownGenerator(_)) => {
      json_error(StatusCode::NOT_FOUND, error.to_string())
    }
    PracticeError::Generation(_) => {
      json_error(StatusCode::UNPROCESSABLE_ENTITY, error.to_string())
    }
    PracticeError::Store(e) => {
      tracing::error!("Row store failure: {}", e);
      json_error(StatusCode::INTERNAL_SERVER_ERROR, "Storage failure")
    }
  }
}
