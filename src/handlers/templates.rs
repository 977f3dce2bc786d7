//! Template management handlers: list, inspect, author, validate, preview,
//! and publish into the durable question bank.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::db::{self, DbPool, PublishMode, PublishedQuestion};
use crate::domain::{GeneratorRef, ProblemTemplate, TemplateDraft, mint_id};
use crate::config;
use crate::engine::generate;
use crate::engine::validate::validate_template;

use super::{db_unavailable, json_error};

pub async fn templates_index(State(pool): State<DbPool>) -> Response {
  let conn = match db::try_lock(&pool) {
    Ok(conn) => conn,
    Err(_) => return db_unavailable(),
  };

  match db::list_active_templates(&conn) {
    Ok(templates) => Json(json!({ "templates": templates })).into_response(),
    Err(e) => {
      tracing::error!("Failed to list templates: {}", e);
      json_error(StatusCode::INTERNAL_SERVER_ERROR, "Storage failure")
    }
  }
}

pub async fn template_show(State(pool): State<DbPool>, Path(id): Path<String>) -> Response {
  let conn = match db::try_lock(&pool) {
    Ok(conn) => conn,
    Err(_) => return db_unavailable(),
  };

  match db::get_template(&conn, &id) {
    Ok(Some(template)) => Json(template).into_response(),
    Ok(None) => json_error(StatusCode::NOT_FOUND, format!("Template {} not found", id)),
    Err(e) => {
      tracing::error!("Failed to load template {}: {}", id, e);
      json_error(StatusCode::INTERNAL_SERVER_ERROR, "Storage failure")
    }
  }
}

/// Create a template. The validator gates activation: blocking errors
/// reject the draft outright.
pub async fn template_create(
  State(pool): State<DbPool>,
  Json(draft): Json<TemplateDraft>,
) -> Response {
  let conn = match db::try_lock(&pool) {
    Ok(conn) => conn,
    Err(_) => return db_unavailable(),
  };

  let template = ProblemTemplate::from_draft(mint_id(config::ID_LENGTH), draft);
  let report = validate_template(&template);
  if !report.is_valid() {
    return (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "validation": report })))
      .into_response();
  }

  match db::insert_template(&conn, &template) {
    Ok(()) => (
      StatusCode::CREATED,
      Json(json!({ "template": template, "warnings": report.warnings })),
    )
      .into_response(),
    Err(e) => {
      tracing::error!("Failed to insert template: {}", e);
      json_error(StatusCode::INTERNAL_SERVER_ERROR, "Storage failure")
    }
  }
}

/// Update a template from a full draft. Only the draft's whitelisted field
/// set can change; identity, activation, and audit columns are server-owned.
pub async fn template_update(
  State(pool): State<DbPool>,
  Path(id): Path<String>,
  Json(draft): Json<TemplateDraft>,
) -> Response {
  let conn = match db::try_lock(&pool) {
    Ok(conn) => conn,
    Err(_) => return db_unavailable(),
  };

  let mut template = match db::get_template(&conn, &id) {
    Ok(Some(template)) => template,
    Ok(None) => return json_error(StatusCode::NOT_FOUND, format!("Template {} not found", id)),
    Err(e) => {
      tracing::error!("Failed to load template {}: {}", id, e);
      return json_error(StatusCode::INTERNAL_SERVER_ERROR, "Storage failure");
    }
  };

  template.apply_draft(draft);
  let report = validate_template(&template);
  if !report.is_valid() {
    return (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "validation": report })))
      .into_response();
  }

  match db::update_template(&conn, &template) {
    Ok(true) => Json(json!({ "template": template, "warnings": report.warnings })).into_response(),
    Ok(false) => json_error(StatusCode::NOT_FOUND, format!("Template {} not found", id)),
    Err(e) => {
      tracing::error!("Failed to update template {}: {}", id, e);
      json_error(StatusCode::INTERNAL_SERVER_ERROR, "Storage failure")
    }
  }
}

pub async fn template_delete(State(pool): State<DbPool>, Path(id): Path<String>) -> Response {
  let conn = match db::try_lock(&pool) {
    Ok(conn) => conn,
    Err(_) => return db_unavailable(),
  };

  match db::soft_delete_template(&conn, &id) {
    Ok(true) => Json(json!({ "deleted": true, "id": id })).into_response(),
    Ok(false) => json_error(StatusCode::NOT_FOUND, format!("Template {} not found", id)),
    Err(e) => {
      tracing::error!("Failed to delete template {}: {}", id, e);
      json_error(StatusCode::INTERNAL_SERVER_ERROR, "Storage failure")
    }
  }
}

pub async fn template_validate(State(pool): State<DbPool>, Path(id): Path<String>) -> Response {
  let conn = match db::try_lock(&pool) {
    Ok(conn) => conn,
    Err(_) => return db_unavailable(),
  };

  match db::get_template(&conn, &id) {
    Ok(Some(template)) => Json(validate_template(&template)).into_response(),
    Ok(None) => json_error(StatusCode::NOT_FOUND, format!("Template {} not found", id)),
    Err(e) => {
      tracing::error!("Failed to load template {}: {}", id, e);
      json_error(StatusCode::INTERNAL_SERVER_ERROR, "Storage failure")
    }
  }
}

/// One sample problem (answer included - this is an admin surface) plus
/// validator warnings. Persists nothing.
pub async fn template_preview(State(pool): State<DbPool>, Path(id): Path<String>) -> Response {
  let conn = match db::try_lock(&pool) {
    Ok(conn) => conn,
    Err(_) => return db_unavailable(),
  };

  let template = match db::get_template(&conn, &id) {
    Ok(Some(template)) => template,
    Ok(None) => return json_error(StatusCode::NOT_FOUND, format!("Template {} not found", id)),
    Err(e) => {
      tracing::error!("Failed to load template {}: {}", id, e);
      return json_error(StatusCode::INTERNAL_SERVER_ERROR, "Storage failure");
    }
  };

  let report = validate_template(&template);
  if !report.is_valid() {
    return (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "validation": report })))
      .into_response();
  }

  let mut rng = rand::rng();
  match generate::generate_from_template(&template, &mut rng) {
    Ok(problem) => {
      Json(json!({ "problem": problem, "warnings": report.warnings })).into_response()
    }
    Err(e) => json_error(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
  }
}

#[derive(Debug, Deserialize)]
pub struct PublishRequest {
  pub count: usize,
  pub mode: PublishMode,
}

/// Publish N generated problems into the durable question bank.
///
/// Row failures abort the call at the failing item and report its index;
/// earlier rows stay committed - there is no batch rollback.
pub async fn template_publish(
  State(pool): State<DbPool>,
  Path(id): Path<String>,
  Json(request): Json<PublishRequest>,
) -> Response {
  let conn = match db::try_lock(&pool) {
    Ok(conn) => conn,
    Err(_) => return db_unavailable(),
  };

  let template = match db::get_template(&conn, &id) {
    Ok(Some(template)) if template.is_active => template,
    Ok(Some(_)) => {
      return json_error(StatusCode::UNPROCESSABLE_ENTITY, format!("Template {} is inactive", id));
    }
    Ok(None) => return json_error(StatusCode::NOT_FOUND, format!("Template {} not found", id)),
    Err(e) => {
      tracing::error!("Failed to load template {}: {}", id, e);
      return json_error(StatusCode::INTERNAL_SERVER_ERROR, "Storage failure");
    }
  };

  let count = request.count.clamp(1, config::MAX_PROBLEMS_PER_REQUEST);
  let source = GeneratorRef::Template(template.id.clone()).external_id();
  let mut rng = rand::rng();
  let mut published: Vec<String> = Vec::with_capacity(count);

  for index in 0..count {
    let question = match request.mode {
      PublishMode::Dynamic => None,
      PublishMode::Baked => match generate::generate_from_template(&template, &mut rng) {
        Ok(problem) => Some(problem),
        Err(e) => {
          return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
              "published": published,
              "failed_index": index,
              "error": e.to_string(),
            })),
          )
            .into_response();
        }
      },
    };

    let row = PublishedQuestion {
      id: mint_id(config::ID_LENGTH),
      source: source.clone(),
      mode: request.mode,
      question,
      created_at: Utc::now(),
    };

    if let Err(e) = db::insert_published_question(&conn, &row) {
      tracing::error!("Publish insert failed at index {}: {}", index, e);
      return (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
          "published": published,
          "failed_index": index,
          "error": "Storage failure",
        })),
      )
        .into_response();
    }
    published.push(row.id);
  }

  (StatusCode::CREATED, Json(json!({ "published": published, "total": published.len() })))
    .into_response()
}

#[derive(Debug, Deserialize)]
pub struct QuestionsQuery {
  /// Resolve dynamic rows into concrete problems on read
  #[serde(default)]
  pub resolve: bool,
}

/// The published question bank. Dynamic rows re-generate on read when
/// `resolve=true`; otherwise they list as bare references.
pub async fn questions_index(
  State(pool): State<DbPool>,
  Query(query): Query<QuestionsQuery>,
) -> Response {
  let conn = match db::try_lock(&pool) {
    Ok(conn) => conn,
    Err(_) => return db_unavailable(),
  };

  let rows = match db::list_published_questions(&conn) {
    Ok(rows) => rows,
    Err(e) => {
      tracing::error!("Failed to list questions: {}", e);
      return json_error(StatusCode::INTERNAL_SERVER_ERROR, "Storage failure");
    }
  };

  if !query.resolve {
    return Json(json!({ "questions": rows })).into_response();
  }

  let mut rng = rand::rng();
  let resolved: Vec<serde_json::Value> = rows
    .into_iter()
    .map(|mut row| {
      if row.mode == PublishMode::Dynamic && row.question.is_none() {
        let generator_ref = GeneratorRef::parse(&row.source);
        row.question = generate::generate_by_ref(
          &generator_ref,
          |tid| db::get_template(&conn, tid).ok().flatten(),
          &mut rng,
        )
        .map_err(|e| tracing::warn!("Dynamic question {} failed to generate: {}", row.id, e))
        .ok();
      }
      json!(row)
    })
    .collect();

  Json(json!({ "questions": resolved })).into_response()
}
