//! JSON request handlers and the application router.

pub mod browse;
pub mod practice;
pub mod templates;

use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::extract::State;
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::catalog;
use crate::db::{self, DbPool};

pub use browse::generator_catalog;
pub use practice::{practice_command, practice_query};
pub use templates::{
  questions_index, template_create, template_delete, template_preview, template_publish,
  template_show, template_update, template_validate, templates_index,
};

/// Build the application router over a database pool.
pub fn build_router(pool: DbPool) -> Router {
  Router::new()
    .route("/", get(index))
    .route("/api/templates", get(templates_index).post(template_create))
    .route(
      "/api/templates/{id}",
      get(template_show).put(template_update).delete(template_delete),
    )
    .route("/api/templates/{id}/validate", get(template_validate))
    .route("/api/templates/{id}/preview", get(template_preview))
    .route("/api/templates/{id}/publish", post(template_publish))
    .route("/api/generators", get(generator_catalog))
    .route("/api/questions", get(questions_index))
    .route("/api/practice", get(practice_query).post(practice_command))
    .layer(TraceLayer::new_for_http())
    .with_state(pool)
}

/// Uniform JSON error body.
pub(crate) fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
  (status, Json(json!({ "error": message.into() }))).into_response()
}

pub(crate) fn db_unavailable() -> Response {
  json_error(StatusCode::SERVICE_UNAVAILABLE, "Database unavailable")
}

/// Service stats: the operational landing endpoint.
pub async fn index(State(pool): State<DbPool>) -> Response {
  let conn = match db::try_lock(&pool) {
    Ok(conn) => conn,
    Err(_) => return db_unavailable(),
  };

  let active_templates = db::count_active_templates(&conn).unwrap_or(0);
  let completed_sessions = db::count_completed_sessions(&conn).unwrap_or(0);

  Json(json!({
    "service": "practice_forge",
    "active_templates": active_templates,
    "hardcoded_generators": catalog::all().len(),
    "completed_sessions": completed_sessions,
  }))
  .into_response()
}
