//! The combined category browser: hardcoded generators merged with active
//! template summaries, each entry carrying the external id the practice
//! generate config accepts.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

use crate::catalog;
use crate::db::{self, DbPool};

use super::{db_unavailable, json_error};

pub async fn generator_catalog(State(pool): State<DbPool>) -> Response {
  let conn = match db::try_lock(&pool) {
    Ok(conn) => conn,
    Err(_) => return db_unavailable(),
  };

  let templates = match db::list_active_templates(&conn) {
    Ok(templates) => templates,
    Err(e) => {
      tracing::error!("Failed to list templates for catalog: {}", e);
      return json_error(StatusCode::INTERNAL_SERVER_ERROR, "Storage failure");
    }
  };

  let mut entries: Vec<serde_json::Value> = catalog::all()
    .iter()
    .map(|entry| {
      let info = catalog::GeneratorInfo::from(entry);
      json!({
        "id": info.id,
        "kind": "generator",
        "name": info.name,
        "description": info.description,
        "category": info.category,
        "module": info.module,
        "difficulties": info.difficulties,
      })
    })
    .collect();

  for template in &templates {
    entries.push(json!({
      // Prefixed so the id feeds straight back into a generate config
      "id": format!("tmpl:{}", template.id),
      "kind": "template",
      "name": template.name,
      "category": template.category,
      "subcategory": template.subcategory,
      "difficulty": template.difficulty,
      "question_type": template.question_type,
      "tags": template.tags,
    }));
  }

  entries.sort_by(|a, b| {
    let left = (a["category"].as_str().unwrap_or(""), a["name"].as_str().unwrap_or(""));
    let right = (b["category"].as_str().unwrap_or(""), b["name"].as_str().unwrap_or(""));
    left.cmp(&right)
  });

  Json(json!({ "entries": entries, "total": entries.len() })).into_response()
}
