//! HTTP endpoint handlers. These are thin wrappers that forward to core
//! logic. Each handler is instrumented and logs parameters and basic result
//! info.

use std::sync::Arc;

use axum::{
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
  Json,
};
use tracing::{info, instrument};

use crate::domain::{ModuleKind, Plan};
use crate::logic::{self, SaveOutcome};
use crate::protocol::*;
use crate::state::AppState;

fn not_found(what: &str) -> (StatusCode, Json<ErrorOut>) {
  (StatusCode::NOT_FOUND, Json(ErrorOut { message: format!("unknown {}", what) }))
}

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse {
  Json(HealthOut { ok: true })
}

#[instrument(level = "info", skip(state))]
pub async fn http_start(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let record = state.create_experience().await;
  info!(target: "experience", id = %record.id, "HTTP start: experience created");
  Json(StartOut { game_id: record.id, game_data: record.game_data })
}

#[instrument(level = "info", skip(state), fields(%game_id))]
pub async fn http_creator(
  State(state): State<Arc<AppState>>,
  Path(game_id): Path<String>,
) -> impl IntoResponse {
  match state.get_record(&game_id).await {
    Some(record) => Json(CreatorOut {
      game_id: record.id,
      game_data: record.game_data,
      rev: record.rev,
    })
    .into_response(),
    None => not_found("game").into_response(),
  }
}

#[instrument(level = "info", skip(state, body), fields(game_id = %body.game_id))]
pub async fn http_chat(
  State(state): State<Arc<AppState>>,
  Json(body): Json<ChatIn>,
) -> impl IntoResponse {
  match logic::chat_turn(&state, body).await {
    Some(out) => Json(out).into_response(),
    None => not_found("game").into_response(),
  }
}

#[instrument(level = "info", skip(state, body), fields(game_id = %body.game_id))]
pub async fn http_save_experience(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SaveIn>,
) -> impl IntoResponse {
  let game_id = body.game_id.clone();
  match logic::save_experience(&state, body).await {
    SaveOutcome::Saved { rev } => {
      info!(target: "experience", id = %game_id, rev, "HTTP save applied");
      Json(SaveOut { success: true, game_id, rev }).into_response()
    }
    SaveOutcome::UnknownGame => not_found("game").into_response(),
    SaveOutcome::InvalidDocument(message) => {
      (StatusCode::UNPROCESSABLE_ENTITY, Json(ErrorOut { message })).into_response()
    }
  }
}

#[instrument(level = "info", skip(state), fields(%game_id))]
pub async fn http_player(
  State(state): State<Arc<AppState>>,
  Path(game_id): Path<String>,
) -> impl IntoResponse {
  match logic::player_payload(&state, &game_id).await {
    Some(payload) => {
      info!(target: "experience", id = %game_id, is_demo = payload.is_demo, "HTTP player payload served");
      Json(payload).into_response()
    }
    None => not_found("game").into_response(),
  }
}

/// Simulated payment activation; a real gateway would confirm out of band.
#[instrument(level = "info", skip(state), fields(%game_id))]
pub async fn http_pay(
  State(state): State<Arc<AppState>>,
  Path(game_id): Path<String>,
) -> impl IntoResponse {
  if state.mark_paid(&game_id).await {
    Json(PayOut { success: true, play_route: logic::play_route(&game_id) }).into_response()
  } else {
    not_found("game").into_response()
  }
}

#[instrument(level = "info", skip(state))]
pub async fn http_templates(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(TemplatesOut { templates: state.template_names() })
}

#[instrument(level = "info", skip(state), fields(%name))]
pub async fn http_template(
  State(state): State<Arc<AppState>>,
  Path(name): Path<String>,
) -> impl IntoResponse {
  match state.template(&name) {
    Some(doc) => Json(doc.clone()).into_response(),
    None => not_found("template").into_response(),
  }
}

#[instrument(level = "info", skip(_state))]
pub async fn http_modules(
  State(_state): State<Arc<AppState>>,
  Query(q): Query<ModulesQuery>,
) -> impl IntoResponse {
  let plan = q.plan.unwrap_or(Plan::Quiz);
  let modules: Vec<ModuleInfo> = ModuleKind::all()
    .iter()
    .map(|&m| ModuleInfo {
      id: m,
      name: m.display_name(),
      icon: m.icon(),
      plan: m.required_plan(),
      locked: plan < m.required_plan(),
    })
    .collect();
  Json(modules)
}
