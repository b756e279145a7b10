//! Core behaviors shared by HTTP and WebSocket handlers:
//!   - the creator chat turn (LLM call, reply parsing, document persistence)
//!   - wholesale save / finalize
//!   - player payload assembly with the demo/paywall gate

use tracing::{error, info, instrument};

use crate::llm::ChatMessage;
use crate::player::{PlayerSession, RewardAccess};
use crate::protocol::{ChatIn, ChatOut, PlayerOut, SaveIn};
use crate::state::{AppState, ExperienceRecord};
use crate::util::trunc_for_log;

/// Narrative fallback when the assistant answered with a bare document.
const DOCUMENT_ONLY_REPLY: &str = "¡Listo! He actualizado tu experiencia.";

pub fn demo_route(id: &str) -> String {
  format!("/demo/{}", id)
}
pub fn play_route(id: &str) -> String {
  format!("/experience/{}", id)
}
pub fn pay_route(id: &str) -> String {
  format!("/pay/{}", id)
}

/// One creator chat turn. Returns None for an unknown game id.
///
/// A second turn for the same game while one is pending gets the busy
/// reply instead of a second LLM call (double-submit guard).
#[instrument(level = "info", skip(state, input),
             fields(game_id = %input.game_id, message_len = %input.message.len()))]
pub async fn chat_turn(state: &AppState, input: ChatIn) -> Option<ChatOut> {
  let record = state.get_record(&input.game_id).await?;

  if !state.begin_chat(&input.game_id).await {
    info!(target: "experience", id = %input.game_id, "Chat rejected: turn already in flight");
    return Some(ChatOut {
      reply: state.prompts.busy_reply.clone(),
      new_json: None,
      json_error: None,
    });
  }
  let out = run_chat_turn(state, &record, &input).await;
  state.end_chat(&input.game_id).await;
  Some(out)
}

async fn run_chat_turn(state: &AppState, record: &ExperienceRecord, input: &ChatIn) -> ChatOut {
  let llm = match &state.llm {
    Some(llm) => llm,
    None => {
      return ChatOut {
        reply: state.prompts.unavailable_reply.clone(),
        new_json: None,
        json_error: None,
      }
    }
  };

  // The client may send its in-memory document; otherwise the stored one
  // is the base the assistant modifies.
  let base = input.current_json.clone().unwrap_or_else(|| record.game_data.clone());
  let base_json = serde_json::to_string(&base).unwrap_or_else(|_| "{}".into());
  let product = input.product_type.as_deref().unwrap_or(crate::config::DEFAULT_PRODUCT);
  let system = state.prompts.system_for(product, &base_json);
  let history = state.history_for(&input.game_id).await;

  let reply_text = match llm.creator_turn(&system, &history, &input.message).await {
    Ok(text) => text,
    Err(e) => {
      error!(target: "experience", id = %input.game_id, error = %e, "LLM chat turn failed");
      return ChatOut {
        reply: state.prompts.error_reply.clone(),
        new_json: None,
        json_error: None,
      };
    }
  };

  let parsed = crate::llm::parse_reply(&reply_text);
  let mut json_error = parsed.document_error;
  let mut new_json = None;

  if let Some(mut doc) = parsed.document {
    // Full replacement, but a locally-chosen theme survives a response
    // that omits theming entirely.
    if doc.theme.is_none() && doc.visual_config.is_none() {
      doc.theme = base.theme.clone();
      doc.visual_config = base.visual_config.clone();
    }
    match doc.validate() {
      Ok(()) => {
        state.save_game_data(&input.game_id, doc.clone()).await;
        info!(target: "experience", id = %input.game_id, steps = doc.steps.len(),
              "Document regenerated via chat");
        new_json = Some(doc);
      }
      Err(e) => {
        error!(target: "experience", id = %input.game_id, error = %e,
               "Assistant document rejected by validation");
        json_error = Some(e.to_string());
      }
    }
  }

  let reply = if parsed.narrative.is_empty() && new_json.is_some() {
    DOCUMENT_ONLY_REPLY.to_string()
  } else {
    parsed.narrative
  };

  info!(target: "experience", id = %input.game_id, reply_preview = %trunc_for_log(&reply, 80),
        has_document = new_json.is_some(), "Chat turn complete");

  state
    .push_history(&input.game_id, ChatMessage::user(input.message.clone()), ChatMessage::assistant(reply.clone()))
    .await;

  ChatOut { reply, new_json, json_error }
}

/// Result of a save request.
#[derive(Debug)]
pub enum SaveOutcome {
  Saved { rev: u64 },
  UnknownGame,
  InvalidDocument(String),
}

/// Wholesale save: replace the document, and/or finalize with the gift.
#[instrument(level = "info", skip(state, input),
             fields(game_id = %input.game_id,
                    has_doc = input.game_data.is_some(),
                    finalizes = input.real_gift.is_some()))]
pub async fn save_experience(state: &AppState, input: SaveIn) -> SaveOutcome {
  let Some(record) = state.get_record(&input.game_id).await else {
    return SaveOutcome::UnknownGame;
  };
  let mut rev = record.rev;

  if let Some(doc) = input.game_data {
    if let Err(e) = doc.validate() {
      return SaveOutcome::InvalidDocument(e.to_string());
    }
    match state.save_game_data(&input.game_id, doc).await {
      Some(r) => rev = r,
      None => return SaveOutcome::UnknownGame,
    }
  }

  if let Some(gift) = input.real_gift {
    match state.finalize(&input.game_id, gift).await {
      Some(r) => rev = r,
      None => return SaveOutcome::UnknownGame,
    }
  }

  SaveOutcome::Saved { rev }
}

/// The reward the recipient is entitled to. Unpaid records always get the
/// demo access, which carries no gift text.
pub fn reward_access_for(record: &ExperienceRecord) -> RewardAccess {
  if record.is_paid {
    RewardAccess::Full { gift: record.real_gift.clone().unwrap_or_default() }
  } else {
    RewardAccess::Demo { pay_route: pay_route(&record.id) }
  }
}

/// Player bootstrap payload: resolved theme, step count, demo flag.
/// The gift text is never part of this payload.
#[instrument(level = "info", skip(state), fields(%id))]
pub async fn player_payload(state: &AppState, id: &str) -> Option<PlayerOut> {
  let record = state.get_record(id).await?;
  let is_demo = !record.is_paid;
  Some(PlayerOut {
    game_id: record.id.clone(),
    title: record.game_data.title.clone(),
    theme: crate::theme::resolve(&record.game_data),
    steps_total: record.game_data.steps.len(),
    is_demo,
    pay_route: is_demo.then(|| pay_route(&record.id)),
  })
}

/// Build a play session for one WebSocket connection. The outer None is an
/// unknown id; the inner Err a document that is not playable.
pub async fn play_session(
  state: &AppState,
  id: &str,
) -> Option<Result<PlayerSession, crate::domain::DocumentError>> {
  let record = state.get_record(id).await?;
  let access = reward_access_for(&record);
  Some(PlayerSession::new(record.game_data, access))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{Experience, Step};
  use crate::protocol::{ChatIn, SaveIn};

  fn playable_doc() -> Experience {
    Experience {
      title: Some("Reto".into()),
      theme: Some("theme-hacker".into()),
      steps: vec![
        Step::Intro { title: "Hi".into(), subtitle: "Go".into() },
        Step::Level {
          level_number: Some(1),
          level_title: "L1".into(),
          question: "2+2?".into(),
          answer: "4".into(),
          module: None,
        },
      ],
      ..Default::default()
    }
  }

  #[tokio::test]
  async fn chat_without_llm_degrades_to_friendly_reply() {
    let state = AppState::new();
    let record = state.create_experience().await;
    let out = chat_turn(
      &state,
      ChatIn {
        game_id: record.id.clone(),
        message: "hazme un reto".into(),
        current_json: None,
        product_type: None,
      },
    )
    .await
    .expect("known game");
    assert!(out.new_json.is_none());
    assert!(!out.reply.is_empty());
    // The guard must have been released.
    assert!(state.begin_chat(&record.id).await);
  }

  #[tokio::test]
  async fn chat_for_unknown_game_is_none() {
    let state = AppState::new();
    let out = chat_turn(
      &state,
      ChatIn {
        game_id: "nope0000".into(),
        message: "hola".into(),
        current_json: None,
        product_type: None,
      },
    )
    .await;
    assert!(out.is_none());
  }

  #[tokio::test]
  async fn save_then_finalize_keeps_both() {
    let state = AppState::new();
    let record = state.create_experience().await;

    let outcome = save_experience(
      &state,
      SaveIn { game_id: record.id.clone(), game_data: Some(playable_doc()), real_gift: None },
    )
    .await;
    assert!(matches!(outcome, SaveOutcome::Saved { rev: 1 }));

    let outcome = save_experience(
      &state,
      SaveIn { game_id: record.id.clone(), game_data: None, real_gift: Some("Cena sorpresa".into()) },
    )
    .await;
    assert!(matches!(outcome, SaveOutcome::Saved { rev: 2 }));

    let fetched = state.get_record(&record.id).await.expect("record");
    assert_eq!(fetched.game_data, playable_doc());
    assert_eq!(fetched.real_gift.as_deref(), Some("Cena sorpresa"));
  }

  #[tokio::test]
  async fn invalid_document_save_is_refused_with_reason() {
    let state = AppState::new();
    let record = state.create_experience().await;
    let outcome = save_experience(
      &state,
      SaveIn {
        game_id: record.id.clone(),
        game_data: Some(Experience::default()),
        real_gift: None,
      },
    )
    .await;
    assert!(matches!(outcome, SaveOutcome::InvalidDocument(_)));
    // The stored document is untouched.
    let fetched = state.get_record(&record.id).await.expect("record");
    assert_eq!(fetched.rev, 0);
  }

  #[tokio::test]
  async fn demo_payload_has_pay_route_and_no_gift() {
    let state = AppState::new();
    let record = state.create_experience().await;
    state.save_game_data(&record.id, playable_doc()).await;
    state.finalize(&record.id, "Vuelo a París".into()).await;

    let payload = player_payload(&state, &record.id).await.expect("payload");
    assert!(payload.is_demo);
    assert_eq!(payload.pay_route.as_deref(), Some(pay_route(&record.id).as_str()));
    let json = serde_json::to_string(&payload).unwrap();
    assert!(!json.contains("Vuelo a París"));
  }

  #[tokio::test]
  async fn paid_payload_drops_demo_marks() {
    let state = AppState::new();
    let record = state.create_experience().await;
    state.save_game_data(&record.id, playable_doc()).await;
    state.finalize(&record.id, "Vuelo a París".into()).await;
    state.mark_paid(&record.id).await;

    let payload = player_payload(&state, &record.id).await.expect("payload");
    assert!(!payload.is_demo);
    assert!(payload.pay_route.is_none());

    let record = state.get_record(&record.id).await.expect("record");
    match reward_access_for(&record) {
      RewardAccess::Full { gift } => assert_eq!(gift, "Vuelo a París"),
      other => panic!("expected full access, got {:?}", other),
    }
  }

  #[tokio::test]
  async fn play_session_for_unfinished_document_reports_shape_error() {
    let state = AppState::new();
    let record = state.create_experience().await;
    // Fresh records have no steps yet.
    let session = play_session(&state, &record.id).await.expect("known id");
    assert!(session.is_err());
  }
}
