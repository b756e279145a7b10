//! Player WebSocket: one connection drives one `PlayerSession`. Each client
//! message is parsed as JSON and applied to the session; the current step is
//! pushed on connect, and a correct answer is followed by the next step (or
//! the reward) so the client can play its success transition in between.

use std::sync::Arc;

use axum::{
  extract::{
    ws::{Message, WebSocket},
    Path, State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{error, info, instrument};

use crate::logic;
use crate::player::{PlayState, PlayerSession};
use crate::protocol::{ClientPlayMessage, ServerPlayMessage};
use crate::state::AppState;

#[instrument(level = "info", skip(ws, state), fields(%game_id))]
pub async fn ws_upgrade(
  ws: WebSocketUpgrade,
  Path(game_id): Path<String>,
  State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
  info!(target: "giftwrap_backend", %game_id, "Player WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state, game_id))
}

fn state_msg(state: PlayState) -> ServerPlayMessage {
  match state {
    PlayState::Step { index, total, view } => ServerPlayMessage::Step { index, total, view },
    PlayState::Reward(reward) => ServerPlayMessage::Reward { reward },
  }
}

async fn send(socket: &mut WebSocket, msg: &ServerPlayMessage) -> bool {
  let out = serde_json::to_string(msg).unwrap_or_else(|e| {
    serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) })
      .to_string()
  });
  if let Err(e) = socket.send(Message::Text(out)).await {
    error!(target: "giftwrap_backend", error = %e, "WS send error");
    return false;
  }
  true
}

#[instrument(level = "info", skip(socket, state), fields(%game_id))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>, game_id: String) {
  let mut session = match logic::play_session(&state, &game_id).await {
    Some(Ok(session)) => session,
    Some(Err(e)) => {
      let _ = send(&mut socket, &ServerPlayMessage::Error {
        message: format!("experience not playable: {}", e),
      })
      .await;
      return;
    }
    None => {
      let _ = send(&mut socket, &ServerPlayMessage::Error { message: "unknown game".into() }).await;
      return;
    }
  };

  info!(target: "experience", %game_id, "Player connected");
  // Push the opening step so the client renders without a first request.
  if !send(&mut socket, &state_msg(session.state())).await {
    return;
  }

  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        let replies = match serde_json::from_str::<ClientPlayMessage>(&txt) {
          Ok(incoming) => handle_player_msg(incoming, &mut session, &game_id),
          Err(e) => vec![ServerPlayMessage::Error { message: format!("Invalid JSON: {}", e) }],
        };
        for reply in &replies {
          if !send(&mut socket, reply).await {
            return;
          }
        }
      }
      Message::Ping(payload) => {
        let _ = socket.send(Message::Pong(payload)).await;
      }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "experience", %game_id, "Player disconnected");
}

fn handle_player_msg(
  msg: ClientPlayMessage,
  session: &mut PlayerSession,
  game_id: &str,
) -> Vec<ServerPlayMessage> {
  match msg {
    ClientPlayMessage::Ping => vec![ServerPlayMessage::Pong],

    ClientPlayMessage::Continue => match session.proceed() {
      Ok(next) => vec![state_msg(next)],
      Err(e) => vec![ServerPlayMessage::Error { message: e.to_string() }],
    },

    ClientPlayMessage::SubmitAnswer { answer } => match session.submit_answer(&answer) {
      Ok(outcome) => {
        tracing::info!(target: "experience", %game_id, correct = outcome.correct,
                       index = session.current_index(), "Answer evaluated");
        let mut replies = vec![ServerPlayMessage::AnswerResult { correct: outcome.correct }];
        if outcome.correct {
          replies.push(state_msg(outcome.state));
        }
        replies
      }
      Err(e) => vec![ServerPlayMessage::Error { message: e.to_string() }],
    },

    ClientPlayMessage::Restart => {
      tracing::info!(target: "experience", %game_id, "Session restarted");
      vec![state_msg(session.restart())]
    }
  }
}
