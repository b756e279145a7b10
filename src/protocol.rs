//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::{Experience, ModuleKind, Plan};
use crate::theme::ResolvedTheme;

/// Messages the player client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientPlayMessage {
    Ping,
    /// Advance past the intro banner. Only valid on an intro step.
    Continue,
    /// Submit a free-text answer for the current level step.
    SubmitAnswer { answer: String },
    /// Explicit replay: back to the first step.
    Restart,
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerPlayMessage {
    Pong,
    Step {
        index: usize,
        total: usize,
        view: StepView,
    },
    AnswerResult {
        correct: bool,
    },
    Reward {
        reward: RewardView,
    },
    Error {
        message: String,
    },
}

/// View-model for one step, keyed by variant. Never carries the stored
/// answer.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepView {
    Intro {
        title: String,
        subtitle: String,
    },
    Level {
        level_label: String,
        level_title: String,
        question: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        module: Option<ModuleKind>,
    },
}

/// Terminal reward view. The locked variant structurally has no gift
/// field, so a demo response can never leak the gift text.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RewardView {
    Unlocked { gift: String },
    Locked { pay_route: String },
}

//
// HTTP request/response DTOs
//

#[derive(Serialize)]
pub struct StartOut {
    pub game_id: String,
    pub game_data: Experience,
}

#[derive(Serialize)]
pub struct CreatorOut {
    pub game_id: String,
    pub game_data: Experience,
    pub rev: u64,
}

#[derive(Debug, Deserialize)]
pub struct ChatIn {
    pub game_id: String,
    pub message: String,
    #[serde(default)]
    pub current_json: Option<Experience>,
    #[serde(default)]
    pub product_type: Option<String>,
}

#[derive(Serialize)]
pub struct ChatOut {
    pub reply: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_json: Option<Experience>,
    /// Set when the assistant produced a document we could not accept
    /// (parse or validation failure); the preview should surface it
    /// instead of going silently stale.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SaveIn {
    pub game_id: String,
    #[serde(default)]
    pub game_data: Option<Experience>,
    #[serde(default)]
    pub real_gift: Option<String>,
}

#[derive(Serialize)]
pub struct SaveOut {
    pub success: bool,
    pub game_id: String,
    pub rev: u64,
}

/// Player bootstrap payload. Gift text is never included here; it is
/// only revealed through the WebSocket reward message, and only for
/// paid records.
#[derive(Serialize)]
pub struct PlayerOut {
    pub game_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub theme: ResolvedTheme,
    pub steps_total: usize,
    pub is_demo: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pay_route: Option<String>,
}

#[derive(Serialize)]
pub struct PayOut {
    pub success: bool,
    pub play_route: String,
}

#[derive(Debug, Deserialize)]
pub struct ModulesQuery {
    #[serde(default)]
    pub plan: Option<Plan>,
}

#[derive(Serialize)]
pub struct ModuleInfo {
    pub id: ModuleKind,
    pub name: &'static str,
    pub icon: &'static str,
    pub plan: Plan,
    pub locked: bool,
}

#[derive(Serialize)]
pub struct TemplatesOut {
    pub templates: Vec<String>,
}

#[derive(Serialize)]
pub struct ErrorOut {
    pub message: String,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
