//! Application state: the experience record store, per-game chat history,
//! the chat in-flight guard, templates, prompts, and the optional LLM client.
//!
//! All mutation of a record goes through the store's write lock, so saves
//! for one document are serialized in arrival order; the record's `rev`
//! counter makes that ordering observable to clients.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::{info, instrument, warn};

use crate::config::{load_creator_config_from_env, Prompts};
use crate::domain::{initial_experience, Experience};
use crate::llm::{ChatMessage, Llm};
use crate::seeds::seed_templates;
use crate::util::short_id;

/// Keep the tail of the conversation; old turns stop mattering once the
/// document context is re-sent every call anyway.
const HISTORY_CAP: usize = 40;

/// Server-side record wrapping one experience document.
#[derive(Clone, Debug)]
pub struct ExperienceRecord {
    pub id: String,
    pub game_data: Experience,
    pub real_gift: Option<String>,
    pub is_paid: bool,
    pub rev: u64,
    pub created_at: DateTime<Utc>,
    pub finalized_at: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct AppState {
    pub records: Arc<RwLock<HashMap<String, ExperienceRecord>>>,
    pub histories: Arc<RwLock<HashMap<String, Vec<ChatMessage>>>>,
    /// Game ids with a chat turn currently in flight (double-submit guard).
    chat_in_flight: Arc<Mutex<HashSet<String>>>,
    /// Seed templates merged with the TOML bank (bank wins on name clash).
    templates: Vec<(String, Experience)>,
    pub llm: Option<Llm>,
    pub prompts: Prompts,
}

impl AppState {
    /// Build state from env: load config, merge templates, init the LLM.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let cfg_opt = load_creator_config_from_env();
        let prompts = cfg_opt
            .as_ref()
            .map(|c| c.prompts.clone())
            .unwrap_or_default();

        let mut templates = seed_templates();
        if let Some(cfg) = &cfg_opt {
            for t in &cfg.templates {
                if let Err(e) = t.game_data.validate() {
                    warn!(target: "experience", name = %t.name, error = %e,
                          "Skipping bank template: not playable");
                    continue;
                }
                if let Some(slot) = templates.iter_mut().find(|(name, _)| *name == t.name) {
                    slot.1 = t.game_data.clone();
                } else {
                    templates.push((t.name.clone(), t.game_data.clone()));
                }
            }
        }
        info!(target: "experience", count = templates.len(), "Startup template inventory");

        let llm = Llm::from_env();
        if let Some(l) = &llm {
            info!(target: "giftwrap_backend", base_url = %l.base_url, model = %l.model, "LLM enabled.");
        } else {
            info!(target: "giftwrap_backend", "LLM disabled (no OPENAI_API_KEY). Chat degrades to manual editing.");
        }

        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
            histories: Arc::new(RwLock::new(HashMap::new())),
            chat_in_flight: Arc::new(Mutex::new(HashSet::new())),
            templates,
            llm,
            prompts,
        }
    }

    /// Create a fresh record seeded with the initial document and an empty
    /// chat history. Retries until the short id is unique.
    #[instrument(level = "info", skip(self))]
    pub async fn create_experience(&self) -> ExperienceRecord {
        let mut records = self.records.write().await;
        let id = loop {
            let candidate = short_id();
            if !records.contains_key(&candidate) {
                break candidate;
            }
        };
        let record = ExperienceRecord {
            id: id.clone(),
            game_data: initial_experience(),
            real_gift: None,
            is_paid: false,
            rev: 0,
            created_at: Utc::now(),
            finalized_at: None,
        };
        records.insert(id.clone(), record.clone());
        self.histories.write().await.insert(id.clone(), Vec::new());
        info!(target: "experience", %id, "Experience created");
        record
    }

    pub async fn get_record(&self, id: &str) -> Option<ExperienceRecord> {
        self.records.read().await.get(id).cloned()
    }

    /// Replace the document wholesale. Returns the new revision, or None
    /// for an unknown id. The caller validates the document first.
    #[instrument(level = "debug", skip(self, doc), fields(%id))]
    pub async fn save_game_data(&self, id: &str, doc: Experience) -> Option<u64> {
        let mut records = self.records.write().await;
        let record = records.get_mut(id)?;
        record.game_data = doc;
        record.rev += 1;
        Some(record.rev)
    }

    /// Store the real gift and stamp the record finalized.
    #[instrument(level = "info", skip(self, gift), fields(%id))]
    pub async fn finalize(&self, id: &str, gift: String) -> Option<u64> {
        let mut records = self.records.write().await;
        let record = records.get_mut(id)?;
        record.real_gift = Some(gift);
        record.finalized_at = Some(Utc::now());
        record.rev += 1;
        Some(record.rev)
    }

    /// Simulated payment activation.
    #[instrument(level = "info", skip(self), fields(%id))]
    pub async fn mark_paid(&self, id: &str) -> bool {
        let mut records = self.records.write().await;
        match records.get_mut(id) {
            Some(record) => {
                record.is_paid = true;
                info!(target: "experience", %id, "Payment confirmed, experience unlocked");
                true
            }
            None => false,
        }
    }

    pub async fn history_for(&self, id: &str) -> Vec<ChatMessage> {
        self.histories.read().await.get(id).cloned().unwrap_or_default()
    }

    /// Append a user/assistant turn pair, trimming the front past the cap.
    pub async fn push_history(&self, id: &str, user: ChatMessage, assistant: ChatMessage) {
        let mut histories = self.histories.write().await;
        let history = histories.entry(id.to_string()).or_default();
        history.push(user);
        history.push(assistant);
        if history.len() > HISTORY_CAP {
            let excess = history.len() - HISTORY_CAP;
            history.drain(..excess);
        }
    }

    /// Try to claim the chat slot for a game. False while another chat
    /// turn for the same game is still in flight.
    pub async fn begin_chat(&self, id: &str) -> bool {
        self.chat_in_flight.lock().await.insert(id.to_string())
    }

    pub async fn end_chat(&self, id: &str) {
        self.chat_in_flight.lock().await.remove(id);
    }

    pub fn template_names(&self) -> Vec<String> {
        self.templates.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn template(&self, name: &str) -> Option<&Experience> {
        self.templates
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, doc)| doc)
    }
}
