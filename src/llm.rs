//! Minimal OpenAI-compatible client for the creator chat, plus the parser
//! for assistant replies carrying a document payload.
//!
//! We only call chat.completions with plain text output. Calls are
//! instrumented and log model names, latencies, and response sizes (not
//! contents).
//!
//! NOTE: We never log the API key and we keep payload truncations short.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::domain::Experience;

/// Literal separating the narrative part of a reply from the JSON document.
pub const JSON_DELIMITER: &str = "###JSON_DATA###";

/// One turn of creator chat history, either role.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatMessage {
  pub role: String,
  pub content: String,
}

impl ChatMessage {
  pub fn user(content: impl Into<String>) -> Self {
    Self { role: "user".into(), content: content.into() }
  }
  pub fn assistant(content: impl Into<String>) -> Self {
    Self { role: "assistant".into(), content: content.into() }
  }
}

#[derive(Clone)]
pub struct Llm {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub model: String,
}

impl Llm {
  /// Construct the client if we find OPENAI_API_KEY; otherwise return None.
  pub fn from_env() -> Option<Self> {
    let api_key = std::env::var("OPENAI_API_KEY").ok()?;
    let base_url =
      std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
    let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());

    // Hard timeout: a hung generation must not pin the creator UI.
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .ok()?;

    Some(Self { client, api_key, base_url, model })
  }

  /// One creator turn: system instruction + prior history + the new user
  /// message, at the creative temperature the product was tuned on.
  #[instrument(level = "info", skip(self, system, history, user),
               fields(model = %self.model, history_len = history.len(), user_len = user.len()))]
  pub async fn creator_turn(
    &self,
    system: &str,
    history: &[ChatMessage],
    user: &str,
  ) -> Result<String, String> {
    let url = format!("{}/chat/completions", self.base_url);
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessageReq { role: "system".into(), content: system.into() });
    for m in history {
      messages.push(ChatMessageReq { role: m.role.clone(), content: m.content.clone() });
    }
    messages.push(ChatMessageReq { role: "user".into(), content: user.into() });

    let req = ChatCompletionRequest { model: self.model.clone(), messages, temperature: 0.7 };

    let start = std::time::Instant::now();
    let res = self
      .client
      .post(&url)
      .header(USER_AGENT, "giftwrap-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req)
      .send()
      .await
      .map_err(|e| e.to_string())?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_provider_error(&body).unwrap_or(body);
      return Err(format!("LLM HTTP {}: {}", status, msg));
    }

    let body: ChatCompletionResponse = res.json().await.map_err(|e| e.to_string())?;
    if let Some(usage) = &body.usage {
      info!(prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens,
            total_tokens = ?usage.total_tokens, elapsed = ?start.elapsed(), "LLM usage");
    }
    let text = body
      .choices
      .first()
      .and_then(|c| c.message.content.clone())
      .unwrap_or_default()
      .trim()
      .to_string();

    Ok(text)
  }
}

/// Result of splitting an assistant reply into narrative and document.
#[derive(Debug)]
pub struct ParsedReply {
  /// Narrative part, stripped of any JSON tail.
  pub narrative: String,
  /// Document extracted from the reply, when present and well-formed JSON.
  pub document: Option<Experience>,
  /// Set when a document payload was present but could not be parsed.
  pub document_error: Option<String>,
}

/// Split an assistant reply into narrative text and an optional document.
///
/// Three shapes are accepted:
///   1. narrative + `###JSON_DATA###` + JSON (possibly code-fenced)
///   2. a bare JSON document (possibly code-fenced) with no narrative
///   3. plain narrative with no document at all
pub fn parse_reply(reply: &str) -> ParsedReply {
  if let Some((head, tail)) = reply.split_once(JSON_DELIMITER) {
    let json_str = strip_code_fences(tail);
    return match serde_json::from_str::<Experience>(&json_str) {
      Ok(doc) => ParsedReply {
        narrative: head.trim().to_string(),
        document: Some(doc),
        document_error: None,
      },
      Err(e) => ParsedReply {
        narrative: head.trim().to_string(),
        document: None,
        document_error: Some(format!("invalid document JSON: {}", e)),
      },
    };
  }

  let stripped = strip_code_fences(reply);
  if stripped.starts_with('{') {
    if let Ok(doc) = serde_json::from_str::<Experience>(&stripped) {
      return ParsedReply { narrative: String::new(), document: Some(doc), document_error: None };
    }
  }

  ParsedReply { narrative: reply.trim().to_string(), document: None, document_error: None }
}

/// Remove markdown code-fence markers anywhere in the string: "```" plus an
/// optional language tag and newline. The payload between fences survives.
pub fn strip_code_fences(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  let mut rest = s;
  while let Some(pos) = rest.find("```") {
    out.push_str(&rest[..pos]);
    rest = &rest[pos + 3..];
    // Swallow a language tag directly after the opening fence.
    let after_lang = rest.trim_start_matches(|c: char| c.is_ascii_lowercase());
    rest = after_lang.strip_prefix('\n').unwrap_or(after_lang);
  }
  out.push_str(rest);
  out.trim().to_string()
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
}
#[derive(Serialize)]
struct ChatMessageReq {
  role: String,
  content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)]
  usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice {
  message: ChatMessageResp,
}
#[derive(Deserialize)]
struct ChatMessageResp {
  content: Option<String>,
}
#[derive(Deserialize)]
struct Usage {
  #[serde(default)]
  prompt_tokens: Option<u32>,
  #[serde(default)]
  completion_tokens: Option<u32>,
  #[serde(default)]
  total_tokens: Option<u32>,
}

/// Try to extract a clean error message from a provider error body.
fn extract_provider_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap {
    error: EObj,
  }
  #[derive(Deserialize)]
  struct EObj {
    message: String,
  }
  serde_json::from_str::<EWrap>(body).ok().map(|w| w.error.message)
}

#[cfg(test)]
mod tests {
  use super::*;

  const DOC_JSON: &str = r#"{"title":"Reto","steps":[
    {"type":"intro","title":"Hi","subtitle":"Go"},
    {"type":"level","level_title":"L1","question":"2+2?","answer":"4"}
  ]}"#;

  #[test]
  fn delimiter_shape_yields_narrative_and_document() {
    let reply = format!("¡Hecho! Nuevo reto listo.\n{}\n{}", JSON_DELIMITER, DOC_JSON);
    let parsed = parse_reply(&reply);
    assert_eq!(parsed.narrative, "¡Hecho! Nuevo reto listo.");
    assert_eq!(parsed.document.expect("doc").steps.len(), 2);
    assert!(parsed.document_error.is_none());
  }

  #[test]
  fn code_fences_around_the_json_are_stripped() {
    let reply = format!("Listo.\n{}\n```json\n{}\n```", JSON_DELIMITER, DOC_JSON);
    let parsed = parse_reply(&reply);
    assert!(parsed.document.is_some());
  }

  #[test]
  fn bare_json_reply_is_accepted() {
    let parsed = parse_reply(DOC_JSON);
    assert!(parsed.document.is_some());
    assert!(parsed.narrative.is_empty());
  }

  #[test]
  fn malformed_document_payload_is_surfaced_not_swallowed() {
    let reply = format!("Hecho.\n{}\n{{not json at all", JSON_DELIMITER);
    let parsed = parse_reply(&reply);
    assert!(parsed.document.is_none());
    assert!(parsed.document_error.is_some());
    assert_eq!(parsed.narrative, "Hecho.");
  }

  #[test]
  fn plain_narrative_passes_through() {
    let parsed = parse_reply("¿Quieres que suba la dificultad?");
    assert!(parsed.document.is_none());
    assert!(parsed.document_error.is_none());
    assert_eq!(parsed.narrative, "¿Quieres que suba la dificultad?");
  }

  #[test]
  fn fence_stripping_keeps_the_payload() {
    assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
    assert_eq!(strip_code_fences("no fences"), "no fences");
  }
}
