//! Loading creator configuration (prompts + optional template bank) from TOML.
//!
//! See `CreatorConfig` and `Prompts` for the expected schema.

use serde::Deserialize;
use tracing::{error, info};

use crate::domain::Experience;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct CreatorConfig {
  #[serde(default)]
  pub prompts: Prompts,
  #[serde(default)]
  pub templates: Vec<TemplateCfg>,
}

/// Named experience template accepted in TOML configuration. These are
/// merged over the built-in seed templates (config wins on name clash).
#[derive(Clone, Debug, Deserialize)]
pub struct TemplateCfg {
  pub name: String,
  pub game_data: Experience,
}

/// Prompts used by the LLM-driven creator chat. Defaults implement the
/// standard mini-escape product; override them in TOML to tune tone or to
/// add product variants.
#[derive(Clone, Debug, Deserialize)]
pub struct Prompts {
  /// Shared creative-director instruction, prepended to every product.
  pub system_base: String,
  /// Appended to the system instruction; `{current_json}` is replaced
  /// with the serialized current document.
  pub context_template: String,
  /// Per-product rule blocks, keyed by `product_type`.
  #[serde(default)]
  pub products: std::collections::HashMap<String, String>,
  /// Friendly reply when the LLM is not configured.
  pub unavailable_reply: String,
  /// Friendly reply when the LLM call fails.
  pub error_reply: String,
  /// Reply when a chat is already in flight for the same game.
  pub busy_reply: String,
}

pub const DEFAULT_PRODUCT: &str = "mini_escape";

impl Default for Prompts {
  fn default() -> Self {
    let system_base = r#"You are the Creative Director and Lead UI Designer of a gift-experience studio.
You design personalized escape-room style experiences: both the narrative (riddles) and the visual identity.

VISUAL CONFIG RULES:
- bg_color: always a dark color (dark mode).
- primary_color: a vibrant color that stands out on the dark background.
- theme_icon: exclusively FontAwesome 6 classes (e.g. 'fa-ghost', 'fa-robot').
- font_family: one of 'Space Grotesk', 'Montserrat', 'Lexend', 'Playfair Display'.

UPDATE LOGIC:
1. Content change requests ("harder", "shorter", "change level 2"): keep 'visual_config' EXACTLY as received; only rewrite the 'steps' texts.
2. Aesthetic change requests ("red tones", "cyberpunk style"): redesign 'visual_config'; keep the 'steps' narrative unless the new style demands adjustments.
3. Initial idea or preset requests: generate the whole JSON from scratch.

RESPONSE STRUCTURE:
- Your response MUST be split in two parts by the literal delimiter '###JSON_DATA###'.
- PART 1: a short, upbeat message about the changes (Markdown).
- PART 2: the complete, valid JSON document."#
      .to_string();

    let mini_escape = r##"MANDATORY JSON SCHEMA:
{
  "visual_config": {"primary_color": "#hex", "bg_color": "#hex", "font_family": "...", "theme_icon": "fa-..."},
  "title": "Epic challenge name",
  "steps": [
    {"type": "intro", "title": "Welcome title", "subtitle": "One-line context"},
    {"type": "level", "level_number": 1, "level_title": "Level name", "question": "The riddle", "answer": "Answer (max 2 words)"}
  ]
}

GAME RULES:
- Generate exactly 1 intro and 5 levels.
- Answers must be easy to type on a phone."##
      .to_string();

    Self {
      system_base,
      context_template: "CURRENT GAME JSON (use as base):\n{current_json}".into(),
      products: std::collections::HashMap::from([(DEFAULT_PRODUCT.to_string(), mini_escape)]),
      unavailable_reply: "El asistente no está disponible ahora mismo. Puedes editar los pasos a mano.".into(),
      error_reply: "Vaya, algo ha fallado en la matriz. Inténtalo de nuevo.".into(),
      busy_reply: "Todavía estoy con tu último mensaje, dame un segundo.".into(),
    }
  }
}

impl Prompts {
  /// Full system instruction for one chat turn: base rules, product rules
  /// (unknown products fall back to the default), current document context.
  pub fn system_for(&self, product: &str, current_json: &str) -> String {
    let rules = self
      .products
      .get(product)
      .or_else(|| self.products.get(DEFAULT_PRODUCT))
      .map(String::as_str)
      .unwrap_or_default();
    let context = crate::util::fill_template(&self.context_template, &[("current_json", current_json)]);
    format!("{}\n\n{}\n\n{}", self.system_base, rules, context)
  }
}

/// Attempt to load `CreatorConfig` from CREATOR_CONFIG_PATH. On any
/// parsing/IO error, returns None and the defaults apply.
pub fn load_creator_config_from_env() -> Option<CreatorConfig> {
  let path = std::env::var("CREATOR_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<CreatorConfig>(&s) {
      Ok(cfg) => {
        info!(target: "giftwrap_backend", %path, "Loaded creator config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "giftwrap_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "giftwrap_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn system_instruction_injects_document_context() {
    let prompts = Prompts::default();
    let sys = prompts.system_for(DEFAULT_PRODUCT, r#"{"steps":[]}"#);
    assert!(sys.contains("###JSON_DATA###"));
    assert!(sys.contains(r#"{"steps":[]}"#));
  }

  #[test]
  fn unknown_product_falls_back_to_default_rules() {
    let prompts = Prompts::default();
    let sys = prompts.system_for("no_such_product", "{}");
    assert!(sys.contains("MANDATORY JSON SCHEMA"));
  }

  #[test]
  fn template_bank_parses_from_toml() {
    let toml_src = r#"
      [[templates]]
      name = "logica"

      [templates.game_data]
      title = "Reto de Lógica"
      theme = "theme-hacker"

      [[templates.game_data.steps]]
      type = "intro"
      title = "Bienvenido"
      subtitle = "Empieza cuando quieras"

      [[templates.game_data.steps]]
      type = "level"
      level_number = 1
      level_title = "Nivel 1"
      question = "2+2?"
      answer = "4"
    "#;
    let cfg: CreatorConfig = toml::from_str(toml_src).expect("parse");
    assert_eq!(cfg.templates.len(), 1);
    assert_eq!(cfg.templates[0].name, "logica");
    assert!(cfg.templates[0].game_data.validate().is_ok());
  }
}
