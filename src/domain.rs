//! Domain models: the Experience document, its steps, visual config, and
//! the mini-game module catalog.

use serde::{Deserialize, Serialize};

/// Structured theming scheme: explicit colors, font, and icon.
/// Competes on the wire with the class-style `theme` string; resolution
/// is unified in `crate::theme`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct VisualConfig {
  pub primary_color: String,
  pub bg_color: String,
  pub font_family: String,
  pub theme_icon: String,
}

/// Optional mini-game sub-type attachable to a level step.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ModuleKind {
  Quiz,
  Adivinanza,
  Sudoku,
  Queens,
  Escape,
}

/// Product plan tiers. Higher tiers unlock more module kinds.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
  Quiz,
  Gymkhana,
  Escape,
}

impl ModuleKind {
  /// Lowest plan tier that includes this module.
  pub fn required_plan(self) -> Plan {
    match self {
      ModuleKind::Quiz | ModuleKind::Adivinanza => Plan::Quiz,
      ModuleKind::Sudoku | ModuleKind::Queens => Plan::Gymkhana,
      ModuleKind::Escape => Plan::Escape,
    }
  }

  pub fn all() -> &'static [ModuleKind] {
    &[
      ModuleKind::Quiz,
      ModuleKind::Adivinanza,
      ModuleKind::Sudoku,
      ModuleKind::Queens,
      ModuleKind::Escape,
    ]
  }

  pub fn display_name(self) -> &'static str {
    match self {
      ModuleKind::Quiz => "Quiz Rápido",
      ModuleKind::Adivinanza => "Adivinanza",
      ModuleKind::Sudoku => "Mini Sudoku",
      ModuleKind::Queens => "Reinas Ajedrez",
      ModuleKind::Escape => "Mini Escape",
    }
  }

  pub fn icon(self) -> &'static str {
    match self {
      ModuleKind::Quiz => "fa-question-circle",
      ModuleKind::Adivinanza => "fa-brain",
      ModuleKind::Sudoku => "fa-table-cells",
      ModuleKind::Queens => "fa-chess-queen",
      ModuleKind::Escape => "fa-key",
    }
  }
}

/// One page of the experience, tagged by `type` on the wire.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Step {
  /// Welcome banner with a single "continue" action.
  Intro {
    #[serde(default)]
    title: String,
    #[serde(default)]
    subtitle: String,
  },
  /// Question/answer level with free-text input.
  Level {
    #[serde(default)]
    level_number: Option<u32>,
    #[serde(default)]
    level_title: String,
    #[serde(default)]
    question: String,
    #[serde(default)]
    answer: String,
    #[serde(default)]
    module: Option<ModuleKind>,
  },
}

impl Step {
  pub fn is_intro(&self) -> bool {
    matches!(self, Step::Intro { .. })
  }
}

/// The Experience document: theme, title, and ordered steps for one
/// gift-quiz instance. Persisted and exchanged wholesale.
///
/// Both theming fields are accepted because documents in the wild carry
/// either; see `crate::theme::resolve` for the precedence rule.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct Experience {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub title: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub theme: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub visual_config: Option<VisualConfig>,
  #[serde(default)]
  pub steps: Vec<Step>,
}

/// Why a document was rejected.
#[derive(Debug, PartialEq, Eq)]
pub enum DocumentError {
  EmptySteps,
  LevelMissingAnswer { index: usize },
}

impl std::fmt::Display for DocumentError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      DocumentError::EmptySteps => write!(f, "document has no steps"),
      DocumentError::LevelMissingAnswer { index } => {
        write!(f, "level step at index {} has an empty answer", index)
      }
    }
  }
}

impl Experience {
  /// Shape check before a document is accepted from the LLM or a save
  /// request. Malformed documents are rejected with a reportable error
  /// instead of silently producing a broken player view.
  pub fn validate(&self) -> Result<(), DocumentError> {
    if self.steps.is_empty() {
      return Err(DocumentError::EmptySteps);
    }
    for (index, step) in self.steps.iter().enumerate() {
      match step {
        Step::Level { answer, .. } if answer.trim().is_empty() => {
          return Err(DocumentError::LevelMissingAnswer { index });
        }
        // Intro past index 0 is tolerated (observed in the wild) but noted.
        Step::Intro { .. } if index > 0 => {
          tracing::debug!(target: "experience", index, "intro step past index 0");
        }
        _ => {}
      }
    }
    Ok(())
  }
}

/// Initial document for a freshly started experience: default visual
/// identity, no steps yet. The creator fills it via chat or a template.
pub fn initial_experience() -> Experience {
  Experience {
    title: Some("Nueva Experiencia".into()),
    theme: None,
    visual_config: Some(VisualConfig {
      primary_color: "#9333EA".into(),
      bg_color: "#0F172A".into(),
      font_family: "Montserrat".into(),
      theme_icon: "fa-wand-magic-sparkles".into(),
    }),
    steps: Vec::new(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn level(answer: &str) -> Step {
    Step::Level {
      level_number: Some(1),
      level_title: "L1".into(),
      question: "2+2?".into(),
      answer: answer.into(),
      module: None,
    }
  }

  #[test]
  fn step_tag_round_trips_through_json() {
    let doc: Experience = serde_json::from_str(
      r#"{
        "title": "Reto",
        "theme": "theme-hacker",
        "steps": [
          {"type": "intro", "title": "Hi", "subtitle": "Go"},
          {"type": "level", "level_number": 1, "level_title": "L1",
           "question": "2+2?", "answer": "4", "module": "sudoku"}
        ]
      }"#,
    )
    .expect("parse");
    assert_eq!(doc.steps.len(), 2);
    assert!(doc.steps[0].is_intro());
    match &doc.steps[1] {
      Step::Level { module, .. } => assert_eq!(*module, Some(ModuleKind::Sudoku)),
      _ => panic!("expected level"),
    }
  }

  #[test]
  fn empty_steps_is_rejected() {
    let doc = Experience::default();
    assert_eq!(doc.validate(), Err(DocumentError::EmptySteps));
  }

  #[test]
  fn level_without_answer_is_rejected() {
    let doc = Experience { steps: vec![level("  ")], ..Default::default() };
    assert_eq!(doc.validate(), Err(DocumentError::LevelMissingAnswer { index: 0 }));
  }

  #[test]
  fn initial_document_carries_default_visual_config() {
    let doc = initial_experience();
    assert!(doc.visual_config.is_some());
    assert!(doc.steps.is_empty());
    // The initial document is deliberately not yet playable.
    assert!(doc.validate().is_err());
  }

  #[test]
  fn module_plan_gating_is_ordered() {
    assert!(Plan::Quiz < Plan::Gymkhana);
    assert_eq!(ModuleKind::Escape.required_plan(), Plan::Escape);
    assert_eq!(ModuleKind::Adivinanza.required_plan(), Plan::Quiz);
  }
}
