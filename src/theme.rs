//! Theme resolution: one place where the two wire-level theming schemes
//! (class-style `theme` string vs structured `visual_config`) collapse into
//! a single resolved palette.
//!
//! Precedence: an explicit `visual_config` wins; otherwise the named theme
//! maps through the built-in catalog; unknown or missing names fall back to
//! the default palette.

use serde::Serialize;

use crate::domain::{Experience, VisualConfig};

/// Fully resolved visual identity, ready for the player view.
/// `primary_rgb` is the "r, g, b" triplet derived from the primary color,
/// used by the frontend for shadow effects.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ResolvedTheme {
  pub primary_color: String,
  pub bg_color: String,
  pub font_family: String,
  pub icon: String,
  pub primary_rgb: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub css_class: Option<String>,
}

struct NamedTheme {
  class: &'static str,
  primary: &'static str,
  bg: &'static str,
  font: &'static str,
  icon: &'static str,
}

const DEFAULT_THEME: NamedTheme = NamedTheme {
  class: "theme-default",
  primary: "#9333EA",
  bg: "#0F172A",
  font: "Montserrat",
  icon: "fa-star",
};

/// Built-in pre-made themes selectable by class name.
const CATALOG: &[NamedTheme] = &[
  DEFAULT_THEME,
  NamedTheme {
    class: "theme-navidad",
    primary: "#DC2626",
    bg: "#064E3B",
    font: "Playfair Display",
    icon: "fa-tree",
  },
  NamedTheme {
    class: "theme-san-valentin",
    primary: "#EC4899",
    bg: "#1E1B2E",
    font: "Playfair Display",
    icon: "fa-heart",
  },
  NamedTheme {
    class: "theme-cumpleanos",
    primary: "#F59E0B",
    bg: "#1E1B4B",
    font: "Lexend",
    icon: "fa-cake-candles",
  },
  NamedTheme {
    class: "theme-hacker",
    primary: "#22C55E",
    bg: "#020617",
    font: "Space Grotesk",
    icon: "fa-terminal",
  },
];

/// Parse a 6-digit hex color ("#9333EA" or "9333EA") to an "r, g, b"
/// triplet. None when the string is not a well-formed color.
pub fn hex_to_rgb_triplet(hex: &str) -> Option<String> {
  let hex = hex.trim().strip_prefix('#').unwrap_or(hex.trim());
  if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
    return None;
  }
  let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
  let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
  let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
  Some(format!("{}, {}, {}", r, g, b))
}

fn from_named(named: &NamedTheme) -> ResolvedTheme {
  ResolvedTheme {
    primary_color: named.primary.into(),
    bg_color: named.bg.into(),
    font_family: named.font.into(),
    icon: named.icon.into(),
    // Catalog entries are well-formed by construction.
    primary_rgb: hex_to_rgb_triplet(named.primary).unwrap_or_else(|| "147, 51, 234".into()),
    css_class: Some(named.class.into()),
  }
}

fn from_config(cfg: &VisualConfig) -> ResolvedTheme {
  let primary_rgb = match hex_to_rgb_triplet(&cfg.primary_color) {
    Some(rgb) => rgb,
    None => {
      tracing::warn!(target: "experience", primary = %cfg.primary_color,
        "malformed primary color; using default shadow triplet");
      hex_to_rgb_triplet(DEFAULT_THEME.primary).unwrap_or_default()
    }
  };
  ResolvedTheme {
    primary_color: cfg.primary_color.clone(),
    bg_color: cfg.bg_color.clone(),
    font_family: cfg.font_family.clone(),
    icon: cfg.theme_icon.clone(),
    primary_rgb,
    css_class: None,
  }
}

/// Resolve the document's visual identity once, at load time.
pub fn resolve(doc: &Experience) -> ResolvedTheme {
  if let Some(cfg) = &doc.visual_config {
    return from_config(cfg);
  }
  let named = doc
    .theme
    .as_deref()
    .and_then(|name| CATALOG.iter().find(|t| t.class == name))
    .unwrap_or(&DEFAULT_THEME);
  from_named(named)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn hex_parsing_handles_prefix_and_garbage() {
    assert_eq!(hex_to_rgb_triplet("#9333EA").as_deref(), Some("147, 51, 234"));
    assert_eq!(hex_to_rgb_triplet("22C55E").as_deref(), Some("34, 197, 94"));
    assert_eq!(hex_to_rgb_triplet("#FFF"), None);
    assert_eq!(hex_to_rgb_triplet("not-a-color"), None);
  }

  #[test]
  fn visual_config_wins_over_named_theme() {
    let doc = Experience {
      theme: Some("theme-hacker".into()),
      visual_config: Some(VisualConfig {
        primary_color: "#DC2626".into(),
        bg_color: "#000000".into(),
        font_family: "Lexend".into(),
        theme_icon: "fa-ghost".into(),
      }),
      ..Default::default()
    };
    let t = resolve(&doc);
    assert_eq!(t.icon, "fa-ghost");
    assert_eq!(t.primary_rgb, "220, 38, 38");
    assert_eq!(t.css_class, None);
  }

  #[test]
  fn named_theme_maps_through_catalog() {
    let doc = Experience { theme: Some("theme-navidad".into()), ..Default::default() };
    let t = resolve(&doc);
    assert_eq!(t.icon, "fa-tree");
    assert_eq!(t.css_class.as_deref(), Some("theme-navidad"));
  }

  #[test]
  fn unknown_or_missing_theme_falls_back_to_default() {
    let unknown = Experience { theme: Some("theme-vaporwave".into()), ..Default::default() };
    let missing = Experience::default();
    assert_eq!(resolve(&unknown), resolve(&missing));
    assert_eq!(resolve(&missing).icon, "fa-star");
  }
}
