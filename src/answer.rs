//! Answer comparison: case-, whitespace-, and accent-insensitive.
//!
//! Example:
//!   input: "  Café  "  stored: "CAFE"  → match
//!
//! Policy: trim, NFD-decompose, drop combining marks, lowercase, compare.
//! Earlier revisions of the product skipped the diacritics step and produced
//! accent-sensitive false negatives for Spanish answers ("lápiz" vs "lapiz");
//! this is the corrected contract.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Canonical form used on both sides of a comparison.
pub fn normalize(s: &str) -> String {
  s.trim()
    .nfd()
    .filter(|c| !is_combining_mark(*c))
    .flat_map(char::to_lowercase)
    .collect()
}

/// True when the player's raw input matches the stored answer under
/// normalization. Symmetric by construction.
pub fn answers_match(user: &str, expected: &str) -> bool {
  normalize(user) == normalize(expected)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn accents_and_case_are_ignored() {
    assert!(answers_match("café", "CAFE"));
    assert!(answers_match("CAFÉ", "cafe"));
    assert!(answers_match("  Lápiz ", "lapiz"));
  }

  #[test]
  fn comparison_is_symmetric() {
    assert_eq!(answers_match("Añejo", "anejo"), answers_match("anejo", "Añejo"));
  }

  #[test]
  fn different_words_do_not_match() {
    assert!(!answers_match("five", "4"));
    assert!(!answers_match("", "4"));
  }

  #[test]
  fn interior_spacing_still_matters() {
    // Only the ends are trimmed; "two words" stays distinct from "twowords".
    assert!(answers_match(" dos palabras ", "Dos Palabras"));
    assert!(!answers_match("dospalabras", "dos palabras"));
  }
}
