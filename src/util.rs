//! Small utility helpers used across modules.

use uuid::Uuid;

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
/// This is intentionally simple (no nested/conditional logic).
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = tpl.to_string();
  for (k, v) in pairs {
    let needle = format!("{{{}}}", k);
    out = out.replace(&needle, v);
  }
  out
}

/// Short, URL-friendly game id: the first 8 hex chars of a v4 UUID.
/// Collisions are rejected at insert time by the store.
pub fn short_id() -> String {
  Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge request/response payloads.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let cut = s
    .char_indices()
    .map(|(i, _)| i)
    .take_while(|i| *i <= max)
    .last()
    .unwrap_or(0);
  format!("{}… ({} bytes total)", &s[..cut], s.len())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fill_template_replaces_all_keys() {
    let out = fill_template("a={a}, b={b}, a again={a}", &[("a", "1"), ("b", "2")]);
    assert_eq!(out, "a=1, b=2, a again=1");
  }

  #[test]
  fn short_id_is_eight_hex_chars() {
    let id = short_id();
    assert_eq!(id.len(), 8);
    assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
  }

  #[test]
  fn trunc_keeps_short_strings_intact() {
    assert_eq!(trunc_for_log("hola", 16), "hola");
    assert!(trunc_for_log(&"x".repeat(100), 16).contains("100 bytes total"));
  }
}
