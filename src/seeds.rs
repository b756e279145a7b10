//! Built-in experience templates: seed content that keeps the app useful
//! without external config or an LLM key. Served by the template routes and
//! merged with (and overridable by) the TOML template bank.

use crate::domain::{Experience, Step, VisualConfig};

fn level(n: u32, title: &str, question: &str, answer: &str) -> Step {
  Step::Level {
    level_number: Some(n),
    level_title: title.into(),
    question: question.into(),
    answer: answer.into(),
    module: None,
  }
}

/// Default playable demo: a small logic escape, the document behind the
/// public demo route.
fn logica() -> Experience {
  Experience {
    title: Some("El Código Perdido".into()),
    theme: None,
    visual_config: Some(VisualConfig {
      primary_color: "#9333EA".into(),
      bg_color: "#0F172A".into(),
      font_family: "Space Grotesk".into(),
      theme_icon: "fa-lock".into(),
    }),
    steps: vec![
      Step::Intro {
        title: "El Código Perdido".into(),
        subtitle: "Cinco acertijos te separan de tu regalo.".into(),
      },
      level(1, "Calentamiento", "Cuanto más quitas, más grande soy. ¿Qué soy?", "agujero"),
      level(2, "Números", "Soy un número par. Quítame una letra y quedo impar. ¿Qué número soy?", "siete"),
      level(3, "Palabras", "¿Qué palabra se escribe incorrectamente en todos los diccionarios?", "incorrectamente"),
      level(4, "Lógica", "El padre de Juan tiene cinco hijos: Lala, Lele, Lili, Lolo y...", "juan"),
      level(5, "Final", "Te pertenece, pero los demás lo usan más que tú. ¿Qué es?", "mi nombre"),
    ],
  }
}

/// Themed variant showing the class-style theming scheme.
fn navidad() -> Experience {
  Experience {
    title: Some("Misión Nochebuena".into()),
    theme: Some("theme-navidad".into()),
    visual_config: None,
    steps: vec![
      Step::Intro {
        title: "Misión Nochebuena".into(),
        subtitle: "Resuelve los retos antes de medianoche.".into(),
      },
      level(1, "El Trineo", "Blanca por dentro, verde por fuera. Si quieres que te lo diga, espera.", "pera"),
      level(2, "El Reno", "¿Qué mes tiene 28 días?", "todos"),
      level(3, "La Estrella", "Vuelo sin alas, silbo sin boca. ¿Qué soy?", "el viento"),
    ],
  }
}

/// Name → document pairs, insertion order = display order.
pub fn seed_templates() -> Vec<(String, Experience)> {
  vec![("logica".into(), logica()), ("navidad".into(), navidad())]
}
