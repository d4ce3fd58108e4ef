use super::*;

static MEDIA_FEATURE: Lazy<Regex> = Lazy::new(|| {
  Regex::new(
    r"(min-width|max-width|min-height|max-height)\s*:\s*(-?(?:\d+\.?\d*|\.\d+))\s*([a-z%]*)",
  )
  .expect("media feature pattern is valid")
});

/// Sort key for a declaration context. Smaller keys are shown first.
///
/// Bands, from highest priority to lowest:
///
/// | band | contexts |
/// |------|----------|
/// | 0 | `default`, empty, light color scheme |
/// | 1 | dark color scheme |
/// | 2..=5 | `min-width`, `max-width`, `min-height`, `max-height`, larger first |
/// | 6 | reduced motion, contrast, portrait, landscape, `hover: none` |
/// | 7 | hover, focus, active |
/// | 8 | print, screen |
/// | 9 | anything else |
///
/// Ties inside a band fall back to the raw context text.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct RankKey {
  pub band: u8,
  pub secondary: Option<i64>,
  pub tiebreak: String,
}

impl RankKey {
  pub fn from_context(context: &str) -> Self {
    let (band, secondary) = Self::classify(context);

    Self {
      band,
      secondary,
      tiebreak: context.to_string(),
    }
  }

  fn classify(context: &str) -> (u8, Option<i64>) {
    let lower = context.trim().to_lowercase();

    if lower.is_empty() || lower == "default" {
      return (0, None);
    }

    if lower.contains("color-scheme") {
      if lower.contains("light") {
        return (0, None);
      }

      if lower.contains("dark") {
        return (1, None);
      }
    }

    if let Some(captures) = MEDIA_FEATURE.captures(&lower) {
      let band = match &captures[1] {
        "min-width" => 2,
        "max-width" => 3,
        "min-height" => 4,
        _ => 5,
      };

      let pixels = captures[2].parse::<f64>().unwrap_or_default()
        * unit_to_pixels(&captures[3]);

      return (band, Some(-(pixels.max(0.0).round() as i64)));
    }

    let compact = lower.replace(char::is_whitespace, "");

    let preference = if compact.contains("reduced-motion") {
      Some(0)
    } else if compact.contains("contrast") {
      Some(1)
    } else if compact.contains("orientation:portrait") {
      Some(2)
    } else if compact.contains("orientation:landscape") {
      Some(3)
    } else if compact.contains("hover:none") {
      Some(4)
    } else {
      None
    };

    if let Some(order) = preference {
      return (6, Some(order));
    }

    let interaction = if compact.contains("hover") {
      Some(0)
    } else if compact.contains("focus") {
      Some(1)
    } else if compact.contains("active") {
      Some(2)
    } else {
      None
    };

    if let Some(order) = interaction {
      return (7, Some(order));
    }

    if compact.contains("print") {
      return (8, Some(0));
    }

    if compact.contains("screen") {
      return (8, Some(1));
    }

    (9, None)
  }
}

#[cfg(test)]
mod tests {
  use {super::*, pretty_assertions::assert_eq};

  fn rank(context: &str) -> RankKey {
    RankKey::from_context(context)
  }

  fn sorted(contexts: &[&str]) -> Vec<String> {
    let mut contexts = contexts
      .iter()
      .map(|context| context.to_string())
      .collect::<Vec<_>>();

    contexts.sort_by_key(|context| rank(context));

    contexts
  }

  #[test]
  fn headline_ordering() {
    assert!(rank("default") < rank("prefers-color-scheme: dark"));
    assert!(rank("prefers-color-scheme: dark") < rank("min-width: 1200px"));
    assert!(rank("min-width: 1200px") < rank("min-width: 768px"));
  }

  #[test]
  fn light_scheme_shares_the_default_band() {
    assert_eq!(rank("prefers-color-scheme: light").band, 0);
    assert_eq!(rank("").band, 0);
    assert_eq!(rank("default").band, 0);
  }

  #[test]
  fn widths_sort_larger_first_within_band() {
    assert_eq!(
      sorted(&["max-width: 350px", "max-width: 768px", "min-width: 48em"]),
      vec!["min-width: 48em", "max-width: 768px", "max-width: 350px"]
    );
  }

  #[test]
  fn relative_units_are_converted() {
    assert_eq!(rank("min-width: 48em").secondary, Some(-768));
    assert_eq!(rank("min-height: 100vh").secondary, Some(-768));
    assert_eq!(rank("max-height: -5px").secondary, Some(0));
  }

  #[test]
  fn full_ordering() {
    assert_eq!(
      sorted(&[
        "weird",
        "print",
        "hover",
        "prefers-reduced-motion: reduce",
        "max-height: 600px",
        "min-height: 400px",
        "max-width: 600px",
        "screen and (min-width: 600px)",
        "prefers-color-scheme: dark",
        "default",
        "hover: none",
        "orientation: landscape",
        "orientation: portrait",
        "prefers-contrast: more",
        "focus",
        "active",
        "screen",
      ]),
      vec![
        "default",
        "prefers-color-scheme: dark",
        "screen and (min-width: 600px)",
        "max-width: 600px",
        "min-height: 400px",
        "max-height: 600px",
        "prefers-reduced-motion: reduce",
        "prefers-contrast: more",
        "orientation: portrait",
        "orientation: landscape",
        "hover: none",
        "hover",
        "focus",
        "active",
        "print",
        "screen",
        "weird",
      ]
    );
  }

  #[test]
  fn unrecognized_contexts_order_by_text() {
    assert_eq!(
      sorted(&["supports(display: grid)", "layer(base)"]),
      vec!["layer(base)", "supports(display: grid)"]
    );
  }
}
