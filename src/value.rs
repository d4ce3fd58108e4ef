use super::*;

static DIMENSION: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"^(-?(?:\d+\.?\d*|\.\d+))([a-zA-Z%]*)$")
    .expect("dimension pattern is valid")
});

const SIZE_UNITS: &[&str] = &[
  "px", "rem", "em", "%", "vh", "vw", "pt", "pc", "ch", "ex", "cm", "mm",
  "in", "vmin", "vmax",
];

/// Semantic category of a terminal value, used for ranking and for choosing
/// how a value is presented.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
  Color,
  Size,
  Number,
  Other,
}

impl ValueKind {
  pub fn of(value: &str) -> Self {
    if is_size(value) {
      Self::Size
    } else if is_number(value) {
      Self::Number
    } else if Color::parse(value).is_some() {
      Self::Color
    } else {
      Self::Other
    }
  }
}

impl Display for ValueKind {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    f.write_str(match self {
      Self::Color => "color",
      Self::Size => "size",
      Self::Number => "number",
      Self::Other => "other",
    })
  }
}

/// Splits `12.5px` into `(12.5, "px")`. Bare numbers yield an empty unit.
pub(crate) fn split_dimension(value: &str) -> Option<(f64, &str)> {
  let captures = DIMENSION.captures(value.trim())?;

  let magnitude = captures.get(1)?.as_str().parse::<f64>().ok()?;

  Some((magnitude, captures.get(2).map_or("", |unit| unit.as_str())))
}

/// Pixel multiplier for a unit, under fixed viewport and font assumptions
/// (16px root font, 1366x768 viewport).
pub(crate) fn unit_to_pixels(unit: &str) -> f64 {
  match unit.to_ascii_lowercase().as_str() {
    "rem" | "em" | "pc" => 16.0,
    "vh" => 7.68,
    "vw" => 13.66,
    "%" | "vmin" | "vmax" => 10.0,
    "ch" => 8.0,
    "cm" => 37.8,
    "mm" => 3.78,
    "in" => 96.0,
    "pt" => 1.33,
    _ => 1.0,
  }
}

pub fn is_size(value: &str) -> bool {
  split_dimension(value).is_some_and(|(_, unit)| {
    SIZE_UNITS.contains(&unit.to_ascii_lowercase().as_str())
  })
}

pub fn is_number(value: &str) -> bool {
  split_dimension(value).is_some_and(|(_, unit)| unit.is_empty())
}

pub fn convert_to_pixels(value: &str) -> Option<f64> {
  let (magnitude, unit) = split_dimension(value)?;
  Some(magnitude * unit_to_pixels(unit))
}

/// Orders two sizes by their pixel value. Values that are not sizes compare
/// as zero pixels.
pub fn compare_sizes(a: &str, b: &str) -> Ordering {
  let (a, b) = (
    convert_to_pixels(a).unwrap_or_default(),
    convert_to_pixels(b).unwrap_or_default(),
  );

  a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Renders a number the way stylesheet authors write it: integral values
/// without a decimal point, everything else with at most three decimals.
pub(crate) fn format_number(value: f64) -> String {
  if value.fract() == 0.0 {
    return format!("{value:.0}");
  }

  let formatted = format!("{value:.3}");

  let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');

  if trimmed == "-0" {
    "0".to_string()
  } else {
    trimmed.to_string()
  }
}
