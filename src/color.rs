use super::*;

/// An sRGB color parsed from any CSS color syntax the classifier accepts:
/// hex (`#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`), `rgb()`/`rgba()`,
/// `hsl()`/`hsla()`, `hwb()` in comma or space/slash form, and named colors.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
  pub alpha: f32,
  pub blue: u8,
  pub green: u8,
  pub red: u8,
}

impl Color {
  pub fn parse(value: &str) -> Option<Self> {
    let value = value.trim();

    if value.is_empty() {
      return None;
    }

    // The underlying parser also accepts hex digits without a leading `#`,
    // which would turn words like `bad` or `cafe` into colors.
    if !value.starts_with('#')
      && value.chars().all(|character| character.is_ascii_hexdigit())
    {
      return None;
    }

    let parsed = value.parse::<csscolorparser::Color>().ok()?;

    let [red, green, blue, _] = parsed.to_rgba8();

    Some(Self {
      alpha: parsed.a.clamp(0.0, 1.0),
      blue,
      green,
      red,
    })
  }

  /// Uppercase `#RRGGBB`; the alpha channel is dropped.
  pub fn to_hex(self) -> String {
    format!("#{:02X}{:02X}{:02X}", self.red, self.green, self.blue)
  }
}

impl Display for Color {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    if self.alpha < 1.0 {
      write!(
        f,
        "rgba({}, {}, {}, {})",
        self.red,
        self.green,
        self.blue,
        format_number(f64::from(self.alpha))
      )
    } else {
      f.write_str(&self.to_hex())
    }
  }
}
