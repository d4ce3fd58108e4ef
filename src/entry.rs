use super::*;

const FIELD_SEPARATOR: char = '\u{1F}';

const ENTRY_SEPARATOR: char = '\u{1E}';

/// One declaration of a variable inside one context of one file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VariableEntry {
  pub comment: String,
  pub context: String,
  pub raw_value: String,
}

impl VariableEntry {
  pub const DEFAULT_CONTEXT: &'static str = "default";

  /// Decodes the store representation written by [`VariableEntry::encode`].
  /// Malformed records are dropped.
  pub fn decode(encoded: &str) -> Vec<Self> {
    encoded
      .split(ENTRY_SEPARATOR)
      .filter(|record| !record.is_empty())
      .filter_map(|record| {
        let mut fields = record.split(FIELD_SEPARATOR);

        let context = fields.next()?;
        let raw_value = fields.next()?;
        let comment = fields.next().unwrap_or_default();

        Some(Self {
          comment: comment.to_string(),
          context: context.to_string(),
          raw_value: raw_value.to_string(),
        })
      })
      .collect()
  }

  /// Encodes every entry one file contributes for one key.
  pub fn encode(entries: &[Self]) -> String {
    entries
      .iter()
      .map(|entry| {
        [
          Self::sanitize(&entry.context),
          Self::sanitize(&entry.raw_value),
          Self::sanitize(&entry.comment),
        ]
        .join(&FIELD_SEPARATOR.to_string())
      })
      .collect::<Vec<_>>()
      .join(&ENTRY_SEPARATOR.to_string())
  }

  pub fn is_default(&self) -> bool {
    self.context == Self::DEFAULT_CONTEXT
  }

  pub fn new(context: &str, raw_value: &str, comment: &str) -> Self {
    Self {
      comment: comment.to_string(),
      context: context.to_string(),
      raw_value: raw_value.to_string(),
    }
  }

  fn sanitize(field: &str) -> String {
    field.replace([FIELD_SEPARATOR, ENTRY_SEPARATOR], " ")
  }
}
