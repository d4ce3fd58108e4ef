use super::*;

/// Documentation attached to a declaration through a preceding block comment.
///
/// Recognized tags are `@name`, `@description` and `@example`; text before
/// the first tag counts as description, and untagged lines continue whichever
/// tag precedes them. Unknown tags are ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DocComment {
  pub description: String,
  pub examples: Vec<String>,
  pub name: String,
}

#[derive(Clone, Copy, PartialEq)]
enum Section {
  Description,
  Example,
  Ignored,
  Name,
}

impl DocComment {
  pub fn is_empty(&self) -> bool {
    self.name.is_empty()
      && self.description.is_empty()
      && self.examples.is_empty()
  }

  pub fn parse(comment: &str) -> Self {
    let mut doc = Self::default();

    let mut section = Section::Description;

    for line in comment.lines() {
      let line = line.trim().trim_start_matches('*').trim();

      if line.is_empty() {
        continue;
      }

      let text = if let Some(rest) = line.strip_prefix('@') {
        let (tag, rest) = rest
          .split_once(char::is_whitespace)
          .unwrap_or((rest, ""));

        section = match tag {
          "name" => Section::Name,
          "description" => Section::Description,
          "example" => {
            doc.examples.push(String::new());
            Section::Example
          }
          _ => Section::Ignored,
        };

        rest.trim()
      } else {
        line
      };

      if text.is_empty() {
        continue;
      }

      let target = match section {
        Section::Name => &mut doc.name,
        Section::Description => &mut doc.description,
        Section::Example => match doc.examples.last_mut() {
          Some(example) => example,
          None => continue,
        },
        Section::Ignored => continue,
      };

      if !target.is_empty() {
        target.push(if section == Section::Example { '\n' } else { ' ' });
      }

      target.push_str(text);
    }

    doc.examples.retain(|example| !example.is_empty());

    doc
  }
}

#[cfg(test)]
mod tests {
  use {super::*, indoc::indoc, pretty_assertions::assert_eq};

  #[test]
  fn parses_tags() {
    assert_eq!(
      DocComment::parse("@name Primary\n@description Brand color"),
      DocComment {
        name: "Primary".into(),
        description: "Brand color".into(),
        examples: Vec::new(),
      }
    );
  }

  #[test]
  fn untagged_text_is_description() {
    let doc = DocComment::parse("The main spacing unit.");

    assert_eq!(doc.description, "The main spacing unit.");
    assert!(doc.name.is_empty());
  }

  #[test]
  fn strips_leading_stars_and_joins_continuations() {
    let doc = DocComment::parse(indoc! {"
      * @name Gutter
      * @description Horizontal space
      * between columns.
      * @example margin: var(--gutter);
      * @example padding: var(--gutter);
      *   gap: var(--gutter);
      * @since 2.0
    "});

    assert_eq!(doc.name, "Gutter");
    assert_eq!(doc.description, "Horizontal space between columns.");
    assert_eq!(
      doc.examples,
      vec![
        "margin: var(--gutter);",
        "padding: var(--gutter);\ngap: var(--gutter);",
      ]
    );
  }

  #[test]
  fn empty_comment() {
    assert!(DocComment::parse("").is_empty());
    assert!(DocComment::parse("  *  \n *").is_empty());
  }
}
