use super::*;

static VARIABLE_TOKEN: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"--[A-Za-z0-9_-]+|[@$][A-Za-z_][A-Za-z0-9_-]*")
    .expect("variable token pattern is valid")
});

/// An open editor buffer.
#[derive(Debug)]
pub struct Document {
  pub(crate) content: Rope,
  pub(crate) uri: lsp::Url,
  pub(crate) version: i32,
}

impl From<lsp::DidOpenTextDocumentParams> for Document {
  fn from(params: lsp::DidOpenTextDocumentParams) -> Self {
    let lsp::TextDocumentItem {
      text, uri, version, ..
    } = params.text_document;

    Self {
      content: Rope::from_str(&text),
      uri,
      version,
    }
  }
}

impl Document {
  pub(crate) fn apply_change(
    &mut self,
    params: lsp::DidChangeTextDocumentParams,
  ) {
    let lsp::DidChangeTextDocumentParams {
      content_changes,
      text_document: lsp::VersionedTextDocumentIdentifier { version, .. },
    } = params;

    self.version = version;

    for change in content_changes {
      let edit = self.content.build_edit(&change);
      self.content.apply_edit(&edit);
    }
  }

  pub(crate) fn path(&self) -> Option<PathBuf> {
    self.uri.to_file_path().ok()
  }

  pub(crate) fn text(&self) -> String {
    self.content.to_string()
  }

  /// The variable name under `position`, with its range. A cursor right
  /// after the last character still counts.
  pub(crate) fn variable_at(
    &self,
    position: lsp::Position,
  ) -> Option<(String, lsp::Range)> {
    let line_idx = position.line as usize;

    if line_idx >= self.content.len_lines() {
      return None;
    }

    let line = self.content.line(line_idx).to_string();

    let line_byte = self.content.line_to_byte(line_idx);

    let cursor =
      self.content.char_to_byte(self.content.lsp_position_to_char(position))
        - line_byte;

    VARIABLE_TOKEN
      .find_iter(&line)
      .find(|token| token.start() <= cursor && cursor <= token.end())
      .map(|token| {
        (
          token.as_str().to_string(),
          lsp::Range {
            start: self.content.byte_to_lsp_position(line_byte + token.start()),
            end: self.content.byte_to_lsp_position(line_byte + token.end()),
          },
        )
      })
  }
}
