//! Bridges `ropey::Rope` with Language Server Protocol positions, whose
//! columns count UTF-16 code units.

use super::*;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Edit<'a> {
  pub(crate) end_char: usize,
  pub(crate) start_char: usize,
  pub(crate) text: &'a str,
}

pub(crate) trait RopeExt {
  fn apply_edit(&mut self, edit: &Edit);
  fn build_edit<'a>(
    &self,
    change: &'a lsp::TextDocumentContentChangeEvent,
  ) -> Edit<'a>;
  fn byte_to_lsp_position(&self, offset: usize) -> lsp::Position;
  fn lsp_position_to_char(&self, position: lsp::Position) -> usize;
}

impl RopeExt for Rope {
  fn apply_edit(&mut self, edit: &Edit) {
    self.remove(edit.start_char..edit.end_char);

    if !edit.text.is_empty() {
      self.insert(edit.start_char, edit.text);
    }
  }

  /// Converts a `textDocument/didChange` event into char offsets. A change
  /// without a range replaces the whole document.
  fn build_edit<'a>(
    &self,
    change: &'a lsp::TextDocumentContentChangeEvent,
  ) -> Edit<'a> {
    let (start_char, end_char) = match change.range {
      Some(range) => (
        self.lsp_position_to_char(range.start),
        self.lsp_position_to_char(range.end),
      ),
      None => (0, self.len_chars()),
    };

    Edit {
      end_char: end_char.max(start_char),
      start_char,
      text: &change.text,
    }
  }

  fn byte_to_lsp_position(&self, byte_idx: usize) -> lsp::Position {
    let byte_idx = byte_idx.min(self.len_bytes());

    let line_idx = self.byte_to_line(byte_idx);

    let line_utf16_cu_idx = self.char_to_utf16_cu(self.line_to_char(line_idx));

    let char_utf16_cu_idx = self.char_to_utf16_cu(self.byte_to_char(byte_idx));

    lsp::Position::new(
      u32::try_from(line_idx).unwrap_or(u32::MAX),
      u32::try_from(char_utf16_cu_idx - line_utf16_cu_idx).unwrap_or(u32::MAX),
    )
  }

  /// Clamps positions past the end of a line or of the document.
  fn lsp_position_to_char(&self, position: lsp::Position) -> usize {
    let line_idx = position.line as usize;

    if line_idx >= self.len_lines() {
      return self.len_chars();
    }

    let line_char_idx = self.line_to_char(line_idx);

    let line_end_char_idx = if line_idx + 1 < self.len_lines() {
      self.line_to_char(line_idx + 1)
    } else {
      self.len_chars()
    };

    let utf16_cu_idx =
      self.char_to_utf16_cu(line_char_idx) + position.character as usize;

    self
      .utf16_cu_to_char(utf16_cu_idx.min(self.len_utf16_cu()))
      .min(line_end_char_idx)
  }
}

#[cfg(test)]
mod tests {
  use {super::*, pretty_assertions::assert_eq};

  type Range = (u32, u32, u32, u32);

  fn change(
    text: &str,
    (start_line, start_character, end_line, end_character): Range,
  ) -> lsp::TextDocumentContentChangeEvent {
    lsp::TextDocumentContentChangeEvent {
      range: Some(lsp::Range {
        start: lsp::Position::new(start_line, start_character),
        end: lsp::Position::new(end_line, end_character),
      }),
      range_length: None,
      text: text.into(),
    }
  }

  #[test]
  fn apply_insert_into_empty_document() {
    let mut rope = Rope::from_str("");

    let change = change("--a\n--b", (0, 0, 0, 0));

    let edit = rope.build_edit(&change);

    assert_eq!(
      edit,
      Edit {
        end_char: 0,
        start_char: 0,
        text: "--a\n--b",
      }
    );

    rope.apply_edit(&edit);

    assert_eq!(rope.to_string(), "--a\n--b");
  }

  #[test]
  fn replace_value() {
    let mut rope = Rope::from_str("--gap: 4px;");

    let change = change("8px", (0, 7, 0, 10));

    let edit = rope.build_edit(&change);

    rope.apply_edit(&edit);

    assert_eq!(rope.to_string(), "--gap: 8px;");
  }

  #[test]
  fn columns_count_utf16_code_units() {
    let mut rope = Rope::from_str("a\u{1F60A}b");

    let change = change("", (0, 1, 0, 3));

    let edit = rope.build_edit(&change);

    assert_eq!(
      edit,
      Edit {
        end_char: 2,
        start_char: 1,
        text: "",
      }
    );

    rope.apply_edit(&edit);

    assert_eq!(rope.to_string(), "ab");
  }

  #[test]
  fn multiline_edit() {
    let mut rope = Rope::from_str("foo\u{1F60A}\nbar");

    let change = change("XX", (0, 2, 1, 1));

    let edit = rope.build_edit(&change);

    rope.apply_edit(&edit);

    assert_eq!(rope.to_string(), "foXXar");
  }

  #[test]
  fn replace_entire_document_without_range() {
    let mut rope = Rope::from_str("--a: 1px;");

    let change = lsp::TextDocumentContentChangeEvent {
      range: None,
      range_length: None,
      text: "--b: 2px;".into(),
    };

    let edit = rope.build_edit(&change);

    rope.apply_edit(&edit);

    assert_eq!(rope.to_string(), "--b: 2px;");
  }

  #[test]
  fn byte_offsets_map_to_utf16_positions() {
    let rope = Rope::from_str("a\u{1F60A}b\nsecond");

    assert_eq!(rope.byte_to_lsp_position(5), lsp::Position::new(0, 3));
    assert_eq!(rope.byte_to_lsp_position(7), lsp::Position::new(1, 0));
  }

  #[test]
  fn positions_past_line_end_are_clamped() {
    let rope = Rope::from_str("ab\ncd");

    assert_eq!(rope.lsp_position_to_char(lsp::Position::new(0, 40)), 3);
    assert_eq!(rope.lsp_position_to_char(lsp::Position::new(9, 0)), 5);
  }
}
