use super::*;

/// Declarations of one file, keyed by variable name (sigil included), in
/// first-seen order. Each name holds at most one entry per context.
pub type VariableIndex = IndexMap<String, Vec<VariableEntry>>;

static CONTEXT_HEADER: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"@(media|supports|container|layer)\b([^{]*)\{")
    .expect("context header pattern is valid")
});

static CUSTOM_PROPERTY: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"(?:^|[\s;{])(--[A-Za-z0-9_-]+)\s*:\s*([^;{}]*[^;{}\s])\s*;")
    .expect("custom property pattern is valid")
});

static PREPROCESSOR_VARIABLE: Lazy<Regex> = Lazy::new(|| {
  Regex::new(
    r"(?:^|[\s;{])([@$][A-Za-z_][A-Za-z0-9_-]*)\s*:\s*([^;{}]*[^;{}\s])\s*;",
  )
  .expect("preprocessor variable pattern is valid")
});

static PREPROCESSOR_FLAGS: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"(?:\s*!(?:default|global))+$")
    .expect("preprocessor flag pattern is valid")
});

static BLOCK_COMMENT: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"(?s)/\*.*?\*/").expect("block comment pattern is valid")
});

static LINE_COMMENT: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"(?m)^\s*//.*$").expect("line comment pattern is valid")
});

static IMPORT_STATEMENT: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"@(?:import|use|forward)\b\s*(?:\([^)]*\)\s*)?([^;\n]*)")
    .expect("import statement pattern is valid")
});

static IMPORT_TOKEN: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r#"url\(\s*["']?([^"')\s]+)["']?\s*\)|["']([^"']+)["']"#)
    .expect("import token pattern is valid")
});

/// Which declarations an indexer extracts. Both kinds share the context and
/// comment tracking; they differ in the declaration pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IndexKind {
  CustomProperty,
  Preprocessor,
}

impl IndexKind {
  /// The index a variable name belongs to, judged by its sigil.
  pub fn of(name: &str) -> Option<Self> {
    if name.starts_with("--") {
      Some(Self::CustomProperty)
    } else if name.starts_with(['@', '$']) {
      Some(Self::Preprocessor)
    } else {
      None
    }
  }
}

#[derive(Clone, Copy, Debug)]
pub struct Indexer {
  kind: IndexKind,
}

impl Indexer {
  pub fn custom_properties() -> Self {
    Self {
      kind: IndexKind::CustomProperty,
    }
  }

  /// Import targets named by `@import`, `@use` and `@forward` statements, in
  /// source order. Remote URLs and built-in `sass:` modules are skipped.
  pub fn imports(text: &str) -> Vec<String> {
    let text = BLOCK_COMMENT.replace_all(text, " ");
    let text = LINE_COMMENT.replace_all(&text, "");

    IMPORT_STATEMENT
      .captures_iter(&text)
      .filter_map(|statement| statement.get(1))
      .flat_map(|arguments| {
        IMPORT_TOKEN
          .captures_iter(arguments.as_str())
          .filter_map(|token| token.get(1).or_else(|| token.get(2)))
          .map(|token| token.as_str().trim().to_string())
          .collect::<Vec<_>>()
      })
      .filter(|token| {
        !token.is_empty()
          && !["http://", "https://", "//", "sass:"]
            .iter()
            .any(|prefix| token.starts_with(prefix))
      })
      .collect()
  }

  pub fn index(&self, text: &str) -> VariableIndex {
    let mut scan = Scan::default();

    for line in text.lines() {
      let code = scan.strip_comments(line);
      scan.statements(code.trim(), self.kind);
    }

    scan.index
  }

  pub fn preprocessor() -> Self {
    Self {
      kind: IndexKind::Preprocessor,
    }
  }
}

#[derive(Default)]
struct Scan {
  comment: Option<Vec<String>>,
  contexts: Vec<String>,
  index: VariableIndex,
  pending_comment: Option<String>,
}

impl Scan {
  fn context(&self) -> &str {
    self
      .contexts
      .last()
      .map_or(VariableEntry::DEFAULT_CONTEXT, String::as_str)
  }

  fn context_from_header(keyword: &str, header: &str) -> String {
    let header = header.trim();

    if header.is_empty() {
      return keyword.to_string();
    }

    match header
      .strip_prefix('(')
      .and_then(|inner| inner.strip_suffix(')'))
    {
      Some(inner) if !inner.contains(['(', ')']) => inner.trim().to_string(),
      _ => header.to_string(),
    }
  }

  fn declare(&mut self, kind: IndexKind, name: &str, value: &str) {
    let value = match kind {
      IndexKind::CustomProperty => value.trim(),
      IndexKind::Preprocessor => {
        PREPROCESSOR_FLAGS.find(value).map_or(value, |flags| {
          value[..flags.start()].trim()
        })
      }
    };

    if value.is_empty() {
      return;
    }

    let comment = self.pending_comment.take().unwrap_or_default();

    let entry = VariableEntry::new(self.context(), value, &comment);

    let entries = self.index.entry(name.to_string()).or_default();

    match entries
      .iter_mut()
      .find(|existing| existing.context == entry.context)
    {
      Some(existing) => *existing = entry,
      None => entries.push(entry),
    }
  }

  fn declarations(&mut self, code: &str, kind: IndexKind) {
    let pattern = match kind {
      IndexKind::CustomProperty => &CUSTOM_PROPERTY,
      IndexKind::Preprocessor => &PREPROCESSOR_VARIABLE,
    };

    for captures in pattern.captures_iter(code) {
      self.declare(kind, &captures[1], &captures[2]);
    }
  }

  fn statements(&mut self, code: &str, kind: IndexKind) {
    if code.is_empty() {
      return;
    }

    if code == "}" {
      self.contexts.pop();
      return;
    }

    if let Some(header) = CONTEXT_HEADER.captures(code) {
      let (keyword, header_text) = (&header[1], &header[2]);

      self
        .contexts
        .push(Self::context_from_header(keyword, header_text));

      let body = &code[header.get(0).map_or(code.len(), |m| m.end())..];

      self.declarations(body, kind);

      if body.contains('}') {
        self.contexts.pop();
      }

      return;
    }

    self.declarations(code, kind);
  }

  /// Returns the part of `line` outside block comments, recording completed
  /// comments as the pending documentation for the next declaration.
  fn strip_comments(&mut self, line: &str) -> String {
    let mut code = String::new();

    let mut rest = line;

    loop {
      if let Some(buffer) = self.comment.as_mut() {
        match rest.find("*/") {
          Some(end) => {
            buffer.push(rest[..end].to_string());

            let comment = buffer.join("\n").trim().to_string();

            self.pending_comment = Some(comment);
            self.comment = None;

            rest = &rest[end + 2..];
          }
          None => {
            buffer.push(rest.to_string());
            break;
          }
        }
      } else {
        match rest.find("/*") {
          Some(start) => {
            code.push_str(&rest[..start]);
            code.push(' ');

            rest = &rest[start + 2..];

            if rest.starts_with('*') && !rest.starts_with("*/") {
              rest = &rest[1..];
            }

            self.comment = Some(Vec::new());
          }
          None => {
            code.push_str(rest);
            break;
          }
        }
      }
    }

    code
  }
}
