use super::*;

/// The outcome of resolving one raw value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResolutionInfo {
  pub original: String,
  pub resolved: String,
  /// References followed on the way to `resolved`. Empty when the value
  /// resolved to itself.
  pub steps: Vec<String>,
}

impl ResolutionInfo {
  pub fn is_indirect(&self) -> bool {
    !self.steps.is_empty()
  }

  pub(crate) fn normalized(mut self) -> Self {
    if self.resolved == self.original {
      self.steps.clear();
    }

    self
  }

  pub fn unresolved(value: &str) -> Self {
    Self {
      original: value.to_string(),
      resolved: value.to_string(),
      steps: Vec::new(),
    }
  }
}

/// One context a variable is declared under, with its resolved value.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ContextValue {
  pub comment: String,
  pub context: String,
  pub info: ResolutionInfo,
  pub kind: ValueKind,
}

impl ContextValue {
  pub fn color(&self) -> Option<Color> {
    match self.kind {
      ValueKind::Color => Color::parse(&self.info.resolved),
      _ => None,
    }
  }

  pub fn is_default(&self) -> bool {
    self.context == VariableEntry::DEFAULT_CONTEXT
  }
}

/// Everything known about a variable in one scope, contexts in rank order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Resolution {
  pub doc: Option<DocComment>,
  pub name: String,
  pub values: Vec<ContextValue>,
}

impl Resolution {
  /// The value under the default context, or the highest ranked one.
  pub fn default_value(&self) -> Option<&ContextValue> {
    self
      .values
      .iter()
      .find(|value| value.is_default())
      .or_else(|| self.values.first())
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }

  /// Hover text: headline, ranked context table, resolution chains and
  /// examples.
  pub fn markdown(&self) -> String {
    let mut lines = Vec::new();

    let doc = self.doc.clone().unwrap_or_default();

    if doc.name.is_empty() {
      lines.push(format!("`{}`", self.name));
    } else {
      lines.push(format!("**{}** `{}`", doc.name, self.name));
    }

    if !doc.description.is_empty() {
      lines.push(String::new());
      lines.push(doc.description.clone());
    }

    if !self.values.is_empty() {
      lines.push(String::new());
      lines.push("| Context | Value |".into());
      lines.push("|---|---|".into());

      for value in &self.values {
        lines.push(format!(
          "| {} | `{}` |",
          escape_cell(&value.context),
          escape_cell(&value.info.resolved)
        ));
      }
    }

    let chains = self
      .values
      .iter()
      .filter(|value| value.info.is_indirect())
      .collect::<Vec<_>>();

    if !chains.is_empty() {
      lines.push(String::new());
      lines.push("**Resolution**".into());

      for value in chains {
        lines.push(format!(
          "- {}: {}",
          value.context,
          value
            .info
            .steps
            .iter()
            .map(|step| format!("`{step}`"))
            .collect::<Vec<_>>()
            .join(" → ")
        ));
      }
    }

    if !doc.examples.is_empty() {
      lines.push(String::new());
      lines.push("**Examples**".into());

      for example in &doc.examples {
        lines.push(format!("```css\n{example}\n```"));
      }
    }

    lines.join("\n")
  }
}

fn escape_cell(text: &str) -> String {
  text.replace('|', "\\|")
}
