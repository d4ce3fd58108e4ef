use super::*;

static REFERENCE: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"^[@$][A-Za-z_][A-Za-z0-9_-]*$")
    .expect("preprocessor reference pattern is valid")
});

static EXPRESSION: Lazy<Regex> = Lazy::new(|| {
  Regex::new(
    r"^\(\s*([@$][A-Za-z_][A-Za-z0-9_-]*)(?:\s*(\*\*|[*/+%-])|\s+(min|max|floor|ceil|round))(?:\s*([^()\s][^()]*?))?\s*\)$",
  )
  .expect("preprocessor expression pattern is valid")
});

/// A preprocessor variable resolved to a literal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PreprocessorValue {
  /// Texts passed through between the variable and `value`: referenced
  /// variable names and evaluated expressions, in order.
  pub chain: Vec<String>,
  pub value: String,
}

impl PreprocessorValue {
  fn literal(value: &str) -> Self {
    Self {
      chain: Vec::new(),
      value: value.to_string(),
    }
  }
}

/// Resolves `@less` and `$scss` variables to literals, evaluating one level
/// of arithmetic such as `(@base * 2)` or `($size floor)`.
pub struct PreprocessorResolver<'a> {
  cache: &'a ResolutionCache,
  max_depth: usize,
  scope: &'a [PathBuf],
  scope_key: ScopeKey,
  store: &'a dyn IndexStore,
  token: &'a CancellationToken,
}

impl<'a> PreprocessorResolver<'a> {
  fn apply(operator: &str, left: f64, right: Option<f64>) -> Option<f64> {
    let result = match (operator, right) {
      ("floor", _) => left.floor(),
      ("ceil", _) => left.ceil(),
      ("round", _) => left.round(),
      ("*", Some(right)) => left * right,
      ("/", Some(right)) if right != 0.0 => left / right,
      ("+", Some(right)) => left + right,
      ("-", Some(right)) => left - right,
      ("%", Some(right)) if right != 0.0 => left % right,
      ("**", Some(right)) => left.powf(right),
      ("min", Some(right)) => left.min(right),
      ("max", Some(right)) => left.max(right),
      _ => return None,
    };

    result.is_finite().then_some(result)
  }

  /// Declarations of `name` in scope, default contexts first.
  fn entries(&self, name: &str) -> Vec<VariableEntry> {
    let mut entries = self.store.entries(name, self.scope);
    entries.sort_by_key(|entry| !entry.is_default());
    entries
  }

  /// Evaluates an arithmetic expression such as `(@base * 2)`. Returns
  /// `None` when `expression` is not one or cannot be evaluated.
  pub fn evaluate(
    &self,
    expression: &str,
  ) -> Result<Option<PreprocessorValue>, Cancelled> {
    if !Self::is_expression(expression) {
      return Ok(None);
    }

    self.resolve_value(expression, &mut HashSet::new(), 0)
  }

  fn evaluate_expression(
    &self,
    expression: &str,
    visited: &mut HashSet<String>,
    depth: usize,
  ) -> Result<Option<String>, Cancelled> {
    let Some(captures) = EXPRESSION.captures(expression) else {
      return Ok(None);
    };

    let Some(operator) = captures.get(2).or_else(|| captures.get(3)) else {
      return Ok(None);
    };

    let Some(base) = self.resolve_variable(&captures[1], visited, depth + 1)?
    else {
      return Ok(None);
    };

    let Some((left, base_unit)) = split_dimension(&base.value) else {
      return Ok(None);
    };

    let mut unit = base_unit.to_string();

    let right = match captures.get(4).map(|right| right.as_str().trim()) {
      Some(right) => {
        let right = if Self::is_reference(right) {
          match self.resolve_variable(right, visited, depth + 1)? {
            Some(resolved) => resolved.value,
            None => return Ok(None),
          }
        } else {
          right.to_string()
        };

        let Some((magnitude, right_unit)) = split_dimension(&right) else {
          return Ok(None);
        };

        if unit.is_empty() {
          unit = right_unit.to_string();
        }

        Some(magnitude)
      }
      None => None,
    };

    Ok(
      Self::apply(operator.as_str(), left, right)
        .map(|result| format!("{}{unit}", format_number(result))),
    )
  }

  pub fn is_expression(text: &str) -> bool {
    EXPRESSION.is_match(text.trim())
  }

  pub fn is_reference(text: &str) -> bool {
    REFERENCE.is_match(text.trim())
  }

  pub fn new(
    store: &'a dyn IndexStore,
    scope: &'a [PathBuf],
    scope_key: ScopeKey,
    cache: &'a ResolutionCache,
    max_depth: usize,
    token: &'a CancellationToken,
  ) -> Self {
    Self {
      cache,
      max_depth,
      scope,
      scope_key,
      store,
      token,
    }
  }

  /// Resolves `name` from a fresh visited set.
  pub fn resolve(
    &self,
    name: &str,
  ) -> Result<Option<PreprocessorValue>, Cancelled> {
    self.resolve_variable(name, &mut HashSet::new(), 0)
  }

  fn resolve_value(
    &self,
    raw: &str,
    visited: &mut HashSet<String>,
    depth: usize,
  ) -> Result<Option<PreprocessorValue>, Cancelled> {
    let raw = raw.trim();

    if Self::is_expression(raw) {
      return Ok(self.evaluate_expression(raw, visited, depth)?.map(|value| {
        PreprocessorValue {
          chain: vec![raw.to_string()],
          value,
        }
      }));
    }

    if Self::is_reference(raw) {
      return Ok(Some(
        match self.resolve_variable(raw, visited, depth + 1)? {
          Some(inner) => PreprocessorValue {
            chain: iter::once(raw.to_string()).chain(inner.chain).collect(),
            value: inner.value,
          },
          None => PreprocessorValue::literal(raw),
        },
      ));
    }

    Ok(Some(PreprocessorValue::literal(raw)))
  }

  /// Resolves `name` to a literal, or `None` when it is undefined, cyclic,
  /// too deep, or every declaration fails to evaluate.
  ///
  /// `visited` holds the names on the current resolution path. Results are
  /// memoized per scope, but only for calls starting from an empty path,
  /// since a cycle-blocked result depends on how it was reached.
  pub fn resolve_variable(
    &self,
    name: &str,
    visited: &mut HashSet<String>,
    depth: usize,
  ) -> Result<Option<PreprocessorValue>, Cancelled> {
    self.token.check()?;

    if depth > self.max_depth || visited.contains(name) {
      return Ok(None);
    }

    let memoize = visited.is_empty() && depth == 0;

    if memoize {
      if let Some(cached) = self.cache.preprocessor(self.scope_key, name) {
        return Ok(cached);
      }
    }

    visited.insert(name.to_string());

    let mut resolved = Ok(None);

    for entry in self.entries(name) {
      resolved = self.resolve_value(&entry.raw_value, visited, depth);

      if !matches!(resolved, Ok(None)) {
        break;
      }
    }

    visited.remove(name);

    let resolved = resolved?;

    if memoize {
      self
        .cache
        .insert_preprocessor(self.scope_key, name, resolved.clone());
    }

    Ok(resolved)
  }
}
