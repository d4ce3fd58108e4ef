use super::*;

static VAR_REFERENCE: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"^var\(\s*(--[A-Za-z0-9_-]+)\s*(?:,\s*(.*?))?\s*\)$")
    .expect("var reference pattern is valid")
});

/// Resolves variables of one project against one effective scope.
///
/// Custom properties follow `var(--x)` references through their default
/// declarations, preprocessor variables are handed to
/// [`PreprocessorResolver`], and every hop is recorded as a step. Cycles and
/// chains deeper than the configured bound stop where they are and come back
/// unresolved. Only cancellation is reported as an error.
pub struct Resolver<'a> {
  max_depth: usize,
  preprocessor: PreprocessorResolver<'a>,
  project: &'a Project,
  scope: &'a Scope,
  token: &'a CancellationToken,
}

impl<'a> Resolver<'a> {
  /// Collapses entries that share a context, keeping the last one.
  fn collapse(entries: Vec<VariableEntry>) -> IndexMap<String, VariableEntry> {
    let mut collapsed = IndexMap::new();

    for entry in entries {
      collapsed.insert(entry.context.clone(), entry);
    }

    collapsed
  }

  /// First value with a comment, else the default one, else the first.
  fn doc_source(values: &[ContextValue]) -> Option<&ContextValue> {
    values
      .iter()
      .find(|value| !value.comment.trim().is_empty())
      .or_else(|| values.iter().find(|value| value.is_default()))
      .or_else(|| values.first())
  }

  fn entries(&self, name: &str) -> Vec<VariableEntry> {
    match IndexKind::of(name) {
      Some(IndexKind::CustomProperty) => self
        .project
        .custom_properties()
        .entries(name, &self.scope.files),
      Some(IndexKind::Preprocessor) => self
        .project
        .preprocessor_variables()
        .entries(name, &self.scope.files),
      None => Vec::new(),
    }
  }

  /// Follows `value` to a terminal literal.
  fn follow(
    &self,
    value: &str,
    visited: &mut HashSet<String>,
    depth: usize,
  ) -> Result<ResolutionInfo, Cancelled> {
    self.token.check()?;

    let unresolved = ResolutionInfo::unresolved(value);

    if depth > self.max_depth {
      return Ok(unresolved);
    }

    if let Some(captures) = VAR_REFERENCE.captures(value) {
      let name = &captures[1];

      if visited.contains(name) {
        return Ok(unresolved);
      }

      let next = match self.lookup(name) {
        Some(entry) => {
          visited.insert(name.to_string());
          entry.raw_value
        }
        None => match captures.get(2).map(|fallback| fallback.as_str()) {
          Some(fallback) if !fallback.is_empty() => fallback.to_string(),
          _ => return Ok(unresolved),
        },
      };

      let inner = self.follow(next.trim(), visited, depth + 1)?;

      if Self::is_dead_end(&inner.resolved) {
        return Ok(unresolved);
      }

      return Ok(Self::splice(value, vec![value.to_string()], inner));
    }

    if PreprocessorResolver::is_expression(value) {
      return Ok(match self.preprocessor.evaluate(value)? {
        Some(evaluated) => ResolutionInfo {
          original: value.to_string(),
          steps: evaluated
            .chain
            .into_iter()
            .chain(iter::once(evaluated.value.clone()))
            .collect(),
          resolved: evaluated.value,
        },
        None => unresolved,
      });
    }

    if PreprocessorResolver::is_reference(value) {
      let Some(resolved) = self.preprocessor.resolve(value)? else {
        return Ok(unresolved);
      };

      if PreprocessorResolver::is_reference(&resolved.value) {
        return Ok(unresolved);
      }

      let prefix = iter::once(value.to_string())
        .chain(resolved.chain)
        .collect::<Vec<_>>();

      if VAR_REFERENCE.is_match(&resolved.value) {
        let inner = self.follow(&resolved.value, visited, depth + 1)?;

        if Self::is_dead_end(&inner.resolved) {
          return Ok(unresolved);
        }

        return Ok(Self::splice(value, prefix, inner));
      }

      return Ok(ResolutionInfo {
        original: value.to_string(),
        steps: prefix
          .into_iter()
          .chain(iter::once(resolved.value.clone()))
          .collect(),
        resolved: resolved.value,
      });
    }

    Ok(unresolved)
  }

  /// Whether a chain stopped at a `var()` it could not follow: an undefined
  /// name, a cycle, or the depth bound.
  fn is_dead_end(resolved: &str) -> bool {
    VAR_REFERENCE.is_match(resolved)
  }

  /// The default declaration of a custom property, or its first one.
  fn lookup(&self, name: &str) -> Option<VariableEntry> {
    let entries = self
      .project
      .custom_properties()
      .entries(name, &self.scope.files);

    entries
      .iter()
      .rev()
      .find(|entry| entry.is_default())
      .or_else(|| entries.first())
      .cloned()
  }

  pub fn new(
    project: &'a Project,
    scope: &'a Scope,
    token: &'a CancellationToken,
  ) -> Self {
    let max_depth = project.settings().max_resolution_depth;

    Self {
      max_depth,
      preprocessor: PreprocessorResolver::new(
        project.preprocessor_variables(),
        &scope.files,
        scope.key,
        project.cache(),
        max_depth,
        token,
      ),
      project,
      scope,
      token,
    }
  }

  /// Every context `name` is declared under, resolved and ranked.
  pub fn resolve(&self, name: &str) -> Result<Resolution, Cancelled> {
    self.token.check()?;

    let mut values = Vec::new();

    for (context, entry) in Self::collapse(self.entries(name)) {
      let info = self.resolve_value(name, &entry.raw_value)?;

      values.push(ContextValue {
        comment: entry.comment,
        context,
        kind: ValueKind::of(&info.resolved),
        info,
      });
    }

    values.sort_by_cached_key(|value| RankKey::from_context(&value.context));

    let doc = Self::doc_source(&values)
      .map(|value| DocComment::parse(&value.comment))
      .filter(|doc| !doc.is_empty());

    log::debug!("resolved `{name}` in {} contexts", values.len());

    Ok(Resolution {
      doc,
      name: name.to_string(),
      values,
    })
  }

  /// The resolved default value of `name`, or its highest ranked one.
  pub fn resolve_default(
    &self,
    name: &str,
  ) -> Result<Option<ContextValue>, Cancelled> {
    Ok(self.resolve(name)?.default_value().cloned())
  }

  /// Resolves one raw declaration value of `name`.
  pub fn resolve_value(
    &self,
    name: &str,
    raw_value: &str,
  ) -> Result<ResolutionInfo, Cancelled> {
    let mut visited = HashSet::new();

    if IndexKind::of(name) == Some(IndexKind::CustomProperty) {
      visited.insert(name.to_string());
    }

    Ok(self.follow(raw_value.trim(), &mut visited, 0)?.normalized())
  }

  /// Joins the steps before a hop with the steps of what it led to.
  fn splice(
    value: &str,
    prefix: Vec<String>,
    inner: ResolutionInfo,
  ) -> ResolutionInfo {
    let tail = if inner.steps.is_empty() {
      vec![inner.resolved.clone()]
    } else {
      inner.steps
    };

    ResolutionInfo {
      original: value.to_string(),
      resolved: inner.resolved,
      steps: prefix.into_iter().chain(tail).collect(),
    }
  }
}

#[cfg(test)]
mod tests {
  use {super::*, indoc::indoc, pretty_assertions::assert_eq};

  fn project(files: &[(&str, &str)]) -> Project {
    let project = Project::new("/project", Arc::new(OsFileSystem));

    for (path, text) in files {
      project.index_text(Path::new(path), text);
    }

    project
  }

  fn resolve(project: &Project, name: &str) -> Resolution {
    project.resolve(name, &CancellationToken::new()).unwrap()
  }

  fn info(original: &str, resolved: &str, steps: &[&str]) -> ResolutionInfo {
    ResolutionInfo {
      original: original.into(),
      resolved: resolved.into(),
      steps: steps.iter().map(ToString::to_string).collect(),
    }
  }

  #[test]
  fn ranks_contexts_and_parses_documentation() {
    let project = project(&[(
      "/project/theme.css",
      indoc! {"
        :root {
          /** @name Primary
          @description Brand color */
          --primary: #3498db;
        }
        @media (prefers-color-scheme: dark) {
          :root { --primary: #1a5a8a; }
        }
      "},
    )]);

    let resolution = resolve(&project, "--primary");

    assert_eq!(
      resolution
        .values
        .iter()
        .map(|value| (value.context.as_str(), value.info.resolved.as_str()))
        .collect::<Vec<_>>(),
      vec![
        ("default", "#3498db"),
        ("prefers-color-scheme: dark", "#1a5a8a"),
      ]
    );

    let doc = resolution.doc.unwrap();

    assert_eq!(doc.name, "Primary");
    assert_eq!(doc.description, "Brand color");
    assert_eq!(resolution.values[0].kind, ValueKind::Color);
  }

  #[test]
  fn follows_custom_property_references() {
    let project = project(&[(
      "/project/tokens.css",
      indoc! {"
        :root {
          --blue: #3498db;
          --brand: var(--blue);
          --link: var(--brand);
        }
      "},
    )]);

    assert_eq!(
      resolve(&project, "--link").values[0].info,
      info(
        "var(--brand)",
        "#3498db",
        &["var(--brand)", "var(--blue)", "#3498db"]
      )
    );
  }

  #[test]
  fn references_use_the_default_declaration() {
    let project = project(&[(
      "/project/tokens.css",
      indoc! {"
        @media (min-width: 768px) {
          :root { --gap: 32px; }
        }
        :root {
          --gap: 16px;
          --gutter: var(--gap);
        }
      "},
    )]);

    assert_eq!(
      resolve(&project, "--gutter").values[0].info.resolved,
      "16px"
    );
  }

  #[test]
  fn splices_preprocessor_chains() {
    let project = project(&[
      (
        "/project/theme.css",
        ":root {\n  --primary: var(--brand);\n  --brand: @brand-color;\n}",
      ),
      ("/project/vars.less", "@brand-color: @blue;\n@blue: #3498db;"),
    ]);

    assert_eq!(
      resolve(&project, "--primary").values[0].info,
      info(
        "var(--brand)",
        "#3498db",
        &["var(--brand)", "@brand-color", "@blue", "#3498db"]
      )
    );
  }

  #[test]
  fn resolves_preprocessor_variables_by_name() {
    let project = project(&[(
      "/project/vars.scss",
      "$base: 8px;\n$double: ($base * 2);\n$alias: $double;",
    )]);

    assert_eq!(
      resolve(&project, "$double").values[0].info,
      info("($base * 2)", "16px", &["($base * 2)", "16px"])
    );

    assert_eq!(
      resolve(&project, "$alias").values[0].info,
      info("$double", "16px", &["$double", "($base * 2)", "16px"])
    );
  }

  #[test]
  fn direct_cycle_terminates_unresolved() {
    let project = project(&[(
      "/project/cycle.css",
      ":root {\n  --a: var(--b);\n  --b: var(--a);\n}",
    )]);

    assert_eq!(
      resolve(&project, "--a").values[0].info,
      ResolutionInfo::unresolved("var(--b)")
    );
  }

  #[test]
  fn self_reference_terminates_unresolved() {
    let project =
      project(&[("/project/cycle.css", ":root { --a: var(--a); }")]);

    assert_eq!(
      resolve(&project, "--a").values[0].info,
      ResolutionInfo::unresolved("var(--a)")
    );
  }

  #[test]
  fn preprocessor_cycle_terminates_unresolved() {
    let project = project(&[
      ("/project/cycle.less", "@c: @d;\n@d: @c;"),
      ("/project/theme.css", ":root { --x: @c; }"),
    ]);

    assert_eq!(
      resolve(&project, "--x").values[0].info,
      ResolutionInfo::unresolved("@c")
    );
  }

  #[test]
  fn undefined_references_stay_unresolved() {
    let project = project(&[(
      "/project/theme.css",
      ":root {\n  --a: var(--missing);\n  --b: @missing;\n}",
    )]);

    assert_eq!(
      resolve(&project, "--a").values[0].info,
      ResolutionInfo::unresolved("var(--missing)")
    );
    assert_eq!(
      resolve(&project, "--b").values[0].info,
      ResolutionInfo::unresolved("@missing")
    );
  }

  #[test]
  fn chains_ending_at_undefined_names_stay_unresolved() {
    let project = project(&[
      (
        "/project/theme.css",
        ":root {\n  --a: var(--b);\n  --b: var(--c);\n}",
      ),
      ("/project/vars.less", "@accent: var(--c);"),
      ("/project/button.css", ":root { --button: @accent; }"),
    ]);

    assert_eq!(
      resolve(&project, "--a").values[0].info,
      ResolutionInfo::unresolved("var(--b)")
    );
    assert_eq!(
      resolve(&project, "--button").values[0].info,
      ResolutionInfo::unresolved("@accent")
    );
  }

  #[test]
  fn fallback_is_used_for_undefined_references() {
    let project = project(&[(
      "/project/theme.css",
      ":root {\n  --blue: #00f;\n  --a: var(--missing, var(--blue));\n}",
    )]);

    assert_eq!(
      resolve(&project, "--a").values[0].info,
      info(
        "var(--missing, var(--blue))",
        "#00f",
        &["var(--missing, var(--blue))", "var(--blue)", "#00f"]
      )
    );
  }

  #[test]
  fn depth_bound_stops_long_chains() {
    let mut text = String::from(":root {\n  --v0: 1px;\n");

    for i in 1..=6 {
      text.push_str(&format!("  --v{i}: var(--v{});\n", i - 1));
    }

    text.push('}');

    let project = project(&[("/project/chain.css", &text)]);

    project.set_settings(Settings {
      max_resolution_depth: 3,
      ..Settings::default()
    });

    let shallow = resolve(&project, "--v3").values[0].info.clone();

    assert_eq!(shallow.resolved, "1px");

    let deep = resolve(&project, "--v6").values[0].info.clone();

    assert_eq!(deep, ResolutionInfo::unresolved("var(--v5)"));
  }

  #[test]
  fn duplicate_contexts_keep_the_last_file() {
    let project = project(&[
      ("/project/a.css", ":root { --gap: 4px; }"),
      ("/project/b.css", ":root { --gap: 8px; }"),
    ]);

    let resolution = resolve(&project, "--gap");

    assert_eq!(resolution.values.len(), 1);
    assert_eq!(resolution.values[0].info.resolved, "8px");
  }

  #[test]
  fn documentation_falls_back_to_default_entry() {
    let project = project(&[(
      "/project/theme.css",
      indoc! {"
        @media print {
          :root { --ink: black; }
        }
        :root {
          /* Body text color */
          --ink: #222;
        }
      "},
    )]);

    let resolution = resolve(&project, "--ink");

    assert_eq!(
      resolution.doc.map(|doc| doc.description),
      Some("Body text color".to_string())
    );
    assert_eq!(resolution.values[1].context, "print");
  }

  #[test]
  fn unknown_names_resolve_to_nothing() {
    let project = project(&[("/project/theme.css", ":root { --a: 1px; }")]);

    assert!(resolve(&project, "--b").is_empty());
    assert!(resolve(&project, "plain").is_empty());
  }

  #[test]
  fn resolve_default_picks_default_context() {
    let project = project(&[(
      "/project/theme.css",
      indoc! {"
        @media (min-width: 768px) {
          :root { --gap: 32px; }
        }
        :root { --gap: 16px; }
      "},
    )]);

    let scope = project.effective_scope();
    let token = CancellationToken::new();

    let value = Resolver::new(&project, &scope, &token)
      .resolve_default("--gap")
      .unwrap()
      .unwrap();

    assert_eq!(value.info.resolved, "16px");
  }

  #[test]
  fn cancellation_is_not_swallowed() {
    let project = project(&[("/project/theme.css", ":root { --a: 1px; }")]);

    let token = CancellationToken::new();

    token.cancel();

    assert_eq!(project.resolve("--a", &token), Err(Cancelled));
  }
}
