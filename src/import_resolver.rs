use super::*;

const MODULE_DIRECTORY: &str = "node_modules";

/// Expands the set of stylesheets a file pulls in through import statements.
///
/// Tokens are resolved relative to the importing file (`./`, `../`), to the
/// project root (`/`), or through the nearest module directory (scoped
/// `@scope/pkg` names and `~pkg`). Bare names try the importing directory
/// first and fall back to module lookup. Anything unresolvable is skipped.
pub struct ImportResolver<'a> {
  filesystem: &'a dyn FileSystem,
  project_root: &'a Path,
}

impl<'a> ImportResolver<'a> {
  /// Candidate extensions, most likely first for the importing file's syntax.
  fn extensions(importer: &Path) -> [&'static str; 4] {
    match importer.extension().and_then(|extension| extension.to_str()) {
      Some("scss") => ["scss", "css", "sass", "less"],
      Some("sass") => ["sass", "scss", "css", "less"],
      Some("less") => ["less", "css", "scss", "sass"],
      _ => ["css", "scss", "sass", "less"],
    }
  }

  pub fn new(filesystem: &'a dyn FileSystem, project_root: &'a Path) -> Self {
    Self {
      filesystem,
      project_root,
    }
  }

  fn regular_file(&self, dir: &Path, name: &str) -> Option<PathBuf> {
    self
      .filesystem
      .find_child(dir, name)
      .filter(|path| self.filesystem.is_file(path))
  }

  fn resolve_file(
    &self,
    dir: &Path,
    name: &str,
    importer: &Path,
  ) -> Option<PathBuf> {
    if name.is_empty() {
      return None;
    }

    if name.contains('.') {
      if let Some(path) = self.regular_file(dir, name) {
        return Some(path);
      }
    }

    let extensions = Self::extensions(importer);

    let found = extensions
      .iter()
      .map(|extension| format!("{name}.{extension}"))
      .chain(
        extensions
          .iter()
          .filter(|extension| matches!(**extension, "scss" | "sass"))
          .map(|extension| format!("_{name}.{extension}")),
      )
      .find_map(|candidate| self.regular_file(dir, &candidate));

    if found.is_some() {
      return found;
    }

    let package = self
      .filesystem
      .find_child(dir, name)
      .filter(|path| self.filesystem.is_directory(path))?;

    ["index", "_index"]
      .iter()
      .flat_map(|index| {
        extensions
          .iter()
          .map(move |extension| format!("{index}.{extension}"))
      })
      .find_map(|candidate| self.regular_file(&package, &candidate))
  }

  /// Transitive closure of the files `file` imports, at most `max_depth`
  /// hops away. The file itself is not part of the result.
  pub fn resolve_imports(
    &self,
    file: &Path,
    max_depth: usize,
  ) -> BTreeSet<PathBuf> {
    let mut visited = HashSet::from([file.to_path_buf()]);
    let mut imported = BTreeSet::new();

    // Breadth-first, so every file is expanded at its shortest hop count.
    let mut queue = VecDeque::from([(file.to_path_buf(), 0)]);

    while let Some((file, depth)) = queue.pop_front() {
      if depth >= max_depth {
        continue;
      }

      let content = match self.filesystem.read_text(&file) {
        Ok(content) => content,
        Err(error) => {
          log::debug!(
            "skipping imports of `{}`: {error:#}",
            file.display()
          );
          continue;
        }
      };

      for token in Indexer::imports(&content) {
        let Some(path) = self.resolve_token(&file, &token) else {
          log::debug!(
            "import not found: `{token}` in `{}`",
            file.display()
          );
          continue;
        };

        if visited.insert(path.clone()) {
          imported.insert(path.clone());
          queue.push_back((path, depth + 1));
        }
      }
    }

    imported
  }

  fn resolve_module(
    &self,
    dir: &Path,
    package: &str,
    importer: &Path,
  ) -> Option<PathBuf> {
    let mut current = Some(dir.to_path_buf());

    while let Some(dir) = current {
      if let Some(modules) = self.module_directory(&dir) {
        if let Some(found) = self.resolve_path(&modules, package, importer) {
          return Some(found);
        }
      }

      current = self.filesystem.parent(&dir);
    }

    let modules = self.module_directory(self.project_root)?;

    self.resolve_path(&modules, package, importer)
  }

  fn module_directory(&self, dir: &Path) -> Option<PathBuf> {
    self
      .filesystem
      .find_child(dir, MODULE_DIRECTORY)
      .filter(|path| self.filesystem.is_directory(path))
  }

  fn resolve_path(
    &self,
    base: &Path,
    relative: &str,
    importer: &Path,
  ) -> Option<PathBuf> {
    let (directory, name) = relative.rsplit_once('/').unwrap_or(("", relative));

    let dir = self.walk(base, directory)?;

    self.resolve_file(&dir, name, importer)
  }

  /// Resolves one import token from `importer`.
  pub fn resolve_token(&self, importer: &Path, token: &str) -> Option<PathBuf> {
    let dir = self.filesystem.parent(importer)?;

    if let Some(package) = token.strip_prefix('~') {
      return self.resolve_module(&dir, package, importer);
    }

    if token.starts_with("./") || token.starts_with("../") {
      return self.resolve_path(&dir, token, importer);
    }

    if let Some(absolute) = token.strip_prefix('/') {
      return self.resolve_path(self.project_root, absolute, importer);
    }

    if token.starts_with('@') {
      return self.resolve_module(&dir, token, importer);
    }

    self
      .resolve_path(&dir, token, importer)
      .or_else(|| self.resolve_module(&dir, token, importer))
  }

  /// Walks `relative` from `base` one directory segment at a time.
  fn walk(&self, base: &Path, relative: &str) -> Option<PathBuf> {
    let mut current = base.to_path_buf();

    for segment in relative.split('/') {
      current = match segment {
        "" | "." => current,
        ".." => self.filesystem.parent(&current)?,
        name => self
          .filesystem
          .find_child(&current, name)
          .filter(|path| self.filesystem.is_directory(path))?,
      };
    }

    Some(current)
  }
}
