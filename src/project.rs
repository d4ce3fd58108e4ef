use super::*;

const STYLESHEET_EXTENSIONS: &[&str] = &["css", "scss", "sass", "less"];

const MODULE_DIRECTORY: &str = "node_modules";

/// The files visible to one resolution call, with the cache identity they
/// were computed under.
#[derive(Clone, Debug, PartialEq)]
pub struct Scope {
  pub files: Arc<[PathBuf]>,
  pub key: ScopeKey,
}

/// One workspace: its index stores, settings and resolution cache.
///
/// Every mutation of the index or the settings invalidates the cache, so
/// resolution never observes results computed for a different file set.
pub struct Project {
  cache: ResolutionCache,
  custom_properties: Arc<dyn IndexStore>,
  filesystem: Arc<dyn FileSystem>,
  preprocessor_variables: Arc<dyn IndexStore>,
  root: PathBuf,
  settings: RwLock<Settings>,
}

impl fmt::Debug for Project {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    f.debug_struct("Project")
      .field("cache", &self.cache)
      .field("root", &self.root)
      .field("settings", &*self.settings.read())
      .finish_non_exhaustive()
  }
}

impl Project {
  pub fn cache(&self) -> &ResolutionCache {
    &self.cache
  }

  pub fn custom_properties(&self) -> &dyn IndexStore {
    &*self.custom_properties
  }

  /// Files visible under the current settings, sorted by path.
  pub fn effective_scope(&self) -> Scope {
    let settings = self.settings();

    let key = self.cache.scope_key(settings.scope);

    if let Some(files) = self.cache.scope(key) {
      return Scope { files, key };
    }

    let (files, key) = match settings.scope {
      ScopeMode::Global => (self.indexed_files(), key),
      ScopeMode::ProjectOnly => (self.project_files(), key),
      ScopeMode::ProjectWithImports => {
        self.files_with_imports(settings.max_import_depth, key)
      }
    };

    let files = files.into_iter().collect::<Arc<[PathBuf]>>();

    self.cache.insert_scope(key, Arc::clone(&files));

    Scope { files, key }
  }

  /// Project files plus their import closure. Imported files missing from
  /// the index are indexed on discovery, which starts a new cache generation.
  fn files_with_imports(
    &self,
    max_depth: usize,
    key: ScopeKey,
  ) -> (BTreeSet<PathBuf>, ScopeKey) {
    let project = self.project_files();

    let resolver = ImportResolver::new(&*self.filesystem, &self.root);

    let mut files = project.clone();

    for file in &project {
      files.extend(resolver.resolve_imports(file, max_depth));
    }

    let missing = files
      .iter()
      .filter(|file| !self.is_indexed(file))
      .collect::<Vec<_>>();

    if missing.is_empty() {
      return (files, key);
    }

    log::info!("indexing {} imported stylesheets", missing.len());

    for file in missing {
      self.store_file(file);
    }

    self.cache.invalidate();

    (files, self.cache.scope_key(key.mode))
  }

  pub fn filesystem(&self) -> &dyn FileSystem {
    &*self.filesystem
  }

  /// Indexes every stylesheet under the root, skipping hidden directories and
  /// module directories. Returns how many files were indexed.
  pub fn index_directory(&self) -> usize {
    let mut pending = vec![self.root.clone()];

    let mut count = 0;

    while let Some(dir) = pending.pop() {
      for child in self.filesystem.children(&dir) {
        let Some(name) = child.file_name().and_then(|name| name.to_str())
        else {
          continue;
        };

        if self.filesystem.is_directory(&child) {
          if !name.starts_with('.') && name != MODULE_DIRECTORY {
            pending.push(child);
          }
        } else if Self::is_stylesheet(&child) && self.store_file(&child) {
          count += 1;
        }
      }
    }

    log::info!("indexed {count} stylesheets under `{}`", self.root.display());

    self.cache.invalidate();

    count
  }

  /// Reads `path` and replaces its contribution to the index.
  pub fn index_file(&self, path: &Path) -> Result {
    let text = self.filesystem.read_text(path)?;
    self.index_text(path, &text);
    Ok(())
  }

  /// Replaces the contribution of `path` with the declarations in `text`.
  pub fn index_text(&self, path: &Path, text: &str) {
    self.store_text(path, text);
    self.cache.invalidate();
  }

  fn indexed_files(&self) -> BTreeSet<PathBuf> {
    self
      .custom_properties
      .files()
      .into_iter()
      .chain(self.preprocessor_variables.files())
      .collect()
  }

  fn is_indexed(&self, path: &Path) -> bool {
    self.custom_properties.contains(path)
      || self.preprocessor_variables.contains(path)
  }

  /// Whether `path` is inside a module directory.
  fn is_module(path: &Path) -> bool {
    path
      .components()
      .any(|component| component.as_os_str() == MODULE_DIRECTORY)
  }

  pub fn is_stylesheet(path: &Path) -> bool {
    path
      .extension()
      .and_then(|extension| extension.to_str())
      .is_some_and(|extension| {
        STYLESHEET_EXTENSIONS
          .iter()
          .any(|candidate| extension.eq_ignore_ascii_case(candidate))
      })
  }

  pub fn new(
    root: impl Into<PathBuf>,
    filesystem: Arc<dyn FileSystem>,
  ) -> Self {
    Self::with_stores(
      root,
      filesystem,
      Arc::new(MemoryIndexStore::new()),
      Arc::new(MemoryIndexStore::new()),
    )
  }

  /// Host hook for lifecycle events that make cached results stale.
  pub fn on_invalidate(&self) {
    self.cache.invalidate();
  }

  pub fn preprocessor_variables(&self) -> &dyn IndexStore {
    &*self.preprocessor_variables
  }

  fn project_files(&self) -> BTreeSet<PathBuf> {
    self
      .indexed_files()
      .into_iter()
      .filter(|file| {
        file
          .strip_prefix(&self.root)
          .is_ok_and(|relative| !Self::is_module(relative))
      })
      .collect()
  }

  pub fn remove_file(&self, path: &Path) {
    self.custom_properties.remove(path);
    self.preprocessor_variables.remove(path);
    self.cache.invalidate();
  }

  /// Resolves `name` in the current effective scope.
  pub fn resolve(
    &self,
    name: &str,
    token: &CancellationToken,
  ) -> Result<Resolution, Cancelled> {
    let scope = self.effective_scope();
    Resolver::new(self, &scope, token).resolve(name)
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  /// Replaces the settings, invalidating the cache when they changed.
  pub fn set_settings(&self, settings: Settings) {
    {
      let mut current = self.settings.write();

      if *current == settings {
        return;
      }

      log::info!("settings changed: {settings:?}");

      *current = settings;
    }

    self.cache.invalidate();
  }

  pub fn settings(&self) -> Settings {
    self.settings.read().clone()
  }

  /// Indexes `path` from disk without invalidating. An unreadable file is
  /// recorded as empty so it is not retried on every scope computation.
  fn store_file(&self, path: &Path) -> bool {
    match self.filesystem.read_text(path) {
      Ok(text) => {
        self.store_text(path, &text);
        true
      }
      Err(error) => {
        log::debug!("failed to index `{}`: {error:#}", path.display());
        self.store_text(path, "");
        false
      }
    }
  }

  fn store_text(&self, path: &Path, text: &str) {
    self
      .custom_properties
      .store(path, &Indexer::custom_properties().index(text));

    self
      .preprocessor_variables
      .store(path, &Indexer::preprocessor().index(text));
  }

  /// Every variable name declared in the effective scope, sorted.
  pub fn variable_names(&self) -> Vec<String> {
    let scope = self.effective_scope();

    scope
      .files
      .iter()
      .flat_map(|file| {
        self
          .custom_properties
          .keys(file)
          .into_iter()
          .chain(self.preprocessor_variables.keys(file))
      })
      .collect::<BTreeSet<_>>()
      .into_iter()
      .collect()
  }

  pub fn with_stores(
    root: impl Into<PathBuf>,
    filesystem: Arc<dyn FileSystem>,
    custom_properties: Arc<dyn IndexStore>,
    preprocessor_variables: Arc<dyn IndexStore>,
  ) -> Self {
    Self {
      cache: ResolutionCache::new(),
      custom_properties,
      filesystem,
      preprocessor_variables,
      root: root.into(),
      settings: RwLock::new(Settings::default()),
    }
  }
}

#[cfg(test)]
mod tests {
  use {
    super::*, pretty_assertions::assert_eq, std::sync::atomic::AtomicUsize,
    tempfile::tempdir,
  };

  fn write(root: &Path, relative: &str, content: &str) -> PathBuf {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
  }

  fn names(scope: &Scope, root: &Path) -> Vec<String> {
    scope
      .files
      .iter()
      .map(|file| {
        file
          .strip_prefix(root)
          .unwrap()
          .to_string_lossy()
          .replace('\\', "/")
      })
      .collect()
  }

  fn with_scope(project: &Project, scope: ScopeMode) {
    project.set_settings(Settings {
      scope,
      ..Settings::default()
    });
  }

  #[test]
  fn indexes_stylesheets_under_the_root() {
    let dir = tempdir().unwrap();

    write(dir.path(), "theme.css", ":root { --a: 1px; }");
    write(dir.path(), "nested/vars.less", "@b: 2px;");
    write(dir.path(), "notes.txt", "--c: 3px;");
    write(dir.path(), ".cache/hidden.css", ":root { --d: 4px; }");
    write(dir.path(), "node_modules/lib/lib.css", ":root { --e: 5px; }");

    let project = Project::new(dir.path(), Arc::new(OsFileSystem));

    assert_eq!(project.index_directory(), 2);
    assert_eq!(project.variable_names(), vec!["--a", "@b"]);
  }

  #[test]
  fn project_only_excludes_module_directories() {
    let project = Project::new("/project", Arc::new(OsFileSystem));

    project.index_text(Path::new("/project/app.css"), ":root { --a: 1px; }");
    project.index_text(
      Path::new("/project/node_modules/kit/kit.css"),
      ":root { --b: 2px; }",
    );
    project.index_text(Path::new("/elsewhere/x.css"), ":root { --c: 3px; }");

    assert_eq!(project.effective_scope().files.len(), 3);

    with_scope(&project, ScopeMode::ProjectOnly);

    assert_eq!(
      &*project.effective_scope().files,
      &[PathBuf::from("/project/app.css")]
    );
    assert_eq!(project.variable_names(), vec!["--a"]);
  }

  #[test]
  fn project_with_imports_follows_the_import_graph() {
    let dir = tempdir().unwrap();

    let app = write(
      dir.path(),
      "src/app.scss",
      "@import 'theme';\n:root { --app: var(--brand); }",
    );

    write(dir.path(), "src/_theme.scss", "@use '~kit/tokens';");

    write(
      dir.path(),
      "node_modules/kit/tokens.scss",
      ":root { --brand: #3498db; }",
    );

    write(
      dir.path(),
      "node_modules/other/unused.css",
      ":root { --unused: 0; }",
    );

    let project = Project::new(dir.path(), Arc::new(OsFileSystem));

    project.index_file(&app).unwrap();

    with_scope(&project, ScopeMode::ProjectWithImports);

    let scope = project.effective_scope();

    assert_eq!(
      names(&scope, dir.path()),
      vec!["node_modules/kit/tokens.scss", "src/_theme.scss", "src/app.scss"]
    );

    assert_eq!(
      project
        .resolve("--app", &CancellationToken::new())
        .unwrap()
        .values[0]
        .info
        .resolved,
      "#3498db"
    );

    assert_eq!(project.effective_scope(), scope);
  }

  #[test]
  fn scopes_are_cached_until_invalidated() {
    let project = Project::new("/project", Arc::new(OsFileSystem));

    project.index_text(Path::new("/project/a.css"), ":root { --a: 1px; }");

    let first = project.effective_scope();

    assert!(Arc::ptr_eq(&first.files, &project.effective_scope().files));

    project.on_invalidate();

    let second = project.effective_scope();

    assert_ne!(first.key, second.key);
    assert_eq!(first.files, second.files);
  }

  #[test]
  fn reindexing_replaces_a_files_contribution() {
    let project = Project::new("/project", Arc::new(OsFileSystem));

    let path = Path::new("/project/a.css");

    project.index_text(path, ":root { --a: 1px; --b: 2px; }");
    project.index_text(path, ":root { --a: 3px; }");

    assert_eq!(project.variable_names(), vec!["--a"]);

    assert_eq!(
      project
        .resolve("--a", &CancellationToken::new())
        .unwrap()
        .values[0]
        .info
        .resolved,
      "3px"
    );

    project.remove_file(path);

    assert!(project.variable_names().is_empty());
  }

  #[test]
  fn unchanged_settings_do_not_invalidate() {
    let project = Project::new("/project", Arc::new(OsFileSystem));

    let invalidations = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&invalidations);

    project.cache().subscribe(move || {
      counter.fetch_add(1, AtomicOrdering::SeqCst);
    });

    project.set_settings(Settings::default());

    assert_eq!(invalidations.load(AtomicOrdering::SeqCst), 0);

    with_scope(&project, ScopeMode::ProjectOnly);

    assert_eq!(invalidations.load(AtomicOrdering::SeqCst), 1);
  }

  #[test]
  fn stylesheet_extensions() {
    assert!(Project::is_stylesheet(Path::new("a.css")));
    assert!(Project::is_stylesheet(Path::new("a.SCSS")));
    assert!(Project::is_stylesheet(Path::new("a.sass")));
    assert!(Project::is_stylesheet(Path::new("a.less")));
    assert!(!Project::is_stylesheet(Path::new("a.js")));
    assert!(!Project::is_stylesheet(Path::new("css")));
  }
}
