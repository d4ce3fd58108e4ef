use super::*;

/// Identity of an effective scope: the scope mode plus the cache generation
/// it was computed under. Any index or settings change bumps the generation,
/// so a key never matches results computed for a different file set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScopeKey {
  pub generation: u64,
  pub mode: ScopeMode,
}

type Hook = Box<dyn Fn() + Send + Sync>;

/// Memoization shared by concurrent resolution calls of one project.
///
/// Duplicate computation of the same key by racing callers is harmless; the
/// last write wins and both writes hold the same value.
#[derive(Default)]
pub struct ResolutionCache {
  generation: AtomicU64,
  hooks: Mutex<Vec<Hook>>,
  preprocessor: DashMap<(ScopeKey, String), Option<PreprocessorValue>>,
  scopes: DashMap<ScopeKey, Arc<[PathBuf]>>,
}

impl fmt::Debug for ResolutionCache {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    f.debug_struct("ResolutionCache")
      .field("generation", &self.generation())
      .field("preprocessor", &self.preprocessor.len())
      .field("scopes", &self.scopes.len())
      .finish_non_exhaustive()
  }
}

impl ResolutionCache {
  pub fn generation(&self) -> u64 {
    self.generation.load(AtomicOrdering::SeqCst)
  }

  pub fn insert_preprocessor(
    &self,
    key: ScopeKey,
    name: &str,
    value: Option<PreprocessorValue>,
  ) {
    if key.generation == self.generation() {
      self.preprocessor.insert((key, name.to_string()), value);
    }
  }

  pub fn insert_scope(&self, key: ScopeKey, files: Arc<[PathBuf]>) {
    if key.generation == self.generation() {
      self.scopes.insert(key, files);
    }
  }

  /// Drops every memoized result and notifies subscribers.
  pub fn invalidate(&self) {
    let generation = self.generation.fetch_add(1, AtomicOrdering::SeqCst) + 1;

    self.preprocessor.clear();
    self.scopes.clear();

    log::debug!("resolution cache invalidated, generation {generation}");

    for hook in self.hooks.lock().iter() {
      hook();
    }
  }

  pub fn is_empty(&self) -> bool {
    self.preprocessor.is_empty() && self.scopes.is_empty()
  }

  pub fn new() -> Self {
    Self::default()
  }

  /// A cached preprocessor result; the outer `Option` is the cache hit, the
  /// inner one whether the variable resolved.
  pub fn preprocessor(
    &self,
    key: ScopeKey,
    name: &str,
  ) -> Option<Option<PreprocessorValue>> {
    self
      .preprocessor
      .get(&(key, name.to_string()))
      .map(|entry| entry.value().clone())
  }

  pub fn scope(&self, key: ScopeKey) -> Option<Arc<[PathBuf]>> {
    self.scopes.get(&key).map(|entry| Arc::clone(entry.value()))
  }

  pub fn scope_key(&self, mode: ScopeMode) -> ScopeKey {
    ScopeKey {
      generation: self.generation(),
      mode,
    }
  }

  /// Registers a hook run after every invalidation.
  pub fn subscribe(&self, hook: impl Fn() + Send + Sync + 'static) {
    self.hooks.lock().push(Box::new(hook));
  }
}
