use super::*;

/// Multi-value mapping from a declaration key to the encoded entries each
/// indexed file contributes for it.
///
/// A file's contribution is always replaced wholesale, so re-indexing one
/// file never touches another file's entries.
pub trait IndexStore: Send + Sync {
  fn files(&self) -> Vec<PathBuf>;

  fn get(&self, file: &Path, key: &str) -> Option<String>;

  fn keys(&self, file: &Path) -> Vec<String>;

  fn remove(&self, file: &Path);

  fn replace(&self, file: &Path, values: IndexMap<String, String>);

  fn contains(&self, file: &Path) -> bool {
    self.files().iter().any(|candidate| candidate == file)
  }

  /// Every entry for `key` across `scope`, in scope order.
  fn entries(&self, key: &str, scope: &[PathBuf]) -> Vec<VariableEntry> {
    scope
      .iter()
      .filter_map(|file| self.get(file, key))
      .flat_map(|encoded| VariableEntry::decode(&encoded))
      .collect()
  }

  fn store(&self, file: &Path, index: &VariableIndex) {
    self.replace(
      file,
      index
        .iter()
        .map(|(name, entries)| (name.clone(), VariableEntry::encode(entries)))
        .collect(),
    );
  }
}

#[derive(Debug, Default)]
pub struct MemoryIndexStore {
  files: DashMap<PathBuf, IndexMap<String, String>>,
}

impl MemoryIndexStore {
  pub fn new() -> Self {
    Self::default()
  }
}

impl IndexStore for MemoryIndexStore {
  fn contains(&self, file: &Path) -> bool {
    self.files.contains_key(file)
  }

  fn files(&self) -> Vec<PathBuf> {
    let mut files = self
      .files
      .iter()
      .map(|entry| entry.key().clone())
      .collect::<Vec<_>>();

    files.sort();

    files
  }

  fn get(&self, file: &Path, key: &str) -> Option<String> {
    self
      .files
      .get(file)
      .and_then(|values| values.get(key).cloned())
  }

  fn keys(&self, file: &Path) -> Vec<String> {
    self
      .files
      .get(file)
      .map(|values| values.keys().cloned().collect())
      .unwrap_or_default()
  }

  fn remove(&self, file: &Path) {
    self.files.remove(file);
  }

  fn replace(&self, file: &Path, values: IndexMap<String, String>) {
    self.files.insert(file.to_path_buf(), values);
  }
}
