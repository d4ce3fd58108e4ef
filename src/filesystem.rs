use super::*;

/// The file lookups import resolution and project indexing depend on.
pub trait FileSystem: Send + Sync {
  /// Direct entries of `dir`, sorted by path.
  fn children(&self, dir: &Path) -> Vec<PathBuf>;

  fn exists(&self, path: &Path) -> bool;

  /// The entry called `name` directly inside `dir`.
  fn find_child(&self, dir: &Path, name: &str) -> Option<PathBuf>;

  fn is_directory(&self, path: &Path) -> bool;

  fn is_file(&self, path: &Path) -> bool;

  fn parent(&self, path: &Path) -> Option<PathBuf>;

  fn read_text(&self, path: &Path) -> Result<String>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
  fn children(&self, dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
      return Vec::new();
    };

    let mut children = entries
      .filter_map(|entry| entry.ok().map(|entry| entry.path()))
      .collect::<Vec<_>>();

    children.sort();

    children
  }

  fn exists(&self, path: &Path) -> bool {
    path.exists()
  }

  fn find_child(&self, dir: &Path, name: &str) -> Option<PathBuf> {
    let child = dir.join(name);
    child.exists().then_some(child)
  }

  fn is_directory(&self, path: &Path) -> bool {
    path.is_dir()
  }

  fn is_file(&self, path: &Path) -> bool {
    path.is_file()
  }

  fn parent(&self, path: &Path) -> Option<PathBuf> {
    path
      .parent()
      .filter(|parent| !parent.as_os_str().is_empty())
      .map(Path::to_path_buf)
  }

  fn read_text(&self, path: &Path) -> Result<String> {
    fs::read_to_string(path)
      .with_context(|| format!("failed to read `{}`", path.display()))
  }
}
