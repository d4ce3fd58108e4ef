use super::*;

/// Which files' declarations a resolution call can see.
#[derive(
  Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScopeMode {
  /// Every indexed file, libraries included.
  #[default]
  Global,
  /// Files under the project root, outside module directories.
  ProjectOnly,
  /// Project files plus whatever they transitively import.
  ProjectWithImports,
}

impl FromStr for ScopeMode {
  type Err = anyhow::Error;

  fn from_str(s: &str) -> Result<Self> {
    match s.to_ascii_lowercase().replace('_', "-").as_str() {
      "global" => Ok(Self::Global),
      "project-only" | "project" => Ok(Self::ProjectOnly),
      "project-with-imports" | "imports" => Ok(Self::ProjectWithImports),
      _ => bail!("unknown scope `{s}`"),
    }
  }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
  pub max_import_depth: usize,
  pub max_resolution_depth: usize,
  pub scope: ScopeMode,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      max_import_depth: 3,
      max_resolution_depth: 10,
      scope: ScopeMode::default(),
    }
  }
}

impl Settings {
  /// Reads settings sent by a client, either as the settings object itself
  /// or nested under a `cssVariables` key. Missing fields keep defaults.
  pub fn from_client(value: serde_json::Value) -> Result<Self> {
    let value = match value {
      serde_json::Value::Object(mut object) => {
        match object.remove("cssVariables") {
          Some(nested) => nested,
          None => serde_json::Value::Object(object),
        }
      }
      serde_json::Value::Null => return Ok(Self::default()),
      other => other,
    };

    serde_json::from_value(value).context("invalid settings")
  }
}
