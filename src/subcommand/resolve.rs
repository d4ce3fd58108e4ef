use super::*;

#[derive(Debug, Clap)]
pub(crate) struct Resolve {
  #[arg(
    value_name = "NAME",
    help = "Variable to resolve, e.g. `--primary`, `@gap` or `$size`",
    allow_hyphen_values = true
  )]
  name: String,
  #[arg(
    long,
    help = "Print the resolution as JSON",
    default_value_t = false
  )]
  json: bool,
  #[arg(long, value_name = "N", help = "Maximum import depth")]
  max_import_depth: Option<usize>,
  #[arg(long, value_name = "N", help = "Maximum resolution depth")]
  max_resolution_depth: Option<usize>,
  #[arg(
    long,
    value_name = "DIR",
    help = "Project root",
    default_value = ".",
    value_hint = clap::ValueHint::DirPath
  )]
  root: PathBuf,
  #[arg(
    long,
    value_name = "MODE",
    help = "Scope: global, project-only or project-with-imports"
  )]
  scope: Option<ScopeMode>,
}

impl Resolve {
  pub(crate) fn run(self) -> Result {
    let project = Project::new(&self.root, Arc::new(OsFileSystem));

    project.set_settings(self.settings());

    project.index_directory();

    let resolution = project.resolve(&self.name, &CancellationToken::new())?;

    if resolution.is_empty() {
      bail!("no declarations of `{}` found", self.name);
    }

    if self.json {
      println!("{}", serde_json::to_string_pretty(&resolution)?);
    } else {
      println!("{}", resolution.markdown());
    }

    Ok(())
  }

  pub(crate) fn settings(&self) -> Settings {
    let defaults = Settings::default();

    Settings {
      max_import_depth: self
        .max_import_depth
        .unwrap_or(defaults.max_import_depth),
      max_resolution_depth: self
        .max_resolution_depth
        .unwrap_or(defaults.max_resolution_depth),
      scope: self.scope.unwrap_or(defaults.scope),
    }
  }
}
