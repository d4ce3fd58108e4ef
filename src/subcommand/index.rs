use super::*;

#[derive(Debug, Clap)]
pub(crate) struct Index {
  #[arg(
    value_name = "FILE",
    help = "Stylesheet to index",
    value_hint = clap::ValueHint::FilePath
  )]
  path: PathBuf,
}

impl Index {
  pub(crate) fn run(self) -> Result {
    let text = OsFileSystem.read_text(&self.path)?;

    print!("{}", Self::render(&text));

    Ok(())
  }

  fn render(text: &str) -> String {
    let mut output = String::new();

    for indexer in [Indexer::custom_properties(), Indexer::preprocessor()] {
      for (name, entries) in indexer.index(text) {
        output.push_str(&name);
        output.push('\n');

        for entry in entries {
          output.push_str(&format!(
            "  {}: {}\n",
            entry.context, entry.raw_value
          ));
        }
      }
    }

    let imports = Indexer::imports(text);

    if !imports.is_empty() {
      output.push_str("imports\n");

      for import in imports {
        output.push_str(&format!("  {import}\n"));
      }
    }

    output
  }
}
