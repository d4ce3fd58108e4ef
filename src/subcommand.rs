use {super::*, index::Index, resolve::Resolve};

mod index;
mod resolve;

#[derive(Debug, clap::Subcommand)]
pub(crate) enum Subcommand {
  /// Print the variables declared in a stylesheet
  Index(Index),
  /// Resolve a variable across a project
  Resolve(Resolve),
}

impl Subcommand {
  pub(crate) fn run(self) -> Result {
    match self {
      Self::Index(index) => index.run(),
      Self::Resolve(resolve) => resolve.run(),
    }
  }
}
