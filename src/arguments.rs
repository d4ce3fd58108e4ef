use super::*;

#[derive(Debug, Clap)]
#[command(author, version, about, long_about = None)]
pub struct Arguments {
  #[command(subcommand)]
  subcommand: Option<Subcommand>,
}

impl Arguments {
  pub async fn run(self) -> Result {
    match self.subcommand {
      Some(subcommand) => subcommand.run(),
      None => Server::run().await,
    }
  }
}
