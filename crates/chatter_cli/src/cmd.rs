mod ask;
mod init;
mod serve;

use std::io::Write;

use crate::{config::Config, error::Result};

#[derive(Debug, clap::Subcommand)]
pub(crate) enum Commands {
    /// Run the relay server.
    Serve(serve::Serve),

    /// Ask a question through a running relay.
    #[command(visible_alias = "a")]
    Ask(ask::Ask),

    /// Write a default configuration file.
    Init(init::Init),
}

impl Commands {
    pub(crate) async fn run(self, config: Config, out: &mut impl Write) -> Result<()> {
        match self {
            Commands::Serve(args) => args.run(config).await,
            Commands::Ask(args) => args.run(&config, out).await,
            Commands::Init(args) => args.run(out),
        }
    }

    pub(crate) fn name(&self) -> &'static str {
        match self {
            Commands::Serve(_) => "serve",
            Commands::Ask(_) => "ask",
            Commands::Init(_) => "init",
        }
    }
}
