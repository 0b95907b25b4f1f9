use std::{io::Write, path::PathBuf};

use tracing::info;

use crate::{
    config::{Config, DEFAULT_CONFIG_PATH},
    error::Result,
};

#[derive(Debug, clap::Args)]
pub(crate) struct Init {
    /// Where to write the configuration file.
    #[arg(default_value = DEFAULT_CONFIG_PATH)]
    path: PathBuf,
}

impl Init {
    pub(crate) fn run(&self, out: &mut impl Write) -> Result<()> {
        info!(path = %self.path.display(), "Writing default config file.");
        Config::default().save(&self.path)?;

        writeln!(out, "Config file written to {}", self.path.display())?;
        Ok(())
    }
}
