mod cmd;
mod config;
mod error;
mod render;

use std::{
    fmt,
    io::{self, Write as _},
    path::PathBuf,
    process::ExitCode,
};

use clap::{ArgAction, Parser};
use cmd::Commands;
use config::Config;
use error::{Error, Result};
use tracing::trace;

/// Relay chat responses between a front-end and a hosted agent.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten, next_help_heading = "Global Options")]
    globals: Globals,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, clap::Args)]
struct Globals {
    /// Path to the config file.
    ///
    /// Defaults to the first of `./chatter.toml`, `./config/chatter.toml` and
    /// `~/.config/chatter.toml` that exists.
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Increase verbosity of logging.
    ///
    /// Can be specified multiple times to increase verbosity.
    ///
    /// Defaults to printing "error" messages. For each increase in verbosity,
    /// the log level is set to "warn", "info", "debug", and "trace"
    /// respectively.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Suppress all logging.
    #[arg(short, long, global = true)]
    quiet: bool,
}

impl fmt::Display for Cli {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entry(&"config", &self.globals.config)
            .entry(&"verbose", &self.globals.verbose)
            .entry(&"quiet", &self.globals.quiet)
            .finish()
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    configure_logging(cli.globals.verbose, cli.globals.quiet);
    trace!(command = cli.command.name(), arguments = %cli, "Starting CLI run.");

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(error) => return report(&error.into()),
    };

    match runtime.block_on(run_inner(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => report(&error),
    }
}

async fn run_inner(cli: Cli) -> Result<()> {
    let mut out = io::stdout().lock();

    match cli.command {
        Commands::Init(args) => args.run(&mut out),
        cmd => {
            let config = Config::load(cli.globals.config.as_deref())?;
            cmd.run(config, &mut out).await
        }
    }
}

fn report(error: &Error) -> ExitCode {
    let code = match error {
        Error::Consumer(chatter_consumer::Error::Aborted) => 130,
        _ => 1,
    };

    // Nothing left to report to if stderr is gone.
    writeln!(io::stderr(), "Error: {error}").ok();
    ExitCode::from(code)
}

fn configure_logging(verbose: u8, quiet: bool) {
    use tracing::level_filters::LevelFilter;
    use tracing_subscriber::fmt;

    let mut level = match verbose {
        0 => LevelFilter::ERROR,
        1 => LevelFilter::WARN,
        2 => LevelFilter::INFO,
        3 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    if quiet {
        level = LevelFilter::OFF;
    }

    let mut filter = vec!["off".to_owned()];
    for krate in ["cli", "consumer", "protocol", "relay", "upstream"] {
        filter.push(format!("chatter_{krate}={level}"));
    }

    let format = fmt::format().with_target(false).compact();

    if level < LevelFilter::DEBUG {
        tracing_subscriber::fmt()
            .event_format(format)
            .without_time()
            .with_target(false)
            .with_writer(io::stderr)
            .with_env_filter(filter.join(","))
            .init();
    } else {
        tracing_subscriber::fmt()
            .event_format(format)
            .with_target(false)
            .with_writer(io::stderr)
            .with_env_filter(filter.join(","))
            .init();
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_ask_with_globals() {
        let cli = Cli::try_parse_from([
            "chatter",
            "-vv",
            "ask",
            "--stream",
            "--conversation",
            "c1",
            "hello there",
        ])
        .unwrap();

        assert_eq!(cli.globals.verbose, 2);
        assert_eq!(cli.command.name(), "ask");
    }
}
