use std::{io, path::PathBuf};

pub(crate) type Result<T> = std::result::Result<T, Error>;

/// CLI Error types
#[derive(Debug, thiserror::Error)]
pub(crate) enum Error {
    #[error("Unable to read config file {}: {error}", .path.display())]
    ReadConfig { path: PathBuf, error: io::Error },

    #[error("Invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Unable to serialize config: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Missing configuration value `{0}`")]
    MissingConfig(&'static str),

    #[error("Environment variable `{0}` is not set")]
    MissingEnv(String),

    #[error("Relay error: {0}")]
    Relay(#[from] chatter_relay::Error),

    #[error(transparent)]
    Consumer(#[from] chatter_consumer::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
