use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::error::{Error, Result};

const DEFAULT_SERVER_PORT: u16 = 4242;
const DEFAULT_SERVER_ADDRESS: &str = "0.0.0.0";
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3232";
const DEFAULT_API_KEY_ENV: &str = "UPSTREAM_API_KEY";
const DEFAULT_AGENT_ID_ENV: &str = "UPSTREAM_AGENT_ID";
const DEFAULT_RELAY_URL: &str = "http://localhost:4242";

pub(crate) const DEFAULT_CONFIG_PATH: &str = "./chatter.toml";

const DEFAULT_CONFIG_PATHS: &[&str] = &[
    DEFAULT_CONFIG_PATH,
    "./config/chatter.toml",
    "~/.config/chatter.toml",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Config {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,

    /// Forwarded as the user context of every created conversation.
    pub user_context: Map<String, Value>,

    pub client: ClientConfig,
}

impl Default for Config {
    fn default() -> Self {
        let mut user_context = Map::new();
        user_context.insert("organisationId".to_owned(), Value::from(1));

        Self {
            server: ServerConfig::default(),
            upstream: UpstreamConfig::default(),
            user_context,
            client: ClientConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct ServerConfig {
    pub address: String,
    pub port: u16,

    /// The front-end origin allowed to call the relay, or `*`.
    pub cors_origin: String,

    pub environment: Environment,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_SERVER_ADDRESS.to_owned(),
            port: DEFAULT_SERVER_PORT,
            cors_origin: DEFAULT_CORS_ORIGIN.to_owned(),
            environment: Environment::default(),
        }
    }
}

/// Production hides error details from relay clients.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Environment {
    #[default]
    Development,
    Production,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct UpstreamConfig {
    /// Base URL of the upstream agent API.
    pub base_url: String,

    /// Name of the environment variable holding the API key.
    pub api_key_env: String,

    /// Name of the environment variable holding the agent identifier.
    pub agent_id_env: String,

    pub idle_timeout_secs: u64,
    pub max_frame_bytes: usize,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key_env: DEFAULT_API_KEY_ENV.to_owned(),
            agent_id_env: DEFAULT_AGENT_ID_ENV.to_owned(),
            idle_timeout_secs: chatter_upstream::DEFAULT_IDLE_TIMEOUT.as_secs(),
            max_frame_bytes: chatter_upstream::DEFAULT_MAX_FRAME_BYTES,
        }
    }
}

impl UpstreamConfig {
    /// Build an upstream client, reading secrets from the environment.
    pub(crate) fn client(&self) -> Result<chatter_upstream::Client> {
        if self.base_url.trim().is_empty() {
            return Err(Error::MissingConfig("upstream.base_url"));
        }

        let api_key = read_env(&self.api_key_env)?;
        let agent_id = read_env(&self.agent_id_env)?;

        Ok(
            chatter_upstream::Client::new(self.base_url.trim(), api_key, agent_id)
                .with_idle_timeout(Duration::from_secs(self.idle_timeout_secs))
                .with_max_frame_bytes(self.max_frame_bytes),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct ClientConfig {
    /// Relay used by `chatter ask`.
    pub relay_url: String,

    /// Largest streamed frame accepted from the relay, unbounded if unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_frame_bytes: Option<usize>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            relay_url: DEFAULT_RELAY_URL.to_owned(),
            max_frame_bytes: None,
        }
    }
}

impl Config {
    /// Load the configuration.
    ///
    /// An explicit `path` must exist. Otherwise the first existing default
    /// location is used, falling back to the default configuration.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_file(path);
        }

        let home = env::var("HOME").unwrap_or_default();
        let found = DEFAULT_CONFIG_PATHS
            .iter()
            .map(|path| PathBuf::from(path.replacen('~', &home, 1)))
            .find(|path| path.exists());

        match found {
            Some(path) => Self::load_from_file(&path),
            None => {
                debug!("No config file found, using defaults.");
                Ok(Self::default())
            }
        }
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        trace!(path = %path.display(), "Loading config file.");
        let contents = fs::read_to_string(path).map_err(|error| Error::ReadConfig {
            path: path.to_owned(),
            error,
        })?;

        contents.parse()
    }

    pub(crate) fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;

        Ok(())
    }
}

impl std::str::FromStr for Config {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(Into::into)
    }
}

fn read_env(name: &str) -> Result<String> {
    env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| Error::MissingEnv(name.to_owned()))
}
