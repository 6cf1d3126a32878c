//! Server configuration: an optional JSON file plus environment overrides.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::bridge::{BridgeConfig, TabuConfig};

/// Names the JSON configuration file.
pub const CONFIG_ENV: &str = "NAVIGATOR_CONFIG";
/// Overrides [`GraphConfig::schedule_path`].
pub const SCHEDULE_ENV: &str = "NAVIGATOR_SCHEDULE";
/// Overrides [`ServerConfig::addr`].
pub const ADDR_ENV: &str = "NAVIGATOR_ADDR";
/// Overrides [`ServerConfig::solution_timeout_ms`].
pub const TIMEOUT_ENV: &str = "NAVIGATOR_TIMEOUT_MS";

/// Errors loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid value for {name}: {value:?}")]
    InvalidEnv { name: &'static str, value: String },
}

/// Where the schedule comes from and how stops are linked by walking.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// CSV schedule file.
    pub schedule_path: PathBuf,

    /// Only link stops closer than `max_walk_distance_km` by walking.
    /// Without it every pair of stops gets a walk connection.
    pub walk_restrictions: bool,

    pub max_walk_distance_km: f64,
}

impl GraphConfig {
    pub fn new(schedule_path: impl Into<PathBuf>) -> Self {
        Self {
            schedule_path: schedule_path.into(),
            ..Self::default()
        }
    }

    /// Distance bound handed to walk synthesis, `None` when unrestricted.
    pub fn walk_distance_limit(&self) -> Option<f64> {
        self.walk_restrictions.then_some(self.max_walk_distance_km)
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            schedule_path: PathBuf::from("data/connection_graph.csv"),
            walk_restrictions: true,
            max_walk_distance_km: 1.0,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: SocketAddr,

    /// Deadline for a single solve (milliseconds).
    pub solution_timeout_ms: u64,

    /// Largest edit distance at which a misspelt stop name is still accepted.
    pub allowed_lexical_distance: usize,
}

impl ServerConfig {
    pub fn solution_timeout(&self) -> Duration {
        Duration::from_millis(self.solution_timeout_ms)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            solution_timeout_ms: 30_000,
            allowed_lexical_distance: 3,
        }
    }
}

/// Everything the binary needs to start.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct NavigatorConfig {
    pub graph: GraphConfig,
    pub bridge: BridgeConfig,
    pub tabu: TabuConfig,
    pub server: ServerConfig,
}

impl NavigatorConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load_from(|name| std::env::var(name).ok())
    }

    /// Load using `lookup` to read variables.
    ///
    /// The file named by [`CONFIG_ENV`] is read first (defaults when unset),
    /// then the individual overrides are applied.
    pub fn load_from(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = match lookup(CONFIG_ENV) {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        if let Some(path) = lookup(SCHEDULE_ENV) {
            config.graph.schedule_path = PathBuf::from(path);
        }
        if let Some(value) = lookup(ADDR_ENV) {
            config.server.addr = value.parse().map_err(|_| ConfigError::InvalidEnv {
                name: ADDR_ENV,
                value: value.clone(),
            })?;
        }
        if let Some(value) = lookup(TIMEOUT_ENV) {
            config.server.solution_timeout_ms =
                value.parse().map_err(|_| ConfigError::InvalidEnv {
                    name: TIMEOUT_ENV,
                    value: value.clone(),
                })?;
        }
        Ok(config)
    }

    /// Parse a JSON file. Missing sections and fields take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}
