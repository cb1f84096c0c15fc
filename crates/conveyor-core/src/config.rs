use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ConveyorError, Result};

/// Root configuration for a conveyor worker process.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConveyorConfig {
    /// Queue polling configuration.
    #[serde(default)]
    pub queue: QueueConfig,

    /// Identity of the server hosting the worker.
    #[serde(default)]
    pub server: ServerConfig,
}

impl ConveyorConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConveyorError::Config(format!("Failed to read config file: {}", e)))?;

        Self::parse_toml(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse_toml(content: &str) -> Result<Self> {
        // Substitute environment variables
        let content = substitute_env_vars(content);

        toml::from_str(&content)
            .map_err(|e| ConveyorError::Config(format!("Failed to parse config: {}", e)))
    }
}

/// Queue polling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Base poll interval in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Factor applied to the poll interval after an errored cycle.
    #[serde(default = "default_poll_interval_error_multiplier")]
    pub poll_interval_error_multiplier: u32,

    /// Time budget for a single job in milliseconds.
    #[serde(default = "default_job_timeout_ms")]
    pub job_timeout_ms: u64,
}

impl QueueConfig {
    /// Base poll interval.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Per-job time budget.
    pub fn job_timeout(&self) -> Duration {
        Duration::from_millis(self.job_timeout_ms)
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            poll_interval_error_multiplier: default_poll_interval_error_multiplier(),
            job_timeout_ms: default_job_timeout_ms(),
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    3000
}

fn default_poll_interval_error_multiplier() -> u32 {
    10
}

fn default_job_timeout_ms() -> u64 {
    120_000 // 2 minutes
}

/// Identity of the server hosting the worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Human-readable server name.
    #[serde(default = "default_server_name")]
    pub name: String,

    /// Unique instance id.
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: default_server_name(),
            id: Uuid::new_v4(),
        }
    }
}

fn default_server_name() -> String {
    "conveyor".to_string()
}

/// Substitute environment variables in the format ${VAR_NAME}.
fn substitute_env_vars(content: &str) -> String {
    let mut result = content.to_string();
    let re = regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap();

    for cap in re.captures_iter(content) {
        let var_name = &cap[1];
        if let Ok(value) = std::env::var(var_name) {
            result = result.replace(&cap[0], &value);
        }
    }

    result
}
