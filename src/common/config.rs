//! Configuration for taskherd processes
//!
//! Values come from three layers, lowest priority first: built-in
//! defaults, an optional `taskherd.toml` next to the process, and
//! `TASKHERD_*` environment variables. CLI flags override all of
//! them in the binaries.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Process configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Coordination service endpoint (e.g. `mem://local`)
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Session liveness window
    #[serde(default = "default_session_timeout_ms")]
    pub session_timeout_ms: u64,

    /// Delay between retries of ambiguously failed operations
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_endpoint() -> String {
    "mem://local".to_string()
}
fn default_session_timeout_ms() -> u64 {
    15_000
}
fn default_retry_delay_ms() -> u64 {
    100
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            session_timeout_ms: default_session_timeout_ms(),
            retry_delay_ms: default_retry_delay_ms(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load config from file and environment, falling back to defaults.
    pub fn load() -> Self {
        let loaded = config::Config::builder()
            .add_source(config::File::with_name("taskherd").required(false))
            .add_source(config::Environment::with_prefix("TASKHERD"))
            .build()
            .and_then(|c| c.try_deserialize::<Config>());

        match loaded {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config, using defaults: {}", e);
                Config::default()
            }
        }
    }

    /// Session timeout as a [`Duration`]
    pub fn session_timeout(&self) -> Duration {
        Duration::from_millis(self.session_timeout_ms)
    }

    /// Retry delay as a [`Duration`]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.endpoint, "mem://local");
        assert_eq!(config.session_timeout(), Duration::from_secs(15));
        assert_eq!(config.retry_delay(), Duration::from_millis(100));
        assert_eq!(config.log_level, "info");
    }
}
