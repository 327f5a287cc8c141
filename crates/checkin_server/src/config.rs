//! Server configuration.
//!
//! Settings are read once at startup — from a TOML file in the `checkind`
//! binary, or built directly in tests — and are immutable for the lifetime
//! of the process.

use crate::error::{ServerError, ServerResult};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for the checkin server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on, e.g. `"0.0.0.0:4430"`.
    pub listen_addr: String,
    /// Path of the check result log.
    pub store_path: PathBuf,
    /// Failed auth attempts allowed per client host before throttling.
    pub auth_attempts_allowed: u32,
    /// Throttle window in seconds.
    pub auth_window_secs: u64,
    /// Shared credential presented by clients.
    pub shared_key: String,
}

impl ServerConfig {
    /// Creates a configuration with default limits.
    pub fn new(listen_addr: impl Into<String>, shared_key: impl Into<String>) -> Self {
        Self {
            listen_addr: listen_addr.into(),
            store_path: PathBuf::from("checks.log"),
            auth_attempts_allowed: 3,
            auth_window_secs: 60,
            shared_key: shared_key.into(),
        }
    }

    /// Loads and validates a configuration from a TOML file.
    pub fn load(path: &Path) -> ServerResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ServerError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self =
            toml::from_str(&content).map_err(|source| ServerError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Validates the configured values.
    pub fn validate(&self) -> ServerResult<()> {
        if self.auth_attempts_allowed < 1 {
            return Err(ServerError::ConfigInvalid(
                "auth_attempts_allowed must be at least 1".into(),
            ));
        }
        if self.auth_window_secs < 1 {
            return Err(ServerError::ConfigInvalid(
                "auth_window_secs must be at least 1".into(),
            ));
        }
        if self.shared_key.is_empty() {
            return Err(ServerError::ConfigInvalid("shared_key must be set".into()));
        }
        Ok(())
    }

    /// Sets the check store path.
    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = path.into();
        self
    }

    /// Sets the allowed failed attempts per throttle window.
    pub fn with_attempts_allowed(mut self, attempts: u32) -> Self {
        self.auth_attempts_allowed = attempts;
        self
    }

    /// Sets the throttle window length in seconds.
    pub fn with_window_secs(mut self, secs: u64) -> Self {
        self.auth_window_secs = secs;
        self
    }

    /// Returns the throttle window as a duration.
    pub fn auth_window(&self) -> Duration {
        Duration::from_secs(self.auth_window_secs)
    }
}
