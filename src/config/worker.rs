//! Worker configuration.

use std::env::VarError;

use serde::{Deserialize, Serialize};

/// Environment variable holding the concurrency bound.
pub const MAX_CONCURRENT_TASKS_KEY: &str = "MAX_CONCURRENT_TASKS";

/// Concurrency bound used when none is configured.
pub const DEFAULT_MAX_CONCURRENT_TASKS: u32 = 3;

const fn default_max_concurrent_tasks() -> u32 {
    DEFAULT_MAX_CONCURRENT_TASKS
}

/// Worker loop configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Maximum number of tasks executing at the same time.
    #[serde(default = "default_max_concurrent_tasks")]
    pub max_concurrent_tasks: u32,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_tasks: DEFAULT_MAX_CONCURRENT_TASKS,
        }
    }
}

impl WorkerConfig {
    /// Create a configuration with the given concurrency bound.
    #[must_use]
    pub const fn new(max_concurrent_tasks: u32) -> Self {
        Self {
            max_concurrent_tasks,
        }
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a message if `max_concurrent_tasks` is zero.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_concurrent_tasks == 0 {
            return Err("max_concurrent_tasks must be greater than 0".into());
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns a message on parse or validation failure.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load configuration from the process environment, reading a `.env` file first
    /// if one exists.
    ///
    /// # Errors
    ///
    /// Returns a message if the variable is set but not a valid positive integer.
    pub fn from_env() -> Result<Self, String> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!(error = %e, "failed to load .env file");
            }
        }
        Self::from_lookup(|key| match std::env::var(key) {
            Ok(value) => Some(value),
            Err(VarError::NotPresent) => None,
            Err(VarError::NotUnicode(_)) => Some(String::new()),
        })
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// Missing variables fall back to defaults.
    ///
    /// # Errors
    ///
    /// Returns a message if a present value is invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(raw) = lookup(MAX_CONCURRENT_TASKS_KEY) {
            cfg.max_concurrent_tasks = raw
                .trim()
                .parse()
                .map_err(|e| format!("{MAX_CONCURRENT_TASKS_KEY}={raw:?} is not a valid count: {e}"))?;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}
