//! Gate configuration: concurrency cap, history backend, default admission timeout.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Environment variable overriding [`GateConfig::max_concurrent`].
pub const ENV_MAX_CONCURRENT: &str = "ADMISSION_MAX_CONCURRENT";
/// Environment variable selecting the JSON-lines history file.
pub const ENV_HISTORY_PATH: &str = "ADMISSION_HISTORY_PATH";
/// Environment variable overriding [`GateConfig::default_admit_timeout_secs`].
pub const ENV_ADMIT_TIMEOUT_SECS: &str = "ADMISSION_ADMIT_TIMEOUT_SECS";
/// Environment variable overriding [`GateConfig::defer_history`] (`true`/`false`).
pub const ENV_DEFER_HISTORY: &str = "ADMISSION_DEFER_HISTORY";

/// History backend selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryBackendConfig {
    /// Discard records.
    Disabled,
    /// Bounded in-memory ring for development/testing.
    InMemory {
        /// Records kept before the oldest is evicted.
        capacity: usize,
    },
    /// Append-only JSON-lines file.
    JsonLines {
        /// File path.
        path: PathBuf,
    },
}

impl Default for HistoryBackendConfig {
    fn default() -> Self {
        Self::InMemory { capacity: 1000 }
    }
}

/// Gate configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Maximum simultaneously active ordinary tasks.
    pub max_concurrent: usize,
    /// Where finished-task records go.
    pub history: HistoryBackendConfig,
    /// Bound on admission waits for `admit_bounded` and guarded runs.
    pub default_admit_timeout_secs: Option<u64>,
    /// Write history records on a background tokio task instead of the
    /// releasing thread. Requires the `tokio-runtime` feature.
    pub defer_history: bool,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 1,
            history: HistoryBackendConfig::default(),
            default_admit_timeout_secs: None,
            defer_history: false,
        }
    }
}

impl GateConfig {
    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_concurrent == 0 {
            return Err("max_concurrent must be greater than 0".into());
        }
        match &self.history {
            HistoryBackendConfig::InMemory { capacity: 0 } => {
                return Err("history capacity must be greater than 0".into());
            }
            HistoryBackendConfig::JsonLines { path } if path.as_os_str().is_empty() => {
                return Err("history path must not be empty".into());
            }
            _ => {}
        }
        if self.default_admit_timeout_secs == Some(0) {
            return Err("default_admit_timeout_secs must be greater than 0".into());
        }
        if self.defer_history && !cfg!(feature = "tokio-runtime") {
            return Err("defer_history requires the tokio-runtime feature".into());
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

    /// Build configuration from the process environment, loading `.env` first
    /// when one is present.
    ///
    /// # Errors
    ///
    /// Returns a message if a variable is set but malformed, or the result is invalid.
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup, over defaults.
    ///
    /// # Errors
    ///
    /// Returns a message if a value is malformed, or the result is invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(raw) = lookup(ENV_MAX_CONCURRENT) {
            cfg.max_concurrent = raw
                .trim()
                .parse::<usize>()
                .map_err(|e| format!("{ENV_MAX_CONCURRENT}: {e}"))?;
        }
        if let Some(path) = lookup(ENV_HISTORY_PATH) {
            cfg.history = HistoryBackendConfig::JsonLines { path: path.into() };
        }
        if let Some(raw) = lookup(ENV_ADMIT_TIMEOUT_SECS) {
            let secs = raw
                .trim()
                .parse::<u64>()
                .map_err(|e| format!("{ENV_ADMIT_TIMEOUT_SECS}: {e}"))?;
            cfg.default_admit_timeout_secs = Some(secs);
        }
        if let Some(raw) = lookup(ENV_DEFER_HISTORY) {
            cfg.defer_history = raw
                .trim()
                .parse::<bool>()
                .map_err(|e| format!("{ENV_DEFER_HISTORY}: {e}"))?;
        }
        cfg.validate()?;
        Ok(cfg)
    }

    /// Default admission timeout, if configured.
    #[must_use]
    pub fn default_admit_timeout(&self) -> Option<Duration> {
        self.default_admit_timeout_secs.map(Duration::from_secs)
    }
}
