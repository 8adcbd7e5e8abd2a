//! croplog configuration.
//!
//! Loaded from `~/.croplog/config.toml`. Every key is optional; a missing
//! file means defaults.
//!
//! ```toml
//! storage-path = "/home/me/.croplog/storage.sqlite"
//! debounce-ms = 300
//! poll-interval-ms = 500
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use jiff::SignedDuration;
use serde::{Deserialize, Serialize};

use crate::persisted::DEFAULT_DEBOUNCE;

/// Floor for `poll-interval-ms`.
pub const MIN_POLL_INTERVAL_MS: u32 = 50;

/// croplog configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// Origin database shared by every croplog process.
    /// Defaults to `~/.croplog/storage.sqlite`.
    pub storage_path: Option<PathBuf>,

    /// Quiet period before a change is written. Defaults to 300.
    pub debounce_ms: Option<u32>,

    /// How often `watch` checks for changes made elsewhere.
    pub poll_interval_ms: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_path: None,
            debounce_ms: None,
            poll_interval_ms: 500,
        }
    }
}

impl Config {
    /// Load config from `~/.croplog/config.toml`, or defaults if it doesn't exist.
    pub fn load() -> Result<Self, String> {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load config from `path`, or defaults if it doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let contents = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(format!("failed to read {}: {e}", path.display())),
        };

        toml::from_str(&contents).map_err(|e| format!("invalid config at {}: {e}", path.display()))
    }

    /// The config file path: `~/.croplog/config.toml`.
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".croplog").join("config.toml"))
    }

    /// The configured storage file, falling back to `~/.croplog/storage.sqlite`.
    pub fn storage_path(&self) -> Option<PathBuf> {
        self.storage_path
            .clone()
            .or_else(|| dirs::home_dir().map(|h| h.join(".croplog").join("storage.sqlite")))
    }

    pub fn debounce(&self) -> SignedDuration {
        self.debounce_ms
            .map_or(DEFAULT_DEBOUNCE, |ms| SignedDuration::from_millis(i64::from(ms)))
    }

    /// At least [`MIN_POLL_INTERVAL_MS`].
    pub fn poll_interval(&self) -> std::time::Duration {
        let ms = self.poll_interval_ms.max(MIN_POLL_INTERVAL_MS);
        std::time::Duration::from_millis(u64::from(ms))
    }
}
