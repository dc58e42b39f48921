//! Persistent settings.
//!
//! Settings live in `<config dir>/phishwatch/settings.json`; a missing file
//! means defaults. `PHISHWATCH_API_URL` overrides the endpoint.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{Error, Result};

/// Environment variable overriding [`Settings::api_url`].
pub const API_URL_ENV: &str = "PHISHWATCH_API_URL";

const APP_DIR: &str = "phishwatch";

/// Application settings that persist across sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Remote classification endpoint.
    pub api_url: String,
    /// Seconds between scheduled fetches.
    pub refresh_interval_secs: u64,
    /// Upper bound on a single fetch, in seconds.
    pub fetch_timeout_secs: u64,
    /// Delay before the first inbox scan, in milliseconds.
    pub settle_delay_ms: u64,
    /// Quiet period after the last scroll before rescanning, in milliseconds.
    pub scroll_debounce_ms: u64,
    /// Snapshot database location; defaults to the user data directory.
    pub database_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3000/api/emails".to_string(),
            refresh_interval_secs: 10,
            fetch_timeout_secs: 5,
            settle_delay_ms: 3000,
            scroll_debounce_ms: 1000,
            database_path: None,
        }
    }
}

impl Settings {
    /// Default settings file location.
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("settings.json")
    }

    /// Load settings from `path`, falling back to defaults when the file does
    /// not exist, then apply the environment override.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or
    /// the resulting settings are invalid.
    pub async fn load(path: &Path) -> Result<Self> {
        let mut settings = if path.exists() {
            let contents = tokio::fs::read_to_string(path).await?;
            serde_json::from_str(&contents)?
        } else {
            Self::default()
        };

        if let Ok(url) = std::env::var(API_URL_ENV) {
            settings.api_url = url;
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, contents).await?;
        info!("Settings saved to {:?}", path);
        Ok(())
    }

    /// Reject values that would make the poller or annotator misbehave.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.api_url.trim().is_empty() {
            return Err(Error::Config("api_url must not be empty".into()));
        }
        if self.refresh_interval_secs == 0 {
            return Err(Error::Config("refresh_interval_secs must be positive".into()));
        }
        if self.fetch_timeout_secs == 0 {
            return Err(Error::Config("fetch_timeout_secs must be positive".into()));
        }
        Ok(())
    }

    /// Snapshot database location.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.database_path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR)
                .join("phishwatch.db")
        })
    }

    /// Cadence of the refresh timer.
    #[must_use]
    pub const fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    /// Bound on a single fetch.
    #[must_use]
    pub const fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Delay before the first inbox scan.
    #[must_use]
    pub const fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Scroll debounce window.
    #[must_use]
    pub const fn scroll_debounce(&self) -> Duration {
        Duration::from_millis(self.scroll_debounce_ms)
    }
}
