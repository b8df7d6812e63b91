//! Persisted launcher preferences
//!
//! Stored as TOML in the launcher root. The bootstrap only reads them.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::logging::DEFAULT_RETENTION_DAYS;

/// User preferences read at startup
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Last user that logged in, pre-filled in the login frame
    pub last_user: Option<String>,

    /// Open the console on every start
    pub show_launcher_console: bool,

    pub proxy_host: Option<String>,
    pub proxy_port: Option<u16>,
    pub proxy_username: Option<String>,
    pub proxy_password: Option<String>,

    /// Build id recorded by the last launcher that ran
    pub launcher_build: Option<u32>,

    /// Days to keep dated log files (default: 7)
    pub log_retention_days: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            last_user: None,
            show_launcher_console: false,
            proxy_host: None,
            proxy_port: None,
            proxy_username: None,
            proxy_password: None,
            launcher_build: None,
            log_retention_days: DEFAULT_RETENTION_DAYS,
        }
    }
}

impl Settings {
    /// Load settings from file, or return default if not found
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).context("Failed to read settings file")?;
        toml::from_str(&content).context("Failed to parse settings file")
    }

    /// Load settings, falling back to defaults. The second value describes
    /// why the defaults were used, if they were.
    pub fn load_or_default(path: &Path) -> (Self, Option<String>) {
        match Self::load(path) {
            Ok(settings) => (settings, None),
            Err(e) => (Self::default(), Some(format!("{:#}, using defaults", e))),
        }
    }
}
