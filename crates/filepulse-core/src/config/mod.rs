//! Configuration management for FilePulse.
//!
//! This module handles loading, saving, and managing FilePulse configuration.
//!
//! ## Configuration File Locations
//!
//! | Platform | Path |
//! |----------|------|
//! | Linux | `~/.config/filepulse/config.toml` |
//! | macOS | `~/Library/Application Support/FilePulse/config.toml` |
//! | Windows | `%APPDATA%\FilePulse\config.toml` |
//!
//! ## Example
//!
//! ```rust,ignore
//! use filepulse_core::config::Config;
//!
//! let config = Config::load()?;
//! println!("Watching: {}", config.watch.file.display());
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Main configuration struct for FilePulse.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Watched file settings
    pub watch: WatchConfig,
    /// HTTP server settings
    pub server: ServerConfig,
    /// Delivery cadence settings
    pub delivery: DeliveryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            watch: WatchConfig::default(),
            server: ServerConfig::default(),
            delivery: DeliveryConfig::default(),
        }
    }
}

/// Watched file configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Path of the watched file
    pub file: PathBuf,
    /// Quiet window for coalescing bursts of file system events
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from(crate::DEFAULT_WATCH_FILE),
            debounce_ms: crate::DEFAULT_DEBOUNCE_MS,
        }
    }
}

/// HTTP server configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,
    /// Bind to localhost only
    pub localhost_only: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: crate::DEFAULT_SERVER_PORT,
            localhost_only: false,
        }
    }
}

/// Delivery cadence configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Poll cadence of the push-stream transport
    #[serde(with = "humantime_serde")]
    pub stream_interval: Duration,
    /// Poll cadence of the long-poll transport
    #[serde(with = "humantime_serde")]
    pub live_interval: Duration,
    /// Hard wall-clock deadline of a long-poll connection
    #[serde(with = "humantime_serde")]
    pub live_deadline: Duration,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            stream_interval: crate::DEFAULT_STREAM_INTERVAL,
            live_interval: crate::DEFAULT_LIVE_INTERVAL,
            live_deadline: crate::DEFAULT_LIVE_DEADLINE,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// If the configuration file doesn't exist, returns the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| crate::error::Error::Config(format!("Failed to read config: {e}")))?;

        toml::from_str(&content)
            .map_err(|e| crate::error::Error::Config(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to the default location.
    ///
    /// Creates the configuration directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be written.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                crate::error::Error::Config(format!("Failed to create config directory: {e}"))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::Error::Config(format!("Failed to serialize config: {e}")))?;

        std::fs::write(&path, content)
            .map_err(|e| crate::error::Error::Config(format!("Failed to write config: {e}")))
    }

    /// Get the default configuration directory path.
    #[must_use]
    pub fn config_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "filepulse", "FilePulse")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the full path to the configuration file.
    #[must_use]
    pub fn config_path() -> PathBuf {
        Self::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("config.toml")
    }
}

mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("{}s", duration.as_secs()))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.strip_suffix('s')
            .map(|secs| {
                secs.parse()
                    .map(Duration::from_secs)
                    .map_err(serde::de::Error::custom)
            })
            .or_else(|| {
                s.strip_suffix('m').map(|mins| {
                    mins.parse::<u64>()
                        .map(|m| Duration::from_secs(m * 60))
                        .map_err(serde::de::Error::custom)
                })
            })
            .unwrap_or_else(|| Err(serde::de::Error::custom("invalid duration format")))
    }
}
