//! # Configuration Management Module
//!
//! Loads and writes the TOML configuration used by the `snakeladder` binary.
//! Every section has defaults, so a partial file (or none at all, via
//! [`Config::default`]) is enough to play.
//!
//! ## Configuration Structure
//!
//! - [`GameConfig`] - titles and the guest banner shown by the terminal front end
//! - [`AuthConfig`] - demo account seeding
//! - [`StorageConfig`] - backend selection, data directory, retention window
//! - [`LoggingConfig`] - log level and optional log files
//!
//! ## Usage
//!
//! ```rust,no_run
//! use snakeladder::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Config::create_default("config.toml").await?;
//!     let config = Config::load("config.toml").await?;
//!     println!("Data dir: {}", config.storage.data_dir);
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration File Format
//!
//! ```toml
//! [game]
//! title = "Snakes & Ladders"
//!
//! [auth]
//! seed_demo_account = true
//!
//! [storage]
//! data_dir = "./data"
//! backend = "files"     # files | sled | memory
//! retention_days = 30
//!
//! [logging]
//! level = "info"
//! file = "snakeladder.log"
//! ```

use std::fmt;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::storage::retention::DEFAULT_RETENTION_DAYS;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(default = "default_title")]
    pub title: String,
    /// Shown whenever a guest session starts.
    #[serde(default = "default_guest_notice")]
    pub guest_notice: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Create `test` / `test123` when no accounts exist yet.
    #[serde(default = "default_true")]
    pub seed_demo_account: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// One JSON file per key in `data_dir`.
    #[default]
    Files,
    /// Embedded sled database at `data_dir/kv.sled`.
    Sled,
    /// Nothing is written to disk.
    Memory,
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StorageBackend::Files => "files",
            StorageBackend::Sled => "sled",
            StorageBackend::Memory => "memory",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default)]
    pub backend: StorageBackend,
    /// Stamped records older than this many days are purged at startup and
    /// by `housekeep`. 0 disables both.
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub security_file: Option<String>,
}

fn default_title() -> String {
    "Snakes & Ladders".to_string()
}

fn default_guest_notice() -> String {
    "Playing as guest: progress is shared by every guest on this machine".to_string()
}

fn default_true() -> bool {
    true
}

fn default_data_dir() -> String {
    "./data".to_string()
}

fn default_retention_days() -> i64 {
    DEFAULT_RETENTION_DAYS
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            title: default_title(),
            guest_notice: default_guest_notice(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        AuthConfig {
            seed_demo_account: true,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            data_dir: default_data_dir(),
            backend: StorageBackend::default(),
            retention_days: default_retention_days(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            file: Some("snakeladder.log".to_string()),
            security_file: Some("snakeladder-security.log".to_string()),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        Self::from_toml(&content).map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        if config.storage.retention_days < 0 {
            return Err(anyhow!(
                "storage.retention_days must not be negative (got {})",
                config.storage.retention_days
            ));
        }
        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.storage.data_dir, "./data");
        assert_eq!(config.storage.backend, StorageBackend::Files);
        assert_eq!(config.storage.retention_days, 30);
        assert!(config.auth.seed_demo_account);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::from_toml(
            r#"
            [storage]
            backend = "sled"

            [auth]
            seed_demo_account = false
            "#,
        )
        .unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Sled);
        assert_eq!(config.storage.data_dir, "./data");
        assert!(!config.auth.seed_demo_account);
        assert_eq!(config.game.title, "Snakes & Ladders");
    }

    #[test]
    fn test_unknown_backend_rejected() {
        assert!(Config::from_toml("[storage]\nbackend = \"redis\"\n").is_err());
        assert!(Config::from_toml("[storage]\nretention_days = -1\n").is_err());
    }

    #[test]
    fn test_default_roundtrips_through_toml() {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        assert!(text.contains("backend = \"files\""));
        let back = Config::from_toml(&text).unwrap();
        assert_eq!(back.storage.retention_days, 30);
        assert_eq!(
            back.logging.security_file.as_deref(),
            Some("snakeladder-security.log")
        );
    }

    #[test]
    fn test_backend_display() {
        assert_eq!(StorageBackend::Memory.to_string(), "memory");
        assert_eq!(StorageBackend::Sled.to_string(), "sled");
    }
}
