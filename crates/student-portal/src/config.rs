//! Configuration for the student portal.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Portal configuration.
///
/// Built once at startup and handed to the pieces that need it. Every field
/// has a default, so an empty environment yields a working setup listening on
/// all interfaces at port 5000 with `database.db` in the working directory.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Notice cookie signing
    #[serde(default)]
    pub session: SessionConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Path to the SQLite database file
    #[serde(default = "default_store_path")]
    pub path: PathBuf,

    /// How long a connection waits on a locked database
    #[serde(default = "default_busy_timeout", with = "humantime_serde")]
    pub busy_timeout: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Key used to sign notice cookies
    #[serde(default = "default_secret_key")]
    pub secret_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            port: default_port(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            busy_timeout: default_busy_timeout(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret_key: default_secret_key(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_listen_addr() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    5000
}

fn default_store_path() -> PathBuf {
    PathBuf::from("database.db")
}

fn default_busy_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_secret_key() -> String {
    "student_portal_secret_key_2025".into()
}

fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Nested fields use `__` as separator, e.g. `SERVER__PORT=8080`.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(false),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();

        assert_eq!(config.server.listen_addr, "0.0.0.0");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.store.path, PathBuf::from("database.db"));
        assert_eq!(config.store.busy_timeout, Duration::from_secs(5));
        assert_eq!(config.log.level, "info");
        assert!(!config.session.secret_key.is_empty());
    }

    #[test]
    fn test_deserialize_partial() {
        let json = r#"{
            "server": { "port": 8080 },
            "store": { "path": "/tmp/students.db", "busy_timeout": "250ms" }
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.listen_addr, "0.0.0.0");
        assert_eq!(config.store.path, PathBuf::from("/tmp/students.db"));
        assert_eq!(config.store.busy_timeout, Duration::from_millis(250));
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_string_values_deserialize() {
        // Environment values arrive as strings, as with `try_parsing(false)`
        let config: Config = config::Config::builder()
            .set_override("server.port", "8080")
            .unwrap()
            .set_override("session.secret_key", "12345")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.session.secret_key, "12345");
    }
}
