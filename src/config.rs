//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Event store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// SQLite database file, or `:memory:` for an in-memory store
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

fn default_db_path() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("tally").join("events.db").to_string_lossy().to_string())
        .unwrap_or_else(|| "./tally_data/events.db".to_string())
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

impl StorageConfig {
    /// Whether the store should live in memory only
    pub fn is_in_memory(&self) -> bool {
        self.db_path == ":memory:"
    }

    /// Database path with a leading `~/` expanded to the home directory
    pub fn resolved_db_path(&self) -> PathBuf {
        match (self.db_path.strip_prefix("~/"), dirs::home_dir()) {
            (Some(rest), Some(home)) => home.join(rest),
            _ => PathBuf::from(&self.db_path),
        }
    }
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Allowed CORS origins; empty allows any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8090
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_body_size() -> usize {
    10 * 1024 * 1024 // 10 MB
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
            request_timeout_secs: default_request_timeout(),
            max_body_size: default_max_body_size(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::from_toml(&content).map_err(|e| match e {
            ConfigError::Parse { error, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                error,
            },
            other => other,
        })
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: PathBuf::new(),
            error: e.to_string(),
        })
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Config file to use: `TALLY_CONFIG` if set, else the first existing
    /// default location, else `None`
    ///
    /// A `TALLY_CONFIG` path that does not exist is an error.
    pub fn locate() -> Result<Option<PathBuf>, ConfigError> {
        Self::locate_with(
            std::env::var("TALLY_CONFIG").ok(),
            &Self::default_locations(),
        )
    }

    fn default_locations() -> Vec<PathBuf> {
        [
            dirs::config_dir().map(|p| p.join("tally").join("config.toml")),
            Some(PathBuf::from("/etc/tally/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    fn locate_with(
        explicit: Option<String>,
        candidates: &[PathBuf],
    ) -> Result<Option<PathBuf>, ConfigError> {
        if let Some(path) = explicit {
            let path = PathBuf::from(path);
            if !path.exists() {
                return Err(ConfigError::Io {
                    path,
                    error: "file set by TALLY_CONFIG does not exist".to_string(),
                });
            }
            return Ok(Some(path));
        }

        Ok(candidates.iter().find(|p| p.exists()).cloned())
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(db_path) = var("TALLY_DB_PATH") {
            self.storage.db_path = db_path;
        }

        if let Some(host) = var("TALLY_API_HOST") {
            self.api.host = host;
        }
        if let Some(port) = var("TALLY_API_PORT").and_then(|p| p.parse().ok()) {
            self.api.port = port;
        }
        if let Some(secs) = var("TALLY_REQUEST_TIMEOUT_SECS").and_then(|s| s.parse().ok()) {
            self.api.request_timeout_secs = secs;
        }

        if let Some(level) = var("TALLY_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("TALLY_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Tally Configuration
#
# Environment variables override these settings:
# - TALLY_DB_PATH
# - TALLY_API_HOST
# - TALLY_API_PORT
# - TALLY_REQUEST_TIMEOUT_SECS
# - TALLY_LOG_LEVEL
# - TALLY_LOG_FORMAT

[storage]
# SQLite database holding the events (":memory:" keeps them in memory)
db_path = "~/.local/share/tally/events.db"

[api]
# API server host
host = "0.0.0.0"

# API server port
port = 8090

# Allowed CORS origins (empty allows any origin)
cors_origins = []

# Per-request timeout in seconds
request_timeout_secs = 30

# Maximum request body size in bytes
max_body_size = 10485760

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_resolved_db_path() {
        let storage = StorageConfig {
            db_path: "/var/lib/tally/events.db".to_string(),
        };
        assert_eq!(storage.resolved_db_path(), PathBuf::from("/var/lib/tally/events.db"));

        let storage = StorageConfig {
            db_path: "~/tally/events.db".to_string(),
        };
        if let Some(home) = dirs::home_dir() {
            assert_eq!(storage.resolved_db_path(), home.join("tally/events.db"));
        }
    }

    #[test]
    fn test_default_config_parses() {
        let config = Config::from_toml(&generate_default_config()).unwrap();
        assert_eq!(config.api.port, 8090);
        assert_eq!(config.api.request_timeout_secs, 30);
        assert!(config.api.cors_origins.is_empty());
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = Config::from_toml("[api]\nport = 9000\n").unwrap();
        assert_eq!(config.api.port, 9000);
        assert_eq!(config.api.host, "0.0.0.0");
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_invalid_toml() {
        let result = Config::from_toml("[api\nport = ");
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[storage]\ndb_path = \":memory:\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert!(config.storage.is_in_memory());

        let missing = Config::load(&dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_locate_explicit_path_must_exist() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.toml");

        let result = Config::locate_with(Some(missing.to_string_lossy().to_string()), &[]);
        assert!(matches!(result, Err(ConfigError::Io { path, .. }) if path == missing));

        let present = dir.path().join("config.toml");
        std::fs::write(&present, "").unwrap();
        let fallback = dir.path().join("other.toml");
        std::fs::write(&fallback, "").unwrap();

        let found =
            Config::locate_with(Some(present.to_string_lossy().to_string()), &[fallback]).unwrap();
        assert_eq!(found, Some(present));
    }

    #[test]
    fn test_locate_first_existing_default() {
        let dir = tempdir().unwrap();
        let first = dir.path().join("a.toml");
        let second = dir.path().join("b.toml");
        std::fs::write(&second, "").unwrap();

        let found = Config::locate_with(None, &[first.clone(), second.clone()]).unwrap();
        assert_eq!(found, Some(second));

        std::fs::remove_file(dir.path().join("b.toml")).unwrap();
        assert_eq!(Config::locate_with(None, &[first]).unwrap(), None);
    }

    #[test]
    fn test_broken_config_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[api\nport = ").unwrap();

        let located = Config::locate_with(Some(path.to_string_lossy().to_string()), &[]).unwrap();
        let result = Config::load_with_env(&located.unwrap());
        assert!(matches!(result, Err(ConfigError::Parse { path: p, .. }) if p == path));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("TALLY_DB_PATH", "/tmp/events.db"),
            ("TALLY_API_PORT", "9100"),
            ("TALLY_REQUEST_TIMEOUT_SECS", "not-a-number"),
            ("TALLY_LOG_FORMAT", "json"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.storage.db_path, "/tmp/events.db");
        assert_eq!(config.api.port, 9100);
        assert_eq!(config.api.request_timeout_secs, 30);
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.level, "info");
    }
}
