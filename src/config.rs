//! Command-line configuration.
//!
//! Configuration is loaded in the following order (later overrides earlier):
//! 1. Default values
//! 2. YAML config file (if specified via --config or ORIENTWIRE_CONFIG)
//! 3. Command-line flags, or their ORIENTWIRE_* environment variables

use orientwire_client::ConnectionConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server address and server-level credentials.
    pub server: ServerConfig,
    /// Database name and database-level credentials.
    pub database: DatabaseConfig,
}

impl Config {
    /// Loads the config file if one is given, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                let config = Self::from_file(path)?;
                tracing::debug!("Loaded config from {}", path.display());
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }

    /// Loads configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.to_path_buf(), e))?;
        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;
        Ok(config)
    }

    /// Connection settings for server-level commands.
    pub fn server_connection(&self) -> ConnectionConfig {
        self.server
            .connection()
            .with_credentials(&self.server.user, &self.server.password)
    }

    /// Connection settings for database-level commands.
    pub fn database_connection(&self) -> ConnectionConfig {
        self.server
            .connection()
            .with_credentials(&self.database.user, &self.database.password)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.is_empty() {
            return Err(ConfigError::ValidationError(
                "server.host must not be empty".to_string(),
            ));
        }
        if self.server.request_timeout_secs == 0 || self.server.connect_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "timeouts must be at least one second".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Server user, for CONNECT and SHUTDOWN.
    pub user: String,
    pub password: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub client_id: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: orientwire_client::connection::DEFAULT_HOST.to_string(),
            port: orientwire_protocol::DEFAULT_PORT,
            user: "root".to_string(),
            password: String::new(),
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
            client_id: None,
        }
    }
}

impl ServerConfig {
    fn connection(&self) -> ConnectionConfig {
        let mut config = ConnectionConfig::new(&self.host, self.port)
            .with_connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .with_request_timeout(Duration::from_secs(self.request_timeout_secs));
        if let Some(client_id) = &self.client_id {
            config = config.with_client_id(client_id);
        }
        config
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database opened by database-level commands.
    pub name: Option<String>,
    /// Database user, for DB_OPEN.
    pub user: String,
    pub password: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            name: None,
            user: "admin".to_string(),
            password: "admin".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(PathBuf, std::io::Error),
    ParseError(PathBuf, String),
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(path, e) => {
                write!(f, "failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::ValidationError(msg) => {
                write!(f, "configuration validation failed: {}", msg)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.host, "localhost");
        assert_eq!(config.server.port, 2424);
        assert!(config.database.name.is_none());
        config.validate().unwrap();

        let conn = config.database_connection();
        assert_eq!(conn.user, "admin");
        assert_eq!(conn.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_load_without_file() {
        let config = Config::load(None).unwrap();
        assert_eq!(config.server.port, 2424);
    }

    #[test]
    fn test_from_file_partial() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "server:\n  host: db.internal\n  port: 2425\n  client_id: batch\ndatabase:\n  name: demo"
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.server.host, "db.internal");
        assert_eq!(config.server.port, 2425);
        assert_eq!(config.server.user, "root");
        assert_eq!(config.database.name.as_deref(), Some("demo"));
        assert_eq!(config.database.user, "admin");

        let conn = config.server_connection();
        assert_eq!(conn.addr(), "db.internal:2425");
        assert_eq!(conn.client_id.as_deref(), Some("batch"));
    }

    #[test]
    fn test_from_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.yaml");
        assert!(matches!(
            Config::from_file(&missing),
            Err(ConfigError::IoError(..))
        ));

        let bad = dir.path().join("bad.yaml");
        std::fs::write(&bad, "server: [not, a, map]").unwrap();
        let err = Config::from_file(&bad).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(..)));
        assert!(err.to_string().contains("bad.yaml"));
    }

    #[test]
    fn test_validation() {
        let mut config = Config::default();
        config.server.request_timeout_secs = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }
}
