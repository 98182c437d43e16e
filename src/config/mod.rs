//! Configuration management.

use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration for agora.
#[derive(Debug, Clone)]
pub struct AgoraConfig {
    /// Path to the `SQLite` database file.
    pub database: PathBuf,
    /// Address the HTTP server binds to.
    pub bind: String,
    /// Port the HTTP server listens on.
    pub port: u16,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// Database file path.
    pub database: Option<String>,
    /// Bind address.
    pub bind: Option<String>,
    /// Listen port.
    pub port: Option<u16>,
}

impl Default for AgoraConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("data.db"),
            bind: "127.0.0.1".to_string(),
            port: 2015,
        }
    }
}

impl AgoraConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &std::path::Path) -> crate::Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| crate::Error::OperationFailed {
                operation: "read_config_file".to_string(),
                cause: e.to_string(),
            })?;

        let file: ConfigFile =
            toml::from_str(&contents).map_err(|e| crate::Error::OperationFailed {
                operation: "parse_config_file".to_string(),
                cause: e.to_string(),
            })?;

        Ok(Self::from_config_file(file))
    }

    /// Loads configuration from `agora.toml` in the working directory,
    /// falling back to defaults when the file is absent or unreadable.
    #[must_use]
    pub fn load_default() -> Self {
        let local = PathBuf::from("agora.toml");
        if local.exists() {
            if let Ok(config) = Self::load_from_file(&local) {
                return config;
            }
        }
        Self::default()
    }

    /// Converts a `ConfigFile` to `AgoraConfig`.
    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(database) = file.database {
            config.database = PathBuf::from(database);
        }
        if let Some(bind) = file.bind {
            config.bind = bind;
        }
        if let Some(port) = file.port {
            config.port = port;
        }

        config
    }

    /// Sets the database file path.
    #[must_use]
    pub fn with_database(mut self, path: impl Into<PathBuf>) -> Self {
        self.database = path.into();
        self
    }

    /// Sets the bind address.
    #[must_use]
    pub fn with_bind(mut self, bind: impl Into<String>) -> Self {
        self.bind = bind.into();
        self
    }

    /// Sets the listen port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AgoraConfig::default();
        assert_eq!(config.database, PathBuf::from("data.db"));
        assert_eq!(config.bind, "127.0.0.1");
        assert_eq!(config.port, 2015);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let file: ConfigFile = toml::from_str("port = 8080").unwrap();
        let config = AgoraConfig::from_config_file(file);
        assert_eq!(config.port, 8080);
        assert_eq!(config.database, PathBuf::from("data.db"));
        assert_eq!(config.bind, "127.0.0.1");
    }

    #[test]
    fn test_full_file_overrides_everything() {
        let file: ConfigFile = toml::from_str(
            "database = \"/var/lib/agora/agora.db\"\nbind = \"0.0.0.0\"\nport = 80",
        )
        .unwrap();
        let config = AgoraConfig::from_config_file(file);
        assert_eq!(config.database, PathBuf::from("/var/lib/agora/agora.db"));
        assert_eq!(config.bind, "0.0.0.0");
        assert_eq!(config.port, 80);
    }
}
