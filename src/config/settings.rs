//! TOML-based configuration with CLI-friendly defaults.
//!
//! Every value has a default, so a bare `starlog` invocation works
//! against a local MariaDB. An optional `starlog.toml` overrides the
//! defaults and command-line flags override the file.
//!
//! Example configuration:
//! ```toml
//! [http]
//! host = "0.0.0.0"
//! port = 3000
//!
//! [mariadb]
//! user = "energylabel"
//! password = "energylabel"
//! database = "energylabel"
//! host = "localhost"
//! port = 3306
//! conn_limit = 50
//! column_store = true
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// HTTP listener configuration.
    pub http: HttpSettings,

    /// Warehouse connection configuration.
    pub mariadb: MariadbSettings,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpSettings {
    pub host: String,
    pub port: u16,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3000,
        }
    }
}

/// Warehouse connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MariadbSettings {
    pub user: String,
    pub password: String,
    pub database: String,
    pub host: String,
    pub port: u16,

    /// Connection pool size.
    pub conn_limit: u32,

    /// Emit `ENGINE = ColumnStore` in CREATE TABLE statements.
    pub column_store: bool,
}

impl Default for MariadbSettings {
    fn default() -> Self {
        Self {
            user: "energylabel".to_string(),
            password: "energylabel".to_string(),
            database: "energylabel".to_string(),
            host: "localhost".to_string(),
            port: 3306,
            conn_limit: 50,
            column_store: true,
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Load settings from the default locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `STARLOG_CONFIG`
    /// 2. `./starlog.toml`
    /// 3. Built-in defaults
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("STARLOG_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("starlog.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        Ok(Settings::default())
    }
}
