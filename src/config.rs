use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming the configuration file
pub const CONFIG_ENV: &str = "DASHBOARD_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "dashboard.json";
pub const PORT_ENV: &str = "PORT";

/// Settings for the web gateway
///
/// Every field has a default, so a configuration file only needs the values
/// it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// The canonical workbook served for download and replaced by uploads
    pub workbook_path: PathBuf,
    /// Directory of static assets; its `index.html` is the dashboard page
    pub static_root: PathBuf,
    pub credentials_path: PathBuf,
    pub session_ttl_secs: u64,
    pub max_upload_bytes: usize,
    /// Keep a gzip copy of the previous workbook when an upload replaces it
    pub keep_backup: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 5000,
            workbook_path: PathBuf::from("Solution List.xlsx"),
            static_root: PathBuf::from("public"),
            credentials_path: PathBuf::from("database/users.json"),
            session_ttl_secs: 24 * 60 * 60,
            max_upload_bytes: 20 * 1024 * 1024,
            keep_backup: true,
        }
    }
}

impl ServerConfig {
    /// Load the configuration the server starts with
    ///
    /// Reads the file named by `DASHBOARD_CONFIG` (or `dashboard.json`), falls
    /// back to defaults when it does not exist, then applies `PORT`.
    pub fn load() -> Result<Self, ConfigError> {
        let path = env::var(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

        Self::from_file_or_default(&path)?.apply_env(|key| env::var(key).ok())
    }

    pub fn from_file_or_default(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(text) => {
                log::info!("Loaded configuration from {}", path.display());
                serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
                    path: path.to_path_buf(),
                    source,
                })
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::info!("No configuration at {}, using defaults", path.display());
                Ok(ServerConfig::default())
            }
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Apply environment overrides, reading variables through `lookup`
    pub fn apply_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup(PORT_ENV) {
            self.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort(port.clone()))?;
        }
        Ok(self)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}
