//! TOML-based application configuration.
//!
//! Stores:
//! - HTTP bind address and route prefix
//! - Database location
//! - Google Calendar mirroring settings (calendar, time zone, token and
//!   client-registration file locations, OAuth redirect port)
//!
//! Configuration is stored at `~/.config/vapi-todo/config.toml`.
//! Relative paths are resolved against the same directory.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_route_prefix")]
    pub route_prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_path")]
    pub path: String,
}

/// Google Calendar mirroring configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleConfig {
    /// Mirror records to Google Calendar at all.
    #[serde(default = "default_true")]
    pub sync_enabled: bool,
    #[serde(default = "default_calendar_id")]
    pub calendar_id: String,
    /// Time zone name attached to event start/end.
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_token_file")]
    pub token_file: String,
    #[serde(default = "default_credentials_file")]
    pub credentials_file: String,
    /// Loopback port for the consent redirect. 0 picks a free port.
    #[serde(default)]
    pub redirect_port: u16,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/vapi-todo/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub google: GoogleConfig,
}

// Default functions
fn default_bind() -> String {
    "127.0.0.1:8000".into()
}
fn default_route_prefix() -> String {
    "/vapi_project".into()
}
fn default_database_path() -> String {
    "vapi_todo.db".into()
}
fn default_true() -> bool {
    true
}
fn default_calendar_id() -> String {
    "primary".into()
}
fn default_time_zone() -> String {
    "UTC".into()
}
fn default_api_base() -> String {
    crate::calendar::DEFAULT_API_BASE.into()
}
fn default_token_file() -> String {
    "token.json".into()
}
fn default_credentials_file() -> String {
    "credentials.json".into()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            route_prefix: default_route_prefix(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            sync_enabled: true,
            calendar_id: default_calendar_id(),
            time_zone: default_time_zone(),
            api_base: default_api_base(),
            token_file: default_token_file(),
            credentials_file: default_credentials_file(),
            redirect_port: 0,
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        if key.is_empty() {
            return Err(unknown());
        }

        let mut parts = key.split('.').peekable();
        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        let n = value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?;
                        serde_json::Value::Number(n.into())
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Location of `config.toml`.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or create the default file.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing defaults there if it is missing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Resolve a configured file name against `base`, leaving absolute paths alone.
    pub fn resolve(base: &Path, configured: &str) -> PathBuf {
        let path = Path::new(configured);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base.join(path)
        }
    }

    pub fn database_path(&self) -> Result<PathBuf, ConfigError> {
        Ok(Self::resolve(&data_dir()?, &self.database.path))
    }

    pub fn token_path(&self) -> Result<PathBuf, ConfigError> {
        Ok(Self::resolve(&data_dir()?, &self.google.token_file))
    }

    pub fn credentials_path(&self) -> Result<PathBuf, ConfigError> {
        Ok(Self::resolve(&data_dir()?, &self.google.credentials_file))
    }
}
