mod config;
pub mod database;
pub mod migrations;

pub use config::{Config, DatabaseConfig, GoogleConfig, ServerConfig};
pub use database::{Database, Table};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/vapi-todo[-dev]/` based on VAPI_TODO_ENV.
///
/// Set VAPI_TODO_ENV=dev to use development data directory.
/// VAPI_TODO_DATA_DIR overrides the location entirely.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("VAPI_TODO_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("VAPI_TODO_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("vapi-todo-dev")
            } else {
                base_dir.join("vapi-todo")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|_| ConfigError::NoDataDir)?;
    Ok(dir)
}
