//! Core error types for vapi-todo-core.
//!
//! Local failures (database, configuration, validation, missing records)
//! travel through [`CoreError`]. Failures of the remote calendar leg have
//! their own type, [`crate::calendar::RemoteError`], because they are never
//! surfaced to a tool caller.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for vapi-todo-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// OAuth-related errors
    #[error("OAuth error: {0}")]
    OAuth(#[from] OAuthError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Referenced local record does not exist
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: i64 },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    /// True when no credential source at all could be found.
    pub fn is_missing_credentials(&self) -> bool {
        matches!(self, CoreError::Config(ConfigError::MissingCredentials { .. }))
    }
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// Neither a saved token nor a client registration is available
    #[error(
        "Google credentials not found in environment variable '{env_var}' or file '{}'. \
         Set the environment variable or download the credentials file from Google Cloud Console.",
        path.display()
    )]
    MissingCredentials { env_var: &'static str, path: PathBuf },

    /// Could not determine or create the data directory
    #[error("Could not determine data directory")]
    NoDataDir,
}

/// OAuth-specific errors.
#[derive(Error, Debug)]
pub enum OAuthError {
    /// Authorization failed
    #[error("Authorization failed: {0}")]
    AuthorizationFailed(String),

    /// Token exchange failed
    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(String),

    /// Token refresh failed
    #[error("Token refresh failed: {0}")]
    TokenRefreshFailed(String),

    /// Invalid callback
    #[error("Invalid OAuth callback: {0}")]
    InvalidCallback(String),

    /// Client registration present but unusable
    #[error("Invalid client registration: {0}")]
    InvalidClientSecrets(String),
}

/// Validation errors raised while reading an inbound tool call.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Body is empty, `null` or `{}`
    #[error("Invalid JSON payload.")]
    EmptyPayload,

    /// Body is not a well-formed tool-call envelope
    #[error("Invalid request format: {0}")]
    MalformedEnvelope(String),

    /// No tool call in the envelope matches the route
    #[error("Tool call with function name '{0}' not found.")]
    ToolCallNotFound(String),

    /// Tool name is not one this service implements
    #[error("Unknown tool '{0}'")]
    UnknownTool(String),

    /// Required argument absent
    #[error("Missing '{0}' in arguments.")]
    MissingArgument(&'static str),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg)
                if e.code == rusqlite::ErrorCode::DatabaseLocked =>
            {
                DatabaseError::Locked
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credentials_is_detected() {
        let err: CoreError = ConfigError::MissingCredentials {
            env_var: "GOOGLE_CREDENTIALS_B64",
            path: PathBuf::from("credentials.json"),
        }
        .into();
        assert!(err.is_missing_credentials());
        assert!(err.to_string().contains("GOOGLE_CREDENTIALS_B64"));
    }

    #[test]
    fn not_found_message_names_kind() {
        let err = CoreError::NotFound { kind: "todo", id: 7 };
        assert_eq!(err.to_string(), "todo 7 not found");
        assert!(!err.is_missing_credentials());
    }

    #[test]
    fn rusqlite_errors_become_query_failures() {
        let err: DatabaseError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, DatabaseError::QueryFailed(_)));
    }
}
