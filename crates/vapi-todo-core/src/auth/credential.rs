//! The Google authorization credential and its encoded forms.
//!
//! A credential travels as JSON, optionally wrapped in standard base64 so it
//! fits in a single environment variable (`GOOGLE_TOKEN_B64`).

use std::fmt;
use std::path::Path;

use base64::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Google's OAuth token endpoint.
pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Seconds before `expires_at` at which the access token is treated as expired.
const EXPIRY_SKEW_SECS: i64 = 60;

/// OAuth tokens plus what is needed to refresh them.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Unix timestamp.
    #[serde(default)]
    pub expires_at: Option<i64>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_type() -> String {
    "Bearer".into()
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.into()
}

// Token material stays out of logs and panics.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("expires_at", &self.expires_at)
            .field("token_type", &self.token_type)
            .field("scope", &self.scope)
            .field("client_id", &self.client_id)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

impl Credential {
    /// True when the access token has expired or will within the skew window.
    /// A credential without an expiry never expires.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(chrono::Utc::now().timestamp())
    }

    pub fn is_expired_at(&self, now: i64) -> bool {
        match self.expires_at {
            Some(exp) => now > exp - EXPIRY_SKEW_SECS,
            None => false,
        }
    }

    pub fn can_refresh(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// JSON, then standard base64.
    pub fn encode(&self) -> Result<String, ConfigError> {
        let json =
            serde_json::to_vec(self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Ok(BASE64_STANDARD.encode(json))
    }

    pub fn decode(blob: &str) -> Result<Self, ConfigError> {
        let bytes = BASE64_STANDARD
            .decode(blob.trim())
            .map_err(|e| ConfigError::ParseFailed(format!("credential is not base64: {e}")))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| ConfigError::ParseFailed(format!("credential is not valid JSON: {e}")))
    }

    /// Read a cached credential. The file may hold plain JSON or the base64 form.
    ///
    /// Returns `Ok(None)` if the file does not exist.
    pub fn read_file(path: &Path) -> Result<Option<Self>, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })
            }
        };

        let trimmed = content.trim();
        let credential = if trimmed.starts_with('{') {
            serde_json::from_str(trimmed).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
        } else {
            Self::decode(trimmed)?
        };
        Ok(Some(credential))
    }

    /// Write the credential as JSON, owner-only on unix.
    pub fn write_file(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };

        let contents =
            serde_json::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| save_failed(e.to_string()))?;
        }

        std::fs::write(path, contents).map_err(|e| save_failed(e.to_string()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
                .map_err(|e| save_failed(e.to_string()))?;
        }

        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn sample(expires_at: Option<i64>) -> Credential {
    Credential {
        access_token: "ya29.access".to_string(),
        refresh_token: Some("1//refresh".to_string()),
        expires_at,
        token_type: "Bearer".to_string(),
        scope: Some(super::CALENDAR_SCOPE.to_string()),
        client_id: "client-id.apps.googleusercontent.com".to_string(),
        client_secret: "client-secret".to_string(),
        token_uri: GOOGLE_TOKEN_URI.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn expiry_uses_sixty_second_skew() {
        let cred = sample(Some(1_000));
        assert!(!cred.is_expired_at(900));
        assert!(cred.is_expired_at(941));
        assert!(!sample(None).is_expired_at(i64::MAX));
    }

    #[test]
    fn encode_decode_preserves_credential() {
        let cred = sample(Some(1_700_000_000));
        let blob = cred.encode().unwrap();
        assert!(!blob.contains('{'));
        assert_eq!(Credential::decode(&format!("  {blob}\n")).unwrap(), cred);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(Credential::decode("%%% not base64").is_err());
        let not_json = BASE64_STANDARD.encode("hello");
        assert!(Credential::decode(&not_json).is_err());
    }

    #[test]
    fn minimal_json_gets_defaults() {
        let cred: Credential = serde_json::from_str(r#"{"access_token":"abc"}"#).unwrap();
        assert_eq!(cred.token_type, "Bearer");
        assert_eq!(cred.token_uri, GOOGLE_TOKEN_URI);
        assert!(!cred.can_refresh());
    }

    #[test]
    fn debug_output_redacts_tokens() {
        let rendered = format!("{:?}", sample(None));
        assert!(!rendered.contains("ya29.access"));
        assert!(!rendered.contains("1//refresh"));
        assert!(!rendered.contains("client-secret"));
    }

    #[test]
    fn file_roundtrip_accepts_json_and_base64() {
        let dir = TempDir::new().unwrap();
        let cred = sample(Some(42));

        let json_path = dir.path().join("nested").join("token.json");
        cred.write_file(&json_path).unwrap();
        assert_eq!(Credential::read_file(&json_path).unwrap(), Some(cred.clone()));

        let b64_path = dir.path().join("token.b64");
        std::fs::write(&b64_path, cred.encode().unwrap()).unwrap();
        assert_eq!(Credential::read_file(&b64_path).unwrap(), Some(cred));

        assert_eq!(
            Credential::read_file(&dir.path().join("missing.json")).unwrap(),
            None
        );
    }

    #[cfg(unix)]
    #[test]
    fn cache_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("token.json");
        sample(None).write_file(&path).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
