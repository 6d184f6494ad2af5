//! OAuth client registration as downloaded from Google Cloud Console
//! (`credentials.json`).

use std::io::Write;
use std::path::Path;

use base64::prelude::*;
use serde::Deserialize;

use super::credential::GOOGLE_TOKEN_URI;
use crate::error::OAuthError;

const GOOGLE_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";

/// Client id/secret and the endpoints they are registered against.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_auth_uri() -> String {
    GOOGLE_AUTH_URI.into()
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.into()
}

impl std::fmt::Debug for ClientSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSecrets")
            .field("client_id", &self.client_id)
            .field("auth_uri", &self.auth_uri)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

/// Desktop apps get an `installed` section, web clients a `web` one.
#[derive(Deserialize)]
struct ClientSecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

impl ClientSecrets {
    pub fn from_json(json: &str) -> Result<Self, OAuthError> {
        let file: ClientSecretsFile = serde_json::from_str(json)
            .map_err(|e| OAuthError::InvalidClientSecrets(e.to_string()))?;
        file.installed.or(file.web).ok_or_else(|| {
            OAuthError::InvalidClientSecrets("expected an 'installed' or 'web' section".into())
        })
    }

    /// Returns `Ok(None)` if the file does not exist.
    pub fn read_file(path: &Path) -> Result<Option<Self>, OAuthError> {
        match std::fs::read_to_string(path) {
            Ok(json) => Self::from_json(&json).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(OAuthError::InvalidClientSecrets(format!(
                "{}: {e}",
                path.display()
            ))),
        }
    }

    /// Decode a base64 `credentials.json` through a temporary file, which is
    /// removed again before returning.
    pub fn from_base64(blob: &str) -> Result<Self, OAuthError> {
        let bytes = BASE64_STANDARD
            .decode(blob.trim())
            .map_err(|e| OAuthError::InvalidClientSecrets(format!("not base64: {e}")))?;

        let mut tmp = tempfile::Builder::new()
            .prefix("vapi-todo-credentials-")
            .suffix(".json")
            .tempfile()
            .map_err(|e| OAuthError::InvalidClientSecrets(e.to_string()))?;
        tmp.write_all(&bytes)
            .and_then(|()| tmp.flush())
            .map_err(|e| OAuthError::InvalidClientSecrets(e.to_string()))?;

        let secrets = Self::read_file(tmp.path())?;
        tmp.close()
            .map_err(|e| OAuthError::InvalidClientSecrets(e.to_string()))?;

        secrets.ok_or_else(|| OAuthError::InvalidClientSecrets("temporary file vanished".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const INSTALLED: &str = r#"{
        "installed": {
            "client_id": "abc.apps.googleusercontent.com",
            "project_id": "vapi",
            "auth_uri": "https://accounts.google.com/o/oauth2/auth",
            "token_uri": "https://oauth2.googleapis.com/token",
            "client_secret": "shh",
            "redirect_uris": ["http://localhost"]
        }
    }"#;

    #[test]
    fn parses_installed_section() {
        let secrets = ClientSecrets::from_json(INSTALLED).unwrap();
        assert_eq!(secrets.client_id, "abc.apps.googleusercontent.com");
        assert_eq!(secrets.client_secret, "shh");
        assert_eq!(secrets.token_uri, GOOGLE_TOKEN_URI);
    }

    #[test]
    fn parses_web_section_with_default_endpoints() {
        let secrets =
            ClientSecrets::from_json(r#"{"web":{"client_id":"w","client_secret":"s"}}"#).unwrap();
        assert_eq!(secrets.client_id, "w");
        assert_eq!(secrets.auth_uri, GOOGLE_AUTH_URI);
    }

    #[test]
    fn rejects_file_without_client_section() {
        assert!(matches!(
            ClientSecrets::from_json(r#"{"other":{}}"#),
            Err(OAuthError::InvalidClientSecrets(_))
        ));
    }

    #[test]
    fn base64_blob_decodes() {
        let blob = BASE64_STANDARD.encode(INSTALLED);
        let secrets = ClientSecrets::from_base64(&blob).unwrap();
        assert_eq!(secrets.client_secret, "shh");
    }

    #[test]
    fn read_file_missing_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(ClientSecrets::read_file(&dir.path().join("credentials.json"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn debug_hides_secret() {
        let secrets = ClientSecrets::from_json(INSTALLED).unwrap();
        assert!(!format!("{secrets:?}").contains("shh"));
    }
}
