//! Process-wide holder of the Google credential.
//!
//! Lookup order on first use: `GOOGLE_TOKEN_B64`, then the token cache
//! file. An expired credential is refreshed when it carries a refresh
//! token; otherwise, or when nothing was found, the interactive consent flow
//! runs against the client registration from `GOOGLE_CREDENTIALS_B64` or
//! `credentials.json`. Every refreshed or newly authorized credential is
//! written back to the cache file.

use std::path::PathBuf;

use reqwest::Client;
use tokio::sync::Mutex;

use super::client_secrets::ClientSecrets;
use super::credential::Credential;
use super::oauth::{self, ConsentFlow, LoopbackConsent};
use super::{CREDENTIALS_ENV, TOKEN_ENV};
use crate::error::{ConfigError, CoreError};
use crate::storage::Config;

/// Where credential material may come from.
#[derive(Clone, Default)]
pub struct CredentialSources {
    /// Base64 credential, normally from `GOOGLE_TOKEN_B64`.
    pub token_b64: Option<String>,
    /// Base64 `credentials.json`, normally from `GOOGLE_CREDENTIALS_B64`.
    pub client_secrets_b64: Option<String>,
    pub token_file: PathBuf,
    pub client_secrets_file: PathBuf,
}

impl std::fmt::Debug for CredentialSources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialSources")
            .field("token_b64", &self.token_b64.is_some())
            .field("client_secrets_b64", &self.client_secrets_b64.is_some())
            .field("token_file", &self.token_file)
            .field("client_secrets_file", &self.client_secrets_file)
            .finish()
    }
}

impl CredentialSources {
    /// Read both environment variables; empty values count as unset.
    pub fn from_env(token_file: PathBuf, client_secrets_file: PathBuf) -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            token_b64: var(TOKEN_ENV),
            client_secrets_b64: var(CREDENTIALS_ENV),
            token_file,
            client_secrets_file,
        }
    }
}

pub struct TokenStore {
    sources: CredentialSources,
    http: Client,
    consent: Box<dyn ConsentFlow>,
    current: Mutex<Option<Credential>>,
}

impl TokenStore {
    pub fn new(sources: CredentialSources, http: Client, consent: Box<dyn ConsentFlow>) -> Self {
        Self {
            sources,
            http,
            consent,
            current: Mutex::new(None),
        }
    }

    /// Environment plus the configured token and client-registration files,
    /// with browser consent on the configured redirect port.
    pub fn from_config(config: &Config, http: Client) -> Result<Self, ConfigError> {
        let sources = CredentialSources::from_env(config.token_path()?, config.credentials_path()?);
        let consent = LoopbackConsent::new(http.clone(), config.google.redirect_port);
        Ok(Self::new(sources, http, Box::new(consent)))
    }

    pub fn sources(&self) -> &CredentialSources {
        &self.sources
    }

    /// Return a usable credential, loading, refreshing or authorizing as needed.
    ///
    /// Concurrent callers wait on each other, so a refresh happens once.
    ///
    /// # Errors
    /// `ConfigError::MissingCredentials` when no token and no client
    /// registration exist; `OAuthError` when refresh or consent fails.
    pub async fn obtain(&self) -> Result<Credential, CoreError> {
        let mut current = self.current.lock().await;

        let known = match current.as_ref() {
            Some(credential) => Some(credential.clone()),
            None => self.load(),
        };

        let credential = match known {
            Some(credential) if !credential.is_expired() => {
                *current = Some(credential.clone());
                return Ok(credential);
            }
            Some(credential) if credential.can_refresh() => {
                tracing::info!("Google access token expired, refreshing");
                oauth::refresh(&self.http, &credential).await?
            }
            _ => {
                let secrets = self.client_secrets()?;
                tracing::info!("no usable Google token, starting interactive authorization");
                self.consent.authorize(&secrets).await?
            }
        };

        self.persist(&credential);
        *current = Some(credential.clone());
        Ok(credential)
    }

    /// Bearer token for API calls.
    pub async fn access_token(&self) -> Result<String, CoreError> {
        Ok(self.obtain().await?.access_token)
    }

    fn load(&self) -> Option<Credential> {
        if let Some(blob) = &self.sources.token_b64 {
            match Credential::decode(blob) {
                Ok(credential) => {
                    tracing::debug!(source = TOKEN_ENV, "loaded Google credential");
                    return Some(credential);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "ignoring {TOKEN_ENV}, falling back to token file")
                }
            }
        }

        match Credential::read_file(&self.sources.token_file) {
            Ok(Some(credential)) => {
                tracing::debug!(path = %self.sources.token_file.display(), "loaded Google credential");
                Some(credential)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable token file");
                None
            }
        }
    }

    fn client_secrets(&self) -> Result<ClientSecrets, CoreError> {
        if let Some(blob) = &self.sources.client_secrets_b64 {
            match ClientSecrets::from_base64(blob) {
                Ok(secrets) => return Ok(secrets),
                Err(e) => tracing::warn!(error = %e, "ignoring {CREDENTIALS_ENV}"),
            }
        }

        ClientSecrets::read_file(&self.sources.client_secrets_file)?.ok_or_else(|| {
            ConfigError::MissingCredentials {
                env_var: CREDENTIALS_ENV,
                path: self.sources.client_secrets_file.clone(),
            }
            .into()
        })
    }

    fn persist(&self, credential: &Credential) {
        let path = &self.sources.token_file;
        match credential.write_file(path) {
            Ok(()) => tracing::info!(
                path = %path.display(),
                "stored new Google token; run `vapi-todo-server authorize --print-env` to export it as {TOKEN_ENV}"
            ),
            Err(e) => tracing::warn!(error = %e, "failed to cache Google token"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::credential::sample;
    use crate::error::OAuthError;
    use async_trait::async_trait;
    use base64::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Hands out a fixed credential and counts how often consent was asked for.
    struct StubConsent {
        calls: Arc<AtomicUsize>,
        seen_client: Arc<std::sync::Mutex<Option<String>>>,
    }

    #[async_trait]
    impl ConsentFlow for StubConsent {
        async fn authorize(&self, secrets: &ClientSecrets) -> Result<Credential, OAuthError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.seen_client.lock().unwrap() = Some(secrets.client_id.clone());
            let mut cred = sample(Some(chrono::Utc::now().timestamp() + 3600));
            cred.access_token = "from-consent".to_string();
            Ok(cred)
        }
    }

    struct Fixture {
        dir: TempDir,
        calls: Arc<AtomicUsize>,
        seen_client: Arc<std::sync::Mutex<Option<String>>>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                dir: TempDir::new().unwrap(),
                calls: Arc::new(AtomicUsize::new(0)),
                seen_client: Arc::new(std::sync::Mutex::new(None)),
            }
        }

        fn sources(&self) -> CredentialSources {
            CredentialSources {
                token_b64: None,
                client_secrets_b64: None,
                token_file: self.dir.path().join("token.json"),
                client_secrets_file: self.dir.path().join("credentials.json"),
            }
        }

        fn store(&self, sources: CredentialSources) -> TokenStore {
            let consent = StubConsent {
                calls: self.calls.clone(),
                seen_client: self.seen_client.clone(),
            };
            TokenStore::new(sources, Client::new(), Box::new(consent))
        }
    }

    fn future_expiry() -> Option<i64> {
        Some(chrono::Utc::now().timestamp() + 3600)
    }

    const CLIENT_JSON: &str = r#"{"installed":{"client_id":"from-file","client_secret":"s"}}"#;

    #[tokio::test]
    async fn no_sources_is_a_configuration_error() {
        let fx = Fixture::new();
        let store = fx.store(fx.sources());

        let err = store.obtain().await.unwrap_err();
        assert!(err.is_missing_credentials());
        assert_eq!(fx.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn valid_env_token_is_used_without_persisting() {
        let fx = Fixture::new();
        let cred = sample(future_expiry());
        let sources = CredentialSources {
            token_b64: Some(cred.encode().unwrap()),
            ..fx.sources()
        };
        let store = fx.store(sources.clone());

        assert_eq!(store.obtain().await.unwrap(), cred);
        assert!(!sources.token_file.exists());
        assert_eq!(fx.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn undecodable_env_token_falls_back_to_file() {
        let fx = Fixture::new();
        let sources = CredentialSources {
            token_b64: Some("!!definitely not base64!!".to_string()),
            ..fx.sources()
        };
        let mut cred = sample(future_expiry());
        cred.access_token = "from-file".to_string();
        cred.write_file(&sources.token_file).unwrap();

        let store = fx.store(sources);
        assert_eq!(store.access_token().await.unwrap(), "from-file");
    }

    #[tokio::test]
    async fn expired_token_is_refreshed_once_and_persisted() {
        let fx = Fixture::new();
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"refreshed","expires_in":3600}"#)
            .expect(1)
            .create_async()
            .await;

        let sources = fx.sources();
        let mut stale = sample(Some(0));
        stale.token_uri = format!("{}/token", server.url());
        stale.write_file(&sources.token_file).unwrap();

        let store = fx.store(sources.clone());
        assert_eq!(store.access_token().await.unwrap(), "refreshed");
        assert_eq!(store.access_token().await.unwrap(), "refreshed");
        mock.assert_async().await;

        let cached = Credential::read_file(&sources.token_file).unwrap().unwrap();
        assert_eq!(cached.access_token, "refreshed");
        assert_eq!(cached.refresh_token, stale.refresh_token);
        assert_eq!(fx.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn refresh_failure_is_an_oauth_error() {
        let fx = Fixture::new();
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/token")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":"invalid_grant"}"#)
            .create_async()
            .await;

        let mut stale = sample(Some(0));
        stale.token_uri = format!("{}/token", server.url());
        let sources = CredentialSources {
            token_b64: Some(stale.encode().unwrap()),
            ..fx.sources()
        };

        let err = fx.store(sources).obtain().await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::OAuth(OAuthError::TokenRefreshFailed(_))
        ));
    }

    #[tokio::test]
    async fn missing_token_runs_consent_with_client_file() {
        let fx = Fixture::new();
        let sources = fx.sources();
        std::fs::write(&sources.client_secrets_file, CLIENT_JSON).unwrap();

        let store = fx.store(sources.clone());
        assert_eq!(store.access_token().await.unwrap(), "from-consent");
        assert_eq!(fx.calls.load(Ordering::SeqCst), 1);
        assert_eq!(fx.seen_client.lock().unwrap().as_deref(), Some("from-file"));
        assert!(sources.token_file.exists());

        // Cached in memory afterwards.
        store.obtain().await.unwrap();
        assert_eq!(fx.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expired_token_without_refresh_reauthorizes_from_env_registration() {
        let fx = Fixture::new();
        let mut stale = sample(Some(0));
        stale.refresh_token = None;
        let sources = CredentialSources {
            token_b64: Some(stale.encode().unwrap()),
            client_secrets_b64: Some(BASE64_STANDARD.encode(
                r#"{"installed":{"client_id":"from-env","client_secret":"s"}}"#,
            )),
            ..fx.sources()
        };
        std::fs::write(&sources.client_secrets_file, CLIENT_JSON).unwrap();

        let store = fx.store(sources);
        assert_eq!(store.access_token().await.unwrap(), "from-consent");
        assert_eq!(fx.seen_client.lock().unwrap().as_deref(), Some("from-env"));
    }

    #[test]
    fn sources_debug_hides_blobs() {
        let sources = CredentialSources {
            token_b64: Some("c2VjcmV0".to_string()),
            ..CredentialSources::default()
        };
        assert!(!format!("{sources:?}").contains("c2VjcmV0"));
    }
}
