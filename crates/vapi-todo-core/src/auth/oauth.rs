//! OAuth2 Authorization Code flow for an installed app.
//!
//! 1. Binds a loopback listener for the redirect
//! 2. Opens the browser at the consent URL
//! 3. Waits for the callback and checks its CSRF `state`
//! 4. Exchanges the code for an access token (+ refresh token)

use async_trait::async_trait;
use base64::prelude::*;
use reqwest::Client;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

use super::client_secrets::ClientSecrets;
use super::credential::Credential;
use super::CALENDAR_SCOPE;
use crate::error::OAuthError;

/// Produces a fresh credential through user interaction.
#[async_trait]
pub trait ConsentFlow: Send + Sync {
    async fn authorize(&self, secrets: &ClientSecrets) -> Result<Credential, OAuthError>;
}

/// Browser consent with a redirect to a loopback listener.
pub struct LoopbackConsent {
    http: Client,
    /// 0 picks a free port.
    port: u16,
}

impl LoopbackConsent {
    pub fn new(http: Client, port: u16) -> Self {
        Self { http, port }
    }
}

#[async_trait]
impl ConsentFlow for LoopbackConsent {
    async fn authorize(&self, secrets: &ClientSecrets) -> Result<Credential, OAuthError> {
        let listener = TcpListener::bind(("127.0.0.1", self.port))
            .await
            .map_err(|e| OAuthError::AuthorizationFailed(format!("cannot bind listener: {e}")))?;
        let port = listener
            .local_addr()
            .map_err(|e| OAuthError::AuthorizationFailed(e.to_string()))?
            .port();
        let redirect_uri = format!("http://localhost:{port}/");

        let state = generate_csrf_state()?;
        let url = consent_url(secrets, &redirect_uri, &state);

        eprintln!("\nOpen this URL in your browser to authorize Google Calendar access:\n");
        eprintln!("{url}\n");
        if open::that(&url).is_err() {
            eprintln!("(Could not open browser automatically, please copy the URL above)");
        }

        let code = wait_for_callback(&listener, &state).await?;
        tracing::info!("received authorization code, exchanging for tokens");
        exchange_code(&self.http, secrets, &code, &redirect_uri).await
    }
}

/// Cryptographically random state parameter for CSRF protection.
fn generate_csrf_state() -> Result<String, OAuthError> {
    let mut bytes = [0u8; 32];
    getrandom::getrandom(&mut bytes).map_err(|e| {
        OAuthError::AuthorizationFailed(format!("failed to generate random state: {e}"))
    })?;
    Ok(BASE64_URL_SAFE_NO_PAD.encode(bytes))
}

pub fn consent_url(secrets: &ClientSecrets, redirect_uri: &str, state: &str) -> String {
    format!(
        "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&prompt=consent&state={}",
        secrets.auth_uri,
        urlencoding::encode(&secrets.client_id),
        urlencoding::encode(redirect_uri),
        urlencoding::encode(CALENDAR_SCOPE),
        urlencoding::encode(state),
    )
}

async fn wait_for_callback(listener: &TcpListener, expected_state: &str) -> Result<String, OAuthError> {
    let (stream, _) = listener
        .accept()
        .await
        .map_err(|e| OAuthError::InvalidCallback(format!("accept failed: {e}")))?;

    let mut reader = BufReader::new(stream);
    let mut request_line = String::new();
    reader
        .read_line(&mut request_line)
        .await
        .map_err(|e| OAuthError::InvalidCallback(e.to_string()))?;

    let outcome = parse_callback(&request_line, expected_state);

    let body = match &outcome {
        Ok(_) => "<h1>Authorization successful!</h1><p>You can close this window.</p>",
        Err(_) => "<h1>Authorization failed</h1><p>Return to the terminal for details.</p>",
    };
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n<html><body>{body}</body></html>"
    );
    let mut stream = reader.into_inner();
    if let Err(e) = stream.write_all(response.as_bytes()).await {
        tracing::debug!(error = %e, "failed to answer OAuth redirect");
    }
    let _ = stream.flush().await;

    outcome
}

/// Pull the authorization code out of `GET /?code=..&state=.. HTTP/1.1`.
fn parse_callback(request_line: &str, expected_state: &str) -> Result<String, OAuthError> {
    let path = request_line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| OAuthError::InvalidCallback("malformed HTTP request".into()))?;
    let url = url::Url::parse(&format!("http://localhost{path}"))
        .map_err(|e| OAuthError::InvalidCallback(e.to_string()))?;

    let param = |name: &str| {
        url.query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.to_string())
    };

    if let Some(error) = param("error") {
        return Err(OAuthError::AuthorizationFailed(error));
    }
    if param("state").as_deref() != Some(expected_state) {
        return Err(OAuthError::InvalidCallback("state mismatch".into()));
    }
    param("code").ok_or_else(|| OAuthError::InvalidCallback("no code in callback".into()))
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    token_type: Option<String>,
    scope: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

impl TokenResponse {
    fn into_credential(
        self,
        client_id: &str,
        client_secret: &str,
        token_uri: &str,
        previous_refresh: Option<&str>,
    ) -> Result<Credential, String> {
        if let Some(error) = self.error {
            return Err(match self.error_description {
                Some(desc) => format!("{error}: {desc}"),
                None => error,
            });
        }
        let access_token = self
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or("response has no access_token")?;

        Ok(Credential {
            access_token,
            refresh_token: self
                .refresh_token
                .or_else(|| previous_refresh.map(String::from)),
            expires_at: self
                .expires_in
                .map(|secs| chrono::Utc::now().timestamp() + secs),
            token_type: self.token_type.unwrap_or_else(|| "Bearer".into()),
            scope: self.scope,
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            token_uri: token_uri.to_string(),
        })
    }
}

async fn post_token_form(
    http: &Client,
    token_uri: &str,
    params: &[(&str, &str)],
) -> Result<TokenResponse, String> {
    let resp = http
        .post(token_uri)
        .form(params)
        .send()
        .await
        .map_err(|e| e.to_string())?;
    let status = resp.status();
    let body: TokenResponse = resp
        .json()
        .await
        .map_err(|e| format!("HTTP {status}: unreadable token response: {e}"))?;
    if !status.is_success() && body.error.is_none() {
        return Err(format!("HTTP {status}"));
    }
    Ok(body)
}

/// Exchange an authorization code for tokens.
pub async fn exchange_code(
    http: &Client,
    secrets: &ClientSecrets,
    code: &str,
    redirect_uri: &str,
) -> Result<Credential, OAuthError> {
    let params = [
        ("client_id", secrets.client_id.as_str()),
        ("client_secret", secrets.client_secret.as_str()),
        ("code", code),
        ("grant_type", "authorization_code"),
        ("redirect_uri", redirect_uri),
    ];

    post_token_form(http, &secrets.token_uri, &params)
        .await
        .and_then(|body| {
            body.into_credential(
                &secrets.client_id,
                &secrets.client_secret,
                &secrets.token_uri,
                None,
            )
        })
        .map_err(OAuthError::TokenExchangeFailed)
}

/// Refresh an access token. The old refresh token is kept if Google omits a new one.
pub async fn refresh(http: &Client, credential: &Credential) -> Result<Credential, OAuthError> {
    let refresh_token = credential
        .refresh_token
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| OAuthError::TokenRefreshFailed("no refresh token available".into()))?;

    let params = [
        ("client_id", credential.client_id.as_str()),
        ("client_secret", credential.client_secret.as_str()),
        ("refresh_token", refresh_token),
        ("grant_type", "refresh_token"),
    ];

    post_token_form(http, &credential.token_uri, &params)
        .await
        .and_then(|body| {
            body.into_credential(
                &credential.client_id,
                &credential.client_secret,
                &credential.token_uri,
                Some(refresh_token),
            )
        })
        .map(|mut refreshed| {
            if refreshed.scope.is_none() {
                refreshed.scope = credential.scope.clone();
            }
            refreshed
        })
        .map_err(OAuthError::TokenRefreshFailed)
}
