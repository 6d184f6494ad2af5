//! Google Calendar v3 over REST.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;

use super::{CalendarApi, EventDraft, EventPatch, RemoteError, RemoteEvent};
use crate::auth::TokenStore;
use crate::storage::GoogleConfig;

/// Client for one calendar, authorized through a shared [`TokenStore`].
pub struct GoogleCalendar {
    http: Client,
    tokens: Arc<TokenStore>,
    api_base: String,
    calendar_id: String,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
}

impl GoogleCalendar {
    pub fn new(
        http: Client,
        tokens: Arc<TokenStore>,
        api_base: impl Into<String>,
        calendar_id: impl Into<String>,
    ) -> Self {
        Self {
            http,
            tokens,
            api_base: api_base.into(),
            calendar_id: calendar_id.into(),
        }
    }

    pub fn from_config(config: &GoogleConfig, http: Client, tokens: Arc<TokenStore>) -> Self {
        Self::new(http, tokens, &config.api_base, &config.calendar_id)
    }

    fn events_url(&self) -> String {
        format!(
            "{}/calendars/{}/events",
            self.api_base.trim_end_matches('/'),
            urlencoding::encode(&self.calendar_id)
        )
    }

    fn event_url(&self, event_id: &str) -> String {
        format!("{}/{}", self.events_url(), urlencoding::encode(event_id))
    }

    async fn bearer(&self) -> Result<String, RemoteError> {
        self.tokens
            .access_token()
            .await
            .map_err(|e| RemoteError::Auth(e.to_string()))
    }

    /// Map a non-success status to `RemoteError`, 404/410 to `NotFound`.
    async fn check(resp: Response, event_id: Option<&str>) -> Result<Response, RemoteError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        if let Some(id) = event_id {
            if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
                return Err(RemoteError::NotFound(id.to_string()));
            }
        }

        let text = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&text)
            .map(|body| body.error.message)
            .ok()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());

        Err(RemoteError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl CalendarApi for GoogleCalendar {
    async fn create(&self, draft: &EventDraft) -> Result<String, RemoteError> {
        let token = self.bearer().await?;
        let body = draft.to_event(Utc::now());

        let resp = self
            .http
            .post(self.events_url())
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await?;
        let created: RemoteEvent = Self::check(resp, None).await?.json().await?;

        let id = created
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| RemoteError::InvalidResponse("created event has no id".into()))?;
        tracing::debug!(remote_event_id = %id, "created calendar event");
        Ok(id)
    }

    async fn update(&self, event_id: &str, patch: &EventPatch) -> Result<(), RemoteError> {
        let mut event = self.get(event_id).await?;
        patch.apply(&mut event);

        let token = self.bearer().await?;
        let resp = self
            .http
            .put(self.event_url(event_id))
            .bearer_auth(&token)
            .json(&event)
            .send()
            .await?;
        Self::check(resp, Some(event_id)).await?;
        tracing::debug!(remote_event_id = %event_id, "updated calendar event");
        Ok(())
    }

    async fn delete(&self, event_id: &str) -> Result<(), RemoteError> {
        let token = self.bearer().await?;
        let resp = self
            .http
            .delete(self.event_url(event_id))
            .bearer_auth(&token)
            .send()
            .await?;
        Self::check(resp, Some(event_id)).await?;
        tracing::debug!(remote_event_id = %event_id, "deleted calendar event");
        Ok(())
    }

    async fn get(&self, event_id: &str) -> Result<RemoteEvent, RemoteError> {
        let token = self.bearer().await?;
        let resp = self
            .http
            .get(self.event_url(event_id))
            .bearer_auth(&token)
            .send()
            .await?;
        Ok(Self::check(resp, Some(event_id)).await?.json().await?)
    }
}
