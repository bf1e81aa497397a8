//! Supabase API client.
//!
//! # Architecture
//!
//! - The hosted backend is the source of truth - no local database, direct
//!   API calls over `reqwest`
//! - `/auth/v1` (GoTrue) for sign-up, password grant, sign-out and user
//!   updates ([`auth`])
//! - `/rest/v1` (PostgREST) for row CRUD with filter/order/select
//!   parameters ([`rows`])
//! - `/storage/v1` for object upload and public URLs ([`storage`])
//!
//! Auth-state changes are pushed to subscribers over a broadcast channel
//! instead of registered callbacks; see [`auth::AuthChange`].

mod auth;
mod rows;
mod storage;
pub mod types;

pub use auth::{AuthChange, SignUpOutcome};
pub use types::*;

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::sync::{RwLock, broadcast};

use crate::config::AppConfig;

/// Postgres error code for a unique-constraint violation.
const UNIQUE_VIOLATION: &str = "23505";

/// Capacity of the auth-change broadcast channel.
const AUTH_CHANNEL_CAPACITY: usize = 16;

/// Errors that can occur when talking to the hosted backend.
#[derive(Debug, thiserror::Error)]
pub enum SupabaseError {
    /// HTTP transport failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with an error status.
    #[error("API error ({status}{}): {message}", .code.as_deref().map(|c| format!(" {c}")).unwrap_or_default())]
    Api {
        /// HTTP status code.
        status: u16,
        /// Postgres or GoTrue error code, when present.
        code: Option<String>,
        /// Human-readable message from the error body.
        message: String,
    },

    /// Response body could not be decoded.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A single-row lookup matched nothing.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl SupabaseError {
    /// Whether this error is a Postgres unique-constraint violation.
    ///
    /// Duplicate enrollments surface as this and are downgraded to success
    /// by the caller.
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::Api { code: Some(code), .. } if code == UNIQUE_VIOLATION)
    }
}

/// Error body shapes returned by PostgREST and GoTrue.
///
/// PostgREST: `{"code": "23505", "message": "...", ...}`.
/// GoTrue: `{"error": "...", "error_description": "..."}` or `{"msg": "..."}`.
#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    code: Option<String>,
    error_code: Option<String>,
    message: Option<String>,
    msg: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

impl ApiErrorBody {
    fn into_error(self, status: StatusCode) -> SupabaseError {
        let message = self
            .message
            .or(self.msg)
            .or(self.error_description)
            .or(self.error)
            .unwrap_or_else(|| "(no error details provided)".to_string());

        SupabaseError::Api {
            status: status.as_u16(),
            code: self.code.or(self.error_code),
            message,
        }
    }
}

/// Client for the hosted Supabase backend.
///
/// Cheaply cloneable; all clones share the HTTP connection pool, the
/// current session token and the auth-change channel.
#[derive(Clone)]
pub struct SupabaseClient {
    inner: Arc<SupabaseClientInner>,
}

struct SupabaseClientInner {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    access_token: RwLock<Option<SecretString>>,
    auth_events: broadcast::Sender<AuthChange>,
}

impl SupabaseClient {
    /// Create a new client from configuration.
    ///
    /// A session token carried in the configuration (a restored session)
    /// is installed but not validated; session bootstrap does that.
    #[must_use]
    pub fn new(config: &AppConfig) -> Self {
        let (auth_events, _) = broadcast::channel(AUTH_CHANNEL_CAPACITY);

        Self {
            inner: Arc::new(SupabaseClientInner {
                http: reqwest::Client::new(),
                base_url: config.supabase_url.as_str().trim_end_matches('/').to_string(),
                anon_key: config.anon_key.clone(),
                access_token: RwLock::new(config.access_token.clone()),
                auth_events,
            }),
        }
    }

    /// Subscribe to auth-state changes.
    ///
    /// Events are emitted whenever a session is established or cleared.
    #[must_use]
    pub fn subscribe_auth(&self) -> broadcast::Receiver<AuthChange> {
        self.inner.auth_events.subscribe()
    }

    /// Whether a session token is currently installed.
    pub async fn has_session_token(&self) -> bool {
        self.inner.access_token.read().await.is_some()
    }

    pub(crate) async fn set_access_token(&self, token: Option<SecretString>) {
        *self.inner.access_token.write().await = token;
    }

    pub(crate) fn emit_auth_change(&self, change: AuthChange) {
        // Send fails only when nobody is subscribed, which is fine.
        let _ = self.inner.auth_events.send(change);
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.inner.base_url)
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.inner.base_url)
    }

    fn storage_url(&self, path: &str) -> String {
        format!("{}/storage/v1/{path}", self.inner.base_url)
    }

    /// Build a request with the project key and, when present, the session
    /// bearer token. Anonymous requests fall back to the project key as the
    /// bearer, which is what the hosted API expects.
    async fn request(&self, method: Method, url: String) -> RequestBuilder {
        let token = self.inner.access_token.read().await;
        let bearer = token
            .as_ref()
            .map_or_else(|| self.inner.anon_key.clone(), |t| t.expose_secret().to_string());

        self.inner
            .http
            .request(method, url)
            .header("apikey", &self.inner.anon_key)
            .bearer_auth(bearer)
    }

    /// Send a request and decode a JSON response body.
    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, SupabaseError> {
        let response = request.send().await?;
        let response = Self::check_status(response).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Send a request where only success matters.
    async fn send_ok(&self, request: RequestBuilder) -> Result<(), SupabaseError> {
        let response = request.send().await?;
        Self::check_status(response).await?;
        Ok(())
    }

    /// Map non-success statuses to [`SupabaseError::Api`], keeping whatever
    /// the error body carried for diagnostics.
    async fn check_status(response: Response) -> Result<Response, SupabaseError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let parsed: ApiErrorBody = serde_json::from_str(&body).unwrap_or_default();
        let err = parsed.into_error(status);

        tracing::debug!(status = %status, error = %err, "backend returned error status");
        Err(err)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn api_error(code: Option<&str>) -> SupabaseError {
        SupabaseError::Api {
            status: 409,
            code: code.map(String::from),
            message: "duplicate key value violates unique constraint".to_string(),
        }
    }

    #[test]
    fn test_unique_violation_detection() {
        assert!(api_error(Some("23505")).is_unique_violation());
        assert!(!api_error(Some("23503")).is_unique_violation());
        assert!(!api_error(None).is_unique_violation());
        assert!(!SupabaseError::NotFound("row".to_string()).is_unique_violation());
    }

    #[test]
    fn test_error_body_postgrest_shape() {
        let body: ApiErrorBody =
            serde_json::from_str(r#"{"code":"23505","message":"duplicate key"}"#).unwrap();
        let err = body.into_error(StatusCode::CONFLICT);
        assert!(err.is_unique_violation());
        assert_eq!(err.to_string(), "API error (409 23505): duplicate key");
    }

    #[test]
    fn test_error_body_gotrue_shape() {
        let body: ApiErrorBody = serde_json::from_str(
            r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#,
        )
        .unwrap();
        let err = body.into_error(StatusCode::BAD_REQUEST);
        assert_eq!(
            err.to_string(),
            "API error (400): Invalid login credentials"
        );
    }

    #[test]
    fn test_error_body_empty() {
        let body = ApiErrorBody::default();
        let err = body.into_error(StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            err.to_string(),
            "API error (500): (no error details provided)"
        );
    }
}
