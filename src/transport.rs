//! Shared HTTP client with request/response stages.
//!
//! ARCHITECTURE
//! ============
//! Every outbound call flows through `dispatch`: the request stage attaches
//! the persisted token as a bearer header, the response stage classifies
//! failures, fires exactly one notification, and on credential rejection
//! logs the session out and signals the host to re-enter at login. The
//! classified error is always returned — side effects never swallow it, so
//! callers can still react inline.
//!
//! TRADE-OFFS
//! ==========
//! The token is re-read from durable storage on each request rather than
//! taken from in-memory session state: a logout in another tab on the same
//! origin must take effect on the very next call, not after this tab's
//! state catches up.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::error::TransportError;
use crate::host::{LoginReentry, Notifier};
use crate::session::Session;
use crate::storage::TokenStore;

/// Development target: the backend served directly.
pub const DEV_BASE_URL: &str = "http://localhost:5001";
/// Production target: same-origin reverse proxy prefix.
pub const PROD_BASE_URL: &str = "/api";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Base address and timeout, resolved once at startup.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl TransportConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), timeout: REQUEST_TIMEOUT }
    }

    /// Resolve from the environment: `API_BASE_URL` overrides everything;
    /// otherwise `APP_ENV=production` selects the reverse-proxy prefix and
    /// anything else the development server.
    #[must_use]
    pub fn from_env() -> Self {
        let base_url = std::env::var("API_BASE_URL").unwrap_or_else(|_| {
            match std::env::var("APP_ENV").as_deref() {
                Ok("production") => PROD_BASE_URL.to_owned(),
                _ => DEV_BASE_URL.to_owned(),
            }
        });
        Self::new(base_url)
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// The single outbound HTTP client shared by all callers.
pub struct Transport {
    client: reqwest::Client,
    base_url: String,
    store: Arc<dyn TokenStore>,
    notifier: Arc<dyn Notifier>,
    reentry: Arc<dyn LoginReentry>,
    session: Session,
}

impl Transport {
    /// Build the client once with the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` when the underlying client cannot be
    /// constructed.
    pub fn new(
        config: &TransportConfig,
        session: Session,
        store: Arc<dyn TokenStore>,
        notifier: Arc<dyn Notifier>,
        reentry: Arc<dyn LoginReentry>,
    ) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                tracing::error!(error = %e, "http client construction failed");
                TransportError::ConfigurationError
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            store,
            notifier,
            reentry,
            session,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET {base_url}{path}` through both pipeline stages.
    ///
    /// # Errors
    ///
    /// Returns the classified `TransportError` after its side effects ran.
    pub async fn get(&self, path: &str) -> Result<reqwest::Response, TransportError> {
        self.dispatch(self.client.get(self.url(path))).await
    }

    /// `POST {base_url}{path}` with a JSON body through both pipeline stages.
    ///
    /// # Errors
    ///
    /// Returns the classified `TransportError` after its side effects ran.
    pub async fn post_json<B>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, TransportError>
    where
        B: Serialize + ?Sized,
    {
        self.dispatch(self.client.post(self.url(path)).json(body)).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn dispatch(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, TransportError> {
        // Request stage: durable storage is authoritative for credential
        // attachment.
        let request = match self.store.load() {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let resp = match request.send().await {
            Ok(resp) => resp,
            Err(e) => {
                let err = TransportError::classify_send_failure(&e);
                tracing::warn!(error = %e, "request dispatch failed");
                self.notifier.notify(&err.to_string());
                return Err(err);
            }
        };

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        // Response stage: classify, notify once, clean up on credential
        // rejection, then hand the error back to the caller.
        let server_message = extract_message(resp).await;
        let err = TransportError::classify_status(status.as_u16(), server_message);
        tracing::warn!(status = status.as_u16(), error = %err, "request rejected");
        self.notifier.notify(&err.to_string());

        if matches!(err, TransportError::CredentialRejected { .. }) {
            self.session.logout();
            self.reentry.reenter_login();
        }

        Err(err)
    }
}

/// Best-effort read of the `message` field from an error body.
async fn extract_message(resp: reqwest::Response) -> Option<String> {
    let body = resp.text().await.ok()?;
    let value: serde_json::Value = serde_json::from_str(&body).ok()?;
    value.get("message")?.as_str().map(str::to_owned)
}

#[cfg(test)]
#[path = "transport_test.rs"]
mod tests;
