//! Persistence of tab orders to the authoritative handler.
//!
//! Every call sends the complete resulting order, so repeating a call is safe.
//! [`Retrying`] adds the per-attempt timeout and bounded backoff on top of any
//! client; the concrete clients make a single attempt.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use log::warn;

use crate::services::tabs_handler::{TabsHandler, TabsHandlerTrait};
use crate::types::course::CourseKey;
use crate::types::delta::{TabDelta, TabOrderRequest};
use crate::types::errors::{StoreError, SyncError};
use crate::types::settings::SyncSettings;

/// Trait defining the persistence call made for every committed change.
#[async_trait]
pub trait SyncClient: Send + Sync {
    async fn persist(&self, course_key: &CourseKey, delta: &TabDelta) -> Result<(), SyncError>;
}

#[async_trait]
impl<T: SyncClient + ?Sized> SyncClient for Arc<T> {
    async fn persist(&self, course_key: &CourseKey, delta: &TabDelta) -> Result<(), SyncError> {
        (**self).persist(course_key, delta).await
    }
}

/// Timeout and backoff applied by [`Retrying`].
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub attempt_timeout: Duration,
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub backoff_multiplier: u32,
}

impl RetryPolicy {
    pub fn from_settings(settings: &SyncSettings) -> Self {
        Self {
            attempt_timeout: settings.request_timeout(),
            max_retries: settings.max_retries,
            initial_backoff: settings.initial_backoff(),
            backoff_multiplier: settings.backoff_multiplier.max(1),
        }
    }

    /// Wait before retry number `retry` (0-based).
    pub fn backoff_for(&self, retry: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(self.backoff_multiplier.saturating_pow(retry))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&SyncSettings::default())
    }
}

/// Wraps a client with a per-attempt timeout and retries of transient failures.
pub struct Retrying<C> {
    inner: C,
    policy: RetryPolicy,
}

impl<C: SyncClient> Retrying<C> {
    pub fn new(inner: C, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

#[async_trait]
impl<C: SyncClient> SyncClient for Retrying<C> {
    async fn persist(&self, course_key: &CourseKey, delta: &TabDelta) -> Result<(), SyncError> {
        let mut retry = 0;
        loop {
            let attempt = tokio::time::timeout(
                self.policy.attempt_timeout,
                self.inner.persist(course_key, delta),
            )
            .await
            .unwrap_or_else(|_| {
                Err(SyncError::TransientNetwork(format!(
                    "no response within {} ms",
                    self.policy.attempt_timeout.as_millis()
                )))
            });

            match attempt {
                Ok(()) => return Ok(()),
                Err(err) if err.is_retryable() && retry < self.policy.max_retries => {
                    let wait = self.policy.backoff_for(retry);
                    warn!(
                        "[{}] persist attempt {} failed ({}), retrying in {} ms",
                        course_key,
                        retry + 1,
                        err,
                        wait.as_millis()
                    );
                    tokio::time::sleep(wait).await;
                    retry += 1;
                }
                Err(SyncError::TransientNetwork(msg)) => {
                    return Err(SyncError::TransientNetwork(format!(
                        "{} (gave up after {} attempts)",
                        msg,
                        retry + 1
                    )));
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Map a handler response status to a sync outcome.
///
/// 2xx succeeds. 408, 429 and 5xx are worth retrying. Anything else is a
/// refusal; its message comes from the body's `error` field when present.
pub fn classify_status(status: u16, body: &str) -> Result<(), SyncError> {
    if (200..300).contains(&status) {
        return Ok(());
    }
    let detail = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string());
    let message = if detail.is_empty() {
        format!("HTTP {}", status)
    } else {
        format!("HTTP {}: {}", status, detail)
    };

    if status == 408 || status == 429 || (500..600).contains(&status) {
        Err(SyncError::TransientNetwork(message))
    } else {
        Err(SyncError::Rejected(message))
    }
}

#[cfg(feature = "http")]
pub use http::HttpSyncClient;

#[cfg(feature = "http")]
mod http {
    use async_trait::async_trait;
    use reqwest::header::ACCEPT;

    use super::{classify_status, SyncClient};
    use crate::types::course::CourseKey;
    use crate::types::delta::{TabDelta, TabOrderRequest};
    use crate::types::errors::SyncError;
    use crate::types::settings::SyncSettings;

    /// Client for a remote handler at `PUT {base}/tabs/{course_key}`.
    pub struct HttpSyncClient {
        http: reqwest::Client,
        base_url: String,
    }

    impl HttpSyncClient {
        pub fn new(settings: &SyncSettings) -> Result<Self, SyncError> {
            let http = reqwest::Client::builder()
                .timeout(settings.request_timeout())
                .build()
                .map_err(|e| SyncError::Rejected(format!("cannot build HTTP client: {}", e)))?;
            Ok(Self {
                http,
                base_url: settings.handler_base_url.trim_end_matches('/').to_string(),
            })
        }

        pub fn endpoint(&self, course_key: &CourseKey) -> String {
            format!("{}/tabs/{}", self.base_url, course_key)
        }
    }

    fn classify_transport(err: reqwest::Error) -> SyncError {
        // A body cut off mid-read surfaces as a body or decode error.
        if err.is_timeout() || err.is_connect() || err.is_request() || err.is_body() || err.is_decode() {
            SyncError::TransientNetwork(err.to_string())
        } else {
            SyncError::Rejected(err.to_string())
        }
    }

    #[async_trait]
    impl SyncClient for HttpSyncClient {
        async fn persist(&self, course_key: &CourseKey, delta: &TabDelta) -> Result<(), SyncError> {
            let response = self
                .http
                .put(self.endpoint(course_key))
                .header(ACCEPT, "application/json")
                .json(&TabOrderRequest::from(delta))
                .send()
                .await
                .map_err(classify_transport)?;

            let status = response.status().as_u16();
            let body = response.text().await.map_err(classify_transport)?;
            classify_status(status, &body)
        }
    }
}

/// Client that calls a handler living in the same process.
pub struct LocalSyncClient {
    handler: Arc<Mutex<TabsHandler>>,
    user: String,
}

impl LocalSyncClient {
    pub fn new(handler: Arc<Mutex<TabsHandler>>, user: &str) -> Self {
        Self {
            handler,
            user: user.to_string(),
        }
    }
}

fn store_to_sync_error(err: StoreError) -> SyncError {
    match err {
        StoreError::DatabaseError(msg) => SyncError::TransientNetwork(msg),
        other => SyncError::Rejected(other.to_string()),
    }
}

#[async_trait]
impl SyncClient for LocalSyncClient {
    async fn persist(&self, course_key: &CourseKey, delta: &TabDelta) -> Result<(), SyncError> {
        let request = serde_json::to_value(TabOrderRequest::from(delta))
            .map_err(|e| SyncError::Rejected(e.to_string()))?;
        let mut handler = self
            .handler
            .lock()
            .map_err(|e| SyncError::Rejected(format!("handler unavailable: {}", e)))?;
        handler
            .update_tabs(course_key, &self.user, &request)
            .map_err(store_to_sync_error)
    }
}
