//! HTTP client shared by every provider fetcher, plus its builder.
//! Default endpoints and the UA live in `constants`.

pub(crate) mod constants;

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};

use crate::core::retry::RetryConfig;
use crate::core::{CacheError, FetchError};
use constants::USER_AGENT;

/// Thin wrapper that holds a configured HTTP client and its retry policy.
#[derive(Debug, Clone)]
pub struct HttpClient {
    http: Client,
    retry: RetryConfig,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self {
            http: Client::new(),
            retry: RetryConfig::default(),
        }
    }
}

impl HttpClient {
    /// Create a new builder.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    /// The retry policy applied by [`HttpClient::send_with_retry`].
    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// Sends a request, retrying transient failures per the retry policy.
    ///
    /// The final response is returned as-is, whatever its status; callers map statuses through
    /// [`crate::core::net`]. Requests with streaming bodies cannot be cloned and are sent once.
    pub(crate) async fn send_with_retry(
        &self,
        req: RequestBuilder,
    ) -> Result<Response, FetchError> {
        let cfg = &self.retry;
        let mut attempt = 0u32;

        loop {
            let Some(this_try) = req.try_clone() else {
                return Ok(req.send().await?);
            };

            match this_try.send().await {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if !cfg.should_retry_status(attempt, status) {
                        return Ok(resp);
                    }
                    tracing::debug!(status, attempt, url = %resp.url(), "retrying after status");
                }
                Err(e) => {
                    if !cfg.should_retry_error(attempt, &e) {
                        return Err(e.into());
                    }
                    tracing::debug!(attempt, error = %e, "retrying after transport error");
                }
            }

            tokio::time::sleep(cfg.backoff.delay(attempt)).await;
            attempt += 1;
        }
    }
}

/* ----------------------- Builder ----------------------- */

#[derive(Default)]
pub struct HttpClientBuilder {
    user_agent: Option<String>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    retry: Option<RetryConfig>,
}

impl HttpClientBuilder {
    /// Override the User-Agent.
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Set a global request timeout (overall). Default: none.
    #[must_use]
    pub const fn timeout(mut self, dur: Duration) -> Self {
        self.timeout = Some(dur);
        self
    }

    /// Set a connect timeout. Default: none.
    #[must_use]
    pub const fn connect_timeout(mut self, dur: Duration) -> Self {
        self.connect_timeout = Some(dur);
        self
    }

    /// Replace the retry policy.
    #[must_use]
    pub fn retry_config(mut self, cfg: RetryConfig) -> Self {
        self.retry = Some(cfg);
        self
    }

    /// Turn retries on or off, keeping the rest of the policy.
    #[must_use]
    pub fn retry_enabled(mut self, enabled: bool) -> Self {
        let mut cfg = self.retry.take().unwrap_or_default();
        cfg.enabled = enabled;
        self.retry = Some(cfg);
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Http`] if the TLS backend cannot be initialized.
    pub fn build(self) -> Result<HttpClient, CacheError> {
        let mut httpb =
            reqwest::Client::builder().user_agent(self.user_agent.as_deref().unwrap_or(USER_AGENT));

        if let Some(t) = self.timeout {
            httpb = httpb.timeout(t);
        }
        if let Some(ct) = self.connect_timeout {
            httpb = httpb.connect_timeout(ct);
        }

        Ok(HttpClient {
            http: httpb.build()?,
            retry: self.retry.unwrap_or_default(),
        })
    }
}
