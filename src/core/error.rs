use std::time::Duration;

use thiserror::Error;

/// Hard errors surfaced to callers.
///
/// Provider and store failures never show up here on the read path: the orchestrator absorbs
/// them and degrades to stale or empty results. Only contract violations (and construction-time
/// failures) are reported through this type.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The entity key was empty or blank.
    #[error("empty cache key for {kind}")]
    EmptyKey {
        /// The entity kind the key was meant for.
        kind: &'static str,
    },

    /// A negative max-age was configured or requested.
    #[error("invalid max-age for {kind}: {seconds}s")]
    InvalidMaxAge {
        /// The entity kind the max-age belongs to.
        kind: &'static str,
        /// The rejected value, in seconds.
        seconds: i64,
    },

    /// A collection read asked for zero items.
    #[error("invalid limit: {0}")]
    InvalidLimit(u32),

    /// A configuration value could not be parsed.
    #[error("invalid configuration value for {key}: {value}")]
    Config {
        /// The configuration key.
        key: &'static str,
        /// The raw value that was rejected.
        value: String,
    },

    /// A provided URL could not be parsed.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// The store could not be opened or migrated.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Failures of the persistent store.
///
/// Callers distinguish these from "not found": a read that fails is treated as absent data, but
/// is logged as an outage.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying SQLite call failed.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The store could not be reached (lock poisoned, connection gone).
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A stored row could not be decoded into a record.
    #[error("corrupt row: {0}")]
    Corrupt(String),

    /// The blocking task running the query did not complete.
    #[error("store task failed: {0}")]
    Task(String),
}

/// Retry and fallback class of a [`FetchError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchClass {
    /// Network trouble, rate limits, server errors. Eligible for retry and stale fallback.
    Transient,
    /// Bad input or an unusable payload. Never retried automatically.
    Permanent,
}

/// Failure of a provider fetch.
///
/// `Clone` so one failure can be handed to every waiter of a deduplicated fetch.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The HTTP request timed out.
    #[error("request timed out: {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// A provider fetch for a cache key did not finish within the fetch timeout.
    #[error("{kind} fetch for {key} exceeded {after:?}")]
    Deadline {
        /// The entity kind being fetched.
        kind: &'static str,
        /// The cache key.
        key: String,
        /// The timeout that elapsed.
        after: Duration,
    },

    /// The connection could not be established.
    #[error("connection error: {0}")]
    Connect(String),

    /// The provider asked us to slow down (HTTP 429).
    #[error("rate limited at {url}")]
    RateLimited {
        /// The URL that was rate limited.
        url: String,
    },

    /// The provider failed with a 5xx status.
    #[error("server error {status} at {url}")]
    ServerError {
        /// The HTTP status code.
        status: u16,
        /// The URL that returned the error.
        url: String,
    },

    /// The provider does not know the requested entity (HTTP 404).
    #[error("not found: {url}")]
    NotFound {
        /// The URL that returned 404.
        url: String,
    },

    /// The provider returned another unsuccessful status.
    #[error("unexpected response status: {status} at {url}")]
    Status {
        /// The HTTP status code.
        status: u16,
        /// The URL that returned the error.
        url: String,
    },

    /// The payload was missing required fields or could not be decoded.
    #[error("malformed payload: {0}")]
    Malformed(String),

    /// The provider answered for a different symbol than the one requested.
    #[error("symbol mismatch: requested {requested}, provider returned {returned}")]
    SymbolMismatch {
        /// The requested ticker.
        requested: String,
        /// The ticker in the provider payload.
        returned: String,
    },

    /// A credential or endpoint the provider needs is missing.
    #[error("provider not configured: {0}")]
    NotConfigured(&'static str),

    /// The shared fetch task was aborted or panicked.
    #[error("fetch interrupted: {0}")]
    Interrupted(String),
}

impl FetchError {
    /// Classifies the failure for retry and fallback decisions.
    #[must_use]
    pub const fn class(&self) -> FetchClass {
        match self {
            Self::Timeout { .. }
            | Self::Deadline { .. }
            | Self::Connect(_)
            | Self::RateLimited { .. }
            | Self::ServerError { .. }
            | Self::Interrupted(_) => FetchClass::Transient,
            Self::Status { status, .. } if *status == 408 => FetchClass::Transient,
            Self::Status { .. }
            | Self::NotFound { .. }
            | Self::Malformed(_)
            | Self::SymbolMismatch { .. }
            | Self::NotConfigured(_) => FetchClass::Permanent,
        }
    }

    /// Shorthand for `class() == FetchClass::Transient`.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self.class(), FetchClass::Transient)
    }

    /// Maps an unsuccessful HTTP status to the matching variant.
    pub(crate) fn from_status(status: u16, url: impl Into<String>) -> Self {
        let url = url.into();
        match status {
            404 => Self::NotFound { url },
            429 => Self::RateLimited { url },
            500..=599 => Self::ServerError { status, url },
            _ => Self::Status { status, url },
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        let url = e.url().map(ToString::to_string).unwrap_or_default();
        if e.is_timeout() {
            Self::Timeout { url }
        } else if e.is_connect() {
            Self::Connect(e.to_string())
        } else if let Some(status) = e.status() {
            Self::from_status(status.as_u16(), url)
        } else if e.is_decode() {
            Self::Malformed(e.to_string())
        } else {
            Self::Connect(e.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        Self::Malformed(e.to_string())
    }
}
