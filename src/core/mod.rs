//! Core components of the `marketcache-rs` crate.
//!
//! This module contains the building blocks every entity kind shares:
//! - The error types ([`CacheError`], [`FetchError`], [`StoreError`]).
//! - The freshness evaluator, clock and cache-first orchestrator.
//! - The in-flight deduplication guard.
//! - The HTTP client, its retry policy and the crate configuration.

/// The HTTP client used by provider fetchers, and its builder.
pub mod client;
/// Time source abstraction.
pub mod clock;
/// Configuration loaded from the environment or built in code.
pub mod config;
/// Per-key in-flight fetch deduplication.
pub mod dedup;
/// The entity, store and fetcher capability traits.
pub mod entity;
/// Error types for the crate.
pub mod error;
/// Freshness evaluation.
pub mod freshness;
/// The cache-first read algorithm.
pub mod orchestrator;
/// Retry policy for provider requests.
pub mod retry;

pub(crate) mod net;

pub use client::{HttpClient, HttpClientBuilder};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CacheConfig, CacheConfigBuilder, DEFAULT_TICKERS};
pub use dedup::InFlight;
pub use entity::{CacheEntity, CacheMode, Cached, EntityStore, Fetcher};
pub use error::{CacheError, FetchClass, FetchError, StoreError};
pub use freshness::{Freshness, is_fresh};
pub use orchestrator::CacheFirst;
pub use retry::{Backoff, RetryConfig};
