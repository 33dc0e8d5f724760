//! Per-key single-flight guard for provider fetches.
//!
//! The first caller for a key spawns the fetch as its own task; callers arriving while it runs
//! await the same shared result. The task is detached from its callers, so dropping a waiter
//! never cancels a fetch that other waiters still need. The pending marker is removed from
//! inside the task when it finishes, panics included.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};

use crate::core::FetchError;

type SharedFetch<T> = Shared<BoxFuture<'static, Result<T, FetchError>>>;
type PendingMap<K, T> = Arc<Mutex<HashMap<K, SharedFetch<T>>>>;

/// Runs a closure when dropped.
struct CallOnDrop {
    f: Option<Box<dyn FnOnce() + Send + 'static>>,
}

impl CallOnDrop {
    fn new<F: FnOnce() + Send + 'static>(f: F) -> Self {
        Self {
            f: Some(Box::new(f)),
        }
    }
}

impl Drop for CallOnDrop {
    fn drop(&mut self) {
        if let Some(f) = self.f.take() {
            f();
        }
    }
}

/// Deduplicates concurrent fetches for the same key within the process.
pub struct InFlight<K, T> {
    pending: PendingMap<K, T>,
}

impl<K, T> fmt::Debug for InFlight<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InFlight").finish_non_exhaustive()
    }
}

impl<K, T> Default for InFlight<K, T> {
    fn default() -> Self {
        Self {
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

fn lock<K, T>(pending: &Mutex<HashMap<K, SharedFetch<T>>>) -> MutexGuard<'_, HashMap<K, SharedFetch<T>>> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<K, T> InFlight<K, T>
where
    K: Eq + Hash + Clone + fmt::Display + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    /// Creates an empty guard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of fetches currently running.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.pending).len()
    }

    /// `true` when no fetch is running.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `true` while a fetch for `key` is running.
    #[must_use]
    pub fn is_pending(&self, key: &K) -> bool {
        lock(&self.pending).contains_key(key)
    }

    /// Runs `fetch` for `key`, or joins the fetch already running for it.
    ///
    /// Every caller sharing a fetch receives the same outcome, success or failure. Must be called
    /// from within a Tokio runtime.
    pub async fn run<F>(&self, key: K, fetch: F) -> Result<T, FetchError>
    where
        F: Future<Output = Result<T, FetchError>> + Send + 'static,
    {
        let shared = {
            let mut pending = lock(&self.pending);
            if let Some(existing) = pending.get(&key) {
                tracing::debug!(key = %key, "joining in-flight fetch");
                existing.clone()
            } else {
                // The lock is held until the marker is inserted, so the task's own removal can
                // never run before the insert.
                let clear = {
                    let pending = Arc::clone(&self.pending);
                    let key = key.clone();
                    CallOnDrop::new(move || {
                        lock(&pending).remove(&key);
                    })
                };
                let handle = tokio::spawn(async move {
                    let _clear = clear;
                    fetch.await
                });
                let shared = async move {
                    match handle.await {
                        Ok(outcome) => outcome,
                        Err(e) => Err(FetchError::Interrupted(e.to_string())),
                    }
                }
                .boxed()
                .shared();
                pending.insert(key, shared.clone());
                shared
            }
        };
        shared.await
    }
}
