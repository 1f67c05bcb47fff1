// src/refresh.rs
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::models::scoreboard::Snapshot;
use crate::query::{QueryError, ServerQuery, Target};
use crate::storage::memory::SnapshotStore;

/// How long a fetched snapshot may be served before the server is asked again.
pub const SNAPSHOT_TTL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("fetching server summary: {0}")]
    Summary(#[source] Arc<QueryError>),
    #[error("fetching client records: {0}")]
    Clients(#[source] Arc<QueryError>),
    #[error("refresh task ended abnormally: {0}")]
    Aborted(String),
}

struct Inner {
    query: Arc<dyn ServerQuery>,
    target: Target,
    store: SnapshotStore,
    // Held across the freshness re-check, the fetch and the store write.
    // The value is the outcome of the most recent attempt if it failed.
    exclusive: Arc<Mutex<Option<FetchError>>>,
    // Finished attempts, bumped before `exclusive` is released.
    attempts: AtomicU64,
}

impl Inner {
    async fn fetch(&self) -> Result<Arc<Snapshot>, FetchError> {
        let timeout = self.target.timeout;
        let summary = bounded(timeout, self.query.fetch_server_summary(&self.target))
            .await
            .map_err(|e| FetchError::Summary(Arc::new(e)))?;
        let clients = bounded(timeout, self.query.fetch_all_client_records(&self.target))
            .await
            .map_err(|e| FetchError::Clients(Arc::new(e)))?;
        Ok(Arc::new(Snapshot::new(summary, clients, Instant::now() + SNAPSHOT_TTL)))
    }
}

async fn bounded<T>(
    timeout: Duration,
    call: impl Future<Output = Result<T, QueryError>>,
) -> Result<T, QueryError> {
    tokio::time::timeout(timeout, call)
        .await
        .unwrap_or(Err(QueryError::Timeout(timeout)))
}

/// Serves the cached snapshot while it is fresh and refreshes it otherwise.
///
/// At most one fetch runs at a time. Callers that find the snapshot stale
/// while a fetch is in flight wait for it and share its outcome, success or
/// failure. A failure is only shared with those waiters: the next caller to
/// arrive tries again.
#[derive(Clone)]
pub struct RefreshCoordinator {
    inner: Arc<Inner>,
}

impl RefreshCoordinator {
    pub fn new(query: Arc<dyn ServerQuery>, target: Target) -> Self {
        Self {
            inner: Arc::new(Inner {
                query,
                target,
                store: SnapshotStore::new(Snapshot::empty(Instant::now())),
                exclusive: Arc::new(Mutex::new(None)),
                attempts: AtomicU64::new(0),
            }),
        }
    }

    pub fn target(&self) -> &Target {
        &self.inner.target
    }

    /// The stored snapshot, fresh or not.
    pub fn current(&self) -> Arc<Snapshot> {
        self.inner.store.read()
    }

    pub async fn get_fresh(&self) -> Result<Arc<Snapshot>, FetchError> {
        // Taken before looking at the store, so an attempt that finishes after
        // this point is one this caller waited on.
        let seen = self.inner.attempts.load(Ordering::Acquire);
        let current = self.inner.store.read();
        if current.is_fresh(Instant::now()) {
            return Ok(current);
        }

        let mut last_failure = self.inner.exclusive.clone().lock_owned().await;

        let current = self.inner.store.read();
        if current.is_fresh(Instant::now()) {
            return Ok(current);
        }
        if self.inner.attempts.load(Ordering::Acquire) != seen {
            if let Some(err) = last_failure.as_ref() {
                return Err(err.clone());
            }
        }

        // The fetch owns the guard, so it finishes and releases exclusivity
        // even if this caller goes away.
        let inner = self.inner.clone();
        let refresh = tokio::spawn(async move {
            let result = inner.fetch().await;
            match &result {
                Ok(snapshot) => {
                    inner.store.write(snapshot.clone());
                    *last_failure = None;
                }
                Err(err) => *last_failure = Some(err.clone()),
            }
            inner.attempts.fetch_add(1, Ordering::Release);
            result
        });

        refresh
            .await
            .unwrap_or_else(|e| Err(FetchError::Aborted(e.to_string())))
    }
}
