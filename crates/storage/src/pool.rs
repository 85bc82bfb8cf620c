#![forbid(unsafe_code)]

//! Bounded pool of store connections for async callers.
//!
//! At most `max_open` connections exist at once (one per permit), at most `max_idle` are kept
//! between uses, and a connection older than `max_lifetime` is closed on return. Store work
//! runs on the blocking thread pool; cancelling the caller's token interrupts the statement in
//! flight and fails every statement the work starts afterwards.

use crate::{SqliteStore, StoreError};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_MAX_OPEN: usize = 100;
pub const DEFAULT_MAX_IDLE: usize = 10;
pub const DEFAULT_MAX_LIFETIME: Duration = Duration::from_secs(3600);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    pub db_path: PathBuf,
    pub max_open: usize,
    pub max_idle: usize,
    pub max_lifetime: Duration,
}

impl PoolConfig {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            max_open: DEFAULT_MAX_OPEN,
            max_idle: DEFAULT_MAX_IDLE,
            max_lifetime: DEFAULT_MAX_LIFETIME,
        }
    }
}

#[derive(Debug)]
struct PooledStore {
    store: SqliteStore,
    opened_at: Instant,
}

#[derive(Debug)]
struct PoolInner {
    config: PoolConfig,
    permits: Arc<Semaphore>,
    idle: Mutex<Vec<PooledStore>>,
    closed: AtomicBool,
}

#[derive(Clone, Debug)]
pub struct StorePool {
    inner: Arc<PoolInner>,
}

impl StorePool {
    /// Opens the first connection eagerly so schema migration and connectivity errors surface
    /// at startup.
    pub fn open(config: PoolConfig) -> Result<Self, StoreError> {
        if config.max_open == 0 {
            return Err(StoreError::InvalidInput("max_open must be at least 1"));
        }
        if config.max_idle > config.max_open {
            return Err(StoreError::InvalidInput("max_idle must not exceed max_open"));
        }

        let first = PooledStore {
            store: SqliteStore::open(&config.db_path)?,
            opened_at: Instant::now(),
        };
        let idle = if config.max_idle > 0 {
            vec![first]
        } else {
            Vec::new()
        };
        Ok(Self {
            inner: Arc::new(PoolInner {
                permits: Arc::new(Semaphore::new(config.max_open)),
                idle: Mutex::new(idle),
                closed: AtomicBool::new(false),
                config,
            }),
        })
    }

    pub fn config(&self) -> &PoolConfig {
        &self.inner.config
    }

    pub fn idle_count(&self) -> usize {
        self.idle().len()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Runs `op` on a pooled connection. Cancellation while waiting for a permit returns
    /// `Cancelled` immediately; cancellation while `op` runs stops its current and later
    /// statements.
    pub async fn run<T, F>(&self, cancel: &CancellationToken, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut SqliteStore) -> Result<T, StoreError> + Send + 'static,
    {
        if cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        let permit = tokio::select! {
            _ = cancel.cancelled() => return Err(StoreError::Cancelled),
            permit = self.inner.permits.clone().acquire_owned() => {
                permit.map_err(|_| StoreError::PoolClosed)?
            }
        };

        let pooled = match self.take_idle() {
            Some(pooled) => pooled,
            None => self.open_connection().await?,
        };
        let cancel_handle = pooled.store.cancel_handle();

        let mut task = tokio::task::spawn_blocking(move || {
            let mut pooled = pooled;
            let result = op(&mut pooled.store);
            (pooled, result)
        });
        let finished = tokio::select! {
            joined = &mut task => Some(joined),
            _ = cancel.cancelled() => None,
        };
        let joined = match finished {
            Some(joined) => joined,
            None => {
                cancel_handle.cancel();
                task.await
            }
        };
        let (pooled, result) = joined.map_err(|err| StoreError::Worker(err.to_string()))?;

        self.give_back(pooled);
        drop(permit);

        match result {
            Err(_) if cancel.is_cancelled() => Err(StoreError::Cancelled),
            other => other,
        }
    }

    /// Refuses new work and closes idle connections. Work already running finishes and its
    /// connection is closed on return.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
        self.inner.permits.close();
        let drained = std::mem::take(&mut *self.idle());
        tracing::info!(closed = drained.len(), "store pool drained");
    }

    async fn open_connection(&self) -> Result<PooledStore, StoreError> {
        let db_path = self.inner.config.db_path.clone();
        let store = tokio::task::spawn_blocking(move || SqliteStore::open(db_path))
            .await
            .map_err(|err| StoreError::Worker(err.to_string()))??;
        tracing::debug!("opened store connection");
        Ok(PooledStore {
            store,
            opened_at: Instant::now(),
        })
    }

    fn take_idle(&self) -> Option<PooledStore> {
        let mut idle = self.idle();
        while let Some(pooled) = idle.pop() {
            if pooled.opened_at.elapsed() < self.inner.config.max_lifetime {
                return Some(pooled);
            }
            tracing::debug!("discarding expired store connection");
        }
        None
    }

    fn give_back(&self, pooled: PooledStore) {
        if self.is_closed() || pooled.opened_at.elapsed() >= self.inner.config.max_lifetime {
            return;
        }
        let mut idle = self.idle();
        if idle.len() < self.inner.config.max_idle {
            idle.push(pooled);
        }
    }

    fn idle(&self) -> MutexGuard<'_, Vec<PooledStore>> {
        self.inner
            .idle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
