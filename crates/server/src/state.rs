#![forbid(unsafe_code)]

use crate::ApiError;
use crate::config::AllowedOrigins;
use am_storage::{SqliteStore, StoreError, StorePool};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Clone, Debug)]
pub struct AppState {
    pub pool: StorePool,
    pub reports_dir: Arc<PathBuf>,
    pub allowed_origins: Arc<AllowedOrigins>,
}

impl AppState {
    pub fn new(pool: StorePool, reports_dir: PathBuf, allowed_origins: AllowedOrigins) -> Self {
        Self {
            pool,
            reports_dir: Arc::new(reports_dir),
            allowed_origins: Arc::new(allowed_origins),
        }
    }

    /// Runs `op` on a pooled store under the request's cancellation token.
    pub async fn store<T, F>(&self, cancel: &CancellationToken, op: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&mut SqliteStore) -> Result<T, StoreError> + Send + 'static,
    {
        Ok(self.pool.run(cancel, op).await?)
    }
}
