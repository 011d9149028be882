use std::sync::Arc;

use crate::config::AppConfig;
use crate::middleware::rate_limit::RateLimiter;
use crate::storage::UploadStore;

/// The shared application state.
///
/// Cloneable handle passed to every request: connection pool, configuration,
/// the disk-backed upload adapter and the request rate limiter.
#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::SqlitePool,
    pub config: Arc<AppConfig>,
    pub uploads: UploadStore,
    pub rate_limiter: RateLimiter,
}

impl AppState {
    pub fn new(db: sqlx::SqlitePool, config: AppConfig) -> anyhow::Result<Self> {
        let uploads = UploadStore::new(config.uploads_dir(), config.uploads.max_file_size_bytes)?;
        let rate_limiter =
            RateLimiter::new(config.rate_limit.max_requests, config.rate_limit.window_seconds);

        Ok(Self { db, config: Arc::new(config), uploads, rate_limiter })
    }
}
