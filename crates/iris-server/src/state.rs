use std::sync::Arc;

use iris_core::{analytics::EventRepository, config::Config};
use iris_duckdb::DuckDbBackend;

/// Shared application state injected into every Axum handler via
/// [`axum::extract::State`].
///
/// Built once at startup and shared by `Arc`; no global handle exists.
pub struct AppState {
    /// The DuckDB backend, for operations outside the repository contract
    /// (liveness ping).
    pub db: Arc<DuckDbBackend>,

    /// The same backend seen through the repository contract. Every ingestion
    /// and dashboard handler goes through this.
    pub repo: Arc<dyn EventRepository>,

    /// Parsed configuration, loaded once at startup from environment variables.
    pub config: Arc<Config>,
}

impl AppState {
    /// Construct a new `AppState` wrapping the given backend and config.
    pub fn new(db: DuckDbBackend, config: Config) -> Self {
        let db = Arc::new(db);
        Self {
            repo: db.clone(),
            db,
            config: Arc::new(config),
        }
    }

    /// `limit` for a top-N query: the requested value, or the configured
    /// default, clamped to `1..=100`.
    pub fn top_limit(&self, requested: Option<u32>) -> u32 {
        requested.unwrap_or(self.config.top_limit).clamp(1, 100)
    }
}
