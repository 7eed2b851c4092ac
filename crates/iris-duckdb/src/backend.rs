use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use duckdb::Connection;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use iris_core::error::{RepositoryError, RepositoryResult};
use iris_core::event::Event;

use crate::queries::format_timestamp;
use crate::schema::init_sql;

/// The DuckDB-backed event repository.
///
/// DuckDB's `Connection` is `Send` but not `Sync`, so the single handle is
/// kept behind `Arc<Mutex<_>>` and shared by every caller; DuckDB itself
/// serialises writes. The `Option` becomes `None` once [`close`] has run, and
/// every later call reports [`RepositoryError::Closed`].
///
/// Statements run on Tokio's blocking pool so a slow query never stalls the
/// async workers. With a query timeout set, a read waits at most that long
/// and gets [`RepositoryError::Timeout`] instead of hanging. Inserts always
/// report the statement's real outcome.
///
/// [`close`]: DuckDbBackend::close
pub struct DuckDbBackend {
    pub(crate) conn: Arc<Mutex<Option<Connection>>>,
    query_timeout: Option<Duration>,
}

impl DuckDbBackend {
    /// Open (or create) a DuckDB database file at `path`.
    ///
    /// Creates the parent directory when missing, then runs the schema init
    /// SQL so the `events` table exists.
    pub fn open(path: &str, memory_limit: &str) -> Result<Self> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(&init_sql(memory_limit))?;
        info!(
            "DuckDB opened at {} with memory_limit={}, threads=2",
            path, memory_limit
        );
        Ok(Self::from_connection(conn))
    }

    /// Open an **in-memory** DuckDB database.
    ///
    /// Intended for tests; data is discarded when the struct is dropped.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(&init_sql("1GB"))?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(Some(conn))),
            query_timeout: None,
        }
    }

    /// Bound every read by `timeout`. `None` waits indefinitely. Inserts are
    /// never bounded.
    pub fn with_query_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.query_timeout = timeout;
        self
    }

    /// Run a read `f` against the connection on the blocking pool, bounded by
    /// the query timeout.
    ///
    /// Errors from `f` surface as [`RepositoryError::Storage`] unchanged. On
    /// expiry the caller gets [`RepositoryError::Timeout`]; a read still
    /// queued behind the connection lock is then skipped, one already running
    /// finishes on its thread and its result is dropped. Reads have no side
    /// effects, so either way the store is unchanged.
    pub(crate) async fn with_conn<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        self.run_blocking(self.query_timeout, f).await
    }

    /// Run a write `f` on the blocking pool with no deadline.
    ///
    /// A write reported as failed must not land later, and a statement
    /// already handed to DuckDB cannot be recalled, so writes always wait for
    /// the real outcome.
    pub(crate) async fn with_conn_unbounded<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        self.run_blocking(None, f).await
    }

    async fn run_blocking<T, F>(&self, deadline: Option<Duration>, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let abandoned = Arc::new(AtomicBool::new(false));
        let task_abandoned = Arc::clone(&abandoned);
        let task = tokio::task::spawn_blocking(move || {
            let guard = conn.blocking_lock();
            if task_abandoned.load(Ordering::Acquire) {
                return Err(RepositoryError::Storage(anyhow!("caller gave up waiting")));
            }
            match guard.as_ref() {
                Some(conn) => f(conn).map_err(RepositoryError::Storage),
                None => Err(RepositoryError::Closed),
            }
        });

        let joined = match deadline {
            Some(limit) => match tokio::time::timeout(limit, task).await {
                Ok(joined) => joined,
                Err(_) => {
                    abandoned.store(true, Ordering::Release);
                    warn!(
                        timeout_ms = limit.as_millis() as u64,
                        "DuckDB statement timed out"
                    );
                    return Err(RepositoryError::Timeout(limit));
                }
            },
            None => task.await,
        };

        joined.map_err(|e| RepositoryError::Storage(anyhow!("query task failed: {e}")))?
    }

    /// Append one event.
    ///
    /// Rejects events without a domain: they could never be read back by any
    /// aggregate. A `properties` map that fails to serialize is stored as
    /// `{}` so the rest of the event is not lost. Not bounded by the query
    /// timeout: the result is always the statement's real outcome.
    pub async fn insert_event(&self, event: &Event) -> RepositoryResult<()> {
        if event.domain.is_empty() {
            return Err(RepositoryError::InvalidEvent(
                "domain must not be empty".to_string(),
            ));
        }

        let properties = event.properties.as_ref().map(|props| {
            serde_json::to_string(props).unwrap_or_else(|e| {
                warn!(
                    event_id = %event.id,
                    error = %e,
                    "Properties not serializable, storing {{}}"
                );
                "{}".to_string()
            })
        });
        let event = event.clone();

        self.with_conn_unbounded(move |conn| {
            conn.execute(
                r#"INSERT INTO events (
                    id, event_name, url, domain, referrer, screen_width,
                    site_id, session_id, visitor_id, properties, "timestamp"
                ) VALUES (
                    ?1, ?2, ?3, ?4, ?5, ?6,
                    ?7, ?8, ?9, ?10, CAST(?11 AS TIMESTAMP)
                )"#,
                duckdb::params![
                    event.id,
                    event.event_name,
                    event.url,
                    event.domain,
                    event.referrer,
                    event.screen_width,
                    event.site_id,
                    event.session_id,
                    event.visitor_id,
                    properties,
                    format_timestamp(&event.timestamp),
                ],
            )?;
            debug!(event_id = %event.id, domain = %event.domain, "Inserted event");
            Ok(())
        })
        .await
    }

    /// Execute `SELECT 1` as a lightweight liveness check.
    pub async fn ping(&self) -> RepositoryResult<()> {
        self.with_conn(|conn| {
            conn.execute_batch("SELECT 1")?;
            Ok(())
        })
        .await
    }

    /// Close the DuckDB handle.
    ///
    /// Later calls, including a second `close`, fail with
    /// [`RepositoryError::Closed`].
    pub async fn close(&self) -> RepositoryResult<()> {
        let conn = self.conn.lock().await.take().ok_or(RepositoryError::Closed)?;
        conn.close()
            .map_err(|(_, e)| RepositoryError::Storage(e.into()))?;
        info!("DuckDB closed");
        Ok(())
    }

    /// Acquire the DuckDB connection lock for direct queries.
    ///
    /// Intended for integration tests that need to inspect stored rows.
    pub async fn conn_for_test(&self) -> MutexGuard<'_, Option<Connection>> {
        self.conn.lock().await
    }
}
