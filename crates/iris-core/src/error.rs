use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by an [`EventRepository`](crate::analytics::EventRepository).
///
/// Nothing is retried or swallowed inside a repository: every failure reaches
/// the caller as one of these variants.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Connection, schema, statement or row-scan failure from the store.
    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),

    /// The event cannot be stored as given (e.g. it has no domain).
    #[error("invalid event: {0}")]
    InvalidEvent(String),

    /// The statement did not finish before the configured deadline.
    #[error("statement timed out after {0:?}")]
    Timeout(Duration),

    /// The repository was closed; no further calls are accepted.
    #[error("repository is closed")]
    Closed,
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Errors raised while interpreting a caller-supplied time window.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WindowError {
    #[error("invalid {field} bound: {value:?} is not an ISO-8601 date or instant")]
    Unparseable { field: &'static str, value: String },
}
