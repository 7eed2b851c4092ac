//! Aggregate queries over the `events` table.
//!
//! Each query is a single read statement whose `WHERE` clause ANDs the domain,
//! an optional event-name match, and [`WINDOW_SQL`]. The window bounds are
//! always bound as parameters `?2` (from) and `?3` (to); a NULL bound turns
//! its predicate into a wildcard.

pub mod devices;
pub mod sites;
pub mod stats;
pub mod timeseries;
pub mod top;
pub mod vitals;

use chrono::{DateTime, Utc};

use iris_core::analytics::TimeWindow;

/// Inclusive window predicate. `?2` is the lower bound, `?3` the upper one.
pub(crate) const WINDOW_SQL: &str = r#"(CAST(?2 AS TIMESTAMP) IS NULL OR "timestamp" >= CAST(?2 AS TIMESTAMP))
              AND (CAST(?3 AS TIMESTAMP) IS NULL OR "timestamp" <= CAST(?3 AS TIMESTAMP))"#;

/// Render an instant the way it is stored: naive UTC with microseconds.
pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

/// The `(from, to)` bind values for [`WINDOW_SQL`].
pub(crate) fn window_params(window: &TimeWindow) -> (Option<String>, Option<String>) {
    (
        window.from.as_ref().map(format_timestamp),
        window.to.as_ref().map(format_timestamp),
    )
}
