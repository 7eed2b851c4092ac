use anyhow::Result;
use duckdb::Connection;

use iris_core::analytics::{TimeSeriesBucket, TimeWindow};
use iris_core::error::RepositoryResult;
use iris_core::event::PAGEVIEW;

use super::{window_params, WINDOW_SQL};
use crate::DuckDbBackend;

impl DuckDbBackend {
    /// Daily pageview counts, oldest first. Days without pageviews are absent.
    pub async fn get_pageviews_time_series(
        &self,
        domain: &str,
        window: &TimeWindow,
    ) -> RepositoryResult<Vec<TimeSeriesBucket>> {
        let domain = domain.to_string();
        let window = *window;
        self.with_conn(move |conn| query_pageviews_time_series(conn, &domain, &window))
            .await
    }
}

pub(crate) fn query_pageviews_time_series(
    conn: &Connection,
    domain: &str,
    window: &TimeWindow,
) -> Result<Vec<TimeSeriesBucket>> {
    let (from, to) = window_params(window);
    // Stored timestamps are UTC, so the day boundary is UTC midnight.
    let sql = format!(
        r#"
        SELECT
            strftime("timestamp", '%Y-%m-%d') AS day,
            COUNT(*)                          AS pageviews
        FROM events
        WHERE domain = ?1
          AND event_name = ?4
          AND {WINDOW_SQL}
        GROUP BY day
        ORDER BY day ASC
        "#
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(duckdb::params![domain, from, to, PAGEVIEW], |row| {
        Ok(TimeSeriesBucket {
            date: row.get(0)?,
            pageviews: row.get(1)?,
        })
    })?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}
