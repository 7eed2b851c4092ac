use anyhow::Result;
use duckdb::Connection;

use iris_core::analytics::{StatsResult, TimeWindow};
use iris_core::error::RepositoryResult;
use iris_core::event::PAGEVIEW;

use super::{window_params, WINDOW_SQL};
use crate::DuckDbBackend;

impl DuckDbBackend {
    /// Pageviews, distinct visitors and distinct sessions for `domain`.
    pub async fn get_stats(
        &self,
        domain: &str,
        window: &TimeWindow,
    ) -> RepositoryResult<StatsResult> {
        let domain = domain.to_string();
        let window = *window;
        self.with_conn(move |conn| query_stats(conn, &domain, &window))
            .await
    }
}

pub(crate) fn query_stats(
    conn: &Connection,
    domain: &str,
    window: &TimeWindow,
) -> Result<StatsResult> {
    let (from, to) = window_params(window);
    let sql = format!(
        r#"
        SELECT
            COUNT(*)                   AS pageviews,
            COUNT(DISTINCT visitor_id) AS unique_visitors,
            COUNT(DISTINCT session_id) AS sessions
        FROM events
        WHERE domain = ?1
          AND event_name = ?4
          AND {WINDOW_SQL}
        "#
    );

    let mut stmt = conn.prepare(&sql)?;
    let result = stmt.query_row(duckdb::params![domain, from, to, PAGEVIEW], |row| {
        Ok(StatsResult {
            pageviews: row.get::<_, i64>(0)?,
            unique_visitors: row.get::<_, i64>(1)?,
            sessions: row.get::<_, i64>(2)?,
        })
    })?;

    Ok(result)
}
