use anyhow::Result;
use duckdb::Connection;

use iris_core::analytics::{PageStat, ReferrerStat, TimeWindow};
use iris_core::error::RepositoryResult;
use iris_core::event::PAGEVIEW;

use super::{window_params, WINDOW_SQL};
use crate::DuckDbBackend;

impl DuckDbBackend {
    pub async fn get_top_pages(
        &self,
        domain: &str,
        window: &TimeWindow,
        limit: u32,
    ) -> RepositoryResult<Vec<PageStat>> {
        let domain = domain.to_string();
        let window = *window;
        self.with_conn(move |conn| query_top_pages(conn, &domain, &window, limit))
            .await
    }

    pub async fn get_top_referrers(
        &self,
        domain: &str,
        window: &TimeWindow,
        limit: u32,
    ) -> RepositoryResult<Vec<ReferrerStat>> {
        let domain = domain.to_string();
        let window = *window;
        self.with_conn(move |conn| query_top_referrers(conn, &domain, &window, limit))
            .await
    }
}

/// Most viewed URLs. Ties are broken by URL so repeated calls agree.
pub(crate) fn query_top_pages(
    conn: &Connection,
    domain: &str,
    window: &TimeWindow,
    limit: u32,
) -> Result<Vec<PageStat>> {
    let (from, to) = window_params(window);
    let sql = format!(
        r#"
        SELECT url, COUNT(*) AS pageviews
        FROM events
        WHERE domain = ?1
          AND event_name = ?4
          AND {WINDOW_SQL}
        GROUP BY url
        ORDER BY pageviews DESC, url ASC
        LIMIT ?5
        "#
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        duckdb::params![domain, from, to, PAGEVIEW, i64::from(limit)],
        |row| {
            Ok(PageStat {
                url: row.get(0)?,
                pageviews: row.get(1)?,
            })
        },
    )?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

/// Referrers ranked by distinct visitors. Pageviews without a referrer are
/// left out.
pub(crate) fn query_top_referrers(
    conn: &Connection,
    domain: &str,
    window: &TimeWindow,
    limit: u32,
) -> Result<Vec<ReferrerStat>> {
    let (from, to) = window_params(window);
    let sql = format!(
        r#"
        SELECT referrer, COUNT(DISTINCT visitor_id) AS visitors
        FROM events
        WHERE domain = ?1
          AND event_name = ?4
          AND referrer <> ''
          AND {WINDOW_SQL}
        GROUP BY referrer
        ORDER BY visitors DESC, referrer ASC
        LIMIT ?5
        "#
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        duckdb::params![domain, from, to, PAGEVIEW, i64::from(limit)],
        |row| {
            Ok(ReferrerStat {
                referrer: row.get(0)?,
                visitors: row.get(1)?,
            })
        },
    )?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}
