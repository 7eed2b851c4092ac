use anyhow::Result;
use duckdb::Connection;

use iris_core::analytics::SiteStat;
use iris_core::error::RepositoryResult;

use crate::DuckDbBackend;

impl DuckDbBackend {
    /// Every distinct `(site_id, domain)` pair seen so far, across all tenants.
    pub async fn get_sites(&self) -> RepositoryResult<Vec<SiteStat>> {
        self.with_conn(query_sites).await
    }
}

pub(crate) fn query_sites(conn: &Connection) -> Result<Vec<SiteStat>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT DISTINCT site_id, domain
        FROM events
        ORDER BY domain ASC, site_id ASC
        "#,
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(SiteStat {
            site_id: row.get(0)?,
            domain: row.get(1)?,
        })
    })?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}
