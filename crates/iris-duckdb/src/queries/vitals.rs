use anyhow::Result;
use duckdb::Connection;

use iris_core::analytics::{TimeWindow, VitalStat};
use iris_core::error::RepositoryResult;
use iris_core::event::WEB_VITAL;

use super::{window_params, WINDOW_SQL};
use crate::DuckDbBackend;

impl DuckDbBackend {
    /// Mean value per web-vital name.
    pub async fn get_vitals(
        &self,
        domain: &str,
        window: &TimeWindow,
    ) -> RepositoryResult<Vec<VitalStat>> {
        let domain = domain.to_string();
        let window = *window;
        self.with_conn(move |conn| query_vitals(conn, &domain, &window))
            .await
    }
}

/// `$name` and `$val` are pulled out of the stored JSON by DuckDB.
///
/// A row only counts when `$name` is present and `$val` is a JSON number.
/// Anything else (missing, string, bool, object) is skipped, so it adds to
/// neither the sum nor the count of the average.
pub(crate) fn query_vitals(
    conn: &Connection,
    domain: &str,
    window: &TimeWindow,
) -> Result<Vec<VitalStat>> {
    let (from, to) = window_params(window);
    let sql = format!(
        r#"
        WITH vitals AS (
            SELECT
                json_extract_string(properties, '$."$name"') AS name,
                CASE
                    WHEN json_type(properties, '$."$val"') IN ('BIGINT', 'UBIGINT', 'DOUBLE')
                    THEN TRY_CAST(json_extract_string(properties, '$."$val"') AS DOUBLE)
                END AS val
            FROM events
            WHERE domain = ?1
              AND event_name = ?4
              AND properties IS NOT NULL
              AND {WINDOW_SQL}
        )
        SELECT name, AVG(val) AS value
        FROM vitals
        WHERE name IS NOT NULL
          AND val IS NOT NULL
        GROUP BY name
        ORDER BY name ASC
        "#
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(duckdb::params![domain, from, to, WEB_VITAL], |row| {
        Ok(VitalStat {
            name: row.get(0)?,
            value: row.get(1)?,
        })
    })?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}
