use anyhow::Result;
use duckdb::Connection;

use iris_core::analytics::{DeviceClass, DeviceStat, TimeWindow};
use iris_core::error::RepositoryResult;

use super::{window_params, WINDOW_SQL};
use crate::DuckDbBackend;

impl DuckDbBackend {
    /// Event counts per device class, any event name.
    pub async fn get_devices(
        &self,
        domain: &str,
        window: &TimeWindow,
    ) -> RepositoryResult<Vec<DeviceStat>> {
        let domain = domain.to_string();
        let window = *window;
        self.with_conn(move |conn| query_devices(conn, &domain, &window))
            .await
    }
}

/// SQL `CASE` mirroring [`DeviceClass::from_width`].
fn device_case_sql() -> String {
    format!(
        "CASE WHEN screen_width < {tablet} THEN '{mobile_name}' \
              WHEN screen_width < {desktop} THEN '{tablet_name}' \
              ELSE '{desktop_name}' END",
        tablet = DeviceClass::TABLET_MIN_WIDTH,
        desktop = DeviceClass::DESKTOP_MIN_WIDTH,
        mobile_name = DeviceClass::Mobile.as_str(),
        tablet_name = DeviceClass::Tablet.as_str(),
        desktop_name = DeviceClass::Desktop.as_str(),
    )
}

pub(crate) fn query_devices(
    conn: &Connection,
    domain: &str,
    window: &TimeWindow,
) -> Result<Vec<DeviceStat>> {
    let (from, to) = window_params(window);
    let sql = format!(
        r#"
        SELECT {case_sql} AS device, COUNT(*) AS device_count
        FROM events
        WHERE domain = ?1
          AND {WINDOW_SQL}
        GROUP BY device
        ORDER BY device_count DESC, device ASC
        "#,
        case_sql = device_case_sql(),
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(duckdb::params![domain, from, to], |row| {
        Ok(DeviceStat {
            device: row.get(0)?,
            count: row.get(1)?,
        })
    })?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}
