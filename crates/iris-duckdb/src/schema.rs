/// DuckDB initialization SQL.
///
/// Executed once at database open time via `Connection::execute_batch`.
/// Every statement uses `IF NOT EXISTS` so it is safe to re-run on each
/// startup.
///
/// `memory_limit` comes from `Config.duckdb_memory_limit`
/// (env `IRIS_DUCKDB_MEMORY`, default `"1GB"`). The DuckDB default of 80% of
/// system RAM is not acceptable for a server process, so a limit is always set.
///
/// The `events` table is append-only. `properties` holds the serialized JSON
/// object so vitals can be pulled out with `json_extract_string` inside the
/// query. `timestamp` is quoted everywhere because it doubles as a type name.
pub fn init_sql(memory_limit: &str) -> String {
    format!(
        r#"SET memory_limit = '{memory_limit}';
SET threads = 2;

CREATE TABLE IF NOT EXISTS events (
    id              VARCHAR PRIMARY KEY,           -- UUID v4, assigned at ingestion
    event_name      VARCHAR NOT NULL,              -- '$pageview' | '$web_vital' | custom
    url             VARCHAR NOT NULL,
    domain          VARCHAR NOT NULL,              -- tenancy key for every aggregate
    referrer        VARCHAR NOT NULL DEFAULT '',   -- '' = no referrer
    screen_width    INTEGER NOT NULL DEFAULT 0,
    site_id         VARCHAR NOT NULL,
    session_id      VARCHAR NOT NULL,
    visitor_id      VARCHAR NOT NULL,
    properties      VARCHAR,                       -- JSON object text (nullable)
    "timestamp"     TIMESTAMP NOT NULL             -- UTC, microsecond precision
);
CREATE INDEX IF NOT EXISTS idx_events_domain_timestamp
    ON events(domain, "timestamp");
"#
    )
}
