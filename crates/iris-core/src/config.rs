use std::time::Duration;

use crate::sanitize::DEFAULT_MAX_PROPERTY_LEN;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_dir: String,
    pub duckdb_memory_limit: String,
    /// Character cap applied to every string leaf of event properties.
    pub max_property_len: usize,
    /// Deadline for reads in milliseconds; `0` disables it. Inserts are
    /// never bounded.
    pub query_timeout_ms: u64,
    /// Default `limit` for the top pages / top referrers endpoints.
    pub top_limit: u32,
    /// Empty means any origin.
    pub cors_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup.
    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        Ok(Self {
            port: get("IRIS_PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse()
                .map_err(|e| format!("invalid port: {e}"))?,
            data_dir: get("IRIS_DATA_DIR").unwrap_or_else(|| "./data".to_string()),
            duckdb_memory_limit: get("IRIS_DUCKDB_MEMORY").unwrap_or_else(|| "1GB".to_string()),
            max_property_len: get("IRIS_MAX_PROPERTY_LEN")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_PROPERTY_LEN),
            query_timeout_ms: get("IRIS_QUERY_TIMEOUT_MS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(5000),
            top_limit: get("IRIS_TOP_LIMIT")
                .and_then(|v| v.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(10),
            cors_origins: get("IRIS_CORS_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        })
    }

    pub fn db_path(&self) -> String {
        format!("{}/iris.db", self.data_dir)
    }

    pub fn query_timeout(&self) -> Option<Duration> {
        (self.query_timeout_ms > 0).then(|| Duration::from_millis(self.query_timeout_ms))
    }
}
