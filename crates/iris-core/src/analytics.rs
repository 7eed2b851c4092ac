//! Event repository abstraction and the typed results of its aggregate queries.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{RepositoryResult, WindowError};
use crate::event::Event;

/// Optional inclusive `[from, to]` bound on event timestamps.
///
/// An unset bound is a wildcard: `TimeWindow::default()` matches every event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeWindow {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl TimeWindow {
    pub fn new(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        Self { from, to }
    }

    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Parse the raw `from`/`to` query values of a dashboard request.
    ///
    /// Each bound may be absent or empty (unset), an RFC 3339 instant, a naive
    /// `YYYY-MM-DDTHH:MM:SS[.f]` taken as UTC, or a bare `YYYY-MM-DD`. A bare
    /// date widens to the whole UTC day: start of day for `from`, last
    /// microsecond of the day for `to`.
    pub fn parse(from: Option<&str>, to: Option<&str>) -> Result<Self, WindowError> {
        Ok(Self {
            from: parse_bound(from, "from", Bound::Lower)?,
            to: parse_bound(to, "to", Bound::Upper)?,
        })
    }
}

#[derive(Clone, Copy)]
enum Bound {
    Lower,
    Upper,
}

fn parse_bound(
    raw: Option<&str>,
    field: &'static str,
    bound: Bound,
) -> Result<Option<DateTime<Utc>>, WindowError> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(s) => s,
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(dt.with_timezone(&Utc)));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(Some(naive.and_utc()));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let naive = match bound {
            Bound::Lower => date.and_hms_opt(0, 0, 0),
            Bound::Upper => date.and_hms_micro_opt(23, 59, 59, 999_999),
        };
        if let Some(naive) = naive {
            return Ok(Some(naive.and_utc()));
        }
    }

    Err(WindowError::Unparseable {
        field,
        value: raw.to_string(),
    })
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsResult {
    pub pageviews: i64,
    pub unique_visitors: i64,
    pub sessions: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageStat {
    pub url: String,
    pub pageviews: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferrerStat {
    pub referrer: String,
    pub visitors: i64,
}

/// Mean value of one named web vital (CLS, INP, LCP, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalStat {
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceStat {
    pub device: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteStat {
    pub site_id: String,
    pub domain: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSeriesBucket {
    /// UTC calendar day, `YYYY-MM-DD`.
    pub date: String,
    pub pageviews: i64,
}

/// Device class derived from the reported screen width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    Mobile,
    Tablet,
    Desktop,
}

impl DeviceClass {
    /// Widths below this are phones.
    pub const TABLET_MIN_WIDTH: i32 = 768;
    /// Widths from this up are desktops.
    pub const DESKTOP_MIN_WIDTH: i32 = 1024;

    pub fn from_width(screen_width: i32) -> Self {
        if screen_width < Self::TABLET_MIN_WIDTH {
            Self::Mobile
        } else if screen_width < Self::DESKTOP_MIN_WIDTH {
            Self::Tablet
        } else {
            Self::Desktop
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mobile => "Mobile",
            Self::Tablet => "Tablet",
            Self::Desktop => "Desktop",
        }
    }
}

/// Persistence contract for tracked events.
///
/// Every read takes the tenancy `domain` (exact, case-sensitive) and a
/// [`TimeWindow`]. Implementations must be safe to share across tasks.
#[async_trait::async_trait]
pub trait EventRepository: Send + Sync + 'static {
    async fn insert(&self, event: &Event) -> RepositoryResult<()>;

    async fn get_stats(&self, domain: &str, window: &TimeWindow) -> RepositoryResult<StatsResult>;

    async fn get_top_pages(
        &self,
        domain: &str,
        window: &TimeWindow,
        limit: u32,
    ) -> RepositoryResult<Vec<PageStat>>;

    async fn get_top_referrers(
        &self,
        domain: &str,
        window: &TimeWindow,
        limit: u32,
    ) -> RepositoryResult<Vec<ReferrerStat>>;

    async fn get_vitals(&self, domain: &str, window: &TimeWindow)
        -> RepositoryResult<Vec<VitalStat>>;

    async fn get_devices(
        &self,
        domain: &str,
        window: &TimeWindow,
    ) -> RepositoryResult<Vec<DeviceStat>>;

    async fn get_pageviews_time_series(
        &self,
        domain: &str,
        window: &TimeWindow,
    ) -> RepositoryResult<Vec<TimeSeriesBucket>>;

    async fn get_sites(&self) -> RepositoryResult<Vec<SiteStat>>;

    /// Release the storage handle. Every later call fails with
    /// [`RepositoryError::Closed`](crate::error::RepositoryError::Closed).
    async fn close(&self) -> RepositoryResult<()>;
}
