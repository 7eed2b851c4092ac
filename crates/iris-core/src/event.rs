use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::sanitize::truncate_strings;

/// Reserved event name for page views.
pub const PAGEVIEW: &str = "$pageview";

/// Reserved event name for performance vitals. Properties carry `$name` and `$val`.
pub const WEB_VITAL: &str = "$web_vital";

/// The beacon the tracking script sends to POST /api/event.
///
/// Field names are the compact wire names used by the browser snippet.
/// Any `id` or `ts` the client includes is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectPayload {
    #[serde(rename = "n")]
    pub event_name: String,
    #[serde(rename = "u", default)]
    pub url: String,
    #[serde(rename = "d", default)]
    pub domain: String,
    /// `null`, absent and `""` all mean "no referrer".
    #[serde(rename = "r", default)]
    pub referrer: Option<String>,
    #[serde(rename = "w", default)]
    pub screen_width: i32,
    #[serde(rename = "s", default)]
    pub site_id: String,
    #[serde(rename = "sid", default)]
    pub session_id: String,
    #[serde(rename = "vid", default)]
    pub visitor_id: String,
    #[serde(rename = "p", default)]
    pub properties: Option<Map<String, Value>>,
}

impl CollectPayload {
    /// Turn a beacon into a storable event.
    ///
    /// Assigns a fresh UUID v4 and the current UTC time (to the microsecond,
    /// the precision it is stored with), and truncates every string leaf of
    /// `properties` to `max_property_len` characters.
    pub fn into_event(self, max_property_len: usize) -> Event {
        let properties = self.properties.map(|props| {
            let mut value = Value::Object(props);
            truncate_strings(&mut value, max_property_len);
            match value {
                Value::Object(map) => map,
                _ => Map::new(),
            }
        });

        Event {
            id: uuid::Uuid::new_v4().to_string(),
            event_name: self.event_name,
            url: self.url,
            domain: self.domain,
            referrer: self.referrer.unwrap_or_default(),
            screen_width: self.screen_width,
            site_id: self.site_id,
            session_id: self.session_id,
            visitor_id: self.visitor_id,
            properties,
            timestamp: Utc::now().trunc_subsecs(6),
        }
    }
}

/// The stored version of an event; mirrors the `events` table columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub event_name: String,
    pub url: String,
    pub domain: String,
    /// Empty string when the visit had no referrer.
    pub referrer: String,
    pub screen_width: i32,
    pub site_id: String,
    pub session_id: String,
    pub visitor_id: String,
    /// Serialized to a JSON string for DuckDB storage.
    pub properties: Option<Map<String, Value>>,
    pub timestamp: DateTime<Utc>,
}

impl Event {
    pub fn is_pageview(&self) -> bool {
        self.event_name == PAGEVIEW
    }
}
