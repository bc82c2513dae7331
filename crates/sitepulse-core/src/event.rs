use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Provider tag written on raw metrics fetched from Google Analytics 4.
pub const PROVIDER_GA4: &str = "ga4";

/// Event name given to every normalized GA4 page row.
pub const PAGE_VIEW_EVENT: &str = "page_view";

/// Unprocessed report payload, kept for audit and replay.
///
/// Append-only: the pipeline never updates or deletes these rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMetric {
    pub id: String,
    /// Absent for syncs driven by the env-configured property.
    pub integration_id: Option<String>,
    pub provider: String,
    pub fetched_at: DateTime<Utc>,
    pub payload: serde_json::Value,
}

impl RawMetric {
    pub fn new(provider: &str, payload: serde_json::Value) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            integration_id: None,
            provider: provider.to_string(),
            fetched_at: Utc::now(),
            payload,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMetrics {
    pub pageviews: i64,
    pub sessions: i64,
    pub users: i64,
    pub bounce_rate: f64,
    pub avg_session_duration: f64,
}

/// One page's metrics for one day, as produced by the normalizer.
///
/// `timestamp` is always UTC midnight of the report day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub site_id: String,
    pub timestamp: DateTime<Utc>,
    pub page_path: String,
    pub event_name: String,
    pub metrics: EventMetrics,
}

impl Event {
    pub fn day(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }
}

/// Daily rollup for a site. Unique per `(site_id, date_hour)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregate {
    pub site_id: String,
    pub date_hour: NaiveDate,
    pub pageviews: i64,
    pub sessions: i64,
    pub users: i64,
    pub bounce_rate: f64,
    pub avg_session_duration: f64,
}
