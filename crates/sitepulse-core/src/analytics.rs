//! Analytics storage abstraction.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::event::{Aggregate, Event, RawMetric};

/// Inclusive calendar-day range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(anyhow!("end date must be on or after start date"));
        }
        Ok(Self { start, end })
    }

    /// The `days`-day window ending on (and including) `end`.
    pub fn trailing_days(end: NaiveDate, days: i64) -> Self {
        let span = days.max(1) - 1;
        Self {
            start: end - Duration::days(span),
            end,
        }
    }

    /// Yesterday through `today`, the window a sync pulls.
    pub fn since_yesterday(today: NaiveDate) -> Self {
        Self::trailing_days(today, 2)
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }
}

/// Storage interface for the sync pipeline and the aggregate read path.
///
/// The self-hosted binary uses the DuckDB implementation; tests wrap or
/// replace it to observe calls.
#[async_trait]
pub trait AnalyticsStore: Send + Sync + 'static {
    /// Append a raw report payload to the audit table.
    async fn insert_raw_metric(&self, raw: &RawMetric) -> Result<()>;

    /// Insert normalized events. Returns the number of rows written.
    async fn insert_events(&self, events: &[Event]) -> Result<usize>;

    /// Insert-or-overwrite one aggregate per `(site_id, date_hour)`.
    /// Returns the number of upserts applied.
    async fn upsert_aggregates(&self, aggregates: &[Aggregate]) -> Result<usize>;

    /// All aggregates for `site_id` with `date_hour` inside `range`, ascending.
    async fn query_aggregates(&self, site_id: &str, range: &DateRange) -> Result<Vec<Aggregate>>;

    async fn ping(&self) -> Result<()>;
}
