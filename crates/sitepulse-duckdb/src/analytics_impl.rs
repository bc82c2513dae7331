use async_trait::async_trait;

use sitepulse_core::analytics::{AnalyticsStore, DateRange};
use sitepulse_core::event::{Aggregate, Event, RawMetric};

use crate::DuckDbBackend;

#[async_trait]
impl AnalyticsStore for DuckDbBackend {
    async fn insert_raw_metric(&self, raw: &RawMetric) -> anyhow::Result<()> {
        DuckDbBackend::insert_raw_metric(self, raw).await
    }

    async fn insert_events(&self, events: &[Event]) -> anyhow::Result<usize> {
        DuckDbBackend::insert_events(self, events).await
    }

    async fn upsert_aggregates(&self, aggregates: &[Aggregate]) -> anyhow::Result<usize> {
        DuckDbBackend::upsert_aggregates(self, aggregates).await
    }

    async fn query_aggregates(
        &self,
        site_id: &str,
        range: &DateRange,
    ) -> anyhow::Result<Vec<Aggregate>> {
        DuckDbBackend::query_aggregates(self, site_id, range).await
    }

    async fn ping(&self) -> anyhow::Result<()> {
        DuckDbBackend::ping(self).await
    }
}
