//! Fetch → normalize → persist → aggregate, as one all-or-nothing run.

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::aggregate::aggregate_daily;
use crate::analytics::{AnalyticsStore, DateRange};
use crate::event::{RawMetric, PROVIDER_GA4};
use crate::normalize::normalize_payload;
use crate::report::ReportFetcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncStage {
    Idle,
    Fetching,
    Normalizing,
    PersistingRaw,
    PersistingEvents,
    Aggregating,
    Done,
    Failed,
}

impl fmt::Display for SyncStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SyncStage::Idle => "idle",
            SyncStage::Fetching => "fetching",
            SyncStage::Normalizing => "normalizing",
            SyncStage::PersistingRaw => "persisting-raw",
            SyncStage::PersistingEvents => "persisting-events",
            SyncStage::Aggregating => "aggregating",
            SyncStage::Done => "done",
            SyncStage::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SyncOutcome {
    /// Events written.
    pub inserted: usize,
    /// Aggregates upserted.
    pub aggregated: usize,
}

/// A run that stopped at `stage`. Work committed by earlier stages stays.
///
/// The pipeline does not log failures itself; whoever handles the error does.
#[derive(Debug, Error)]
#[error("sync failed while {stage}: {source}")]
pub struct SyncError {
    pub stage: SyncStage,
    #[source]
    pub source: anyhow::Error,
}

/// One sync invocation. Not retried; the first error ends it.
pub struct SyncPipeline<'a> {
    fetcher: &'a dyn ReportFetcher,
    store: &'a dyn AnalyticsStore,
    stage: SyncStage,
}

impl<'a> SyncPipeline<'a> {
    pub fn new(fetcher: &'a dyn ReportFetcher, store: &'a dyn AnalyticsStore) -> Self {
        Self {
            fetcher,
            store,
            stage: SyncStage::Idle,
        }
    }

    pub fn stage(&self) -> SyncStage {
        self.stage
    }

    fn advance(&mut self, site_id: &str, next: SyncStage) {
        debug!(site_id, from = %self.stage, to = %next, "sync stage");
        self.stage = next;
    }

    /// Pull `range` for `property_id` and store it under `site_id`.
    pub async fn run(
        &mut self,
        property_id: &str,
        site_id: &str,
        range: &DateRange,
    ) -> Result<SyncOutcome, SyncError> {
        match self.run_stages(property_id, site_id, range).await {
            Ok(outcome) => {
                self.advance(site_id, SyncStage::Done);
                info!(
                    site_id,
                    start = %range.start,
                    end = %range.end,
                    inserted = outcome.inserted,
                    aggregated = outcome.aggregated,
                    "analytics sync complete"
                );
                Ok(outcome)
            }
            Err(source) => {
                let stage = self.stage;
                self.advance(site_id, SyncStage::Failed);
                Err(SyncError { stage, source })
            }
        }
    }

    async fn run_stages(
        &mut self,
        property_id: &str,
        site_id: &str,
        range: &DateRange,
    ) -> anyhow::Result<SyncOutcome> {
        self.advance(site_id, SyncStage::Fetching);
        let payload = self.fetcher.run_report(property_id, range).await?;

        self.advance(site_id, SyncStage::Normalizing);
        let events = normalize_payload(site_id, &payload)?;

        self.advance(site_id, SyncStage::PersistingRaw);
        self.store
            .insert_raw_metric(&RawMetric::new(PROVIDER_GA4, payload))
            .await?;

        self.advance(site_id, SyncStage::PersistingEvents);
        let inserted = self.store.insert_events(&events).await?;

        self.advance(site_id, SyncStage::Aggregating);
        let aggregates = aggregate_daily(&events);
        let aggregated = self.store.upsert_aggregates(&aggregates).await?;

        Ok(SyncOutcome {
            inserted,
            aggregated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use tracing_test::traced_test;

    use crate::event::{Aggregate, Event};

    struct DownFetcher;

    #[async_trait]
    impl ReportFetcher for DownFetcher {
        async fn run_report(
            &self,
            _property_id: &str,
            _range: &DateRange,
        ) -> anyhow::Result<serde_json::Value> {
            Err(anyhow!("GA4 API returned 503"))
        }
    }

    struct UnusedStore;

    #[async_trait]
    impl AnalyticsStore for UnusedStore {
        async fn insert_raw_metric(&self, _raw: &RawMetric) -> anyhow::Result<()> {
            Ok(())
        }
        async fn insert_events(&self, events: &[Event]) -> anyhow::Result<usize> {
            Ok(events.len())
        }
        async fn upsert_aggregates(&self, aggregates: &[Aggregate]) -> anyhow::Result<usize> {
            Ok(aggregates.len())
        }
        async fn query_aggregates(
            &self,
            _site_id: &str,
            _range: &DateRange,
        ) -> anyhow::Result<Vec<Aggregate>> {
            Ok(Vec::new())
        }
        async fn ping(&self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    #[traced_test]
    async fn test_failed_run_is_returned_not_logged_as_error() {
        let range = DateRange::since_yesterday(
            chrono::NaiveDate::from_ymd_opt(2024, 1, 2).expect("date"),
        );
        let mut pipeline = SyncPipeline::new(&DownFetcher, &UnusedStore);

        let err = pipeline.run("p", "p", &range).await.expect_err("fetch fails");

        assert_eq!(err.stage, SyncStage::Fetching);
        assert_eq!(pipeline.stage(), SyncStage::Failed);
        assert!(err.to_string().contains("while fetching"));
        assert!(logs_contain("to=failed"));
        assert!(!logs_contain("ERROR"));
    }

    #[test]
    fn test_stage_names_are_kebab_case() {
        assert_eq!(SyncStage::PersistingRaw.to_string(), "persisting-raw");
        assert_eq!(SyncStage::PersistingEvents.to_string(), "persisting-events");
        assert_eq!(
            serde_json::to_value(SyncStage::Aggregating).expect("json"),
            "aggregating"
        );
    }
}
