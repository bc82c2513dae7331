use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info};

use sitepulse_core::{
    analytics::{AnalyticsStore, DateRange},
    cache::AggregateCache,
    config::{CacheMode, Config},
    event::Aggregate,
    read::get_daily_aggregates,
    report::ReportFetcher,
};

use crate::cache::MemoryCache;
use crate::error::AppError;

/// Shared application state injected into every Axum handler via
/// [`axum::extract::State`].
///
/// Every resource is constructed in `main.rs` (or a test) and handed in; there
/// is no process-global connection.
pub struct AppState {
    /// Aggregate/event/raw-metric storage. DuckDB in production.
    pub store: Arc<dyn AnalyticsStore>,

    /// Parsed configuration, loaded once at startup from environment variables.
    pub config: Arc<Config>,

    /// Read-through cache for daily aggregates. `None` when
    /// `SITEPULSE_CACHE=none`; reads then go straight to the store.
    pub cache: Option<Arc<MemoryCache>>,

    /// GA4 report source. `None` when no usable service-account key was
    /// configured; the sync route then answers 400.
    pub fetcher: Option<Arc<dyn ReportFetcher>>,

    /// One lease per site so two syncs for the same site never overlap.
    sync_leases: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl AppState {
    /// Construct a new `AppState` wrapping the given store and config.
    pub fn new(store: Arc<dyn AnalyticsStore>, config: Config) -> Self {
        let cache = match config.cache_mode {
            CacheMode::Memory => Some(Arc::new(MemoryCache::new())),
            CacheMode::None => None,
        };
        Self {
            store,
            config: Arc::new(config),
            cache,
            fetcher: None,
            sync_leases: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn ReportFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// The configured GA4 property, which is also the site id.
    pub fn property_id(&self) -> Result<String, AppError> {
        self.config
            .ga4_property_id
            .clone()
            .ok_or_else(|| AppError::Configuration("GA4_PROPERTY_ID not set".to_string()))
    }

    /// Try to take the sync lease for `site_id`.
    ///
    /// Returns `None` while another sync for the site holds it. The lease is
    /// released when the guard drops, whether the sync succeeded or not.
    pub async fn try_acquire_sync_lease(&self, site_id: &str) -> Option<OwnedMutexGuard<()>> {
        let lease = {
            let mut leases = self.sync_leases.lock().await;
            Arc::clone(leases.entry(site_id.to_string()).or_default())
        };
        let guard = lease.try_lock_owned().ok();
        if guard.is_none() {
            debug!(site_id, "sync lease busy");
        }
        guard
    }

    /// Daily aggregates through the read-through cache.
    pub async fn daily_aggregates(
        &self,
        site_id: &str,
        range: &DateRange,
    ) -> anyhow::Result<Vec<Aggregate>> {
        let cache = self
            .cache
            .as_deref()
            .map(|c| c as &dyn AggregateCache);
        get_daily_aggregates(
            self.store.as_ref(),
            cache,
            self.config.cache_ttl(),
            site_id,
            range,
        )
        .await
    }

    /// Background loop: drop expired cache entries once per TTL.
    ///
    /// Spawned as a `tokio::spawn` task in `main.rs`. Returns immediately when
    /// caching is disabled.
    pub async fn run_cache_purge_loop(self: Arc<Self>) {
        let Some(cache) = self.cache.clone() else {
            return;
        };
        let period = self.config.cache_ttl().max(std::time::Duration::from_secs(1));
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let purged = cache.purge_expired().await;
            if purged > 0 {
                info!(purged, "expired cache entries purged");
            }
        }
    }
}
