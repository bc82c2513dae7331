//! Read-through path for daily aggregates.

use std::time::Duration;

use anyhow::Result;
use tracing::{debug, warn};

use crate::analytics::{AnalyticsStore, DateRange};
use crate::cache::{daily_cache_key, AggregateCache};
use crate::event::Aggregate;

/// Daily aggregates for `site_id` over `range`, served from `cache` when
/// possible.
///
/// On a miss the store is queried and the result cached for `ttl`. Without a
/// cache every call reads the store. Cache errors and undecodable entries are
/// logged and treated as misses; only store errors are returned.
pub async fn get_daily_aggregates(
    store: &dyn AnalyticsStore,
    cache: Option<&dyn AggregateCache>,
    ttl: Duration,
    site_id: &str,
    range: &DateRange,
) -> Result<Vec<Aggregate>> {
    let Some(cache) = cache else {
        return store.query_aggregates(site_id, range).await;
    };

    let key = daily_cache_key(site_id, range);
    match cache.get(&key).await {
        Ok(Some(cached)) => match serde_json::from_str::<Vec<Aggregate>>(&cached) {
            Ok(aggregates) => {
                debug!(key = %key, "daily aggregates cache hit");
                return Ok(aggregates);
            }
            Err(e) => warn!(key = %key, error = %e, "discarding undecodable cache entry"),
        },
        Ok(None) => debug!(key = %key, "daily aggregates cache miss"),
        Err(e) => warn!(key = %key, error = %e, "cache read failed, reading store"),
    }

    let aggregates = store.query_aggregates(site_id, range).await?;

    match serde_json::to_string(&aggregates) {
        Ok(serialized) => {
            if let Err(e) = cache.set_ex(&key, serialized, ttl).await {
                warn!(key = %key, error = %e, "cache write failed");
            }
        }
        Err(e) => warn!(key = %key, error = %e, "could not serialize aggregates for cache"),
    }

    Ok(aggregates)
}
