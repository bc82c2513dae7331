use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use crate::analytics::DateRange;

/// String key/value cache with per-entry expiry, shaped after `GET` /
/// `SET key value EX ttl`.
#[async_trait]
pub trait AggregateCache: Send + Sync + 'static {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> Result<()>;
}

/// `analytics:daily:<site>:<start>:<end>` with ISO calendar dates.
pub fn daily_cache_key(site_id: &str, range: &DateRange) -> String {
    format!(
        "analytics:daily:{}:{}:{}",
        site_id,
        range.start.format("%Y-%m-%d"),
        range.end.format("%Y-%m-%d")
    )
}
