use anyhow::{Context, Result};

use sitepulse_core::event::RawMetric;

use crate::backend::{parse_timestamp, timestamp_param};
use crate::DuckDbBackend;

impl DuckDbBackend {
    /// Append one raw provider payload. Raw metrics are never updated.
    pub async fn insert_raw_metric(&self, raw: &RawMetric) -> Result<()> {
        let payload = serde_json::to_string(&raw.payload)?;
        let conn = self.conn.lock().await;
        conn.execute(
            r#"INSERT INTO rawmetrics (id, integration_id, provider, fetched_at, payload)
               VALUES (?1, ?2, ?3, CAST(?4 AS TIMESTAMP), ?5)"#,
            duckdb::params![
                raw.id,
                raw.integration_id,
                raw.provider,
                timestamp_param(&raw.fetched_at),
                payload,
            ],
        )?;
        tracing::debug!(provider = %raw.provider, id = %raw.id, "raw metric stored");
        Ok(())
    }

    /// Most recently fetched payload for `provider`, for replay.
    pub async fn latest_raw_metric(&self, provider: &str) -> Result<Option<RawMetric>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            r#"SELECT id, integration_id, provider, CAST(fetched_at AS VARCHAR), payload
               FROM rawmetrics
               WHERE provider = ?1
               ORDER BY fetched_at DESC
               LIMIT 1"#,
        )?;
        let mut rows = stmt.query_map(duckdb::params![provider], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let Some(row) = rows.next() else {
            return Ok(None);
        };
        let (id, integration_id, provider, fetched_at, payload) = row?;
        Ok(Some(RawMetric {
            id,
            integration_id,
            provider,
            fetched_at: parse_timestamp(&fetched_at)?,
            payload: serde_json::from_str(&payload).context("stored raw payload is not JSON")?,
        }))
    }
}
