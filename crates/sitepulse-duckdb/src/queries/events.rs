use anyhow::Result;

use sitepulse_core::analytics::DateRange;
use sitepulse_core::event::{Event, EventMetrics};

use crate::backend::{parse_timestamp, timestamp_param};
use crate::DuckDbBackend;

impl DuckDbBackend {
    /// Insert a batch of normalized events in a single transaction.
    ///
    /// Returns immediately (no-op) if `events` is empty.
    pub async fn insert_events(&self, events: &[Event]) -> Result<usize> {
        if events.is_empty() {
            return Ok(0);
        }

        let mut conn = self.conn.lock().await;

        // One transaction for the whole batch: one fsync instead of N.
        let tx = conn.transaction()?;

        for event in events {
            tx.execute(
                r#"INSERT INTO events (
                    id, site_id, ts, page_path, event_name,
                    pageviews, sessions, users, bounce_rate, avg_session_duration
                ) VALUES (
                    ?1, ?2, CAST(?3 AS TIMESTAMP), ?4, ?5,
                    ?6, ?7, ?8, ?9, ?10
                )"#,
                duckdb::params![
                    event.id,
                    event.site_id,
                    timestamp_param(&event.timestamp),
                    event.page_path,
                    event.event_name,
                    event.metrics.pageviews,
                    event.metrics.sessions,
                    event.metrics.users,
                    event.metrics.bounce_rate,
                    event.metrics.avg_session_duration,
                ],
            )?;
        }

        tx.commit()?;
        tracing::info!("Inserted {} events into DuckDB", events.len());
        Ok(events.len())
    }

    /// Events for `site_id` whose day falls inside `range`, oldest first.
    pub async fn list_events(&self, site_id: &str, range: &DateRange) -> Result<Vec<Event>> {
        let start = range.start.format("%Y-%m-%d").to_string();
        let end_next = (range.end + chrono::Duration::days(1))
            .format("%Y-%m-%d")
            .to_string();

        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            r#"SELECT id, site_id, CAST(ts AS VARCHAR), page_path, event_name,
                      pageviews, sessions, users, bounce_rate, avg_session_duration
               FROM events
               WHERE site_id = ?1
                 AND ts >= CAST(?2 AS TIMESTAMP)
                 AND ts < CAST(?3 AS TIMESTAMP)
               ORDER BY ts ASC, page_path ASC"#,
        )?;
        let rows = stmt.query_map(duckdb::params![site_id, start, end_next], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                EventMetrics {
                    pageviews: row.get(5)?,
                    sessions: row.get(6)?,
                    users: row.get(7)?,
                    bounce_rate: row.get(8)?,
                    avg_session_duration: row.get(9)?,
                },
            ))
        })?;

        let mut events = Vec::new();
        for row in rows {
            let (id, site_id, ts, page_path, event_name, metrics) = row?;
            events.push(Event {
                id,
                site_id,
                timestamp: parse_timestamp(&ts)?,
                page_path,
                event_name,
                metrics,
            });
        }
        Ok(events)
    }
}
