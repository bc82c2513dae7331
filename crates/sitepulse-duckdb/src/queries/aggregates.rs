use anyhow::{Context, Result};
use chrono::NaiveDate;

use sitepulse_core::analytics::DateRange;
use sitepulse_core::event::Aggregate;

use crate::DuckDbBackend;

impl DuckDbBackend {
    /// Insert-or-overwrite one row per `(site_id, date_hour)`.
    ///
    /// All five metric columns are replaced on conflict; nothing is
    /// accumulated. The batch runs in one transaction.
    pub async fn upsert_aggregates(&self, aggregates: &[Aggregate]) -> Result<usize> {
        if aggregates.is_empty() {
            return Ok(0);
        }

        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;

        for a in aggregates {
            tx.execute(
                r#"INSERT INTO aggregates (
                    site_id, date_hour, pageviews, sessions, users,
                    bounce_rate, avg_session_duration, updated_at
                ) VALUES (?1, CAST(?2 AS DATE), ?3, ?4, ?5, ?6, ?7, now())
                ON CONFLICT (site_id, date_hour) DO UPDATE SET
                    pageviews = EXCLUDED.pageviews,
                    sessions = EXCLUDED.sessions,
                    users = EXCLUDED.users,
                    bounce_rate = EXCLUDED.bounce_rate,
                    avg_session_duration = EXCLUDED.avg_session_duration,
                    updated_at = now()"#,
                duckdb::params![
                    a.site_id,
                    a.date_hour.format("%Y-%m-%d").to_string(),
                    a.pageviews,
                    a.sessions,
                    a.users,
                    a.bounce_rate,
                    a.avg_session_duration,
                ],
            )?;
        }

        tx.commit()?;
        tracing::info!("Upserted {} daily aggregates", aggregates.len());
        Ok(aggregates.len())
    }

    /// Aggregates for `site_id` with `date_hour` in `range` (inclusive), ascending.
    pub async fn query_aggregates(
        &self,
        site_id: &str,
        range: &DateRange,
    ) -> Result<Vec<Aggregate>> {
        let start = range.start.format("%Y-%m-%d").to_string();
        let end = range.end.format("%Y-%m-%d").to_string();

        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            r#"SELECT site_id, CAST(date_hour AS VARCHAR), pageviews, sessions, users,
                      bounce_rate, avg_session_duration
               FROM aggregates
               WHERE site_id = ?1
                 AND date_hour >= CAST(?2 AS DATE)
                 AND date_hour <= CAST(?3 AS DATE)
               ORDER BY date_hour ASC"#,
        )?;
        let rows = stmt.query_map(duckdb::params![site_id, start, end], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, f64>(5)?,
                row.get::<_, f64>(6)?,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (site_id, day, pageviews, sessions, users, bounce_rate, avg_session_duration) =
                row?;
            out.push(Aggregate {
                site_id,
                date_hour: NaiveDate::parse_from_str(&day, "%Y-%m-%d")
                    .with_context(|| format!("invalid stored date {day:?}"))?,
                pageviews,
                sessions,
                users,
                bounce_rate,
                avg_session_duration,
            });
        }
        Ok(out)
    }
}
