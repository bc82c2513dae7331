//! Daily rollup of normalized events.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::event::{Aggregate, Event};

#[derive(Default)]
struct DayBucket {
    events: u32,
    pageviews: i64,
    sessions: i64,
    users: i64,
    bounce_rate_sum: f64,
    avg_session_duration_sum: f64,
}

/// Group `events` by site and calendar day and roll each group up.
///
/// Counts (`pageviews`, `sessions`, `users`) are summed, saturating at
/// `i64::MAX`; `bounce_rate` and `avg_session_duration` are the arithmetic
/// mean over the day's events.
/// Output is ordered by `(site_id, date_hour)`; the same input always yields
/// the same aggregates.
///
/// Each aggregate describes only this batch. Upserting it replaces whatever
/// an earlier sync stored for that day.
pub fn aggregate_daily(events: &[Event]) -> Vec<Aggregate> {
    let mut buckets: BTreeMap<(&str, NaiveDate), DayBucket> = BTreeMap::new();

    for event in events {
        let bucket = buckets
            .entry((event.site_id.as_str(), event.day()))
            .or_default();
        bucket.events = bucket.events.saturating_add(1);
        bucket.pageviews = bucket.pageviews.saturating_add(event.metrics.pageviews);
        bucket.sessions = bucket.sessions.saturating_add(event.metrics.sessions);
        bucket.users = bucket.users.saturating_add(event.metrics.users);
        bucket.bounce_rate_sum += event.metrics.bounce_rate;
        bucket.avg_session_duration_sum += event.metrics.avg_session_duration;
    }

    buckets
        .into_iter()
        .map(|((site_id, day), b)| {
            let n = f64::from(b.events);
            Aggregate {
                site_id: site_id.to_string(),
                date_hour: day,
                pageviews: b.pageviews,
                sessions: b.sessions,
                users: b.users,
                bounce_rate: b.bounce_rate_sum / n,
                avg_session_duration: b.avg_session_duration_sum / n,
            }
        })
        .collect()
}
