//! Raw GA4 report → [`Event`] records.

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::CoreError;
use crate::event::{Event, EventMetrics, PAGE_VIEW_EVENT};
use crate::report::{
    NamedField, ReportRow, ReportValue, RunReportResponse, REPORT_DIMENSIONS, REPORT_METRICS,
};

/// Parse a GA4 `date` dimension (`YYYYMMDD`) into UTC midnight.
pub fn parse_report_date(raw: &str) -> Result<DateTime<Utc>, CoreError> {
    if raw.len() != 8 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CoreError::InvalidDate(raw.to_string()));
    }
    NaiveDate::parse_from_str(raw, "%Y%m%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| CoreError::InvalidDate(raw.to_string()))
}

fn metric_f64(value: Option<&ReportValue>) -> f64 {
    value
        .and_then(|v| v.value.as_deref())
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|n| n.is_finite())
        .unwrap_or(0.0)
}

fn metric_i64(value: Option<&ReportValue>) -> i64 {
    metric_f64(value).round() as i64
}

fn check_headers(kind: &str, actual: &[NamedField], expected: &[&str]) -> Result<(), CoreError> {
    let matches = actual.len() == expected.len()
        && actual.iter().zip(expected).all(|(a, e)| a.name == *e);
    if matches {
        return Ok(());
    }
    let got: Vec<&str> = actual.iter().map(|h| h.name.as_str()).collect();
    Err(CoreError::ReportSchema(format!(
        "{kind} headers {got:?} do not match requested {expected:?}"
    )))
}

fn normalize_row(site_id: &str, index: usize, row: &ReportRow) -> Result<Event, CoreError> {
    if row.dimension_values.len() != REPORT_DIMENSIONS.len()
        || row.metric_values.len() != REPORT_METRICS.len()
    {
        return Err(CoreError::ReportSchema(format!(
            "row {index} has {} dimension and {} metric values, expected {} and {}",
            row.dimension_values.len(),
            row.metric_values.len(),
            REPORT_DIMENSIONS.len(),
            REPORT_METRICS.len(),
        )));
    }

    let raw_date = row.dimension_values[0].value.as_deref().unwrap_or_default();
    let page_path = row.dimension_values[1].value.clone().unwrap_or_default();
    let m = &row.metric_values;

    Ok(Event {
        id: uuid::Uuid::new_v4().to_string(),
        site_id: site_id.to_string(),
        timestamp: parse_report_date(raw_date)?,
        page_path,
        event_name: PAGE_VIEW_EVENT.to_string(),
        metrics: EventMetrics {
            pageviews: metric_i64(m.first()),
            sessions: metric_i64(m.get(1)),
            users: metric_i64(m.get(2)),
            bounce_rate: metric_f64(m.get(3)),
            avg_session_duration: metric_f64(m.get(4)),
        },
    })
}

/// Map every report row to an [`Event`] for `site_id`.
///
/// Values are paired by position, so the report's headers must list exactly
/// the requested dimensions and metrics in the requested order, and every row
/// must be complete. Unparseable metric values count as 0; an unparseable
/// date fails the whole batch.
pub fn normalize_report(
    site_id: &str,
    report: &RunReportResponse,
) -> Result<Vec<Event>, CoreError> {
    if report.rows.is_empty() {
        return Ok(Vec::new());
    }
    check_headers("dimension", &report.dimension_headers, &REPORT_DIMENSIONS)?;
    check_headers("metric", &report.metric_headers, &REPORT_METRICS)?;

    report
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| normalize_row(site_id, i, row))
        .collect()
}

/// Decode a raw payload and normalize it.
pub fn normalize_payload(
    site_id: &str,
    payload: &serde_json::Value,
) -> Result<Vec<Event>, CoreError> {
    let report: RunReportResponse = serde_json::from_value(payload.clone())?;
    normalize_report(site_id, &report)
}
