//! Report-fetching abstraction and the GA4 `runReport` wire shapes.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::analytics::DateRange;

/// Dimensions requested from GA4, in the order rows are paired.
pub const REPORT_DIMENSIONS: [&str; 2] = ["date", "pagePath"];

/// Metrics requested from GA4, in the order rows are paired:
/// pageviews, sessions, users, bounce rate, average session duration.
pub const REPORT_METRICS: [&str; 5] = [
    "screenPageViews",
    "sessions",
    "totalUsers",
    "bounceRate",
    "averageSessionDuration",
];

pub const REPORT_ROW_LIMIT: i64 = 100_000;

/// Source of raw analytics reports.
///
/// Returns the payload untouched so it can be archived verbatim before
/// being interpreted.
#[async_trait]
pub trait ReportFetcher: Send + Sync + 'static {
    async fn run_report(&self, property_id: &str, range: &DateRange) -> Result<serde_json::Value>;
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReportRequest {
    pub date_ranges: Vec<ReportDateRange>,
    pub dimensions: Vec<NamedField>,
    pub metrics: Vec<NamedField>,
    pub limit: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDateRange {
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedField {
    pub name: String,
}

impl RunReportRequest {
    /// The page-level daily report the sync consumes.
    pub fn daily_pages(range: &DateRange) -> Self {
        let named = |name: &&str| NamedField {
            name: (*name).to_string(),
        };
        Self {
            date_ranges: vec![ReportDateRange {
                start_date: range.start.format("%Y-%m-%d").to_string(),
                end_date: range.end.format("%Y-%m-%d").to_string(),
            }],
            dimensions: REPORT_DIMENSIONS.iter().map(named).collect(),
            metrics: REPORT_METRICS.iter().map(named).collect(),
            limit: REPORT_ROW_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReportResponse {
    #[serde(default)]
    pub dimension_headers: Vec<NamedField>,
    #[serde(default)]
    pub metric_headers: Vec<NamedField>,
    #[serde(default)]
    pub rows: Vec<ReportRow>,
    #[serde(default)]
    pub row_count: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    #[serde(default)]
    pub dimension_values: Vec<ReportValue>,
    #[serde(default)]
    pub metric_values: Vec<ReportValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportValue {
    pub value: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_daily_pages_request_shape() {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 14).expect("date"),
            NaiveDate::from_ymd_opt(2024, 1, 15).expect("date"),
        )
        .expect("range");
        let body = serde_json::to_value(RunReportRequest::daily_pages(&range)).expect("json");

        assert_eq!(body["dateRanges"][0]["startDate"], "2024-01-14");
        assert_eq!(body["dateRanges"][0]["endDate"], "2024-01-15");
        assert_eq!(body["dimensions"][1]["name"], "pagePath");
        assert_eq!(body["metrics"].as_array().map(Vec::len), Some(5));
        assert_eq!(body["limit"], 100_000);
    }
}
