use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;

use sitepulse_core::{analytics::DateRange, sync::SyncPipeline};

use crate::{error::AppError, state::AppState};

/// Days covered by `GET /api/analytics/daily` when no range is given.
pub const DAILY_WINDOW_DAYS: i64 = 7;

/// `POST /api/analytics/sync` - Pull yesterday and today from GA4 and
/// refresh the daily aggregates.
///
/// Configuration is checked before anything is fetched or written. A second
/// sync for the same site while one is running is turned away with 409.
#[tracing::instrument(skip(state))]
pub async fn sync(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let property_id = state.property_id()?;
    let fetcher = state.fetcher.clone().ok_or_else(|| {
        AppError::Configuration("GA4 service account credentials not configured".to_string())
    })?;

    let Some(_lease) = state.try_acquire_sync_lease(&property_id).await else {
        return Err(AppError::SyncInProgress(property_id));
    };

    let range = DateRange::since_yesterday(Utc::now().date_naive());
    let outcome = SyncPipeline::new(fetcher.as_ref(), state.store.as_ref())
        .run(&property_id, &property_id, &range)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    Ok(Json(json!({
        "ok": true,
        "inserted": outcome.inserted,
        "aggregated": outcome.aggregated
    })))
}

#[derive(Debug, Deserialize)]
pub struct DailyQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

fn parse_day(field: &str, raw: Option<&str>) -> Result<Option<NaiveDate>, AppError> {
    raw.map(|s| {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|_| AppError::BadRequest(format!("{field} must be YYYY-MM-DD")))
    })
    .transpose()
}

/// `GET /api/analytics/daily` - Daily aggregates, trailing seven days by
/// default. Served through the read-through cache.
#[tracing::instrument(skip(state))]
pub async fn daily(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DailyQuery>,
) -> Result<impl IntoResponse, AppError> {
    let site_id = state.property_id()?;

    let default = DateRange::trailing_days(Utc::now().date_naive(), DAILY_WINDOW_DAYS);
    let start = parse_day("start_date", query.start_date.as_deref())?.unwrap_or(default.start);
    let end = parse_day("end_date", query.end_date.as_deref())?.unwrap_or(default.end);
    let range = DateRange::new(start, end).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let data = state.daily_aggregates(&site_id, &range).await?;
    Ok(Json(json!({ "data": data })))
}
