use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{bad_request, internal_error};
use crate::model::{DataPoint, Extrema, Factor};
use crate::state::AppState;

#[derive(Debug, serde::Deserialize)]
pub(crate) struct HistoryQuery {
    factor: Factor,
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
    max_points: Option<usize>,
}

#[derive(Debug, serde::Deserialize)]
pub(crate) struct LatestQuery {
    factor: Factor,
}

/// The start is mandatory; the end defaults to now. A start in the future
/// or past the end is rejected.
fn resolve_interval(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Result<(DateTime<Utc>, DateTime<Utc>), (StatusCode, String)> {
    let start = start.ok_or_else(|| bad_request("No start time provided."))?;
    let end = end.unwrap_or_else(Utc::now);
    if start > Utc::now() || start > end {
        return Err(bad_request("Invalid start time provided."));
    }
    Ok((start, end))
}

pub(crate) async fn history_handler(
    State(state): State<AppState>,
    Path(site_id): Path<Uuid>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<DataPoint>>, (StatusCode, String)> {
    let (start, end) = resolve_interval(query.start_time, query.end_time)?;
    let history = state
        .environment
        .history(site_id, query.factor, start, end, query.max_points)
        .await
        .map_err(internal_error)?;
    Ok(Json(history))
}

pub(crate) async fn latest_handler(
    State(state): State<AppState>,
    Path(site_id): Path<Uuid>,
    Query(query): Query<LatestQuery>,
) -> Result<Json<Option<DataPoint>>, (StatusCode, String)> {
    let latest = state
        .environment
        .latest(site_id, query.factor)
        .await
        .map_err(internal_error)?;
    Ok(Json(latest))
}

pub(crate) async fn extrema_handler(
    State(state): State<AppState>,
    Path(site_id): Path<Uuid>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Extrema>, (StatusCode, String)> {
    let (start, end) = resolve_interval(query.start_time, query.end_time)?;
    let extrema = state
        .environment
        .extrema(site_id, query.factor, start, end)
        .await
        .map_err(internal_error)?;
    Ok(Json(extrema))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sites/{site_id}/environment", get(history_handler))
        .route("/sites/{site_id}/environment/latest", get(latest_handler))
        .route("/sites/{site_id}/environment/extrema", get(extrema_handler))
}
