use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::Json,
};

use super::AppState;
use crate::error::Result;
use crate::models::{DeviceFilter, IngestReading, LimitParams, Sample};

pub async fn ingest(
    State(state): State<AppState>,
    payload: std::result::Result<Json<IngestReading>, JsonRejection>,
) -> Result<(StatusCode, Json<Sample>)> {
    let Json(reading) = payload?;
    let stored = state.telemetry.ingest(reading).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

pub async fn get_latest(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> Result<Json<Vec<Sample>>> {
    let readings = state.telemetry.latest(params.limit()?).await?;
    Ok(Json(readings))
}

pub async fn get_last_24h(
    State(state): State<AppState>,
    Query(params): Query<DeviceFilter>,
) -> Result<Json<Vec<Sample>>> {
    let readings = state.telemetry.window_24h(params.device_id).await?;
    Ok(Json(readings))
}
