use axum::{
    extract::{Query, State},
    response::Json,
};

use super::AppState;
use crate::error::Result;
use crate::models::{
    DashboardSummary, DeviceEvent, DeviceFilter, DeviceStatus, LimitParams, PowerPoint, SensorPoint,
};

pub async fn list_devices(State(state): State<AppState>) -> Result<Json<Vec<DeviceStatus>>> {
    Ok(Json(state.telemetry.devices().await?))
}

pub async fn get_summary(State(state): State<AppState>) -> Result<Json<DashboardSummary>> {
    Ok(Json(state.telemetry.summary().await?))
}

pub async fn get_power(
    State(state): State<AppState>,
    Query(params): Query<DeviceFilter>,
) -> Result<Json<Vec<PowerPoint>>> {
    Ok(Json(state.telemetry.power_series(params.device_id).await?))
}

pub async fn get_sensors(
    State(state): State<AppState>,
    Query(params): Query<DeviceFilter>,
) -> Result<Json<Vec<SensorPoint>>> {
    Ok(Json(state.telemetry.sensor_series(params.device_id).await?))
}

pub async fn list_events(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> Result<Json<Vec<DeviceEvent>>> {
    Ok(Json(state.telemetry.events(params.limit()?).await?))
}
