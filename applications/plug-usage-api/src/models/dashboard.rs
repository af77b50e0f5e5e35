use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceStatus {
    pub device_id: String,
    pub power_w: f64,
    pub voltage: Option<f64>,
    pub temperature_c: Option<f64>,
    pub is_on: bool,
    pub last_seen: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceEvent {
    pub id: i64,
    pub device_id: String,
    pub ts: DateTime<Utc>,
    /// `power_on` or `power_off`.
    pub event_type: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total_devices: usize,
    pub active_devices: usize,
    pub total_power_w: f64,
    pub total_energy_kwh: f64,
    pub recent_events: Vec<DeviceEvent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerPoint {
    pub device_id: String,
    pub ts: DateTime<Utc>,
    pub power_w: f64,
    pub energy_kwh: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorPoint {
    pub device_id: String,
    pub ts: DateTime<Utc>,
    pub temperature_c: f64,
    pub voltage: Option<f64>,
    pub current_a: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LimitParams {
    pub limit: Option<String>,
}

impl LimitParams {
    /// Parsed `limit`; range checks are left to the service.
    pub fn limit(&self) -> Result<Option<i64>> {
        match self.limit.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw.parse::<i64>().map(Some).map_err(|_| {
                AppError::MalformedInput(format!("limit must be an integer, got {raw:?}"))
            }),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceFilter {
    pub device_id: Option<String>,
}

/// Query string of the daily usage endpoint. Every field is required; a
/// missing one is reported as malformed input rather than a 422 from the
/// extractor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsageQueryParams {
    pub device_id: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}
