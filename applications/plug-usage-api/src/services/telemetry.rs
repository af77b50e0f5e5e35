use crate::error::{AppError, Result};
use crate::models::dashboard::{DashboardSummary, DeviceEvent, DeviceStatus, PowerPoint, SensorPoint};
use crate::models::sample::{IngestReading, NewSample, Sample};
use crate::repositories::ReadingStore;
use crate::services::clock::Clock;
use crate::services::threshold::PowerThreshold;
use crate::services::usage::validate_device_id;
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

const DEFAULT_LATEST_LIMIT: i64 = 20;
const DEFAULT_EVENTS_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 1000;
const SUMMARY_RECENT_EVENTS: usize = 10;

/// Ingestion and the dashboard's read side.
#[derive(Clone)]
pub struct TelemetryService {
    store: Arc<dyn ReadingStore>,
    threshold: PowerThreshold,
    clock: Arc<dyn Clock>,
}

impl TelemetryService {
    pub fn new(store: Arc<dyn ReadingStore>, threshold: PowerThreshold, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            threshold,
            clock,
        }
    }

    pub async fn ingest(&self, reading: IngestReading) -> Result<Sample> {
        let device_id = validate_device_id(&reading.device_id)?.to_string();
        if !reading.apower.is_finite() {
            return Err(AppError::MalformedInput("apower must be a finite number".to_string()));
        }

        let sample = NewSample {
            device_id,
            ts: reading.ts.unwrap_or_else(|| self.clock.now()),
            power_w: reading.apower,
            voltage: reading.voltage,
            current_a: reading.current,
            energy_wh: reading.aenergy,
            temperature_c: reading.temperature,
        };

        let stored = self.store.append(sample).await?;
        debug!(
            device_id = %stored.device_id,
            id = stored.id,
            power_w = stored.power_w,
            "reading stored"
        );
        Ok(stored)
    }

    pub async fn latest(&self, limit: Option<i64>) -> Result<Vec<Sample>> {
        let limit = validate_limit(limit, DEFAULT_LATEST_LIMIT)?;
        self.store.latest(limit).await
    }

    /// Readings from the last 24 hours, oldest first.
    pub async fn window_24h(&self, device_id: Option<String>) -> Result<Vec<Sample>> {
        let device_id = device_id.filter(|d| !d.trim().is_empty());
        self.store.since(self.window_start(), device_id).await
    }

    pub async fn devices(&self) -> Result<Vec<DeviceStatus>> {
        let readings = self.window_24h(None).await?;
        Ok(latest_per_device(&readings)
            .into_values()
            .map(|s| DeviceStatus {
                device_id: s.device_id.clone(),
                power_w: s.power_w,
                voltage: s.voltage,
                temperature_c: s.temperature_c,
                is_on: self.threshold.is_on(s.power_w),
                last_seen: s.ts,
            })
            .collect())
    }

    pub async fn summary(&self) -> Result<DashboardSummary> {
        let readings = self.window_24h(None).await?;
        if readings.is_empty() {
            return Ok(DashboardSummary::default());
        }

        let latest = latest_per_device(&readings);
        let active_devices = latest
            .values()
            .filter(|s| self.threshold.is_on(s.power_w))
            .count();
        let total_power_w: f64 = latest.values().map(|s| s.power_w).sum();
        let total_energy_wh: f64 = latest.values().filter_map(|s| s.energy_wh).sum();

        let recent_events = readings
            .iter()
            .rev()
            .take(SUMMARY_RECENT_EVENTS)
            .map(|s| self.to_event(s, format!("Power: {:.2}W", s.power_w)))
            .collect();

        Ok(DashboardSummary {
            total_devices: latest.len(),
            active_devices,
            total_power_w,
            total_energy_kwh: total_energy_wh / 1000.0,
            recent_events,
        })
    }

    pub async fn power_series(&self, device_id: Option<String>) -> Result<Vec<PowerPoint>> {
        let readings = self.window_24h(device_id).await?;
        Ok(readings
            .into_iter()
            .map(|s| PowerPoint {
                energy_kwh: s.energy_wh.map(|wh| wh / 1000.0),
                device_id: s.device_id,
                ts: s.ts,
                power_w: s.power_w,
            })
            .collect())
    }

    pub async fn sensor_series(&self, device_id: Option<String>) -> Result<Vec<SensorPoint>> {
        let readings = self.window_24h(device_id).await?;
        Ok(readings
            .into_iter()
            .filter_map(|s| {
                s.temperature_c.map(|temperature_c| SensorPoint {
                    device_id: s.device_id,
                    ts: s.ts,
                    temperature_c,
                    voltage: s.voltage,
                    current_a: s.current_a,
                })
            })
            .collect())
    }

    /// Newest readings rendered as on/off events.
    pub async fn events(&self, limit: Option<i64>) -> Result<Vec<DeviceEvent>> {
        let limit = validate_limit(limit, DEFAULT_EVENTS_LIMIT)?;
        let readings = self.store.latest(limit).await?;
        Ok(readings
            .iter()
            .map(|s| {
                let temperature = s
                    .temperature_c
                    .map(|t| format!("{:.1}°C", t))
                    .unwrap_or_else(|| "n/a".to_string());
                self.to_event(s, format!("Power: {:.2}W, Temp: {}", s.power_w, temperature))
            })
            .collect())
    }

    fn window_start(&self) -> DateTime<Utc> {
        self.clock.now() - Duration::hours(24)
    }

    fn to_event(&self, sample: &Sample, description: String) -> DeviceEvent {
        let event_type = if self.threshold.is_on(sample.power_w) {
            "power_on"
        } else {
            "power_off"
        };
        DeviceEvent {
            id: sample.id,
            device_id: sample.device_id.clone(),
            ts: sample.ts,
            event_type: event_type.to_string(),
            description,
        }
    }
}

fn validate_limit(limit: Option<i64>, default: i64) -> Result<i64> {
    match limit {
        None => Ok(default),
        Some(l) if (1..=MAX_LIMIT).contains(&l) => Ok(l),
        Some(_) => Err(AppError::MalformedInput(format!(
            "limit must be between 1 and {}",
            MAX_LIMIT
        ))),
    }
}

/// Last reading of each device, keyed (and so sorted) by device id.
/// `readings` must be ascending by `(ts, id)`.
fn latest_per_device(readings: &[Sample]) -> BTreeMap<&str, &Sample> {
    let mut latest = BTreeMap::new();
    for sample in readings {
        latest.insert(sample.device_id.as_str(), sample);
    }
    latest
}
