use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One stored reading from a plug. Never mutated once appended.
///
/// `id` is the store's insertion sequence; readings sharing a `ts` are
/// ordered by it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Sample {
    pub id: i64,
    pub device_id: String,
    pub ts: DateTime<Utc>,
    pub power_w: f64,
    pub voltage: Option<f64>,
    pub current_a: Option<f64>,
    pub energy_wh: Option<f64>,
    pub temperature_c: Option<f64>,
}

/// A reading that has not been appended yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSample {
    pub device_id: String,
    pub ts: DateTime<Utc>,
    pub power_w: f64,
    pub voltage: Option<f64>,
    pub current_a: Option<f64>,
    pub energy_wh: Option<f64>,
    pub temperature_c: Option<f64>,
}

impl NewSample {
    pub fn into_sample(self, id: i64) -> Sample {
        Sample {
            id,
            device_id: self.device_id,
            ts: self.ts,
            power_w: self.power_w,
            voltage: self.voltage,
            current_a: self.current_a,
            energy_wh: self.energy_wh,
            temperature_c: self.temperature_c,
        }
    }
}

/// Payload pushed by the plugs. Field names follow the device firmware,
/// with the legacy receiver's names accepted as aliases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReading {
    #[serde(alias = "IdDispositivo", alias = "idDispositivo")]
    pub device_id: String,
    pub apower: f64,
    #[serde(default)]
    pub voltage: Option<f64>,
    #[serde(default, alias = "corriente")]
    pub current: Option<f64>,
    #[serde(default)]
    pub aenergy: Option<f64>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default, alias = "Fecha", alias = "fecha")]
    pub ts: Option<DateTime<Utc>>,
}
