use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PowerState {
    On,
    Off,
}

impl PowerState {
    pub fn is_on(self) -> bool {
        matches!(self, PowerState::On)
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PowerState::On => write!(f, "ON"),
            PowerState::Off => write!(f, "OFF"),
        }
    }
}

/// Power level a plug must exceed to count as ON.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerThreshold(f64);

impl PowerThreshold {
    pub const DEFAULT_WATTS: f64 = 2.0;

    pub fn new(watts: f64) -> Result<Self> {
        if !watts.is_finite() || watts < 0.0 {
            return Err(AppError::Configuration(format!(
                "power threshold must be a non-negative number of watts, got {}",
                watts
            )));
        }
        Ok(Self(watts))
    }

    pub fn watts(&self) -> f64 {
        self.0
    }

    /// Strictly above the threshold is ON; exactly at it is still OFF.
    pub fn is_on(&self, power_w: f64) -> bool {
        power_w > self.0
    }

    pub fn classify(&self, power_w: f64) -> PowerState {
        if self.is_on(power_w) {
            PowerState::On
        } else {
            PowerState::Off
        }
    }
}

impl Default for PowerThreshold {
    fn default() -> Self {
        Self(Self::DEFAULT_WATTS)
    }
}
