pub mod dashboard;
pub mod health;
pub mod readings;
pub mod usage;

use crate::services::{TelemetryService, UsageService};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub usage: Arc<UsageService>,
    pub telemetry: Arc<TelemetryService>,
}

impl AppState {
    pub fn new(usage: UsageService, telemetry: TelemetryService) -> Self {
        Self {
            usage: Arc::new(usage),
            telemetry: Arc::new(telemetry),
        }
    }
}
