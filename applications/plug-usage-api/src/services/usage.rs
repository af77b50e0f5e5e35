use crate::error::{AppError, Result};
use crate::models::usage::UsageReport;
use crate::repositories::ReadingStore;
use crate::services::clock::Clock;
use crate::services::reconstructor::UsageReconstructor;
use chrono::NaiveDate;
use std::sync::Arc;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Clone)]
pub struct UsageService {
    store: Arc<dyn ReadingStore>,
    reconstructor: UsageReconstructor,
    clock: Arc<dyn Clock>,
}

impl UsageService {
    pub fn new(
        store: Arc<dyn ReadingStore>,
        reconstructor: UsageReconstructor,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            reconstructor,
            clock,
        }
    }

    /// ON/OFF history of `device_id` over local days `start..=end`.
    ///
    /// Input is validated before the store is touched. Store failures are
    /// returned as-is; there is no partial report.
    pub async fn daily_usage(&self, device_id: &str, start: &str, end: &str) -> Result<UsageReport> {
        let device_id = validate_device_id(device_id)?;
        let start_date = parse_local_date("start_date", start)?;
        let end_date = parse_local_date("end_date", end)?;
        let window = self.reconstructor.zone().day_window(start_date, end_date)?;

        let samples = self
            .store
            .query_range(device_id, window.start_utc, window.end_utc)
            .await?;
        let last_before = self
            .store
            .query_last_before(device_id, window.start_utc)
            .await?;

        Ok(self.reconstructor.reconstruct(
            device_id,
            &window,
            &samples,
            last_before.as_ref(),
            self.clock.now(),
        ))
    }
}

pub(crate) fn validate_device_id(device_id: &str) -> Result<&str> {
    let trimmed = device_id.trim();
    if trimmed.is_empty() {
        return Err(AppError::MalformedInput("device id is required".to_string()));
    }
    Ok(trimmed)
}

fn parse_local_date(field: &str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
        AppError::MalformedInput(format!(
            "{} must be a date formatted as YYYY-MM-DD, got '{}'",
            field, value
        ))
    })
}
