use crate::services::threshold::PowerState;
use chrono::{DateTime, Duration, NaiveDate};
use chrono_tz::Tz;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageEventKind {
    /// State in effect at local midnight of the first day.
    RangeStart,
    /// A threshold crossing observed in an actual sample.
    Transition,
    /// Closes a fully elapsed range at the last second of the last day.
    RangeEnd,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UsageEvent {
    /// Wall clock in the operating zone; compares as an instant.
    pub local_time: DateTime<Tz>,
    pub state: PowerState,
    pub kind: UsageEventKind,
    /// `None` only on the closing boundary, where no reading exists.
    pub power_w: Option<f64>,
    /// Set only on OFF transitions that close an ON interval seen in range.
    pub duration: Option<Duration>,
}

impl UsageEvent {
    pub fn is_synthetic(&self) -> bool {
        self.kind != UsageEventKind::Transition
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UsageReport {
    pub device_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub on_count: usize,
    pub off_count: usize,
    pub total_on_duration: Duration,
    pub events: Vec<UsageEvent>,
}
