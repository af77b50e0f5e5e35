//! Wire shape of a usage report.
//!
//! Downstream consumers parse `time`, `duration` and `total_on_duration`
//! positionally as `HH:MM:SS`, so these formats are fixed.

use crate::models::usage::{UsageEvent, UsageEventKind, UsageReport};
use crate::services::threshold::PowerState;
use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Placeholder for values that do not exist on the closing boundary.
pub const UNKNOWN: &str = "-";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKindResponse {
    RangeStart,
    Transition,
    RangeEnd,
}

impl From<UsageEventKind> for EventKindResponse {
    fn from(kind: UsageEventKind) -> Self {
        match kind {
            UsageEventKind::RangeStart => Self::RangeStart,
            UsageEventKind::Transition => Self::Transition,
            UsageEventKind::RangeEnd => Self::RangeEnd,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageEventResponse {
    pub date: String,
    pub time: String,
    pub state: PowerState,
    pub power: String,
    pub duration: String,
    pub kind: EventKindResponse,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageReportResponse {
    pub device_id: String,
    pub start_date: String,
    pub end_date: String,
    pub on_count: usize,
    pub off_count: usize,
    pub total_on_duration: String,
    pub events: Vec<UsageEventResponse>,
}

impl From<&UsageEvent> for UsageEventResponse {
    fn from(event: &UsageEvent) -> Self {
        let closing = event.kind == UsageEventKind::RangeEnd;
        let power = match event.power_w {
            Some(w) => format_power(w),
            None => UNKNOWN.to_string(),
        };
        let duration = match (closing, event.duration) {
            (true, _) => UNKNOWN.to_string(),
            (false, Some(d)) => format_hms(d),
            (false, None) => String::new(),
        };

        Self {
            date: event.local_time.format("%Y-%m-%d").to_string(),
            time: event.local_time.format("%H:%M:%S").to_string(),
            state: event.state,
            power,
            duration,
            kind: event.kind.into(),
        }
    }
}

impl From<&UsageReport> for UsageReportResponse {
    fn from(report: &UsageReport) -> Self {
        Self {
            device_id: report.device_id.clone(),
            start_date: report.start_date.format("%Y-%m-%d").to_string(),
            end_date: report.end_date.format("%Y-%m-%d").to_string(),
            on_count: report.on_count,
            off_count: report.off_count,
            total_on_duration: format_hms(report.total_on_duration),
            events: report.events.iter().map(UsageEventResponse::from).collect(),
        }
    }
}

/// `HH:MM:SS`. Hours keep counting past 24; negative input renders as zero.
pub fn format_hms(d: Duration) -> String {
    let secs = d.num_seconds().max(0);
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// At most two decimals, trailing zeros dropped: 50 -> "50", 1.5 -> "1.5".
pub fn format_power(watts: f64) -> String {
    let fixed = format!("{:.2}", watts);
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "" | "-0" => "0".to_string(),
        s => s.to_string(),
    }
}
