use crate::error::{AppError, Result};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, SubsecRound, TimeZone, Utc};
use chrono_tz::Tz;

/// The single zone all user-facing dates and times are expressed in.
///
/// Conversions go through the full tz transition table, so a day may be
/// 23 or 25 hours long and its midnight may not exist at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatingZone {
    tz: Tz,
}

/// A run of whole local calendar days resolved to absolute instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub start_date: NaiveDate,
    /// Inclusive.
    pub end_date: NaiveDate,
    pub start_utc: DateTime<Utc>,
    /// Exclusive: local midnight of the day after `end_date`.
    pub end_utc: DateTime<Utc>,
}

impl DayWindow {
    pub fn is_complete_at(&self, now: DateTime<Utc>) -> bool {
        self.end_utc < now
    }
}

const GAP_SCAN_STEP_MINUTES: i64 = 15;
const GAP_SCAN_LIMIT_MINUTES: i64 = 180;

impl OperatingZone {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        name.parse::<Tz>()
            .map(Self::new)
            .map_err(|_| AppError::Configuration(format!("unknown time zone: {}", name)))
    }

    pub fn name(&self) -> &'static str {
        self.tz.name()
    }

    /// Wall-clock view of `instant`, truncated to whole seconds.
    ///
    /// The offset is kept, so two results still compare as instants across a
    /// fall-back even when their wall-clock readings go backwards.
    pub fn to_local(&self, instant: DateTime<Utc>) -> DateTime<Tz> {
        instant.trunc_subsecs(0).with_timezone(&self.tz)
    }

    /// Ambiguous wall-clock times (fall back) resolve to the earlier instant.
    /// Times inside a spring-forward gap resolve to the first valid instant
    /// after the gap.
    pub fn local_to_utc(&self, local: NaiveDateTime) -> Result<DateTime<Utc>> {
        let mut candidate = local;
        let limit = local + Duration::minutes(GAP_SCAN_LIMIT_MINUTES);
        while candidate <= limit {
            if let Some(dt) = self.tz.from_local_datetime(&candidate).earliest() {
                return Ok(dt.with_timezone(&Utc));
            }
            candidate += Duration::minutes(GAP_SCAN_STEP_MINUTES);
        }
        Err(AppError::MalformedInput(format!(
            "local time {} does not exist in {}",
            local,
            self.name()
        )))
    }

    pub fn midnight_utc(&self, date: NaiveDate) -> Result<DateTime<Utc>> {
        self.local_to_utc(date.and_time(NaiveTime::MIN))
    }

    pub fn day_window(&self, start_date: NaiveDate, end_date: NaiveDate) -> Result<DayWindow> {
        if end_date < start_date {
            return Err(AppError::MalformedInput(format!(
                "end date {} is before start date {}",
                end_date, start_date
            )));
        }
        let after_end = end_date
            .succ_opt()
            .ok_or_else(|| AppError::MalformedInput(format!("end date {} out of range", end_date)))?;

        Ok(DayWindow {
            start_date,
            end_date,
            start_utc: self.midnight_utc(start_date)?,
            end_utc: self.midnight_utc(after_end)?,
        })
    }
}
