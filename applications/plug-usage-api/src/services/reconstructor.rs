//! Rebuilds ON/OFF usage history for one plug from its raw power readings.
//!
//! The walk is a single pass over samples already filtered to the window and
//! sorted by `(ts, id)`. It never touches a store or the wall clock; `now` is
//! passed in so that "is this range over?" is deterministic.
//!
//! An ON interval that was already running when the window opened (carried
//! over from the last reading before it) has no known start. When it ends in
//! range an OFF event is still emitted, but without a duration, and nothing is
//! added to the total. Usage before the first in-range ON reading is therefore
//! not counted.

use crate::models::sample::Sample;
use crate::models::usage::{UsageEvent, UsageEventKind, UsageReport};
use crate::services::threshold::{PowerState, PowerThreshold};
use crate::services::timezone::{DayWindow, OperatingZone};
use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, Copy)]
pub struct UsageReconstructor {
    zone: OperatingZone,
    threshold: PowerThreshold,
}

impl UsageReconstructor {
    pub fn new(zone: OperatingZone, threshold: PowerThreshold) -> Self {
        Self { zone, threshold }
    }

    pub fn zone(&self) -> &OperatingZone {
        &self.zone
    }

    pub fn reconstruct(
        &self,
        device_id: &str,
        window: &DayWindow,
        samples: &[Sample],
        last_before: Option<&Sample>,
        now: DateTime<Utc>,
    ) -> UsageReport {
        let carried_power = last_before.map(|s| s.power_w).unwrap_or(0.0);
        let carried_state = self.threshold.classify(carried_power);

        let mut events = Vec::with_capacity(samples.len() / 2 + 2);
        events.push(UsageEvent {
            local_time: self.zone.to_local(window.start_utc),
            state: carried_state,
            kind: UsageEventKind::RangeStart,
            power_w: Some(carried_power),
            duration: None,
        });

        let mut running = carried_state;
        let mut on_since: Option<DateTime<Utc>> = None;
        let mut total_on = Duration::zero();

        for sample in samples {
            let state = self.threshold.classify(sample.power_w);
            match (running, state) {
                (PowerState::Off, PowerState::On) => {
                    on_since = Some(sample.ts);
                    events.push(self.transition(sample, state, None));
                }
                (PowerState::On, PowerState::Off) => {
                    let duration = on_since.take().map(|start| sample.ts - start);
                    if let Some(d) = duration {
                        total_on += d;
                    }
                    events.push(self.transition(sample, state, duration));
                }
                _ => {}
            }
            running = state;
        }

        if window.is_complete_at(now) {
            events.push(UsageEvent {
                // Last whole second of the end date, even when the next
                // midnight falls in a DST gap.
                local_time: self.zone.to_local(window.end_utc - Duration::seconds(1)),
                state: running,
                kind: UsageEventKind::RangeEnd,
                power_w: None,
                duration: None,
            });
        }

        let on_count = events.iter().filter(|e| e.state.is_on()).count();
        let off_count = events.len() - on_count;

        tracing::debug!(
            device_id,
            samples = samples.len(),
            events = events.len(),
            total_on_secs = total_on.num_seconds(),
            "usage reconstructed"
        );

        UsageReport {
            device_id: device_id.to_string(),
            start_date: window.start_date,
            end_date: window.end_date,
            on_count,
            off_count,
            total_on_duration: total_on,
            events,
        }
    }

    fn transition(&self, sample: &Sample, state: PowerState, duration: Option<Duration>) -> UsageEvent {
        UsageEvent {
            local_time: self.zone.to_local(sample.ts),
            state,
            kind: UsageEventKind::Transition,
            power_w: Some(sample.power_w),
            duration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime, TimeZone};
    use chrono_tz::Tz;
    use pretty_assertions::assert_eq;

    const DEVICE: &str = "shelly-plug-1";

    fn lima() -> OperatingZone {
        OperatingZone::from_name("America/Lima").unwrap()
    }

    fn reconstructor() -> UsageReconstructor {
        UsageReconstructor::new(lima(), PowerThreshold::default())
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn local(date: NaiveDate, h: u32, m: u32, s: u32) -> NaiveDateTime {
        date.and_hms_opt(h, m, s).unwrap()
    }

    fn lima_at(date: NaiveDate, h: u32, m: u32, s: u32) -> DateTime<Tz> {
        lima().to_local(lima().local_to_utc(local(date, h, m, s)).unwrap())
    }

    /// Sample at a Lima wall-clock time (UTC-5, no DST).
    fn sample_at(id: i64, date: NaiveDate, h: u32, m: u32, power_w: f64) -> Sample {
        let ts = lima().local_to_utc(local(date, h, m, 0)).unwrap();
        Sample {
            id,
            device_id: DEVICE.into(),
            ts,
            power_w,
            voltage: Some(230.0),
            current_a: None,
            energy_wh: None,
            temperature_c: None,
        }
    }

    fn window(start: NaiveDate, end: NaiveDate) -> DayWindow {
        lima().day_window(start, end).unwrap()
    }

    fn during(date: NaiveDate) -> DateTime<Utc> {
        lima().local_to_utc(local(date, 12, 0, 0)).unwrap()
    }

    fn long_after(date: NaiveDate) -> DateTime<Utc> {
        lima().local_to_utc(local(date, 12, 0, 0)).unwrap() + Duration::days(30)
    }

    #[test]
    fn test_single_on_interval_no_prior_sample() {
        let d = day(2025, 1, 15);
        let samples = vec![
            sample_at(1, d, 8, 0, 0.5),
            sample_at(2, d, 8, 5, 50.0),
            sample_at(3, d, 8, 30, 1.0),
        ];

        let report = reconstructor().reconstruct(DEVICE, &window(d, d), &samples, None, during(d));

        assert_eq!(
            report.events,
            vec![
                UsageEvent {
                    local_time: lima_at(d, 0, 0, 0),
                    state: PowerState::Off,
                    kind: UsageEventKind::RangeStart,
                    power_w: Some(0.0),
                    duration: None,
                },
                UsageEvent {
                    local_time: lima_at(d, 8, 5, 0),
                    state: PowerState::On,
                    kind: UsageEventKind::Transition,
                    power_w: Some(50.0),
                    duration: None,
                },
                UsageEvent {
                    local_time: lima_at(d, 8, 30, 0),
                    state: PowerState::Off,
                    kind: UsageEventKind::Transition,
                    power_w: Some(1.0),
                    duration: Some(Duration::minutes(25)),
                },
            ]
        );
        assert_eq!(report.on_count, 1);
        assert_eq!(report.off_count, 2);
        assert_eq!(report.total_on_duration, Duration::minutes(25));
    }

    #[test]
    fn test_completed_day_gets_closing_event() {
        let d = day(2025, 1, 15);
        let samples = vec![
            sample_at(1, d, 8, 0, 0.5),
            sample_at(2, d, 8, 5, 50.0),
            sample_at(3, d, 8, 30, 1.0),
        ];

        let report =
            reconstructor().reconstruct(DEVICE, &window(d, d), &samples, None, long_after(d));

        let last = report.events.last().unwrap();
        assert_eq!(last.kind, UsageEventKind::RangeEnd);
        assert_eq!(last.local_time.naive_local(), local(d, 23, 59, 59));
        assert_eq!(last.state, PowerState::Off);
        assert_eq!(last.power_w, None);
        assert_eq!(last.duration, None);
        assert_eq!(report.events.len(), 4);
        assert_eq!(report.on_count, 1);
        assert_eq!(report.off_count, 3);
    }

    #[test]
    fn test_closing_event_carries_final_running_state() {
        let d = day(2025, 1, 15);
        let samples = vec![sample_at(1, d, 22, 0, 80.0)];

        let report =
            reconstructor().reconstruct(DEVICE, &window(d, d), &samples, None, long_after(d));

        let last = report.events.last().unwrap();
        assert_eq!(last.kind, UsageEventKind::RangeEnd);
        assert_eq!(last.state, PowerState::On);
        // Still running at the end of the day, never closed.
        assert_eq!(report.total_on_duration, Duration::zero());
    }

    #[test]
    fn test_carried_over_on_with_no_samples() {
        let d = day(2025, 1, 15);
        let prior = sample_at(1, day(2025, 1, 14), 23, 50, 10.0);

        let report =
            reconstructor().reconstruct(DEVICE, &window(d, d), &[], Some(&prior), during(d));

        assert_eq!(
            report.events,
            vec![UsageEvent {
                local_time: lima_at(d, 0, 0, 0),
                state: PowerState::On,
                kind: UsageEventKind::RangeStart,
                power_w: Some(10.0),
                duration: None,
            }]
        );
        assert_eq!(report.total_on_duration, Duration::zero());
        assert_eq!(report.on_count, 1);
        assert_eq!(report.off_count, 0);

        let closed =
            reconstructor().reconstruct(DEVICE, &window(d, d), &[], Some(&prior), long_after(d));
        assert_eq!(closed.events.len(), 2);
        assert_eq!(closed.events[1].state, PowerState::On);
        assert_eq!(closed.events[1].kind, UsageEventKind::RangeEnd);
        assert_eq!(closed.total_on_duration, Duration::zero());
    }

    #[test]
    fn test_carried_over_on_closed_in_range_is_not_counted() {
        let d = day(2025, 1, 15);
        let prior = sample_at(1, day(2025, 1, 14), 23, 0, 120.0);
        let samples = vec![
            sample_at(2, d, 6, 0, 0.0),
            sample_at(3, d, 9, 0, 60.0),
            sample_at(4, d, 10, 0, 0.4),
        ];

        let report = reconstructor().reconstruct(
            DEVICE,
            &window(d, d),
            &samples,
            Some(&prior),
            during(d),
        );

        assert_eq!(report.events.len(), 4);
        let carried_off = &report.events[1];
        assert_eq!(carried_off.state, PowerState::Off);
        assert_eq!(carried_off.kind, UsageEventKind::Transition);
        assert_eq!(carried_off.local_time.naive_local(), local(d, 6, 0, 0));
        assert_eq!(carried_off.duration, None);

        assert_eq!(report.events[3].duration, Some(Duration::hours(1)));
        assert_eq!(report.total_on_duration, Duration::hours(1));
    }

    #[test]
    fn test_prior_off_sample_reports_its_power() {
        let d = day(2025, 1, 15);
        let prior = sample_at(1, day(2025, 1, 14), 20, 0, 1.5);

        let report =
            reconstructor().reconstruct(DEVICE, &window(d, d), &[], Some(&prior), during(d));

        assert_eq!(report.events[0].state, PowerState::Off);
        assert_eq!(report.events[0].power_w, Some(1.5));
    }

    #[test]
    fn test_no_prior_sample_starts_off_at_zero() {
        let d = day(2025, 1, 15);
        let samples = vec![sample_at(1, d, 1, 0, 300.0)];

        let report = reconstructor().reconstruct(DEVICE, &window(d, d), &samples, None, during(d));

        assert_eq!(report.events[0].state, PowerState::Off);
        assert_eq!(report.events[0].power_w, Some(0.0));
        assert_eq!(report.events[1].state, PowerState::On);
    }

    #[test]
    fn test_repeated_states_emit_nothing() {
        let d = day(2025, 1, 15);
        let samples = vec![
            sample_at(1, d, 8, 0, 40.0),
            sample_at(2, d, 8, 1, 45.0),
            sample_at(3, d, 8, 2, 2.0),
            sample_at(4, d, 8, 3, 0.0),
            sample_at(5, d, 8, 4, 1.9),
        ];

        let report = reconstructor().reconstruct(DEVICE, &window(d, d), &samples, None, during(d));

        let transitions: Vec<_> = report.events.iter().filter(|e| !e.is_synthetic()).collect();
        assert_eq!(transitions.len(), 2);
        assert_eq!(transitions[0].power_w, Some(40.0));
        assert_eq!(transitions[1].power_w, Some(2.0));
        assert_eq!(transitions[1].duration, Some(Duration::minutes(2)));
    }

    #[test]
    fn test_threshold_is_strictly_greater() {
        let d = day(2025, 1, 15);
        let samples = vec![sample_at(1, d, 8, 0, 2.0)];

        let report = reconstructor().reconstruct(DEVICE, &window(d, d), &samples, None, during(d));

        assert_eq!(report.events.len(), 1);
    }

    #[test]
    fn test_multiple_intervals_sum_into_total() {
        let d = day(2025, 1, 15);
        let samples = vec![
            sample_at(1, d, 7, 0, 100.0),
            sample_at(2, d, 7, 45, 0.0),
            sample_at(3, d, 12, 0, 900.0),
            sample_at(4, d, 13, 30, 0.0),
            sample_at(5, d, 19, 0, 60.0),
            sample_at(6, d, 19, 10, 0.2),
        ];

        let report = reconstructor().reconstruct(DEVICE, &window(d, d), &samples, None, during(d));

        let attributed: Duration = report
            .events
            .iter()
            .filter_map(|e| e.duration)
            .fold(Duration::zero(), |acc, d| acc + d);
        assert_eq!(report.total_on_duration, Duration::minutes(45 + 90 + 10));
        assert_eq!(attributed, report.total_on_duration);
        assert_eq!(report.on_count, 3);
        assert_eq!(report.off_count, 4);
    }

    #[test]
    fn test_event_times_are_non_decreasing() {
        let d = day(2025, 1, 15);
        let powers = [0.0, 5.0, 0.0, 3.0, 3.0, 0.1, 50.0, 0.0, 7.0, 1.0];
        let samples: Vec<Sample> = powers
            .iter()
            .enumerate()
            .map(|(i, &p)| sample_at(i as i64, d, 2 * i as u32, 15, p))
            .collect();

        let report =
            reconstructor().reconstruct(DEVICE, &window(d, d), &samples, None, long_after(d));

        for pair in report.events.windows(2) {
            assert!(pair[0].local_time <= pair[1].local_time);
        }

        let crossings = samples
            .iter()
            .fold((PowerState::Off, 0), |(prev, n), s| {
                let state = PowerThreshold::default().classify(s.power_w);
                (state, if state != prev { n + 1 } else { n })
            })
            .1;
        let transitions = report.events.iter().filter(|e| !e.is_synthetic()).count();
        assert_eq!(transitions, crossings);
    }

    #[test]
    fn test_identical_instants_follow_given_order() {
        let d = day(2025, 1, 15);
        // Same ts, store order by insertion id: ON then OFF.
        let samples = vec![sample_at(1, d, 9, 0, 30.0), sample_at(2, d, 9, 0, 0.0)];

        let report = reconstructor().reconstruct(DEVICE, &window(d, d), &samples, None, during(d));

        assert_eq!(report.events.len(), 3);
        assert_eq!(report.events[1].state, PowerState::On);
        assert_eq!(report.events[2].state, PowerState::Off);
        assert_eq!(report.events[2].duration, Some(Duration::zero()));
    }

    #[test]
    fn test_multi_day_range_spans_midnight() {
        let first = day(2025, 1, 15);
        let second = day(2025, 1, 16);
        let samples = vec![
            sample_at(1, first, 23, 0, 75.0),
            sample_at(2, second, 1, 30, 0.0),
        ];

        let report = reconstructor().reconstruct(
            DEVICE,
            &window(first, second),
            &samples,
            None,
            long_after(second),
        );

        assert_eq!(report.events[0].local_time.naive_local(), local(first, 0, 0, 0));
        assert_eq!(report.events[2].local_time.naive_local(), local(second, 1, 30, 0));
        assert_eq!(report.events[2].duration, Some(Duration::minutes(150)));
        assert_eq!(report.events[3].local_time.naive_local(), local(second, 23, 59, 59));
        assert_eq!(report.total_on_duration, Duration::minutes(150));
    }

    #[test]
    fn test_range_ending_today_has_no_closing_event() {
        let d = day(2025, 1, 15);
        let w = window(d, d);

        let today = reconstructor().reconstruct(DEVICE, &w, &[], None, during(d));
        assert!(today.events.iter().all(|e| e.kind != UsageEventKind::RangeEnd));

        // The exact end instant is not "strictly after" the range.
        let at_end = reconstructor().reconstruct(DEVICE, &w, &[], None, w.end_utc);
        assert!(at_end.events.iter().all(|e| e.kind != UsageEventKind::RangeEnd));

        let past = reconstructor().reconstruct(DEVICE, &w, &[], None, w.end_utc + Duration::seconds(1));
        let closing = past
            .events
            .iter()
            .filter(|e| e.kind == UsageEventKind::RangeEnd)
            .count();
        assert_eq!(closing, 1);
    }

    #[test]
    fn test_dst_interval_uses_absolute_duration() {
        // New York, 2024-03-10: clocks jump 02:00 -> 03:00.
        let zone = OperatingZone::from_name("America/New_York").unwrap();
        let rec = UsageReconstructor::new(zone, PowerThreshold::default());
        let d = day(2024, 3, 10);
        let w = zone.day_window(d, d).unwrap();

        let mk = |id: i64, ts: DateTime<Utc>, p: f64| Sample {
            id,
            device_id: DEVICE.into(),
            ts,
            power_w: p,
            voltage: None,
            current_a: None,
            energy_wh: None,
            temperature_c: None,
        };
        let samples = vec![
            mk(1, Utc.with_ymd_and_hms(2024, 3, 10, 6, 30, 0).unwrap(), 40.0), // 01:30 EST
            mk(2, Utc.with_ymd_and_hms(2024, 3, 10, 7, 30, 0).unwrap(), 0.0),  // 03:30 EDT
        ];

        let report = rec.reconstruct(DEVICE, &w, &samples, None, w.start_utc);

        assert_eq!(report.events[1].local_time.naive_local(), local(d, 1, 30, 0));
        assert_eq!(report.events[2].local_time.naive_local(), local(d, 3, 30, 0));
        assert_eq!(report.total_on_duration, Duration::hours(1));
    }

    #[test]
    fn test_reading_in_last_second_does_not_pass_closing_event() {
        let d = day(2025, 1, 15);
        let w = window(d, d);
        let mut late = sample_at(1, d, 23, 59, 50.0);
        late.ts += Duration::milliseconds(59_500);

        let report = reconstructor().reconstruct(DEVICE, &w, &[late], None, long_after(d));

        assert_eq!(report.events.len(), 3);
        assert_eq!(report.events[1].local_time.naive_local(), local(d, 23, 59, 59));
        assert_eq!(report.events[2].kind, UsageEventKind::RangeEnd);
        assert_eq!(report.events[2].local_time, report.events[1].local_time);
        for pair in report.events.windows(2) {
            assert!(pair[0].local_time <= pair[1].local_time);
        }
    }

    #[test]
    fn test_fall_back_keeps_events_in_instant_order() {
        // New York, 2024-11-03: clocks fall back 02:00 EDT -> 01:00 EST.
        let zone = OperatingZone::from_name("America/New_York").unwrap();
        let rec = UsageReconstructor::new(zone, PowerThreshold::default());
        let d = day(2024, 11, 3);
        let w = zone.day_window(d, d).unwrap();

        let mk = |id: i64, ts: DateTime<Utc>, p: f64| Sample {
            id,
            device_id: DEVICE.into(),
            ts,
            power_w: p,
            voltage: None,
            current_a: None,
            energy_wh: None,
            temperature_c: None,
        };
        let samples = vec![
            mk(1, Utc.with_ymd_and_hms(2024, 11, 3, 5, 50, 0).unwrap(), 40.0), // 01:50 EDT
            mk(2, Utc.with_ymd_and_hms(2024, 11, 3, 6, 10, 0).unwrap(), 0.0),  // 01:10 EST
        ];

        let report = rec.reconstruct(DEVICE, &w, &samples, None, w.end_utc + Duration::hours(1));

        assert_eq!(report.events.len(), 4);
        assert_eq!(report.events[1].local_time.naive_local(), local(d, 1, 50, 0));
        assert_eq!(report.events[2].local_time.naive_local(), local(d, 1, 10, 0));
        assert_eq!(report.events[2].duration, Some(Duration::minutes(20)));
        assert_eq!(report.total_on_duration, Duration::minutes(20));
        for pair in report.events.windows(2) {
            assert!(pair[0].local_time <= pair[1].local_time);
        }
    }
}
