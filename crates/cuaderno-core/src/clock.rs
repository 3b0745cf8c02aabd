//! Timestamp source for records.
//!
//! Timestamps are ISO-8601 UTC strings with millisecond precision and a `Z`
//! suffix, so lexical order equals chronological order.

use std::sync::Mutex;

use chrono::{DateTime, Duration, SecondsFormat, Utc};

/// A source of timestamps, injectable so tests can control time.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;

    /// The current instant formatted as a record timestamp.
    fn now_iso(&self) -> String {
        format_timestamp(self.now())
    }
}

/// Format an instant the way records store it (`2024-05-01T10:00:00.000Z`).
pub fn format_timestamp(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Wall clock that never repeats or goes backwards within a process.
///
/// When the wall clock has not advanced past the last value handed out,
/// the next value is the last one plus one millisecond.
#[derive(Debug, Default)]
pub struct SystemClock {
    last: Mutex<Option<DateTime<Utc>>>,
}

impl SystemClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        let wall = Utc::now();
        let wall = DateTime::from_timestamp_millis(wall.timestamp_millis()).unwrap_or(wall);

        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        let next = match *last {
            Some(prev) if prev >= wall => prev + Duration::milliseconds(1),
            _ => wall,
        };
        *last = Some(next);
        next
    }
}

/// Clock for tests: returns its current instant, then advances by `step`.
#[derive(Debug)]
pub struct ManualClock {
    current: Mutex<DateTime<Utc>>,
    step: Duration,
}

impl ManualClock {
    /// Start at `start`, advancing one second per reading.
    pub fn new(start: DateTime<Utc>) -> Self {
        Self::with_step(start, Duration::seconds(1))
    }

    pub fn with_step(start: DateTime<Utc>, step: Duration) -> Self {
        Self {
            current: Mutex::new(start),
            step,
        }
    }

    /// Move the clock forward without taking a reading.
    pub fn advance(&self, by: Duration) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        // 2024-05-01T10:00:00Z
        Self::new(DateTime::from_timestamp(1_714_557_600, 0).unwrap_or_default())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        let reading = *current;
        *current += self.step;
        reading
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_use_millis_and_z_suffix() {
        let instant = DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(format_timestamp(instant), "2024-05-01T10:00:00.000Z");
    }

    #[test]
    fn system_clock_is_strictly_increasing() {
        let clock = SystemClock::new();
        let readings: Vec<String> = (0..50).map(|_| clock.now_iso()).collect();
        for pair in readings.windows(2) {
            assert!(pair[0] < pair[1], "{} !< {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn manual_clock_steps_per_reading() {
        let clock = ManualClock::default();
        let a = clock.now();
        let b = clock.now();
        assert_eq!(b - a, Duration::seconds(1));

        clock.advance(Duration::minutes(5));
        let c = clock.now();
        assert_eq!(c - b, Duration::minutes(5) + Duration::seconds(1));
    }
}
