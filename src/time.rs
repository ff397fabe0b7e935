// Time frames for test execution

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Start/end pair of UTC instants.
///
/// A frame is opened with [`TimeFrame::start_now`] and stays mutable until
/// [`TimeFrame::close`] stamps its end. Frames of several cases can be merged
/// with [`TimeFrame::extend`] to get the span covering all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeFrame {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeFrame {
    /// Create a frame from explicit instants
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Open a frame at the current instant
    pub fn start_now() -> Self {
        let now = Utc::now();
        Self { start: now, end: now }
    }

    /// Create a frame starting at `start` and lasting `duration`
    pub fn with_duration(start: DateTime<Utc>, duration: Duration) -> Self {
        let end = chrono::Duration::from_std(duration)
            .ok()
            .and_then(|d| start.checked_add_signed(d))
            .unwrap_or(start);
        Self { start, end }
    }

    /// Stamp the end of the frame with the current instant
    pub fn close(&mut self) {
        self.end = Utc::now();
    }

    /// Elapsed time between start and end, zero if end precedes start
    pub fn duration(&self) -> Duration {
        (self.end - self.start).to_std().unwrap_or_default()
    }

    /// Widen this frame so it also covers `other`
    pub fn extend(&mut self, other: &TimeFrame) {
        if other.start < self.start {
            self.start = other.start;
        }
        if other.end > self.end {
            self.end = other.end;
        }
    }
}

impl Default for TimeFrame {
    fn default() -> Self {
        Self::start_now()
    }
}

/// Round a duration to the nearest multiple of `unit`
pub fn round_duration(duration: Duration, unit: Duration) -> Duration {
    let unit_nanos = unit.as_nanos();
    if unit_nanos == 0 {
        return duration;
    }
    let nanos = duration.as_nanos();
    let rounded = (nanos + unit_nanos / 2) / unit_nanos * unit_nanos;
    Duration::from_nanos(u64::try_from(rounded).unwrap_or(u64::MAX))
}

/// Human readable duration rounded to milliseconds, e.g. `1s 250ms`
pub fn format_millis(duration: Duration) -> String {
    humantime::format_duration(round_duration(duration, Duration::from_millis(1))).to_string()
}

/// Human readable duration rounded to microseconds
pub fn format_micros(duration: Duration) -> String {
    humantime::format_duration(round_duration(duration, Duration::from_micros(1))).to_string()
}

/// ISO-8601 UTC timestamp with millisecond precision
pub fn iso8601_millis(instant: DateTime<Utc>) -> String {
    instant.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}
