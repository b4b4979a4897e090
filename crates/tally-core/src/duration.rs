//! Elapsed-time arithmetic and human-readable formatting.

use chrono::{NaiveDateTime, TimeDelta};

const SECONDS_PER_MINUTE: i64 = 60;
const SECONDS_PER_HOUR: i64 = 60 * SECONDS_PER_MINUTE;

/// Formats a whole number of seconds as `1h 2m 3s`, `2m 3s` or `3s`.
///
/// Leading units are dropped when zero and no component is zero-padded.
/// Negative input is treated as zero.
#[must_use]
pub fn format_duration(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let hours = seconds / SECONDS_PER_HOUR;
    let minutes = (seconds % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE;
    let secs = seconds % SECONDS_PER_MINUTE;

    if hours > 0 {
        format!("{hours}h {minutes}m {secs}s")
    } else if minutes > 0 {
        format!("{minutes}m {secs}s")
    } else {
        format!("{secs}s")
    }
}

/// Formats a whole number of seconds as a zero-padded `HH:MM:SS` clock.
///
/// Hours are not wrapped at 24.
#[must_use]
pub fn format_clock(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let hours = seconds / SECONDS_PER_HOUR;
    let minutes = (seconds % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE;
    let secs = seconds % SECONDS_PER_MINUTE;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// Seconds between `start` and `now`, clamped at zero.
#[must_use]
#[expect(
    clippy::cast_precision_loss,
    reason = "millisecond counts stay far below 2^52"
)]
pub fn elapsed_seconds(start: NaiveDateTime, now: NaiveDateTime) -> f64 {
    let millis = (now - start).num_milliseconds().max(0);
    millis as f64 / 1000.0
}

/// Elapsed time between `start` and `now`, never negative.
#[must_use]
pub fn elapsed(start: NaiveDateTime, now: NaiveDateTime) -> TimeDelta {
    (now - start).max(TimeDelta::zero())
}

/// Truncates a duration to whole seconds.
#[must_use]
pub fn whole_seconds(duration: TimeDelta) -> i64 {
    duration.num_seconds().max(0)
}
