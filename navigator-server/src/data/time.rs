//! Clock arithmetic over a modular service day.
//!
//! Times are seconds since midnight. Schedules may quote hours past 23 for
//! services that run after midnight, so parsing is lenient and values are
//! normalised into the day before they reach the graph.

use chrono::{NaiveTime, Timelike};

/// Seconds in one day.
pub const DAY_SECONDS: i32 = 24 * 60 * 60;

/// Error returned when parsing an invalid time string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// Seconds from `from` forward to the next occurrence of `to`.
///
/// Wraps past midnight, so the result is always in `0..DAY_SECONDS`.
///
/// ```
/// use navigator_server::data::time::time_distance;
///
/// assert_eq!(time_distance(23 * 3600, 3600), 2 * 3600);
/// assert_eq!(time_distance(3600, 3600), 0);
/// ```
pub fn time_distance(from: i32, to: i32) -> i32 {
    (to - from).rem_euclid(DAY_SECONDS)
}

/// Fold any second count into `0..DAY_SECONDS`.
pub fn normalize(time: i32) -> i32 {
    time.rem_euclid(DAY_SECONDS)
}

/// Parse a schedule time `H:MM:SS` whose hour may exceed 23.
///
/// The result is not normalised.
pub fn parse_time_value(s: &str) -> Result<i32, TimeError> {
    let mut parts = s.trim().split(':');
    let (Some(hours), Some(minutes), Some(seconds), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(TimeError::new("expected H:MM:SS format"));
    };

    let hours = parse_digits(hours).ok_or_else(|| TimeError::new("invalid hour digits"))?;
    let minutes = parse_digits(minutes).ok_or_else(|| TimeError::new("invalid minute digits"))?;
    let seconds = parse_digits(seconds).ok_or_else(|| TimeError::new("invalid second digits"))?;
    if minutes > 59 {
        return Err(TimeError::new("minute must be 0-59"));
    }
    if seconds > 59 {
        return Err(TimeError::new("second must be 0-59"));
    }
    if hours > 47 {
        return Err(TimeError::new("hour must be 0-47"));
    }

    Ok(hours * 3600 + minutes * 60 + seconds)
}

/// Parse a wall-clock time `HH:MM:SS` as entered by a user.
pub fn parse_clock(s: &str) -> Result<i32, TimeError> {
    let time = NaiveTime::parse_from_str(s.trim(), "%H:%M:%S")
        .map_err(|_| TimeError::new("expected HH:MM:SS between 00:00:00 and 23:59:59"))?;
    Ok(time.num_seconds_from_midnight() as i32)
}

/// Format seconds as a wall-clock `HH:MM:SS`, modulo one day.
pub fn to_time_string(time: i32) -> String {
    NaiveTime::from_num_seconds_from_midnight_opt(normalize(time) as u32, 0)
        .unwrap_or_default()
        .format("%H:%M:%S")
        .to_string()
}

/// Human-readable length of a duration in seconds, e.g. `1h 05min`.
pub fn to_time_description(seconds: i32) -> String {
    let seconds = seconds.max(0);
    let (hours, minutes, secs) = (seconds / 3600, seconds / 60 % 60, seconds % 60);
    if hours > 0 {
        format!("{hours}h {minutes:02}min")
    } else if minutes > 0 {
        format!("{minutes}min {secs:02}s")
    } else {
        format!("{secs}s")
    }
}

/// Human-readable distance, metres below one kilometre.
pub fn to_distance_description(km: f64) -> String {
    if km < 1.0 {
        format!("{} m", (km * 1000.0).round() as i64)
    } else {
        format!("{km:.2} km")
    }
}

/// Parse one or two ASCII digits.
fn parse_digits(s: &str) -> Option<i32> {
    if s.is_empty() || s.len() > 2 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.bytes()
        .try_fold(0i32, |acc, b| Some(acc * 10 + i32::from(b - b'0')))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_distance_wraps_midnight() {
        assert_eq!(time_distance(23 * 3600, 3600), 2 * 3600);
        assert_eq!(time_distance(8 * 3600, 8 * 3600 + 600), 600);
        assert_eq!(time_distance(100, 100), 0);
        assert_eq!(time_distance(200, 100), DAY_SECONDS - 100);
    }

    #[test]
    fn time_distance_accepts_times_past_one_day() {
        // Node time keeps counting past midnight; departures stay within the day.
        assert_eq!(time_distance(DAY_SECONDS + 60, 120), 60);
    }

    #[test]
    fn parse_schedule_times() {
        assert_eq!(parse_time_value("08:00:00"), Ok(28800));
        assert_eq!(parse_time_value("8:05:30"), Ok(8 * 3600 + 5 * 60 + 30));
        assert_eq!(parse_time_value("24:10:00"), Ok(DAY_SECONDS + 600));
        assert_eq!(normalize(parse_time_value("24:10:00").unwrap()), 600);
    }

    #[test]
    fn reject_malformed_schedule_times() {
        assert!(parse_time_value("08:00").is_err());
        assert!(parse_time_value("08:00:00:00").is_err());
        assert!(parse_time_value("08:60:00").is_err());
        assert!(parse_time_value("08:00:6x").is_err());
        assert!(parse_time_value("48:00:00").is_err());
        assert!(parse_time_value("").is_err());
    }

    #[test]
    fn parse_user_clock() {
        assert_eq!(parse_clock("08:00:00"), Ok(28800));
        assert_eq!(parse_clock(" 23:59:59 "), Ok(DAY_SECONDS - 1));
        assert!(parse_clock("24:00:00").is_err());
        assert!(parse_clock("noon").is_err());
    }

    #[test]
    fn format_time_string() {
        assert_eq!(to_time_string(0), "00:00:00");
        assert_eq!(to_time_string(29700), "08:15:00");
        assert_eq!(to_time_string(DAY_SECONDS + 61), "00:01:01");
    }

    #[test]
    fn describe_durations() {
        assert_eq!(to_time_description(45), "45s");
        assert_eq!(to_time_description(300), "5min 00s");
        assert_eq!(to_time_description(3900), "1h 05min");
        assert_eq!(to_time_description(-5), "0s");
    }

    #[test]
    fn describe_distances() {
        assert_eq!(to_distance_description(0.4162), "416 m");
        assert_eq!(to_distance_description(2.5), "2.50 km");
    }

    #[test]
    fn error_display() {
        let err = parse_time_value("xx").unwrap_err();
        assert_eq!(err.to_string(), "invalid time: expected H:MM:SS format");
    }
}
