//! Clock-time helpers for seconds-since-midnight values.

use chrono::{Local, NaiveTime, Timelike};

pub const SECONDS_PER_MINUTE: i64 = 60;
pub const SECONDS_PER_HOUR: i64 = 3600;
pub const SECONDS_PER_DAY: i64 = 86_400;

/// Format seconds since midnight as `HH:MM`.
///
/// Values past midnight keep counting hours (`25:30`) so late schedules stay readable.
pub fn format_clock(seconds: i64) -> String {
    if (0..SECONDS_PER_DAY).contains(&seconds) {
        if let Some(t) = NaiveTime::from_num_seconds_from_midnight_opt(seconds as u32, 0) {
            return t.format("%H:%M").to_string();
        }
    }
    let sign = if seconds < 0 { "-" } else { "" };
    let abs = seconds.unsigned_abs() as i64;
    let hours = abs / SECONDS_PER_HOUR;
    let minutes = (abs % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE;
    format!("{}{:02}:{:02}", sign, hours, minutes)
}

/// Seconds since midnight for a clock time.
pub fn seconds_since_midnight(t: NaiveTime) -> i64 {
    t.num_seconds_from_midnight() as i64
}

/// Current local time of day in seconds since midnight.
pub fn local_time_of_day() -> i64 {
    seconds_since_midnight(Local::now().time())
}

/// Parse `HH:MM` or `HH:MM:SS` into seconds since midnight.
pub fn parse_clock(s: &str) -> Option<i64> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .ok()
        .map(seconds_since_midnight)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(9 * 3600 + 5 * 60 + 59), "09:05");
        assert_eq!(format_clock(23 * 3600 + 59 * 60), "23:59");
    }

    #[test]
    fn test_format_clock_past_midnight() {
        assert_eq!(format_clock(25 * 3600 + 30 * 60), "25:30");
        assert_eq!(format_clock(-90 * 60), "-01:30");
    }

    #[test]
    fn test_parse_clock() {
        assert_eq!(parse_clock("08:30"), Some(30_600));
        assert_eq!(parse_clock("08:30:15"), Some(30_615));
        assert_eq!(parse_clock("nonsense"), None);
    }

    #[test]
    fn test_local_time_of_day_in_range() {
        let now = local_time_of_day();
        assert!((0..SECONDS_PER_DAY).contains(&now));
    }
}
