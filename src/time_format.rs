//! Timestamp renderings shared by the KML and GPX writers.
//!
//! Local renderings use the system timezone at render time.

use chrono::{DateTime, Local, Utc};

fn utc(timestamp: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(timestamp, 0).unwrap_or_default()
}

fn local(timestamp: i64) -> DateTime<Local> {
    utc(timestamp).with_timezone(&Local)
}

/// `HH:MM`, used in folder and track names.
pub fn local_clock(timestamp: i64) -> String {
    local(timestamp).format("%H:%M").to_string()
}

/// `HH:MM:SS`, used in placemark names.
pub fn local_clock_seconds(timestamp: i64) -> String {
    local(timestamp).format("%H:%M:%S").to_string()
}

pub fn local_datetime(timestamp: i64) -> String {
    local(timestamp).format("%Y-%m-%d %H:%M:%S").to_string()
}

/// GPX `xsd:dateTime` in UTC, e.g. `2011-03-13T07:06:40Z`.
pub fn utc_timestamp(timestamp: i64) -> String {
    utc(timestamp).format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// `HH:MM-HH:MM, N positions`.
pub fn span_name(start: i64, end: i64, count: usize) -> String {
    format!("{}-{}, {} positions", local_clock(start), local_clock(end), count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utc_rendering() {
        assert_eq!(utc_timestamp(0), "1970-01-01T00:00:00Z");
        assert_eq!(utc_timestamp(1300000000), "2011-03-13T07:06:40Z");
    }

    #[test]
    fn out_of_range_falls_back_to_epoch() {
        assert_eq!(utc_timestamp(i64::MAX), "1970-01-01T00:00:00Z");
    }

    #[test]
    fn local_shapes() {
        let clock = local_clock(1300000000);
        assert_eq!(clock.len(), 5);
        assert_eq!(&clock[2..3], ":");
        assert_eq!(local_clock_seconds(1300000000).len(), 8);
        assert_eq!(local_datetime(1300000000).len(), 19);
        assert!(span_name(0, 60, 3).ends_with(", 3 positions"));
    }
}
