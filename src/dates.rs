// Fixed-format date rendering

use chrono::{DateTime, Utc};

const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Render `date` as `YYYY-MM-DD HH:MM:SS` in UTC; empty for `None`
pub fn string_from_date(date: Option<&DateTime<Utc>>) -> String {
    string_from_date_with(date, false)
}

/// Render `date` as `YYYY-MM-DD` when `date_only`, otherwise as [`string_from_date`]
pub fn string_from_date_with(date: Option<&DateTime<Utc>>, date_only: bool) -> String {
    let Some(date) = date else {
        return String::new();
    };
    let format = if date_only { DATE_FORMAT } else { DATE_TIME_FORMAT };
    date.format(format).to_string()
}

/// Current time in milliseconds since the Unix epoch
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_string_from_date() {
        let date = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(string_from_date(Some(&date)), "2024-01-02 03:04:05");
        assert_eq!(string_from_date_with(Some(&date), true), "2024-01-02");
        assert_eq!(string_from_date_with(Some(&date), false), "2024-01-02 03:04:05");
    }

    #[test]
    fn test_sub_second_precision_is_truncated() {
        let date = Utc.with_ymd_and_hms(1999, 12, 31, 23, 59, 59).unwrap() + chrono::Duration::milliseconds(999);
        assert_eq!(string_from_date(Some(&date)), "1999-12-31 23:59:59");
    }

    #[test]
    fn test_none_is_empty() {
        assert_eq!(string_from_date(None), "");
        assert_eq!(string_from_date_with(None, true), "");
    }

    #[test]
    fn test_proleptic_gregorian() {
        let date = Utc.with_ymd_and_hms(1582, 10, 10, 0, 0, 0).unwrap();
        assert_eq!(string_from_date_with(Some(&date), true), "1582-10-10");
    }

    #[test]
    fn test_now_ms() {
        let ts = now_ms();
        // After 2020
        assert!(ts > 1_600_000_000_000);
    }
}
