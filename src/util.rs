use chrono::{DateTime, Local, TimeZone};
use std::sync::{Arc, Mutex};

/// Render a number of seconds as `HH:MM:SS`.
///
/// Hours are not wrapped, so long totals simply grow the first field
/// (`100:00:00`, `1234:05:06`).
pub fn format_duration(total_seconds: u64) -> String {
    let h = total_seconds / 3600;
    let m = (total_seconds % 3600) / 60;
    let s = total_seconds % 60;
    format!("{h:02}:{m:02}:{s:02}")
}

/// Calendar date of `instant` in its own timezone, as `YYYY-MM-DD`.
///
/// History is partitioned by this key, so callers pass local time.
pub fn date_key<Tz: TimeZone>(instant: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    instant.format("%Y-%m-%d").to_string()
}

pub fn today_key() -> String {
    date_key(&Local::now())
}

/// Epoch milliseconds for `instant`, the unit stored in session records
pub fn epoch_millis<Tz: TimeZone>(instant: &DateTime<Tz>) -> i64 {
    instant.timestamp_millis()
}

/// Provides the current local time, so date attribution can be tested
pub trait TimeSource: Send + Sync + 'static {
    fn now(&self) -> DateTime<Local>;
}

pub struct LocalTimeSource;

impl TimeSource for LocalTimeSource {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Time source that only moves when told to
#[derive(Debug, Clone)]
pub struct ManualTimeSource {
    now: Arc<Mutex<DateTime<Local>>>,
}

impl ManualTimeSource {
    pub fn new(start: DateTime<Local>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn set(&self, instant: DateTime<Local>) {
        if let Ok(mut now) = self.now.lock() {
            *now = instant;
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> DateTime<Local> {
        match self.now.lock() {
            Ok(now) => *now,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, NaiveDate, Utc};

    fn parse_fields(s: &str) -> (u64, u64, u64) {
        let parts: Vec<&str> = s.split(':').collect();
        assert_eq!(parts.len(), 3, "expected three fields in {s}");
        (
            parts[0].parse().unwrap(),
            parts[1].parse().unwrap(),
            parts[2].parse().unwrap(),
        )
    }

    #[test]
    fn test_format_duration_zero() {
        assert_eq!(format_duration(0), "00:00:00");
    }

    #[test]
    fn test_format_duration_mixed() {
        assert_eq!(format_duration(5), "00:00:05");
        assert_eq!(format_duration(61), "00:01:01");
        assert_eq!(format_duration(3599), "00:59:59");
        assert_eq!(format_duration(3600), "01:00:00");
        assert_eq!(format_duration(3 * 3600 + 25 * 60 + 7), "03:25:07");
    }

    #[test]
    fn test_format_duration_hours_grow_past_two_digits() {
        assert_eq!(format_duration(100 * 3600), "100:00:00");
        assert_eq!(format_duration(1234 * 3600 + 5 * 60 + 6), "1234:05:06");
    }

    #[test]
    fn test_format_duration_shape_and_arithmetic() {
        let samples = (0..5000u64)
            .step_by(7)
            .chain([86_399, 86_400, 359_999, 360_000, 9_999_999]);
        for n in samples {
            let s = format_duration(n);
            assert!(s.len() >= 8, "{s} too short");
            let (h, m, sec) = parse_fields(&s);
            assert!(m <= 59 && sec <= 59, "{s} has out of range fields");
            assert_eq!(3600 * h + 60 * m + sec, n);
            let fields: Vec<&str> = s.split(':').collect();
            assert!(fields.iter().all(|f| f.len() >= 2));
            assert_eq!(fields[1].len(), 2);
            assert_eq!(fields[2].len(), 2);
        }
    }

    #[test]
    fn test_date_key_zero_padded() {
        let dt = Utc.with_ymd_and_hms(2024, 3, 7, 12, 0, 0).unwrap();
        assert_eq!(date_key(&dt), "2024-03-07");
    }

    #[test]
    fn test_date_key_uses_instant_timezone() {
        // 23:30 UTC is already the next day at +09:00
        let utc = Utc.with_ymd_and_hms(2024, 12, 31, 23, 30, 0).unwrap();
        let seoul = utc.with_timezone(&FixedOffset::east_opt(9 * 3600).unwrap());
        assert_eq!(date_key(&utc), "2024-12-31");
        assert_eq!(date_key(&seoul), "2025-01-01");
    }

    #[test]
    fn test_date_key_orders_like_calendar() {
        let a = date_key(&Utc.with_ymd_and_hms(2024, 9, 30, 0, 0, 0).unwrap());
        let b = date_key(&Utc.with_ymd_and_hms(2024, 10, 1, 0, 0, 0).unwrap());
        assert!(a < b);
    }

    #[test]
    fn test_today_key_matches_local_date() {
        let key = today_key();
        let parsed = NaiveDate::parse_from_str(&key, "%Y-%m-%d").unwrap();
        let now = Local::now().date_naive();
        // tolerate a midnight rollover between the two calls
        assert!(parsed == now || parsed.succ_opt() == Some(now));
    }

    #[test]
    fn test_manual_time_source() {
        let start = Local.with_ymd_and_hms(2024, 6, 1, 23, 59, 0).unwrap();
        let source = ManualTimeSource::new(start);
        assert_eq!(source.now(), start);

        source.advance(chrono::Duration::minutes(2));
        assert_eq!(date_key(&source.now()), "2024-06-02");

        let clone = source.clone();
        clone.set(start);
        assert_eq!(source.now(), start);
    }

    #[test]
    fn test_epoch_millis() {
        let dt = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(epoch_millis(&dt), 1_700_000_000_123);
    }
}
