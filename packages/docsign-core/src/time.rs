//! Wall-clock helpers.
//!
//! Session login times and signature timestamps are recorded in UTC.
//! Certificate validity windows are taken from the certificate itself and
//! do not go through here.

use chrono::{DateTime, Utc};

/// Current time in UTC
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Render a timestamp the way log lines and status output show it
pub fn format_utc(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_is_reasonable() {
        let ts = now().timestamp();
        // Should be after 2024-01-01 (1704067200)
        assert!(ts > 1704067200, "Timestamp {} is too old", ts);
        // Should be before 2100-01-01 (4102444800)
        assert!(ts < 4102444800, "Timestamp {} is too far in future", ts);
    }

    #[test]
    fn test_format_utc() {
        let at = DateTime::<Utc>::from_timestamp(1704067200, 0).unwrap();
        assert_eq!(format_utc(&at), "2024-01-01 00:00:00 UTC");
    }
}
