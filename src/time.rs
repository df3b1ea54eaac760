//! Time-related utilities with clock abstraction for testability.

use chrono::{DateTime, Local, TimeZone, Utc};

/// Clock trait for dependency injection and testing
pub trait Clock: Send + Sync {
    /// Get the current instant
    fn now(&self) -> DateTime<Utc>;
}

/// System clock implementation (uses actual system time)
#[derive(Debug, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Fixed clock implementation for testing (returns a fixed instant)
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    fixed_time: DateTime<Utc>,
}

impl FixedClock {
    /// Create a new fixed clock pinned to the given instant
    pub fn new(fixed_time: DateTime<Utc>) -> Self {
        Self { fixed_time }
    }

    /// Create a new fixed clock from a Unix timestamp in milliseconds
    pub fn from_millis(millis: i64) -> Self {
        let fixed_time = Utc
            .timestamp_millis_opt(millis)
            .single()
            .unwrap_or_default();
        Self { fixed_time }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.fixed_time
    }
}

/// Parse an RFC 3339 timestamp from the wire
pub fn parse_rfc3339(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Format an instant as local wall-clock time for display
pub fn format_local_time(timestamp: DateTime<Utc>) -> String {
    timestamp.with_timezone(&Local).format("%H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_returns_current_time() {
        // テスト項目: SystemClock が現在時刻に近い値を返す
        // given (前提条件):
        let clock = SystemClock;

        // when (操作):
        let now = clock.now();

        // then (期待する結果):
        assert!((Utc::now() - now).num_seconds() < 5);
    }

    #[test]
    fn test_fixed_clock_returns_fixed_time() {
        // テスト項目: FixedClock が固定された時刻を返す
        // given (前提条件):
        let clock = FixedClock::from_millis(1672498800000);

        // when (操作):
        let first = clock.now();
        let second = clock.now();

        // then (期待する結果):
        assert_eq!(first, second);
        assert_eq!(first.timestamp_millis(), 1672498800000);
    }

    #[test]
    fn test_parse_rfc3339_valid_timestamp() {
        // テスト項目: RFC 3339 形式のタイムスタンプが正しくパースされる
        // given (前提条件):
        let value = "2023-01-01T00:00:00+09:00";

        // when (操作):
        let parsed = parse_rfc3339(value);

        // then (期待する結果):
        assert!(parsed.is_some());
        assert_eq!(parsed.unwrap().timestamp_millis(), 1672498800000);
    }

    #[test]
    fn test_parse_rfc3339_invalid_timestamp() {
        // テスト項目: 不正な形式のタイムスタンプは None になる
        // given (前提条件):
        let value = "not a timestamp";

        // when (操作):
        let parsed = parse_rfc3339(value);

        // then (期待する結果):
        assert!(parsed.is_none());
    }
}
