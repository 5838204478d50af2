//! 时间戳工具
//!
//! Trade timestamps are wall-clock nanoseconds since the Unix epoch. They are
//! informational only; ordering inside a book is decided by sequence numbers.

use std::time::{SystemTime, UNIX_EPOCH};

/// Nanoseconds since the Unix epoch, 0 if the clock is before it.
#[inline]
pub fn now_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}

/// Seconds since the Unix epoch.
#[inline]
pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_nanos_advance() {
        let ts1 = now_nanos();
        thread::sleep(Duration::from_micros(100));
        let ts2 = now_nanos();
        assert!(ts2 > ts1, "timestamp should advance");
    }

    #[test]
    fn test_units_agree() {
        let secs = now_secs();
        let nanos_as_secs = now_nanos() / 1_000_000_000;
        assert!(nanos_as_secs >= secs && nanos_as_secs - secs <= 1);
    }
}
