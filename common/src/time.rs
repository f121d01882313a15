//! Time utilities and constants for RatePair.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

/// Timing constants.
pub mod constants {
    use super::Duration;

    /// Rates older than this are stale (3 hours).
    pub fn rate_staleness_threshold() -> Duration {
        Duration::hours(3)
    }

    /// The threshold the widget historically shipped with.
    ///
    /// It was written as `3 * 60 * 60 * 100` milliseconds, a factor of ten
    /// short of three hours, so rates went stale after 18 minutes.
    pub fn legacy_rate_staleness_threshold() -> Duration {
        Duration::milliseconds(3 * 60 * 60 * 100)
    }

    /// Upper bound on a single rate fetch (10 seconds).
    pub fn rate_fetch_timeout() -> Duration {
        Duration::seconds(10)
    }
}

/// A timestamp with timezone (always UTC).
pub type Timestamp = DateTime<Utc>;

/// Get the current timestamp.
pub fn now() -> Timestamp {
    Utc::now()
}

/// Check whether `since` lies strictly more than `threshold` before `now`.
pub fn is_older_than(since: Timestamp, now: Timestamp, threshold: Duration) -> bool {
    now.signed_duration_since(since) > threshold
}

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    current: Mutex<Timestamp>,
}

impl ManualClock {
    /// Create a clock frozen at `start`.
    pub fn new(start: Timestamp) -> Self {
        Self {
            current: Mutex::new(start),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut current = self.current.lock();
        *current = *current + by;
    }

    /// Jump to an absolute time.
    pub fn set(&self, to: Timestamp) {
        *self.current.lock() = to;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.current.lock()
    }
}

/// Duration extensions for convenient construction.
pub trait DurationExt {
    fn as_std(&self) -> std::time::Duration;
}

impl DurationExt for Duration {
    fn as_std(&self) -> std::time::Duration {
        self.to_std().unwrap_or(std::time::Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staleness_thresholds() {
        assert_eq!(constants::rate_staleness_threshold().num_milliseconds(), 10_800_000);
        assert_eq!(
            constants::legacy_rate_staleness_threshold().num_milliseconds(),
            1_080_000
        );
        assert_eq!(constants::legacy_rate_staleness_threshold(), Duration::minutes(18));
    }

    #[test]
    fn test_is_older_than_is_strict() {
        let start = now();
        let threshold = Duration::hours(3);

        assert!(!is_older_than(start, start + threshold, threshold));
        assert!(is_older_than(
            start,
            start + threshold + Duration::milliseconds(1),
            threshold
        ));
    }

    #[test]
    fn test_manual_clock() {
        let start = now();
        let clock = ManualClock::new(start);
        assert_eq!(clock.now(), start);

        clock.advance(Duration::minutes(5));
        assert_eq!(clock.now(), start + Duration::minutes(5));

        clock.set(start);
        assert_eq!(clock.now(), start);
    }

    #[test]
    fn test_duration_as_std() {
        assert_eq!(Duration::seconds(2).as_std(), std::time::Duration::from_secs(2));
        assert_eq!(Duration::seconds(-2).as_std(), std::time::Duration::ZERO);
    }
}
