//! Rolling count windows.

use std::time::{Duration, SystemTime};

/// One counting window: accepted requests so far and when the window rolls
/// over. An expired window is replaced, never incremented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateWindow {
    /// Requests accepted inside this window.
    pub count: u32,
    /// Instant at which the window is superseded by a fresh one.
    pub reset_at: SystemTime,
}

impl RateWindow {
    /// Fresh window already holding one accepted request.
    pub fn first(now: SystemTime, duration: Duration) -> Self {
        Self {
            count: 1,
            reset_at: now + duration,
        }
    }

    /// Fresh empty window (used for the global singleton on rollover).
    pub fn empty(now: SystemTime, duration: Duration) -> Self {
        Self {
            count: 0,
            reset_at: now + duration,
        }
    }

    pub fn expired(&self, now: SystemTime) -> bool {
        self.reset_at <= now
    }

    /// Time until rollover, zero once it has elapsed.
    pub fn reset_in(&self, now: SystemTime) -> Duration {
        self.reset_at
            .duration_since(now)
            .unwrap_or(Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(60);

    #[test]
    fn first_window_starts_at_one() {
        let now = SystemTime::UNIX_EPOCH;
        let window = RateWindow::first(now, WINDOW);
        assert_eq!(window.count, 1);
        assert_eq!(window.reset_at, now + WINDOW);
    }

    #[test]
    fn window_expires_exactly_at_reset() {
        let now = SystemTime::UNIX_EPOCH;
        let window = RateWindow::empty(now, WINDOW);
        assert!(!window.expired(now + Duration::from_secs(59)));
        assert!(window.expired(now + WINDOW));
        assert!(window.expired(now + Duration::from_secs(61)));
    }

    #[test]
    fn reset_in_saturates_to_zero_after_expiry() {
        let now = SystemTime::UNIX_EPOCH;
        let window = RateWindow::empty(now, WINDOW);
        assert_eq!(window.reset_in(now), WINDOW);
        assert_eq!(
            window.reset_in(now + Duration::from_secs(10)),
            Duration::from_secs(50)
        );
        assert_eq!(window.reset_in(now + Duration::from_secs(120)), Duration::ZERO);
    }
}
