//! Playback-domain clock
//!
//! Domain time is not wall-clock time: it advances only while the audio
//! backend is running. Positions are anchored against it.

use std::sync::Arc;

use parking_lot::Mutex;

/// A readable, monotonic playback-domain clock in milliseconds
pub trait Clock {
    /// Current domain time in milliseconds
    fn now_millis(&self) -> f64;
}

/// Clock advanced by hand
///
/// Clones share the same time, so a test can keep one handle while the
/// engine holds another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<Mutex<f64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward; negative or non-finite steps are ignored
    pub fn advance(&self, millis: f64) {
        if millis.is_finite() && millis > 0.0 {
            *self.now.lock() += millis;
        }
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> f64 {
        *self.now.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_starts_at_zero() {
        assert_eq!(ManualClock::new().now_millis(), 0.0);
    }

    #[test]
    fn test_clones_share_time() {
        let clock = ManualClock::new();
        let other = clock.clone();
        clock.advance(250.0);
        assert_eq!(other.now_millis(), 250.0);
    }

    #[test]
    fn test_never_runs_backwards() {
        let clock = ManualClock::new();
        clock.advance(10.0);
        clock.advance(-5.0);
        clock.advance(f64::NAN);
        assert_eq!(clock.now_millis(), 10.0);
    }
}
