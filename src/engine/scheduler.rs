//! Periodic `timeupdate` timer
//!
//! Armed when the controller enters `Playing`, cancelled on every exit from
//! it. A due tick disarms the timer; the controller re-arms it only if it is
//! still playing, so the timer never free-runs.

/// Default tick interval (one 60 Hz frame)
pub const DEFAULT_TICK_INTERVAL_MILLIS: f64 = 16.0;

#[derive(Debug, Clone)]
pub struct Scheduler {
    interval_millis: f64,
    next_due_millis: Option<f64>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_INTERVAL_MILLIS)
    }
}

impl Scheduler {
    /// Create a disarmed scheduler; invalid intervals fall back to the default
    pub fn new(interval_millis: f64) -> Self {
        let interval_millis = if interval_millis.is_finite() && interval_millis > 0.0 {
            interval_millis
        } else {
            DEFAULT_TICK_INTERVAL_MILLIS
        };
        Self {
            interval_millis,
            next_due_millis: None,
        }
    }

    pub fn interval_millis(&self) -> f64 {
        self.interval_millis
    }

    /// Schedule the next tick one interval after `now_millis`
    pub fn arm(&mut self, now_millis: f64) {
        self.next_due_millis = Some(now_millis + self.interval_millis);
    }

    pub fn cancel(&mut self) {
        self.next_due_millis = None;
    }

    pub fn is_armed(&self) -> bool {
        self.next_due_millis.is_some()
    }

    pub fn next_due_millis(&self) -> Option<f64> {
        self.next_due_millis
    }

    /// Consume the pending tick if it is due
    ///
    /// Missed intervals collapse into a single tick.
    pub fn take_due(&mut self, now_millis: f64) -> bool {
        match self.next_due_millis {
            Some(due) if now_millis >= due => {
                self.next_due_millis = None;
                true
            }
            _ => false,
        }
    }
}
