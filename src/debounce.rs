//! Trailing-edge debouncer driven by the event loop tick.

use std::time::{Duration, Instant};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Fires once, `delay` after the last `touch`. Every `touch` restarts the wait.
#[derive(Clone, Debug)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Record an input event at `now`.
    pub fn touch(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// True exactly once when the quiet period has elapsed.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Drop a pending fire (e.g. on Enter, when the value is applied at once).
    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_after_quiet_period() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(Duration::from_millis(300));
        d.touch(t0);
        assert!(!d.fire(t0 + Duration::from_millis(299)));
        assert!(d.fire(t0 + Duration::from_millis(300)));
        assert!(!d.fire(t0 + Duration::from_millis(900)));
    }

    #[test]
    fn keystrokes_restart_the_wait() {
        let t0 = Instant::now();
        let mut d = Debouncer::default();
        d.touch(t0);
        d.touch(t0 + Duration::from_millis(200));
        assert!(!d.fire(t0 + Duration::from_millis(400)));
        assert!(d.fire(t0 + Duration::from_millis(500)));
    }

    #[test]
    fn cancel_clears_pending() {
        let t0 = Instant::now();
        let mut d = Debouncer::default();
        d.touch(t0);
        d.cancel();
        assert!(!d.is_pending());
        assert!(!d.fire(t0 + Duration::from_secs(1)));
    }
}
