use std::time::{Duration, Instant};

/// Trailing-edge debounce window for live form updates.
pub const LIVE_UPDATE_WINDOW: Duration = Duration::from_millis(150);

/// A cancellable scheduled task holding at most one pending value. Each
/// `schedule` replaces the value and restarts the window, so a burst of
/// updates collapses into the most recent one. The owner supplies the clock,
/// which keeps this independent of any UI timer and testable without
/// sleeping.
#[derive(Debug)]
pub struct Debouncer<T> {
    window: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(window: Duration) -> Self {
        Debouncer {
            window,
            pending: None,
        }
    }

    pub fn schedule(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.window));
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Takes the pending value if its quiet period has elapsed.
    pub fn take_due(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((_, deadline)) if now >= *deadline => self.pending.take().map(|(v, _)| v),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn debouncer() -> Debouncer<u32> {
        Debouncer::new(Duration::from_millis(150))
    }

    #[test]
    fn nothing_due_before_the_window_elapses() {
        let mut d = debouncer();
        let t0 = Instant::now();
        d.schedule(1, t0);
        assert_eq!(d.take_due(t0 + Duration::from_millis(100)), None);
        assert!(d.is_pending());
        assert_eq!(d.take_due(t0 + Duration::from_millis(150)), Some(1));
        assert!(!d.is_pending());
    }

    #[test]
    fn rescheduling_restarts_the_window_and_keeps_only_the_last_value() {
        let mut d = debouncer();
        let t0 = Instant::now();
        d.schedule(1, t0);
        d.schedule(2, t0 + Duration::from_millis(100));
        // The first deadline has passed, but the restart moved it.
        assert_eq!(d.take_due(t0 + Duration::from_millis(200)), None);
        assert_eq!(d.take_due(t0 + Duration::from_millis(250)), Some(2));
    }

    #[test]
    fn cancel_drops_the_pending_value() {
        let mut d = debouncer();
        let t0 = Instant::now();
        d.schedule(7, t0);
        d.cancel();
        assert_eq!(d.take_due(t0 + Duration::from_secs(1)), None);
    }

    #[test]
    fn take_due_is_one_shot() {
        let mut d = debouncer();
        let t0 = Instant::now();
        d.schedule(3, t0);
        let later = t0 + Duration::from_millis(151);
        assert_eq!(d.take_due(later), Some(3));
        assert_eq!(d.take_due(later), None);
    }
}
