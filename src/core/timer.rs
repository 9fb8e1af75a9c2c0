//! Deadline timers driven by the application loop.
//!
//! Nothing here spawns threads or sleeps. The loop asks for the nearest
//! deadline, waits on its channels until then, and calls `tick(now)`.
//!
//! - [`Debouncer`] - one-shot, every `schedule()` pushes the deadline out
//! - [`IntervalTimer`] - recurring, fires once per period while running

use std::time::{Duration, Instant};

/// One-shot timer that restarts on every schedule (debounce behavior).
///
/// # Usage
/// ```ignore
/// // On speed input:
/// debouncer.schedule(now);
///
/// // In update loop:
/// if debouncer.tick(now) {
///     controller.advance(false);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            pending: None,
        }
    }

    /// Arm the timer. If already pending, the old deadline is dropped.
    pub fn schedule(&mut self, now: Instant) {
        self.pending = Some(now + self.delay);
        log::trace!("Debouncer: armed for {}ms", self.delay.as_millis());
    }

    pub fn cancel(&mut self) {
        if self.pending.take().is_some() {
            log::trace!("Debouncer: cancelled");
        }
    }

    /// Returns true once when the deadline has passed, then disarms.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.pending {
            Some(at) if now >= at => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending
    }
}

/// Recurring timer with a fixed period.
#[derive(Debug, Clone)]
pub struct IntervalTimer {
    period: Duration,
    next: Option<Instant>,
}

impl IntervalTimer {
    pub fn new(period_ms: u64) -> Self {
        Self {
            period: Duration::from_millis(period_ms.max(1)),
            next: None,
        }
    }

    /// Change the period. A running timer is restarted from `now`.
    pub fn set_period(&mut self, period_ms: u64, now: Instant) {
        self.period = Duration::from_millis(period_ms.max(1));
        if self.next.is_some() {
            self.start(now);
        }
    }

    /// (Re)start: first fire is one period after `now`.
    pub fn start(&mut self, now: Instant) {
        self.next = Some(now + self.period);
        log::trace!("IntervalTimer: started, period {}ms", self.period.as_millis());
    }

    pub fn stop(&mut self) {
        if self.next.take().is_some() {
            log::trace!("IntervalTimer: stopped");
        }
    }

    /// Returns true if a period elapsed. Missed periods collapse into one fire.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(at) = self.next else {
            return false;
        };
        if now < at {
            return false;
        }
        let mut next = at + self.period;
        if next <= now {
            next = now + self.period;
        }
        self.next = Some(next);
        true
    }

    pub fn is_active(&self) -> bool {
        self.next.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debounce_no_immediate_trigger() {
        let mut d = Debouncer::new(100);
        let now = Instant::now();
        d.schedule(now);
        assert!(d.is_pending());
        assert!(!d.tick(now));
    }

    #[test]
    fn test_debounce_triggers_once() {
        let mut d = Debouncer::new(10);
        let now = Instant::now();
        d.schedule(now);
        let later = now + Duration::from_millis(15);
        assert!(d.tick(later));
        assert!(!d.is_pending());
        assert!(!d.tick(later));
    }

    #[test]
    fn test_debounce_reschedule_resets() {
        let mut d = Debouncer::new(50);
        let t0 = Instant::now();
        d.schedule(t0);
        let t1 = t0 + Duration::from_millis(30);
        d.schedule(t1);
        // Original deadline passed, but the timer was pushed out
        assert!(!d.tick(t0 + Duration::from_millis(60)));
        assert!(d.tick(t1 + Duration::from_millis(50)));
    }

    #[test]
    fn test_debounce_cancel() {
        let mut d = Debouncer::new(10);
        let now = Instant::now();
        d.schedule(now);
        d.cancel();
        assert!(!d.tick(now + Duration::from_secs(1)));
    }

    #[test]
    fn test_interval_fires_each_period() {
        let mut t = IntervalTimer::new(100);
        let t0 = Instant::now();
        assert!(!t.tick(t0 + Duration::from_secs(5)));
        t.start(t0);
        assert!(!t.tick(t0 + Duration::from_millis(50)));
        assert!(t.tick(t0 + Duration::from_millis(100)));
        assert!(!t.tick(t0 + Duration::from_millis(150)));
        assert!(t.tick(t0 + Duration::from_millis(200)));
    }

    #[test]
    fn test_interval_collapses_missed_periods() {
        let mut t = IntervalTimer::new(100);
        let t0 = Instant::now();
        t.start(t0);
        let late = t0 + Duration::from_millis(1050);
        assert!(t.tick(late));
        assert!(!t.tick(late));
        assert_eq!(t.deadline(), Some(late + Duration::from_millis(100)));
    }

    #[test]
    fn test_interval_set_period_restarts_running() {
        let mut t = IntervalTimer::new(100);
        let t0 = Instant::now();
        t.set_period(500, t0);
        assert!(!t.is_active());
        t.start(t0);
        let t1 = t0 + Duration::from_millis(50);
        t.set_period(500, t1);
        assert_eq!(t.deadline(), Some(t1 + Duration::from_millis(500)));
    }
}
