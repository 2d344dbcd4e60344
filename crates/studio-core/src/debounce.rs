//! Countdown that delays dispatch until input has been quiet for `Q`.
//!
//! The worker restarts the countdown whenever a notification extends the
//! quiet period, and calls [`DebounceGate::tick`] each time a wait of `T`
//! passes with no notification.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct DebounceGate {
    quiet_period: Duration,
    tick: Duration,
    remaining: Duration,
}

impl DebounceGate {
    /// Gate starts closed-at-zero: nothing is counting down yet.
    pub fn new(quiet_period: Duration, tick: Duration) -> Self {
        Self {
            quiet_period,
            tick,
            remaining: Duration::ZERO,
        }
    }

    /// Restarts the countdown at the full quiet period.
    pub fn restart(&mut self) {
        self.remaining = self.quiet_period;
    }

    /// Skips the rest of the countdown.
    pub fn force_open(&mut self) {
        self.remaining = Duration::ZERO;
    }

    /// Records one quiet tick.
    pub fn tick(&mut self) {
        self.remaining = self.remaining.saturating_sub(self.tick);
    }

    /// How long to wait for input before the next tick, while counting.
    pub fn next_wait(&self) -> Option<Duration> {
        if self.is_counting() {
            Some(self.tick)
        } else {
            None
        }
    }

    pub fn is_counting(&self) -> bool {
        !self.remaining.is_zero()
    }

    /// The countdown has elapsed. Dispatch additionally requires an intent.
    pub fn is_elapsed(&self) -> bool {
        self.remaining.is_zero()
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> DebounceGate {
        DebounceGate::new(Duration::from_millis(250), Duration::from_millis(50))
    }

    #[test]
    fn test_new_gate_is_elapsed() {
        let gate = gate();
        assert!(gate.is_elapsed());
        assert_eq!(gate.next_wait(), None);
    }

    #[test]
    fn test_countdown_takes_quiet_period_over_tick() {
        let mut gate = gate();
        gate.restart();
        let mut ticks = 0;
        while gate.is_counting() {
            assert_eq!(gate.next_wait(), Some(Duration::from_millis(50)));
            gate.tick();
            ticks += 1;
        }
        assert_eq!(ticks, 5);
        assert!(gate.is_elapsed());
    }

    #[test]
    fn test_restart_during_countdown() {
        let mut gate = gate();
        gate.restart();
        gate.tick();
        gate.tick();
        assert_eq!(gate.remaining(), Duration::from_millis(150));
        gate.restart();
        assert_eq!(gate.remaining(), Duration::from_millis(250));
    }

    #[test]
    fn test_force_open_and_saturation() {
        let mut gate = DebounceGate::new(Duration::from_millis(120), Duration::from_millis(50));
        gate.restart();
        gate.tick();
        gate.tick();
        gate.tick();
        assert!(gate.is_elapsed());

        gate.restart();
        gate.force_open();
        assert!(gate.is_elapsed());
        assert_eq!(gate.next_wait(), None);
    }
}
