//! Scheduler timing configuration.

use std::time::Duration;

use crate::constants::{
    DEFAULT_FAST_HEARTBEAT_CYCLES, DEFAULT_FAST_HEARTBEAT_INTERVAL, DEFAULT_HEARTBEAT_INTERVAL,
    DEFAULT_QUIET_PERIOD, DEFAULT_TICK,
};
use crate::errors::{Error, Result};

/// Timing knobs for the scheduler, the debounce gate and the liveness reporter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Quiet period `Q` a burst of edits must respect before dispatch.
    pub quiet_period: Duration,
    /// Countdown tick `T`.
    pub tick: Duration,
    /// Steady heartbeat interval.
    pub heartbeat_interval: Duration,
    /// Heartbeat interval right after activity.
    pub fast_heartbeat_interval: Duration,
    /// Number of fast heartbeats after a working transition or nudge.
    pub fast_heartbeat_cycles: u32,
    /// How long to wait for a gateway reply. `None` waits forever.
    pub reply_timeout: Option<Duration>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            quiet_period: DEFAULT_QUIET_PERIOD,
            tick: DEFAULT_TICK,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            fast_heartbeat_interval: DEFAULT_FAST_HEARTBEAT_INTERVAL,
            fast_heartbeat_cycles: DEFAULT_FAST_HEARTBEAT_CYCLES,
            reply_timeout: None,
        }
    }
}

impl SchedulerConfig {
    pub fn with_quiet_period(mut self, quiet_period: Duration) -> Self {
        self.quiet_period = quiet_period;
        self
    }

    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    pub fn with_heartbeat(mut self, steady: Duration, fast: Duration, fast_cycles: u32) -> Self {
        self.heartbeat_interval = steady;
        self.fast_heartbeat_interval = fast;
        self.fast_heartbeat_cycles = fast_cycles;
        self
    }

    pub fn with_reply_timeout(mut self, reply_timeout: Option<Duration>) -> Self {
        self.reply_timeout = reply_timeout;
        self
    }

    /// Rejects settings the loops cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.tick.is_zero() {
            return Err(Error::invalid_config("tick must be greater than zero"));
        }
        if self.tick > self.quiet_period {
            return Err(Error::invalid_config(format!(
                "tick ({:?}) must not exceed the quiet period ({:?})",
                self.tick, self.quiet_period
            )));
        }
        if self.heartbeat_interval.is_zero() || self.fast_heartbeat_interval.is_zero() {
            return Err(Error::invalid_config(
                "heartbeat intervals must be greater than zero",
            ));
        }
        if matches!(self.reply_timeout, Some(timeout) if timeout.is_zero()) {
            return Err(Error::invalid_config(
                "reply timeout must be greater than zero when set",
            ));
        }
        Ok(())
    }
}
