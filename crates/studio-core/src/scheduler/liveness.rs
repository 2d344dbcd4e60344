//! Liveness reporter: heartbeat timestamp plus the working flag.
//!
//! Publishes on a long steady interval. A working transition or an explicit
//! nudge publishes immediately and switches to the fast interval for a fixed
//! number of cycles before decaying back.

use std::sync::Arc;
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use log::{debug, info};
use serde_json::json;
use tokio::sync::{watch, Notify};

use crate::config::SchedulerConfig;
use crate::constants::{CANVAS_LISTENING, CANVAS_TWOWAY, CANVAS_WORKING};
use crate::status::StatusPublisher;

pub(crate) struct LivenessReporter {
    publisher: StatusPublisher,
    working: watch::Receiver<bool>,
    nudge: Arc<Notify>,
    shutdown: watch::Receiver<bool>,
    steady: Duration,
    fast: Duration,
    fast_cycles: u32,
}

impl LivenessReporter {
    pub(crate) fn new(
        config: &SchedulerConfig,
        publisher: StatusPublisher,
        working: watch::Receiver<bool>,
        nudge: Arc<Notify>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            publisher,
            working,
            nudge,
            shutdown,
            steady: config.heartbeat_interval,
            fast: config.fast_heartbeat_interval,
            fast_cycles: config.fast_heartbeat_cycles,
        }
    }

    pub(crate) async fn run(mut self) {
        info!("Liveness reporter started");
        self.publisher.publish(CANVAS_TWOWAY, Some(json!(true)));

        let mut fast_remaining: u32 = 0;
        loop {
            self.beat();

            let wait = if fast_remaining > 0 {
                fast_remaining -= 1;
                self.fast
            } else {
                self.steady
            };

            tokio::select! {
                biased;
                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        break;
                    }
                }
                changed = self.working.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    debug!("Liveness woken by working transition");
                    fast_remaining = self.fast_cycles;
                }
                _ = self.nudge.notified() => {
                    debug!("Liveness nudged");
                    fast_remaining = self.fast_cycles;
                }
                _ = tokio::time::sleep(wait) => {}
            }
        }

        self.publisher.publish(CANVAS_TWOWAY, Some(json!(false)));
        info!("Liveness reporter stopped");
    }

    fn beat(&mut self) {
        let heartbeat = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let working = *self.working.borrow_and_update();
        debug!("Liveness.beat {} working={}", heartbeat, working);
        self.publisher.publish(CANVAS_LISTENING, Some(json!(heartbeat)));
        self.publisher.publish(CANVAS_WORKING, Some(json!(working)));
    }
}
