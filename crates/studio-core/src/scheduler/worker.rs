//! Consumer loop: folds notifications, ticks the debounce gate and drives
//! the single outstanding gateway request.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use serde_json::json;
use tokio::sync::watch;
use tokio::time::Instant;

use super::state::{FoldOutcome, SchedulerState};
use crate::config::SchedulerConfig;
use crate::constants::{CANVAS_ERRORS, CANVAS_WORKING, STUDIO_CALLBACK};
use crate::gateway::{GatewayClient, GatewayReply, ReplyReceiver};
use crate::model::UpdateIntent;
use crate::notifications::{Notification, PendingList};
use crate::status::{StatusPublisher, WorkingFlag};

pub(crate) struct UpdateWorker {
    state: SchedulerState,
    pending: PendingList,
    replies: ReplyReceiver,
    gateway: Arc<dyn GatewayClient>,
    publisher: StatusPublisher,
    working: WorkingFlag,
    shutdown: watch::Receiver<bool>,
    reply_timeout: Option<Duration>,
    /// When the running countdown next ticks. Only a gate restart moves it.
    next_tick: Option<Instant>,
    /// Replies still owed for requests that timed out.
    stale_replies: usize,
}

impl UpdateWorker {
    pub(crate) fn new(
        config: &SchedulerConfig,
        pending: PendingList,
        replies: ReplyReceiver,
        gateway: Arc<dyn GatewayClient>,
        publisher: StatusPublisher,
        working: WorkingFlag,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            state: SchedulerState::new(config),
            pending,
            replies,
            gateway,
            publisher,
            working,
            shutdown,
            reply_timeout: config.reply_timeout,
            next_tick: None,
            stale_replies: 0,
        }
    }

    pub(crate) async fn run(mut self) {
        info!("Update worker started");
        self.set_working(false);

        loop {
            if self.state.ready_to_dispatch() {
                self.dispatch().await;
                continue;
            }

            let awaiting = self.state.is_awaiting_reply();
            self.next_tick = self
                .state
                .gate_wait()
                .map(|tick| self.next_tick.unwrap_or_else(|| Instant::now() + tick));
            let next_tick = self.next_tick;
            let deadline = self.state.reply_deadline(self.reply_timeout);

            tokio::select! {
                biased;
                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        break;
                    }
                }
                reply = self.replies.recv(), if awaiting => {
                    match reply {
                        Some(stale) if self.stale_replies > 0 => {
                            self.stale_replies -= 1;
                            warn!(
                                "Discarding late reply to a timed-out request (success={})",
                                stale.success
                            );
                        }
                        Some(reply) => self.settle(reply),
                        None => {
                            warn!("Gateway reply channel closed with a request outstanding");
                            self.settle(GatewayReply::failure_message("Gateway connection closed"));
                        }
                    }
                }
                _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    let waited = self.reply_timeout.unwrap_or_default();
                    warn!("No gateway reply after {:?}", waited);
                    self.stale_replies += 1;
                    self.settle(GatewayReply::failure_message(format!(
                        "Timed out waiting for gateway reply after {} ms",
                        waited.as_millis()
                    )));
                }
                notification = self.pending.next() => {
                    match notification {
                        Some(notification) => self.fold(notification),
                        None => {
                            info!("Notification feed closed");
                            break;
                        }
                    }
                }
                _ = tokio::time::sleep_until(next_tick.unwrap_or_else(Instant::now)), if next_tick.is_some() => {
                    self.next_tick = None;
                    self.state.tick();
                }
            }
        }

        if self.state.is_awaiting_reply() {
            info!("Abandoning outstanding gateway request");
            self.set_working(false);
        }

        info!("Update worker stopped");
    }

    fn fold(&mut self, notification: Notification) {
        let outcome = self.state.fold(&notification);
        if matches!(
            outcome,
            FoldOutcome::Field | FoldOutcome::Intent(UpdateIntent::Update)
        ) {
            // Countdown restarted at the full quiet period
            self.next_tick = None;
        }
        match outcome {
            FoldOutcome::Intent(intent) => {
                debug!("Intent {} after {}", intent, notification.key);
            }
            FoldOutcome::Unhandled => {}
            outcome => debug!("Folded {} ({:?})", notification.key, outcome),
        }
    }

    async fn dispatch(&mut self) {
        // Replies that showed up while idle answer nothing outstanding
        while let Ok(stale) = self.replies.try_recv() {
            self.stale_replies = self.stale_replies.saturating_sub(1);
            warn!("Discarding stale gateway reply (success={})", stale.success);
        }
        let Some(request) = self.state.begin_dispatch(Instant::now()) else {
            return;
        };
        info!(
            "Dispatching request {} ({})",
            request.id,
            request.operation.intent()
        );
        self.set_working(true);

        match self.gateway.submit(&request).await {
            Ok(()) => debug!("Request {} submitted, awaiting reply", request.id),
            Err(e) => {
                error!("Failed to submit request {}: {}", request.id, e);
                self.settle(GatewayReply::failure_message(e.to_string()));
            }
        }
    }

    /// Returns to `Idle` and publishes the outcome.
    fn settle(&mut self, reply: GatewayReply) {
        let Some(flight) = self.state.complete(&reply) else {
            warn!("Ignoring gateway reply with no request outstanding");
            return;
        };

        if reply.success {
            info!(
                "Request {} ({}) completed in {:?}",
                flight.request_id,
                flight.intent,
                flight.dispatched_at.elapsed()
            );
        } else {
            warn!(
                "Request {} ({}) failed: {}",
                flight.request_id,
                flight.intent,
                reply.messages.join("; ")
            );
        }

        self.publisher.publish(STUDIO_CALLBACK, None);
        let errors = if reply.success {
            None
        } else {
            Some(json!(reply.messages))
        };
        self.publisher.publish(CANVAS_ERRORS, errors);
        self.set_working(false);
    }

    fn set_working(&self, working: bool) {
        self.working.set(working);
        self.publisher.publish(CANVAS_WORKING, Some(json!(working)));
        debug!("Working={}", working);
    }
}
