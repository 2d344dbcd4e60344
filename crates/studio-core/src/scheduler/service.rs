//! Scheduler lifecycle: spawns the worker, the liveness reporter and the
//! status publisher, and tears them down again.

use std::sync::Arc;

use log::{info, warn};
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;

use super::liveness::LivenessReporter;
use super::worker::UpdateWorker;
use crate::config::SchedulerConfig;
use crate::constants::STUDIO_CALLBACK;
use crate::errors::Result;
use crate::gateway::{GatewayClient, ReplyReceiver};
use crate::notifications::{pending_list, Notification, PendingSender};
use crate::status::{StatusPublisher, StatusSink, WorkingFlag};

/// Producer-facing handle. Cheap to clone, safe to use from any thread.
#[derive(Clone)]
pub struct SchedulerHandle {
    pending: PendingSender,
    nudge: Arc<Notify>,
    working: WorkingFlag,
}

impl SchedulerHandle {
    /// Queues a change notification. Never blocks.
    pub fn notify(&self, key: impl Into<String>, value: Option<String>) -> bool {
        self.pending.enqueue(Notification::new(key, value))
    }

    pub fn notify_all(&self, notifications: impl IntoIterator<Item = Notification>) {
        for notification in notifications {
            self.pending.enqueue(notification);
        }
    }

    /// Wakes the liveness reporter early.
    pub fn nudge(&self) {
        self.nudge.notify_one();
    }

    /// Whether a gateway operation is outstanding.
    pub fn is_working(&self) -> bool {
        self.working.get()
    }
}

/// A running scheduler instance.
///
/// # Example
///
/// ```ignore
/// let (reply_tx, reply_rx) = reply_channel();
/// let gateway = Arc::new(TcpGatewayClient::connect(addr, reply_tx).await?);
/// let mut scheduler = Scheduler::start(config, gateway, reply_rx, sink)?;
/// scheduler.handle().notify("/reference", Some("R1".into()));
/// scheduler.stop().await;
/// ```
pub struct Scheduler {
    handle: SchedulerHandle,
    publisher: StatusPublisher,
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
    publisher_task: Option<JoinHandle<()>>,
}

impl Scheduler {
    /// Validates the config and spawns all scheduler tasks on the current
    /// tokio runtime.
    pub fn start(
        config: SchedulerConfig,
        gateway: Arc<dyn GatewayClient>,
        replies: ReplyReceiver,
        sink: Arc<dyn StatusSink>,
    ) -> Result<Self> {
        config.validate()?;
        info!(
            "Starting scheduler (quiet {:?}, tick {:?})",
            config.quiet_period, config.tick
        );

        let (publisher, publisher_task) = StatusPublisher::spawn(sink);
        // Stale callback entries would otherwise be replayed by the feed
        publisher.publish(STUDIO_CALLBACK, None);

        let (pending_tx, pending_rx) = pending_list();
        let (shutdown, shutdown_rx) = watch::channel(false);
        let working = WorkingFlag::new();
        let nudge = Arc::new(Notify::new());

        let worker = UpdateWorker::new(
            &config,
            pending_rx,
            replies,
            gateway,
            publisher.clone(),
            working.clone(),
            shutdown_rx.clone(),
        );
        let liveness = LivenessReporter::new(
            &config,
            publisher.clone(),
            working.subscribe(),
            nudge.clone(),
            shutdown_rx,
        );

        let tasks = vec![tokio::spawn(worker.run()), tokio::spawn(liveness.run())];

        Ok(Self {
            handle: SchedulerHandle {
                pending: pending_tx,
                nudge,
                working,
            },
            publisher,
            shutdown,
            tasks,
            publisher_task: Some(publisher_task),
        })
    }

    pub fn handle(&self) -> SchedulerHandle {
        self.handle.clone()
    }

    /// Queues a status write through the scheduler's publisher.
    pub fn publisher(&self) -> StatusPublisher {
        self.publisher.clone()
    }

    pub fn is_running(&self) -> bool {
        self.publisher_task.is_some()
    }

    /// Stops every scheduler task. Idempotent.
    ///
    /// Does not wait for an outstanding gateway reply. Status queued before
    /// the call (including the final `twoway = false`) is still written.
    pub async fn stop(&mut self) {
        let Some(publisher_task) = self.publisher_task.take() else {
            return;
        };
        info!("Stopping scheduler");
        self.shutdown.send_replace(true);

        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                warn!("Scheduler task ended abnormally: {}", e);
            }
        }

        self.publisher.stop();
        if let Err(e) = publisher_task.await {
            warn!("Status publisher ended abnormally: {}", e);
        }
        info!("Scheduler stopped");
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        // Tasks observe the flag even when stop() was never awaited
        self.shutdown.send_replace(true);
        self.publisher.stop();
    }
}
