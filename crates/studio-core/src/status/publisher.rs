//! Serializing status publisher.
//!
//! All status writes go through one worker task with its own queue, so a slow
//! sink never holds up notification ingestion.

use std::sync::Arc;

use log::{debug, info, warn};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::StatusSink;

/// A queued status write.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusUpdate {
    pub path: String,
    pub value: Option<Value>,
}

enum Outbound {
    Publish(StatusUpdate),
    Stop,
}

/// Handle for queueing status writes. Cheap to clone.
#[derive(Clone)]
pub struct StatusPublisher {
    tx: mpsc::UnboundedSender<Outbound>,
}

impl StatusPublisher {
    /// Spawns the publish worker on the current runtime.
    pub fn spawn(sink: Arc<dyn StatusSink>) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(publish_worker(rx, sink));
        (Self { tx }, worker)
    }

    /// Queues a write. Fire-and-forget.
    pub fn publish(&self, path: impl Into<String>, value: Option<Value>) {
        let update = StatusUpdate {
            path: path.into(),
            value,
        };
        if let Err(e) = self.tx.send(Outbound::Publish(update)) {
            if let Outbound::Publish(update) = e.0 {
                debug!("Status publisher stopped, dropping {}", update.path);
            }
        }
    }

    /// Asks the worker to exit once everything queued so far is written.
    pub fn stop(&self) {
        let _ = self.tx.send(Outbound::Stop);
    }
}

async fn publish_worker(mut rx: mpsc::UnboundedReceiver<Outbound>, sink: Arc<dyn StatusSink>) {
    info!("Status publisher started");
    while let Some(message) = rx.recv().await {
        match message {
            Outbound::Publish(update) => {
                debug!("Status.publish {}", update.path);
                if let Err(e) = sink.publish(&update.path, update.value.as_ref()).await {
                    // Losing observability never stops scheduling
                    warn!("Failed to publish status {}: {}", update.path, e);
                }
            }
            Outbound::Stop => break,
        }
    }
    info!("Status publisher stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::MockStatusSink;
    use serde_json::json;

    #[tokio::test]
    async fn test_updates_are_written_in_order() {
        let sink = MockStatusSink::new();
        let (publisher, worker) = StatusPublisher::spawn(Arc::new(sink.clone()));

        publisher.publish("/a", Some(json!(1)));
        publisher.publish("/b", None);
        publisher.publish("/a", Some(json!(2)));
        publisher.stop();
        worker.await.unwrap();

        assert_eq!(
            sink.updates(),
            vec![
                ("/a".to_string(), Some(json!(1))),
                ("/b".to_string(), None),
                ("/a".to_string(), Some(json!(2))),
            ]
        );
    }

    /// Fails every write to `/lost`, records the rest.
    struct FlakySink {
        inner: MockStatusSink,
    }

    #[async_trait::async_trait]
    impl StatusSink for FlakySink {
        async fn publish(&self, path: &str, value: Option<&Value>) -> crate::Result<()> {
            if path == "/lost" {
                return Err(crate::Error::status("transport down"));
            }
            self.inner.publish(path, value).await
        }
    }

    #[tokio::test]
    async fn test_sink_failure_does_not_stop_worker() {
        let sink = MockStatusSink::new();
        let flaky = FlakySink { inner: sink.clone() };
        let (publisher, worker) = StatusPublisher::spawn(Arc::new(flaky));

        publisher.publish("/lost", Some(json!(true)));
        publisher.publish("/kept", Some(json!(true)));
        publisher.stop();
        worker.await.unwrap();

        assert_eq!(sink.count_for("/lost"), 0);
        assert_eq!(sink.count_for("/kept"), 1);
    }

    #[tokio::test]
    async fn test_publish_after_stop_is_dropped() {
        let sink = MockStatusSink::new();
        let (publisher, worker) = StatusPublisher::spawn(Arc::new(sink.clone()));

        publisher.stop();
        worker.await.unwrap();
        publisher.publish("/late", Some(json!(1)));

        assert!(sink.updates().is_empty());
    }
}
