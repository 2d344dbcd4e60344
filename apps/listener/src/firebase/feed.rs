use std::time::Duration;

use futures::StreamExt;
use reqwest::header::ACCEPT;
use reqwest::Method;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use canvas_studio_core::constants::STUDIO_CALLBACK;
use canvas_studio_core::SchedulerHandle;

use super::{FeedMessage, FirebaseSession, SseDecoder};
use crate::error::{ListenerError, ListenerResult};

/// Subscribes to the Studio callback node and forwards every leaf change to
/// the scheduler. Reconnects after `backoff` whenever the stream drops.
pub struct ChangeFeed {
    session: FirebaseSession,
    path: String,
    handle: SchedulerHandle,
    backoff: Duration,
}

impl ChangeFeed {
    pub fn new(session: FirebaseSession, handle: SchedulerHandle, backoff: Duration) -> Self {
        Self {
            session,
            path: STUDIO_CALLBACK.to_string(),
            handle,
            backoff,
        }
    }

    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    async fn run(self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!("Change feed subscribing to {}", self.path);
        loop {
            if *shutdown.borrow() {
                break;
            }
            match self.stream(&mut shutdown).await {
                Ok(()) => break,
                Err(e) => tracing::warn!(
                    "Change feed interrupted: {}; reconnecting in {:?}",
                    e,
                    self.backoff
                ),
            }

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = tokio::time::sleep(self.backoff) => {}
            }
        }
        tracing::info!("Change feed stopped");
    }

    /// Streams until shutdown (`Ok`) or until the connection is lost.
    async fn stream(&self, shutdown: &mut watch::Receiver<bool>) -> ListenerResult<()> {
        let response = self
            .session
            .request(Method::GET, &self.path)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ListenerError::Status {
                status: status.as_u16(),
                path: self.path.clone(),
            });
        }
        tracing::info!("Change feed connected to {}", self.session.base_url());
        self.handle.nudge();

        let mut decoder = SseDecoder::default();
        let mut body = response.bytes_stream();
        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        return Ok(());
                    }
                }
                chunk = body.next() => {
                    let Some(chunk) = chunk else {
                        return Err(ListenerError::FeedClosed("stream ended".into()));
                    };
                    decoder.push(&chunk?);
                    while let Some(event) = decoder.next_event() {
                        self.forward(FeedMessage::from_event(&event))?;
                    }
                }
            }
        }
    }

    fn forward(&self, message: FeedMessage) -> ListenerResult<()> {
        match message {
            FeedMessage::Changes(notifications) => {
                tracing::debug!("Change feed: {} change(s)", notifications.len());
                self.handle.notify_all(notifications);
            }
            FeedMessage::KeepAlive => tracing::trace!("Change feed keep-alive"),
            FeedMessage::Closed(reason) => return Err(ListenerError::FeedClosed(reason)),
            FeedMessage::Ignored => {}
        }
        Ok(())
    }
}
