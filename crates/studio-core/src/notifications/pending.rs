//! FIFO queue of notifications waiting to be folded.

use log::{trace, warn};
use tokio::sync::mpsc;

use super::Notification;

/// Creates a connected sender/list pair.
pub fn pending_list() -> (PendingSender, PendingList) {
    let (tx, rx) = mpsc::unbounded_channel();
    (PendingSender { tx }, PendingList { rx })
}

/// Producer side of the pending list.
///
/// Cheap to clone and safe to call from any thread; `enqueue` never blocks.
#[derive(Clone, Debug)]
pub struct PendingSender {
    tx: mpsc::UnboundedSender<Notification>,
}

impl PendingSender {
    /// Appends to the tail and wakes the consumer if it is waiting.
    ///
    /// Returns `false` when the consumer has gone away; the notification is
    /// dropped in that case.
    pub fn enqueue(&self, notification: Notification) -> bool {
        trace!("Pending.enqueue {}", notification.key);
        match self.tx.send(notification) {
            Ok(()) => true,
            Err(e) => {
                warn!("Dropping notification {}: scheduler stopped", e.0.key);
                false
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer side of the pending list, owned by the scheduler worker.
#[derive(Debug)]
pub struct PendingList {
    rx: mpsc::UnboundedReceiver<Notification>,
}

impl PendingList {
    /// Pops the head without waiting.
    pub fn drain_one(&mut self) -> Option<Notification> {
        self.rx.try_recv().ok()
    }

    /// Waits for the next notification.
    ///
    /// Resolves to `None` once every sender has been dropped and the queue
    /// is empty.
    pub async fn next(&mut self) -> Option<Notification> {
        self.rx.recv().await
    }

    /// Stops accepting new notifications. Already queued ones can still be
    /// drained.
    pub fn close(&mut self) {
        self.rx.close();
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_preserves_arrival_order() {
        let (sender, mut list) = pending_list();
        assert!(list.drain_one().is_none());

        sender.enqueue(Notification::set("/update/A/x", "1"));
        sender.enqueue(Notification::set("/update/A/x", "2"));
        sender.enqueue(Notification::cleared("/reference"));
        assert_eq!(list.len(), 3);

        assert_eq!(list.drain_one().unwrap().value.as_deref(), Some("1"));
        assert_eq!(list.drain_one().unwrap().value.as_deref(), Some("2"));
        assert_eq!(list.drain_one().unwrap().key, "/reference");
        assert!(list.drain_one().is_none());
        assert!(list.is_empty());
    }

    #[test]
    fn test_enqueue_from_many_threads() {
        let (sender, mut list) = pending_list();
        let producers: Vec<_> = (0..4)
            .map(|producer| {
                let sender = sender.clone();
                std::thread::spawn(move || {
                    for i in 0..25 {
                        sender.enqueue(Notification::set(
                            format!("/update/P{}/t", producer),
                            i.to_string(),
                        ));
                    }
                })
            })
            .collect();
        for handle in producers {
            handle.join().unwrap();
        }

        let mut last_seen = std::collections::HashMap::new();
        let mut count = 0;
        while let Some(n) = list.drain_one() {
            let value: i32 = n.value.unwrap().parse().unwrap();
            // Per-producer order survives interleaving.
            if let Some(previous) = last_seen.insert(n.key.clone(), value) {
                assert!(value > previous);
            }
            count += 1;
        }
        assert_eq!(count, 100);
    }

    #[test]
    fn test_enqueue_after_close_is_rejected() {
        let (sender, mut list) = pending_list();
        sender.enqueue(Notification::set("/reference", "R1"));
        list.close();

        assert!(!sender.enqueue(Notification::set("/reference", "R2")));
        assert_eq!(list.drain_one().unwrap().value.as_deref(), Some("R1"));
        assert!(list.drain_one().is_none());
    }

    #[tokio::test]
    async fn test_next_wakes_on_enqueue() {
        let (sender, mut list) = pending_list();
        let waiter = tokio::spawn(async move { list.next().await });
        tokio::task::yield_now().await;

        sender.enqueue(Notification::set("/reset", "1"));
        let received = waiter.await.unwrap().unwrap();
        assert_eq!(received.key, "/reset");
    }

    #[tokio::test]
    async fn test_next_ends_when_senders_dropped() {
        let (sender, mut list) = pending_list();
        drop(sender);
        assert!(list.next().await.is_none());
    }
}
