use std::sync::Arc;

use tokio::sync::watch;

/// True exactly while a gateway operation is outstanding.
///
/// Backed by a watch channel so observers (the liveness reporter) wake on
/// every transition.
#[derive(Clone, Debug)]
pub struct WorkingFlag {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for WorkingFlag {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkingFlag {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Sets the flag. Returns `true` if this was a transition.
    pub fn set(&self, working: bool) -> bool {
        self.tx.send_if_modified(|current| {
            if *current == working {
                false
            } else {
                *current = working;
                true
            }
        })
    }

    pub fn get(&self) -> bool {
        *self.tx.borrow()
    }

    /// Receiver that is notified on each transition.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}
