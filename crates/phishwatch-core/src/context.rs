//! Liveness of the hosting context.
//!
//! Background tasks check the context before each unit of work. Once torn
//! down, a context never comes back; scheduled work is skipped, not retried.

use std::sync::Arc;

use tokio::sync::watch;

/// Shared handle to the lifetime of a hosting context.
///
/// Clones observe the same context.
#[derive(Debug, Clone)]
pub struct HostContext {
    torn_down: Arc<watch::Sender<bool>>,
}

impl Default for HostContext {
    fn default() -> Self {
        Self::new()
    }
}

impl HostContext {
    /// Create a live context.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            torn_down: Arc::new(tx),
        }
    }

    /// Whether the context is still alive.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        !*self.torn_down.borrow()
    }

    /// Tear the context down. Idempotent.
    pub fn tear_down(&self) {
        self.torn_down.send_replace(true);
    }

    /// Resolve once the context has been torn down.
    pub async fn torn_down(&self) {
        let mut rx = self.torn_down.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|down| *down).await;
    }
}
