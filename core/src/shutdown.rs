//! Cooperative shutdown token shared between the sampling loop and
//! background tasks.
//!
//! Triggering is sticky: a listener created or polled after the trigger still
//! observes it. Dropping every [`Shutdown`] handle counts as a trigger, so a
//! task can never outlive the owner that was supposed to stop it.

use std::sync::Arc;
use tokio::sync::watch;

/// The triggering side of the token. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
}

/// The observing side of the token.
#[derive(Debug, Clone)]
pub struct ShutdownListener {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Request shutdown. Idempotent.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    #[must_use]
    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    #[must_use]
    pub fn listener(&self) -> ShutdownListener {
        ShutdownListener {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownListener {
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        let requested = *self.rx.borrow();
        requested || self.rx.has_changed().is_err()
    }

    /// Resolves once shutdown has been requested or every trigger handle is gone.
    pub async fn triggered(&mut self) {
        // An Err means the sender was dropped, which is a shutdown as well.
        let _ = self.rx.wait_for(|stop| *stop).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_trigger_is_sticky() {
        let shutdown = Shutdown::new();
        let mut listener = shutdown.listener();
        assert!(!listener.is_triggered());

        shutdown.trigger();
        assert!(shutdown.is_triggered());
        assert!(listener.is_triggered());

        // Resolves immediately even though the trigger happened before polling.
        tokio::time::timeout(Duration::from_secs(1), listener.triggered())
            .await
            .expect("listener should observe an earlier trigger");
    }

    #[tokio::test]
    async fn test_dropping_every_handle_releases_listener() {
        let shutdown = Shutdown::new();
        let mut listener = shutdown.listener();
        drop(shutdown);

        assert!(listener.is_triggered());
        tokio::time::timeout(Duration::from_secs(1), listener.triggered())
            .await
            .expect("channel close should count as shutdown");
    }

    #[tokio::test]
    async fn test_trigger_wakes_waiting_task() {
        let shutdown = Shutdown::new();
        let mut listener = shutdown.listener();

        let waiter = tokio::spawn(async move { listener.triggered().await });
        shutdown.trigger();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should finish")
            .unwrap();
    }
}
