//! Cooperative cancellation shared across generation and staging tasks.
//!
//! A [`CancelToken`] is a clonable handle over a watch channel. Firing it is
//! idempotent, and every clone observes the same state, so a Ctrl-C handler,
//! a split session, and an in-flight provider call can all share one token.

use std::sync::Arc;

use tokio::sync::watch;

/// Signals cancellation to any task holding a clone of the token.
#[derive(Clone, Debug)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self { tx: Arc::new(tx), rx }
    }

    /// Fire the token. Safe to call more than once.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the token is fired. Resolves immediately if it already was.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        // Every clone holds the sender, so wait_for cannot observe a closed
        // channel while this token is alive.
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_unfired() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
    }

    #[test]
    fn cancel_is_idempotent_and_visible_to_clones() {
        let token = CancelToken::new();
        let clone = token.clone();

        token.cancel();
        token.cancel();

        assert!(token.is_cancelled());
        assert!(clone.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_resolves_when_fired() {
        let token = CancelToken::new();
        let waiter = token.clone();

        let handle = tokio::spawn(async move {
            waiter.cancelled().await;
        });

        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn cancelled_resolves_immediately_if_already_fired() {
        let token = CancelToken::new();
        token.cancel();
        token.cancelled().await;
    }
}
