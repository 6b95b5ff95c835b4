// Cooperative cancellation for pipeline runs
//
// The flag is only polled between steps. An external process that is already
// running is never interrupted by it; cancellation takes effect before the next step.

use std::sync::Arc;
use tokio::sync::watch;

/// Read side, handed to the worker
#[derive(Clone)]
pub struct CancellationToken {
    rx: watch::Receiver<bool>,
}

impl CancellationToken {
    /// Check if cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait for cancellation (returns immediately if already cancelled)
    ///
    /// A source dropped without cancelling can no longer cancel, so the
    /// future then stays pending.
    pub async fn cancelled(&mut self) {
        if self.rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }

    /// Token that can never be cancelled
    pub fn never() -> Self {
        let (_source, token) = cancellation_channel();
        token
    }
}

/// Write side, kept by the observer (or a Ctrl+C handler)
#[derive(Clone)]
pub struct CancelSource {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelSource {
    /// Request cancellation of the run
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

/// Create a fresh cancellation pair; one pair per run
pub fn cancellation_channel() -> (CancelSource, CancellationToken) {
    let (tx, rx) = watch::channel(false);
    (CancelSource { tx: Arc::new(tx) }, CancellationToken { rx })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_cancel_is_visible_to_every_token_clone() {
        let (source, token) = cancellation_channel();
        let other = token.clone();
        assert!(!token.is_cancelled());

        source.cancel();

        assert!(token.is_cancelled());
        assert!(other.is_cancelled());
    }

    #[test]
    fn test_never_token_stays_clear() {
        let token = CancellationToken::never();
        assert!(!token.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancelled_future_resolves() {
        let (source, mut token) = cancellation_channel();
        let waiter = tokio::spawn(async move {
            token.cancelled().await;
            true
        });

        source.cancel();

        let done = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert!(done);
    }

    #[tokio::test]
    async fn test_never_token_does_not_resolve() {
        let mut token = CancellationToken::never();
        let waited = tokio::time::timeout(Duration::from_millis(50), token.cancelled()).await;
        assert!(waited.is_err(), "a token without a source must stay pending");
    }

    #[tokio::test]
    async fn test_dropped_source_without_cancel_does_not_resolve() {
        let (source, mut token) = cancellation_channel();
        drop(source);

        let waited = tokio::time::timeout(Duration::from_millis(50), token.cancelled()).await;

        assert!(waited.is_err());
        assert!(!token.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancel_then_drop_still_resolves() {
        let (source, mut token) = cancellation_channel();
        source.cancel();
        drop(source);

        tokio::time::timeout(Duration::from_secs(1), token.cancelled())
            .await
            .unwrap();
    }
}
