//! Cooperative cancellation shared by every task of one analysis.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;

use crate::error::{Error, Result};

/// Cloneable cancellation flag.
///
/// Futures raced against [`CancelSignal::guard`] are dropped on
/// cancellation, which kills any child process they own.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_canceled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once [`cancel`](Self::cancel) has been called.
    pub async fn canceled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|canceled| *canceled).await;
    }

    /// Run `future` unless the signal fires first.
    pub async fn guard<T, F>(&self, future: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.is_canceled() {
            return Err(Error::Canceled);
        }
        tokio::select! {
            biased;
            _ = self.canceled() => Err(Error::Canceled),
            result = future => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn guard_passes_results_through() {
        let signal = CancelSignal::new();
        let value = signal.guard(async { Ok(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn cancel_interrupts_pending_work() {
        let signal = CancelSignal::new();
        let remote = signal.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            remote.cancel();
        });

        let result: Result<()> = signal
            .guard(async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(Error::Canceled)));
        assert!(signal.is_canceled());
    }

    #[tokio::test]
    async fn already_canceled_signal_short_circuits() {
        let signal = CancelSignal::new();
        signal.cancel();
        let result = signal.guard(async { Ok(()) }).await;
        assert!(matches!(result, Err(Error::Canceled)));
    }
}
