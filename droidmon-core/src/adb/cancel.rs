//! Cooperative cancellation for shell round trips

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

/// Token for cancelling a pending shell command
///
/// The token can be cloned and shared across tasks. When `cancel()` is called,
/// every `run` waiting on this token stops reading at the next line boundary
/// and returns `None`. The session itself stays open.
#[derive(Clone, Default)]
pub struct CancellationToken {
    inner: Arc<TokenState>,
}

#[derive(Default)]
struct TokenState {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancellationToken {
    /// Creates a new, untriggered cancellation token
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels all operations using this token
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    /// Checks if the token has been cancelled
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resets the cancellation state
    pub fn reset(&self) {
        self.inner.cancelled.store(false, Ordering::SeqCst);
    }

    /// Completes once the token has been cancelled
    pub async fn cancelled(&self) {
        loop {
            // Created before the check so a cancel() between the two is not lost
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
