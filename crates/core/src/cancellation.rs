//! Cooperative cancellation primitive used by pipeline stages and long-running
//! coordinator calls. Hand-rolled over an atomic flag plus a `Notify` rather
//! than pulling in a dedicated cancellation crate for one small type.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Clone)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

struct Inner {
    cancelled: AtomicBool,
    notify: Notify,
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancellationToken {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                notify: Notify::new(),
            }),
        }
    }

    pub fn cancel(&self) {
        if !self.inner.cancelled.swap(true, Ordering::SeqCst) {
            self.inner.notify.notify_waiters();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves immediately if already cancelled, otherwise waits for `cancel()`.
    /// Suspension point a stage should race against its own work with `tokio::select!`.
    pub async fn cancelled(&self) {
        if self.is_cancelled() {
            return;
        }
        loop {
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
            if self.is_cancelled() {
                return;
            }
        }
    }

    /// Forks a token that is cancelled whenever `self` is cancelled, and can
    /// additionally be cancelled on its own without affecting `self`.
    pub fn child(&self) -> CancellationToken {
        let child = CancellationToken::new();
        let parent = self.clone();
        let child_clone = child.clone();
        tokio::spawn(async move {
            parent.cancelled().await;
            child_clone.cancel();
        });
        child
    }
}
