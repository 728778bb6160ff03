//! Cooperative cancellation shared by both workflows.
//!
//! A single token is created per process. The binaries wire it to Ctrl-C;
//! library code checks it at every suspension point (git calls, model
//! requests, stream reads, the review prompt) through [`CancellationToken::run`].

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;
use tracing::debug;

use crate::error::Cancelled;

#[derive(Debug, Default)]
struct Inner {
    cancelled: AtomicBool,
    notify: Notify,
}

/// Cloneable handle; every clone observes the same cancellation.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the token. Idempotent.
    pub fn cancel(&self) {
        if !self.inner.cancelled.swap(true, Ordering::SeqCst) {
            debug!("cancellation requested");
        }
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Return `Err(Cancelled)` if the token already fired.
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }

    /// Resolve once the token fires.
    pub async fn cancelled(&self) {
        loop {
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }

    /// Drive `fut` to completion unless the token fires first.
    ///
    /// The future is dropped on cancellation, so child processes spawned with
    /// `kill_on_drop` and in-flight HTTP requests are torn down with it.
    pub async fn run<F, T>(&self, fut: F) -> Result<T, Cancelled>
    where
        F: Future<Output = T>,
    {
        self.check()?;
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(Cancelled),
            value = fut => Ok(value),
        }
    }

    /// Cancel this token when the process receives Ctrl-C.
    pub fn cancel_on_ctrl_c(&self) {
        let token = self.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                token.cancel();
            }
        });
    }
}
