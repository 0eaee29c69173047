//! Periodic profile refresh with explicit cancellation.
//!
//! DESIGN
//! ======
//! A background task ticks every period (first tick one period after spawn)
//! and runs `SessionManager::refresh_profile` for each tick in its own task,
//! so a slow fetch never delays the next tick. Cancellation is a
//! `watch<bool>` flag: the loop exits on it and in-flight refreshes check it
//! before applying their result. Dropping the handle cancels.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};
use tracing::{debug, warn};

use crate::manager::SessionManager;

/// Default refresh period.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(3000);

/// Handle to a running profile poller.
pub struct ProfilePoller {
    cancel_tx: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl ProfilePoller {
    /// Spawn the poll loop for `manager`. Must be called inside a tokio runtime.
    #[must_use]
    pub fn spawn(manager: Arc<SessionManager>, period: Duration) -> Self {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let handle = tokio::spawn(run(manager, period, cancel_rx));
        debug!(period_ms = period.as_millis(), "profile poller started");
        Self { cancel_tx, handle: Some(handle) }
    }

    /// Stop ticking and drop any result still in flight.
    pub fn cancel(&self) {
        self.cancel_tx.send_replace(true);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.cancel_tx.borrow()
    }

    /// Cancel and wait for the poll loop to exit.
    pub async fn shutdown(mut self) {
        self.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!(error = %e, "profile poller task ended abnormally");
            }
        }
    }
}

impl Drop for ProfilePoller {
    fn drop(&mut self) {
        self.cancel();
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

async fn run(manager: Arc<SessionManager>, period: Duration, mut cancel_rx: watch::Receiver<bool>) {
    let mut ticker = interval_at(Instant::now() + period, period);
    loop {
        tokio::select! {
            changed = cancel_rx.changed() => {
                if changed.is_err() || *cancel_rx.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                if *cancel_rx.borrow() {
                    break;
                }
                let manager = manager.clone();
                let cancel_rx = cancel_rx.clone();
                tokio::spawn(async move {
                    manager.refresh_profile_until(Some(&cancel_rx)).await;
                });
            }
        }
    }
    debug!("profile poller stopped");
}

#[cfg(test)]
#[path = "poller_test.rs"]
mod tests;
