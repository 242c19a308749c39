//! Periodic coupon expiry sweep.
//!
//! Spawns a background task that calls
//! [`sweep_expired`](patron_coupon::lifecycle::sweep_expired) on a fixed
//! interval (five minutes by default). The sweep is idempotent and races
//! benignly with redemption, so no coordination with the rest of the
//! engine is needed beyond sharing the store.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use patron_core::traits::CouponStore;
use patron_coupon::lifecycle::sweep_expired;

/// Handle to a running expiry sweeper task.
pub struct Sweeper {
    handle: JoinHandle<()>,
    shutdown: watch::Sender<bool>,
}

impl Sweeper {
    /// Spawn a sweeper over `store`, ticking every `interval`.
    ///
    /// The first tick fires immediately, which clears any backlog left
    /// from before the process started.
    pub fn spawn(store: Arc<dyn CouponStore>, interval: Duration) -> Self {
        let (shutdown, mut rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = sweep_expired(store.as_ref(), Utc::now()) {
                            warn!(error = %e, "sweeper: sweep failed, will retry next tick");
                        }
                    }
                    changed = rx.changed() => {
                        if changed.is_err() || *rx.borrow() {
                            info!("sweeper: shutting down");
                            break;
                        }
                    }
                }
            }
        });

        Self { handle, shutdown }
    }

    /// Signal the task to stop and return its join handle.
    pub fn stop(self) -> JoinHandle<()> {
        let _ = self.shutdown.send(true);
        self.handle
    }
}
