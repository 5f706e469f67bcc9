//! Periodic reconciliation timer
//!
//! Catches changes the watcher missed (subtrees populated before their
//! watches were installed, queue overflows) by re-running the full diff
//! sync on a fixed interval. Disabled unless an interval is configured.

use std::time::Duration;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::info;

/// Timer driving periodic full resynchronization
pub struct Reconciler {
    timer: Option<Interval>,
}

impl Reconciler {
    /// Create a reconciler; `None` (or a zero period) never fires
    ///
    /// Must be called from within a tokio runtime when enabled.
    pub fn new(period: Option<Duration>) -> Self {
        let timer = period.filter(|p| !p.is_zero()).map(|period| {
            info!("Starting periodic reconciliation (interval: {:?})", period);
            // The initial sync just ran, so the first pass waits a full period
            let mut timer = interval_at(Instant::now() + period, period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            timer
        });

        Self { timer }
    }

    /// Whether a period is configured
    pub fn is_enabled(&self) -> bool {
        self.timer.is_some()
    }

    /// Wait for the next reconciliation pass
    ///
    /// Pends forever when disabled, so it can sit in a `select!` unconditionally.
    pub async fn tick(&mut self) {
        match self.timer.as_mut() {
            Some(timer) => {
                timer.tick().await;
            }
            None => std::future::pending().await,
        }
    }
}
