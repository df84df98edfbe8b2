//! Per-tier single-flight generation.
//!
//! ```text
//! request A ─┐
//! request B ─┼──► GenerationLease ──► one pipeline run per tier
//! request C ─┘          │                      │
//!                       └──── broadcast ◄──────┘
//! ```
//!
//! The first caller for a tier becomes the owner and runs the pipeline;
//! callers arriving while it runs subscribe and receive the same result.
//! Owners hold the lease by `Arc` so they can move into a detached task.
//! Dropping an owner without completing (a panic in that task) closes the
//! channel and waiters see an error.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::debug;

use crate::partition::PartitionCollection;
use crate::tier::QualityTier;

/// Result shared with waiters. Errors travel as their display text.
pub type LeaseResult = Result<Arc<PartitionCollection>, String>;

/// Statistics for monitoring coalescing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LeaseStats {
    /// Callers that ran the pipeline.
    pub owners: u64,
    /// Callers that waited on another caller.
    pub coalesced: u64,
}

/// In-flight generations keyed by tier.
#[derive(Default)]
pub struct GenerationLease {
    in_flight: Mutex<HashMap<QualityTier, broadcast::Sender<LeaseResult>>>,
    stats: Mutex<LeaseStats>,
}

/// Outcome of [`GenerationLease::acquire`].
pub enum LeaseTicket {
    /// Run the pipeline and call [`LeaseOwner::complete`].
    Owner(LeaseOwner),
    /// Wait for the owner's result.
    Waiter(LeaseWaiter),
}

impl GenerationLease {
    pub fn new() -> Self {
        Self::default()
    }

    /// Become the owner of `tier` or subscribe to the running owner.
    pub fn acquire(self: &Arc<Self>, tier: QualityTier) -> LeaseTicket {
        let mut in_flight = self.in_flight.lock();
        let mut stats = self.stats.lock();

        if let Some(tx) = in_flight.get(&tier) {
            stats.coalesced += 1;
            debug!(tier = %tier, "Waiting for in-flight generation");
            LeaseTicket::Waiter(LeaseWaiter { rx: tx.subscribe() })
        } else {
            // Only one value is ever sent per channel.
            let (tx, _rx) = broadcast::channel(1);
            in_flight.insert(tier, tx);
            stats.owners += 1;
            debug!(tier = %tier, "Starting generation");
            LeaseTicket::Owner(LeaseOwner {
                lease: Arc::clone(self),
                tier,
                completed: false,
            })
        }
    }

    pub fn stats(&self) -> LeaseStats {
        *self.stats.lock()
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.lock().len()
    }

    fn finish(&self, tier: QualityTier, result: Option<LeaseResult>) {
        let sender = self.in_flight.lock().remove(&tier);
        if let (Some(tx), Some(result)) = (sender, result) {
            let waiters = tx.receiver_count();
            // No receivers is fine.
            let _ = tx.send(result);
            if waiters > 0 {
                debug!(tier = %tier, waiters, "Broadcast generation result");
            }
        }
    }
}

/// Held by the caller that runs the pipeline.
pub struct LeaseOwner {
    lease: Arc<GenerationLease>,
    tier: QualityTier,
    completed: bool,
}

impl LeaseOwner {
    /// Publish the result to waiters and release the tier.
    pub fn complete(mut self, result: LeaseResult) {
        self.completed = true;
        self.lease.finish(self.tier, Some(result));
    }
}

impl Drop for LeaseOwner {
    fn drop(&mut self) {
        if !self.completed {
            self.lease.finish(self.tier, None);
        }
    }
}

/// Held by callers waiting on another caller's generation.
pub struct LeaseWaiter {
    rx: broadcast::Receiver<LeaseResult>,
}

impl LeaseWaiter {
    pub async fn wait(mut self) -> LeaseResult {
        self.rx
            .recv()
            .await
            .map_err(|_| "generation was abandoned".to_string())?
    }
}
