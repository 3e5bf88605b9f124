//! Bucket replacement maintenance.
//!
//! A full bucket whose LRU entry has not expired is left untouched on
//! a fresh sighting; otherwise the LRU entry is probed and only
//! replaced if the probe fails. The probe itself is injected as a
//! [`Pinger`] so this crate never depends on the service/dispatcher
//! layer that actually knows how to send a PING — breaking what would
//! otherwise be a cyclic dependency between routing and services.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};
use warren_core::time::Clock;
use warren_core::Address;

use crate::table::RoutingTable;

pub const DEFAULT_QUEUE_DEPTH: usize = 10;
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 10;

#[async_trait]
pub trait Pinger: Send + Sync {
    /// Probes `addr`, returning `true` if it responded.
    async fn ping(&self, addr: Address) -> bool;
}

struct Candidate {
    incoming: Address,
}

/// A bounded queue of pending bucket-replacement probes, drained by a
/// single background task.
pub struct ReplacementTask {
    tx: mpsc::Sender<Candidate>,
}

impl ReplacementTask {
    /// Spawns the background worker. `pinger` is invoked at most once
    /// per queued candidate, with `probe_timeout` bounding how long a
    /// stalled probe can occupy the worker.
    pub fn spawn(
        table: Arc<RoutingTable>,
        clock: Arc<dyn Clock>,
        pinger: Arc<dyn Pinger>,
        probe_timeout: Duration,
    ) -> Self {
        let (tx, mut rx) = mpsc::channel::<Candidate>(DEFAULT_QUEUE_DEPTH);

        tokio::spawn(async move {
            while let Some(candidate) = rx.recv().await {
                let Some(lru) = table.lru_of_bucket(&candidate.incoming) else {
                    continue;
                };
                let now = clock.unix_secs();
                if !lru.is_expired(now, 300) {
                    // Someone else already refreshed it; nothing to do.
                    continue;
                }
                let alive = timeout(probe_timeout, pinger.ping(lru.addr))
                    .await
                    .unwrap_or(false);
                if alive {
                    tracing::debug!(addr = %lru.addr, "lru probe succeeded, bucket unchanged");
                } else {
                    tracing::debug!(addr = %lru.addr, new = %candidate.incoming, "lru probe failed, replacing");
                    table.replace_lru_for(candidate.incoming, now);
                }
            }
        });

        Self { tx }
    }

    /// Queues `incoming` for consideration against the LRU entry of
    /// its own bucket. Drops the candidate silently if the queue is
    /// full, matching the bounded-effort nature of maintenance traffic.
    pub fn queue(&self, incoming: Address) {
        let _ = self.tx.try_send(Candidate { incoming });
    }
}
