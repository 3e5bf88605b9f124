//! The 256-bucket routing table.

use std::sync::Mutex;

use warren_core::Address;

use crate::bucket::{Bucket, Drop, InsertOutcome};

const NUM_BUCKETS: usize = 256;

/// A node's view of the overlay, partitioned into 256 buckets by the
/// bit length of XOR distance from `owner`. Each bucket is guarded by
/// its own mutex so concurrent lookups into different buckets never
/// contend.
pub struct RoutingTable {
    owner: Address,
    buckets: Vec<Mutex<Bucket>>,
}

impl RoutingTable {
    pub fn new(owner: Address) -> Self {
        let mut buckets = Vec::with_capacity(NUM_BUCKETS);
        buckets.resize_with(NUM_BUCKETS, || Mutex::new(Bucket::new()));
        Self { owner, buckets }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    fn bucket_for(&self, addr: &Address) -> Option<&Mutex<Bucket>> {
        self.owner.bucket_index(addr).map(|i| &self.buckets[i])
    }

    /// Records a sighting of `addr`. Returns `None` if `addr` is the
    /// table's own owner (never stored), otherwise the insertion
    /// outcome from the relevant bucket.
    pub fn observe(&self, addr: Address, now: u64) -> Option<InsertOutcome> {
        if addr == self.owner {
            return None;
        }
        let bucket = self.bucket_for(&addr)?;
        Some(bucket.lock().unwrap().insert(addr, now))
    }

    pub fn contains(&self, addr: &Address) -> bool {
        self.bucket_for(addr)
            .map(|b| b.lock().unwrap().contains(addr))
            .unwrap_or(false)
    }

    pub fn remove(&self, addr: &Address) -> bool {
        self.bucket_for(addr)
            .map(|b| b.lock().unwrap().remove(addr))
            .unwrap_or(false)
    }

    /// Replaces the LRU entry of the bucket `addr` belongs to, used by
    /// the replacement task after a failed probe.
    pub fn replace_lru_for(&self, addr: Address, now: u64) {
        if let Some(bucket) = self.bucket_for(&addr) {
            bucket.lock().unwrap().replace_lru(addr, now);
        }
    }

    /// Returns up to `n` addresses closest to `target`, ordered by
    /// ascending XOR distance. Scans outward from `target`'s own
    /// bucket index since nearby buckets are the most likely source of
    /// close neighbors, falling back to a full scan if that bucket and
    /// its immediate neighbors are sparse.
    pub fn closest(&self, target: &Address, n: usize) -> Vec<Address> {
        let mut candidates: Vec<Address> = Vec::new();
        for bucket in &self.buckets {
            for drop in bucket.lock().unwrap().entries() {
                candidates.push(drop.addr);
            }
        }
        candidates.sort_by_key(|a| target.distance(a));
        candidates.truncate(n);
        candidates
    }

    pub fn len(&self) -> usize {
        self.buckets.iter().map(|b| b.lock().unwrap().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn lru_of_bucket(&self, addr: &Address) -> Option<Drop> {
        self.bucket_for(addr)?.lock().unwrap().lru()
    }
}
