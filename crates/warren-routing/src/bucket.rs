//! A single Kademlia bucket: up to `K` entries, LRU-ordered.

use std::collections::VecDeque;

use warren_core::Address;

pub const K: usize = 20;

/// A routing-table entry. `last_seen` is a Unix timestamp (seconds),
/// supplied by the caller's [`warren_core::time::Clock`] so TTL
/// expiry can be tested deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Drop {
    pub addr: Address,
    pub last_seen: u64,
}

impl Drop {
    pub fn is_expired(&self, now: u64, ttl_secs: u64) -> bool {
        now.saturating_sub(self.last_seen) > ttl_secs
    }
}

/// Outcome of inserting into a full bucket.
#[derive(Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The address was new and the bucket had room; it is now the MRU entry.
    Inserted,
    /// The address was already present; its `last_seen` was refreshed
    /// and it moved to the MRU position.
    Refreshed,
    /// The bucket is full and its LRU entry has not expired. The
    /// caller should probe the LRU entry via the replacement policy
    /// instead of inserting directly.
    Full { lru: Drop },
}

/// An LRU-ordered bucket holding at most [`K`] drops, all of which
/// share the same bit length of XOR distance from the table's owner.
#[derive(Debug, Default)]
pub struct Bucket {
    entries: VecDeque<Drop>,
}

impl Bucket {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= K
    }

    pub fn contains(&self, addr: &Address) -> bool {
        self.entries.iter().any(|d| d.addr == *addr)
    }

    /// Entries from least- to most-recently-seen.
    pub fn entries(&self) -> impl Iterator<Item = &Drop> {
        self.entries.iter()
    }

    pub fn lru(&self) -> Option<Drop> {
        self.entries.front().copied()
    }

    fn touch(&mut self, addr: Address, now: u64) {
        if let Some(pos) = self.entries.iter().position(|d| d.addr == addr) {
            self.entries.remove(pos);
        }
        self.entries.push_back(Drop {
            addr,
            last_seen: now,
        });
    }

    /// Attempts to record a sighting of `addr`. See [`InsertOutcome`].
    pub fn insert(&mut self, addr: Address, now: u64) -> InsertOutcome {
        if self.contains(&addr) {
            self.touch(addr, now);
            return InsertOutcome::Refreshed;
        }
        if !self.is_full() {
            self.entries.push_back(Drop {
                addr,
                last_seen: now,
            });
            return InsertOutcome::Inserted;
        }
        InsertOutcome::Full {
            lru: self.lru().expect("full bucket has an LRU entry"),
        }
    }

    /// Drops the LRU entry and inserts `addr` in its place, used after
    /// a failed replacement probe.
    pub fn replace_lru(&mut self, addr: Address, now: u64) {
        self.entries.pop_front();
        self.entries.push_back(Drop {
            addr,
            last_seen: now,
        });
    }

    pub fn remove(&mut self, addr: &Address) -> bool {
        if let Some(pos) = self.entries.iter().position(|d| d.addr == *addr) {
            self.entries.remove(pos);
            true
        } else {
            false
        }
    }
}
