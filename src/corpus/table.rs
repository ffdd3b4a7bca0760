//! Sharded concurrent tables (C3, C4): a 64-bit hash to count map and a
//! write-once hash to compact-encoding map.
//!
//! A single mutex around one big `HashMap` serializes every worker on every
//! position, which is disastrous once the thread count gets anywhere near a
//! modern core count. Splitting the key space into shards, each behind its
//! own [`std::sync::Mutex`], means two threads touching different keys never
//! contend -- the shard count just needs to be large enough that collisions
//! between distinct in-flight keys are statistically negligible at the
//! planner's chunking granularity. A general-purpose lock crate is not
//! pulled in for this: the locking here is the component's own invariant
//! (atomic insert-or-increment, write-once insert), not an ambient concern.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Mutex;

use crate::chess::position::Encoded;

/// Number of shards in [`CountTable`] and [`CanonicalTable`], chosen from
/// the `2^6`-`2^8` range the design calls for.
const SHARD_COUNT: usize = 128;
const SHARD_SELECTOR_SHIFT: u32 = u64::BITS - SHARD_COUNT.ilog2();

fn shard_index(key: u64) -> usize {
    (key >> SHARD_SELECTOR_SHIFT) as usize
}

/// Concurrent `hash -> occurrence count` map (C3). The only mutating
/// operation exposed is [`CountTable::increment_or_insert`]; there is no
/// general `get`/`set`, so every caller's view of the atomicity contract is
/// the same one the table itself provides.
#[derive(Debug)]
pub struct CountTable {
    shards: Vec<Mutex<HashMap<u64, u64>>>,
}

impl Default for CountTable {
    fn default() -> Self {
        Self::new()
    }
}

impl CountTable {
    #[must_use]
    pub fn new() -> Self {
        Self {
            shards: (0..SHARD_COUNT).map(|_| Mutex::new(HashMap::new())).collect(),
        }
    }

    /// Atomically inserts `(key, 1)` if absent, returning `(true, 1)`, or
    /// increments the existing count by one, returning `(false, new_value)`.
    pub fn increment_or_insert(&self, key: u64) -> (bool, u64) {
        let mut shard = self.shards[shard_index(key)].lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        match shard.entry(key) {
            Entry::Vacant(entry) => {
                let _ = entry.insert(1);
                (true, 1)
            }
            Entry::Occupied(mut entry) => {
                *entry.get_mut() += 1;
                (false, *entry.get())
            }
        }
    }

    /// Looks up the current count for `key`. Intended for use after all
    /// workers have joined, when the table is effectively read-only, though
    /// nothing prevents calling it mid-run.
    #[must_use]
    pub fn get(&self, key: u64) -> Option<u64> {
        let shard = self.shards[shard_index(key)].lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        shard.get(&key).copied()
    }
}

/// Concurrent `hash -> compact encoding` map (C4), write-once per key (C4).
#[derive(Debug)]
pub struct CanonicalTable {
    shards: Vec<Mutex<HashMap<u64, Encoded>>>,
}

impl Default for CanonicalTable {
    fn default() -> Self {
        Self::new()
    }
}

impl CanonicalTable {
    #[must_use]
    pub fn new() -> Self {
        Self {
            shards: (0..SHARD_COUNT).map(|_| Mutex::new(HashMap::new())).collect(),
        }
    }

    /// Inserts `(key, encoding)` unless `key` is already present, in which
    /// case the call is silently discarded.
    pub fn try_insert(&self, key: u64, encoding: Encoded) {
        let mut shard = self.shards[shard_index(key)].lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let _ = shard.entry(key).or_insert(encoding);
    }

    /// Collects every `(key, encoding)` pair. Meant to be called once, after
    /// every worker has joined.
    #[must_use]
    pub fn entries(&self) -> Vec<(u64, Encoded)> {
        self.shards
            .iter()
            .flat_map(|shard| {
                let shard = shard.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
                shard.iter().map(|(key, encoding)| (*key, *encoding)).collect::<Vec<_>>()
            })
            .collect()
    }
}
