//! Lock-free memoization table
//!
//! `Memo` maps a key to a value computed at most once per key in the common
//! case. A miss computes the value without holding any lock, then inserts it
//! only if the slot is still empty. When two threads race on the same key
//! both compute, the first insert wins and the loser's value is dropped, so
//! every caller ends up with the stored winner. Keys never leave the table.

use std::hash::{BuildHasherDefault, Hash};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rustc_hash::FxHasher;

use crate::stats::CacheStats;

type FxBuildHasher = BuildHasherDefault<FxHasher>;

/// Concurrent insert-once map
pub struct Memo<K, V> {
    map: DashMap<K, V, FxBuildHasher>,
    stats: Arc<CacheStats>,
}

impl<K, V> Memo<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create a table with room for `capacity` entries.
    ///
    /// `shard_amount` must be a power of two greater than one; `None` uses
    /// dashmap's default.
    pub fn new(capacity: usize, shard_amount: Option<usize>, stats: Arc<CacheStats>) -> Self {
        let map = match shard_amount {
            Some(shards) => DashMap::with_capacity_and_hasher_and_shard_amount(
                capacity,
                FxBuildHasher::default(),
                shards,
            ),
            None => DashMap::with_capacity_and_hasher(capacity, FxBuildHasher::default()),
        };
        Self { map, stats }
    }

    /// Get the stored value without computing
    pub fn get(&self, key: &K) -> Option<V> {
        self.map.get(key).map(|entry| entry.value().clone())
    }

    /// Get the stored value, computing and storing it on a miss
    pub fn get_or_insert_with(&self, key: K, compute: impl FnOnce() -> V) -> V {
        match self.get_or_try_insert_with(key, || Ok::<V, std::convert::Infallible>(compute())) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    /// Like `get_or_insert_with` for fallible computations.
    ///
    /// An error is returned to the caller and nothing is stored, so the next
    /// query computes again.
    pub fn get_or_try_insert_with<E>(
        &self,
        key: K,
        compute: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        // The read guard must be released before `entry` locks the shard
        let cached = self.get(&key);
        if let Some(value) = cached {
            self.stats.record_hit();
            return Ok(value);
        }

        self.stats.record_miss();
        let computed = compute()?;

        match self.map.entry(key) {
            Entry::Occupied(occupied) => {
                self.stats.record_discard();
                tracing::debug!("memo insert lost race; reusing stored value");
                Ok(occupied.get().clone())
            }
            Entry::Vacant(vacant) => Ok(vacant.insert(computed).value().clone()),
        }
    }

    /// Check if a value is stored for `key`
    pub fn contains_key(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if nothing is stored
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Counters shared with the owning cache
    pub fn stats(&self) -> &Arc<CacheStats> {
        &self.stats
    }
}
