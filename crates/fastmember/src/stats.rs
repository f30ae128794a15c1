//! Cache hit/miss accounting

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Atomic counters shared by the memo tables of one cache
#[derive(Debug)]
pub struct CacheStats {
    enabled: bool,
    hits: AtomicU64,
    misses: AtomicU64,
    discarded: AtomicU64,
}

impl CacheStats {
    /// Create counters; when `enabled` is false every record is a no-op
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            discarded: AtomicU64::new(0),
        }
    }

    /// Whether counters are being recorded
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[inline]
    pub(crate) fn record_hit(&self) {
        if self.enabled {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub(crate) fn record_miss(&self) {
        if self.enabled {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// A computed value lost the insert race and was dropped
    #[inline]
    pub(crate) fn record_discard(&self) {
        if self.enabled {
            self.discarded.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Copy the current counter values
    pub fn snapshot(&self) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
        }
    }
}

impl Default for CacheStats {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Point-in-time copy of [`CacheStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStatsSnapshot {
    /// Queries answered from the cache
    pub hits: u64,
    /// Queries that had to compute (source call or compile)
    pub misses: u64,
    /// Computations thrown away because another thread stored first
    pub discarded: u64,
}

impl CacheStatsSnapshot {
    /// Total queries
    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }

    /// Fraction of queries answered from the cache (0.0 when idle)
    pub fn hit_rate(&self) -> f64 {
        let total = self.lookups();
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
