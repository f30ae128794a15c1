//! Cache configuration

use serde::{Deserialize, Serialize};

/// Default initial capacity of each lookup table
pub const DEFAULT_LOOKUP_CAPACITY: usize = 64;

/// Default initial capacity of the accessor table
pub const DEFAULT_ACCESSOR_CAPACITY: usize = 64;

/// Options for [`LookupCache`](crate::LookupCache),
/// [`AccessorCache`](crate::AccessorCache) and
/// [`FastReflection`](crate::FastReflection)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheOptions {
    /// Initial capacity of each lookup table
    pub lookup_capacity: usize,

    /// Initial capacity of the accessor table
    pub accessor_capacity: usize,

    /// Shard count for the concurrent maps (power of two, > 1)
    pub shard_amount: Option<usize>,

    /// Record hit/miss counters
    pub collect_stats: bool,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            lookup_capacity: DEFAULT_LOOKUP_CAPACITY,
            accessor_capacity: DEFAULT_ACCESSOR_CAPACITY,
            shard_amount: None,
            collect_stats: true,
        }
    }
}

impl CacheOptions {
    /// Parse options from a TOML document; missing keys take defaults
    pub fn from_toml_str(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }

    /// Set the lookup table capacity
    pub fn with_lookup_capacity(mut self, capacity: usize) -> Self {
        self.lookup_capacity = capacity;
        self
    }

    /// Set the accessor table capacity
    pub fn with_accessor_capacity(mut self, capacity: usize) -> Self {
        self.accessor_capacity = capacity;
        self
    }

    /// Set the shard count
    pub fn with_shard_amount(mut self, shards: usize) -> Self {
        self.shard_amount = Some(shards);
        self
    }

    /// Enable or disable counters
    pub fn with_stats(mut self, enabled: bool) -> Self {
        self.collect_stats = enabled;
        self
    }

    /// Shard count to hand to the maps; invalid counts fall back to the default
    pub fn effective_shard_amount(&self) -> Option<usize> {
        match self.shard_amount {
            Some(n) if n > 1 && n.is_power_of_two() => Some(n),
            Some(n) => {
                tracing::warn!(shard_amount = n, "ignoring shard amount that is not a power of two > 1");
                None
            }
            None => None,
        }
    }
}
