//! Accessor cache
//!
//! One compiled accessor per member descriptor. Compilation runs outside
//! the map's locks, so a slow compile never holds up other descriptors.

use std::sync::Arc;

use crate::compiler::{AccessorCompiler, CompiledAccessor};
use crate::descriptor::MemberDescriptor;
use crate::memo::Memo;
use crate::options::CacheOptions;
use crate::stats::{CacheStats, CacheStatsSnapshot};

/// Memoizing front for the accessor compiler
pub struct AccessorCache {
    compiler: AccessorCompiler,
    accessors: Memo<MemberDescriptor, Arc<CompiledAccessor>>,
}

impl AccessorCache {
    /// Create a cache with default options
    pub fn new() -> Self {
        Self::with_options(&CacheOptions::default())
    }

    /// Create a cache
    pub fn with_options(options: &CacheOptions) -> Self {
        let stats = Arc::new(CacheStats::new(options.collect_stats));
        tracing::debug!(capacity = options.accessor_capacity, "creating accessor cache");
        Self {
            compiler: AccessorCompiler::new(),
            accessors: Memo::new(
                options.accessor_capacity,
                options.effective_shard_amount(),
                stats,
            ),
        }
    }

    /// Get the compiled accessor for a descriptor, compiling it on first use.
    ///
    /// Every caller receives the same shared accessor, even when several
    /// threads compiled it concurrently.
    pub fn get_accessor(&self, descriptor: &MemberDescriptor) -> Arc<CompiledAccessor> {
        self.accessors
            .get_or_insert_with(descriptor.clone(), || Arc::new(self.compiler.compile(descriptor)))
    }

    /// Check if an accessor has been compiled for `descriptor`
    pub fn contains(&self, descriptor: &MemberDescriptor) -> bool {
        self.accessors.contains_key(descriptor)
    }

    /// Number of compiled accessors
    pub fn len(&self) -> usize {
        self.accessors.len()
    }

    /// Check if nothing has been compiled
    pub fn is_empty(&self) -> bool {
        self.accessors.is_empty()
    }

    /// Current hit/miss counters; misses equal compilations
    pub fn stats(&self) -> CacheStatsSnapshot {
        self.accessors.stats().snapshot()
    }
}

impl Default for AccessorCache {
    fn default() -> Self {
        Self::new()
    }
}
