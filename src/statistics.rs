// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Statistics
//!
//! Run counters for the component cache. Purely observational: the cache
//! reports lookups, hits, stores and erases here, and the driver reads them
//! for progress output; nothing in the cache's behavior depends on them.

use crate::component::PackedComponent;
use strum::EnumCount;
use strum_macros::EnumCount as EnumCountMacro;

#[derive(EnumCountMacro, Copy, Clone, Debug)]
#[repr(u8)]
pub enum CacheCounter {
    LookUps,
    Hits,
    Stores,
    Erases,
}

/// Counters and memory accounting for one cache instance.
#[derive(Debug, Default)]
pub struct DataAndStatistics {
    stats: [u64; CacheCounter::COUNT],

    /// Total packed words currently stored across live entries.
    sum_size_cached_components: u64,

    /// Total packed words of all components that produced cache hits.
    sum_size_cache_hits: u64,

    /// Last value computed by
    /// [`crate::cache::ComponentCache::recompute_bytes_memory_usage`].
    cache_bytes_memory_usage: u64,
}

impl DataAndStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment the specified counter by 1.
    pub fn increment(&mut self, counter: CacheCounter) {
        self.stats[counter as usize] += 1;
    }

    /// Get the current value of the specified counter.
    pub fn get(&self, counter: CacheCounter) -> u64 {
        self.stats[counter as usize]
    }

    /// Record a cache hit on the given packed component.
    pub fn incorporate_cache_hit(&mut self, packed: &PackedComponent) {
        self.increment(CacheCounter::Hits);
        self.sum_size_cache_hits += packed.data_size() as u64;
    }

    /// Record the storage of a new entry.
    pub fn incorporate_cache_store(&mut self, packed: &PackedComponent) {
        self.increment(CacheCounter::Stores);
        self.sum_size_cached_components += packed.data_size() as u64;
    }

    /// Record the erasure of an entry.
    pub fn incorporate_cache_erase(&mut self, packed: &PackedComponent) {
        self.increment(CacheCounter::Erases);
        self.sum_size_cached_components = self
            .sum_size_cached_components
            .saturating_sub(packed.data_size() as u64);
    }

    /// Total packed words currently held by live entries.
    pub fn sum_size_cached_components(&self) -> u64 {
        self.sum_size_cached_components
    }

    /// Total packed words of all components answered from the cache.
    pub fn sum_size_cache_hits(&self) -> u64 {
        self.sum_size_cache_hits
    }

    /// Fraction of lookups that hit, in `[0, 1]`.
    pub fn hit_ratio(&self) -> f64 {
        let lookups = self.get(CacheCounter::LookUps);
        if lookups == 0 {
            return 0.0;
        }
        self.get(CacheCounter::Hits) as f64 / lookups as f64
    }

    /// The most recently recomputed cache memory usage, in bytes.
    pub fn cache_bytes_memory_usage(&self) -> u64 {
        self.cache_bytes_memory_usage
    }

    pub(crate) fn set_cache_bytes_memory_usage(&mut self, bytes: u64) {
        self.cache_bytes_memory_usage = bytes;
    }
}
