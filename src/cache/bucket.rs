// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Hash-table collision chains.
//!
//! A [`CacheBucket`] holds the ids of all entries whose hash keys map to the
//! same table slot. Iteration order is insertion order, but only membership
//! is semantically meaningful: lookups scan the whole bucket with exact
//! packed comparison anyway. Buckets are expected to stay short when the
//! hash function is adequate, so removal is a linear scan by value.

use crate::cache::entry::CacheEntryId;

/// A resizable list of entry ids sharing one hash slot.
#[derive(Debug, Default, Clone)]
pub struct CacheBucket {
    entries: Vec<CacheEntryId>,
}

impl CacheBucket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry id to the chain.
    pub fn push(&mut self, id: CacheEntryId) {
        self.entries.push(id);
    }

    /// Remove an entry id from the chain, if present.
    ///
    /// Uses swap-removal: order within the bucket carries no meaning.
    /// Returns whether the id was found.
    pub fn remove(&mut self, id: CacheEntryId) -> bool {
        match self.entries.iter().position(|&e| e == id) {
            Some(pos) => {
                self.entries.swap_remove(pos);
                true
            }
            None => false,
        }
    }

    /// Iterate over the entry ids in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = CacheEntryId> + '_ {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bytes held by this bucket, for aggregate memory accounting.
    pub fn bytes_memory_usage(&self) -> usize {
        std::mem::size_of::<CacheBucket>()
            + self.entries.capacity() * std::mem::size_of::<CacheEntryId>()
    }
}
