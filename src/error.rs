// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Cache error types.
//!
//! Almost every failure inside the cache is a contract violation - indexing
//! an erased slot, clearing an anchored entry, re-finalizing a count - and
//! those abort with a panic: they mean the hash and tree indexes have
//! diverged, and no further operation is safe. The one condition a driver
//! may legitimately want to handle, a stale or out-of-range entry handle, is
//! exposed as a checked error through
//! [`crate::cache::ComponentCache::try_entry`].

use crate::cache::entry::CacheEntryId;
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheError {
    /// The id does not index any slot in the entry arena.
    #[error("cache entry id {0} is out of range")]
    IdOutOfRange(CacheEntryId),

    /// The id indexes a slot whose entry has been erased.
    #[error("cache entry id {0} refers to an erased entry")]
    StaleEntry(CacheEntryId),
}
