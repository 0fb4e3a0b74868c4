// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Cache sizing configuration.
//!
//! The eviction *policy* (when to sweep, when to grow) lives in the driver;
//! the cache only needs its table geometry and a memory threshold hint the
//! driver can consult. Defaults match a typical desktop search run; tests use
//! tiny tables to force hash collisions deterministically.

/// Default number of hash table slots.
pub const DEFAULT_TABLE_SIZE: usize = 1 << 20;

/// Default memory threshold hint: 4 GiB.
pub const DEFAULT_MEMORY_THRESHOLD_BYTES: u64 = 4 << 30;

/// Sizing parameters for a [`crate::cache::ComponentCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Number of slots in the hash table. Entry hash keys are reduced modulo
    /// this value, so it must be non-zero.
    pub table_size: usize,

    /// Memory usage level at which the driver should consider running
    /// [`crate::cache::ComponentCache::delete_entries`]. Advisory only; the
    /// cache itself never evicts spontaneously.
    pub memory_threshold_bytes: u64,
}

impl CacheConfig {
    /// A configuration with the given table size and default threshold.
    ///
    /// # Panics
    ///
    /// Panics if `table_size` is zero.
    pub fn with_table_size(table_size: usize) -> Self {
        assert!(table_size > 0, "hash table must have at least one slot");
        Self {
            table_size,
            ..Self::default()
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            table_size: DEFAULT_TABLE_SIZE,
            memory_threshold_bytes: DEFAULT_MEMORY_THRESHOLD_BYTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.table_size, DEFAULT_TABLE_SIZE);
        assert_eq!(config.memory_threshold_bytes, DEFAULT_MEMORY_THRESHOLD_BYTES);
    }

    #[test]
    fn test_with_table_size() {
        let config = CacheConfig::with_table_size(8);
        assert_eq!(config.table_size, 8);
        assert_eq!(config.memory_threshold_bytes, DEFAULT_MEMORY_THRESHOLD_BYTES);
    }

    #[test]
    #[should_panic(expected = "at least one slot")]
    fn test_zero_table_size_rejected() {
        let _ = CacheConfig::with_table_size(0);
    }
}
