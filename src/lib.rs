// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Component cache for an exact model-counting (#SAT) search engine.
//!
//! An exact model counter recursively decomposes a constraint formula into
//! independent connected components, counts each component's solutions, and
//! multiplies the results. The expensive part of that recursion is re-solving
//! components it has already seen; this crate is the memoization cache that
//! avoids it.
//!
//! # Architecture
//!
//! The cache combines four mechanisms:
//!
//! - A **packed key**: each component is serialized into a compact,
//!   hashable, exactly-comparable word array
//!   ([`component::packed::PackedComponent`]) that also carries the
//!   component's exact solution count ([`num_bigint::BigUint`]) once known.
//! - A **custom hash table** of open collision chains
//!   ([`cache::bucket::CacheBucket`]) over those variable-length keys,
//!   resolved by linear scan with exact comparison.
//! - An **entry arena with slot recycling**: entries are addressed by plain
//!   integer ids ([`cache::entry::CacheEntryId`]); erased slots return to a
//!   free list before the arena grows.
//! - A **descendant tree** embedded in the fixed-size entries
//!   (father/first-descendant/next-sibling ids, no separate node
//!   allocation), mirroring the recursion's split structure. It lets the
//!   cache distinguish entries the live recursion still depends on from mere
//!   pollution, and bounds cleanup on backtrack to the popped subtree.
//!
//! The search engine itself, component discovery, and the driver are
//! external collaborators; [`component::Component`] and
//! [`stack::StackLevel`] are the narrow interfaces the cache consumes from
//! them.
//!
//! # Lifecycle of an entry
//!
//! ```text
//! manage_new_component  -- miss: caller solves the component
//!        |
//!   store_as_entry      -- anchored to the creating stack frame
//!        |
//!   store_value_of      -- exact count finalized
//!        |
//!   erase_component_stack_id   -- frame popped: entry becomes deletable
//!        |
//!   clean_pollutions_involving / delete_entries -- reclaimed when stale
//! ```
//!
//! The cache is single-threaded and recursion-bound: it is mutated only by
//! the one search thread, in lock-step with that thread's own recursion
//! stack.

pub mod cache;
pub mod component;
pub mod config;
pub mod error;
pub mod stack;
pub mod statistics;

// Re-export commonly used types
pub use cache::entry::{CacheEntryId, CachedComponent, NIL_ENTRY};
pub use cache::ComponentCache;
pub use component::{Component, PackedComponent};
pub use config::CacheConfig;
pub use error::CacheError;
pub use stack::StackLevel;
pub use statistics::{CacheCounter, DataAndStatistics};
