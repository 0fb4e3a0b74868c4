// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Cache entries: packed components plus pollution-management structure.
//!
//! A [`CachedComponent`] wraps a [`PackedComponent`] with the bookkeeping
//! the cache needs to reclaim stale entries:
//!
//! - `component_stack_id` anchors the entry to the live recursion stack.
//!   While non-zero, some active stack frame still depends on the entry and
//!   it must not be destroyed.
//! - `father` / `first_descendant` / `next_sibling` embed each entry in a
//!   descendant tree mirroring the recursion's split structure. Children are
//!   reached by following `first_descendant` and then the singly linked
//!   `next_sibling` chain; there is no previous-sibling link, so removing a
//!   non-first child costs a linear scan of its siblings. That trade-off
//!   saves one id per entry and only bites on backtrack, never on lookup.
//!
//! Tree links are plain data here; the cache is responsible for keeping them
//! consistent (see [`crate::cache::ComponentCache`]).

use crate::component::PackedComponent;
use num_bigint::BigUint;

/// Identifier of a slot in the cache's entry arena.
///
/// Ids are array indices, not references: the descendant tree is encoded as
/// id triples inside fixed-size entries, so no per-node allocation and no
/// ownership cycles.
pub type CacheEntryId = u32;

/// The reserved "no entry" id. No live entry ever has this id.
pub const NIL_ENTRY: CacheEntryId = 0;

/// A packed component stored in the cache, with anchoring and tree links.
#[derive(Debug, Clone)]
pub struct CachedComponent {
    packed: PackedComponent,

    /// Position in the engine's recursion stack that depends on this entry,
    /// or 0 if no live frame does (in which case the entry is deletable).
    component_stack_id: u32,

    father: CacheEntryId,
    first_descendant: CacheEntryId,
    next_sibling: CacheEntryId,
}

impl CachedComponent {
    /// Wrap a packed component for storage, anchored at the given stack
    /// position.
    ///
    /// New entries start anchored: the frame that produced the component is
    /// still live, and its correctness depends on the entry existing when the
    /// solved count is written back.
    pub fn new(packed: PackedComponent, component_stack_id: u32) -> Self {
        Self {
            packed,
            component_stack_id,
            father: NIL_ENTRY,
            first_descendant: NIL_ENTRY,
            next_sibling: NIL_ENTRY,
        }
    }

    /// The packed identity of this entry.
    pub fn packed(&self) -> &PackedComponent {
        &self.packed
    }

    /// True iff no live recursion frame depends on this entry.
    ///
    /// Every eviction decision goes through this test.
    pub fn deletable(&self) -> bool {
        self.component_stack_id == 0
    }

    /// The recursion stack position anchoring this entry, 0 if none.
    pub fn component_stack_id(&self) -> u32 {
        self.component_stack_id
    }

    /// Anchor this entry to a recursion stack position.
    ///
    /// Called exactly when the engine pushes the corresponding frame.
    pub fn set_component_stack_id(&mut self, id: u32) {
        self.component_stack_id = id;
    }

    /// Detach this entry from the recursion stack.
    ///
    /// Called exactly when the engine pops the corresponding frame; the entry
    /// becomes a candidate for pollution cleanup.
    pub fn erase_component_stack_id(&mut self) {
        self.component_stack_id = 0;
    }

    /// Release the packed payload.
    ///
    /// # Panics
    ///
    /// Panics if the entry is still anchored. Clearing an entry that a live
    /// frame depends on would corrupt the search, so this is a fatal contract
    /// violation rather than a recoverable condition.
    pub fn clear(&mut self) {
        assert!(
            self.component_stack_id == 0,
            "clearing a cache entry still anchored at stack position {}",
            self.component_stack_id
        );
        self.packed.clear_payload();
    }

    /// Shorthand for the packed hash key.
    pub fn hashkey(&self) -> u64 {
        self.packed.hashkey()
    }

    /// The entry's exact solution count, `None` while unsolved.
    pub fn model_count(&self) -> Option<&BigUint> {
        self.packed.model_count()
    }

    /// Finalize the entry's solution count. Panics on re-finalization.
    pub fn set_model_count(&mut self, model_count: BigUint) {
        self.packed.set_model_count(model_count);
    }

    /// Total bytes attributable to this entry: fixed overhead plus the packed
    /// payload and the stored model count.
    pub fn size_in_bytes(&self) -> usize {
        std::mem::size_of::<CachedComponent>() + self.packed.bytes_memory_usage()
    }

    // Descendant tree links. Pure data: callers maintain the invariants.

    pub fn father(&self) -> CacheEntryId {
        self.father
    }

    pub fn set_father(&mut self, father: CacheEntryId) {
        self.father = father;
    }

    pub fn first_descendant(&self) -> CacheEntryId {
        self.first_descendant
    }

    pub fn set_first_descendant(&mut self, descendant: CacheEntryId) {
        self.first_descendant = descendant;
    }

    pub fn next_sibling(&self) -> CacheEntryId {
        self.next_sibling
    }

    pub fn set_next_sibling(&mut self, sibling: CacheEntryId) {
        self.next_sibling = sibling;
    }
}
