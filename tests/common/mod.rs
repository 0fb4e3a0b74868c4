// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Common test utilities shared across integration tests.

#![allow(dead_code)] // not every test binary uses every helper

use num_bigint::BigUint;
use sharp_search::{
    CacheConfig, CacheEntryId, CachedComponent, Component, ComponentCache, PackedComponent,
};

/// Pack a component built from the given 1-based variable and clause ids.
pub fn packed(vars: &[u32], clauses: &[u32]) -> PackedComponent {
    PackedComponent::new(&Component::new(vars.to_vec(), clauses.to_vec()))
}

/// A cache initialized with a root component, returning the root's entry id.
pub fn init_cache(table_size: usize) -> (ComponentCache, CacheEntryId) {
    let mut cache = ComponentCache::new(CacheConfig::with_table_size(table_size));
    let mut root = Component::new(vec![1, 2, 3, 4, 5], vec![1, 2]);
    cache.init(&mut root);
    (cache, root.id())
}

/// Store a component under `super_id`, anchored at `stack_pos`.
pub fn store(
    cache: &mut ComponentCache,
    vars: &[u32],
    clauses: &[u32],
    stack_pos: u32,
    super_id: CacheEntryId,
) -> CacheEntryId {
    cache.store_as_entry(
        CachedComponent::new(packed(vars, clauses), stack_pos),
        super_id,
    )
}

/// Store a component and immediately finalize its count.
pub fn store_solved(
    cache: &mut ComponentCache,
    vars: &[u32],
    clauses: &[u32],
    stack_pos: u32,
    super_id: CacheEntryId,
    count: u64,
) -> CacheEntryId {
    let id = store(cache, vars, clauses, stack_pos, super_id);
    cache.store_value_of(id, BigUint::from(count));
    id
}

/// Pop the frame anchoring `id`, making the entry deletable.
pub fn pop_frame(cache: &mut ComponentCache, id: CacheEntryId) {
    cache.entry_mut(id).erase_component_stack_id();
}
