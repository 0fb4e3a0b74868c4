// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! The component cache: hash-indexed memoization of solved sub-problems.
//!
//! Before recursing into a freshly discovered component, the search engine
//! asks the cache whether an identical component has already been counted
//! ([`ComponentCache::manage_new_component`]). On a miss it solves the
//! component itself, storing it first ([`ComponentCache::store_as_entry`])
//! and writing the solved count back later
//! ([`ComponentCache::store_value_of`]).
//!
//! # Two indexes, one arena
//!
//! Entries live in a slot arena (`entry_base`, erased slots recycled through
//! a free list) and are reachable two ways:
//!
//! 1. **Hash table** - buckets of entry ids indexed by
//!    `hashkey % table.len()`, scanned linearly with exact packed comparison.
//!    This is the hot lookup path.
//! 2. **Descendant tree** - father/first-descendant/next-sibling ids
//!    embedded in the entries, mirroring which component was split out of
//!    which. This bounds pollution cleanup on backtrack to exactly the
//!    subtree of the popped frame.
//!
//! The two indexes must never diverge: an entry inserted by
//! [`ComponentCache::store_as_entry`] is simultaneously discoverable through
//! both, and every removal unlinks both before the slot is recycled.
//!
//! # Example
//!
//! ```
//! use num_bigint::BigUint;
//! use sharp_search::cache::entry::CachedComponent;
//! use sharp_search::cache::ComponentCache;
//! use sharp_search::component::{Component, PackedComponent};
//! use sharp_search::config::CacheConfig;
//! use sharp_search::stack::StackLevel;
//!
//! let mut cache = ComponentCache::new(CacheConfig::default());
//! let mut root = Component::new(vec![1, 2, 3], vec![1, 2]);
//! cache.init(&mut root);
//!
//! // The engine splits off a component at stack position 2.
//! let comp = Component::new(vec![1, 2], vec![1]);
//! let packed = PackedComponent::new(&comp);
//! let mut top = StackLevel::new(2);
//!
//! assert!(!cache.manage_new_component(&mut top, &packed)); // miss: solve it
//! let id = cache.store_as_entry(
//!     CachedComponent::new(packed, top.stack_position()),
//!     root.id(),
//! );
//! cache.store_value_of(id, BigUint::from(12u32));
//!
//! // A later, identical component hits and folds the count into its frame.
//! let again = PackedComponent::new(&Component::new(vec![1, 2], vec![1]));
//! let mut later = StackLevel::new(4);
//! assert!(cache.manage_new_component(&mut later, &again));
//! assert_eq!(later.solution_count(), &BigUint::from(12u32));
//! ```

pub mod bucket;
pub mod entry;

use crate::component::{Component, PackedComponent};
use crate::config::CacheConfig;
use crate::error::CacheError;
use crate::stack::StackLevel;
use crate::statistics::{CacheCounter, DataAndStatistics};
use bucket::CacheBucket;
use entry::{CacheEntryId, CachedComponent, NIL_ENTRY};
use num_bigint::BigUint;

/// Memoization cache of packed components, with a descendant tree for
/// pollution cleanup.
///
/// Exclusively owned by one single-threaded search run; every operation runs
/// to completion before the engine proceeds. See the module docs for the
/// overall shape.
#[derive(Debug)]
pub struct ComponentCache {
    /// Entry arena. Slot 0 is permanently empty (`NIL_ENTRY` is reserved);
    /// `None` elsewhere marks an erased slot awaiting reuse.
    entry_base: Vec<Option<CachedComponent>>,

    /// Erased slot ids, reused before the arena grows.
    free_entry_base_slots: Vec<CacheEntryId>,

    /// The hash table. A slot holds `None` until a first entry hashes there.
    table: Vec<Option<CacheBucket>>,

    /// Number of table slots whose bucket has been allocated.
    num_occupied_buckets: usize,

    /// Logical clock, advanced on every store.
    my_time: u64,

    statistics: DataAndStatistics,

    config: CacheConfig,
}

impl ComponentCache {
    /// Create an empty cache with the given sizing.
    ///
    /// # Panics
    ///
    /// Panics if the configured table size is zero.
    pub fn new(config: CacheConfig) -> Self {
        assert!(
            config.table_size > 0,
            "hash table must have at least one slot"
        );
        Self {
            entry_base: vec![None],
            free_entry_base_slots: Vec::new(),
            table: vec![None; config.table_size],
            num_occupied_buckets: 0,
            my_time: 0,
            statistics: DataAndStatistics::new(),
            config,
        }
    }

    /// Reset the cache and store the root component as entry 1.
    ///
    /// The root is anchored at stack position 1 for the lifetime of the run
    /// and is never hash-indexed: nothing ever looks it up, it exists as the
    /// root of the descendant tree. The assigned id is recorded on
    /// `super_comp`.
    pub fn init(&mut self, super_comp: &mut Component) {
        self.entry_base.clear();
        self.entry_base.push(None);
        self.free_entry_base_slots.clear();
        self.table.clear();
        self.table.resize(self.config.table_size, None);
        self.num_occupied_buckets = 0;
        self.my_time = 1;

        let root = CachedComponent::new(PackedComponent::new(super_comp), 1);
        self.statistics.incorporate_cache_store(root.packed());
        self.entry_base.push(Some(root));
        super_comp.set_id(1);

        tracing::debug!(
            table_slots = self.config.table_size,
            "component cache initialized"
        );
    }

    /// Access a live entry. Fatal on a stale or out-of-range id: either one
    /// means the caller holds a handle the cache no longer backs, and the
    /// indexes can no longer be trusted.
    pub fn entry(&self, id: CacheEntryId) -> &CachedComponent {
        match self.try_entry(id) {
            Ok(entry) => entry,
            Err(err) => panic!("{err}"),
        }
    }

    /// Mutable access to a live entry. Fatal on a stale or out-of-range id.
    pub fn entry_mut(&mut self, id: CacheEntryId) -> &mut CachedComponent {
        match self
            .entry_base
            .get_mut(id as usize)
            .ok_or(CacheError::IdOutOfRange(id))
            .and_then(|slot| slot.as_mut().ok_or(CacheError::StaleEntry(id)))
        {
            Ok(entry) => entry,
            Err(err) => panic!("{err}"),
        }
    }

    /// Checked entry access for drivers that may hold stale handles.
    pub fn try_entry(&self, id: CacheEntryId) -> Result<&CachedComponent, CacheError> {
        self.entry_base
            .get(id as usize)
            .ok_or(CacheError::IdOutOfRange(id))?
            .as_ref()
            .ok_or(CacheError::StaleEntry(id))
    }

    /// The entry stored for a component (through its recorded id).
    pub fn entry_for(&self, comp: &Component) -> &CachedComponent {
        self.entry(comp.id())
    }

    /// Whether `id` currently names a live entry.
    pub fn has_entry(&self, id: CacheEntryId) -> bool {
        matches!(self.entry_base.get(id as usize), Some(Some(_)))
    }

    /// Check quickly whether the model count of `packed` is already cached.
    ///
    /// On a hit the stored count is folded into `top`'s running product and
    /// the caller must not re-search the component. On a miss the caller is
    /// expected to solve the component and store it explicitly. A hash
    /// collision without exact equality is ordinary control flow, not an
    /// error; only an exact packed match counts.
    ///
    /// # Panics
    ///
    /// Panics if the matching entry's count has not been finalized. An
    /// identical component cannot be in flight: the recursion that created
    /// the first occurrence would itself have been answered from the cache.
    pub fn manage_new_component(&mut self, top: &mut StackLevel, packed: &PackedComponent) -> bool {
        self.statistics.increment(CacheCounter::LookUps);

        let slot = (packed.hashkey() % self.table.len() as u64) as usize;
        let mut hit = NIL_ENTRY;
        if let Some(bucket) = self.table[slot].as_ref() {
            for id in bucket.iter() {
                if self.entry(id).packed() == packed {
                    hit = id;
                    break;
                }
            }
        }
        if hit == NIL_ENTRY {
            return false;
        }

        let entry = self.entry_base[hit as usize]
            .as_ref()
            .expect("hash table references an erased entry");
        self.statistics.incorporate_cache_hit(entry.packed());
        let count = entry
            .model_count()
            .expect("cache hit on an entry whose model count is not finalized");
        top.include_solution(count);
        true
    }

    /// Store a new entry and link it under its super component.
    ///
    /// The entry arrives already anchored to the recursion-stack position of
    /// the frame that produced it (see [`CachedComponent::new`]). It becomes
    /// the new first descendant of `super_comp_id`, pushing the previous
    /// first descendant along the sibling chain; `NIL_ENTRY` stores a tree
    /// root. After return the entry is discoverable both by hash lookup and
    /// by tree traversal from its father.
    pub fn store_as_entry(
        &mut self,
        ccomp: CachedComponent,
        super_comp_id: CacheEntryId,
    ) -> CacheEntryId {
        self.my_time += 1;
        self.statistics.incorporate_cache_store(ccomp.packed());
        let hashkey = ccomp.hashkey();

        let id = match self.free_entry_base_slots.pop() {
            Some(id) => {
                debug_assert!(self.entry_base[id as usize].is_none());
                self.entry_base[id as usize] = Some(ccomp);
                id
            }
            None => {
                self.entry_base.push(Some(ccomp));
                (self.entry_base.len() - 1) as CacheEntryId
            }
        };

        if super_comp_id != NIL_ENTRY {
            self.entry_mut(id).set_father(super_comp_id);
            self.add_descendant(super_comp_id, id);
        }

        let slot = (hashkey % self.table.len() as u64) as usize;
        if self.table[slot].is_none() {
            self.table[slot] = Some(CacheBucket::new());
            self.num_occupied_buckets += 1;
        }
        self.table[slot]
            .as_mut()
            .expect("bucket allocated above")
            .push(id);

        tracing::trace!(id, super_comp_id, "stored cache entry");
        id
    }

    /// Finalize the model count of entry `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale or the entry was already finalized; both are
    /// programmer errors, not runtime conditions.
    pub fn store_value_of(&mut self, id: CacheEntryId, model_count: BigUint) {
        self.entry_mut(id).set_model_count(model_count);
    }

    /// Unlink entry `id` from the hash table, leaving it in the arena.
    ///
    /// Transient state used inside targeted deletion: between this call and
    /// [`ComponentCache::erase_entry`] the entry is live but appears in no
    /// bucket.
    pub fn remove_from_hash_table(&mut self, id: CacheEntryId) {
        let slot = (self.entry(id).hashkey() % self.table.len() as u64) as usize;
        if let Some(bucket) = self.table[slot].as_mut() {
            bucket.remove(id);
        }
    }

    /// Remove entry `id` from the descendant tree, preserving consistency.
    ///
    /// Splices `id` out of its father's child chain (linear sibling scan;
    /// there is no previous-sibling link), then re-parents `id`'s children
    /// directly onto the father, flattening one level. If `id` was a tree
    /// root its children become roots themselves. Afterwards `id` carries no
    /// tree references and can be handed to [`ComponentCache::erase_entry`].
    pub fn remove_from_descendants_tree(&mut self, id: CacheEntryId) {
        let father = self.entry(id).father();

        if father != NIL_ENTRY {
            if self.entry(father).first_descendant() == id {
                let next = self.entry(id).next_sibling();
                self.entry_mut(father).set_first_descendant(next);
            } else {
                let mut sibling = self.entry(father).first_descendant();
                while sibling != NIL_ENTRY {
                    let next = self.entry(sibling).next_sibling();
                    if next == id {
                        let after = self.entry(id).next_sibling();
                        self.entry_mut(sibling).set_next_sibling(after);
                        break;
                    }
                    sibling = next;
                }
            }
        }

        let mut child = self.entry(id).first_descendant();
        while child != NIL_ENTRY {
            let next_child = self.entry(child).next_sibling();
            self.entry_mut(child).set_father(father);
            if father != NIL_ENTRY {
                let head = self.entry(father).first_descendant();
                self.entry_mut(child).set_next_sibling(head);
                self.entry_mut(father).set_first_descendant(child);
            } else {
                self.entry_mut(child).set_next_sibling(NIL_ENTRY);
            }
            child = next_child;
        }

        let e = self.entry_mut(id);
        e.set_father(NIL_ENTRY);
        e.set_first_descendant(NIL_ENTRY);
        e.set_next_sibling(NIL_ENTRY);
    }

    /// Erase entry `id` from the arena and recycle its slot.
    ///
    /// The caller must already have unlinked the entry from both indexes.
    ///
    /// # Panics
    ///
    /// Panics if the entry is still anchored: a live recursion frame depends
    /// on it, and destroying it would silently corrupt the search.
    pub fn erase_entry(&mut self, id: CacheEntryId) {
        let slot = self
            .entry_base
            .get_mut(id as usize)
            .unwrap_or_else(|| panic!("{}", CacheError::IdOutOfRange(id)));
        let mut entry = slot
            .take()
            .unwrap_or_else(|| panic!("{}", CacheError::StaleEntry(id)));
        self.statistics.incorporate_cache_erase(entry.packed());
        entry.clear();
        self.free_entry_base_slots.push(id);
    }

    /// Prune the now-unreachable parts of the subtree rooted at `id`.
    ///
    /// Called on backtrack, right after the frame that owned `id` was popped
    /// (its stack anchor already cleared). Post-order walk of the subtree:
    /// every node that is deletable and has no surviving children is spliced
    /// out of the tree, unlinked from its bucket and erased. Nodes still
    /// anchored to another live frame survive, together with the chain of
    /// ancestors that keeps them tree-reachable. Cost is proportional to the
    /// popped subtree only.
    pub fn clean_pollutions_involving(&mut self, id: CacheEntryId) {
        debug_assert!(
            self.entry(id).deletable(),
            "pollution cleanup on a still-anchored entry"
        );
        self.prune_subtree(id);
    }

    fn prune_subtree(&mut self, id: CacheEntryId) {
        let mut child = self.entry(id).first_descendant();
        while child != NIL_ENTRY {
            let next = self.entry(child).next_sibling();
            self.prune_subtree(child);
            child = next;
        }

        // Children that survived pruning are still chained under this entry.
        if self.entry(id).deletable() && self.entry(id).first_descendant() == NIL_ENTRY {
            self.remove_from_descendants_tree(id);
            self.remove_from_hash_table(id);
            self.erase_entry(id);
        }
    }

    /// Sweep the whole arena, erasing every deletable entry.
    ///
    /// Invoked by the driver when memory usage crosses its threshold.
    /// Returns whether anything was freed, so the caller can decide to grow
    /// the table instead when the cache is full of anchored entries.
    pub fn delete_entries(&mut self) -> bool {
        let mut freed_any = false;
        for raw_id in 1..self.entry_base.len() {
            let id = raw_id as CacheEntryId;
            let deletable = matches!(&self.entry_base[raw_id], Some(e) if e.deletable());
            if deletable {
                self.remove_from_descendants_tree(id);
                self.remove_from_hash_table(id);
                self.erase_entry(id);
                freed_any = true;
            }
        }
        tracing::debug!(freed_any, "cache sweep finished");
        freed_any
    }

    /// Recompute the cache's total memory footprint from scratch.
    ///
    /// Fixed overhead plus arena, free-list and table capacities, plus every
    /// allocated bucket and live entry. The value is also recorded in the
    /// statistics sink.
    pub fn recompute_bytes_memory_usage(&mut self) -> u64 {
        use std::mem::size_of;

        let mut bytes = (size_of::<ComponentCache>()
            + self.free_entry_base_slots.capacity() * size_of::<CacheEntryId>()
            + self.entry_base.capacity() * size_of::<Option<CachedComponent>>()
            + self.table.capacity() * size_of::<Option<CacheBucket>>())
            as u64;
        for bucket in self.table.iter().flatten() {
            bytes += bucket.bytes_memory_usage() as u64;
        }
        for entry in self.entry_base.iter().flatten() {
            bytes += entry.packed().bytes_memory_usage() as u64;
        }

        self.statistics.set_cache_bytes_memory_usage(bytes);
        tracing::debug!(bytes, "recomputed cache memory usage");
        bytes
    }

    /// Walk the entire forest and panic unless the tree, hash and arena
    /// indexes agree.
    ///
    /// Checks that every father/sibling/descendant reference resolves to a
    /// live entry or `NIL_ENTRY`, that every child names its father, that no
    /// sibling chain cycles, and that the set of ids reachable from the
    /// roots is exactly the live-entry set. Diagnostic for test builds; a
    /// violation is fatal, never recovered.
    pub fn check_descendants_tree_consistency(&self) {
        let live: Vec<CacheEntryId> = (1..self.entry_base.len())
            .map(|raw| raw as CacheEntryId)
            .filter(|&id| self.has_entry(id))
            .collect();

        for &id in &live {
            let father = self.entry(id).father();
            assert!(
                father == NIL_ENTRY || self.has_entry(father),
                "entry {id} has dangling father {father}"
            );

            let mut child = self.entry(id).first_descendant();
            let mut steps = 0;
            while child != NIL_ENTRY {
                assert!(
                    self.has_entry(child),
                    "entry {id} has dangling descendant {child}"
                );
                assert_eq!(
                    self.entry(child).father(),
                    id,
                    "entry {child} is chained under {id} but names another father"
                );
                steps += 1;
                assert!(steps <= live.len(), "sibling chain under {id} cycles");
                child = self.entry(child).next_sibling();
            }
        }

        // Reachability from the roots must cover exactly the live set.
        let mut visited = vec![false; self.entry_base.len()];
        let mut pending: Vec<CacheEntryId> = live
            .iter()
            .copied()
            .filter(|&id| self.entry(id).father() == NIL_ENTRY)
            .collect();
        let mut reached = 0usize;
        while let Some(id) = pending.pop() {
            assert!(
                !visited[id as usize],
                "entry {id} is reachable through two paths"
            );
            visited[id as usize] = true;
            reached += 1;

            let mut child = self.entry(id).first_descendant();
            while child != NIL_ENTRY {
                pending.push(child);
                child = self.entry(child).next_sibling();
            }
        }
        assert_eq!(
            reached,
            live.len(),
            "live entries unreachable from the descendant-tree roots"
        );
    }

    /// Number of live entries currently in the arena.
    pub fn num_entries(&self) -> usize {
        self.entry_base.iter().flatten().count()
    }

    /// Number of hash slots whose bucket has been allocated.
    pub fn num_occupied_buckets(&self) -> usize {
        self.num_occupied_buckets
    }

    /// The logical clock, advanced once per store.
    pub fn my_time(&self) -> u64 {
        self.my_time
    }

    /// The run counters for this cache.
    pub fn statistics(&self) -> &DataAndStatistics {
        &self.statistics
    }

    /// The sizing this cache was created with.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Chain `descendant_id` in as the new first descendant of `comp_id`.
    fn add_descendant(&mut self, comp_id: CacheEntryId, descendant_id: CacheEntryId) {
        let previous = self.entry(comp_id).first_descendant();
        debug_assert!(
            descendant_id != previous,
            "entry {descendant_id} is already the first descendant of {comp_id}"
        );
        self.entry_mut(descendant_id).set_next_sibling(previous);
        self.entry_mut(comp_id).set_first_descendant(descendant_id);
    }
}
