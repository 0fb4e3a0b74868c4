// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Live components: the connected sub-problems the search recurses into.
//!
//! A [`Component`] is the unit of recursion and of caching. The component
//! analysis step (external to this crate) discovers the connected components
//! of the residual formula and hands them to the cache, which stores them in
//! packed form (see [`packed::PackedComponent`]).
//!
//! Variable and clause identifiers are 1-based, as in the DIMACS convention;
//! identifier 0 is never used. The packed encoding relies on this to keep
//! trailing zero bits unambiguous.

pub mod packed;

pub use packed::PackedComponent;

use crate::cache::entry::{CacheEntryId, NIL_ENTRY};

/// A connected sub-problem of the formula being searched.
///
/// Holds the component's variable and clause-id membership, both sorted
/// ascending, plus the cache entry id assigned to it once it has been stored
/// via [`crate::cache::ComponentCache::store_as_entry`].
///
/// # Example
///
/// ```
/// use sharp_search::component::Component;
///
/// let comp = Component::new(vec![1, 4, 7], vec![2, 3]);
/// assert_eq!(comp.num_variables(), 3);
/// assert_eq!(comp.num_clauses(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct Component {
    /// Variable indices in this component, sorted ascending, 1-based.
    variables: Vec<u32>,

    /// Ids of the (long) clauses in this component, sorted ascending, 1-based.
    clause_ids: Vec<u32>,

    /// Cache entry id assigned by the cache, or `NIL_ENTRY` before storage.
    id: CacheEntryId,
}

impl Component {
    /// Create a component from sorted variable and clause-id lists.
    ///
    /// # Panics
    ///
    /// Debug builds panic if either list is unsorted, contains duplicates,
    /// or contains the reserved identifier 0.
    pub fn new(variables: Vec<u32>, clause_ids: Vec<u32>) -> Self {
        debug_assert!(is_strictly_ascending(&variables));
        debug_assert!(is_strictly_ascending(&clause_ids));
        debug_assert!(variables.first() != Some(&0));
        debug_assert!(clause_ids.first() != Some(&0));
        Self {
            variables,
            clause_ids,
            id: NIL_ENTRY,
        }
    }

    /// Number of variables in this component.
    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    /// Number of clauses in this component.
    pub fn num_clauses(&self) -> usize {
        self.clause_ids.len()
    }

    /// The variables of this component, sorted ascending.
    pub fn variables(&self) -> &[u32] {
        &self.variables
    }

    /// The clause ids of this component, sorted ascending.
    pub fn clause_ids(&self) -> &[u32] {
        &self.clause_ids
    }

    /// The cache entry id assigned to this component.
    ///
    /// `NIL_ENTRY` until the cache has stored the component.
    pub fn id(&self) -> CacheEntryId {
        self.id
    }

    /// Record the cache entry id assigned to this component.
    ///
    /// Called by the cache when the component is stored.
    pub fn set_id(&mut self, id: CacheEntryId) {
        self.id = id;
    }
}

fn is_strictly_ascending(values: &[u32]) -> bool {
    values.windows(2).all(|w| w[0] < w[1])
}
