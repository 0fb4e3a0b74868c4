// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Descendant-tree integrity under longer operation sequences.
//!
//! These tests drive the cache through store/pop/clean/sweep sequences shaped
//! like real search runs and verify the forest invariants after every
//! mutation batch: all links resolve, reachability matches the live set, and
//! anchored entries are never reclaimed.

mod common;

use common::{init_cache, pop_frame, store};
use sharp_search::{CacheEntryId, NIL_ENTRY};

/// A long father/child chain, popped and cleaned from the top in one call.
#[test]
fn deep_chain_is_reclaimed_in_one_cleanup() {
    let (mut cache, root) = init_cache(64);

    let mut chain = Vec::new();
    let mut super_id = root;
    for depth in 0..30u32 {
        let id = store(&mut cache, &[100 + depth], &[], depth + 2, super_id);
        chain.push(id);
        super_id = id;
    }
    cache.check_descendants_tree_consistency();

    for &id in &chain {
        pop_frame(&mut cache, id);
    }
    cache.clean_pollutions_involving(chain[0]);

    for &id in &chain {
        assert!(!cache.has_entry(id));
    }
    assert!(cache.has_entry(root));
    assert_eq!(cache.entry(root).first_descendant(), NIL_ENTRY);
    cache.check_descendants_tree_consistency();
}

/// A sweep over a tree with anchored leaves flattens the popped inner nodes
/// and reattaches the survivors to the root.
#[test]
fn sweep_flattens_around_anchored_leaves() {
    let (mut cache, root) = init_cache(64);

    let inner = store(&mut cache, &[10, 11, 12], &[3], 2, root);
    let leaf_a = store(&mut cache, &[10, 11], &[3], 3, inner);
    let leaf_b = store(&mut cache, &[12], &[], 3, inner);

    // The inner frame pops; its leaves stay anchored.
    pop_frame(&mut cache, inner);
    assert!(cache.delete_entries());

    assert!(!cache.has_entry(inner));
    assert!(cache.has_entry(leaf_a));
    assert!(cache.has_entry(leaf_b));
    assert_eq!(cache.entry(leaf_a).father(), root);
    assert_eq!(cache.entry(leaf_b).father(), root);
    cache.check_descendants_tree_consistency();

    // Nothing deletable is left; a second sweep frees nothing.
    assert!(!cache.delete_entries());
}

/// Pollution cleanup keeps the ancestor chain of an anchored descendant
/// intact, and reclaims it once the anchor is gone.
#[test]
fn cleanup_preserves_anchored_chains() {
    let (mut cache, root) = init_cache(64);

    let a = store(&mut cache, &[10], &[], 2, root);
    let b = store(&mut cache, &[11], &[], 3, a);
    let c = store(&mut cache, &[12], &[], 4, b);
    let d = store(&mut cache, &[13], &[], 5, c);

    // Frames a..c pop; d is still live.
    pop_frame(&mut cache, a);
    pop_frame(&mut cache, b);
    pop_frame(&mut cache, c);
    cache.clean_pollutions_involving(a);

    for id in [a, b, c, d] {
        assert!(cache.has_entry(id), "entry {id} must survive while d is anchored");
    }
    cache.check_descendants_tree_consistency();

    pop_frame(&mut cache, d);
    cache.clean_pollutions_involving(a);
    for id in [a, b, c, d] {
        assert!(!cache.has_entry(id));
    }
    cache.check_descendants_tree_consistency();
}

/// A pseudo-random mix of stores, pops, cleanups and sweeps never breaks the
/// forest, and slot recycling keeps ids dense.
#[test]
fn randomized_operation_sequence_stays_consistent() {
    let (mut cache, root) = init_cache(16);

    // Deterministic LCG; no external randomness in tests.
    let mut seed = 0x2545_f491u32;
    let mut next = move || {
        seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        seed
    };

    let mut live: Vec<CacheEntryId> = vec![root];
    let mut var = 100u32;

    for round in 0..200 {
        match next() % 4 {
            // Store a fresh component under a random live entry.
            0 | 1 => {
                let super_id = live[(next() as usize) % live.len()];
                var += 1 + next() % 3;
                let id = store(&mut cache, &[var, var + 10], &[1 + next() % 7], 2, super_id);
                live.push(id);
            }
            // Pop and clean a random non-root entry's subtree.
            2 => {
                if live.len() > 1 {
                    let idx = 1 + (next() as usize) % (live.len() - 1);
                    let id = live[idx];
                    pop_frame(&mut cache, id);
                    cache.clean_pollutions_involving(id);
                    live.retain(|&e| cache.has_entry(e));
                }
            }
            // Pop a random non-root entry without cleaning, then sweep.
            _ => {
                if live.len() > 1 {
                    let idx = 1 + (next() as usize) % (live.len() - 1);
                    pop_frame(&mut cache, live[idx]);
                }
                cache.delete_entries();
                live.retain(|&e| cache.has_entry(e));
            }
        }

        if round % 10 == 0 {
            cache.check_descendants_tree_consistency();
        }
    }
    cache.check_descendants_tree_consistency();

    // Everything but the root is reclaimable once all frames are popped.
    for &id in live.iter().skip(1) {
        pop_frame(&mut cache, id);
    }
    cache.delete_entries();
    assert_eq!(cache.num_entries(), 1);
    cache.check_descendants_tree_consistency();

    // Memory accounting reflects the shrunken cache.
    let bytes = cache.recompute_bytes_memory_usage();
    assert_eq!(cache.statistics().cache_bytes_memory_usage(), bytes);
}
