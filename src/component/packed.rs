// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Bit-packed component encodings used as cache keys.
//!
//! A [`PackedComponent`] is an immutable, compact serialization of a
//! component's identity: its variable and clause membership packed at minimal
//! bit widths into a `u32` word array. Two components are the same sub-problem
//! iff their packed words are identical, so equality is a plain word
//! comparison and the hash key is computed once, at construction.
//!
//! # Encoding
//!
//! ```text
//! word stream:
//!   [num_variables : 32 bits]
//!   [bits_per_variable : 6 bits] [bits_per_clause : 6 bits]
//!   [variable ids, bits_per_variable bits each, ascending]
//!   [clause ids, bits_per_clause bits each, ascending]
//! ```
//!
//! Variable and clause ids are 1-based (see [`crate::component`]), so the
//! zero padding in the final word can never be mistaken for payload.
//!
//! The packed form also carries the component's exact solution count once it
//! is known. The count is arbitrary precision ([`num_bigint::BigUint`]):
//! model counts grow exponentially in the number of variables and overflow
//! any fixed-width integer almost immediately.

use crate::component::Component;
use num_bigint::BigUint;
use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};

/// Number of bits used to store each of the two per-field bit widths.
const WIDTH_FIELD_BITS: u32 = 6;

/// Bit-packed, hashable, exactly-comparable encoding of a component.
///
/// The cache key for the component cache. Carries the component's exact
/// model count once [`PackedComponent::set_model_count`] has finalized it.
#[derive(Debug, Clone)]
pub struct PackedComponent {
    /// The packed variable/clause membership words.
    data: Box<[u32]>,

    /// Hash of `data`, computed once at construction.
    hashkey: u64,

    /// Exact solution count; `None` until the component has been solved.
    model_count: Option<BigUint>,
}

impl PackedComponent {
    /// Pack a live component.
    pub fn new(comp: &Component) -> Self {
        let bits_per_variable = bits_needed(comp.variables().last().copied().unwrap_or(1));
        let bits_per_clause = bits_needed(comp.clause_ids().last().copied().unwrap_or(1));

        let mut packer = BitPacker::new();
        packer.push(comp.num_variables() as u32, 32);
        packer.push(bits_per_variable, WIDTH_FIELD_BITS);
        packer.push(bits_per_clause, WIDTH_FIELD_BITS);
        for &var in comp.variables() {
            packer.push(var, bits_per_variable);
        }
        for &cl in comp.clause_ids() {
            packer.push(cl, bits_per_clause);
        }

        let data = packer.into_words().into_boxed_slice();
        let hashkey = hash_words(&data);
        Self {
            data,
            hashkey,
            model_count: None,
        }
    }

    /// The hash key of this component, computed at construction.
    pub fn hashkey(&self) -> u64 {
        self.hashkey
    }

    /// Number of `u32` words in the packed payload.
    pub fn data_size(&self) -> usize {
        self.data.len()
    }

    /// Whether the payload has been released by the owning cache entry.
    pub fn is_cleared(&self) -> bool {
        self.data.is_empty()
    }

    /// The exact solution count, or `None` while the component is unsolved.
    pub fn model_count(&self) -> Option<&BigUint> {
        self.model_count.as_ref()
    }

    /// Finalize the solution count of this component.
    ///
    /// # Panics
    ///
    /// Panics if a count has already been stored. Re-finalizing indicates
    /// the search recorded two results for one sub-problem.
    pub fn set_model_count(&mut self, model_count: BigUint) {
        assert!(
            self.model_count.is_none(),
            "model count already finalized for this component"
        );
        self.model_count = Some(model_count);
    }

    /// Release the packed payload and the stored count.
    ///
    /// Used when the owning cache entry is destroyed; the encoding is not
    /// recoverable afterwards.
    pub(crate) fn clear_payload(&mut self) {
        self.data = Box::new([]);
        self.model_count = None;
    }

    /// Bytes held by the stored model count.
    pub fn size_of_model_count(&self) -> usize {
        match &self.model_count {
            Some(count) => (count.bits() as usize + 7) / 8,
            None => 0,
        }
    }

    /// Heap bytes held by this packed component (payload + count).
    pub fn bytes_memory_usage(&self) -> usize {
        self.data_size() * std::mem::size_of::<u32>() + self.size_of_model_count()
    }
}

/// Equality is exact structural comparison of the packed words.
///
/// The model count is deliberately excluded: an unsolved copy of a component
/// must compare equal to the solved entry so that lookups can hit it.
impl PartialEq for PackedComponent {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl Eq for PackedComponent {}

/// Minimal number of bits needed to represent `value`.
fn bits_needed(value: u32) -> u32 {
    (32 - value.leading_zeros()).max(1)
}

fn hash_words(words: &[u32]) -> u64 {
    let mut hasher = FxHasher::default();
    words.hash(&mut hasher);
    hasher.finish()
}

/// Append-only bit stream over `u32` words, LSB first within each word.
struct BitPacker {
    words: Vec<u32>,
    /// Bits already used in the last word; always in `0..32`.
    bits_used: u32,
}

impl BitPacker {
    fn new() -> Self {
        Self {
            words: vec![0],
            bits_used: 0,
        }
    }

    /// Append the low `width` bits of `value`.
    fn push(&mut self, value: u32, width: u32) {
        debug_assert!((1..=32).contains(&width));
        debug_assert!(width == 32 || value < (1u32 << width));

        let remaining = 32 - self.bits_used;
        *self.words.last_mut().expect("words is never empty") |=
            value.checked_shl(self.bits_used).unwrap_or(0);
        if width >= remaining {
            // Spill the high bits into a fresh word.
            let high = if remaining == 32 { 0 } else { value >> remaining };
            self.words.push(high);
            self.bits_used = width - remaining;
        } else {
            self.bits_used += width;
        }
    }

    fn into_words(self) -> Vec<u32> {
        self.words
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packed(vars: &[u32], clauses: &[u32]) -> PackedComponent {
        PackedComponent::new(&Component::new(vars.to_vec(), clauses.to_vec()))
    }

    #[test]
    fn test_equal_components_pack_identically() {
        let a = packed(&[1, 3, 9], &[2, 4]);
        let b = packed(&[1, 3, 9], &[2, 4]);
        assert_eq!(a, b);
        assert_eq!(a.hashkey(), b.hashkey());
    }

    #[test]
    fn test_distinct_components_pack_differently() {
        let a = packed(&[1, 3, 9], &[2, 4]);
        let b = packed(&[1, 3, 8], &[2, 4]);
        let c = packed(&[1, 3, 9], &[2]);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_variable_list_prefix_is_not_equal() {
        // A trailing element must change the packed words even when the
        // prefix packs identically.
        let a = packed(&[1, 2], &[]);
        let b = packed(&[1, 2, 3], &[]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_swapped_roles_are_distinct() {
        // Same id sets, but one as variables and one as clauses.
        let a = packed(&[1, 2], &[3]);
        let b = packed(&[3], &[1, 2]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_model_count_excluded_from_equality() {
        let mut a = packed(&[1, 5], &[2]);
        let b = packed(&[1, 5], &[2]);
        a.set_model_count(BigUint::from(42u32));
        assert_eq!(a, b);
    }

    #[test]
    #[should_panic(expected = "already finalized")]
    fn test_double_finalize_panics() {
        let mut a = packed(&[1], &[]);
        a.set_model_count(BigUint::from(1u32));
        a.set_model_count(BigUint::from(2u32));
    }

    #[test]
    fn test_wide_identifiers_pack() {
        // Identifiers needing the full 32-bit width per field.
        let big = u32::MAX;
        let a = packed(&[1, big], &[big - 1]);
        let b = packed(&[1, big], &[big - 1]);
        let c = packed(&[1, big - 1], &[big - 1]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_memory_accounting_tracks_count() {
        let mut a = packed(&[1, 2, 3], &[1]);
        let before = a.bytes_memory_usage();
        a.set_model_count(BigUint::from(1u8) << 256usize);
        assert!(a.bytes_memory_usage() > before);
        assert_eq!(a.size_of_model_count(), 33); // 257 bits rounded up
    }

    #[test]
    fn test_bit_packer_spills_across_words() {
        let mut packer = BitPacker::new();
        packer.push(0xFFFF_FFFF, 32);
        packer.push(0b101, 3);
        packer.push(0x1FFF_FFFF, 30); // spans the word boundary
        let words = packer.into_words();
        assert_eq!(words[0], 0xFFFF_FFFF);
        assert_eq!(words[1] & 0b111, 0b101);
    }
}
