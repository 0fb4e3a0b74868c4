// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Recursion stack frames, as seen by the cache.
//!
//! The real search engine owns the recursion stack; the cache only needs two
//! things from the frame on top of it: the frame's position in the stack
//! (used to anchor freshly stored entries) and a place to fold a cached
//! solution count into on a hit. [`StackLevel`] is that narrow interface.
//!
//! Counts of independent components compose multiplicatively: if the live
//! formula splits into components with counts `a` and `b`, the combined
//! count is `a * b`. A frame therefore carries a running product, starting
//! at 1, and [`StackLevel::include_solution`] multiplies each solved or
//! cache-hit component's count into it.

use num_bigint::BigUint;
use num_traits::One;

/// One frame of the engine's recursion stack.
#[derive(Debug, Clone)]
pub struct StackLevel {
    /// 1-based position of this frame in the recursion stack. Entries stored
    /// while this frame is on top are anchored with this value; position 0 is
    /// reserved to mean "not anchored".
    stack_position: u32,

    /// Running product of the solution counts of this frame's solved
    /// components.
    solutions: BigUint,
}

impl StackLevel {
    /// Create a frame at the given 1-based stack position.
    ///
    /// # Panics
    ///
    /// Panics if `stack_position` is 0, which is reserved for "unanchored".
    pub fn new(stack_position: u32) -> Self {
        assert!(stack_position > 0, "stack positions are 1-based");
        Self {
            stack_position,
            solutions: BigUint::one(),
        }
    }

    /// This frame's position in the recursion stack.
    pub fn stack_position(&self) -> u32 {
        self.stack_position
    }

    /// Fold one component's solution count into this frame's running product.
    ///
    /// A count of zero zeroes the product: an unsatisfiable component makes
    /// the whole frame unsatisfiable.
    pub fn include_solution(&mut self, count: &BigUint) {
        self.solutions *= count;
    }

    /// The frame's current partial solution count.
    pub fn solution_count(&self) -> &BigUint {
        &self.solutions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::Zero;

    #[test]
    fn test_new_frame_starts_at_one() {
        let frame = StackLevel::new(1);
        assert_eq!(frame.solution_count(), &BigUint::one());
        assert_eq!(frame.stack_position(), 1);
    }

    #[test]
    fn test_counts_compose_multiplicatively() {
        let mut frame = StackLevel::new(2);
        frame.include_solution(&BigUint::from(6u32));
        frame.include_solution(&BigUint::from(7u32));
        assert_eq!(frame.solution_count(), &BigUint::from(42u32));
    }

    #[test]
    fn test_unsat_component_zeroes_frame() {
        let mut frame = StackLevel::new(3);
        frame.include_solution(&BigUint::from(100u32));
        frame.include_solution(&BigUint::zero());
        assert!(frame.solution_count().is_zero());
    }

    #[test]
    #[should_panic(expected = "1-based")]
    fn test_position_zero_rejected() {
        let _ = StackLevel::new(0);
    }
}
