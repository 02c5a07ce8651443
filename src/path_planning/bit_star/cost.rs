//! Strict cost comparisons for the search queues
//!
//! Queue ordering needs a deterministic strict weak order, so these
//! comparisons are plain scalar `<` on the cost value. The objective's
//! own `is_cost_better_than` carries a solution-improvement margin and
//! must never be used for ordering.

use crate::common::Cost;

impl Cost {
    /// Strictly better (no tolerance)
    pub fn is_better_than(&self, other: Cost) -> bool {
        self.0 < other.0
    }

    pub fn is_worse_than(&self, other: Cost) -> bool {
        other.is_better_than(*self)
    }

    pub fn is_equivalent_to(&self, other: Cost) -> bool {
        !self.is_better_than(other) && !other.is_better_than(*self)
    }

    pub fn is_better_than_or_equivalent_to(&self, other: Cost) -> bool {
        !other.is_better_than(*self)
    }

    pub fn is_worse_than_or_equivalent_to(&self, other: Cost) -> bool {
        !self.is_better_than(other)
    }
}

/// The better of two costs
pub fn better_cost(a: Cost, b: Cost) -> Cost {
    if a.is_better_than(b) {
        a
    } else {
        b
    }
}

/// Fractional change of `new_cost` relative to `old_cost`
///
/// A non-finite old cost counts as total improvement.
pub fn fractional_change(new_cost: Cost, old_cost: Cost) -> f64 {
    if !old_cost.is_finite() {
        1.0
    } else {
        (old_cost.value() - new_cost.value()) / old_cost.value()
    }
}
