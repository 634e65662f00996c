//! Exact model counting with skipped-level corrections.
//!
//! A reduced diagram elides variables whose value does not matter, so a
//! naive recursion undercounts: each level skipped between a node and its
//! child doubles the number of assignments. The recursion below multiplies
//! every child count by `2^(skip - 1)` and the final result once by
//! `2^rank(root)` for the variables above the root.
//!
//! Counting is always performed over a [`CareSet`]: the ordered variables
//! the count ranges over. Under a partial assignment the fixed variables
//! drop out of the care set, and the skip corrections must be computed in
//! the *restricted* order, which is what the care-set ranks provide.

use std::collections::HashMap;

use num_bigint::BigUint;
use num_traits::{One, Zero};

use crate::bdd::Bdd;
use crate::edge::Edge;

/// The ordered set of variables a count ranges over, with dense ranks.
#[derive(Debug, Clone)]
pub struct CareSet {
    /// Ascending 1-based variable indices.
    vars: Vec<u32>,
}

impl CareSet {
    /// All of the variables `1..=num_vars`.
    pub fn all(num_vars: usize) -> Self {
        Self {
            vars: (1..=num_vars as u32).collect(),
        }
    }

    /// All variables except those fixed by a partial assignment.
    pub fn excluding<'a>(num_vars: usize, fixed: impl IntoIterator<Item = &'a u32>) -> Self {
        let mut out = Self::all(num_vars);
        let fixed: Vec<u32> = fixed.into_iter().copied().collect();
        out.vars.retain(|v| !fixed.contains(v));
        out
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn vars(&self) -> &[u32] {
        &self.vars
    }

    /// Rank of `var` within the care set.
    ///
    /// Every variable appearing in the counted diagram must be a care
    /// variable; anything else is a caller bug.
    pub(crate) fn rank(&self, var: u32) -> usize {
        self.vars
            .binary_search(&var)
            .expect("variable outside the care set")
    }
}

impl Bdd {
    /// Number of satisfying assignments of `f` over `num_vars` variables.
    pub fn sat_count(&self, f: Edge, num_vars: usize) -> BigUint {
        self.model_count(f, &CareSet::all(num_vars))
    }

    /// Number of satisfying assignments of `f` over the given care set.
    ///
    /// The memo table is scoped to this call; counts stored in it are
    /// intrinsic to an edge's own sub-DAG and the care set.
    pub fn model_count(&self, f: Edge, care: &CareSet) -> BigUint {
        let mut memo = HashMap::new();
        let count = self.count_rec(f, care, &mut memo);
        // Variables above the root never appear on any path: all free.
        count << self.care_rank(f, care)
    }

    /// Rank of the node reached through `e`, terminals ranking below all
    /// care variables.
    pub(crate) fn care_rank(&self, e: Edge, care: &CareSet) -> usize {
        if self.is_terminal(e) {
            care.len()
        } else {
            care.rank(self.var(e.index()))
        }
    }

    /// Count over the care variables at and below the level of `f`.
    pub(crate) fn count_rec(
        &self,
        f: Edge,
        care: &CareSet,
        memo: &mut HashMap<Edge, BigUint>,
    ) -> BigUint {
        if self.is_zero(f) {
            return BigUint::zero();
        }
        if self.is_one(f) {
            return BigUint::one();
        }
        if let Some(count) = memo.get(&f) {
            return count.clone();
        }

        let rank = self.care_rank(f, care);
        let low = self.low_edge(f);
        let high = self.high_edge(f);

        let count = (self.count_rec(low, care, memo) << (self.care_rank(low, care) - rank - 1))
            + (self.count_rec(high, care, memo) << (self.care_rank(high, care) - rank - 1));

        memo.insert(f, count.clone());
        count
    }
}
