//! Distribution of satisfying assignments by number of true variables.
//!
//! A single post-order traversal computes, for every reachable edge, the
//! vector whose entry `k` counts the assignments of the sub-space with
//! exactly `k` selected variables. Levels elided by reduction are restored
//! with a binomial convolution: each of `skip` free variables contributes
//! 0 or 1 to the popcount, so a child vector is spread by `C(skip, i)`
//! before it is merged. The high-side vector is additionally shifted by
//! one because the node's own variable is selected on that branch.
//!
//! Invariant checked by the tests: the entries sum to `sat_count`.

use std::collections::HashMap;

use num_bigint::BigUint;
use num_traits::{One, Zero};

use crate::bdd::Bdd;
use crate::edge::Edge;

/// Row `n` of Pascal's triangle: `C(n, 0) ..= C(n, n)`.
fn binomial_row(n: usize) -> Vec<BigUint> {
    let mut row = Vec::with_capacity(n + 1);
    row.push(BigUint::one());
    for k in 1..=n {
        let next = &row[k - 1] * (n - k + 1) / k;
        row.push(next);
    }
    row
}

/// Spread `dist` over `skip` additional free variables: the result at
/// index `i + j` accumulates `dist[j] * C(skip, i)`.
fn spread(dist: &[BigUint], skip: usize) -> Vec<BigUint> {
    if skip == 0 {
        return dist.to_vec();
    }
    if dist.is_empty() {
        return Vec::new();
    }

    let binomials = binomial_row(skip);
    let mut out = vec![BigUint::zero(); dist.len() + skip];
    for (i, c) in binomials.iter().enumerate() {
        for (j, d) in dist.iter().enumerate() {
            out[i + j] += c * d;
        }
    }
    out
}

impl Bdd {
    /// Distribution of the satisfying assignments of `f` over `num_vars`
    /// variables by popcount: entry `k` of the result counts the
    /// assignments with exactly `k` variables set to true. The result has
    /// `num_vars + 1` entries.
    pub fn sat_dist(&self, f: Edge, num_vars: usize) -> Vec<BigUint> {
        let mut memo = HashMap::new();
        let dist = self.dist_rec(f, num_vars, &mut memo);

        // Variables above the root are free and binomially distributed.
        let mut dist = spread(&dist, self.level_of(f, num_vars));
        dist.resize(num_vars + 1, BigUint::zero());
        dist
    }

    fn dist_rec(
        &self,
        f: Edge,
        num_vars: usize,
        memo: &mut HashMap<Edge, Vec<BigUint>>,
    ) -> Vec<BigUint> {
        if self.is_zero(f) {
            return Vec::new();
        }
        if self.is_one(f) {
            return vec![BigUint::one()];
        }
        if let Some(dist) = memo.get(&f) {
            return dist.clone();
        }

        let level = self.level_of(f, num_vars);
        let low = self.low_edge(f);
        let high = self.high_edge(f);

        let low_dist = {
            let d = self.dist_rec(low, num_vars, memo);
            spread(&d, self.level_of(low, num_vars) - level - 1)
        };
        let high_dist = {
            let d = self.dist_rec(high, num_vars, memo);
            spread(&d, self.level_of(high, num_vars) - level - 1)
        };

        // Merge, shifting the high side by one for the node's own variable.
        let mut dist = vec![BigUint::zero(); low_dist.len().max(high_dist.len() + 1)];
        for (i, d) in low_dist.into_iter().enumerate() {
            dist[i] += d;
        }
        for (i, d) in high_dist.into_iter().enumerate() {
            dist[i + 1] += d;
        }

        memo.insert(f, dist.clone());
        dist
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    fn dist_u32(bdd: &Bdd, f: Edge, n: usize) -> Vec<u32> {
        bdd.sat_dist(f, n)
            .into_iter()
            .map(|c| u32::try_from(c).unwrap())
            .collect()
    }

    #[test]
    fn test_binomial_row() {
        assert_eq!(binomial_row(0), vec![BigUint::from(1u32)]);
        let row5: Vec<u32> = binomial_row(5)
            .into_iter()
            .map(|c| u32::try_from(c).unwrap())
            .collect();
        assert_eq!(row5, vec![1, 5, 10, 10, 5, 1]);
    }

    #[test]
    fn test_dist_terminals() {
        let bdd = Bdd::default();

        assert_eq!(dist_u32(&bdd, bdd.zero(), 3), vec![0, 0, 0, 0]);
        // All assignments satisfy the constant true: row 3 of Pascal.
        assert_eq!(dist_u32(&bdd, bdd.one(), 3), vec![1, 3, 3, 1]);
    }

    #[test]
    fn test_dist_single_variable() {
        let bdd = Bdd::default();

        let x1 = bdd.mk_var(1);
        assert_eq!(dist_u32(&bdd, x1, 1), vec![0, 1]);
        // x1 fixed true, x2 and x3 free.
        assert_eq!(dist_u32(&bdd, x1, 3), vec![0, 1, 2, 1]);

        // Same function but rooted below skipped levels.
        let x3 = bdd.mk_var(3);
        assert_eq!(dist_u32(&bdd, x3, 3), vec![0, 1, 2, 1]);
    }

    #[test]
    fn test_dist_cube() {
        let bdd = Bdd::default();

        let f = bdd.mk_cube([1, -2, 3]);
        assert_eq!(dist_u32(&bdd, f, 3), vec![0, 0, 1, 0]);
        assert_eq!(dist_u32(&bdd, f, 4), vec![0, 0, 1, 1]);
    }

    #[test]
    fn test_dist_complement_edge() {
        let bdd = Bdd::default();

        let f = bdd.mk_cube([1, 2]);
        // ¬(x1 & x2) over two variables: one empty, two singletons.
        assert_eq!(dist_u32(&bdd, -f, 2), vec![1, 2, 0]);
    }

    #[test]
    fn test_dist_sums_to_count() {
        let bdd = Bdd::default();

        let f = bdd.apply_and(bdd.mk_clause([1, 2, -4]), bdd.mk_clause([-2, 3]));
        let n = 5;

        let dist = bdd.sat_dist(f, n);
        assert_eq!(dist.len(), n + 1);
        let total: BigUint = dist.iter().sum();
        assert_eq!(total, bdd.sat_count(f, n));
    }

    #[test]
    fn test_dist_matches_enumeration() {
        let bdd = Bdd::default();

        let f = bdd.apply_and(bdd.mk_clause([1, 3]), bdd.mk_clause([-1, 2, 4]));
        let n = 4;

        let mut expected = vec![0u32; n + 1];
        for bits in 0..(1u32 << n) {
            let values: Vec<bool> = (0..n).map(|i| bits & (1 << i) != 0).collect();
            if bdd.evaluate(f, &values) {
                expected[values.iter().filter(|&&b| b).count()] += 1;
            }
        }

        assert_eq!(dist_u32(&bdd, f, n), expected);
    }
}
