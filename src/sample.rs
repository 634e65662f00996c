//! Uniform random sampling of valid configurations.
//!
//! Knuth's counting-based method: each draw walks the variable order and
//! fixes one variable at a time, choosing its value with probability
//! exactly proportional to the number of satisfying configurations under
//! each choice. Variables the reduced diagram never tests on the current
//! path are free, so they are resolved by an unbiased coin flip. The
//! proportional choice draws a uniform big integer below the combined
//! count, so uniformity does not degrade to `f64` precision on large
//! spaces.
//!
//! The count memo is keyed by edge and holds counts intrinsic to the
//! edge's sub-DAG and the draw's care set; it is shared by all draws of
//! one `sample` call and discarded afterwards, never reused across calls
//! with a different restriction.

use std::collections::{HashMap, HashSet};

use log::debug;
use num_bigint::{BigUint, RandBigInt};
use num_traits::Zero;
use rand::Rng;

use crate::count::CareSet;
use crate::edge::Edge;
use crate::error::{Error, Result};
use crate::space::{ConfigSpace, Configuration, PartialAssignment};

impl ConfigSpace {
    /// Draw `size` uniformly random valid configurations, optionally
    /// extending a partial assignment.
    ///
    /// Without replacement the result contains `size` distinct
    /// configurations and `size` must not exceed the population; with
    /// replacement duplicates are possible. Either way every returned
    /// configuration satisfies the space and extends `partial`.
    pub fn sample(
        &self,
        size: i64,
        with_replacement: bool,
        partial: &PartialAssignment,
    ) -> Result<Vec<Configuration>> {
        self.sample_with_rng(size, with_replacement, partial, &mut rand::thread_rng())
    }

    /// [`sample`][ConfigSpace::sample] with a caller-supplied generator,
    /// for reproducible draws.
    pub fn sample_with_rng<R: Rng>(
        &self,
        size: i64,
        with_replacement: bool,
        partial: &PartialAssignment,
        rng: &mut R,
    ) -> Result<Vec<Configuration>> {
        if size < 0 {
            return Err(Error::NegativeSampleSize(size));
        }
        let size = size as u64;

        let root = self.root()?;
        let fixed = self.resolve(partial)?;
        let restricted = self.bdd().restrict(root, &fixed);
        let care = CareSet::excluding(self.num_variables(), fixed.keys());

        let population = self.bdd().model_count(restricted, &care);
        if size > 0
            && (population.is_zero() || (!with_replacement && population < BigUint::from(size)))
        {
            return Err(Error::SampleTooLarge { size, population });
        }

        debug!(
            "sampling {} of {} configurations ({} fixed variables)",
            size,
            population,
            fixed.len()
        );

        let mut draw_ctx = DrawContext {
            fixed: &fixed,
            care: &care,
            memo: HashMap::new(),
        };

        if with_replacement {
            let mut result = Vec::with_capacity(size as usize);
            for _ in 0..size {
                result.push(self.draw(restricted, &mut draw_ctx, rng));
            }
            Ok(result)
        } else {
            let mut distinct = HashSet::with_capacity(size as usize);
            while (distinct.len() as u64) < size {
                distinct.insert(self.draw(restricted, &mut draw_ctx, rng));
            }
            Ok(distinct.into_iter().collect())
        }
    }

    /// One uniformly random configuration extending the fixed variables.
    fn draw<R: Rng>(
        &self,
        restricted: Edge,
        ctx: &mut DrawContext<'_>,
        rng: &mut R,
    ) -> Configuration {
        let bdd = self.bdd();
        let mut values = vec![false; self.num_variables()];
        for (&var, &value) in ctx.fixed {
            values[(var - 1) as usize] = value;
        }

        let mut current = restricted;
        for &var in ctx.care.vars() {
            debug_assert!(!bdd.is_zero(current));

            // A variable the diagram skips here is free: both values are
            // consistent with equally many configurations.
            let tested = !bdd.is_terminal(current) && bdd.var(current.index()) == var;
            if !tested {
                values[(var - 1) as usize] = rng.gen_bool(0.5);
                continue;
            }

            let low = bdd.low_edge(current);
            let high = bdd.high_edge(current);
            let rank = ctx.care.rank(var);

            // Cofactor counts over the care variables below `var`.
            let n_high = bdd.count_rec(high, ctx.care, &mut ctx.memo)
                << (bdd.care_rank(high, ctx.care) - rank - 1);
            let n_low = bdd.count_rec(low, ctx.care, &mut ctx.memo)
                << (bdd.care_rank(low, ctx.care) - rank - 1);

            let total = &n_high + &n_low;
            debug_assert!(!total.is_zero());
            let selected = rng.gen_biguint_below(&total) < n_high;

            values[(var - 1) as usize] = selected;
            current = if selected { high } else { low };
        }
        debug_assert!(bdd.is_one(current));

        Configuration::new(values)
    }
}

struct DrawContext<'a> {
    fixed: &'a HashMap<u32, bool>,
    care: &'a CareSet,
    memo: HashMap<Edge, BigUint>,
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use test_log::test;

    use super::*;

    fn tiny_feature_model() -> ConfigSpace {
        let mut space = ConfigSpace::new(["Root", "ChildA", "ChildB"]);
        space.build_cnf(&[vec![1], vec![-1, 2, 3]]).unwrap();
        space
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(0x5eed)
    }

    #[test]
    fn test_samples_are_valid() {
        let space = tiny_feature_model();
        let mut rng = rng();

        let samples = space
            .sample_with_rng(50, true, &PartialAssignment::new(), &mut rng)
            .unwrap();
        assert_eq!(samples.len(), 50);
        for config in &samples {
            assert!(space.is_valid(config).unwrap());
        }
    }

    #[test]
    fn test_sample_without_replacement_is_exhaustive() {
        let space = tiny_feature_model();
        let mut rng = rng();

        let samples = space
            .sample_with_rng(3, false, &PartialAssignment::new(), &mut rng)
            .unwrap();

        let distinct: HashSet<_> = samples.iter().cloned().collect();
        assert_eq!(distinct.len(), 3);
        for config in &samples {
            assert!(space.is_valid(config).unwrap());
        }
    }

    #[test]
    fn test_sample_too_large() {
        let space = tiny_feature_model();
        let mut rng = rng();

        let err = space
            .sample_with_rng(4, false, &PartialAssignment::new(), &mut rng)
            .unwrap_err();
        assert!(matches!(err, Error::SampleTooLarge { size: 4, .. }));

        // With replacement the same request is fine.
        let samples = space
            .sample_with_rng(4, true, &PartialAssignment::new(), &mut rng)
            .unwrap();
        assert_eq!(samples.len(), 4);
    }

    #[test]
    fn test_negative_sample_size() {
        let space = tiny_feature_model();
        let err = space
            .sample(-1, true, &PartialAssignment::new())
            .unwrap_err();
        assert_eq!(err, Error::NegativeSampleSize(-1));
    }

    #[test]
    fn test_sample_empty_population() {
        let mut space = ConfigSpace::new(["A"]);
        space.build_cnf(&[vec![1], vec![-1]]).unwrap();
        let mut rng = rng();

        for with_replacement in [false, true] {
            let err = space
                .sample_with_rng(1, with_replacement, &PartialAssignment::new(), &mut rng)
                .unwrap_err();
            assert!(matches!(err, Error::SampleTooLarge { size: 1, .. }));
        }

        // Zero draws from an empty population are fine.
        let samples = space
            .sample_with_rng(0, false, &PartialAssignment::new(), &mut rng)
            .unwrap();
        assert!(samples.is_empty());
    }

    #[test]
    fn test_sample_under_partial() {
        let space = tiny_feature_model();
        let mut rng = rng();

        let partial = PartialAssignment::from_pairs([("ChildA", false)]).unwrap();
        let samples = space
            .sample_with_rng(20, true, &partial, &mut rng)
            .unwrap();

        // The only extension is (Root, !ChildA, ChildB).
        for config in &samples {
            assert_eq!(config.values(), &[true, false, true]);
        }
    }

    #[test]
    fn test_sample_covers_free_variables() {
        // B is unconstrained: draws must still assign it, both ways.
        let mut space = ConfigSpace::new(["A", "B"]);
        space.build_cnf(&[vec![1]]).unwrap();
        let mut rng = rng();

        let samples = space
            .sample_with_rng(2, false, &PartialAssignment::new(), &mut rng)
            .unwrap();
        let b_values: HashSet<bool> = samples.iter().map(|c| c.value(1)).collect();
        assert_eq!(b_values.len(), 2);
    }

    #[test]
    fn test_sampling_is_uniform() {
        let space = tiny_feature_model();
        let mut rng = rng();

        let draws = 10_000;
        let mut frequency: HashMap<Vec<bool>, u32> = HashMap::new();
        for _ in 0..draws {
            let sample = space
                .sample_with_rng(1, true, &PartialAssignment::new(), &mut rng)
                .unwrap();
            *frequency
                .entry(sample[0].values().to_vec())
                .or_default() += 1;
        }

        assert_eq!(frequency.len(), 3);
        for (config, count) in frequency {
            let observed = count as f64 / draws as f64;
            assert!(
                (observed - 1.0 / 3.0).abs() < 0.05,
                "configuration {config:?} drawn with frequency {observed}"
            );
        }
    }
}
