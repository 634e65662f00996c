//! Per-variable inclusion probability: the fraction of valid
//! configurations in which each variable is selected.
//!
//! Baseline restrict-and-count formulation: `count(f ∧ v) / count(f)` per
//! variable. The quotient is formed exactly as a big rational before the
//! conversion to `f64`, so spaces whose counts exceed the `f64` range
//! still report correct probabilities.

use std::collections::{BTreeMap, HashMap};

use num_bigint::{BigInt, BigUint};
use num_rational::BigRational;
use num_traits::{ToPrimitive, Zero};

use crate::count::CareSet;
use crate::error::Result;
use crate::space::{ConfigSpace, PartialAssignment};

fn ratio(numerator: BigUint, denominator: &BigUint) -> f64 {
    BigRational::new(BigInt::from(numerator), BigInt::from(denominator.clone()))
        .to_f64()
        .unwrap_or(0.0)
}

impl ConfigSpace {
    /// Probability of each variable being selected in a valid
    /// configuration. All zeros when the space is unsatisfiable.
    pub fn inclusion_probabilities(&self) -> Result<BTreeMap<String, f64>> {
        self.inclusion_probabilities_with(&Default::default())
    }

    /// Inclusion probabilities among the valid configurations extending
    /// `partial`. Variables fixed by `partial` report exactly 1.0 or 0.0.
    pub fn inclusion_probabilities_with(
        &self,
        partial: &PartialAssignment,
    ) -> Result<BTreeMap<String, f64>> {
        let root = self.root()?;
        let fixed = self.resolve(partial)?;

        let bdd = self.bdd();
        let restricted = bdd.restrict(root, &fixed);
        let care = CareSet::excluding(self.num_variables(), fixed.keys());
        let population = bdd.model_count(restricted, &care);

        let mut probabilities = BTreeMap::new();
        for (i, name) in self.variables().iter().enumerate() {
            let var = (i + 1) as u32;
            let p = if population.is_zero() {
                0.0
            } else if let Some(&value) = fixed.get(&var) {
                if value {
                    1.0
                } else {
                    0.0
                }
            } else {
                let with_var = bdd.restrict(restricted, &HashMap::from([(var, true)]));
                let sub_care = CareSet::excluding(
                    self.num_variables(),
                    fixed.keys().chain(std::iter::once(&var)),
                );
                ratio(bdd.model_count(with_var, &sub_care), &population)
            };
            probabilities.insert(name.clone(), p);
        }
        Ok(probabilities)
    }
}
