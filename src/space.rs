//! The configuration-space model: named variables, CNF construction, and
//! the analysis operations built on the diagram.
//!
//! A [`ConfigSpace`] owns one [`Bdd`] manager and one root edge denoting
//! the set of valid configurations. The ordered variable list given at
//! creation fixes the diagram's variable order for its whole lifetime
//! (level of a name = its position in the list); clauses are DIMACS-style
//! lists of signed 1-based indices into that list.

use std::collections::{BTreeMap, HashMap};

use log::debug;
use num_bigint::BigUint;

use crate::bdd::Bdd;
use crate::count::CareSet;
use crate::edge::Edge;
use crate::error::{Error, Result};

/// A complete configuration: one value per variable, indexed by level.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Configuration {
    values: Vec<bool>,
}

impl Configuration {
    pub fn new(values: Vec<bool>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[bool] {
        &self.values
    }

    /// Value of the variable at `level`.
    pub fn value(&self, level: usize) -> bool {
        self.values[level]
    }

    /// Number of selected (true) variables.
    pub fn selected(&self) -> usize {
        self.values.iter().filter(|&&b| b).count()
    }

    /// Named view of this configuration within `space`.
    pub fn to_map(&self, space: &ConfigSpace) -> BTreeMap<String, bool> {
        space
            .variables()
            .iter()
            .cloned()
            .zip(self.values.iter().copied())
            .collect()
    }
}

/// A partial assignment: a subset of variables fixed by name.
///
/// Used both as an input constraint (counting and sampling under a
/// partially fixed configuration) and as a builder for constraints.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct PartialAssignment {
    values: BTreeMap<String, bool>,
}

impl PartialAssignment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fix a variable. Fixing the same variable twice is allowed only
    /// with the same value.
    pub fn assign(&mut self, name: impl Into<String>, value: bool) -> Result<&mut Self> {
        let name = name.into();
        match self.values.get(&name) {
            Some(&prev) if prev != value => Err(Error::ConflictingAssignment(name)),
            _ => {
                self.values.insert(name, value);
                Ok(self)
            }
        }
    }

    pub fn from_pairs<S: Into<String>>(pairs: impl IntoIterator<Item = (S, bool)>) -> Result<Self> {
        let mut out = Self::new();
        for (name, value) in pairs {
            out.assign(name, value)?;
        }
        Ok(out)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<bool> {
        self.values.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.values.iter().map(|(name, &value)| (name.as_str(), value))
    }
}

/// A boolean configuration space over an ordered set of named variables.
pub struct ConfigSpace {
    bdd: Bdd,
    variables: Vec<String>,
    index: HashMap<String, u32>,
    root: Option<Edge>,
}

impl ConfigSpace {
    /// Create a space over the given variables; their order in the list
    /// is the diagram's variable order, fixed for the space's lifetime.
    pub fn new<S: Into<String>>(variables: impl IntoIterator<Item = S>) -> Self {
        let variables: Vec<String> = variables.into_iter().map(Into::into).collect();
        let index: HashMap<String, u32> = variables
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), (i + 1) as u32))
            .collect();
        assert_eq!(index.len(), variables.len(), "duplicate variable names");

        Self {
            bdd: Bdd::default(),
            variables,
            index,
            root: None,
        }
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Name of the variable with the given 1-based index.
    pub fn name(&self, var: u32) -> &str {
        &self.variables[(var - 1) as usize]
    }

    /// 1-based index of a variable name.
    pub fn variable_index(&self, name: &str) -> Result<u32> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownVariable(name.to_string()))
    }

    /// The underlying diagram manager.
    pub fn bdd(&self) -> &Bdd {
        &self.bdd
    }

    /// The root edge of the built diagram.
    pub fn root(&self) -> Result<Edge> {
        self.root.ok_or(Error::UninitializedDiagram)
    }

    /// Build the diagram from a DIMACS-style clause list: each clause a
    /// disjunction of signed 1-based variable indices, the whole list a
    /// conjunction. Replaces any previously built diagram.
    pub fn build_cnf(&mut self, clauses: &[Vec<i32>]) -> Result<()> {
        debug!(
            "build_cnf: {} clauses over {} variables",
            clauses.len(),
            self.num_variables()
        );

        let num_vars = self.num_variables() as i32;
        let mut root = self.bdd.one();

        for clause in clauses {
            for &lit in clause {
                if lit == 0 || lit.abs() > num_vars {
                    return Err(Error::UnknownVariable(lit.to_string()));
                }
            }

            // Drop duplicate literals; a clause with both polarities of a
            // variable is a tautology and constrains nothing.
            let mut literals = clause.clone();
            literals.sort_by_key(|lit| (lit.abs(), *lit));
            literals.dedup();
            if literals.windows(2).any(|pair| pair[0].abs() == pair[1].abs()) {
                continue;
            }

            root = self.bdd.apply_and(root, self.bdd.mk_clause(literals));
        }

        debug!("build_cnf: diagram has {} nodes", self.bdd.size(root));
        self.root = Some(root);
        Ok(())
    }

    /// Resolve a partial assignment against this space's variables.
    pub(crate) fn resolve(&self, partial: &PartialAssignment) -> Result<HashMap<u32, bool>> {
        partial
            .iter()
            .map(|(name, value)| Ok((self.variable_index(name)?, value)))
            .collect()
    }

    pub fn is_satisfiable(&self) -> Result<bool> {
        Ok(!self.bdd.is_zero(self.root()?))
    }

    /// Exact number of valid configurations.
    pub fn configuration_count(&self) -> Result<BigUint> {
        let root = self.root()?;
        Ok(self.bdd.sat_count(root, self.num_variables()))
    }

    /// Exact number of valid configurations extending `partial`.
    pub fn configuration_count_with(&self, partial: &PartialAssignment) -> Result<BigUint> {
        let root = self.root()?;
        let fixed = self.resolve(partial)?;
        let restricted = self.bdd.restrict(root, &fixed);
        let care = CareSet::excluding(self.num_variables(), fixed.keys());
        Ok(self.bdd.model_count(restricted, &care))
    }

    /// Number of valid configurations per count of selected variables;
    /// entry `k` counts configurations selecting exactly `k` variables.
    pub fn product_distribution(&self) -> Result<Vec<BigUint>> {
        let root = self.root()?;
        Ok(self.bdd.sat_dist(root, self.num_variables()))
    }

    /// Variables selected in every valid configuration.
    pub fn core_variables(&self) -> Result<Vec<String>> {
        let root = self.root()?;
        Ok(self
            .variables
            .iter()
            .enumerate()
            .filter(|&(i, _)| {
                let var = self.bdd.mk_var((i + 1) as u32);
                self.bdd.is_zero(self.bdd.apply_and(root, -var))
            })
            .map(|(_, name)| name.clone())
            .collect())
    }

    /// Variables selected in no valid configuration.
    pub fn dead_variables(&self) -> Result<Vec<String>> {
        let root = self.root()?;
        Ok(self
            .variables
            .iter()
            .enumerate()
            .filter(|&(i, _)| {
                let var = self.bdd.mk_var((i + 1) as u32);
                self.bdd.is_zero(self.bdd.apply_and(root, var))
            })
            .map(|(_, name)| name.clone())
            .collect())
    }

    /// One valid configuration, if any, found by a single greedy descent
    /// preferring selected variables. Don't-care variables are left
    /// unselected.
    pub fn one_configuration(&self) -> Result<Option<Configuration>> {
        let root = self.root()?;
        if self.bdd.is_zero(root) {
            return Ok(None);
        }

        let mut values = vec![false; self.num_variables()];
        let mut current = root;
        while !self.bdd.is_terminal(current) {
            let var = self.bdd.var(current.index());
            let high = self.bdd.high_edge(current);
            if !self.bdd.is_zero(high) {
                values[(var - 1) as usize] = true;
                current = high;
            } else {
                current = self.bdd.low_edge(current);
            }
        }
        debug_assert!(self.bdd.is_one(current));

        Ok(Some(Configuration::new(values)))
    }

    /// All valid configurations. Exponential; for small spaces only.
    pub fn configurations(&self) -> Result<Vec<Configuration>> {
        let root = self.root()?;
        Ok(self
            .bdd
            .models(root, self.num_variables())
            .into_iter()
            .map(Configuration::new)
            .collect())
    }

    /// Whether a complete configuration satisfies the space.
    pub fn is_valid(&self, config: &Configuration) -> Result<bool> {
        assert_eq!(
            config.values().len(),
            self.num_variables(),
            "configuration arity mismatch"
        );
        Ok(self.bdd.evaluate(self.root()?, config.values()))
    }

    /// Drop diagram nodes unreachable from the root. Explicit maintenance;
    /// never runs automatically.
    pub fn collect_garbage(&self) {
        let roots: Vec<Edge> = self.root.into_iter().collect();
        self.bdd.collect_garbage(&roots);
    }
}
