use num_bigint::BigUint;
use thiserror::Error;

/// Errors surfaced by [`ConfigSpace`][crate::space::ConfigSpace] operations.
///
/// All of these are fail-fast: they are reported to the caller immediately
/// and nothing is retried internally. Violations of structural invariants
/// (ordering, canonicity) are programming errors and fire debug assertions
/// instead of being represented here.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// A clause or partial assignment references a variable that was never
    /// declared when the space was created.
    #[error("unknown variable `{0}`")]
    UnknownVariable(String),

    /// A partial assignment fixes the same variable to two different values.
    #[error("variable `{0}` is assigned conflicting values")]
    ConflictingAssignment(String),

    /// A query was issued before `build_cnf`.
    #[error("the diagram has not been built yet")]
    UninitializedDiagram,

    /// A sample without replacement was requested that is larger than the
    /// number of satisfying configurations.
    #[error("sample size {size} exceeds the population of {population} configurations")]
    SampleTooLarge { size: u64, population: BigUint },

    /// A sample of negative size was requested.
    #[error("sample size must be non-negative, got {0}")]
    NegativeSampleSize(i64),
}

pub type Result<T> = std::result::Result<T, Error>;
