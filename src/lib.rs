//! # configspace: BDD-based analysis of boolean configuration spaces
//!
//! **`configspace`** analyzes large combinatorial configuration spaces (the
//! valid configurations of a feature model, given as a CNF formula over
//! named boolean variables) without ever materializing the set of solutions.
//!
//! The clause set is compiled into a canonical Reduced Ordered Binary
//! Decision Diagram with complement edges, and four analyses read the shared
//! diagram:
//!
//! - **Model counting**: the exact number of valid configurations, as an
//!   arbitrary-precision integer (configuration counts routinely exceed
//!   64 bits).
//! - **Product distribution**: how many configurations select exactly
//!   0, 1, ..., n variables.
//! - **Inclusion probability**: the fraction of valid configurations in
//!   which each variable is selected.
//! - **Uniform random sampling**: unbiased draws of complete
//!   configurations, with or without replacement, optionally extending a
//!   partial assignment.
//!
//! ## Key properties
//!
//! - **Manager-centric**: all diagram operations go through the
//!   [`Bdd`][crate::bdd::Bdd] manager, which hash-conses nodes so that
//!   equality of functions is equality of edges.
//! - **Canonical and deterministic**: building the same CNF under the same
//!   variable order always yields the same diagram.
//! - **Exact**: counting and sampling use unbounded integers end to end;
//!   sampling stays uniform on spaces far beyond `f64` precision.
//! - **Read-mostly**: a diagram is built once and queried many times;
//!   garbage collection is an explicit maintenance operation.
//!
//! ## Basic usage
//!
//! ```rust
//! use configspace::space::ConfigSpace;
//!
//! // Root is mandatory; if Root is selected, at least one child is.
//! let mut space = ConfigSpace::new(["Root", "ChildA", "ChildB"]);
//! space.build_cnf(&[vec![1], vec![-1, 2, 3]]).unwrap();
//!
//! assert_eq!(space.configuration_count().unwrap(), 3u32.into());
//!
//! let dist = space.product_distribution().unwrap();
//! assert_eq!(dist[2], 2u32.into()); // two configurations select 2 variables
//!
//! let probs = space.inclusion_probabilities().unwrap();
//! assert_eq!(probs["Root"], 1.0);
//! ```
//!
//! ## Scope
//!
//! The crate takes an ordered variable list and a DIMACS-style clause set
//! and produces counts, distributions, probabilities, and assignments.
//! Parsing textual CNF notations or feature-model files, exporting
//! diagrams, and variable-order optimization are left to its callers; the
//! variable order supplied at creation is fixed for the life of a space.

pub mod bdd;
pub mod cache;
pub mod count;
pub mod distribution;
pub mod edge;
pub mod enumerate;
pub mod error;
pub mod hash;
pub mod node;
pub mod probability;
pub mod sample;
pub mod space;
pub mod table;

pub use crate::error::{Error, Result};
pub use crate::space::{ConfigSpace, Configuration, PartialAssignment};
