//! Fmsample generates configuration samples from binary feature models. Given a feature model
//! whose constraints are lowered to a propositional formula, it decides validity of
//! configurations, enumerates the satisfying configurations and implements the sampling
//! strategies used to build training and test sets for performance-influence learning:
//! true-random splitting, pseudo-random enumeration, option-wise and negative option-wise
//! sampling.
//!
//! The satisfiability engine itself is the external [varisat] solver. This crate's part is clause
//! construction, query formulation and model interpretation.
//!
//! [varisat]: https://docs.rs/varisat

pub mod card;
pub mod sample;
pub mod solver;

#[cfg(test)]
mod test;

pub use fmsample_model::{Config, FeatureModel};
pub use varisat_formula::{CnfFormula, ExtendFormula, Lit, Var};

pub mod model {
    //! Feature model types, parsers and the measurement transform.
    pub use fmsample_model::*;
}
