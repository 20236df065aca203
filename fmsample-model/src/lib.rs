//! Feature model and configuration data types used by the fmsample configuration sampler.
//!
//! A [feature model][fm] describes the valid configurations of a configurable software system. The
//! binary features become propositional variables and the dependencies between them become clauses
//! of a formula in [conjunctive normal form][cnf]. This crate contains the data types for feature
//! models and configurations, a builder that performs the clause encoding, parsers for the two XML
//! dialects used by the SPL Conqueror tool family and a reader for measurement files.
//!
//! [fm]: https://en.wikipedia.org/wiki/Feature_model
//! [cnf]: https://en.wikipedia.org/wiki/Conjunctive_normal_form

pub mod config;
pub mod features;
pub mod measure;
pub mod model;
pub mod xml;

pub use config::Config;
pub use features::{FeatureSet, NumericFeature};
pub use model::{FeatureModel, FeatureModelBuilder, ModelError};

pub use varisat_formula::{CnfFormula, ExtendFormula, Lit, Var};
