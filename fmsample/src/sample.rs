//! Sampling strategies over valid configurations.
//!
//! Every strategy produces configurations that satisfy the model's clause set. The solver-backed
//! strategies run against a [`ConfigSolver`] of their own; the true-random strategy partitions a
//! list of already enumerated configurations instead and never consults a solver.
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use fmsample_model::{Config, FeatureModel};

use crate::solver::{ConfigSolver, SolveError};

pub mod negative;
pub mod option_wise;
pub mod random;

pub use negative::NegativeOptionWiseSampler;
pub use option_wise::{OptionWiseSample, OptionWiseSampler};
pub use random::{Seed, TrueRandomSampler};

/// Errors of the sampling strategies.
#[derive(Debug, Error)]
pub enum SampleError {
    /// More samples requested than configurations available.
    #[error(
        "requested {} samples but only {} configurations are available",
        requested,
        available
    )]
    SampleSize { requested: usize, available: usize },
    /// Strategy name not recognized.
    #[error("unknown sampling strategy: {}", name)]
    UnknownStrategy { name: String },
    /// The strategy partitions known configurations and cannot run against a model.
    #[error("the {} strategy samples from a list of known configurations", strategy)]
    ConfigListRequired { strategy: Strategy },
    /// A solver query failed.
    #[error(transparent)]
    Solve(#[from] SolveError),
}

/// The implemented sampling strategies.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// Split a list of enumerated configurations uniformly at random.
    TrueRandom,
    /// Enumerate configurations by repeated solving.
    PseudoRandom,
    /// One configuration per feature, forced on and minimally extended.
    OptionWise,
    /// One maximal configuration per non-mandatory feature, forced off.
    NegativeOptionWise,
}

impl Strategy {
    /// The strategy names accepted by the `FromStr` impl.
    pub const NAMES: [&'static str; 4] = [
        "true-random",
        "pseudo-random",
        "option-wise",
        "negative-option-wise",
    ];

    /// The name this strategy is selected by.
    pub fn name(self) -> &'static str {
        match self {
            Strategy::TrueRandom => "true-random",
            Strategy::PseudoRandom => "pseudo-random",
            Strategy::OptionWise => "option-wise",
            Strategy::NegativeOptionWise => "negative-option-wise",
        }
    }

    /// Whether this strategy runs solver queries.
    ///
    /// The one strategy that does not, true-random, is driven through
    /// [`TrueRandomSampler::sample`] with an explicit configuration list.
    pub fn uses_solver(self) -> bool {
        match self {
            Strategy::TrueRandom => false,
            _ => true,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = SampleError;

    fn from_str(name: &str) -> Result<Strategy, SampleError> {
        match name {
            "true-random" => Ok(Strategy::TrueRandom),
            "pseudo-random" => Ok(Strategy::PseudoRandom),
            "option-wise" => Ok(Strategy::OptionWise),
            "negative-option-wise" => Ok(Strategy::NegativeOptionWise),
            _ => Err(SampleError::UnknownStrategy {
                name: name.to_owned(),
            }),
        }
    }
}

/// A train/test split of configurations.
///
/// The two sides are disjoint by identity: no input element ends up on both sides, though
/// equal-valued configurations may appear on both sides when the input held duplicates.
/// Strategies that generate rather than split leave `remaining` empty.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SampleSet {
    pub sampled: Vec<Config>,
    pub remaining: Vec<Config>,
}

/// Enumeration of valid configurations by repeated solving.
///
/// Delegates to [`ConfigSolver::enumerate`]. Which configurations come first follows the
/// engine's assignment choices, so the result is not a uniform draw from the solution space;
/// that bias is documented behavior, not corrected.
pub struct PseudoRandomSampler {
    count: usize,
}

impl PseudoRandomSampler {
    /// A sampler requesting `count` configurations.
    pub fn new(count: usize) -> PseudoRandomSampler {
        PseudoRandomSampler { count }
    }

    /// Up to the requested number of distinct valid configurations.
    pub fn sample(&self, solver: &mut ConfigSolver) -> Result<Vec<Config>, SampleError> {
        Ok(solver.enumerate(self.count)?)
    }
}

/// Runs one sampling pass of a solver-backed strategy against a feature model.
///
/// A fresh [`ConfigSolver`] is constructed for the pass. `count` bounds the pseudo-random
/// enumeration and is ignored by the per-feature strategies. [`Strategy::TrueRandom`] has no
/// solver side and is rejected here; it partitions explicit configuration lists through
/// [`TrueRandomSampler::sample`].
pub fn sample_model(
    model: &FeatureModel,
    strategy: Strategy,
    count: usize,
) -> Result<SampleSet, SampleError> {
    let mut solver = ConfigSolver::new(model);

    let sampled = match strategy {
        Strategy::TrueRandom => return Err(SampleError::ConfigListRequired { strategy }),
        Strategy::PseudoRandom => PseudoRandomSampler::new(count).sample(&mut solver)?,
        Strategy::OptionWise => OptionWiseSampler::new().sample(&mut solver)?.configs,
        Strategy::NegativeOptionWise => NegativeOptionWiseSampler::new().sample(&mut solver)?,
    };

    Ok(SampleSet {
        sampled,
        remaining: Vec::new(),
    })
}
