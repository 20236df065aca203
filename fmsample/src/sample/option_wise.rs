//! Option-wise sampling, one configuration per feature.
use varisat_formula::Var;

use fmsample_model::Config;

use super::SampleError;
use crate::solver::ConfigSolver;

/// The outcome of an option-wise pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OptionWiseSample {
    /// One configuration per feature whose repair reached validity, in feature order.
    pub configs: Vec<Config>,
    /// Number of features for which no valid extension was found.
    pub skipped: usize,
}

/// For every feature, a valid configuration that enables it and little else.
///
/// Each feature starts from the mandatory-only seed with the feature forced on. While the
/// candidate is invalid, further disabled features are enabled one at a time in feature order,
/// keeping earlier flips. A feature whose candidate never reaches validity contributes no
/// configuration; the skip is counted in the result rather than raised as an error. Distinct
/// features may end up with equal configurations, the output is not deduplicated.
#[derive(Default)]
pub struct OptionWiseSampler;

impl OptionWiseSampler {
    pub fn new() -> OptionWiseSampler {
        OptionWiseSampler
    }

    /// Runs one pass over all features.
    pub fn sample(&self, solver: &mut ConfigSolver) -> Result<OptionWiseSample, SampleError> {
        solver.ensure_base_sat()?;

        let minimal = solver.minimal();
        let mut sample = OptionWiseSample::default();

        for index in 0..solver.feature_count() {
            let mut candidate = minimal.clone();
            candidate.set(Var::from_index(index), true);

            if repair(solver, &mut candidate)? {
                sample.configs.push(candidate);
            } else {
                sample.skipped += 1;
            }
        }

        Ok(sample)
    }
}

/// Greedily enables disabled features until `candidate` is valid.
///
/// Flips are cumulative. Mandatory features are already enabled in every candidate derived from
/// the minimal seed, so only non-mandatory features are ever flipped here.
fn repair(solver: &mut ConfigSolver, candidate: &mut Config) -> Result<bool, SampleError> {
    if solver.is_valid(candidate)? {
        return Ok(true);
    }
    for index in 0..solver.feature_count() {
        let feature = Var::from_index(index);
        if candidate.enabled(feature) {
            continue;
        }
        candidate.set(feature, true);
        if solver.is_valid(candidate)? {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    use fmsample_model::FeatureModelBuilder;

    use crate::test::{abc_model, config};

    #[test]
    fn repairs_the_invalid_minimal_seed() {
        let model = abc_model();
        let mut solver = ConfigSolver::new(&model);

        let sample = OptionWiseSampler::new().sample(&mut solver).unwrap();

        // Forcing a starts from the invalid `{a}` and repairs it by enabling b; forcing b or c is
        // valid immediately.
        assert_eq!(
            sample.configs,
            vec![
                config(&[true, true, false]),
                config(&[true, true, false]),
                config(&[true, false, true]),
            ]
        );
        assert_eq!(sample.skipped, 0);

        for config in sample.configs.iter() {
            assert!(solver.is_valid(config).unwrap());
        }
    }

    #[test]
    fn features_without_valid_extension_are_counted() {
        let mut builder = FeatureModelBuilder::new();
        let a = builder.feature("a").unwrap();
        let b = builder.feature("b").unwrap();
        builder.mandatory(a).unwrap();
        builder.clause(&[b.negative()]).unwrap();
        let model = builder.build();

        let mut solver = ConfigSolver::new(&model);
        let sample = OptionWiseSampler::new().sample(&mut solver).unwrap();

        // b can never be enabled, so only the pass for a yields a configuration.
        assert_eq!(sample.configs, vec![config(&[true, false])]);
        assert_eq!(sample.skipped, 1);
    }

    #[test]
    fn unsatisfiable_bases_are_rejected() {
        let mut builder = FeatureModelBuilder::new();
        let a = builder.feature("a").unwrap();
        builder.mandatory(a).unwrap();
        builder.clause(&[a.negative()]).unwrap();
        let model = builder.build();

        let mut solver = ConfigSolver::new(&model);
        assert!(OptionWiseSampler::new().sample(&mut solver).is_err());
    }
}
