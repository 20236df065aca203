//! Negative option-wise sampling, one maximal configuration per option.
use varisat::solver::Solver;
use varisat_formula::{ExtendFormula, Lit, Var};

use fmsample_model::Config;

use super::SampleError;
use crate::card::Totalizer;
use crate::solver::{ConfigSolver, SolveError};

/// For every non-mandatory feature, a maximal valid configuration that disables it.
///
/// Maximal means that no valid configuration disables the feature while enabling strictly more
/// features, among those not already produced earlier in the pass: every found configuration is
/// excluded from the remaining searches, so the result is pairwise distinct. An option that
/// admits no such configuration contributes nothing. Mandatory features are never forced off.
///
/// The maximization is a satisfiability climb: starting from any valid configuration disabling
/// the option, the enabled-feature count is bounded from below through a unary counter until the
/// bound becomes unsatisfiable.
#[derive(Default)]
pub struct NegativeOptionWiseSampler;

impl NegativeOptionWiseSampler {
    pub fn new() -> NegativeOptionWiseSampler {
        NegativeOptionWiseSampler
    }

    /// Runs one pass over all non-mandatory features.
    pub fn sample(&self, solver: &mut ConfigSolver) -> Result<Vec<Config>, SampleError> {
        solver.ensure_base_sat()?;

        let feature_count = solver.feature_count();

        // Scratch engine for this pass: the base clauses, the counter over all feature literals
        // and the blocking clauses of every configuration found so far. Dropped when the pass
        // ends, so none of that state outlives the call.
        let mut engine = Solver::new();
        engine.add_formula(solver.base_formula());

        let inputs: Vec<Lit> = (0..feature_count)
            .map(|index| Var::from_index(index).positive())
            .collect();
        let counter = Totalizer::new(&mut engine, &inputs);

        let mut configs = Vec::new();

        for index in 0..feature_count {
            let feature = Var::from_index(index);
            if solver.is_mandatory(feature) {
                continue;
            }

            let disabled = feature.negative();

            engine.assume(&[disabled]);
            if !engine.solve().map_err(SolveError::from)? {
                continue;
            }
            let mut best = model_config(&engine, feature_count);

            loop {
                let bound = match counter.at_least(best.enabled_count() + 1) {
                    Some(bound) => bound,
                    None => break,
                };
                engine.assume(&[disabled, bound]);
                if !engine.solve().map_err(SolveError::from)? {
                    break;
                }
                best = model_config(&engine, feature_count);
            }

            let blocking = best.blocking_clause();
            engine.add_clause(&blocking[..]);
            configs.push(best);
        }

        Ok(configs)
    }
}

/// The engine's last model as a configuration over the feature range.
fn model_config(engine: &Solver<'_>, feature_count: usize) -> Config {
    // A model is present after every satisfiable solve.
    let model = engine.model().unwrap_or_default();
    Config::from_model(&model, feature_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    use fmsample_model::FeatureModelBuilder;

    use crate::test::{abc_model, config};

    #[test]
    fn maximal_configuration_per_disabled_option() {
        let model = abc_model();
        let mut solver = ConfigSolver::new(&model);

        let configs = NegativeOptionWiseSampler::new().sample(&mut solver).unwrap();

        // a is mandatory and skipped. Disabling b forces c, since a requires b or c; disabling c
        // forces b.
        assert_eq!(
            configs,
            vec![config(&[true, false, true]), config(&[true, true, false])]
        );

        for found in configs.iter() {
            assert!(solver.is_valid(found).unwrap());
        }
    }

    #[test]
    fn fully_mandatory_models_yield_nothing() {
        let mut builder = FeatureModelBuilder::new();
        let a = builder.feature("a").unwrap();
        builder.mandatory(a).unwrap();
        let model = builder.build();

        let mut solver = ConfigSolver::new(&model);
        let configs = NegativeOptionWiseSampler::new().sample(&mut solver).unwrap();

        assert!(configs.is_empty());
    }

    #[test]
    fn infeasible_options_contribute_nothing() {
        let mut builder = FeatureModelBuilder::new();
        let a = builder.feature("a").unwrap();
        let b = builder.feature("b").unwrap();
        builder.clause(&[a.positive(), b.positive()]).unwrap();
        builder.clause(&[a.negative()]).unwrap();
        let model = builder.build();

        let mut solver = ConfigSolver::new(&model);
        let configs = NegativeOptionWiseSampler::new().sample(&mut solver).unwrap();

        // b can never be disabled, so only the pass disabling a yields a configuration.
        assert_eq!(configs, vec![config(&[false, true])]);
    }

    #[test]
    fn found_configurations_are_excluded_from_later_searches() {
        let mut builder = FeatureModelBuilder::new();
        let p = builder.feature("p").unwrap();
        let q = builder.feature("q").unwrap();
        builder.clause(&[p.negative()]).unwrap();
        builder.clause(&[q.negative()]).unwrap();
        let model = builder.build();

        let mut solver = ConfigSolver::new(&model);
        let configs = NegativeOptionWiseSampler::new().sample(&mut solver).unwrap();

        // The all-disabled configuration is the only valid one. The pass for p takes it and the
        // pass for q cannot produce it again.
        assert_eq!(configs, vec![config(&[false, false])]);
    }
}
