//! Satisfiability queries against a fixed feature model.
use log::warn;

use thiserror::Error;

use varisat::solver::{Solver, SolverError};
use varisat_formula::{CnfFormula, ExtendFormula, Lit, Var};

use fmsample_model::{Config, FeatureModel};

/// Errors of satisfiability queries.
#[derive(Debug, Error)]
pub enum SolveError {
    /// The clause set admits no configuration at all.
    #[error("the feature model is unsatisfiable, no valid configuration exists")]
    UnsatisfiableBase,
    /// The satisfiability engine failed.
    #[error(transparent)]
    Engine(#[from] SolverError),
}

/// Incremental satisfiability queries against the clause set of one feature model.
///
/// The wrapped engine is seeded with the model's clauses at construction and every query leaves
/// that clause set intact: validity checks use assumptions, enumeration discards its blocking
/// clauses by rebuilding the engine when it finishes. Queries are deterministic given the fixed
/// clause and feature order.
///
/// All queries are synchronous, blocking and unbounded; a single query is a full satisfiability
/// search. The solver is not meant to be shared, each logical caller constructs its own.
pub struct ConfigSolver {
    base: CnfFormula,
    feature_count: usize,
    mandatory: Vec<bool>,
    engine: Solver<'static>,
    base_sat: Option<bool>,
}

impl ConfigSolver {
    /// Creates a solver holding the model's clause set.
    pub fn new(model: &FeatureModel) -> ConfigSolver {
        let mut base = CnfFormula::new();
        base.set_var_count(model.formula().var_count());
        for clause in model.formula().iter() {
            base.add_clause(clause);
        }

        let mut engine = Solver::new();
        engine.add_formula(&base);

        ConfigSolver {
            feature_count: model.feature_count(),
            mandatory: model.mandatory_features(),
            base,
            engine,
            base_sat: None,
        }
    }

    /// Number of binary features of the underlying model.
    #[inline]
    pub fn feature_count(&self) -> usize {
        self.feature_count
    }

    /// The clause set the solver was seeded with.
    #[inline]
    pub fn base_formula(&self) -> &CnfFormula {
        &self.base
    }

    /// Whether a unit clause of the model forces this feature on.
    #[inline]
    pub fn is_mandatory(&self, var: Var) -> bool {
        self.mandatory.get(var.index()).copied().unwrap_or(false)
    }

    /// The configuration that enables exactly the mandatory features.
    ///
    /// This is the smallest candidate consistent with the unit clauses. It is not necessarily
    /// valid, a non-unit clause may require further features; option-wise sampling repairs it.
    pub fn minimal(&self) -> Config {
        let mut config = Config::disabled(self.feature_count);
        for (index, &mandatory) in self.mandatory.iter().enumerate() {
            if mandatory {
                config.set(Var::from_index(index), true);
            }
        }
        config
    }

    /// Checks that the clause set admits at least one configuration.
    ///
    /// The answer is computed on first use and cached, so the samplers can call this before every
    /// pass without extra solver work.
    pub fn ensure_base_sat(&mut self) -> Result<(), SolveError> {
        let sat = match self.base_sat {
            Some(sat) => sat,
            None => {
                self.engine.assume(&[]);
                let sat = self.engine.solve()?;
                self.base_sat = Some(sat);
                sat
            }
        };
        if sat {
            Ok(())
        } else {
            Err(SolveError::UnsatisfiableBase)
        }
    }

    /// Whether a configuration satisfies every clause of the model.
    pub fn is_valid(&mut self, config: &Config) -> Result<bool, SolveError> {
        self.is_valid_assignment(&config.lits())
    }

    /// Whether a partial assignment can be completed to a valid configuration.
    ///
    /// Features not mentioned in `assignment` are left free. The check is ephemeral: it runs
    /// under assumptions which are cleared again before returning.
    pub fn is_valid_assignment(&mut self, assignment: &[Lit]) -> Result<bool, SolveError> {
        self.engine.assume(assignment);
        let result = self.engine.solve();
        self.engine.assume(&[]);
        Ok(result?)
    }

    /// Enumerates up to `count` distinct valid configurations.
    ///
    /// Repeatedly solves, completes the model to a configuration (features the engine left free
    /// default to disabled) and adds a blocking clause so the next solve cannot repeat it. Stops
    /// at `count` configurations or when the space is exhausted; an exhausted space is reported
    /// with a warning naming the exact shortfall and the partial result is returned. An
    /// unsatisfiable clause set is [`SolveError::UnsatisfiableBase`] on the first solve.
    ///
    /// The blocking clauses are per-call state: whichever way the enumeration ends, the engine is
    /// rebuilt from the base clause set before returning.
    pub fn enumerate(&mut self, count: usize) -> Result<Vec<Config>, SolveError> {
        let result = self.enumerate_blocking(count);
        self.reset_engine();
        result
    }

    fn enumerate_blocking(&mut self, count: usize) -> Result<Vec<Config>, SolveError> {
        self.ensure_base_sat()?;

        let mut configs = Vec::new();

        while configs.len() < count {
            if !self.engine.solve()? {
                warn!(
                    "solution space exhausted: found {} of {} requested configurations",
                    configs.len(),
                    count
                );
                break;
            }
            // A model is present after every satisfiable solve.
            let model = self.engine.model().unwrap_or_default();
            let config = Config::from_model(&model, self.feature_count);
            let blocking = config.blocking_clause();
            self.engine.add_clause(&blocking[..]);
            configs.push(config);
        }

        Ok(configs)
    }

    /// Replaces the engine by a fresh one holding only the base clause set.
    fn reset_engine(&mut self) {
        let mut engine = Solver::new();
        engine.add_formula(&self.base);
        self.engine = engine;
    }
}
