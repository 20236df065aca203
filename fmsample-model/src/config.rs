//! Total assignments to the binary features of a model.
use std::collections::BTreeMap;
use std::fmt;

use varisat_formula::{Lit, Var};

use crate::features::FeatureSet;
use crate::model::ModelError;

/// A configuration of a feature model.
///
/// A configuration assigns every binary feature of a model a value, stored densely in variable
/// order. Partial assignments are not configurations; they are passed around as literal slices
/// instead.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Config {
    values: Vec<bool>,
}

impl Config {
    /// Creates a configuration with every feature disabled.
    pub fn disabled(feature_count: usize) -> Config {
        Config {
            values: vec![false; feature_count],
        }
    }

    /// Builds a configuration from a solver model.
    ///
    /// Only literals of the first `feature_count` variables are taken over, auxiliary solver
    /// variables are ignored. Features the model leaves unassigned default to disabled, which
    /// makes the result independent of incidental solver choices on unconstrained variables.
    pub fn from_model(model: &[Lit], feature_count: usize) -> Config {
        let mut config = Config::disabled(feature_count);
        for &lit in model {
            if lit.index() < feature_count {
                config.values[lit.index()] = lit.is_positive();
            }
        }
        config
    }

    /// Number of features of the underlying model.
    #[inline]
    pub fn feature_count(&self) -> usize {
        self.values.len()
    }

    /// Whether the given feature is enabled.
    #[inline]
    pub fn enabled(&self, var: Var) -> bool {
        self.values[var.index()]
    }

    /// Enables or disables a feature.
    #[inline]
    pub fn set(&mut self, var: Var, enabled: bool) {
        self.values[var.index()] = enabled;
    }

    /// Number of enabled features.
    pub fn enabled_count(&self) -> usize {
        self.values.iter().filter(|&&value| value).count()
    }

    /// The assignment as one literal per feature, in variable order.
    pub fn lits(&self) -> Vec<Lit> {
        self.values
            .iter()
            .enumerate()
            .map(|(index, &value)| Lit::from_index(index, value))
            .collect()
    }

    /// The clause that excludes exactly this configuration.
    ///
    /// The clause contains the negation of every feature literal, so it is falsified by this
    /// assignment and by no other.
    pub fn blocking_clause(&self) -> Vec<Lit> {
        self.values
            .iter()
            .enumerate()
            .map(|(index, &value)| Lit::from_index(index, !value))
            .collect()
    }

    /// Maps feature names to `0`/`1` values.
    pub fn to_named(&self, features: &FeatureSet) -> BTreeMap<String, u8> {
        features
            .iter()
            .map(|(var, name)| (name.to_owned(), self.enabled(var) as u8))
            .collect()
    }

    /// Rebuilds a configuration from a name to `0`/`1` mapping.
    ///
    /// Names missing from the mapping default to disabled; names not declared in the feature set
    /// are an error.
    pub fn from_named(
        named: &BTreeMap<String, u8>,
        features: &FeatureSet,
    ) -> Result<Config, ModelError> {
        let mut config = Config::disabled(features.len());
        for (name, &value) in named {
            let var = features.var(name).ok_or_else(|| ModelError::UnknownFeature {
                name: name.clone(),
            })?;
            config.set(var, value != 0);
        }
        Ok(config)
    }
}

/// Formats the configuration as a bit string in variable order.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for &value in self.values.iter() {
            write!(f, "{}", value as u8)?;
        }
        Ok(())
    }
}
