//! Named binary and numeric features.
use rustc_hash::FxHashMap;

use varisat_formula::Var;

use crate::model::ModelError;

/// An ordered set of named binary features.
///
/// Every binary feature is a boolean decision variable. Features are numbered in insertion order,
/// so the first feature added becomes `Var::from_index(0)`. For user IO the 1-based DIMACS id
/// `var.to_dimacs()` is used.
#[derive(Clone, Debug, Default)]
pub struct FeatureSet {
    names: Vec<String>,
    by_name: FxHashMap<String, Var>,
}

impl FeatureSet {
    /// Creates an empty feature set.
    pub fn new() -> FeatureSet {
        FeatureSet::default()
    }

    /// Adds a feature, assigning it the next free variable.
    ///
    /// Feature names are unique within a set; adding a name a second time is an error.
    pub fn add(&mut self, name: &str) -> Result<Var, ModelError> {
        if self.by_name.contains_key(name) {
            return Err(ModelError::DuplicateFeature {
                name: name.to_owned(),
            });
        }
        let var = Var::from_index(self.names.len());
        self.names.push(name.to_owned());
        self.by_name.insert(name.to_owned(), var);
        Ok(var)
    }

    /// The variable of the feature with the given name.
    #[inline]
    pub fn var(&self, name: &str) -> Option<Var> {
        self.by_name.get(name).copied()
    }

    /// The name of the feature represented by the given variable.
    #[inline]
    pub fn name(&self, var: Var) -> Option<&str> {
        self.names.get(var.index()).map(|name| name.as_str())
    }

    /// Whether a feature with the given name exists.
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Number of features in the set.
    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the set contains no features.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterates over all features in variable order.
    pub fn iter(&self) -> impl Iterator<Item = (Var, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(index, name)| (Var::from_index(index), name.as_str()))
    }

    /// Iterates over the variables of all features in order.
    pub fn vars(&self) -> impl Iterator<Item = Var> {
        (0..self.names.len()).map(Var::from_index)
    }
}

/// A numeric feature of the configured system.
///
/// Numeric features pass through parsing and the measurement table but take no part in the boolean
/// encoding. The step function is kept as the unparsed source expression.
#[derive(Clone, Debug, PartialEq)]
pub struct NumericFeature {
    pub name: String,
    pub min: f64,
    pub max: f64,
    pub step: Option<String>,
}
