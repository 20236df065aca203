//! Feature models and the clause encoding of their constraints.
use rustc_hash::FxHashSet;

use varisat_formula::{CnfFormula, ExtendFormula, Lit, Var};

use thiserror::Error;

use crate::features::{FeatureSet, NumericFeature};

/// Possible errors while building or parsing a feature model.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("duplicate feature name: {}", name)]
    DuplicateFeature { name: String },
    #[error("unknown feature name: {}", name)]
    UnknownFeature { name: String },
    #[error("clause uses undeclared variable {}", var)]
    UndeclaredVariable { var: isize },
    #[error("the empty clause is not a valid constraint")]
    EmptyClause,
    #[error("unsupported constraint type: {}", kind)]
    UnsupportedConstraint { kind: String },
    #[error("document root matches no known feature model schema")]
    UnknownSchema,
    #[error("invalid XML: {}", error)]
    Xml {
        #[from]
        error: roxmltree::Error,
    },
    #[error("element <{}> is missing the {} attribute", node, attribute)]
    MissingAttribute { node: String, attribute: String },
    #[error("element <{}> is missing a <{}> child", node, child)]
    MissingChild { node: String, child: String },
    #[error("invalid numeric value: {}", value)]
    InvalidNumber { value: String },
    #[error("duplicate element id: {}", id)]
    DuplicateId { id: String },
    #[error("reference to unknown element id: {}", id)]
    UnknownId { id: String },
}

/// A feature model with its constraints lowered to a CNF formula.
///
/// One boolean variable per binary feature, one clause per lowered constraint. The model is
/// immutable once built; samplers derive everything else (mandatory sets, blocking clauses,
/// cardinality bounds) from the formula without changing it.
#[derive(Debug)]
pub struct FeatureModel {
    features: FeatureSet,
    numeric: Vec<NumericFeature>,
    formula: CnfFormula,
}

impl FeatureModel {
    /// The binary features of the model.
    #[inline]
    pub fn features(&self) -> &FeatureSet {
        &self.features
    }

    /// The numeric features of the model.
    #[inline]
    pub fn numeric(&self) -> &[NumericFeature] {
        &self.numeric
    }

    /// The constraints of the model in conjunctive normal form.
    #[inline]
    pub fn formula(&self) -> &CnfFormula {
        &self.formula
    }

    /// Number of binary features.
    #[inline]
    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    /// For every feature, whether a unit clause of the formula forces it on.
    pub fn mandatory_features(&self) -> Vec<bool> {
        let mut mandatory = vec![false; self.features.len()];
        for clause in self.formula.iter() {
            if let &[lit] = clause {
                if lit.is_positive() && lit.index() < mandatory.len() {
                    mandatory[lit.index()] = true;
                }
            }
        }
        mandatory
    }
}

/// Builds a feature model by declaring features and lowering constraints to clauses.
///
/// Features have to be declared before they are used in a constraint. Lowered clauses are
/// deduplicated by their canonical sorted-literal form, so overlapping constraints do not inflate
/// the formula.
#[derive(Default)]
pub struct FeatureModelBuilder {
    features: FeatureSet,
    numeric: Vec<NumericFeature>,
    clauses: Vec<Vec<Lit>>,
    seen: FxHashSet<Vec<Lit>>,
}

impl FeatureModelBuilder {
    /// Creates a builder with no features and no constraints.
    pub fn new() -> FeatureModelBuilder {
        FeatureModelBuilder::default()
    }

    /// Declares a binary feature.
    pub fn feature(&mut self, name: &str) -> Result<Var, ModelError> {
        self.features.add(name)
    }

    /// Declares a numeric feature.
    pub fn numeric_feature(&mut self, feature: NumericFeature) {
        self.numeric.push(feature);
    }

    /// The features declared so far.
    #[inline]
    pub fn features(&self) -> &FeatureSet {
        &self.features
    }

    /// Forces a feature on with a unit clause.
    pub fn mandatory(&mut self, var: Var) -> Result<(), ModelError> {
        self.clause(&[var.positive()])
    }

    /// Lowers `a` requires `b`.
    pub fn requires(&mut self, a: Var, b: Var) -> Result<(), ModelError> {
        self.clause(&[a.negative(), b.positive()])
    }

    /// Lowers `a` excludes `b`.
    pub fn excludes(&mut self, a: Var, b: Var) -> Result<(), ModelError> {
        self.clause(&[a.negative(), b.negative()])
    }

    /// Lowers an alternative (xor) group.
    ///
    /// Emits the at-least-one clause over the group members plus a pairwise exclusion for every
    /// member pair. With `parent` given the at-least-one clause is conditional on the parent
    /// (`-parent, m1, ..., mk`), used when the group hangs below an optional feature. Without a
    /// parent the group is unconditional.
    ///
    /// A group without members would lower to an empty clause and is rejected.
    pub fn alternative(&mut self, members: &[Var], parent: Option<Var>) -> Result<(), ModelError> {
        if members.is_empty() {
            return Err(ModelError::EmptyClause);
        }

        let mut at_least_one = Vec::with_capacity(members.len() + 1);
        if let Some(parent) = parent {
            at_least_one.push(parent.negative());
        }
        at_least_one.extend(members.iter().map(|&member| member.positive()));
        self.clause(&at_least_one)?;

        for (offset, &a) in members.iter().enumerate() {
            for &b in members[offset + 1..].iter() {
                self.excludes(a, b)?;
            }
        }
        Ok(())
    }

    /// Adds a raw clause over declared features.
    ///
    /// The empty clause and literals of undeclared variables are rejected. The clause is stored in
    /// canonical form: literals sorted, repeated literals removed.
    pub fn clause(&mut self, literals: &[Lit]) -> Result<(), ModelError> {
        if literals.is_empty() {
            return Err(ModelError::EmptyClause);
        }
        for &lit in literals.iter() {
            if lit.index() >= self.features.len() {
                return Err(ModelError::UndeclaredVariable {
                    var: lit.var().to_dimacs(),
                });
            }
        }

        let mut clause = literals.to_vec();
        clause.sort_unstable();
        clause.dedup();
        if self.seen.insert(clause.clone()) {
            self.clauses.push(clause);
        }
        Ok(())
    }

    /// Number of distinct clauses added so far.
    #[inline]
    pub fn clause_count(&self) -> usize {
        self.clauses.len()
    }

    /// Finishes the model.
    ///
    /// The formula's variable count covers every declared feature, including features no clause
    /// mentions.
    pub fn build(self) -> FeatureModel {
        let mut formula = CnfFormula::new();
        formula.set_var_count(self.features.len());
        for clause in self.clauses.iter() {
            formula.add_clause(&clause[..]);
        }
        FeatureModel {
            features: self.features,
            numeric: self.numeric,
            formula,
        }
    }
}
