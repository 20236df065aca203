use fmsample_model::{Config, FeatureModel, FeatureModelBuilder};

use varisat_formula::Var;

/// Three features: a mandatory, b excludes c, a requires b or c.
///
/// The two valid configurations are `{a, b}` and `{a, c}`. The minimal configuration `{a}` is
/// invalid, making this the smallest model that exercises option-wise repair.
pub fn abc_model() -> FeatureModel {
    let mut builder = FeatureModelBuilder::new();
    let a = builder.feature("a").unwrap();
    let b = builder.feature("b").unwrap();
    let c = builder.feature("c").unwrap();
    builder.mandatory(a).unwrap();
    builder.excludes(b, c).unwrap();
    builder
        .clause(&[a.negative(), b.positive(), c.positive()])
        .unwrap();
    builder.build()
}

/// Builds a configuration from explicit feature values.
pub fn config(bits: &[bool]) -> Config {
    let mut config = Config::disabled(bits.len());
    for (index, &bit) in bits.iter().enumerate() {
        config.set(Var::from_index(index), bit);
    }
    config
}
