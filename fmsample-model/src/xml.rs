//! Parsers for the feature model XML dialects.
//!
//! Two dialects are supported and auto-detected from the document root: the 2015 element/constraint
//! schema (`element` nodes with id attributes and typed `constraint` blocks referencing other
//! elements by id) and the SPLC variability model (`vm` root with `binaryOptions`,
//! `numericOptions` and `booleanConstraints` blocks referencing options by name). Both lower
//! through [`FeatureModelBuilder`](crate::model::FeatureModelBuilder), so clause canonicalization
//! and deduplication are shared.
use roxmltree::{Document, Node};
use rustc_hash::FxHashMap;

use varisat_formula::{Lit, Var};

use crate::features::NumericFeature;
use crate::model::{FeatureModel, FeatureModelBuilder, ModelError};

/// Parses a feature model from XML, auto-detecting the schema.
pub fn parse_feature_model(xml: &str) -> Result<FeatureModel, ModelError> {
    let document = Document::parse(xml)?;
    let root = document.root_element();
    if root.has_tag_name("vm") {
        parse_splc(root)
    } else if root.children().any(|node| node.has_tag_name("element")) {
        parse_schema2015(root)
    } else {
        Err(ModelError::UnknownSchema)
    }
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|child| child.has_tag_name(name))
}

fn require_attribute<'a>(node: Node<'a, '_>, attribute: &str) -> Result<&'a str, ModelError> {
    node.attribute(attribute)
        .ok_or_else(|| ModelError::MissingAttribute {
            node: node.tag_name().name().to_owned(),
            attribute: attribute.to_owned(),
        })
}

fn require_child<'a, 'input>(
    node: Node<'a, 'input>,
    name: &str,
) -> Result<Node<'a, 'input>, ModelError> {
    child(node, name).ok_or_else(|| ModelError::MissingChild {
        node: node.tag_name().name().to_owned(),
        child: name.to_owned(),
    })
}

fn trimmed_text<'a>(node: Node<'a, '_>) -> &'a str {
    node.text().unwrap_or("").trim()
}

/// The 2015 element/constraint schema.
///
/// Elements declare features in document order. An element is mandatory when it is non-optional
/// and has no parent. Constraints are typed blocks below the owning element; references use the
/// target element's id.
fn parse_schema2015(root: Node) -> Result<FeatureModel, ModelError> {
    struct Element {
        var: Var,
        optional: bool,
    }

    let mut builder = FeatureModelBuilder::new();
    let mut by_id: FxHashMap<String, Element> = FxHashMap::default();

    // The id of the first element below `parentElement`, if any. An empty `parentElement` marks a
    // root-level element.
    fn parent_id<'a>(element: Node<'a, '_>) -> Option<&'a str> {
        child(element, "parentElement")?
            .children()
            .find(|node| node.is_element())
            .map(trimmed_text)
    }

    // First pass declares every element so constraints can reference forwards.
    for element in root.children().filter(|node| node.has_tag_name("element")) {
        let id = require_attribute(element, "id")?;
        let name = require_attribute(element, "name")?;
        let optional = require_attribute(element, "optional")? != "false";

        let var = builder.feature(name)?;
        if by_id
            .insert(id.to_owned(), Element { var, optional })
            .is_some()
        {
            return Err(ModelError::DuplicateId { id: id.to_owned() });
        }

        if !optional && parent_id(element).is_none() {
            builder.mandatory(var)?;
        }
    }

    let resolve = |id: &str| -> Result<&Element, ModelError> {
        by_id
            .get(id)
            .ok_or_else(|| ModelError::UnknownId { id: id.to_owned() })
    };

    for element in root.children().filter(|node| node.has_tag_name("element")) {
        let id = require_attribute(element, "id")?;
        let var = resolve(id)?.var;

        let constraints = match child(element, "constraints") {
            Some(constraints) => constraints,
            None => continue,
        };

        for constraint in constraints.children().filter(|node| node.is_element()) {
            // A reference is a child element wrapping an `id` element.
            let mut references = Vec::new();
            for reference in constraint.children().filter(|node| node.is_element()) {
                let id_node = require_child(reference, "id")?;
                references.push(resolve(trimmed_text(id_node))?.var);
            }
            if references.is_empty() {
                continue;
            }

            let kind = require_attribute(constraint, "type")?;
            match kind {
                "alternative" => {
                    let mut group = Vec::with_capacity(references.len() + 1);
                    group.push(var);
                    group.extend(references);

                    let parent = match parent_id(element) {
                        Some(parent_id) => {
                            let parent = resolve(parent_id)?;
                            if parent.optional {
                                Some(parent.var)
                            } else {
                                None
                            }
                        }
                        None => None,
                    };
                    builder.alternative(&group, parent)?;
                }
                "requires" => {
                    for &required in references.iter() {
                        builder.requires(var, required)?;
                    }
                }
                "excludes" => {
                    for &excluded in references.iter() {
                        builder.excludes(var, excluded)?;
                    }
                }
                _ => {
                    return Err(ModelError::UnsupportedConstraint {
                        kind: kind.to_owned(),
                    });
                }
            }
        }
    }

    Ok(builder.build())
}

/// The SPLC variability model schema.
fn parse_splc(root: Node) -> Result<FeatureModel, ModelError> {
    let mut builder = FeatureModelBuilder::new();

    let binary_options: Vec<Node> = match child(root, "binaryOptions") {
        Some(options) => options
            .children()
            .filter(|node| node.has_tag_name("configurationOption"))
            .collect(),
        None => Vec::new(),
    };

    let mut vars = Vec::with_capacity(binary_options.len());
    for &option in binary_options.iter() {
        let name = trimmed_text(require_child(option, "name")?);
        vars.push(builder.feature(name)?);
    }

    for (&option, &var) in binary_options.iter().zip(vars.iter()) {
        let optional = trimmed_text(require_child(option, "optional")?) == "True";

        // Options without a parent are root level; non-optional root options are mandatory.
        let parentless = match child(option, "parent") {
            Some(parent) => trimmed_text(parent).is_empty(),
            None => true,
        };
        if !optional && parentless {
            builder.mandatory(var)?;
        }

        if let Some(implied) = child(option, "impliedOptions") {
            for target in implied.children().filter(|node| node.has_tag_name("option")) {
                let target = resolve_name(&builder, trimmed_text(target))?;
                builder.requires(var, target)?;
            }
        }

        if let Some(excluded) = child(option, "excludedOptions") {
            let mut targets = Vec::new();
            for target in excluded.children().filter(|node| node.has_tag_name("option")) {
                targets.push(resolve_name(&builder, trimmed_text(target))?);
            }
            if !targets.is_empty() {
                if !optional {
                    // Non-optional exclusion group: the option or one of the options it excludes
                    // has to be selected.
                    let mut group: Vec<Lit> = Vec::with_capacity(targets.len() + 1);
                    group.push(var.positive());
                    group.extend(targets.iter().map(|&target| target.positive()));
                    builder.clause(&group)?;
                }
                for &target in targets.iter() {
                    builder.excludes(var, target)?;
                }
            }
        }
    }

    if let Some(options) = child(root, "numericOptions") {
        for option in options
            .children()
            .filter(|node| node.has_tag_name("configurationOption"))
        {
            let name = trimmed_text(require_child(option, "name")?);
            let min = parse_number(trimmed_text(require_child(option, "minValue")?))?;
            let max = parse_number(trimmed_text(require_child(option, "maxValue")?))?;
            let step = child(option, "stepFunction")
                .map(trimmed_text)
                .filter(|step| !step.is_empty())
                .map(str::to_owned);
            builder.numeric_feature(NumericFeature {
                name: name.to_owned(),
                min,
                max,
                step,
            });
        }
    }

    if let Some(constraints) = child(root, "booleanConstraints") {
        for constraint in constraints
            .children()
            .filter(|node| node.has_tag_name("constraint"))
        {
            lower_bool_constraint(&mut builder, trimmed_text(constraint))?;
        }
    }

    Ok(builder.build())
}

fn resolve_name(builder: &FeatureModelBuilder, name: &str) -> Result<Var, ModelError> {
    builder
        .features()
        .var(name)
        .ok_or_else(|| ModelError::UnknownFeature {
            name: name.to_owned(),
        })
}

/// Lowers a disjunction of possibly negated option names, `A | !B | C`.
///
/// Names are resolved as whole tokens. Constraints without any token are ignored.
fn lower_bool_constraint(
    builder: &mut FeatureModelBuilder,
    constraint: &str,
) -> Result<(), ModelError> {
    let mut literals = Vec::new();
    for token in constraint.split('|') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let (name, polarity) = match token.strip_prefix('!') {
            Some(name) => (name.trim(), false),
            None => (token, true),
        };
        literals.push(resolve_name(builder, name)?.lit(polarity));
    }
    if literals.is_empty() {
        return Ok(());
    }
    builder.clause(&literals)
}

/// Parses a number, accepting a decimal comma.
fn parse_number(value: &str) -> Result<f64, ModelError> {
    value
        .replace(',', ".")
        .parse()
        .map_err(|_| ModelError::InvalidNumber {
            value: value.to_owned(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    use varisat_formula::lits;

    fn clauses(model: &FeatureModel) -> Vec<Vec<Lit>> {
        model.formula().iter().map(|clause| clause.to_vec()).collect()
    }

    #[test]
    fn schema2015_lowering() {
        let model = parse_feature_model(
            r#"
            <featureModel>
                <element id="1" name="base" optional="false">
                    <parentElement/>
                    <constraints>
                        <constraint type="alternative">
                            <constraintElement><id>2</id></constraintElement>
                            <constraintElement><id>3</id></constraintElement>
                        </constraint>
                    </constraints>
                </element>
                <element id="2" name="fast" optional="true">
                    <parentElement><id>1</id></parentElement>
                    <constraints>
                        <constraint type="requires">
                            <constraintElement><id>4</id></constraintElement>
                        </constraint>
                    </constraints>
                </element>
                <element id="3" name="small" optional="true">
                    <parentElement><id>1</id></parentElement>
                    <constraints/>
                </element>
                <element id="4" name="cache" optional="true">
                    <parentElement><id>1</id></parentElement>
                    <constraints>
                        <constraint type="excludes">
                            <constraintElement><id>3</id></constraintElement>
                        </constraint>
                    </constraints>
                </element>
            </featureModel>
            "#,
        )
        .unwrap();

        let names: Vec<_> = model.features().iter().map(|(_, name)| name).collect();
        assert_eq!(names, vec!["base", "fast", "small", "cache"]);

        // base is mandatory, so the group over {base, fast, small} is unconditional.
        assert_eq!(
            clauses(&model),
            vec![
                lits![1].to_vec(),
                lits![1, 2, 3].to_vec(),
                lits![-1, -2].to_vec(),
                lits![-1, -3].to_vec(),
                lits![-2, -3].to_vec(),
                lits![-2, 4].to_vec(),
                lits![-3, -4].to_vec(),
            ]
        );
        assert_eq!(
            model.mandatory_features(),
            vec![true, false, false, false]
        );
    }

    #[test]
    fn schema2015_group_below_optional_parent_is_conditional() {
        let model = parse_feature_model(
            r#"
            <featureModel>
                <element id="10" name="codec" optional="true">
                    <parentElement/>
                    <constraints/>
                </element>
                <element id="11" name="gzip" optional="true">
                    <parentElement><id>10</id></parentElement>
                    <constraints>
                        <constraint type="alternative">
                            <constraintElement><id>12</id></constraintElement>
                        </constraint>
                    </constraints>
                </element>
                <element id="12" name="lz4" optional="true">
                    <parentElement><id>10</id></parentElement>
                    <constraints/>
                </element>
            </featureModel>
            "#,
        )
        .unwrap();

        assert_eq!(
            clauses(&model),
            vec![lits![-1, 2, 3].to_vec(), lits![-2, -3].to_vec()]
        );
    }

    #[test]
    fn schema2015_rejects_unknown_constraint_type() {
        let result = parse_feature_model(
            r#"
            <featureModel>
                <element id="1" name="a" optional="true">
                    <parentElement/>
                    <constraints>
                        <constraint type="commulative">
                            <constraintElement><id>2</id></constraintElement>
                        </constraint>
                    </constraints>
                </element>
                <element id="2" name="b" optional="true">
                    <parentElement/>
                    <constraints/>
                </element>
            </featureModel>
            "#,
        );
        match result {
            Err(ModelError::UnsupportedConstraint { kind }) => assert_eq!(kind, "commulative"),
            result => panic!("unexpected result {:?}", result),
        }
    }

    #[test]
    fn schema2015_rejects_unknown_references() {
        let result = parse_feature_model(
            r#"
            <featureModel>
                <element id="1" name="a" optional="true">
                    <parentElement/>
                    <constraints>
                        <constraint type="requires">
                            <constraintElement><id>9</id></constraintElement>
                        </constraint>
                    </constraints>
                </element>
            </featureModel>
            "#,
        );
        match result {
            Err(ModelError::UnknownId { id }) => assert_eq!(id, "9"),
            result => panic!("unexpected result {:?}", result),
        }
    }

    #[test]
    fn splc_lowering() {
        let model = parse_feature_model(
            r#"
            <vm name="demo">
                <binaryOptions>
                    <configurationOption>
                        <name>root</name>
                        <optional>False</optional>
                        <parent></parent>
                    </configurationOption>
                    <configurationOption>
                        <name>compress</name>
                        <optional>True</optional>
                        <parent>root</parent>
                        <impliedOptions>
                            <option>threads</option>
                        </impliedOptions>
                    </configurationOption>
                    <configurationOption>
                        <name>threads</name>
                        <optional>True</optional>
                        <parent>root</parent>
                        <excludedOptions>
                            <option>compat</option>
                        </excludedOptions>
                    </configurationOption>
                    <configurationOption>
                        <name>compat</name>
                        <optional>True</optional>
                        <parent>root</parent>
                    </configurationOption>
                </binaryOptions>
                <numericOptions>
                    <configurationOption>
                        <name>level</name>
                        <minValue>1</minValue>
                        <maxValue>9,5</maxValue>
                        <stepFunction>n + 2</stepFunction>
                    </configurationOption>
                </numericOptions>
                <booleanConstraints>
                    <constraint>compat | compress | threads</constraint>
                </booleanConstraints>
            </vm>
            "#,
        )
        .unwrap();

        let names: Vec<_> = model.features().iter().map(|(_, name)| name).collect();
        assert_eq!(names, vec!["root", "compress", "threads", "compat"]);

        assert_eq!(
            clauses(&model),
            vec![
                lits![1].to_vec(),
                lits![-2, 3].to_vec(),
                lits![-3, -4].to_vec(),
                lits![2, 3, 4].to_vec(),
            ]
        );

        assert_eq!(
            model.numeric(),
            &[NumericFeature {
                name: "level".to_owned(),
                min: 1.0,
                max: 9.5,
                step: Some("n + 2".to_owned()),
            }]
        );
    }

    #[test]
    fn splc_non_optional_exclusion_group() {
        let model = parse_feature_model(
            r#"
            <vm name="demo">
                <binaryOptions>
                    <configurationOption>
                        <name>a</name>
                        <optional>False</optional>
                        <parent>x</parent>
                        <excludedOptions>
                            <option>b</option>
                            <option>c</option>
                        </excludedOptions>
                    </configurationOption>
                    <configurationOption>
                        <name>b</name>
                        <optional>True</optional>
                        <parent>x</parent>
                    </configurationOption>
                    <configurationOption>
                        <name>c</name>
                        <optional>True</optional>
                        <parent>x</parent>
                    </configurationOption>
                    <configurationOption>
                        <name>x</name>
                        <optional>False</optional>
                        <parent></parent>
                    </configurationOption>
                </binaryOptions>
            </vm>
            "#,
        )
        .unwrap();

        assert_eq!(
            clauses(&model),
            vec![
                lits![1, 2, 3].to_vec(),
                lits![-1, -2].to_vec(),
                lits![-1, -3].to_vec(),
                lits![4].to_vec(),
            ]
        );
    }

    #[test]
    fn splc_single_literal_constraint_is_a_unit_clause() {
        let model = parse_feature_model(
            r#"
            <vm name="demo">
                <binaryOptions>
                    <configurationOption>
                        <name>a</name>
                        <optional>True</optional>
                    </configurationOption>
                    <configurationOption>
                        <name>b</name>
                        <optional>True</optional>
                    </configurationOption>
                </binaryOptions>
                <booleanConstraints>
                    <constraint>a</constraint>
                </booleanConstraints>
            </vm>
            "#,
        )
        .unwrap();

        assert_eq!(clauses(&model), vec![lits![1].to_vec()]);
        assert_eq!(model.mandatory_features(), vec![true, false]);
    }

    #[test]
    fn splc_rejects_unknown_option_names() {
        let result = parse_feature_model(
            r#"
            <vm name="demo">
                <binaryOptions>
                    <configurationOption>
                        <name>a</name>
                        <optional>True</optional>
                    </configurationOption>
                </binaryOptions>
                <booleanConstraints>
                    <constraint>a | !ghost</constraint>
                </booleanConstraints>
            </vm>
            "#,
        );
        match result {
            Err(ModelError::UnknownFeature { name }) => assert_eq!(name, "ghost"),
            result => panic!("unexpected result {:?}", result),
        }
    }

    #[test]
    fn unknown_roots_are_rejected() {
        assert!(matches!(
            parse_feature_model("<wat><thing/></wat>"),
            Err(ModelError::UnknownSchema)
        ));
    }
}
