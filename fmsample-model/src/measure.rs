//! Measurement parsing and the tabular transform.
//!
//! Measurements come from the SPLC result XML: one row per measured configuration, with the
//! enabled binary features, the numeric feature assignments and one column per measured
//! non-functional property. The transform turns rows into a fixed-width table over the feature
//! model, the format consumed by the learning tools downstream.
use std::fmt;
use std::io::{self, Write};

use roxmltree::Document;
use rustc_hash::FxHashSet;

use thiserror::Error;

use crate::config::Config;
use crate::features::FeatureSet;
use crate::model::FeatureModel;

/// Possible errors while parsing or transforming measurements.
#[derive(Debug, Error)]
pub enum MeasureError {
    #[error("invalid XML: {}", error)]
    Xml {
        #[from]
        error: roxmltree::Error,
    },
    #[error("row {}: no configuration column", row)]
    MissingConfiguration { row: usize },
    #[error("measurements use features not in the model: {:?}", names)]
    UnknownFeatures { names: Vec<String> },
    #[error("invalid numeric value: {}", value)]
    InvalidNumber { value: String },
    #[error("malformed numeric feature assignment: {}", text)]
    MalformedAssignment { text: String },
}

/// One measured configuration.
#[derive(Clone, Debug, Default)]
pub struct Measurement {
    /// Names of the enabled binary features.
    pub enabled: Vec<String>,
    /// Numeric feature assignments in document order.
    pub numeric: Vec<(String, f64)>,
    /// Non-functional property values in document order.
    pub nfp: Vec<(String, f64)>,
}

/// Parses SPLC measurement XML into rows.
///
/// Every element below the root is a row, `data` elements carry the values. The column name
/// attribute appears as `column` or `columname` in the wild; both are accepted. The
/// `Configuration` column lists enabled features separated by commas, `Variable Features` lists
/// `name;value` assignments, every other column is a non-functional property. Decimal commas are
/// accepted in all numbers.
pub fn parse_measurements(xml: &str) -> Result<Vec<Measurement>, MeasureError> {
    let document = Document::parse(xml)?;
    let mut rows = Vec::new();

    let row_nodes = document
        .root_element()
        .children()
        .filter(|node| node.is_element());
    for (index, row) in row_nodes.enumerate() {
        let mut measurement = Measurement::default();
        let mut has_configuration = false;

        for data in row.descendants().filter(|node| node.has_tag_name("data")) {
            let column = match data
                .attribute("column")
                .or_else(|| data.attribute("columname"))
            {
                Some(column) => column,
                None => continue,
            };
            let text = data.text().unwrap_or("");

            match column {
                "Configuration" => {
                    has_configuration = true;
                    measurement.enabled = split_names(text);
                }
                "Variable Features" => {
                    measurement.numeric = parse_assignments(text)?;
                }
                _ => {
                    let value = parse_value(text.trim())?;
                    measurement.nfp.push((column.to_owned(), value));
                }
            }
        }

        if !has_configuration {
            return Err(MeasureError::MissingConfiguration { row: index + 1 });
        }
        rows.push(measurement);
    }

    Ok(rows)
}

fn split_names(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .collect()
}

fn parse_assignments(text: &str) -> Result<Vec<(String, f64)>, MeasureError> {
    let mut assignments = Vec::new();
    for pair in text.split(',') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }
        let mut parts = pair.splitn(2, ';');
        let name = parts.next().unwrap_or("").trim();
        let value = parts.next().map(|value| value.trim().trim_end_matches(';'));
        match value {
            Some(value) if !name.is_empty() => {
                assignments.push((name.to_owned(), parse_value(value)?));
            }
            _ => {
                return Err(MeasureError::MalformedAssignment {
                    text: pair.to_owned(),
                });
            }
        }
    }
    Ok(assignments)
}

/// Parses a number, accepting a decimal comma.
fn parse_value(value: &str) -> Result<f64, MeasureError> {
    value
        .replace(',', ".")
        .parse()
        .map_err(|_| MeasureError::InvalidNumber {
            value: value.to_owned(),
        })
}

/// One cell of a [`Table`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Cell {
    /// A binary feature value.
    Bit(bool),
    /// A numeric feature or property value.
    Num(f64),
    /// No value measured for this column.
    Missing,
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Cell::Bit(value) => write!(f, "{}", *value as u8),
            Cell::Num(value) => write!(f, "{}", value),
            Cell::Missing => Ok(()),
        }
    }
}

/// A fixed-width table of measurement or configuration rows.
#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Writes the table as tab-separated text with a header line.
    pub fn write_tsv(&self, writer: &mut impl Write) -> io::Result<()> {
        writeln!(writer, "{}", self.columns.join("\t"))?;
        for row in self.rows.iter() {
            let mut first = true;
            for cell in row.iter() {
                if !first {
                    write!(writer, "\t")?;
                }
                write!(writer, "{}", cell)?;
                first = false;
            }
            writeln!(writer)?;
        }
        Ok(())
    }
}

/// One-hot encodes measurement rows over a feature model.
///
/// Columns are the binary features in variable order, then the declared numeric features, then
/// the measured properties. With exactly one property column it is named `measured_value`,
/// otherwise each gets an `nfp_` prefix. A measurement naming a feature the model does not
/// declare aborts the transform.
pub fn one_hot(
    model: &FeatureModel,
    measurements: &[Measurement],
) -> Result<Table, MeasureError> {
    let features = model.features();
    let numeric_names: Vec<&str> = model
        .numeric()
        .iter()
        .map(|feature| feature.name.as_str())
        .collect();

    // Property columns in encounter order over all rows.
    let mut nfp_names: Vec<&str> = Vec::new();
    let mut seen: FxHashSet<&str> = FxHashSet::default();
    for measurement in measurements.iter() {
        for (name, _) in measurement.nfp.iter() {
            if seen.insert(name) {
                nfp_names.push(name);
            }
        }
    }

    let mut columns: Vec<String> = features.iter().map(|(_, name)| name.to_owned()).collect();
    columns.extend(numeric_names.iter().map(|&name| name.to_owned()));
    if nfp_names.len() == 1 {
        columns.push("measured_value".to_owned());
    } else {
        columns.extend(nfp_names.iter().map(|name| format!("nfp_{}", name)));
    }

    let mut rows = Vec::with_capacity(measurements.len());
    for measurement in measurements.iter() {
        let mut unknown: Vec<String> = measurement
            .enabled
            .iter()
            .filter(|name| !features.contains(name))
            .cloned()
            .collect();
        unknown.extend(
            measurement
                .numeric
                .iter()
                .filter(|(name, _)| !numeric_names.contains(&name.as_str()))
                .map(|(name, _)| name.clone()),
        );
        if !unknown.is_empty() {
            return Err(MeasureError::UnknownFeatures { names: unknown });
        }

        let enabled: FxHashSet<&str> = measurement
            .enabled
            .iter()
            .map(|name| name.as_str())
            .collect();

        let mut row = Vec::with_capacity(columns.len());
        row.extend(
            features
                .iter()
                .map(|(_, name)| Cell::Bit(enabled.contains(name))),
        );
        for &name in numeric_names.iter() {
            row.push(lookup(&measurement.numeric, name));
        }
        for &name in nfp_names.iter() {
            row.push(lookup(&measurement.nfp, name));
        }
        rows.push(row);
    }

    Ok(Table { columns, rows })
}

fn lookup(values: &[(String, f64)], name: &str) -> Cell {
    values
        .iter()
        .find(|(key, _)| key == name)
        .map(|&(_, value)| Cell::Num(value))
        .unwrap_or(Cell::Missing)
}

/// Renders sampled configurations through the fixed-width scheme, binary columns only.
pub fn configs_to_table(features: &FeatureSet, configs: &[Config]) -> Table {
    let columns: Vec<String> = features.iter().map(|(_, name)| name.to_owned()).collect();
    let rows = configs
        .iter()
        .map(|config| {
            features
                .iter()
                .map(|(var, _)| Cell::Bit(config.enabled(var)))
                .collect()
        })
        .collect();
    Table { columns, rows }
}
