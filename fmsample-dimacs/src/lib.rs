//! Feature annotated DIMACS CNF reader and writer.
//!
//! The format is DIMACS CNF with one extra convention: comment lines of the form `c <id> <name>`
//! declare the feature name of a variable. Every variable of the formula has to be named this way,
//! so a clause set can be turned back into configurations over named features. All other comment
//! lines are ignored.
//!
//! ```text
//! c 1 root
//! c 2 compress
//! p cnf 2 2
//! 1 0
//! -2 1 0
//! ```
//!
//! Parsing lowers through [`FeatureModelBuilder`](fmsample_model::FeatureModelBuilder), so the
//! resulting clause set is canonicalized and deduplicated like any other feature model.
use std::io;
use std::mem::take;

use rustc_hash::FxHashMap;

use varisat_formula::{Lit, Var};

use thiserror::Error;

use fmsample_model::{FeatureModel, FeatureModelBuilder, ModelError};

/// Possible errors while parsing a feature annotated DIMACS CNF file.
#[derive(Debug, Error)]
pub enum DimacsError {
    #[error("line {}: invalid header syntax: {}", line, header)]
    InvalidHeader { line: usize, header: String },
    #[error("line {}: second problem line", line)]
    DuplicateHeader { line: usize },
    #[error("line {}: clause before the problem line", line)]
    MissingHeader { line: usize },
    #[error("line {}: unexpected token in clause: {}", line, token)]
    UnexpectedToken { line: usize, token: String },
    #[error(
        "line {}: literal uses variable {} outside the declared range",
        line,
        var
    )]
    UndeclaredVariable { line: usize, var: usize },
    #[error("line {}: empty clause", line)]
    EmptyClause { line: usize },
    #[error("line {}: unterminated clause", line)]
    UnterminatedClause { line: usize },
    #[error(
        "formula has {} clauses while the header specifies {} clauses",
        clause_count,
        header_clause_count
    )]
    ClauseCount {
        clause_count: usize,
        header_clause_count: usize,
    },
    #[error("line {}: feature id {} outside the declared range", line, id)]
    FeatureIdOutOfRange { line: usize, id: usize },
    #[error("line {}: second name for feature id {}", line, id)]
    DuplicateFeatureId { line: usize, id: usize },
    #[error("line {}: feature name {} already used", line, name)]
    DuplicateFeatureName { line: usize, name: String },
    #[error("line {}: feature declaration without a name", line)]
    UnnamedFeature { line: usize },
    #[error("no name declared for variable {}", id)]
    MissingFeatureName { id: usize },
    #[error(transparent)]
    Model {
        #[from]
        error: ModelError,
    },
    #[error("IO error during parsing: {}", error)]
    Io {
        #[from]
        error: io::Error,
    },
}

/// Variable and clause count of the problem line.
#[derive(Copy, Clone, Debug)]
pub struct DimacsHeader {
    pub var_count: usize,
    pub clause_count: usize,
}

struct Decl {
    id: usize,
    name: String,
    line: usize,
}

/// Parses a feature annotated DIMACS CNF input into a feature model.
///
/// The problem line has to precede the clauses. Feature name declarations can appear anywhere;
/// after parsing every variable of the header range has to carry exactly one name. Clauses may
/// span lines and are terminated by `0`; the empty clause is rejected.
pub fn parse_model(input: impl io::Read) -> Result<FeatureModel, DimacsError> {
    use io::BufRead;

    let reader = io::BufReader::new(input);

    let mut decls: Vec<Decl> = Vec::new();
    let mut header: Option<DimacsHeader> = None;
    let mut clauses: Vec<Vec<Lit>> = Vec::new();
    let mut partial_clause: Vec<Lit> = Vec::new();
    let mut line_number = 0;

    for line in reader.lines() {
        let line = line?;
        line_number += 1;
        let content = line.trim();

        if content.is_empty() {
            continue;
        } else if let Some(comment) = content.strip_prefix('c') {
            // A comment whose first token is an integer declares a feature name.
            let mut tokens = comment.split_whitespace();
            let id = match tokens.next().map(str::parse::<usize>) {
                Some(Ok(id)) => id,
                _ => continue,
            };
            match tokens.next() {
                Some(name) => decls.push(Decl {
                    id,
                    name: name.to_owned(),
                    line: line_number,
                }),
                None => return Err(DimacsError::UnnamedFeature { line: line_number }),
            }
        } else if content.starts_with('p') {
            if header.is_some() {
                return Err(DimacsError::DuplicateHeader { line: line_number });
            }
            header = Some(parse_header(content, line_number)?);
        } else {
            let header = match header {
                Some(header) => header,
                None => return Err(DimacsError::MissingHeader { line: line_number }),
            };
            for token in content.split_whitespace() {
                let value: isize = match token.parse() {
                    Ok(value) if !(value == 0 && token.starts_with('-')) => value,
                    _ => {
                        return Err(DimacsError::UnexpectedToken {
                            line: line_number,
                            token: token.to_owned(),
                        });
                    }
                };
                if value == 0 {
                    if partial_clause.is_empty() {
                        return Err(DimacsError::EmptyClause { line: line_number });
                    }
                    clauses.push(take(&mut partial_clause));
                } else {
                    let var = value.wrapping_abs() as usize;
                    if var > header.var_count {
                        return Err(DimacsError::UndeclaredVariable {
                            line: line_number,
                            var,
                        });
                    }
                    partial_clause.push(Lit::from_dimacs(value));
                }
            }
        }
    }

    if !partial_clause.is_empty() {
        return Err(DimacsError::UnterminatedClause { line: line_number });
    }
    let header = match header {
        Some(header) => header,
        None => return Err(DimacsError::MissingHeader { line: line_number }),
    };
    if clauses.len() != header.clause_count {
        return Err(DimacsError::ClauseCount {
            clause_count: clauses.len(),
            header_clause_count: header.clause_count,
        });
    }

    let mut names: Vec<Option<String>> = vec![None; header.var_count];
    let mut name_lines: FxHashMap<String, usize> = FxHashMap::default();
    for decl in decls {
        if decl.id == 0 || decl.id > header.var_count {
            return Err(DimacsError::FeatureIdOutOfRange {
                line: decl.line,
                id: decl.id,
            });
        }
        if name_lines.contains_key(&decl.name) {
            return Err(DimacsError::DuplicateFeatureName {
                line: decl.line,
                name: decl.name,
            });
        }
        let slot = &mut names[decl.id - 1];
        if slot.is_some() {
            return Err(DimacsError::DuplicateFeatureId {
                line: decl.line,
                id: decl.id,
            });
        }
        *slot = Some(decl.name.clone());
        name_lines.insert(decl.name, decl.line);
    }

    let mut builder = FeatureModelBuilder::new();
    for (index, name) in names.iter().enumerate() {
        match name {
            Some(name) => {
                builder.feature(name)?;
            }
            None => return Err(DimacsError::MissingFeatureName { id: index + 1 }),
        }
    }
    for clause in clauses.iter() {
        builder.clause(&clause[..])?;
    }

    Ok(builder.build())
}

fn parse_header(content: &str, line: usize) -> Result<DimacsHeader, DimacsError> {
    let invalid = || DimacsError::InvalidHeader {
        line,
        header: content.to_owned(),
    };

    let mut tokens = content.split_whitespace();
    if tokens.next() != Some("p") || tokens.next() != Some("cnf") {
        return Err(invalid());
    }
    let var_count: usize = tokens
        .next()
        .and_then(|value| value.parse().ok())
        .filter(|&count| count <= Var::max_count())
        .ok_or_else(invalid)?;
    let clause_count: usize = tokens
        .next()
        .and_then(|value| value.parse().ok())
        .ok_or_else(invalid)?;
    if tokens.next().is_some() {
        return Err(invalid());
    }

    Ok(DimacsHeader {
        var_count,
        clause_count,
    })
}

/// Write the feature names as annotated comment lines.
///
/// Can be used with [`write_model`] parts to implement incremental writing.
pub fn write_feature_comments(
    target: &mut impl io::Write,
    model: &FeatureModel,
) -> io::Result<()> {
    for (var, name) in model.features().iter() {
        target.write_all(b"c ")?;
        itoa::write(&mut *target, var.to_dimacs())?;
        target.write_all(b" ")?;
        target.write_all(name.as_bytes())?;
        target.write_all(b"\n")?;
    }
    Ok(())
}

/// Write a feature model as feature annotated DIMACS CNF.
pub fn write_model(target: &mut impl io::Write, model: &FeatureModel) -> io::Result<()> {
    write_feature_comments(&mut *target, model)?;
    writeln!(
        target,
        "p cnf {var_count} {clause_count}",
        var_count = model.formula().var_count(),
        clause_count = model.formula().len()
    )?;
    for clause in model.formula().iter() {
        for lit in clause.iter() {
            itoa::write(&mut *target, lit.to_dimacs())?;
            target.write_all(b" ")?;
        }
        target.write_all(b"0\n")?;
    }
    Ok(())
}

/// Renders a feature model as an annotated DIMACS string.
pub fn to_dimacs_string(model: &FeatureModel) -> String {
    let mut bytes = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = write_model(&mut bytes, model);
    String::from_utf8_lossy(&bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    use varisat_formula::{cnf::strategy::*, lits};

    fn demo_model() -> FeatureModel {
        let mut builder = FeatureModelBuilder::new();
        let root = builder.feature("root").unwrap();
        let compress = builder.feature("compress").unwrap();
        builder.mandatory(root).unwrap();
        builder.requires(compress, root).unwrap();
        builder.build()
    }

    #[test]
    fn annotated_output() {
        assert_eq!(
            to_dimacs_string(&demo_model()),
            "c 1 root\n\
             c 2 compress\n\
             p cnf 2 2\n\
             1 0\n\
             1 -2 0\n"
        );
    }

    #[test]
    fn parses_own_output() {
        let model = demo_model();
        let parsed = parse_model(to_dimacs_string(&model).as_bytes()).unwrap();

        assert_eq!(parsed.formula(), model.formula());
        let names: Vec<_> = parsed.features().iter().map(|(_, name)| name).collect();
        assert_eq!(names, vec!["root", "compress"]);
    }

    #[test]
    fn clauses_may_span_lines_and_comments_are_ignored() {
        let parsed = parse_model(
            b"c a plain comment\n\
              c 2 b\n\
              c 1 a\n\
              p cnf 2 2\n\
              1\n\
              2 0 -1\n\
              -2 0\n" as &[_],
        )
        .unwrap();

        assert_eq!(
            parsed.formula().iter().collect::<Vec<_>>(),
            vec![&lits![1, 2][..], &lits![-1, -2][..]]
        );
        assert_eq!(parsed.features().name(Var::from_index(0)), Some("a"));
    }

    macro_rules! expect_error {
        ( $input:expr, $( $cases:tt )* ) => {
            match parse_model($input as &[_]) {
                Ok(parsed) => panic!("expected error but got {:?}", parsed),
                Err(err) => match err {
                    $( $cases )*,
                    err => panic!("unexpected error {:?}", err),
                },
            }
        };
    }

    #[test]
    fn invalid_headers() {
        expect_error!(b"p notcnf 1 3", DimacsError::InvalidHeader { .. } => ());
        expect_error!(b"p cnf 1", DimacsError::InvalidHeader { .. } => ());
        expect_error!(b"p cnf 1 2 3", DimacsError::InvalidHeader { .. } => ());
        expect_error!(b"p cnf foo bar", DimacsError::InvalidHeader { .. } => ());
        expect_error!(
            b"c 1 a\np cnf 1 1\n1 0\np cnf 1 1\n",
            DimacsError::DuplicateHeader { line: 4 } => ()
        );
    }

    #[test]
    fn clause_errors() {
        expect_error!(b"1 2 0\n", DimacsError::MissingHeader { line: 1 } => ());
        expect_error!(
            b"c 1 a\np cnf 1 1\n0\n",
            DimacsError::EmptyClause { line: 3 } => ()
        );
        expect_error!(
            b"c 1 a\np cnf 1 1\n1\n",
            DimacsError::UnterminatedClause { .. } => ()
        );
        expect_error!(
            b"c 1 a\np cnf 1 1\n1 x 0\n",
            DimacsError::UnexpectedToken { line: 3, .. } => ()
        );
        expect_error!(
            b"c 1 a\np cnf 1 1\n1 -0\n",
            DimacsError::UnexpectedToken { .. } => ()
        );
        expect_error!(
            b"c 1 a\np cnf 1 1\n2 0\n",
            DimacsError::UndeclaredVariable { line: 3, var: 2 } => ()
        );
        expect_error!(
            b"c 1 a\np cnf 1 2\n1 0\n",
            DimacsError::ClauseCount { clause_count: 1, header_clause_count: 2 } => ()
        );
    }

    #[test]
    fn name_declaration_errors() {
        expect_error!(
            b"c 1 a\nc 1 b\np cnf 1 1\n1 0\n",
            DimacsError::DuplicateFeatureId { line: 2, id: 1 } => ()
        );
        expect_error!(
            b"c 1 a\nc 2 a\np cnf 2 1\n1 0\n",
            DimacsError::DuplicateFeatureName { line: 2, .. } => ()
        );
        expect_error!(
            b"c 3 a\np cnf 2 1\n1 0\n",
            DimacsError::FeatureIdOutOfRange { line: 1, id: 3 } => ()
        );
        expect_error!(
            b"c 0 a\np cnf 2 1\n1 0\n",
            DimacsError::FeatureIdOutOfRange { line: 1, id: 0 } => ()
        );
        expect_error!(
            b"c 1\np cnf 1 1\n1 0\n",
            DimacsError::UnnamedFeature { line: 1 } => ()
        );
        expect_error!(
            b"c 1 a\np cnf 2 1\n1 0\n",
            DimacsError::MissingFeatureName { id: 2 } => ()
        );
    }

    proptest! {
        #[test]
        fn round_trip(
            (feature_count, clauses) in (2..20usize).prop_flat_map(|feature_count| {
                (
                    Just(feature_count),
                    vec_formula(Just(feature_count), 0..30, 1..8),
                )
            })
        ) {
            let mut builder = FeatureModelBuilder::new();
            for index in 0..feature_count {
                builder.feature(&format!("f{}", index + 1)).unwrap();
            }
            for clause in clauses.iter() {
                builder.clause(&clause[..]).unwrap();
            }
            let model = builder.build();

            let parsed = parse_model(to_dimacs_string(&model).as_bytes()).unwrap();

            prop_assert_eq!(parsed.formula(), model.formula());
            prop_assert_eq!(parsed.features().len(), model.features().len());
        }
    }
}
