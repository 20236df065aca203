use std::fs;

use anyhow::Error;
use clap::{App, ArgMatches, SubCommand};
use log::info;

use fmsample_model::xml::parse_feature_model;

pub fn convert_args() -> App<'static, 'static> {
    SubCommand::with_name("convert")
        .about("Convert a feature model XML file to feature annotated DIMACS CNF")
        .arg_from_usage("<input> --input=[FILE] 'The feature model XML file to read'")
        .arg_from_usage("<output> --output=[FILE] 'The DIMACS CNF file to write'")
}

pub fn convert_main(matches: &ArgMatches) -> Result<i32, Error> {
    let input = matches.value_of("input").unwrap();
    let output = matches.value_of("output").unwrap();

    let model = parse_feature_model(&fs::read_to_string(input)?)?;
    info!(
        "Parsed {} features and {} clauses from '{}'",
        model.feature_count(),
        model.formula().len(),
        input
    );

    fmsample_dimacs::write_model(&mut fs::File::create(output)?, &model)?;
    info!("Wrote '{}'", output);

    Ok(0)
}
