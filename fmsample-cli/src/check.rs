use std::collections::BTreeMap;
use std::fs;

use anyhow::Error;
use clap::{App, ArgMatches, SubCommand};
use log::{info, warn};

use fmsample::solver::ConfigSolver;
use fmsample::Config;

use super::load_model;

pub fn check_args() -> App<'static, 'static> {
    SubCommand::with_name("check")
        .about("Check a configuration list against a feature model")
        .arg_from_usage("<model> --model=[FILE] 'The feature model (XML or annotated DIMACS)'")
        .arg_from_usage("<configs> 'The configuration list to check'")
}

pub fn check_main(matches: &ArgMatches) -> Result<i32, Error> {
    let model = load_model(matches.value_of("model").unwrap())?;
    let path = matches.value_of("configs").unwrap();

    let named: Vec<BTreeMap<String, u8>> = serde_json::from_reader(fs::File::open(path)?)?;
    info!("Checking {} configurations from '{}'", named.len(), path);

    let mut solver = ConfigSolver::new(&model);
    let mut invalid = 0;
    for (index, entry) in named.iter().enumerate() {
        let config = Config::from_named(entry, model.features())?;
        if !solver.is_valid(&config)? {
            warn!("configuration {} violates the model constraints", index);
            invalid += 1;
        }
    }

    if invalid > 0 {
        info!("{} of {} configurations are invalid", invalid, named.len());
        return Ok(1);
    }

    info!("All {} configurations are valid", named.len());
    Ok(0)
}
