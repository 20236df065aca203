use std::fs;
use std::path::Path;

use anyhow::{anyhow, Error};
use clap::{App, ArgMatches, SubCommand};
use log::info;
use serde::Serialize;

use fmsample_model::measure::{one_hot, parse_measurements};
use fmsample_model::xml::parse_feature_model;

pub fn load_system_args() -> App<'static, 'static> {
    SubCommand::with_name("load-system")
        .about("Prepare the artifacts of a measured system for sampling and learning")
        .arg_from_usage(
            "<data-dir> --data-dir=[DIR] \
             'Directory containing fm.xml, measurements.xml and optionally meta.toml'",
        )
        .arg_from_usage("<out> --out=[DIR] 'Directory the artifacts are written to'")
}

#[derive(Serialize)]
struct FeatureList<'a> {
    binary: Vec<&'a str>,
    numeric: Vec<NumericEntry<'a>>,
}

#[derive(Serialize)]
struct NumericEntry<'a> {
    name: &'a str,
    min: f64,
    max: f64,
    step: Option<&'a str>,
}

pub fn load_system_main(matches: &ArgMatches) -> Result<i32, Error> {
    let data_dir = Path::new(matches.value_of("data-dir").unwrap());
    let out_dir = Path::new(matches.value_of("out").unwrap());

    let fm_path = data_dir.join("fm.xml");
    let measurements_path = data_dir.join("measurements.xml");
    for path in &[&fm_path, &measurements_path] {
        if !path.exists() {
            return Err(anyhow!("missing input file '{}'", path.display()));
        }
    }

    let model = parse_feature_model(&fs::read_to_string(&fm_path)?)?;
    info!(
        "Parsed {} features and {} clauses from '{}'",
        model.feature_count(),
        model.formula().len(),
        fm_path.display()
    );

    let measurements = parse_measurements(&fs::read_to_string(&measurements_path)?)?;
    info!("Parsed {} measurement rows", measurements.len());

    fs::create_dir_all(out_dir)?;

    fmsample_dimacs::write_model(&mut fs::File::create(out_dir.join("fm.dimacs"))?, &model)?;

    let features = FeatureList {
        binary: model.features().iter().map(|(_, name)| name).collect(),
        numeric: model
            .numeric()
            .iter()
            .map(|feature| NumericEntry {
                name: &feature.name,
                min: feature.min,
                max: feature.max,
                step: feature.step.as_deref(),
            })
            .collect(),
    };
    serde_json::to_writer_pretty(
        fs::File::create(out_dir.join("features.json"))?,
        &features,
    )?;

    let table = one_hot(&model, &measurements)?;
    table.write_tsv(&mut fs::File::create(out_dir.join("measurements.tsv"))?)?;

    let meta_path = data_dir.join("meta.toml");
    if meta_path.exists() {
        let meta: toml::Value = toml::from_str(&fs::read_to_string(&meta_path)?)?;
        serde_json::to_writer_pretty(fs::File::create(out_dir.join("meta.json"))?, &meta)?;
    }

    info!("Wrote artifacts to '{}'", out_dir.display());
    Ok(0)
}
