use std::env;
use std::fs;
use std::io::Write;

use anyhow::Error;
use clap::{App, AppSettings};
use env_logger::{fmt, Builder, Target};
use log::{error, info};
use log::{Level, LevelFilter, Record};

use fmsample_model::FeatureModel;

mod check;
mod convert;
mod load_system;
mod sample;

fn main() {
    let exit_code = match main_with_err() {
        Err(err) => {
            error!("{}", err);
            1
        }
        Ok(exit_code) => exit_code,
    };
    std::process::exit(exit_code);
}

fn init_logging() {
    let format = |buf: &mut fmt::Formatter, record: &Record| {
        if record.level() == Level::Info {
            writeln!(buf, "c {}", record.args())
        } else {
            writeln!(buf, "c {}: {}", record.level(), record.args())
        }
    };

    let mut builder = Builder::new();
    builder
        .target(Target::Stdout)
        .format(format)
        .filter(None, LevelFilter::Info);

    if let Ok(ref env_var) = env::var("FMSAMPLE_LOG") {
        builder.parse_filters(env_var);
    }

    builder.init();
}

fn banner() {
    info!("This is fmsample {}", env!("FMSAMPLE_VERSION"));
    info!(
        "  {} build - {}",
        env!("FMSAMPLE_PROFILE"),
        env!("FMSAMPLE_RUSTC_VERSION")
    );
}

/// Reads a feature model from an XML or feature annotated DIMACS file.
///
/// The format is selected by the file extension, everything not ending in `.xml` is read as
/// DIMACS.
fn load_model(path: &str) -> Result<FeatureModel, Error> {
    info!("Reading model '{}'", path);
    if path.ends_with(".xml") {
        Ok(fmsample_model::xml::parse_feature_model(
            &fs::read_to_string(path)?,
        )?)
    } else {
        Ok(fmsample_dimacs::parse_model(fs::File::open(path)?)?)
    }
}

fn main_with_err() -> Result<i32, Error> {
    let matches = App::new("fmsample")
        .version(env!("FMSAMPLE_VERSION"))
        .setting(AppSettings::DisableHelpSubcommand)
        .setting(AppSettings::VersionlessSubcommands)
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(convert::convert_args())
        .subcommand(load_system::load_system_args())
        .subcommand(sample::sample_args())
        .subcommand(check::check_args())
        .get_matches();

    init_logging();
    banner();

    match matches.subcommand() {
        ("convert", Some(matches)) => convert::convert_main(matches),
        ("load-system", Some(matches)) => load_system::load_system_main(matches),
        ("sample", Some(matches)) => sample::sample_main(matches),
        ("check", Some(matches)) => check::check_main(matches),
        _ => unreachable!(),
    }
}
