use std::fs;
use std::path::Path;

use anyhow::{anyhow, Error};
use clap::{App, Arg, ArgMatches, SubCommand};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use fmsample::sample::{sample_model, Seed, Strategy, TrueRandomSampler};

use super::load_model;

pub fn sample_args() -> App<'static, 'static> {
    SubCommand::with_name("sample")
        .about("Sample configurations of a feature model")
        .arg(
            Arg::from_usage("[method] --method=[METHOD] 'The sampling strategy to use'")
                .possible_values(&Strategy::NAMES)
                .case_insensitive(true),
        )
        .arg_from_usage("[count] -n --count=[N] 'Number of configurations to sample'")
        .arg_from_usage("[seed] --seed=[SEED] 'Seed for the true-random strategy'")
        .arg_from_usage("[config-file] --config=[FILE] 'Read sampler settings from a TOML file'")
        .arg_from_usage("[model] --model=[FILE] 'The feature model (XML or annotated DIMACS)'")
        .arg_from_usage(
            "[configs] --configs=[FILE] 'Configuration list for the true-random strategy'",
        )
        .arg_from_usage("[out] --out=[DIR] 'Directory the sample artifacts are written to'")
}

/// Sampler settings from a TOML file.
///
/// Command line flags take precedence over the file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SampleOpts {
    pub method: Option<String>,
    pub count: Option<usize>,
    pub seed: Option<u64>,
}

impl SampleOpts {
    /// Overwrites the fields that are set in `other`.
    pub fn merge(&mut self, other: SampleOpts) {
        if other.method.is_some() {
            self.method = other.method;
        }
        if other.count.is_some() {
            self.count = other.count;
        }
        if other.seed.is_some() {
            self.seed = other.seed;
        }
    }
}

pub fn sample_main(matches: &ArgMatches) -> Result<i32, Error> {
    let mut opts = SampleOpts::default();

    if let Some(config_path) = matches.value_of("config-file") {
        opts.merge(toml::from_str(&fs::read_to_string(config_path)?)?);
    }
    if let Some(method) = matches.value_of("method") {
        opts.method = Some(method.to_owned());
    }
    if let Some(count) = matches.value_of("count") {
        opts.count = Some(count.parse()?);
    }
    if let Some(seed) = matches.value_of("seed") {
        opts.seed = Some(seed.parse()?);
    }

    let method = opts
        .method
        .ok_or_else(|| anyhow!("no sampling method given, use --method or a config file"))?;
    let strategy: Strategy = method.to_ascii_lowercase().parse()?;

    let out_dir = Path::new(matches.value_of("out").unwrap_or("."));
    fs::create_dir_all(out_dir)?;

    if strategy == Strategy::TrueRandom {
        let configs_path = matches.value_of("configs").ok_or_else(|| {
            anyhow!(
                "the {} strategy needs --configs with the configuration list to sample from",
                strategy
            )
        })?;
        let count = opts
            .count
            .ok_or_else(|| anyhow!("no sample count given, use --count or a config file"))?;
        let seed = match opts.seed {
            Some(seed) => Seed::Fixed(seed),
            None => Seed::Entropy,
        };

        let items: Vec<serde_json::Value> =
            serde_json::from_reader(fs::File::open(configs_path)?)?;
        info!(
            "Sampling {} of {} configurations from '{}'",
            count,
            items.len(),
            configs_path
        );

        let (sampled, remaining) = TrueRandomSampler::new(seed).sample(count, items)?;
        write_json(&out_dir.join("sampled_configurations.json"), &sampled)?;
        write_json(&out_dir.join("remaining_configurations.json"), &remaining)?;
    } else {
        let model_path = matches.value_of("model").ok_or_else(|| {
            anyhow!("the {} strategy needs --model with the feature model", strategy)
        })?;
        if opts.seed.is_some() {
            warn!("the {} strategy ignores the seed", strategy);
        }
        let count = match strategy {
            Strategy::PseudoRandom => opts
                .count
                .ok_or_else(|| anyhow!("no sample count given, use --count or a config file"))?,
            _ => opts.count.unwrap_or(0),
        };

        let model = load_model(model_path)?;
        let set = sample_model(&model, strategy, count)?;
        info!(
            "Sampled {} configurations with the {} strategy",
            set.sampled.len(),
            strategy
        );

        let named: Vec<_> = set
            .sampled
            .iter()
            .map(|config| config.to_named(model.features()))
            .collect();
        write_json(&out_dir.join("sampled_configurations.json"), &named)?;
    }

    Ok(0)
}

fn write_json(path: &Path, value: &impl Serialize) -> Result<(), Error> {
    serde_json::to_writer_pretty(fs::File::create(path)?, value)?;
    info!("Wrote '{}'", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_settings_and_flag_precedence() {
        let mut opts: SampleOpts =
            toml::from_str("method = \"option-wise\"\ncount = 10\n").unwrap();
        assert_eq!(opts.method.as_deref(), Some("option-wise"));
        assert_eq!(opts.count, Some(10));
        assert_eq!(opts.seed, None);

        opts.merge(SampleOpts {
            method: None,
            count: Some(3),
            seed: Some(7),
        });
        assert_eq!(opts.method.as_deref(), Some("option-wise"));
        assert_eq!(opts.count, Some(3));
        assert_eq!(opts.seed, Some(7));
    }

    #[test]
    fn unknown_settings_are_rejected() {
        assert!(toml::from_str::<SampleOpts>("spelling_mistake = 1\n").is_err());
    }
}
