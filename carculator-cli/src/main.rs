use std::path::PathBuf;

use clap::{Parser, Subcommand};

use carculator_core::prelude::*;

/// Reshapes scenario files into the arrays used by life cycle inventories.
/// After running `cargo build --release`, run with
/// ```bash
/// ./target/release/carculator-cli electricity-mix --model remind --file remind_SSP2.csv --region EUR --years 2020,2030,2040
/// ./target/release/carculator-cli fleet-array --file fleet.csv --scope scope.yaml --format yaml
/// ```
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct CarculatorApi {
    #[clap(subcommand)]
    command: Command,
    /// Output format: `json` or `yaml`
    #[clap(long, value_parser, default_value = "json", global = true)]
    format: String,
    /// Write the result to this file instead of stdout; format follows its extension
    #[clap(long, short, value_parser, global = true)]
    output: Option<PathBuf>,
    /// Log progress; `RUST_LOG` overrides this
    #[clap(long, short, action, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Electricity mix of a region from an IAM output table
    ElectricityMix {
        /// IAM the table comes from: `remind` or `image`
        #[clap(long, value_parser)]
        model: String,
        /// Path to the IAM table (csv for remind, spreadsheet for image)
        #[clap(long, value_parser)]
        file: PathBuf,
        /// IAM region, e.g. `EUR`
        #[clap(long, value_parser)]
        region: String,
        /// Comma separated years to return shares for
        #[clap(long, value_parser, value_delimiter = ',', required = true)]
        years: Vec<u32>,
        /// Label mapping file replacing the packaged one
        #[clap(long, value_parser)]
        labels: Option<PathBuf>,
        /// Extraction settings (yaml or json)
        #[clap(long, value_parser)]
        config: Option<PathBuf>,
    },
    /// Fleet composition array from an IAM fleet file
    FleetComposition {
        /// Path to the comma-delimited fleet composition file
        #[clap(long, value_parser)]
        file: PathBuf,
        /// Fleet settings (yaml or json)
        #[clap(long, value_parser)]
        config: Option<PathBuf>,
    },
    /// Validated, densified fleet array
    FleetArray {
        /// Path to the semicolon-delimited fleet array
        #[clap(long, value_parser)]
        file: PathBuf,
        /// Scope the array must fit in (yaml or json)
        #[clap(long, value_parser)]
        scope: PathBuf,
    },
}

fn emit<T: SerdeAPI>(result: &T, api: &CarculatorApi) -> anyhow::Result<()> {
    match &api.output {
        Some(path) => result.to_file(path),
        None => {
            println!("{}", result.to_str(&api.format)?);
            Ok(())
        }
    }
}

pub fn main() -> anyhow::Result<()> {
    let api = CarculatorApi::parse();
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if api.verbose { "info" } else { "warn" }),
    )
    .init();

    match &api.command {
        Command::ElectricityMix {
            model,
            file,
            region,
            years,
            labels,
            config,
        } => {
            let config = match config {
                Some(path) => ElectricityMixConfig::from_file(path)?,
                None => ElectricityMixConfig::default(),
            };
            let mix = match labels {
                Some(labels) => extract_electricity_mix_with_labels(
                    model, labels, file, region, years, config,
                )?,
                None => extract_electricity_mix(model, file, region, years, config)?,
            };
            log::info!("Extracted {} mix of {region} for {years:?}", model);
            emit(&mix, &api)
        }
        Command::FleetComposition { file, config } => {
            let config = match config {
                Some(path) => FleetConfig::from_file(path)?,
                None => FleetConfig::default(),
            };
            let fleet = build_fleet_composition(file, &config)?;
            log::info!(
                "Built fleet composition for {} regions and {} years",
                fleet.regions.len(),
                fleet.years.len()
            );
            emit(&fleet, &api)
        }
        Command::FleetArray { file, scope } => {
            let scope = Scope::from_file(scope)?;
            let fleet = build_fleet_array(file, &scope)?;
            emit(&fleet, &api)
        }
    }
}
