// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Cutwork CLI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cutwork::cli::{Reporter, Runner};
use cutwork::PipelineConfig;
use nalgebra::Vector3;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "cutwork")]
#[command(about = "Cutwork - hole/cut CSG pipeline with schematic outlines", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Pipeline configuration (TOML); defaults to ./cutwork.toml when present
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build every element in a JSON element file
    Build {
        /// Element file
        input: PathBuf,

        /// Write resulting meshes as JSON to this directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print schematic outlines of subtractive operations
    Outline {
        /// Element file
        input: PathBuf,

        /// Viewing distance for level of detail
        #[arg(short, long)]
        distance: Option<f64>,

        /// Extra XYZ Euler rotation applied to every outline, in radians
        #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], allow_negative_numbers = true)]
        context: Option<Vec<f64>>,

        /// Print loops as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show batching plan, mesh topology and kernel statistics
    Inspect {
        /// Element file
        input: PathBuf,

        /// Print kernel debug info as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write the effective configuration as TOML
    Config {
        /// Output file; prints to stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let default_filter = if verbose { "cutwork=debug" } else { "cutwork=warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => {
            let mut config = PipelineConfig::from_file(path)?;
            config.apply_env_overrides();
            config.validate()?;
            Ok(config)
        }
        None => PipelineConfig::load(),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    tracing::debug!("Configuration: {:?}", config);

    match cli.command {
        Commands::Build { input, output } => build_command(config, &input, output.as_deref()),
        Commands::Outline {
            input,
            distance,
            context,
            json,
        } => outline_command(config, &input, distance, context, json),
        Commands::Inspect { input, json } => inspect_command(config, &input, json),
        Commands::Config { output } => config_command(&config, output.as_deref()),
    }
}

fn ensure_exists(input: &Path) {
    if !input.exists() {
        Reporter::report_error(&format!("Input file not found: {}", input.display()));
        std::process::exit(1);
    }
}

fn build_command(config: PipelineConfig, input: &Path, output: Option<&Path>) -> Result<()> {
    ensure_exists(input);

    let mut runner = Runner::new(config);
    let runs = runner.build_file(input)?;
    for run in &runs {
        Reporter::report_build(run);
    }

    if let Some(dir) = output {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory: {:?}", dir))?;
        for run in &runs {
            let path = dir.join(format!("{}.json", run.id));
            let json = serde_json::to_string(&run.outcome.mesh)?;
            std::fs::write(&path, json)
                .with_context(|| format!("Failed to write mesh: {:?}", path))?;
            tracing::info!("Wrote {}", path.display());
        }
    }

    Ok(())
}

fn outline_command(
    config: PipelineConfig,
    input: &Path,
    distance: Option<f64>,
    context: Option<Vec<f64>>,
    json: bool,
) -> Result<()> {
    ensure_exists(input);

    let context = context.map(|angles| Vector3::new(angles[0], angles[1], angles[2]));
    let runner = Runner::new(config);
    let runs = runner.outline_file(input, context.as_ref(), distance)?;

    if json {
        let loops: Vec<_> = runs.iter().flat_map(|run| run.loops.iter()).collect();
        println!("{}", serde_json::to_string_pretty(&loops)?);
    } else {
        for run in &runs {
            Reporter::report_outlines(run);
        }
    }

    Ok(())
}

fn inspect_command(config: PipelineConfig, input: &Path, json: bool) -> Result<()> {
    ensure_exists(input);

    let mut runner = Runner::new(config);
    let inspections = runner.inspect_file(input)?;
    let info = runner.kernel().debug_info();

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        for inspection in &inspections {
            Reporter::report_inspection(inspection);
        }
        Reporter::report_debug(&info);
    }

    Ok(())
}

fn config_command(config: &PipelineConfig, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            config.save(path)?;
            println!("Configuration written to {}", path.display());
        }
        None => println!("{}", toml::to_string_pretty(config)?),
    }
    Ok(())
}
