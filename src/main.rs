//! Flood-Risk Dataset Pipeline
//!
//! Builds the training table for the flood-risk classifier:
//! 1. Collects static terrain (elevation, slope) for each monitored location
//! 2. Synchronizes hourly precipitation and the high-altitude temperature proxy
//! 3. Writes the curated historical flood events
//! 4. Fuses everything into a labeled feature table
//!
//! Model training and serving are handled elsewhere; this binary only
//! produces the dataset.
//!
//! Usage:
//!   cargo run --release                          # Run every stage
//!   cargo run --release -- --stage sync          # Run one stage
//!   cargo run --release -- --config other.toml   # Use another config file
//!
//! Environment:
//!   FLOMON_CONFIG - configuration file path (default: pipeline.toml)
//!   RUST_LOG      - log filter, overrides [logging].level

use chrono::Utc;
use flomon_dataset::config::{self, DEFAULT_CONFIG_PATH, PipelineConfig};
use flomon_dataset::error::PipelineError;
use flomon_dataset::ingest::open_meteo::OpenMeteoClient;
use flomon_dataset::logging;
use flomon_dataset::pipeline::{self, RunReport, Stage};
use flomon_dataset::sync::SyncOutcome;
use std::env;
use std::path::{Path, PathBuf};

fn usage(program: &str) -> String {
    format!(
        "Usage: {} [--config PATH] [--stage terrain|sync|ground-truth|fuse|all]",
        program
    )
}

/// Loads the config file, falling back to built-in defaults only when the
/// default file is absent. An explicitly requested file must exist.
fn load_config(path: &Path, explicit: bool) -> Result<PipelineConfig, PipelineError> {
    if !explicit && path == Path::new(DEFAULT_CONFIG_PATH) && !path.exists() {
        println!("   No {} found, using built-in defaults", DEFAULT_CONFIG_PATH);
        return Ok(PipelineConfig::default());
    }
    config::load_config(path)
}

fn print_report(report: &RunReport) {
    if let Some(outcome) = &report.sync {
        match outcome {
            SyncOutcome::UpToDate => println!("   ✓ Hydro-weather data already up to date"),
            SyncOutcome::Synced(sync) => {
                println!(
                    "   ✓ Synced {}/{} locations ({} rows, {:?})",
                    sync.locations_fetched, sync.locations_attempted, sync.rows_written, sync.mode
                );
                if sync.locations_current > 0 {
                    println!(
                        "   {} locations have no new hours in the archive yet",
                        sync.locations_current
                    );
                }
                if sync.is_partial() {
                    println!("   ⚠ Skipped: {}", sync.skipped.join(", "));
                }
            }
        }
    }
    if let Some(table) = &report.table {
        println!(
            "   ✓ Training table: {} rows ({} positive, {} negative)",
            table.rows, table.positives, table.negatives
        );
        if let Some(weight) = table.scale_pos_weight {
            println!("   Class imbalance: scale_pos_weight = {:.2}", weight);
        }
    }
}

fn main() {
    dotenv::dotenv().ok();

    println!("🌊 Flood-Risk Dataset Pipeline");
    println!("==============================\n");

    // Parse command-line arguments
    let args: Vec<String> = env::args().collect();
    let mut config_override: Option<PathBuf> = None;
    let mut stage = Stage::All;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                if i + 1 < args.len() {
                    config_override = Some(PathBuf::from(&args[i + 1]));
                    i += 2;
                } else {
                    eprintln!("Error: --config requires a path");
                    std::process::exit(1);
                }
            }
            "--stage" => {
                if i + 1 < args.len() {
                    stage = match args[i + 1].parse() {
                        Ok(s) => s,
                        Err(e) => {
                            eprintln!("Error: {}", e);
                            std::process::exit(1);
                        }
                    };
                    i += 2;
                } else {
                    eprintln!("Error: --stage requires a stage name");
                    std::process::exit(1);
                }
            }
            "--help" | "-h" => {
                println!("{}", usage(&args[0]));
                return;
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                eprintln!("{}", usage(&args[0]));
                std::process::exit(1);
            }
        }
    }

    let explicit = config_override.is_some() || env::var(config::CONFIG_PATH_ENV).is_ok();
    let config_path = config_override.unwrap_or_else(config::config_path);

    println!("📋 Loading configuration from {}...", config_path.display());
    let config = match load_config(&config_path, explicit) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("\n❌ {}\n", e);
            std::process::exit(e.exit_code());
        }
    };
    println!("   {} monitored locations\n", config.locations.len());

    if let Err(e) = logging::init(&config.logging) {
        eprintln!("\n❌ Failed to initialize logging: {}\n", e);
        std::process::exit(e.exit_code());
    }

    let client = match OpenMeteoClient::new(&config.sync) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("\n❌ Failed to build HTTP client: {}\n", e);
            std::process::exit(1);
        }
    };

    println!("🔄 Running stage: {}\n", stage);
    match pipeline::run(&config, &client, stage, Utc::now()) {
        Ok(report) => {
            println!();
            print_report(&report);
            println!("\n✓ Pipeline finished");
        }
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("\n❌ Pipeline failed: {}\n", e);
            std::process::exit(e.exit_code());
        }
    }
}
