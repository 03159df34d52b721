#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line entry point for grid risk prediction.
//!
//! Loads the two reference tables and the model artifact once, then
//! either scores a single ad-hoc query from flags or scores every row
//! of an uploaded CSV and writes the outcomes as CSV to stdout. All
//! parsing of the uploaded file and all presentation live here; the
//! pipelines only see typed records.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use danger_grid_model::LogisticModel;
use danger_grid_predict::Predictor;
use danger_grid_predict_models::{BatchRecord, Prediction, QueryRequest};
use danger_grid_store::ReferenceStore;

/// Score locations against the pre-trained grid risk model.
#[derive(Parser)]
#[command(name = "danger_grid")]
#[command(about = "Score locations against the pre-trained grid risk model")]
struct Cli {
    /// Path to the grid-statistics CSV.
    #[arg(long, default_value = "data/grid_summary_time.csv")]
    grid_stats: PathBuf,

    /// Path to the intersection-lookup CSV.
    #[arg(long, default_value = "data/intersection_lookup.csv")]
    intersections: PathBuf,

    /// Path to the model artifact JSON.
    #[arg(long, default_value = "data/danger_grid_model.json")]
    model: PathBuf,

    /// Subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Score a single location and time.
    Query {
        /// Latitude, e.g. 40.712.
        #[arg(long)]
        latitude: Option<String>,

        /// Longitude, e.g. -74.006.
        #[arg(long)]
        longitude: Option<String>,

        /// First street of an intersection (used when no coordinates).
        #[arg(long)]
        primary_street: Option<String>,

        /// Second street of an intersection.
        #[arg(long)]
        secondary_street: Option<String>,

        /// Hour of day, 0-23 (default 12).
        #[arg(long)]
        hour: Option<String>,

        /// Day of week, 0-6 (default 2).
        #[arg(long)]
        dayofweek: Option<String>,
    },

    /// Score every row of a CSV and write outcomes to stdout.
    Batch {
        /// Input CSV with latitude/longitude or "Primary address" /
        /// "Secondary address" columns, plus optional hour/dayofweek.
        input: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();

    let cli = Cli::parse();

    let store = ReferenceStore::from_csv_paths(&cli.grid_stats, &cli.intersections)?;
    let model = LogisticModel::load(&cli.model)?;
    let predictor = Predictor::new(store, model);

    match cli.command {
        Commands::Query {
            latitude,
            longitude,
            primary_street,
            secondary_street,
            hour,
            dayofweek,
        } => {
            let request = QueryRequest {
                latitude,
                longitude,
                primary_street,
                secondary_street,
                hour,
                dayofweek,
            };
            let prediction = predictor.query(&request)?;
            println!("Prediction: {}", prediction.query_message());
            if prediction != Prediction::InvalidInput {
                println!("Confidence: {}", prediction.confidence_display());
            }
        }
        Commands::Batch { input } => {
            let rows: Vec<BatchRecord> = csv::Reader::from_path(&input)?
                .deserialize()
                .collect::<Result<Vec<_>, _>>()?;
            log::info!("Scoring {} rows from {}", rows.len(), input.display());

            let outcomes = predictor.batch(&rows);

            let mut writer = csv::Writer::from_writer(std::io::stdout());
            writer.write_record([
                "Primary address",
                "Secondary address",
                "latitude",
                "longitude",
                "hour",
                "dayofweek",
                "prediction",
                "confidence",
            ])?;
            for outcome in outcomes {
                writer.write_record([
                    outcome.primary_street.as_str(),
                    outcome.secondary_street.as_str(),
                    outcome.latitude.as_str(),
                    outcome.longitude.as_str(),
                    &outcome.hour.to_string(),
                    &outcome.dayofweek.to_string(),
                    outcome.prediction.label(),
                    &outcome.prediction.confidence_display(),
                ])?;
            }
            writer.flush()?;
        }
    }

    Ok(())
}
