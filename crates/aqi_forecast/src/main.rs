//! AQI Forecast
//!
//! A machine learning pipeline that forecasts the air quality index for a
//! fixed location three days ahead from hourly weather and pollution
//! observations.

use std::path::PathBuf;

use anyhow::Result;
use aqi_forecast::commands;
use clap::{Parser, Subcommand};
use database::{create_pool, run_migrations};
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Store location used when DATABASE_URL is unset.
const DEFAULT_DATABASE_URL: &str = "sqlite:aqi_forecast.db";

/// AQI Forecast
#[derive(Parser)]
#[command(name = "aqi-forecast")]
#[command(about = "3-day air quality index forecaster")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest one hourly observation into the feature store
    Ingest {
        /// Path to a JSON file holding the raw observation
        #[arg(short, long)]
        observation: PathBuf,
    },

    /// Retrain candidate models and activate the best one
    Train {
        /// Registry family to train for
        #[arg(short, long, default_value = "aqi")]
        family: String,

        /// Number of feature columns kept by correlation selection
        #[arg(short, long, default_value = "40")]
        top_k: usize,

        /// Minimum stored records before training is attempted
        #[arg(short, long, default_value = "48")]
        min_rows: usize,
    },

    /// Produce the 3-day forecast as JSON
    Forecast {
        /// Registry family to forecast with
        #[arg(short, long, default_value = "aqi")]
        family: String,

        /// Predicted values at or above this raise an alert
        #[arg(long, default_value = "200")]
        hazard_threshold: f64,

        /// Alerts escalate to severe at this value
        #[arg(long, default_value = "300")]
        severe_threshold: f64,
    },

    /// List registry artifacts, newest first
    Models {
        /// Registry family to list
        #[arg(short, long, default_value = "aqi")]
        family: String,

        /// Maximum entries to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Activate a specific model artifact by id
    Activate {
        /// Artifact UUID
        #[arg(short, long)]
        id: Uuid,
    },

    /// Run database migrations
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());
    let pool = create_pool(&database_url).await?;
    run_migrations(&pool).await?;

    match cli.command {
        Commands::Ingest { observation } => {
            commands::ingest::run(&pool, &observation).await?;
        }
        Commands::Train {
            family,
            top_k,
            min_rows,
        } => {
            commands::train::run(&pool, &family, top_k, min_rows).await?;
        }
        Commands::Forecast {
            family,
            hazard_threshold,
            severe_threshold,
        } => {
            commands::forecast::run(&pool, &family, hazard_threshold, severe_threshold).await?;
        }
        Commands::Models { family, limit } => {
            commands::models::run(&pool, &family, limit).await?;
        }
        Commands::Activate { id } => {
            commands::activate::run(&pool, id).await?;
        }
        Commands::Migrate => {
            info!("Migrations completed successfully");
        }
    }

    Ok(())
}
