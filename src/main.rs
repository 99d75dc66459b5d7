use std::path::PathBuf;

use anyhow::{Context, Result};
use citywatch_core::{Config, ConfigError};
use citywatch_weather::{CityQuery, Coordinate, WeatherError, WeatherService};
use clap::{Parser, Subcommand};
use serde::Serialize;

/// Weather for tracked cities, from the command line
#[derive(Parser, Debug)]
#[command(name = "citywatch", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Look up a city's coordinates by name
    Resolve { city: String },

    /// Current conditions at a coordinate
    Current {
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        #[arg(allow_negative_numbers = true)]
        lon: f64,
    },

    /// Daily forecast for a city, defaulting to the configured horizon
    Forecast { city: String, days: Option<u32> },

    /// Current conditions for every city in a JSON file
    Batch { file: PathBuf },
}

#[derive(Serialize)]
struct Envelope<T: Serialize> {
    success: bool,
    data: T,
}

fn print_json<T: Serialize>(data: T) -> Result<()> {
    let out = serde_json::to_string_pretty(&Envelope {
        success: true,
        data,
    })?;
    println!("{}", out);
    Ok(())
}

/// Surface a single-item failure with its user-facing message
fn single_item(err: WeatherError) -> anyhow::Error {
    tracing::debug!("Request failed: {}", err);
    anyhow::anyhow!("{} ({})", err.user_message(), err)
}

fn config_failure(err: anyhow::Error) -> anyhow::Error {
    match err.downcast_ref::<ConfigError>() {
        Some(config_err) => anyhow::anyhow!("{} ({})", config_err.user_message(), config_err),
        None => err,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    citywatch_core::init()?;

    let (config, _) = Config::load_validated().map_err(config_failure)?;
    tracing::info!("Config directory: {}", config.config_dir.display());

    let service = WeatherService::new(&config.weather).map_err(single_item)?;

    match cli.command {
        Command::Resolve { city } => {
            let place = service.resolve(&city).await.map_err(single_item)?;
            print_json(place)
        }
        Command::Current { lat, lon } => {
            let snapshot = service
                .current_weather(Coordinate::new(lat, lon))
                .await
                .map_err(single_item)?;
            print_json(snapshot.as_ref())
        }
        Command::Forecast { city, days } => {
            let forecast = service
                .forecast_for_city(&city, days)
                .await
                .map_err(single_item)?;
            print_json(forecast)
        }
        Command::Batch { file } => {
            let contents = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let queries: Vec<CityQuery> =
                serde_json::from_str(&contents).context("Cities array is required")?;
            let results = service.enrich_batch(queries).await;
            print_json(results)
        }
    }
}
