//! Forecast CLI - Run price forecasts from the command line
//!
//! Fetches history for a ticker, trains or loads its model, and prints the
//! forecast as JSON. Without `--csv-dir` the built-in synthetic provider
//! serves deterministic data for the ticker catalog.
//!
//! # Usage
//! ```sh
//! cargo run --bin forecast -- AAPL --days 5
//! cargo run --bin forecast -- --list-tickers
//! ```
//!
//! # Environment Variables
//! - `STOCKCAST_LOOKBACK`, `STOCKCAST_EPOCHS`, ... - Model and training knobs
//! - `STOCKCAST_ARTIFACT_DIR` - Where trained models are stored (default: models)
//! - `RUST_LOG` - Log filter, e.g. `stockcast=debug`

use std::path::PathBuf;

use chrono::{Duration, NaiveDate, Utc};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::prelude::*;

use stockcast::{
    CsvProvider, ForecastError, ForecastRequest, MarketDataProvider, PredictionService, Result,
    ServiceConfig, SyntheticProvider,
};

#[derive(Parser)]
#[command(name = "forecast", version, about = "Stock closing-price forecasts")]
struct Args {
    /// Ticker symbol to forecast
    ticker: Option<String>,

    /// First history date (default: two years before the end date)
    #[arg(long)]
    start_date: Option<NaiveDate>,

    /// Last history date (default: today)
    #[arg(long)]
    end_date: Option<NaiveDate>,

    /// Trading days to predict
    #[arg(long, default_value_t = 5)]
    days: u32,

    /// Read history from `{TICKER}.csv` files in this directory
    #[arg(long)]
    csv_dir: Option<PathBuf>,

    /// Override the model artifact directory
    #[arg(long)]
    artifact_dir: Option<PathBuf>,

    /// Override the number of training epochs
    #[arg(long)]
    epochs: Option<usize>,

    /// Print the supported ticker catalog and exit
    #[arg(long)]
    list_tickers: bool,
}

fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    let args = Args::parse();
    if let Err(err) = run(args) {
        eprintln!("error ({}): {}", err.status_code(), err);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let mut config = ServiceConfig::from_env()?;
    if let Some(dir) = args.artifact_dir {
        config.artifact_dir = dir;
    }
    if let Some(epochs) = args.epochs {
        config.epochs = epochs;
    }

    let provider: Box<dyn MarketDataProvider> = match args.csv_dir {
        Some(dir) => Box::new(CsvProvider::new(dir)),
        None => Box::new(SyntheticProvider::new()),
    };
    let service = PredictionService::new(provider, config)?;

    if args.list_tickers {
        println!("{}", serde_json::to_string_pretty(&service.tickers())?);
        return Ok(());
    }

    let ticker = args
        .ticker
        .ok_or(ForecastError::MissingParameter { name: "ticker" })?;
    let end_date = args.end_date.unwrap_or_else(|| Utc::now().date_naive());
    let start_date = args
        .start_date
        .unwrap_or_else(|| end_date - Duration::days(730));

    info!("Stockcast {} forecasting {}", env!("CARGO_PKG_VERSION"), ticker);

    let request = ForecastRequest {
        ticker,
        start_date,
        end_date,
        prediction_days: args.days,
    };
    let response = service.forecast(&request)?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
