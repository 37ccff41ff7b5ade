//! Regional raster engine driver.
//!
//! Loads the raster cache and runs one operation per invocation. Results
//! are printed to stdout as JSON; logs go to stderr.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::{fmt, EnvFilter};

/// Regional raster engine
#[derive(Parser, Debug)]
#[command(name = "geo-engine")]
#[command(about = "Compose, animate, convert and analyse yearly raster layers")]
struct Args {
    /// Root directory with one subdirectory per raster dataset
    #[arg(long, env = "RASTER_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Root of the per-country vector archive
    #[arg(long, env = "DATASET_PATH")]
    dataset_path: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Stack several datasets for one year into a multi-band GeoTIFF
    Compose {
        #[arg(long, default_value = "assaba")]
        region: String,
        #[arg(long)]
        year: i32,
        /// Dataset to include; repeat for more bands (order is band order)
        #[arg(long = "dataset", required = true)]
        datasets: Vec<String>,
        #[arg(long)]
        output: PathBuf,
    },

    /// Render a dataset's years as a looping GIF
    Animate {
        #[arg(long)]
        dataset: String,
        #[arg(long)]
        from: Option<i32>,
        #[arg(long)]
        to: Option<i32>,
        /// Delay between frames in milliseconds
        #[arg(long, env = "FRAME_DELAY_MS")]
        delay_ms: Option<u32>,
        #[arg(long)]
        output: PathBuf,
    },

    /// Render one year of a dataset as a static PNG
    Still {
        #[arg(long)]
        dataset: String,
        #[arg(long)]
        year: i32,
        #[arg(long)]
        output: PathBuf,
    },

    /// Convert a GeoTIFF into a tile archive
    Tiles {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },

    /// Write per-year artifacts for a dataset
    Export {
        #[arg(long)]
        dataset: String,
        #[arg(long)]
        from: i32,
        #[arg(long)]
        to: i32,
        /// Comma-separated: tif, mbtiles, geojson
        #[arg(long, value_delimiter = ',', default_value = "tif")]
        formats: Vec<String>,
        #[arg(long)]
        out_dir: PathBuf,
    },

    /// Descriptive statistics for one vector feature set
    Stats {
        #[arg(long)]
        dataset: String,
        #[arg(long)]
        region: String,
        #[arg(long)]
        year: i32,
    },

    /// Year-over-year trend for one region
    Trend {
        #[arg(long)]
        dataset: String,
        #[arg(long)]
        region: String,
        #[arg(long, value_delimiter = ',', required = true)]
        years: Vec<i32>,
    },

    /// Rank several regions for one dataset and year
    Compare {
        #[arg(long)]
        dataset: String,
        #[arg(long, value_delimiter = ',', required = true)]
        regions: Vec<String>,
        #[arg(long)]
        year: i32,
    },

    /// Correlate two datasets across years
    Correlate {
        #[arg(long)]
        region: String,
        #[arg(long, value_delimiter = ',', required = true)]
        years: Vec<i32>,
        /// Two dataset names, comma-separated
        #[arg(long, value_delimiter = ',', default_value = "PopDensity,Precipitation")]
        datasets: Vec<String>,
    },
}

fn main() -> ExitCode {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .json()
        .init();

    let settings = commands::Settings {
        data_dir: args.data_dir,
        dataset_path: args.dataset_path,
    };

    match commands::run(&settings, args.command) {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "Command failed");
            let body = serde_json::json!({ "error": format!("{:#}", e) });
            println!("{}", body);
            ExitCode::FAILURE
        }
    }
}
