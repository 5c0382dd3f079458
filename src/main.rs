//! CLI entry point for the bike-share equity pipeline.
//!
//! Provides subcommands for running the full pipeline, aggregating stations
//! only, and building the auxiliary chart series.

use anyhow::Result;
use bikeshare_equity::charts::{TimeBucket, build_charts};
use bikeshare_equity::config::PipelineConfig;
use bikeshare_equity::fetch::BasicClient;
use bikeshare_equity::loader::{Sources, load_csv, load_inputs};
use bikeshare_equity::model::TripRow;
use bikeshare_equity::output::{print_json, print_pretty, write_json, write_outputs, write_station_csv};
use bikeshare_equity::pipeline::run_pipeline;
use bikeshare_equity::trips::aggregate_trips;
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "bikeshare_equity")]
#[command(about = "Builds the data layers for the bike-share equity story", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and write every output file
    Build {
        /// Trip CSV (path or URL, optionally .gz)
        #[arg(long)]
        trips: String,

        /// Census equity CSV (path or URL)
        #[arg(long)]
        equity: String,

        /// Tract GeoJSON (path or URL)
        #[arg(long)]
        tracts: String,

        /// Zone configuration JSON with group_mapping and display_list
        #[arg(long)]
        zones: String,

        /// Directory to write outputs into
        #[arg(short = 'd', long, default_value = "out")]
        out_dir: PathBuf,

        /// Number of priority zones named in the narrative
        #[arg(long, default_value_t = 2)]
        top_n: usize,

        /// Time-of-day window for station flows
        #[arg(short, long, value_enum, default_value_t = TimeBucket::All)]
        bucket: TimeBucket,
    },
    /// Aggregate trips into per-station summaries
    Stations {
        /// Trip CSV (path or URL, optionally .gz)
        #[arg(long, value_name = "FILE_OR_URL")]
        trips: String,

        /// CSV file to write station summaries to
        #[arg(short, long, default_value = "stations.csv")]
        output: PathBuf,
    },
    /// Build hourly, heatmap and station-flow chart series
    Charts {
        /// Trip CSV (path or URL, optionally .gz)
        #[arg(long, value_name = "FILE_OR_URL")]
        trips: String,

        /// Time-of-day window for station flows
        #[arg(short, long, value_enum, default_value_t = TimeBucket::All)]
        bucket: TimeBucket,

        /// JSON file to write chart series to
        #[arg(short, long, default_value = "charts.json")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/bikeshare_equity.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("bikeshare_equity.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let client = BasicClient::new();

    match cli.command {
        Commands::Build {
            trips,
            equity,
            tracts,
            zones,
            out_dir,
            top_n,
            bucket,
        } => {
            let sources = Sources {
                trips,
                equity,
                tracts,
                zones,
            };
            let config = PipelineConfig {
                top_n,
                bucket,
                ..Default::default()
            };

            let inputs = load_inputs(&client, &sources).await?;
            let output = run_pipeline(inputs, &config);

            print_pretty(&output.roll_up);
            print_json(&output.report())?;
            write_outputs(&out_dir, &output)?;

            info!(out_dir = %out_dir.display(), "Build finished");
        }
        Commands::Stations { trips, output } => {
            let rows: Vec<TripRow> = load_csv(&client, &trips).await?;
            let stations = aggregate_trips(&rows);

            write_station_csv(&output, &stations)?;
            info!(stations = stations.len(), output = %output.display(), "Station summaries written");
        }
        Commands::Charts {
            trips,
            bucket,
            output,
        } => {
            let rows: Vec<TripRow> = load_csv(&client, &trips).await?;
            let charts = build_charts(&rows, bucket);

            write_json(&output, &charts)?;
            info!(output = %output.display(), "Chart series written");
        }
    }

    Ok(())
}
