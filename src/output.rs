//! Output formatting and persistence for pipeline results.
//!
//! Supports pretty-printing, JSON logging, and writing the files the map and
//! chart layers load.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

use crate::model::StationSummary;
use crate::pipeline::PipelineOutput;
use crate::trips::stations_geojson;

pub const TRACTS_FILE: &str = "tracts.geojson";
pub const STATIONS_GEOJSON_FILE: &str = "stations.geojson";
pub const STATIONS_CSV_FILE: &str = "stations.csv";
pub const SUMMARY_FILE: &str = "summary.json";
pub const CHARTS_FILE: &str = "charts.json";

/// Logs a value using Rust's debug pretty-print format.
pub fn print_pretty<T: std::fmt::Debug>(value: &T) {
    debug!("{:#?}", value);
}

/// Logs a value as pretty-printed JSON.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Writes station summaries as CSV, replacing any existing file.
pub fn write_station_csv(path: &Path, stations: &[StationSummary]) -> Result<()> {
    debug!(path = %path.display(), rows = stations.len(), "Writing station CSV");

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating '{}'", path.display()))?;
    for station in stations {
        writer.serialize(station)?;
    }
    writer.flush()?;

    Ok(())
}

/// Serializes a value as JSON to `path`, replacing any existing file.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    debug!(path = %path.display(), "Writing JSON");

    let file = File::create(path).with_context(|| format!("creating '{}'", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, value)?;
    writer.flush()?;

    Ok(())
}

/// Writes every output file of a pipeline run into `out_dir`.
#[tracing::instrument(skip_all, fields(out_dir = %out_dir.display()))]
pub fn write_outputs(out_dir: &Path, output: &PipelineOutput) -> Result<()> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("creating output directory '{}'", out_dir.display()))?;

    write_json(&out_dir.join(TRACTS_FILE), &output.tracts)?;
    write_json(
        &out_dir.join(STATIONS_GEOJSON_FILE),
        &stations_geojson(&output.stations),
    )?;
    write_station_csv(&out_dir.join(STATIONS_CSV_FILE), &output.stations)?;
    write_json(&out_dir.join(SUMMARY_FILE), &output.report())?;
    write_json(&out_dir.join(CHARTS_FILE), &output.charts)?;

    info!("Outputs written");
    Ok(())
}
