//! Trip aggregations behind the auxiliary charts: hourly departures and
//! arrivals, a weekday × hour heatmap and time-of-day station flows.

use chrono::{DateTime, Datelike, NaiveDateTime, Timelike};
use serde::Serialize;
use std::collections::HashMap;
use tracing::info;

use crate::model::TripRow;

const DAY_LABELS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Parses a trip timestamp such as `2023-01-01 13:36:56.305` or an RFC 3339
/// string. Offsets are dropped; the wall-clock time is kept.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.naive_local()))
}

fn hour_of(raw: Option<&str>) -> Option<u32> {
    raw.and_then(parse_timestamp).map(|ts| ts.hour())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HourlyCount {
    pub hour: u32,
    pub departures: u64,
    pub arrivals: u64,
}

/// Departures by `started_at` hour and arrivals by `ended_at` hour, 24 rows.
pub fn hourly_counts(rows: &[TripRow]) -> Vec<HourlyCount> {
    let mut hours: Vec<HourlyCount> = (0..24)
        .map(|hour| HourlyCount {
            hour,
            ..Default::default()
        })
        .collect();

    for row in rows {
        if let Some(h) = hour_of(row.started_at.as_deref()) {
            hours[h as usize].departures += 1;
        }
        if let Some(h) = hour_of(row.ended_at.as_deref()) {
            hours[h as usize].arrivals += 1;
        }
    }

    hours
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HeatmapCell {
    pub day: &'static str,
    pub hour: u32,
    pub count: u64,
}

/// Trip starts on a full Monday-first 7 × 24 grid.
pub fn weekday_heatmap(rows: &[TripRow]) -> Vec<HeatmapCell> {
    let mut grid = [[0u64; 24]; 7];

    for row in rows {
        if let Some(ts) = row.started_at.as_deref().and_then(parse_timestamp) {
            let day = ts.weekday().num_days_from_monday() as usize;
            grid[day][ts.hour() as usize] += 1;
        }
    }

    let mut cells = Vec::with_capacity(7 * 24);
    for (day, hours) in grid.iter().enumerate() {
        for (hour, &count) in hours.iter().enumerate() {
            cells.push(HeatmapCell {
                day: DAY_LABELS[day],
                hour: hour as u32,
                count,
            });
        }
    }
    cells
}

/// Time-of-day window used to filter station flows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TimeBucket {
    #[default]
    All,
    /// 06:00–12:00
    Morning,
    /// 12:00–18:00
    Afternoon,
    /// 18:00–24:00
    Evening,
    /// 00:00–06:00
    Night,
}

impl TimeBucket {
    /// Trips with an unknown hour only fall into [`TimeBucket::All`].
    pub fn contains(self, hour: Option<u32>) -> bool {
        let Some(hour) = hour else {
            return self == TimeBucket::All;
        };
        match self {
            TimeBucket::All => true,
            TimeBucket::Morning => (6..12).contains(&hour),
            TimeBucket::Afternoon => (12..18).contains(&hour),
            TimeBucket::Evening => (18..24).contains(&hour),
            TimeBucket::Night => hour < 6,
        }
    }
}

/// Departures and arrivals at one station within a [`TimeBucket`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationFlow {
    pub id: String,
    pub name: Option<String>,
    pub lat: f64,
    pub lng: f64,
    pub start_count: u64,
    pub end_count: u64,
    pub total: u64,
    /// Departures / total, 0.5 when the station saw no trips in the window.
    pub depart_share: f64,
}

impl StationFlow {
    fn new(id: &str, name: Option<&String>, (lat, lng): (f64, f64)) -> Self {
        Self {
            id: id.to_string(),
            name: name.cloned(),
            lat,
            lng,
            start_count: 0,
            end_count: 0,
            total: 0,
            depart_share: 0.5,
        }
    }

    fn finish(&mut self) {
        self.total = self.start_count + self.end_count;
        if self.total > 0 {
            self.depart_share = self.start_count as f64 / self.total as f64;
        }
    }
}

/// Builds per-station flows keyed by station id.
///
/// Stations are registered from both trip ends (when the id and coordinates
/// are present) in first-seen order. The window is decided by the trip's
/// start hour for both its departure and its arrival.
#[tracing::instrument(skip_all, fields(rows = rows.len(), bucket = ?bucket))]
pub fn station_flows(rows: &[TripRow], bucket: TimeBucket) -> Vec<StationFlow> {
    let mut flows: Vec<StationFlow> = Vec::new();
    let mut by_id: HashMap<String, usize> = HashMap::new();

    let mut register = |id: Option<&String>, name: Option<&String>, coords: Option<(f64, f64)>| {
        if let (Some(id), Some(coords)) = (id, coords) {
            if !by_id.contains_key(id) {
                by_id.insert(id.clone(), flows.len());
                flows.push(StationFlow::new(id, name, coords));
            }
        }
    };

    for row in rows {
        let start = row.to_record().map(|t| (t.start_lat, t.start_lng));
        register(row.start_station_id.as_ref(), row.start_station_name.as_ref(), start);
        register(row.end_station_id.as_ref(), row.end_station_name.as_ref(), row.end_coords());
    }

    for row in rows {
        if !bucket.contains(hour_of(row.started_at.as_deref())) {
            continue;
        }
        if let Some(&idx) = row.start_station_id.as_ref().and_then(|id| by_id.get(id)) {
            flows[idx].start_count += 1;
        }
        if let Some(&idx) = row.end_station_id.as_ref().and_then(|id| by_id.get(id)) {
            flows[idx].end_count += 1;
        }
    }

    flows.iter_mut().for_each(StationFlow::finish);
    info!(stations = flows.len(), ?bucket, "Station flows computed");

    flows
}

/// Everything the chart layer consumes, written as one JSON document.
#[derive(Debug, Clone, Serialize)]
pub struct ChartSet {
    pub hourly: Vec<HourlyCount>,
    pub heatmap: Vec<HeatmapCell>,
    pub bucket: TimeBucket,
    pub station_flows: Vec<StationFlow>,
}

pub fn build_charts(rows: &[TripRow], bucket: TimeBucket) -> ChartSet {
    ChartSet {
        hourly: hourly_counts(rows),
        heatmap: weekday_heatmap(rows),
        bucket,
        station_flows: station_flows(rows, bucket),
    }
}
