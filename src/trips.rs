//! Trip aggregation: folds raw trip rows into per-station summaries.

use geojson::{Feature, FeatureCollection, Geometry, Value};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::model::{StationSummary, TripRow};

/// Reduces trip rows into one [`StationSummary`] per start station name.
///
/// Rows without usable start coordinates are dropped. Station names are
/// matched exactly and the first-seen coordinates win. Output follows the
/// order in which each name first appears.
#[tracing::instrument(skip_all, fields(rows = rows.len()))]
pub fn aggregate_trips(rows: &[TripRow]) -> Vec<StationSummary> {
    let mut stations: Vec<StationSummary> = Vec::new();
    let mut by_name: HashMap<String, usize> = HashMap::new();
    let mut dropped = 0usize;

    for row in rows {
        let Some(trip) = row.to_record() else {
            dropped += 1;
            continue;
        };

        let idx = match by_name.get(&trip.start_station_name) {
            Some(&idx) => idx,
            None => {
                stations.push(StationSummary::new(
                    &trip.start_station_name,
                    trip.start_lat,
                    trip.start_lng,
                ));
                by_name.insert(trip.start_station_name.clone(), stations.len() - 1);
                stations.len() - 1
            }
        };

        stations[idx].record(trip.user_type);
    }

    debug!(dropped, "Dropped trips without start coordinates");
    info!(stations = stations.len(), "Trips aggregated");

    stations
}

/// Renders station summaries as a GeoJSON `FeatureCollection` of points.
pub fn stations_geojson(stations: &[StationSummary]) -> FeatureCollection {
    let features = stations
        .iter()
        .map(|s| {
            let mut feature = Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::Point(vec![s.lng, s.lat]))),
                id: None,
                properties: None,
                foreign_members: None,
            };
            feature.set_property("name", s.name.as_str());
            feature.set_property("count", s.count);
            feature.set_property("member", s.member);
            feature.set_property("casual", s.casual);
            feature.set_property("majority_type", s.majority_type().as_str());
            feature
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}
