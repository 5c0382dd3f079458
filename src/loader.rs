//! Loads the four pipeline inputs concurrently.
//!
//! The loads are joined behind a single barrier: if any one of them fails the
//! whole load fails and no partial inputs are returned.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use tracing::info;

use crate::config::ZoneConfig;
use crate::fetch::{HttpClient, fetch_source};
use crate::model::{EquityRecord, FeatureCollection, TripRow};

/// Where each input lives: a local path or an HTTP(S) URL.
#[derive(Debug, Clone)]
pub struct Sources {
    pub trips: String,
    pub equity: String,
    pub tracts: String,
    pub zones: String,
}

/// Parsed pipeline inputs.
#[derive(Debug, Clone)]
pub struct Inputs {
    pub trips: Vec<TripRow>,
    pub equity: Vec<EquityRecord>,
    pub tracts: FeatureCollection,
    pub zones: ZoneConfig,
}

#[tracing::instrument(skip(client))]
pub async fn load_inputs<C: HttpClient>(client: &C, sources: &Sources) -> Result<Inputs> {
    let (trips, equity, tracts, zones) = tokio::try_join!(
        load_csv::<_, TripRow>(client, &sources.trips),
        load_csv::<_, EquityRecord>(client, &sources.equity),
        load_json::<_, FeatureCollection>(client, &sources.tracts),
        load_json::<_, ZoneConfig>(client, &sources.zones),
    )?;

    info!(
        trips = trips.len(),
        equity_rows = equity.len(),
        tracts = tracts.features.len(),
        zone_mappings = zones.group_mapping.len(),
        "Inputs loaded"
    );

    Ok(Inputs {
        trips,
        equity,
        tracts,
        zones,
    })
}

pub async fn load_csv<C: HttpClient, T: DeserializeOwned>(
    client: &C,
    source: &str,
) -> Result<Vec<T>> {
    let bytes = fetch_source(client, source).await?;
    parse_csv(&bytes).with_context(|| format!("parsing CSV '{source}'"))
}

pub async fn load_json<C: HttpClient, T: DeserializeOwned>(client: &C, source: &str) -> Result<T> {
    let bytes = fetch_source(client, source).await?;
    serde_json::from_slice(&bytes).with_context(|| format!("parsing JSON '{source}'"))
}

/// Deserializes every row of a headed CSV document.
pub fn parse_csv<T: DeserializeOwned>(bytes: &[u8]) -> Result<Vec<T>> {
    let mut rdr = csv::Reader::from_reader(bytes);
    let mut rows = Vec::new();

    for result in rdr.deserialize() {
        let record: T = result?;
        rows.push(record);
    }

    Ok(rows)
}
