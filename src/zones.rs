//! Zone roll-up: household-weighted car-free statistics per neighborhood and
//! per display zone.
//!
//! Runs in two passes over the enriched tracts. Pass one sums households and
//! car-free households per neighborhood and per zone; pass two writes the
//! totals back onto every tract. All sums are complete before any tract is
//! written.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

use crate::config::{PropertyKeys, ZoneMapping};
use crate::model::{Feature, TractProperties};

/// Running sums for one display zone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ZoneAccumulator {
    pub households_sum: u64,
    /// Σ households × car-free share, not a sum of shares.
    pub car_free_households_sum: f64,
}

impl ZoneAccumulator {
    pub fn add(&mut self, households: u64, pct_car_free: f64) {
        self.households_sum += households;
        self.car_free_households_sum += households as f64 * pct_car_free;
    }

    /// Household-weighted average car-free share. Returns 0.0 for a zone
    /// without households.
    pub fn avg_car_free(&self) -> f64 {
        if self.households_sum == 0 {
            0.0
        } else {
            self.car_free_households_sum / self.households_sum as f64
        }
    }
}

/// Accumulators keyed by zone or neighborhood name.
pub type ZoneTotals = BTreeMap<String, ZoneAccumulator>;

/// Both aggregation levels produced by [`roll_up_zones`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RollUp {
    /// Keyed by raw neighborhood name.
    pub neighborhoods: ZoneTotals,
    /// Keyed by resolved display-zone name.
    pub zones: ZoneTotals,
}

/// Writes household-weighted car-free statistics onto each tract at two
/// levels: its raw neighborhood (`nta_total_households`, `nta_avg_car_free`)
/// and its display zone (`display_name`, `display_households`,
/// `display_avg_car_free`).
///
/// Tracts without a (non-empty) neighborhood do not contribute, but they
/// still read the totals of the zone their name resolves to. When a tract's
/// zone has no households, its `display_name` is the raw neighborhood name
/// rather than the mapped zone name.
#[tracing::instrument(skip_all, fields(tracts = tracts.len(), mapping = mapping.len()))]
pub fn roll_up_zones(tracts: &mut [Feature], mapping: &ZoneMapping, keys: &PropertyKeys) -> RollUp {
    let roll_up = accumulate(tracts, mapping, keys);

    for tract in tracts.iter_mut() {
        let neighborhood = tract.property_str(&keys.neighborhood).map(str::to_owned);

        let own = neighborhood
            .as_deref()
            .and_then(|n| roll_up.neighborhoods.get(n))
            .filter(|acc| acc.households_sum > 0);
        match own {
            Some(acc) => {
                tract.set_u64(&keys.neighborhood_households, acc.households_sum);
                tract.set_f64(&keys.neighborhood_avg_car_free, acc.avg_car_free());
            }
            None => {
                tract.set_u64(&keys.neighborhood_households, 0);
                tract.set_f64(&keys.neighborhood_avg_car_free, 0.0);
            }
        }

        let zone = neighborhood.as_deref().map(|n| mapping.resolve(n));
        let totals = zone
            .and_then(|z| roll_up.zones.get(z))
            .filter(|acc| acc.households_sum > 0);

        match (zone, totals) {
            (Some(zone), Some(acc)) => {
                tract.set_str(&keys.display_name, zone);
                tract.set_u64(&keys.display_households, acc.households_sum);
                tract.set_f64(&keys.display_avg_car_free, acc.avg_car_free());
            }
            _ => {
                tract.set_str(&keys.display_name, neighborhood.as_deref().unwrap_or(""));
                tract.set_u64(&keys.display_households, 0);
                tract.set_f64(&keys.display_avg_car_free, 0.0);
            }
        }
    }

    info!(
        neighborhoods = roll_up.neighborhoods.len(),
        zones = roll_up.zones.len(),
        "Zones rolled up"
    );
    roll_up
}

fn accumulate(tracts: &[Feature], mapping: &ZoneMapping, keys: &PropertyKeys) -> RollUp {
    let mut roll_up = RollUp::default();

    for tract in tracts {
        let Some(neighborhood) = tract.property_str(&keys.neighborhood) else {
            continue;
        };
        if neighborhood.is_empty() {
            continue;
        }

        let households = tract.property_u64(&keys.total_households).unwrap_or(0);
        let pct = tract
            .property_f64(&keys.pct_car_free)
            .filter(|p| p.is_finite())
            .unwrap_or(0.0);

        roll_up
            .neighborhoods
            .entry(neighborhood.to_string())
            .or_default()
            .add(households, pct);
        roll_up
            .zones
            .entry(mapping.resolve(neighborhood).to_string())
            .or_default()
            .add(households, pct);
    }

    roll_up
}
