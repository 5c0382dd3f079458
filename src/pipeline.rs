//! Runs the aggregation stages in order over loaded inputs.

use serde::Serialize;
use tracing::info;

use crate::charts::{ChartSet, build_charts};
use crate::config::PipelineConfig;
use crate::equity::build_equity_index;
use crate::loader::Inputs;
use crate::model::{FeatureCollection, StationSummary};
use crate::narrative::{NarrativeSummary, PRIORITY_ZONES_TEMPLATE, summarize};
use crate::tracts::{EnrichReport, enrich_tracts};
use crate::trips::aggregate_trips;
use crate::zones::{RollUp, roll_up_zones};

/// Everything the map and chart layers consume from one run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub stations: Vec<StationSummary>,
    pub tracts: FeatureCollection,
    pub summary: NarrativeSummary,
    pub enrich: EnrichReport,
    pub roll_up: RollUp,
    pub charts: ChartSet,
}

/// Counts logged and written alongside the outputs.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport<'a> {
    pub stations: usize,
    pub tracts: usize,
    pub neighborhoods: usize,
    pub zones: usize,
    pub enrich: &'a EnrichReport,
    pub summary: &'a NarrativeSummary,
}

impl PipelineOutput {
    pub fn report(&self) -> RunReport<'_> {
        RunReport {
            stations: self.stations.len(),
            tracts: self.tracts.features.len(),
            neighborhoods: self.roll_up.neighborhoods.len(),
            zones: self.roll_up.zones.len(),
            enrich: &self.enrich,
            summary: &self.summary,
        }
    }
}

/// Trip aggregation, equity index, tract enrichment, zone roll-up, then the
/// narrative summary and chart aggregations. Each stage sees only the
/// finished output of the one before it.
#[tracing::instrument(skip_all)]
pub fn run_pipeline(inputs: Inputs, config: &PipelineConfig) -> PipelineOutput {
    let Inputs {
        trips,
        equity,
        mut tracts,
        zones: zone_config,
    } = inputs;

    let stations = aggregate_trips(&trips);

    let index = build_equity_index(&equity);
    let enrich = enrich_tracts(&mut tracts.features, &index, &config.keys);

    let roll_up = roll_up_zones(&mut tracts.features, &zone_config.group_mapping, &config.keys);

    let summary = summarize(
        &tracts.features,
        &zone_config.display_list,
        config.top_n,
        zone_config
            .story_template
            .as_deref()
            .unwrap_or(PRIORITY_ZONES_TEMPLATE),
        &config.keys,
    );

    let charts = build_charts(&trips, config.bucket);

    info!(
        stations = stations.len(),
        tracts = tracts.features.len(),
        zones = roll_up.zones.len(),
        priority_households = summary.priority_households,
        "Pipeline complete"
    );

    PipelineOutput {
        stations,
        tracts,
        summary,
        enrich,
        roll_up,
        charts,
    }
}
