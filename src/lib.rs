//! Data pipeline behind the bike-share equity story: station summaries,
//! equity-enriched census tracts, display-zone roll-ups and chart series.

pub mod charts;
pub mod config;
pub mod equity;
pub mod fetch;
pub mod loader;
pub mod model;
pub mod narrative;
pub mod output;
pub mod pipeline;
pub mod tracts;
pub mod trips;
pub mod zones;
