//! Pipeline configuration.
//!
//! [`ZoneConfig`] is loaded from a JSON file shaped like:
//! ```json
//! {
//!   "group_mapping": { "Brownsville": "East Brooklyn" },
//!   "display_list": ["East Brooklyn", "Soundview & Parkchester"],
//!   "story_template": "Zones such as {NEIGHBORHOOD_1} ... over {HOUSEHOLDS} households"
//! }
//! ```
//! [`PropertyKeys`] names the tract properties read and written by the
//! pipeline; the defaults match what the map layers expect.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;

use crate::charts::TimeBucket;

/// Neighborhood → display-zone grouping plus the ordered priority zones.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ZoneConfig {
    #[serde(default, alias = "groupMapping")]
    pub group_mapping: ZoneMapping,
    #[serde(default, alias = "displayList")]
    pub display_list: Vec<String>,
    /// Overrides the built-in priority-zone story text.
    #[serde(default, alias = "storyTemplate")]
    pub story_template: Option<String>,
}

impl ZoneConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read(path).with_context(|| format!("reading zone config '{path}'"))?;
        Self::from_slice(&content)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).context("parsing zone config")
    }
}

/// Static mapping from raw neighborhood name to display-zone name.
///
/// Names absent from the mapping, or mapped to an empty string, resolve to
/// themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ZoneMapping {
    entries: HashMap<String, String>,
}

impl ZoneMapping {
    pub fn resolve<'a>(&'a self, neighborhood: &'a str) -> &'a str {
        self.entries
            .get(neighborhood)
            .map(String::as_str)
            .filter(|zone| !zone.is_empty())
            .unwrap_or(neighborhood)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ZoneMapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Property names on tract features.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PropertyKeys {
    /// Identifier property, tried first.
    pub geo_id: String,
    /// Identifier property used when `geo_id` is missing.
    pub geo_id_fallback: String,
    /// Raw neighborhood name (read-only).
    pub neighborhood: String,
    pub borough: String,
    pub pct_car_free: String,
    pub total_households: String,
    /// Household total of the tract's own neighborhood.
    pub neighborhood_households: String,
    /// Household-weighted car-free share of the tract's own neighborhood.
    pub neighborhood_avg_car_free: String,
    pub display_name: String,
    pub display_households: String,
    pub display_avg_car_free: String,
}

impl Default for PropertyKeys {
    fn default() -> Self {
        Self {
            geo_id: "geoid".to_string(),
            geo_id_fallback: "GEOID".to_string(),
            neighborhood: "ntaname".to_string(),
            borough: "boroname".to_string(),
            pct_car_free: "pct_car_free".to_string(),
            total_households: "total_households".to_string(),
            neighborhood_households: "nta_total_households".to_string(),
            neighborhood_avg_car_free: "nta_avg_car_free".to_string(),
            display_name: "display_name".to_string(),
            display_households: "display_households".to_string(),
            display_avg_car_free: "display_avg_car_free".to_string(),
        }
    }
}

/// Everything a pipeline run needs besides its input data.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub keys: PropertyKeys,
    /// How many priority zones the narrative names.
    pub top_n: usize,
    /// Time-of-day window for the station flow chart.
    pub bucket: TimeBucket,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            keys: PropertyKeys::default(),
            top_n: 2,
            bucket: TimeBucket::All,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_mapping_identity_fallback() {
        let mapping: ZoneMapping = [("Brownsville", "East Brooklyn")].into_iter().collect();

        assert_eq!(mapping.resolve("Brownsville"), "East Brooklyn");
        assert_eq!(mapping.resolve("Corona"), "Corona");
        assert_eq!(mapping.len(), 1);
    }

    #[test]
    fn test_zone_mapping_empty_target_falls_back() {
        let mapping: ZoneMapping = [("Astoria", ""), ("Corona", "Elmhurst-Corona")]
            .into_iter()
            .collect();

        assert_eq!(mapping.resolve("Astoria"), "Astoria");
        assert_eq!(mapping.resolve("Corona"), "Elmhurst-Corona");
    }

    #[test]
    fn test_zone_config_from_json() {
        let json = br#"{
            "group_mapping": { "Brownsville": "East Brooklyn", "East New York": "East Brooklyn" },
            "display_list": ["East Brooklyn", "Corona"],
            "unused": 3
        }"#;

        let config = ZoneConfig::from_slice(json).unwrap();
        assert_eq!(config.group_mapping.resolve("East New York"), "East Brooklyn");
        assert_eq!(config.display_list, vec!["East Brooklyn", "Corona"]);
        assert_eq!(config.story_template, None);
    }

    #[test]
    fn test_zone_config_missing_sections_default_empty() {
        let config = ZoneConfig::from_slice(b"{}").unwrap();
        assert!(config.group_mapping.is_empty());
        assert!(config.display_list.is_empty());
    }

    #[test]
    fn test_zone_config_rejects_malformed_json() {
        assert!(ZoneConfig::from_slice(b"{ not json").is_err());
    }

    #[test]
    fn test_zone_config_load_missing_file() {
        let err = ZoneConfig::load("/nonexistent/zones.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/zones.json"));
    }
}
