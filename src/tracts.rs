//! Tract enrichment: joins equity values onto tract features in place.

use serde::Serialize;
use tracing::{debug, info};

use crate::config::PropertyKeys;
use crate::equity::EquityIndex;
use crate::model::{Feature, TractProperties};

/// Outcome counts for one enrichment pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EnrichReport {
    pub matched: usize,
    pub missing: usize,
    /// Matched, but the no-vehicle share was not numeric.
    pub malformed: usize,
}

/// Writes `pct_car_free` and `total_households` onto every tract.
///
/// A tract with no identifier, or one absent from the index, gets zeros. A
/// matched row whose share is `NaN` keeps its household count but stores a
/// share of 0. The borough is only kept while the tract matches a row that
/// carries one, so re-running against a refreshed index leaves nothing stale.
#[tracing::instrument(skip_all, fields(tracts = tracts.len(), index = index.len()))]
pub fn enrich_tracts(
    tracts: &mut [Feature],
    index: &EquityIndex,
    keys: &PropertyKeys,
) -> EnrichReport {
    let mut report = EnrichReport::default();

    for tract in tracts.iter_mut() {
        let geo_id = tract
            .property_key(&keys.geo_id)
            .or_else(|| tract.property_key(&keys.geo_id_fallback));

        match geo_id.as_deref().and_then(|id| index.get(id)) {
            Some(entry) => {
                let pct = if entry.pct.is_nan() {
                    debug!(geo_id = ?geo_id, "Equity share is not numeric, storing 0");
                    report.malformed += 1;
                    0.0
                } else {
                    report.matched += 1;
                    entry.pct
                };

                tract.set_f64(&keys.pct_car_free, pct);
                tract.set_u64(&keys.total_households, entry.households);
                match entry.borough {
                    Some(borough) => tract.set_str(&keys.borough, borough),
                    None => {
                        tract.remove_property(&keys.borough);
                    }
                }
            }
            None => {
                report.missing += 1;
                tract.set_f64(&keys.pct_car_free, 0.0);
                tract.set_u64(&keys.total_households, 0);
                tract.remove_property(&keys.borough);
            }
        }
    }

    info!(
        matched = report.matched,
        missing = report.missing,
        malformed = report.malformed,
        "Tracts enriched"
    );

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equity::build_equity_index;
    use crate::model::{EquityRecord, tract};
    use serde_json::json;

    fn keys() -> PropertyKeys {
        PropertyKeys::default()
    }

    #[test]
    fn test_hit_copies_values() {
        let index = build_equity_index(&[EquityRecord::new("100", 0.6, 50)]);
        let mut tracts = vec![tract(json!({ "geoid": "100" }))];

        let report = enrich_tracts(&mut tracts, &index, &keys());

        assert_eq!(report.matched, 1);
        assert_eq!(tracts[0].property_f64("pct_car_free"), Some(0.6));
        assert_eq!(tracts[0].property_u64("total_households"), Some(50));
    }

    #[test]
    fn test_fallback_identifier_and_numeric_coercion() {
        let index = build_equity_index(&[EquityRecord::new("36047000100", 0.3, 70)]);
        let mut tracts = vec![
            tract(json!({ "GEOID": 36047000100u64 })),
            tract(json!({ "geoid": "", "GEOID": "36047000100" })),
        ];

        let report = enrich_tracts(&mut tracts, &index, &keys());

        assert_eq!(report.matched, 2);
        for t in &tracts {
            assert_eq!(t.property_u64("total_households"), Some(70));
        }
    }

    #[test]
    fn test_primary_identifier_wins() {
        let index = build_equity_index(&[
            EquityRecord::new("1", 0.1, 10),
            EquityRecord::new("2", 0.2, 20),
        ]);
        let mut tracts = vec![tract(json!({ "geoid": "1", "GEOID": "2" }))];

        enrich_tracts(&mut tracts, &index, &keys());
        assert_eq!(tracts[0].property_u64("total_households"), Some(10));
    }

    #[test]
    fn test_miss_zero_fills() {
        let index = build_equity_index(&[EquityRecord::new("100", 0.6, 50)]);
        let mut tracts = vec![
            tract(json!({ "geoid": "999", "pct_car_free": 0.9 })),
            tract(json!({})),
        ];

        let report = enrich_tracts(&mut tracts, &index, &keys());

        assert_eq!(report.missing, 2);
        for t in &tracts {
            assert_eq!(t.property_f64("pct_car_free"), Some(0.0));
            assert_eq!(t.property_u64("total_households"), Some(0));
        }
    }

    #[test]
    fn test_malformed_hit_is_counted_apart_from_miss() {
        let row = EquityRecord {
            geo_id: "100".to_string(),
            pct_no_vehicle: Some("abc".to_string()),
            total_households: Some("40".to_string()),
            county_fips: Some("47".to_string()),
        };
        let index = build_equity_index(&[row]);
        let mut tracts = vec![tract(json!({ "geoid": "100" }))];

        let report = enrich_tracts(&mut tracts, &index, &keys());

        assert_eq!(report.malformed, 1);
        assert_eq!(report.missing, 0);
        assert_eq!(tracts[0].property_f64("pct_car_free"), Some(0.0));
        assert_eq!(tracts[0].property_u64("total_households"), Some(40));
        assert_eq!(tracts[0].property_str("boroname"), Some("Brooklyn"));
    }

    #[test]
    fn test_enrich_is_idempotent() {
        let index = build_equity_index(&[
            EquityRecord::new("100", 0.6, 50),
            EquityRecord::new("200", 0.25, 80),
        ]);
        let mut tracts = vec![
            tract(json!({ "geoid": "100", "ntaname": "A" })),
            tract(json!({ "GEOID": 200 })),
            tract(json!({ "geoid": "300" })),
        ];

        enrich_tracts(&mut tracts, &index, &keys());
        let once: Vec<_> = tracts.iter().map(|t| t.properties.clone()).collect();

        enrich_tracts(&mut tracts, &index, &keys());
        let twice: Vec<_> = tracts.iter().map(|t| t.properties.clone()).collect();

        assert_eq!(once, twice);
    }

    #[test]
    fn test_refreshed_index_clears_stale_borough() {
        let before = build_equity_index(&[EquityRecord::new("100", 0.4, 30).with_county("047")]);
        let mut tracts = vec![tract(json!({ "geoid": "100" }))];
        enrich_tracts(&mut tracts, &before, &keys());
        assert_eq!(tracts[0].property_str("boroname"), Some("Brooklyn"));

        let after = build_equity_index(&[EquityRecord::new("200", 0.5, 10)]);
        enrich_tracts(&mut tracts, &after, &keys());

        let mut fresh = vec![tract(json!({ "geoid": "100" }))];
        enrich_tracts(&mut fresh, &after, &keys());

        assert_eq!(tracts[0].property("boroname"), None);
        assert_eq!(tracts[0].properties, fresh[0].properties);
    }

    #[test]
    fn test_hit_without_county_clears_borough() {
        let before = build_equity_index(&[EquityRecord::new("100", 0.4, 30).with_county("061")]);
        let after = build_equity_index(&[EquityRecord::new("100", 0.4, 30)]);
        let mut tracts = vec![tract(json!({ "geoid": "100" }))];

        enrich_tracts(&mut tracts, &before, &keys());
        assert_eq!(tracts[0].property_str("boroname"), Some("Manhattan"));

        enrich_tracts(&mut tracts, &after, &keys());
        assert_eq!(tracts[0].property("boroname"), None);
        assert_eq!(tracts[0].property_u64("total_households"), Some(30));
    }
}
