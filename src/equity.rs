//! Equity lookup: indexes census equity rows by geographic identifier.

use std::collections::HashMap;
use tracing::{info, warn};

use crate::model::EquityRecord;

/// Equity values for one geographic unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EquityEntry {
    /// Share of households without a vehicle. `NaN` when the source cell was
    /// not numeric.
    pub pct: f64,
    pub households: u64,
    pub borough: Option<&'static str>,
}

/// Lookup from identifier (verbatim string) to [`EquityEntry`].
#[derive(Debug, Clone, Default)]
pub struct EquityIndex {
    entries: HashMap<String, EquityEntry>,
}

impl EquityIndex {
    pub fn get(&self, geo_id: &str) -> Option<&EquityEntry> {
        self.entries.get(geo_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Builds the equity index. Identifiers are used verbatim (`"5"` and
/// `"005"` stay distinct) and later duplicates overwrite earlier ones.
#[tracing::instrument(skip_all, fields(rows = rows.len()))]
pub fn build_equity_index(rows: &[EquityRecord]) -> EquityIndex {
    let mut entries = HashMap::with_capacity(rows.len());
    let mut malformed = 0usize;

    for row in rows {
        let pct = coerce_pct(row.pct_no_vehicle.as_deref());
        if pct.is_nan() {
            malformed += 1;
        }

        let entry = EquityEntry {
            pct,
            households: coerce_households(row.total_households.as_deref()),
            borough: row.county_fips.as_deref().map(borough_for_county),
        };
        entries.insert(row.geo_id.clone(), entry);
    }

    if malformed > 0 {
        warn!(malformed, "Equity rows with non-numeric no-vehicle share");
    }
    info!(entries = entries.len(), "Equity index built");

    EquityIndex { entries }
}

/// Parses a no-vehicle share. Blank cells read as 0, anything else that is
/// not a number reads as `NaN`.
pub fn coerce_pct(raw: Option<&str>) -> f64 {
    let raw = raw.map(str::trim).unwrap_or("");
    if raw.is_empty() {
        return 0.0;
    }
    raw.parse::<f64>().unwrap_or(f64::NAN)
}

/// Parses a household count. Blank, non-numeric, negative and non-finite
/// values read as 0; fractional counts are truncated.
pub fn coerce_households(raw: Option<&str>) -> u64 {
    match raw.map(str::trim).and_then(|s| s.parse::<f64>().ok()) {
        Some(n) if n.is_finite() && n >= 0.0 => n as u64,
        _ => 0,
    }
}

/// Maps a New York county FIPS code to its borough name. Both bare and
/// zero-padded codes are accepted; unknown codes map to `"NYC"`.
pub fn borough_for_county(fips: &str) -> &'static str {
    match fips.trim() {
        "5" | "005" => "Bronx",
        "47" | "047" => "Brooklyn",
        "61" | "061" => "Manhattan",
        "81" | "081" => "Queens",
        "85" | "085" => "Staten Island",
        _ => "NYC",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_write_wins() {
        let rows = vec![
            EquityRecord::new("100", 0.2, 10),
            EquityRecord::new("200", 0.4, 20),
            EquityRecord::new("100", 0.6, 50),
        ];

        let index = build_equity_index(&rows);
        assert_eq!(index.len(), 2);

        let entry = index.get("100").unwrap();
        assert_eq!(entry.pct, 0.6);
        assert_eq!(entry.households, 50);
    }

    #[test]
    fn test_identifiers_are_verbatim() {
        let rows = vec![EquityRecord::new("5", 0.1, 1), EquityRecord::new("005", 0.9, 9)];

        let index = build_equity_index(&rows);
        assert_eq!(index.len(), 2);
        assert_eq!(index.get("5").unwrap().households, 1);
        assert_eq!(index.get("005").unwrap().households, 9);
    }

    #[test]
    fn test_malformed_cells_do_not_fail() {
        let row = EquityRecord {
            geo_id: "300".to_string(),
            pct_no_vehicle: Some("n/a".to_string()),
            total_households: Some("lots".to_string()),
            county_fips: None,
        };

        let index = build_equity_index(&[row]);
        let entry = index.get("300").unwrap();
        assert!(entry.pct.is_nan());
        assert_eq!(entry.households, 0);
        assert_eq!(entry.borough, None);
    }

    #[test]
    fn test_coerce_pct() {
        assert_eq!(coerce_pct(None), 0.0);
        assert_eq!(coerce_pct(Some("")), 0.0);
        assert_eq!(coerce_pct(Some(" 0.25 ")), 0.25);
        assert!(coerce_pct(Some("abc")).is_nan());
    }

    #[test]
    fn test_coerce_households() {
        assert_eq!(coerce_households(None), 0);
        assert_eq!(coerce_households(Some("1200")), 1200);
        assert_eq!(coerce_households(Some("1200.7")), 1200);
        assert_eq!(coerce_households(Some("-5")), 0);
        assert_eq!(coerce_households(Some("inf")), 0);
        assert_eq!(coerce_households(Some("x")), 0);
    }

    #[test]
    fn test_borough_for_county() {
        assert_eq!(borough_for_county("5"), "Bronx");
        assert_eq!(borough_for_county("047"), "Brooklyn");
        assert_eq!(borough_for_county("85"), "Staten Island");
        assert_eq!(borough_for_county("999"), "NYC");

        let index = build_equity_index(&[EquityRecord::new("1", 0.5, 5).with_county("081")]);
        assert_eq!(index.get("1").unwrap().borough, Some("Queens"));
    }
}
