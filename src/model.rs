//! Data types shared by the pipeline stages.
//!
//! Tabular inputs (trips, equity) are deserialized straight from CSV rows.
//! Tract polygons arrive as a GeoJSON `FeatureCollection`; geometry and any
//! foreign members are carried through untouched by the `geojson` types.

pub use geojson::{Feature, FeatureCollection};

use geojson::JsonValue;
use serde::{Deserialize, Serialize};
use serde_json::Number;

/// A single row deserialized from a trip CSV file.
///
/// Every column is optional so that sampled exports with missing cells still
/// load. Coordinates that fail to parse are read as `None` rather than
/// failing the whole file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TripRow {
    #[serde(default)]
    pub ride_id: Option<String>,
    #[serde(default)]
    pub rideable_type: Option<String>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub ended_at: Option<String>,

    #[serde(default)]
    pub start_station_name: Option<String>,
    #[serde(default)]
    pub start_station_id: Option<String>,
    #[serde(default)]
    pub end_station_name: Option<String>,
    #[serde(default)]
    pub end_station_id: Option<String>,

    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub start_lat: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub start_lng: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub end_lat: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub end_lng: Option<f64>,

    #[serde(default)]
    pub member_casual: Option<String>,
}

impl TripRow {
    /// Converts the row into a [`TripRecord`], or `None` when the start
    /// coordinates are missing or not finite.
    pub fn to_record(&self) -> Option<TripRecord> {
        let (start_lat, start_lng) = valid_coords(self.start_lat, self.start_lng)?;

        Some(TripRecord {
            start_station_name: self.start_station_name.clone().unwrap_or_default(),
            start_lat,
            start_lng,
            user_type: UserType::classify(self.member_casual.as_deref()),
        })
    }

    pub fn end_coords(&self) -> Option<(f64, f64)> {
        valid_coords(self.end_lat, self.end_lng)
    }
}

fn valid_coords(lat: Option<f64>, lng: Option<f64>) -> Option<(f64, f64)> {
    match (lat, lng) {
        (Some(lat), Some(lng)) if lat.is_finite() && lng.is_finite() => Some((lat, lng)),
        _ => None,
    }
}

/// One observed trip with a usable start location.
#[derive(Debug, Clone, PartialEq)]
pub struct TripRecord {
    pub start_station_name: String,
    pub start_lat: f64,
    pub start_lng: f64,
    pub user_type: UserType,
}

/// Rider classification. Anything other than the literal `member` token is
/// treated as casual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Member,
    Casual,
}

impl UserType {
    pub fn as_str(self) -> &'static str {
        match self {
            UserType::Member => "member",
            UserType::Casual => "casual",
        }
    }

    pub fn classify(raw: Option<&str>) -> Self {
        match raw {
            Some("member") => UserType::Member,
            _ => UserType::Casual,
        }
    }
}

/// Trip totals for one start station, keyed by station name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationSummary {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub count: u64,
    pub member: u64,
    pub casual: u64,
}

impl StationSummary {
    pub fn new(name: &str, lat: f64, lng: f64) -> Self {
        Self {
            name: name.to_string(),
            lat,
            lng,
            count: 0,
            member: 0,
            casual: 0,
        }
    }

    pub fn record(&mut self, user_type: UserType) {
        self.count += 1;
        match user_type {
            UserType::Member => self.member += 1,
            UserType::Casual => self.casual += 1,
        }
    }

    pub fn majority_type(&self) -> UserType {
        if self.member >= self.casual {
            UserType::Member
        } else {
            UserType::Casual
        }
    }
}

/// A single row deserialized from the census equity CSV.
///
/// Numeric columns are kept as raw text; coercion happens when the index is
/// built so that malformed cells never abort the load.
#[derive(Debug, Clone, Deserialize)]
pub struct EquityRecord {
    #[serde(rename = "GEOID", alias = "geoid")]
    pub geo_id: String,
    #[serde(default)]
    pub pct_no_vehicle: Option<String>,
    #[serde(default)]
    pub total_households: Option<String>,
    #[serde(default)]
    pub county_fips: Option<String>,
}

impl EquityRecord {
    pub fn new(geo_id: impl Into<String>, pct_no_vehicle: f64, total_households: u64) -> Self {
        Self {
            geo_id: geo_id.into(),
            pct_no_vehicle: Some(pct_no_vehicle.to_string()),
            total_households: Some(total_households.to_string()),
            county_fips: None,
        }
    }

    pub fn with_county(mut self, county_fips: &str) -> Self {
        self.county_fips = Some(county_fips.to_string());
        self
    }
}

/// Typed access to the property bag of a GeoJSON tract feature.
pub trait TractProperties {
    /// Reads a property as a lookup key. Strings are used verbatim, numbers
    /// are rendered as text. Null, empty strings and other JSON types count
    /// as missing.
    fn property_key(&self, key: &str) -> Option<String>;
    fn property_str(&self, key: &str) -> Option<&str>;
    fn property_f64(&self, key: &str) -> Option<f64>;
    fn property_u64(&self, key: &str) -> Option<u64>;
    /// Writes a float property. Non-finite values are stored as 0.
    fn set_f64(&mut self, key: &str, value: f64);
    fn set_u64(&mut self, key: &str, value: u64);
    fn set_str(&mut self, key: &str, value: &str);
}

impl TractProperties for Feature {
    fn property_key(&self, key: &str) -> Option<String> {
        match self.property(key)? {
            JsonValue::String(s) if !s.is_empty() => Some(s.clone()),
            JsonValue::Number(n) => Some(number_key(n)),
            _ => None,
        }
    }

    fn property_str(&self, key: &str) -> Option<&str> {
        self.property(key).and_then(JsonValue::as_str)
    }

    fn property_f64(&self, key: &str) -> Option<f64> {
        self.property(key).and_then(JsonValue::as_f64)
    }

    fn property_u64(&self, key: &str) -> Option<u64> {
        self.property(key).and_then(JsonValue::as_u64)
    }

    fn set_f64(&mut self, key: &str, value: f64) {
        let number = Number::from_f64(value).unwrap_or_else(|| Number::from(0));
        self.set_property(key, JsonValue::Number(number));
    }

    fn set_u64(&mut self, key: &str, value: u64) {
        self.set_property(key, value);
    }

    fn set_str(&mut self, key: &str, value: &str) {
        self.set_property(key, value);
    }
}

/// Integral numbers render without a fractional part so that `36047000100`
/// and `36047000100.0` produce the same key.
fn number_key(n: &Number) -> String {
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    match n.as_f64() {
        Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15 => {
            format!("{}", f as i64)
        }
        _ => n.to_string(),
    }
}

#[cfg(test)]
pub(crate) fn tract(properties: JsonValue) -> Feature {
    Feature {
        bbox: None,
        geometry: None,
        id: None,
        properties: properties.as_object().cloned(),
        foreign_members: None,
    }
}
