//! Coordinate parsing and geographic bounds.
//!
//! Raw exports carry latitude/longitude as loosely formatted text: comma
//! decimal separators, stray quotes or units around the number. Anything
//! that cannot be read as a number is dropped, never defaulted to zero.

use std::sync::LazyLock;

use regex::Regex;

static NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[-+]?(?:\d+(?:\.\d*)?|\.\d+)").expect("number pattern is valid")
});

/// Extract the first floating-point number from `raw`.
///
/// Both `.` and `,` are accepted as decimal separator.
pub fn clean_coord(raw: &str) -> Option<f64> {
    let normalized = raw.replace(',', ".");
    let found = NUMBER.find(&normalized)?;
    found
        .as_str()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// A validated (latitude, longitude) pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    /// Returns `None` unless both values are finite and physically valid.
    pub fn new(lat: f64, lng: f64) -> Option<Self> {
        let valid = lat.is_finite()
            && lng.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lng);
        valid.then_some(Self { lat, lng })
    }

    /// Parse a coordinate from raw latitude and longitude text.
    pub fn parse(raw_lat: &str, raw_lng: &str) -> Option<Self> {
        Self::new(clean_coord(raw_lat)?, clean_coord(raw_lng)?)
    }

    /// `[lng, lat]`, the order routing services expect on the wire.
    pub fn lng_lat(&self) -> [f64; 2] {
        [self.lng, self.lat]
    }
}

/// Rectangular region outside which trips are out of coverage.
///
/// Bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lng: f64,
    pub max_lng: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl Default for BoundingBox {
    /// Approximate extent of the Brazilian road graph.
    fn default() -> Self {
        Self {
            min_lng: -74.0,
            max_lng: -34.0,
            min_lat: -35.0,
            max_lat: 6.0,
        }
    }
}

impl BoundingBox {
    pub fn contains(&self, coord: &Coordinate) -> bool {
        (self.min_lng..=self.max_lng).contains(&coord.lng)
            && (self.min_lat..=self.max_lat).contains(&coord.lat)
    }
}
