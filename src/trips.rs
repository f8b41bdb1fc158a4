//! Raw address rows and their pairing into routable trips.

use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::coord::{BoundingBox, Coordinate};
use crate::error::PipelineError;

/// Opaque trip identifier, as found in the input export.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TripId(pub String);

impl TripId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TripId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressRole {
    Origin,
    Destination,
}

impl AddressRole {
    /// `1` is an origin, `2` a destination. Float renderings (`1.0`) are accepted.
    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim();
        let value = code
            .parse::<i64>()
            .ok()
            .or_else(|| code.parse::<f64>().ok().filter(|v| v.fract() == 0.0).map(|v| v as i64))?;
        match value {
            1 => Some(AddressRole::Origin),
            2 => Some(AddressRole::Destination),
            _ => None,
        }
    }
}

/// One line of the address export.
#[derive(Debug, Clone, Deserialize)]
pub struct RawAddressRow {
    #[serde(rename = "RideID")]
    pub ride_id: String,
    #[serde(rename = "RideAddressTypeID")]
    pub address_type: String,
    #[serde(rename = "Lat")]
    pub raw_lat: String,
    #[serde(rename = "Lng")]
    pub raw_lng: String,
}

/// A routable origin/destination pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Trip {
    pub id: TripId,
    pub origin: Coordinate,
    pub destination: Coordinate,
}

/// Tallies of what pairing discarded and why.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PairingStats {
    /// Rows whose coordinates, role or id could not be read.
    pub unparseable_rows: usize,
    /// Trips without both an origin and a destination.
    pub malformed: usize,
    /// Trips with an endpoint outside the bounding box.
    pub out_of_bounds: usize,
}

#[derive(Default)]
struct Centroid {
    lat_sum: f64,
    lng_sum: f64,
    count: usize,
}

impl Centroid {
    fn add(&mut self, coord: Coordinate) {
        self.lat_sum += coord.lat;
        self.lng_sum += coord.lng;
        self.count += 1;
    }

    fn mean(&self) -> Option<Coordinate> {
        if self.count == 0 {
            return None;
        }
        let n = self.count as f64;
        Coordinate::new(self.lat_sum / n, self.lng_sum / n)
    }
}

#[derive(Default)]
struct TripRows {
    origin: Centroid,
    destination: Centroid,
}

/// Group rows by trip, collapse each role to its centroid and keep trips
/// with both endpoints inside `bbox`.
///
/// Trips come out in order of first appearance in `rows`.
pub fn pair_trips<I>(rows: I, bbox: &BoundingBox) -> (Vec<Trip>, PairingStats)
where
    I: IntoIterator<Item = RawAddressRow>,
{
    let mut stats = PairingStats::default();
    let mut order: Vec<TripId> = Vec::new();
    let mut grouped: HashMap<TripId, TripRows> = HashMap::new();

    for row in rows {
        let ride_id = row.ride_id.trim();
        let role = AddressRole::from_code(&row.address_type);
        let coord = Coordinate::parse(&row.raw_lat, &row.raw_lng);
        let (Some(role), Some(coord)) = (role, coord) else {
            stats.unparseable_rows += 1;
            continue;
        };
        if ride_id.is_empty() {
            stats.unparseable_rows += 1;
            continue;
        }

        let id = TripId::new(ride_id);
        let entry = grouped.entry(id.clone()).or_insert_with(|| {
            order.push(id);
            TripRows::default()
        });
        match role {
            AddressRole::Origin => entry.origin.add(coord),
            AddressRole::Destination => entry.destination.add(coord),
        }
    }

    let mut trips = Vec::with_capacity(order.len());
    for id in order {
        let Some(rows) = grouped.remove(&id) else {
            continue;
        };
        let (Some(origin), Some(destination)) = (rows.origin.mean(), rows.destination.mean()) else {
            stats.malformed += 1;
            continue;
        };
        if !bbox.contains(&origin) || !bbox.contains(&destination) {
            stats.out_of_bounds += 1;
            continue;
        }
        trips.push(Trip { id, origin, destination });
    }

    if stats.unparseable_rows > 0 {
        warn!(rows = stats.unparseable_rows, "dropped rows with unreadable fields");
    }
    if stats.malformed > 0 {
        warn!(trips = stats.malformed, "dropped trips without both origin and destination");
    }
    if stats.out_of_bounds > 0 {
        warn!(trips = stats.out_of_bounds, "dropped trips outside the bounding box");
    }
    info!(trips = trips.len(), "paired trips ready for routing");

    (trips, stats)
}

/// Read the semicolon-delimited address export.
///
/// Returns the rows along with the number of lines too garbled to decode.
pub fn read_address_rows(path: &Path) -> Result<(Vec<RawAddressRow>, usize), PipelineError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(File::open(path)?);

    let headers = reader.headers()?.clone();
    for column in ["Lat", "Lng", "RideAddressTypeID", "RideID"] {
        if !headers.iter().any(|h| h == column) {
            return Err(PipelineError::MissingColumn {
                path: path.display().to_string(),
                column,
            });
        }
    }

    let mut rows = Vec::new();
    let mut garbled = 0;
    for record in reader.deserialize::<RawAddressRow>() {
        match record {
            Ok(row) => rows.push(row),
            Err(err) if err.is_io_error() => return Err(err.into()),
            Err(err) => {
                debug!(error = %err, "skipping undecodable line");
                garbled += 1;
            }
        }
    }
    info!(rows = rows.len(), garbled, path = %path.display(), "loaded address rows");
    Ok((rows, garbled))
}
