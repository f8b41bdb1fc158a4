//! Real Brazilian locations for realistic test fixtures.
//!
//! Coordinates sourced from OpenStreetMap. All fall inside the default
//! bounding box.

use std::fmt::Write as _;
use std::path::Path;

/// A named location with coordinates.
#[derive(Debug, Clone)]
pub struct Location {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub const fn new(name: &'static str, lat: f64, lng: f64) -> Self {
        Self { name, lat, lng }
    }
}

// ============================================================================
// Sao Paulo
// ============================================================================

pub const SAO_PAULO: &[Location] = &[
    Location::new("Praca da Se", -23.5505, -46.6333),
    Location::new("Avenida Paulista MASP", -23.5614, -46.6559),
    Location::new("Parque Ibirapuera", -23.5874, -46.6576),
    Location::new("Mercado Municipal", -23.5417, -46.6297),
    Location::new("Estacao da Luz", -23.5347, -46.6354),
    Location::new("Aeroporto de Congonhas", -23.6273, -46.6566),
    Location::new("Estadio do Pacaembu", -23.5475, -46.6652),
    Location::new("Vila Madalena", -23.5564, -46.6908),
    Location::new("Shopping Eldorado", -23.5727, -46.6961),
    Location::new("Liberdade", -23.5587, -46.6350),
];

// ============================================================================
// Rio de Janeiro
// ============================================================================

pub const RIO: &[Location] = &[
    Location::new("Cristo Redentor", -22.9519, -43.2105),
    Location::new("Praia de Copacabana", -22.9711, -43.1822),
    Location::new("Maracana", -22.9122, -43.2302),
    Location::new("Aeroporto Santos Dumont", -22.9105, -43.1631),
    Location::new("Lapa", -22.9133, -43.1800),
];

/// Outside Brazil, for bounding-box tests.
pub const LISBON: Location = Location::new("Praca do Comercio", 38.7075, -9.1364);

/// A trip in the address export: id, origin, destination.
pub struct ExportTrip<'a> {
    pub id: String,
    pub origin: &'a Location,
    pub destination: &'a Location,
}

/// `count` trips pairing consecutive Sao Paulo locations, ids `1..=count`.
pub fn sao_paulo_trips(count: usize) -> Vec<ExportTrip<'static>> {
    (0..count)
        .map(|i| ExportTrip {
            id: (i + 1).to_string(),
            origin: &SAO_PAULO[i % SAO_PAULO.len()],
            destination: &SAO_PAULO[(i + 1) % SAO_PAULO.len()],
        })
        .collect()
}

/// Write trips as an address export, origins with comma decimals.
pub fn write_export(path: &Path, trips: &[ExportTrip<'_>]) {
    let mut content = String::from("Lat;Lng;RideAddressTypeID;RideID\n");
    for trip in trips {
        let origin_lat = format!("{}", trip.origin.lat).replace('.', ",");
        let origin_lng = format!("{}", trip.origin.lng).replace('.', ",");
        writeln!(content, "{};{};1;{}", origin_lat, origin_lng, trip.id).unwrap();
        writeln!(
            content,
            "{};{};2;{}",
            trip.destination.lat, trip.destination.lng, trip.id
        )
        .unwrap();
    }
    std::fs::write(path, content).unwrap();
}
