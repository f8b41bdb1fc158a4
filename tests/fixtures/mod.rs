//! Test fixtures for ride-router.
//!
//! Provides:
//! - Real Sao Paulo / Rio de Janeiro locations (from OpenStreetMap)
//! - A scripted in-memory routing service that counts its calls
//! - Helpers to write address exports

pub mod brazil_locations;
pub mod fake_service;

pub use brazil_locations::*;
pub use fake_service::*;
