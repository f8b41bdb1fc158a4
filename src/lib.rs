//! ride-router core
//!
//! Resumable batch computation of road distances and durations for
//! origin/destination trips, backed by an external routing service.

pub mod coord;
pub mod error;
pub mod health;
pub mod ors;
pub mod pipeline;
pub mod resume;
pub mod router;
pub mod traits;
pub mod trips;
pub mod writer;
