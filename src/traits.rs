//! Seam between the pipeline and the external routing service.
//!
//! The pipeline only needs three operations from a routing backend. Concrete
//! backends (HTTP, in-memory fakes) implement this trait.

use crate::coord::Coordinate;
use crate::error::RouteError;

/// Readiness as reported by the service's health endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceStatus {
    Ready,
    NotReady(String),
}

/// Distance and duration of one origin/destination pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteSummary {
    pub distance_m: f64,
    pub duration_s: f64,
}

/// Provides route summaries between coordinates.
pub trait RoutingService {
    fn health(&self) -> Result<ServiceStatus, RouteError>;

    /// Route origin *i* to destination *i* for every *i* in one bulk request.
    ///
    /// The returned vector has one entry per origin, in input order; `None`
    /// marks a pair without a route.
    fn matrix_diagonal(
        &self,
        origins: &[Coordinate],
        destinations: &[Coordinate],
    ) -> Result<Vec<Option<RouteSummary>>, RouteError>;

    /// Route a single pair. `Err(RouteError::NoRoute)` when no path exists.
    fn directions(&self, origin: Coordinate, destination: Coordinate) -> Result<RouteSummary, RouteError>;
}

impl<T: RoutingService + ?Sized> RoutingService for &T {
    fn health(&self) -> Result<ServiceStatus, RouteError> {
        (**self).health()
    }

    fn matrix_diagonal(
        &self,
        origins: &[Coordinate],
        destinations: &[Coordinate],
    ) -> Result<Vec<Option<RouteSummary>>, RouteError> {
        (**self).matrix_diagonal(origins, destinations)
    }

    fn directions(&self, origin: Coordinate, destination: Coordinate) -> Result<RouteSummary, RouteError> {
        (**self).directions(origin, destination)
    }
}
