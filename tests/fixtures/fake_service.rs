//! In-memory routing service with call counters.

use std::cell::{Cell, RefCell};

use reqwest::StatusCode;
use ride_router::coord::Coordinate;
use ride_router::error::RouteError;
use ride_router::traits::{RouteSummary, RoutingService, ServiceStatus};

/// Routes every pair with a straight-line estimate unless told otherwise.
#[derive(Default)]
pub struct FakeService {
    /// Status returned by every matrix call, if matrix calls should fail.
    pub matrix_status: Option<StatusCode>,
    /// Origins (by latitude) whose directions calls fail.
    pub broken_origins: Vec<f64>,
    /// Health answers before reporting ready.
    pub not_ready_polls: Cell<u32>,
    pub health_calls: Cell<u32>,
    pub matrix_calls: Cell<usize>,
    pub directions_calls: Cell<usize>,
    /// Sizes of every matrix request, in order.
    pub matrix_sizes: RefCell<Vec<usize>>,
}

impl FakeService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn network_calls(&self) -> usize {
        self.matrix_calls.get() + self.directions_calls.get()
    }

    pub fn estimate(origin: Coordinate, destination: Coordinate) -> RouteSummary {
        let degrees = (origin.lat - destination.lat).abs() + (origin.lng - destination.lng).abs();
        let distance_m = (degrees * 111_000.0).round();
        RouteSummary {
            distance_m,
            duration_s: (distance_m / 10.0).round(),
        }
    }
}

impl RoutingService for FakeService {
    fn health(&self) -> Result<ServiceStatus, RouteError> {
        self.health_calls.set(self.health_calls.get() + 1);
        let remaining = self.not_ready_polls.get();
        if remaining > 0 {
            self.not_ready_polls.set(remaining - 1);
            return Ok(ServiceStatus::NotReady("not ready".to_string()));
        }
        Ok(ServiceStatus::Ready)
    }

    fn matrix_diagonal(
        &self,
        origins: &[Coordinate],
        destinations: &[Coordinate],
    ) -> Result<Vec<Option<RouteSummary>>, RouteError> {
        self.matrix_calls.set(self.matrix_calls.get() + 1);
        self.matrix_sizes.borrow_mut().push(origins.len());
        if let Some(status) = self.matrix_status {
            return Err(RouteError::Status {
                status,
                message: "matrix unavailable".to_string(),
            });
        }
        Ok(origins
            .iter()
            .zip(destinations)
            .map(|(o, d)| Some(Self::estimate(*o, *d)))
            .collect())
    }

    fn directions(&self, origin: Coordinate, destination: Coordinate) -> Result<RouteSummary, RouteError> {
        self.directions_calls.set(self.directions_calls.get() + 1);
        if self.broken_origins.contains(&origin.lat) {
            return Err(RouteError::Protocol("connection reset".to_string()));
        }
        Ok(Self::estimate(origin, destination))
    }
}
