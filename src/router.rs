//! Routes batches of trips through a bulk matrix call with per-trip fallback.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::error::RouteError;
use crate::traits::RoutingService;
use crate::trips::{Trip, TripId};
use crate::writer::{ErrorTag, RouteResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoutingStrategy {
    /// One matrix request per batch, falling back to directions on failure.
    #[default]
    MatrixWithFallback,
    /// One directions request per trip.
    DirectOnly,
}

/// Which path produced a batch's results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchPath {
    /// Every trip was already processed; no request was made.
    Skipped,
    Matrix,
    Fallback,
    Direct,
}

#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub path: BatchPath,
    /// One result per trip not already processed, in batch order.
    pub results: Vec<RouteResult>,
    /// Some call in this batch hit an overload status.
    pub overloaded: bool,
}

impl BatchOutcome {
    fn skipped() -> Self {
        Self {
            path: BatchPath::Skipped,
            results: Vec::new(),
            overloaded: false,
        }
    }
}

#[derive(Debug)]
pub struct BatchRouter<S> {
    service: S,
    strategy: RoutingStrategy,
}

impl<S: RoutingService> BatchRouter<S> {
    pub fn new(service: S, strategy: RoutingStrategy) -> Self {
        Self { service, strategy }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Route the trips of `batch` that are not in `processed`.
    ///
    /// Routing failures never escape: they come back as tagged results.
    pub fn route_batch(&self, batch: &[Trip], processed: &HashSet<TripId>) -> BatchOutcome {
        let pending: Vec<&Trip> = batch.iter().filter(|trip| !processed.contains(&trip.id)).collect();
        if pending.is_empty() {
            return BatchOutcome::skipped();
        }

        match self.strategy {
            RoutingStrategy::DirectOnly => {
                let (results, overloaded) = self.route_each(&pending, ErrorTag::Transport);
                BatchOutcome {
                    path: BatchPath::Direct,
                    results,
                    overloaded,
                }
            }
            RoutingStrategy::MatrixWithFallback => match self.route_matrix(&pending) {
                Ok(results) => BatchOutcome {
                    path: BatchPath::Matrix,
                    results,
                    overloaded: false,
                },
                Err(err) => {
                    warn!(trips = pending.len(), error = %err, "matrix request failed, routing trips one by one");
                    let (results, overloaded) = self.route_each(&pending, ErrorTag::Fallback);
                    BatchOutcome {
                        path: BatchPath::Fallback,
                        results,
                        overloaded: overloaded || err.is_overload(),
                    }
                }
            },
        }
    }

    fn route_matrix(&self, pending: &[&Trip]) -> Result<Vec<RouteResult>, RouteError> {
        let origins: Vec<_> = pending.iter().map(|trip| trip.origin).collect();
        let destinations: Vec<_> = pending.iter().map(|trip| trip.destination).collect();
        let diagonal = self.service.matrix_diagonal(&origins, &destinations)?;

        if diagonal.len() != pending.len() {
            return Err(RouteError::Protocol(format!(
                "matrix returned {} entries for {} trips",
                diagonal.len(),
                pending.len()
            )));
        }

        Ok(pending
            .iter()
            .zip(diagonal)
            .map(|(trip, entry)| match entry {
                Some(summary) => RouteResult::routed(trip.id.clone(), summary.distance_m, summary.duration_s),
                None => RouteResult::failed(trip.id.clone(), ErrorTag::NoRoute),
            })
            .collect())
    }

    /// Route trips one at a time, tagging call failures with `failure_tag`.
    fn route_each(&self, pending: &[&Trip], failure_tag: ErrorTag) -> (Vec<RouteResult>, bool) {
        let mut overloaded = false;
        let results = pending
            .iter()
            .map(|trip| match self.service.directions(trip.origin, trip.destination) {
                Ok(summary) => RouteResult::routed(trip.id.clone(), summary.distance_m, summary.duration_s),
                Err(RouteError::NoRoute) => RouteResult::failed(trip.id.clone(), ErrorTag::NoRoute),
                Err(err) => {
                    debug!(ride_id = %trip.id, error = %err, "directions request failed");
                    overloaded |= err.is_overload();
                    RouteResult::failed(trip.id.clone(), failure_tag)
                }
            })
            .collect();
        (results, overloaded)
    }
}
