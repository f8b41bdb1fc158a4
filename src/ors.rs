//! openrouteservice HTTP adapter for health, matrix and directions calls.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::coord::Coordinate;
use crate::error::RouteError;
use crate::traits::{RouteSummary, RoutingService, ServiceStatus};

/// ORS error codes meaning "the request was fine, there is just no route".
const ROUTE_NOT_FOUND: i64 = 2009;
const POINT_NOT_FOUND: i64 = 2010;

#[derive(Debug, Clone)]
pub struct OrsConfig {
    /// Base URL including the `/ors` prefix, without trailing slash.
    pub base_url: String,
    pub profile: String,
    pub timeout_secs: u64,
    pub health_timeout_secs: u64,
}

impl Default for OrsConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8082/ors".to_string(),
            profile: "driving-car".to_string(),
            timeout_secs: 60,
            health_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrsClient {
    config: OrsConfig,
    client: Client,
}

impl OrsClient {
    pub fn new(config: OrsConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }
}

impl RoutingService for OrsClient {
    fn health(&self) -> Result<ServiceStatus, RouteError> {
        let response = self
            .client
            .get(self.url("/v2/health"))
            .timeout(Duration::from_secs(self.config.health_timeout_secs))
            .send()?;

        let status = response.status();
        // A starting ORS answers 503 with a status body, which is not a failure.
        let body = response.json::<HealthResponse>().ok();
        match body {
            Some(body) if status == StatusCode::OK && body.status == "ready" => Ok(ServiceStatus::Ready),
            Some(body) => Ok(ServiceStatus::NotReady(body.status)),
            None => Ok(ServiceStatus::NotReady(format!("HTTP {}", status))),
        }
    }

    fn matrix_diagonal(
        &self,
        origins: &[Coordinate],
        destinations: &[Coordinate],
    ) -> Result<Vec<Option<RouteSummary>>, RouteError> {
        if origins.len() != destinations.len() {
            return Err(RouteError::Protocol(format!(
                "{} origins but {} destinations",
                origins.len(),
                destinations.len()
            )));
        }
        let n = origins.len();
        if n == 0 {
            return Ok(Vec::new());
        }

        let request = MatrixRequest {
            locations: origins
                .iter()
                .chain(destinations)
                .map(Coordinate::lng_lat)
                .collect(),
            metrics: ["distance", "duration"],
            units: "m",
            sources: (0..n).collect(),
            destinations: (n..2 * n).collect(),
        };

        let response = self
            .client
            .post(self.url(&format!("/v2/matrix/{}", self.config.profile)))
            .json(&request)
            .send()?;
        let body: MatrixResponse = check_status(response)?.json()?;
        body.diagonal(n)
    }

    fn directions(&self, origin: Coordinate, destination: Coordinate) -> Result<RouteSummary, RouteError> {
        let request = DirectionsRequest {
            coordinates: [origin.lng_lat(), destination.lng_lat()],
        };

        let response = self
            .client
            .post(self.url(&format!("/v2/directions/{}/json", self.config.profile)))
            .json(&request)
            .send()?;
        let body: DirectionsResponse = check_status(response)?.json()?;

        let summary = body
            .routes
            .into_iter()
            .next()
            .map(|route| route.summary)
            .ok_or(RouteError::NoRoute)?;
        Ok(RouteSummary {
            distance_m: summary.distance,
            duration_s: summary.duration,
        })
    }
}

/// Turn non-success responses into errors, recognising "no route" codes.
fn check_status(response: Response) -> Result<Response, RouteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.json::<Value>().unwrap_or(Value::Null);
    let (code, message) = match body.get("error") {
        Some(Value::Object(err)) => (
            err.get("code").and_then(Value::as_i64),
            err.get("message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        ),
        Some(Value::String(message)) => (None, message.clone()),
        _ => (None, String::new()),
    };

    match code {
        Some(ROUTE_NOT_FOUND) | Some(POINT_NOT_FOUND) => Err(RouteError::NoRoute),
        _ => Err(RouteError::Status { status, message }),
    }
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
}

#[derive(Debug, Serialize)]
struct MatrixRequest {
    locations: Vec<[f64; 2]>,
    metrics: [&'static str; 2],
    units: &'static str,
    sources: Vec<usize>,
    destinations: Vec<usize>,
}

#[derive(Debug, Deserialize)]
struct MatrixResponse {
    distances: Option<Vec<Vec<Option<f64>>>>,
    durations: Option<Vec<Vec<Option<f64>>>>,
}

impl MatrixResponse {
    /// Pick entry `[i][i]` from both matrices.
    ///
    /// Pairing is positional: row *i* is assumed to be source *i*, as ORS
    /// returns rows in request order. A matrix too small to hold every
    /// diagonal entry is rejected as a whole.
    fn diagonal(self, n: usize) -> Result<Vec<Option<RouteSummary>>, RouteError> {
        let distances = self
            .distances
            .ok_or_else(|| RouteError::Protocol("matrix response without distances".to_string()))?;
        let durations = self
            .durations
            .ok_or_else(|| RouteError::Protocol("matrix response without durations".to_string()))?;

        if distances.len() != n || durations.len() != n {
            return Err(RouteError::Protocol(format!(
                "expected {} matrix rows, got {} distances and {} durations",
                n,
                distances.len(),
                durations.len()
            )));
        }

        distances
            .iter()
            .zip(&durations)
            .enumerate()
            .map(|(i, (dist_row, dur_row))| {
                let distance = dist_row.get(i).copied();
                let duration = dur_row.get(i).copied();
                match (distance, duration) {
                    (Some(distance), Some(duration)) => Ok(distance
                        .zip(duration)
                        .map(|(distance_m, duration_s)| RouteSummary { distance_m, duration_s })),
                    _ => Err(RouteError::Protocol(format!("matrix row {} is too short", i))),
                }
            })
            .collect()
    }
}

#[derive(Debug, Serialize)]
struct DirectionsRequest {
    coordinates: [[f64; 2]; 2],
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
}

#[derive(Debug, Deserialize)]
struct DirectionsRoute {
    summary: DirectionsSummary,
}

/// ORS leaves zero-valued fields out of the summary.
#[derive(Debug, Deserialize)]
struct DirectionsSummary {
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    duration: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(distances: Value, durations: Value) -> MatrixResponse {
        serde_json::from_value(serde_json::json!({
            "distances": distances,
            "durations": durations,
        }))
        .unwrap()
    }

    #[test]
    fn test_diagonal_extraction() {
        let body = matrix(
            serde_json::json!([[100.0, 999.0], [888.0, 200.0]]),
            serde_json::json!([[10.0, 99.0], [88.0, 20.0]]),
        );
        let diagonal = body.diagonal(2).unwrap();
        assert_eq!(
            diagonal,
            vec![
                Some(RouteSummary { distance_m: 100.0, duration_s: 10.0 }),
                Some(RouteSummary { distance_m: 200.0, duration_s: 20.0 }),
            ]
        );
    }

    #[test]
    fn test_null_entry_means_no_route() {
        let body = matrix(
            serde_json::json!([[null, 1.0], [1.0, 200.0]]),
            serde_json::json!([[null, 1.0], [1.0, 20.0]]),
        );
        let diagonal = body.diagonal(2).unwrap();
        assert_eq!(diagonal[0], None);
        assert!(diagonal[1].is_some());
    }

    #[test]
    fn test_short_matrix_is_protocol_error() {
        let body = matrix(serde_json::json!([[100.0]]), serde_json::json!([[10.0]]));
        assert!(matches!(body.diagonal(2), Err(RouteError::Protocol(_))));

        let body = matrix(
            serde_json::json!([[100.0], [1.0]]),
            serde_json::json!([[10.0], [1.0]]),
        );
        assert!(matches!(body.diagonal(2), Err(RouteError::Protocol(_))));
    }

    #[test]
    fn test_missing_durations_is_protocol_error() {
        let body: MatrixResponse =
            serde_json::from_value(serde_json::json!({ "distances": [[1.0]] })).unwrap();
        assert!(matches!(body.diagonal(1), Err(RouteError::Protocol(_))));
    }

    #[test]
    fn test_matrix_request_layout() {
        let origins = [Coordinate { lat: -23.5, lng: -46.6 }];
        let destinations = [Coordinate { lat: -22.9, lng: -43.2 }];
        let request = MatrixRequest {
            locations: origins.iter().chain(&destinations).map(Coordinate::lng_lat).collect(),
            metrics: ["distance", "duration"],
            units: "m",
            sources: vec![0],
            destinations: vec![1],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["locations"], serde_json::json!([[-46.6, -23.5], [-43.2, -22.9]]));
        assert_eq!(json["sources"], serde_json::json!([0]));
        assert_eq!(json["destinations"], serde_json::json!([1]));
    }

    #[test]
    fn test_empty_summary_defaults_to_zero() {
        let body: DirectionsResponse =
            serde_json::from_value(serde_json::json!({ "routes": [{ "summary": {} }] })).unwrap();
        assert_eq!(body.routes[0].summary.distance, 0.0);
    }
}
