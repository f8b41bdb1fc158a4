//! Error types for routing calls and pipeline runs.

use std::io;

use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a single call to the routing service.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("routing service returned {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("unexpected response: {0}")]
    Protocol(String),

    /// The service answered but found no path between the points.
    #[error("no route found")]
    NoRoute,
}

impl RouteError {
    /// Gateway and availability errors signal an overloaded routing service.
    pub fn is_overload(&self) -> bool {
        match self {
            RouteError::Status { status, .. } => matches!(
                *status,
                StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT
            ),
            _ => false,
        }
    }
}

/// Errors that abort a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("routing service not ready after {attempts} attempts")]
    NotReady { attempts: u32 },

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("{path}: missing column `{column}`")]
    MissingColumn { path: String, column: &'static str },

    #[error("invalid configuration: {0}")]
    Config(String),
}
