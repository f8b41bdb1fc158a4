//! Append-only result file, doubling as the resume checkpoint.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::PipelineError;
use crate::trips::TripId;

/// Why a trip has no distance/duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorTag {
    /// The service answered but had no path between the endpoints.
    #[serde(rename = "NO_ROUTE")]
    NoRoute,
    /// A direct call failed outside of any fallback.
    #[serde(rename = "TRANSPORT_ERR")]
    Transport,
    /// The per-trip call made after a failed matrix request failed too.
    #[serde(rename = "FALLBACK_ERR")]
    Fallback,
}

/// Outcome for one trip, one output row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteResult {
    pub ride_id: TripId,
    pub distance_m: Option<f64>,
    pub duration_s: Option<f64>,
    pub error: Option<ErrorTag>,
}

impl RouteResult {
    pub fn routed(ride_id: TripId, distance_m: f64, duration_s: f64) -> Self {
        Self {
            ride_id,
            distance_m: Some(distance_m),
            duration_s: Some(duration_s),
            error: None,
        }
    }

    pub fn failed(ride_id: TripId, tag: ErrorTag) -> Self {
        Self {
            ride_id,
            distance_m: None,
            duration_s: None,
            error: Some(tag),
        }
    }

    pub fn is_routed(&self) -> bool {
        self.error.is_none()
    }
}

/// Appends batches of results to a semicolon-delimited file.
///
/// The header goes out with the first append only when the file is absent
/// or empty. A line cut short by an earlier crash is dropped on open, so
/// appends always start on a fresh line.
#[derive(Debug)]
pub struct IncrementalWriter {
    path: PathBuf,
    header_written: bool,
}

impl IncrementalWriter {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, PipelineError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let header_written = discard_torn_tail(&path)? > 0;
        Ok(Self { path, header_written })
    }

    /// Write every result of the batch with a single write, then sync before
    /// returning.
    pub fn append_batch(&mut self, results: &[RouteResult]) -> Result<(), PipelineError> {
        if results.is_empty() {
            return Ok(());
        }

        let mut writer = csv::WriterBuilder::new()
            .delimiter(b';')
            .has_headers(!self.header_written)
            .from_writer(Vec::new());
        for result in results {
            writer.serialize(result)?;
        }
        let buf = writer
            .into_inner()
            .map_err(|err| PipelineError::Io(io::Error::new(err.error().kind(), err.error().to_string())))?;

        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(&buf)?;
        file.sync_data()?;

        self.header_written = true;
        debug!(rows = results.len(), path = %self.path.display(), "appended batch");
        Ok(())
    }
}

/// Cut `path` back to just past its last newline and return the new length.
fn discard_torn_tail(path: &Path) -> Result<u64, PipelineError> {
    let content = match fs::read(path) {
        Ok(content) => content,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(err) => return Err(err.into()),
    };
    if content.last().is_none_or(|&b| b == b'\n') {
        return Ok(content.len() as u64);
    }

    let keep = content.iter().rposition(|&b| b == b'\n').map_or(0, |i| i + 1) as u64;
    warn!(
        path = %path.display(),
        dropped_bytes = content.len() as u64 - keep,
        "output ends in a partial line, truncating it"
    );
    let file = OpenOptions::new().write(true).open(path)?;
    file.set_len(keep)?;
    file.sync_data()?;
    Ok(keep)
}
