//! Recovers already-processed trips from a previous run's output.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;

use tracing::{info, warn};

use crate::error::PipelineError;
use crate::trips::TripId;

/// Collect the `ride_id` column of `output_path`.
///
/// A missing or empty file yields an empty set. A trailing line without a
/// newline, or a row with the wrong number of fields, is what a crash in the
/// middle of a write leaves behind; it is skipped so the trip gets routed
/// again.
pub fn load_processed(output_path: &Path) -> Result<HashSet<TripId>, PipelineError> {
    let content = match fs::read(output_path) {
        Ok(content) => content,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            info!(path = %output_path.display(), "no previous output, starting from scratch");
            return Ok(HashSet::new());
        }
        Err(err) => return Err(err.into()),
    };

    let complete = match content.iter().rposition(|&b| b == b'\n') {
        Some(last_newline) => &content[..=last_newline],
        None => &content[..0],
    };
    if complete.len() < content.len() {
        warn!(
            path = %output_path.display(),
            bytes = content.len() - complete.len(),
            "ignoring partial last line of previous output"
        );
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_reader(complete);

    let headers = reader.headers()?.clone();
    if headers.is_empty() {
        return Ok(HashSet::new());
    }
    let Some(id_column) = headers.iter().position(|h| h == "ride_id") else {
        return Err(PipelineError::MissingColumn {
            path: output_path.display().to_string(),
            column: "ride_id",
        });
    };

    let mut processed = HashSet::new();
    for record in reader.records() {
        let record = record?;
        if record.len() != headers.len() {
            warn!(
                line = record.position().map(|p| p.line()),
                fields = record.len(),
                "skipping incomplete row in previous output"
            );
            continue;
        }
        if let Some(id) = record.get(id_column) {
            processed.insert(TripId::new(id));
        }
    }

    info!(trips = processed.len(), "resuming, previously processed trips will be skipped");
    Ok(processed)
}
