//! Startup readiness check for the routing service.

use std::thread;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::PipelineError;
use crate::traits::{RoutingService, ServiceStatus};

/// Poll `service` until it reports ready.
///
/// Transport errors and not-ready answers are retried after `poll_interval`;
/// running out of attempts is fatal.
pub fn wait_until_ready<S: RoutingService>(
    service: &S,
    max_attempts: u32,
    poll_interval: Duration,
) -> Result<(), PipelineError> {
    for attempt in 1..=max_attempts {
        match service.health() {
            Ok(ServiceStatus::Ready) => {
                info!(attempt, "routing service is ready");
                return Ok(());
            }
            Ok(ServiceStatus::NotReady(status)) => {
                warn!(attempt, max_attempts, %status, "routing service not ready yet");
            }
            Err(err) => {
                warn!(attempt, max_attempts, error = %err, "health check failed");
            }
        }
        if attempt < max_attempts {
            thread::sleep(poll_interval);
        }
    }

    Err(PipelineError::NotReady { attempts: max_attempts })
}
