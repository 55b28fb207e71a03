//! Core workflows: enrollment, identification, and store/device
//! synchronization

pub mod enrollment;
pub mod identification;
pub mod sync;

pub use enrollment::{Enrollment, EnrollmentError, EnrollmentService};
pub use identification::{Identification, IdentificationService, IdentifyError};
pub use sync::{LoadReport, SyncService};

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, Instant};

use crate::device::{CaptureSource, CapturedSample, DeviceError};

/// Poll the scanner until a sample arrives.
///
/// An empty poll is the expected steady state while waiting for a finger,
/// so misses just sleep for `interval` and retry. The sleep is the only
/// suspension point in the capture path. Returns `Ok(None)` once `timeout`
/// (when set) has elapsed without a sample.
pub(crate) async fn poll_for_sample(
    source: &Arc<dyn CaptureSource>,
    interval: Duration,
    timeout: Option<Duration>,
) -> Result<Option<CapturedSample>, DeviceError> {
    let started = Instant::now();

    loop {
        if let Some(sample) = source.acquire().await? {
            return Ok(Some(sample));
        }

        if let Some(limit) = timeout {
            if started.elapsed() >= limit {
                return Ok(None);
            }
        }

        sleep(interval).await;
    }
}
