//! Identification workflow
//!
//! Matching runs against the device's volatile index first. A miss is
//! ambiguous: either the finger really is unknown, or its record sits in the
//! durable store while the index entry was lost to a device restart. Before
//! reporting a non-match, every store record not confirmed in the index is
//! healed and the same sample is matched once more, so a recovered index
//! gap reports "found in store" rather than "not recognized", and an
//! unrelated unknown finger is never misattributed to a healed id.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};

use crate::config::ScannerConfig;
use crate::device::{CaptureSource, DeviceError};
use crate::infrastructure::database::StoreError;
use crate::services::sync::SyncService;

/// Outcome of one identification attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identification {
    /// Matched straight from the volatile index
    Match { user_id: i64, score: i32 },

    /// Missed at first, then matched after the store healed the index
    RecoveredFromStore { user_id: i64, score: i32 },

    /// Genuinely unknown finger
    NotRecognized,
}

/// Identification failures
#[derive(Error, Debug)]
pub enum IdentifyError {
    /// Configured acquisition timeout elapsed without a sample
    #[error("no fingerprint sample arrived within {0:?}")]
    AcquisitionTimeout(Duration),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Device(#[from] DeviceError),
}

/// Matches fingers against the volatile index, with store-backed gap
/// recovery
pub struct IdentificationService {
    source: Arc<dyn CaptureSource>,
    sync: Arc<SyncService>,
    poll_interval: Duration,
    acquire_timeout: Option<Duration>,
}

impl IdentificationService {
    pub fn new(
        source: Arc<dyn CaptureSource>,
        sync: Arc<SyncService>,
        config: &ScannerConfig,
    ) -> Self {
        Self {
            source,
            sync,
            poll_interval: config.poll_interval(),
            acquire_timeout: config.acquire_timeout(),
        }
    }

    /// Wait for a finger, then identify it
    pub async fn identify(&self) -> Result<Identification, IdentifyError> {
        let sample =
            super::poll_for_sample(&self.source, self.poll_interval, self.acquire_timeout)
                .await?
                .ok_or_else(|| {
                    IdentifyError::AcquisitionTimeout(self.acquire_timeout.unwrap_or_default())
                })?;

        self.identify_sample(&sample.template).await
    }

    /// Identify an already-acquired sample
    pub async fn identify_sample(&self, template: &[u8]) -> Result<Identification, IdentifyError> {
        let matched = self.source.identify(template).await?;
        if matched.is_match() {
            info!(
                "Fingerprint matched user {} (score {})",
                matched.user_id, matched.score
            );
            return Ok(Identification::Match {
                user_id: matched.user_id,
                score: matched.score,
            });
        }

        // Miss. Close any store/index gaps, then give the same sample one
        // more chance before calling it unknown.
        let gaps = self.sync.gap_ids()?;
        if gaps.is_empty() {
            info!("Fingerprint not recognized");
            return Ok(Identification::NotRecognized);
        }

        debug!("Identification miss with {} unconfirmed index entries", gaps.len());
        let mut healed = 0;
        for user_id in gaps {
            if self.sync.heal_one(user_id).await? {
                healed += 1;
            }
        }

        if healed == 0 {
            info!("Fingerprint not recognized");
            return Ok(Identification::NotRecognized);
        }

        let retried = self.source.identify(template).await?;
        if retried.is_match() {
            info!(
                "Fingerprint for user {} found in store and restored to the device",
                retried.user_id
            );
            Ok(Identification::RecoveredFromStore {
                user_id: retried.user_id,
                score: retried.score,
            })
        } else {
            info!("Fingerprint not recognized");
            Ok(Identification::NotRecognized)
        }
    }
}
