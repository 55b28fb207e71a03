//! Enrollment orchestration
//!
//! Registration captures three samples of the same finger, merges them into
//! one enrollment template, and commits it. Two rules keep the three state
//! locations consistent:
//!
//! 1. Every sample is identified against the volatile index before it is
//!    retained; any match aborts the whole session so the same finger can
//!    never be enrolled twice under a new identity.
//! 2. The store insert must succeed before the template is added to the
//!    volatile index. A crash mid-commit leaves an unmatchable finger, never
//!    a matchable-but-unrecoverable one.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::ScannerConfig;
use crate::device::{CaptureSource, CapturedSample, DeviceError};
use crate::infrastructure::database::{StoreError, TemplateStore};
use crate::services::sync::SyncService;
use crate::shared::codec;

/// Samples fused into one enrollment template
pub const SAMPLES_PER_ENROLLMENT: usize = 3;

/// Why a session ended without a commit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// A sample matched an already-enrolled finger
    DuplicateFingerprint(i64),
    /// The device could not fuse the three samples
    MergeFailed,
    /// No finger arrived within the configured timeout
    AcquisitionTimeout,
}

/// Session progress, one registration attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for sample `n` of [`SAMPLES_PER_ENROLLMENT`] (1-based)
    AwaitingSample(usize),
    Merging,
    Committed,
    Aborted(AbortReason),
}

/// Transient capture state; discarded at session end with no durable trace
/// beyond a committed record
pub struct CaptureSession {
    samples: Vec<CapturedSample>,
    state: SessionState,
}

impl CaptureSession {
    pub fn new() -> Self {
        Self {
            samples: Vec::with_capacity(SAMPLES_PER_ENROLLMENT),
            state: SessionState::AwaitingSample(1),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn awaiting(&self) -> bool {
        matches!(self.state, SessionState::AwaitingSample(_))
    }

    fn retain(&mut self, sample: CapturedSample) {
        debug_assert!(self.awaiting());
        self.samples.push(sample);
        self.state = if self.samples.len() == SAMPLES_PER_ENROLLMENT {
            SessionState::Merging
        } else {
            SessionState::AwaitingSample(self.samples.len() + 1)
        };
    }

    fn abort(&mut self, reason: AbortReason) {
        self.state = SessionState::Aborted(reason);
    }

    fn commit(&mut self) {
        self.state = SessionState::Committed;
    }

    fn samples(&self) -> &[CapturedSample] {
        &self.samples
    }

    fn into_images(self) -> Vec<Vec<u8>> {
        self.samples.into_iter().map(|s| s.image).collect()
    }
}

impl Default for CaptureSession {
    fn default() -> Self {
        Self::new()
    }
}

/// A committed registration
#[derive(Debug, Clone)]
pub struct Enrollment {
    /// Newly allocated identity
    pub user_id: i64,
    /// Merged raw template, as the device understands it
    pub template: Vec<u8>,
    /// Raw capture images of the retained samples, in order
    pub images: Vec<Vec<u8>>,
}

/// Registration failures. All of them terminate the current session only and
/// leave no partial commit behind.
#[derive(Error, Debug)]
pub enum EnrollmentError {
    /// The finger is already enrolled
    #[error("fingerprint already enrolled as user {0}")]
    DuplicateFingerprint(i64),

    /// The three samples could not be fused
    #[error("failed to merge the captured fingerprint samples")]
    MergeFailed,

    /// Configured acquisition timeout elapsed without a sample
    #[error("no fingerprint sample arrived within {0:?}")]
    AcquisitionTimeout(Duration),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Device(#[from] DeviceError),
}

/// Drives the capture-merge-commit sequence
pub struct EnrollmentService {
    store: Arc<dyn TemplateStore>,
    source: Arc<dyn CaptureSource>,
    sync: Arc<SyncService>,
    poll_interval: Duration,
    acquire_timeout: Option<Duration>,
}

impl EnrollmentService {
    pub fn new(
        store: Arc<dyn TemplateStore>,
        source: Arc<dyn CaptureSource>,
        sync: Arc<SyncService>,
        config: &ScannerConfig,
    ) -> Self {
        Self {
            store,
            source,
            sync,
            poll_interval: config.poll_interval(),
            acquire_timeout: config.acquire_timeout(),
        }
    }

    /// Run one registration session to completion.
    pub async fn register(&self) -> Result<Enrollment, EnrollmentError> {
        info!("Starting fingerprint registration");
        let mut session = CaptureSession::new();

        while session.awaiting() {
            let sample = match self.acquire_sample().await? {
                Some(sample) => sample,
                None => {
                    session.abort(AbortReason::AcquisitionTimeout);
                    let limit = self.acquire_timeout.unwrap_or_default();
                    return Err(EnrollmentError::AcquisitionTimeout(limit));
                }
            };

            let matched = self.source.identify(&sample.template).await?;
            if matched.is_match() {
                session.abort(AbortReason::DuplicateFingerprint(matched.user_id));
                warn!(
                    "Registration aborted: finger already enrolled as user {} (score {})",
                    matched.user_id, matched.score
                );
                return Err(EnrollmentError::DuplicateFingerprint(matched.user_id));
            }

            session.retain(sample);
            info!(
                "Fingerprint sample {}/{} captured",
                session.samples().len(),
                SAMPLES_PER_ENROLLMENT
            );
        }

        debug_assert_eq!(session.state(), SessionState::Merging);
        let samples = session.samples();
        let merged = self
            .source
            .merge(
                &samples[0].template,
                &samples[1].template,
                &samples[2].template,
            )
            .await?;

        let Some(merged) = merged else {
            session.abort(AbortReason::MergeFailed);
            warn!("Registration aborted: samples could not be merged");
            return Err(EnrollmentError::MergeFailed);
        };

        // Durability strictly precedes device-visible matchability: a store
        // failure here must leave the volatile index untouched.
        let user_id = self.store.next_user_id()?;
        let encoded = codec::encode(&merged);
        self.store.insert(user_id, &encoded, Utc::now())?;

        self.source.add_to_index(user_id, &merged).await?;
        self.sync.mark_indexed(user_id);
        session.commit();

        info!("Fingerprint registered as user {user_id}");
        Ok(Enrollment {
            user_id,
            template: merged,
            images: session.into_images(),
        })
    }

    async fn acquire_sample(&self) -> Result<Option<CapturedSample>, DeviceError> {
        super::poll_for_sample(&self.source, self.poll_interval, self.acquire_timeout).await
    }
}
