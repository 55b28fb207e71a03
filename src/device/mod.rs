//! Capture device abstraction
//!
//! The physical scanner sits behind the [`CaptureSource`] trait so the
//! vendor SDK binding and test doubles are interchangeable. The device keeps
//! its own volatile template index: templates added with
//! [`CaptureSource::add_to_index`] become matchable by
//! [`CaptureSource::identify`] until the index is cleared or the device
//! power-cycles.

mod session;

pub use session::DeviceSession;

use async_trait::async_trait;
use thiserror::Error;

/// Device-level failures
#[derive(Error, Debug)]
pub enum DeviceError {
    /// No scanner is attached
    #[error("no fingerprint device found")]
    NoDevice,

    /// Opening the device failed
    #[error("failed to open fingerprint device {0}")]
    OpenFailed(usize),

    /// Setting the indicator light failed
    #[error("failed to set device indicator")]
    Indicator,

    /// Opaque vendor SDK failure
    #[error("device error: {0}")]
    Vendor(String),
}

/// Indicator light colors the scanner supports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorColor {
    Green,
    Red,
    White,
    Off,
}

/// One successful acquisition poll: the feature template plus the raw image
/// it was extracted from.
#[derive(Debug, Clone)]
pub struct CapturedSample {
    pub template: Vec<u8>,
    pub image: Vec<u8>,
}

/// Result of matching a template against the volatile index.
///
/// A `user_id` of `0` means no match; `score` is the vendor's confidence
/// value and only meaningful on a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchResult {
    pub user_id: i64,
    pub score: i32,
}

impl MatchResult {
    pub fn is_match(&self) -> bool {
        self.user_id != 0
    }
}

/// Capability contract for the scanning peripheral
#[async_trait]
pub trait CaptureSource: Send + Sync {
    /// Number of attached scanners
    async fn device_count(&self) -> Result<usize, DeviceError>;

    /// Open the scanner at `device_index`
    async fn open(&self, device_index: usize) -> Result<(), DeviceError>;

    /// Set the indicator light
    async fn set_indicator(&self, color: IndicatorColor) -> Result<(), DeviceError>;

    /// Poll once for a finger on the sensor. `None` simply means nothing was
    /// captured yet; callers drive their own polling loop.
    async fn acquire(&self) -> Result<Option<CapturedSample>, DeviceError>;

    /// Match a template against the volatile index
    async fn identify(&self, template: &[u8]) -> Result<MatchResult, DeviceError>;

    /// Fuse three samples of the same finger into one enrollment template.
    /// `None` means the samples were not consistent enough to merge.
    async fn merge(
        &self,
        first: &[u8],
        second: &[u8],
        third: &[u8],
    ) -> Result<Option<Vec<u8>>, DeviceError>;

    /// Make `template` matchable as `user_id` in the volatile index
    async fn add_to_index(&self, user_id: i64, template: &[u8]) -> Result<(), DeviceError>;

    /// Drop every volatile index entry
    async fn clear_index(&self) -> Result<(), DeviceError>;
}
