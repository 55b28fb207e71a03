//! Device session lifecycle
//!
//! A [`DeviceSession`] is constructed once at connect time and passed to the
//! components that need the scanner, replacing ambient connection state.
//! Connect failures are fatal to the attempt; the operator retries manually.

use std::sync::Arc;

use tracing::info;

use super::{CaptureSource, DeviceError, IndicatorColor};

/// An open connection to the first attached scanner
pub struct DeviceSession {
    source: Arc<dyn CaptureSource>,
}

impl std::fmt::Debug for DeviceSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceSession").finish_non_exhaustive()
    }
}

impl DeviceSession {
    /// Open the first attached device and reset its volatile index.
    ///
    /// The index starts empty after this call; the caller is expected to
    /// follow up with a bulk load from the durable store.
    pub async fn connect(source: Arc<dyn CaptureSource>) -> Result<Self, DeviceError> {
        let count = source.device_count().await?;
        if count == 0 {
            return Err(DeviceError::NoDevice);
        }
        info!("{count} fingerprint device(s) found, connecting to the first");

        source.open(0).await?;
        source.set_indicator(IndicatorColor::Green).await?;
        source.clear_index().await?;

        Ok(Self { source })
    }

    /// The underlying capture source
    pub fn source(&self) -> Arc<dyn CaptureSource> {
        self.source.clone()
    }

    /// Turn the indicator off and release the session
    pub async fn disconnect(self) -> Result<(), DeviceError> {
        self.source.set_indicator(IndicatorColor::Off).await?;
        info!("fingerprint device disconnected");
        Ok(())
    }
}
