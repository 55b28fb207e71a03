//! Fingerprint template lifecycle core
//!
//! Captures samples from a scanning peripheral, merges them into durable
//! enrollment templates, persists them to a local SQLite database, and keeps
//! the device's volatile match index reconciled with that store. The
//! graphical shell and the vendor driver live outside this crate, behind the
//! [`device::CaptureSource`] and
//! [`infrastructure::database::TemplateStore`] contracts.

pub mod config;
pub mod device;
pub mod domain;
pub mod infrastructure;
pub mod services;
pub mod shared;

pub use config::ScannerConfig;
pub use device::{CaptureSource, CapturedSample, DeviceError, DeviceSession, IndicatorColor, MatchResult};
pub use domain::FingerprintRecord;
pub use infrastructure::database::{SqliteStore, StoreError, TemplateStore};
pub use services::{
    Enrollment, EnrollmentError, EnrollmentService, Identification, IdentificationService,
    IdentifyError, LoadReport, SyncService,
};

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

/// Connect-time failures
#[derive(Error, Debug)]
pub enum ScannerError {
    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The assembled core: one device session, one store, and the workflows
/// wired over them.
///
/// Built once per device connection; dropped (or [`Scanner::disconnect`]ed)
/// when the device goes away.
pub struct Scanner {
    config: ScannerConfig,
    session: DeviceSession,
    store: Arc<dyn TemplateStore>,
    sync: Arc<SyncService>,
    enrollment: EnrollmentService,
    identification: IdentificationService,
}

impl Scanner {
    /// Connect to the first attached device, open the store, and bring the
    /// device's volatile index up to date with it.
    pub async fn connect(
        source: Arc<dyn CaptureSource>,
        config: ScannerConfig,
    ) -> Result<Self, ScannerError> {
        let session = DeviceSession::connect(source.clone()).await?;

        let store: Arc<dyn TemplateStore> = Arc::new(SqliteStore::open(&config.database_path)?);

        let sync = Arc::new(SyncService::new(store.clone(), source.clone()));
        let report = sync.load_all().await?;
        info!(
            "Connected: {} template(s) loaded into the device, {} skipped",
            report.loaded, report.skipped
        );

        let enrollment = EnrollmentService::new(store.clone(), source.clone(), sync.clone(), &config);
        let identification = IdentificationService::new(source, sync.clone(), &config);

        Ok(Self {
            config,
            session,
            store,
            sync,
            enrollment,
            identification,
        })
    }

    /// Register a new finger and keep its capture images on disk.
    ///
    /// Image persistence is best-effort: a write failure is logged, never
    /// fails an already-committed enrollment.
    pub async fn register(&self) -> Result<Enrollment, EnrollmentError> {
        let enrollment = self.enrollment.register().await?;

        for (i, image) in enrollment.images.iter().enumerate() {
            if let Err(e) = shared::images::save_capture_image(
                &self.config.image_dir,
                enrollment.user_id,
                i + 1,
                image,
            ) {
                warn!("Failed to save capture image {}: {e}", i + 1);
            }
        }

        Ok(enrollment)
    }

    /// Identify the next finger placed on the sensor
    pub async fn identify(&self) -> Result<Identification, IdentifyError> {
        self.identification.identify().await
    }

    /// The durable store behind this scanner
    pub fn store(&self) -> &Arc<dyn TemplateStore> {
        &self.store
    }

    /// The synchronization service behind this scanner
    pub fn sync(&self) -> &Arc<SyncService> {
        &self.sync
    }

    /// Active configuration
    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Release the device
    pub async fn disconnect(self) -> Result<(), DeviceError> {
        self.session.disconnect().await
    }
}
