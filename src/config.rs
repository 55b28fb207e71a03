//! Scanner configuration persistence
//!
//! The shell hands the core a data directory; everything configurable lives
//! in one JSON file inside it. Missing file means defaults; the core never
//! requires an explicit setup step.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File name inside the data directory
pub const CONFIG_FILE: &str = "scanner.json";

/// Default store file, relative to the data directory
pub const DEFAULT_DATABASE_FILE: &str = "fingerprints.db";

/// Default capture image folder, relative to the data directory
pub const DEFAULT_IMAGE_DIR: &str = "captures";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Core configuration stored on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Where the fingerprint database lives
    pub database_path: PathBuf,

    /// Where capture images are written
    pub image_dir: PathBuf,

    /// Delay between unsuccessful acquisition polls, in milliseconds
    pub poll_interval_ms: u64,

    /// Optional ceiling on how long an acquisition may poll before the
    /// session fails. `None` (the default) blocks until a finger arrives.
    pub acquire_timeout_ms: Option<u64>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_FILE),
            image_dir: PathBuf::from(DEFAULT_IMAGE_DIR),
            poll_interval_ms: 100,
            acquire_timeout_ms: None,
        }
    }
}

impl ScannerConfig {
    /// Load configuration from `data_dir`, falling back to defaults when the
    /// file does not exist yet
    pub fn load_or_default(data_dir: &Path) -> Result<Self, ConfigError> {
        let path = data_dir.join(CONFIG_FILE);

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        let config: Self = serde_json::from_str(&content)?;

        Ok(config)
    }

    /// Save configuration into `data_dir`
    pub fn save_to(&self, data_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(data_dir)?;

        let path = data_dir.join(CONFIG_FILE);
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;

        Ok(())
    }

    /// Resolve `database_path` against `data_dir` (absolute paths win)
    pub fn database_path_in(&self, data_dir: &Path) -> PathBuf {
        if self.database_path.is_absolute() {
            self.database_path.clone()
        } else {
            data_dir.join(&self.database_path)
        }
    }

    /// Resolve `image_dir` against `data_dir` (absolute paths win)
    pub fn image_dir_in(&self, data_dir: &Path) -> PathBuf {
        if self.image_dir.is_absolute() {
            self.image_dir.clone()
        } else {
            data_dir.join(&self.image_dir)
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn acquire_timeout(&self) -> Option<Duration> {
        self.acquire_timeout_ms.map(Duration::from_millis)
    }
}
