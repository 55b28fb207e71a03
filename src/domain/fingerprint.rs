//! Durable fingerprint record
//!
//! One row per enrolled user. The template is semantically immutable once
//! written; re-registering a finger creates a new record under a new user id
//! rather than mutating an existing one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::codec::{self, CodecError};

/// A persisted fingerprint enrollment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FingerprintRecord {
    /// Unique user identity, allocated monotonically
    pub user_id: i64,

    /// Merged template, codec-encoded for text storage
    pub template: String,

    /// When this record was written
    pub last_updated: DateTime<Utc>,
}

impl FingerprintRecord {
    /// Build a record from a freshly merged raw template
    pub fn new(user_id: i64, raw_template: &[u8]) -> Self {
        Self {
            user_id,
            template: codec::encode(raw_template),
            last_updated: Utc::now(),
        }
    }

    /// Recover the raw template bytes the device understands
    pub fn decode_template(&self) -> Result<Vec<u8>, CodecError> {
        codec::decode(&self.template)
    }
}
