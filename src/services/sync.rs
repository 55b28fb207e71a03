//! Store/device synchronization
//!
//! The scanner's template index is volatile: a power-cycle or reconnect
//! empties it while the durable store still holds every enrollment. This
//! service pushes durable records back into the index, wholesale at connect
//! time or one record at a time when identification suspects a gap, and
//! remembers which user ids it has confirmed present so gaps are detectable
//! without asking the device.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use crate::device::CaptureSource;
use crate::infrastructure::database::{StoreError, TemplateStore};

/// Outcome of a bulk load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    /// Records now present in the volatile index
    pub loaded: usize,
    /// Records skipped over a decode or device fault
    pub skipped: usize,
}

/// Keeps the device's volatile index consistent with the durable store
pub struct SyncService {
    store: Arc<dyn TemplateStore>,
    source: Arc<dyn CaptureSource>,
    indexed: Mutex<HashSet<i64>>,
}

impl SyncService {
    /// A fresh service assumes a freshly cleared device index
    pub fn new(store: Arc<dyn TemplateStore>, source: Arc<dyn CaptureSource>) -> Self {
        Self {
            store,
            source,
            indexed: Mutex::new(HashSet::new()),
        }
    }

    /// Push every durable record into the volatile index, in store insertion
    /// order.
    ///
    /// One corrupt or rejected record never blocks recovery of the rest: the
    /// failure is logged and the record skipped.
    pub async fn load_all(&self) -> Result<LoadReport, StoreError> {
        info!("Loading fingerprints from the store into the device index");

        let records = self.store.fetch_all()?;
        let mut report = LoadReport {
            loaded: 0,
            skipped: 0,
        };

        for record in records {
            let raw = match record.decode_template() {
                Ok(raw) => raw,
                Err(e) => {
                    warn!("Skipping stored template for user {}: {e}", record.user_id);
                    report.skipped += 1;
                    continue;
                }
            };

            if let Err(e) = self.source.add_to_index(record.user_id, &raw).await {
                warn!("Device rejected template for user {}: {e}", record.user_id);
                report.skipped += 1;
                continue;
            }

            self.mark_indexed(record.user_id);
            report.loaded += 1;
        }

        info!(
            "Device index loaded: {} added, {} skipped",
            report.loaded, report.skipped
        );
        Ok(report)
    }

    /// Restore a single record into the volatile index.
    ///
    /// Returns `false` when no such record exists, or when it exists but
    /// cannot be restored (corrupt encoding, device rejection); those are
    /// logged, matching the bulk-load policy.
    pub async fn heal_one(&self, user_id: i64) -> Result<bool, StoreError> {
        let Some(record) = self.store.fetch_by_id(user_id)? else {
            return Ok(false);
        };

        let raw = match record.decode_template() {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Cannot heal index entry for user {user_id}: {e}");
                return Ok(false);
            }
        };

        if let Err(e) = self.source.add_to_index(user_id, &raw).await {
            warn!("Device rejected healed template for user {user_id}: {e}");
            return Ok(false);
        }

        self.mark_indexed(user_id);
        info!("Restored user {user_id} into the device index from the store");
        Ok(true)
    }

    /// Record that `user_id` is now present in the volatile index
    pub fn mark_indexed(&self, user_id: i64) {
        self.lock_indexed().insert(user_id);
    }

    /// Whether `user_id` is confirmed present in the volatile index
    pub fn is_indexed(&self, user_id: i64) -> bool {
        self.lock_indexed().contains(&user_id)
    }

    /// Forget every confirmation, e.g. after the device index was cleared
    pub fn reset_index_view(&self) {
        self.lock_indexed().clear();
    }

    /// User ids present in the store but not confirmed in the volatile index
    pub fn gap_ids(&self) -> Result<Vec<i64>, StoreError> {
        let records = self.store.fetch_all()?;
        let indexed = self.lock_indexed();

        Ok(records
            .into_iter()
            .map(|r| r.user_id)
            .filter(|id| !indexed.contains(id))
            .collect())
    }

    fn lock_indexed(&self) -> std::sync::MutexGuard<'_, HashSet<i64>> {
        self.indexed.lock().unwrap_or_else(|e| e.into_inner())
    }
}
