//! Test doubles for the capture source and the template store
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fingerprint_core::{
    CaptureSource, CapturedSample, DeviceError, FingerprintRecord, IndicatorColor, MatchResult,
    ScannerConfig, StoreError, TemplateStore,
};

/// How the mock answers a merge call
pub enum MergeBehavior {
    /// Concatenate the three inputs (default)
    Concat,
    /// Always return this template
    Fixed(Vec<u8>),
    /// Report fusion failure
    Fail,
}

/// Scripted scanner double.
///
/// `acquire` pops scripted samples (empty queue polls as a miss), `identify`
/// pops scripted results first and otherwise matches against the mock's own
/// volatile index by exact template bytes. Every call is appended to
/// `calls` so tests can assert ordering.
pub struct MockCaptureSource {
    pub device_count: usize,
    acquire_queue: Mutex<VecDeque<CapturedSample>>,
    identify_queue: Mutex<VecDeque<MatchResult>>,
    merge_behavior: Mutex<MergeBehavior>,
    pub index: Mutex<HashMap<i64, Vec<u8>>>,
    pub calls: Mutex<Vec<String>>,
}

impl MockCaptureSource {
    pub fn new() -> Self {
        Self {
            device_count: 1,
            acquire_queue: Mutex::new(VecDeque::new()),
            identify_queue: Mutex::new(VecDeque::new()),
            merge_behavior: Mutex::new(MergeBehavior::Concat),
            index: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn push_sample(&self, sample: CapturedSample) {
        self.acquire_queue.lock().unwrap().push_back(sample);
    }

    pub fn push_identify(&self, result: MatchResult) {
        self.identify_queue.lock().unwrap().push_back(result);
    }

    pub fn set_merge(&self, behavior: MergeBehavior) {
        *self.merge_behavior.lock().unwrap() = behavior;
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn indexed_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.index.lock().unwrap().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }
}

impl Default for MockCaptureSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CaptureSource for MockCaptureSource {
    async fn device_count(&self) -> Result<usize, DeviceError> {
        self.record("device_count");
        Ok(self.device_count)
    }

    async fn open(&self, device_index: usize) -> Result<(), DeviceError> {
        self.record(format!("open({device_index})"));
        Ok(())
    }

    async fn set_indicator(&self, color: IndicatorColor) -> Result<(), DeviceError> {
        self.record(format!("set_indicator({color:?})"));
        Ok(())
    }

    async fn acquire(&self) -> Result<Option<CapturedSample>, DeviceError> {
        self.record("acquire");
        Ok(self.acquire_queue.lock().unwrap().pop_front())
    }

    async fn identify(&self, template: &[u8]) -> Result<MatchResult, DeviceError> {
        self.record("identify");

        if let Some(scripted) = self.identify_queue.lock().unwrap().pop_front() {
            return Ok(scripted);
        }

        let index = self.index.lock().unwrap();
        let matched = index
            .iter()
            .find(|(_, stored)| stored.as_slice() == template)
            .map(|(id, _)| *id);

        Ok(match matched {
            Some(user_id) => MatchResult { user_id, score: 96 },
            None => MatchResult {
                user_id: 0,
                score: 0,
            },
        })
    }

    async fn merge(
        &self,
        first: &[u8],
        second: &[u8],
        third: &[u8],
    ) -> Result<Option<Vec<u8>>, DeviceError> {
        self.record("merge");

        Ok(match &*self.merge_behavior.lock().unwrap() {
            MergeBehavior::Concat => {
                Some([first, second, third].concat())
            }
            MergeBehavior::Fixed(template) => Some(template.clone()),
            MergeBehavior::Fail => None,
        })
    }

    async fn add_to_index(&self, user_id: i64, template: &[u8]) -> Result<(), DeviceError> {
        self.record(format!("add_to_index({user_id})"));
        self.index.lock().unwrap().insert(user_id, template.to_vec());
        Ok(())
    }

    async fn clear_index(&self) -> Result<(), DeviceError> {
        self.record("clear_index");
        self.index.lock().unwrap().clear();
        Ok(())
    }
}

/// In-memory store double with an insert kill switch for commit-ordering
/// tests
pub struct MemoryStore {
    records: Mutex<Vec<FingerprintRecord>>,
    fail_inserts: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            fail_inserts: AtomicBool::new(false),
        }
    }

    pub fn with_records(records: Vec<FingerprintRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            fail_inserts: AtomicBool::new(false),
        }
    }

    pub fn fail_inserts(&self) {
        self.fail_inserts.store(true, Ordering::SeqCst);
    }

    pub fn records(&self) -> Vec<FingerprintRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateStore for MemoryStore {
    fn ensure_schema(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn insert(
        &self,
        user_id: i64,
        encoded_template: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "simulated store failure",
            )));
        }

        let mut records = self.records.lock().unwrap();
        if records.iter().any(|r| r.user_id == user_id) {
            return Err(StoreError::DuplicateUserId(user_id));
        }

        records.push(FingerprintRecord {
            user_id,
            template: encoded_template.to_string(),
            last_updated: timestamp,
        });
        Ok(())
    }

    fn fetch_all(&self) -> Result<Vec<FingerprintRecord>, StoreError> {
        Ok(self.records.lock().unwrap().clone())
    }

    fn fetch_by_id(&self, user_id: i64) -> Result<Option<FingerprintRecord>, StoreError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.user_id == user_id)
            .cloned())
    }

    fn max_user_id(&self) -> Result<Option<i64>, StoreError> {
        Ok(self.records.lock().unwrap().iter().map(|r| r.user_id).max())
    }
}

/// A sample whose template and image are tagged with `tag`
pub fn sample(tag: u8) -> CapturedSample {
    CapturedSample {
        template: vec![tag; 8],
        image: vec![tag; 3],
    }
}

/// A sample carrying an exact template (image bytes are arbitrary)
pub fn sample_with_template(template: &[u8]) -> CapturedSample {
    CapturedSample {
        template: template.to_vec(),
        image: vec![0],
    }
}

/// Config with a fast poll cadence for tests
pub fn test_config() -> ScannerConfig {
    let mut config = ScannerConfig::default();
    config.poll_interval_ms = 1;
    config
}
