//! Durable template store
//!
//! One SQLite table holds every enrollment. All access goes through the
//! [`TemplateStore`] capability trait so the services can run against a test
//! double; [`SqliteStore`] is the real adapter. Every operation takes one
//! exclusive lock over the connection and commits synchronously before
//! returning. Enrollment volume is low, so correctness wins over throughput
//! here: no batching, no write-ahead buffering, no reader/writer split.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{params, Connection};
use thiserror::Error;
use tracing::info;

use crate::domain::FingerprintRecord;

/// Timestamp layout used in the `last_updated` column
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Store operation failures
#[derive(Error, Debug)]
pub enum StoreError {
    /// A record for this user id already exists
    #[error("a fingerprint record for user {0} already exists")]
    DuplicateUserId(i64),

    /// Underlying database fault
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Filesystem fault while opening the store
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored timestamp does not parse
    #[error("invalid timestamp in record for user {user_id}: {value}")]
    InvalidTimestamp { user_id: i64, value: String },
}

/// Capability contract over the durable fingerprint table.
///
/// Implementations serialize their own access; callers may invoke these from
/// anywhere without extra locking.
pub trait TemplateStore: Send + Sync {
    /// Idempotently create the table if absent
    fn ensure_schema(&self) -> Result<(), StoreError>;

    /// Durably record one enrollment. Fails with
    /// [`StoreError::DuplicateUserId`] if the id is taken.
    fn insert(
        &self,
        user_id: i64,
        encoded_template: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Every record in insertion order. Resynchronization only; not a
    /// matching-path query.
    fn fetch_all(&self) -> Result<Vec<FingerprintRecord>, StoreError>;

    /// One record by user id
    fn fetch_by_id(&self, user_id: i64) -> Result<Option<FingerprintRecord>, StoreError>;

    /// Highest allocated user id, `None` on an empty store
    fn max_user_id(&self) -> Result<Option<i64>, StoreError>;

    /// Next free user id: `max + 1`, or `1` on an empty store.
    ///
    /// Not collision-safe under concurrent multi-writer allocation: the read
    /// of the max and the later insert are two separate lock acquisitions.
    /// The design assumes a single allocating process per store; a
    /// multi-writer deployment would need read-max-then-insert under one
    /// critical section.
    fn next_user_id(&self) -> Result<i64, StoreError> {
        Ok(self.max_user_id()?.map_or(1, |max| max + 1))
    }
}

/// SQLite-backed store adapter
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the store at `path` and ensure the schema exists
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.ensure_schema()?;

        info!("Opened fingerprint store at {:?}", path);
        Ok(store)
    }

    /// In-memory store for tests
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.ensure_schema()?;
        Ok(store)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        // A poisoned lock only means a panic mid-query; the connection is
        // still usable.
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl TemplateStore for SqliteStore {
    fn ensure_schema(&self) -> Result<(), StoreError> {
        let conn = self.lock();
        conn.execute(
            "CREATE TABLE IF NOT EXISTS fingerprints (
                user_id              INTEGER PRIMARY KEY,
                fingerprint_template TEXT,
                last_updated         TIMESTAMP
            )",
            [],
        )?;
        Ok(())
    }

    fn insert(
        &self,
        user_id: i64,
        encoded_template: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO fingerprints (user_id, fingerprint_template, last_updated)
             VALUES (?1, ?2, ?3)",
            params![
                user_id,
                encoded_template,
                timestamp.format(TIMESTAMP_FORMAT).to_string()
            ],
        )
        .map_err(|e| match &e {
            rusqlite::Error::SqliteFailure(f, _)
                if f.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                StoreError::DuplicateUserId(user_id)
            }
            _ => StoreError::Sqlite(e),
        })?;
        Ok(())
    }

    fn fetch_all(&self) -> Result<Vec<FingerprintRecord>, StoreError> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT user_id, fingerprint_template, last_updated
             FROM fingerprints ORDER BY rowid",
        )?;

        let rows = stmt.query_map([], row_to_parts)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(parts_to_record(row?)?);
        }
        Ok(records)
    }

    fn fetch_by_id(&self, user_id: i64) -> Result<Option<FingerprintRecord>, StoreError> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT user_id, fingerprint_template, last_updated
             FROM fingerprints WHERE user_id = ?1",
        )?;

        let mut rows = stmt.query_map(params![user_id], row_to_parts)?;

        match rows.next() {
            Some(row) => Ok(Some(parts_to_record(row?)?)),
            None => Ok(None),
        }
    }

    fn max_user_id(&self) -> Result<Option<i64>, StoreError> {
        let conn = self.lock();
        let max: Option<i64> =
            conn.query_row("SELECT MAX(user_id) FROM fingerprints", [], |row| row.get(0))?;
        Ok(max)
    }
}

type RowParts = (i64, String, String);

fn row_to_parts(row: &rusqlite::Row<'_>) -> rusqlite::Result<RowParts> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
}

fn parts_to_record((user_id, template, last_updated): RowParts) -> Result<FingerprintRecord, StoreError> {
    let parsed = NaiveDateTime::parse_from_str(&last_updated, TIMESTAMP_FORMAT).map_err(|_| {
        StoreError::InvalidTimestamp {
            user_id,
            value: last_updated.clone(),
        }
    })?;

    Ok(FingerprintRecord {
        user_id,
        template,
        last_updated: parsed.and_utc(),
    })
}
