//! Event index storage using SQLite
//!
//! One row per `(file, event)` holding the bincode-encoded subscriptions of
//! that event within that file. Writes replace a file's rows inside one
//! transaction, so readers never see a half-written file.

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::subscriber::{EventSubscription, FilePayload};

/// Identity the index is registered under in `index_meta`
pub const INDEX_ID: &str = "shopware.init_resource_service_index";

/// Bump when the subscription shape, key convention or handler resolution
/// changes; every stored entry is dropped on the next open.
pub const SCHEMA_VERSION: i64 = 1;

/// Indexing state of one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedFile {
    pub file_path: String,
    pub file_hash: String,
    pub indexed_at: DateTime<Utc>,
    pub subscription_count: usize,
}

/// Per-event totals across the corpus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSummary {
    pub event: String,
    pub subscription_count: usize,
    pub file_count: usize,
}

/// SQLite-backed event index
pub struct EventIndexStore {
    conn: Mutex<Connection>,
}

impl EventIndexStore {
    /// Open (or create) the index at the given path
    pub fn new(db_path: &Path) -> Result<Self, EventStoreError> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        Self::from_connection(Connection::open(db_path)?)
    }

    /// Create an in-memory index (for testing)
    pub fn in_memory() -> Result<Self, EventStoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, EventStoreError> {
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.create_schema()?;
        store.check_version()?;
        Ok(store)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, EventStoreError> {
        self.conn.lock().map_err(|_| EventStoreError::Poisoned)
    }

    fn create_schema(&self) -> Result<(), EventStoreError> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS index_meta (
                identity TEXT PRIMARY KEY,
                version INTEGER NOT NULL
            );

            -- One row per event per file
            CREATE TABLE IF NOT EXISTS subscriptions (
                file_path TEXT NOT NULL,
                event TEXT NOT NULL,
                entry_count INTEGER NOT NULL,
                payload BLOB NOT NULL,
                PRIMARY KEY (file_path, event)
            );

            CREATE INDEX IF NOT EXISTS idx_subscriptions_event ON subscriptions(event);

            -- File metadata for tracking indexing status
            CREATE TABLE IF NOT EXISTS indexed_files (
                file_path TEXT PRIMARY KEY,
                file_hash TEXT NOT NULL,
                indexed_at INTEGER NOT NULL,
                subscription_count INTEGER NOT NULL
            );
            "#,
        )?;

        Ok(())
    }

    /// Drop everything indexed under another schema version.
    fn check_version(&self) -> Result<(), EventStoreError> {
        let stored = self.schema_version()?;
        if stored == Some(SCHEMA_VERSION) {
            return Ok(());
        }

        if let Some(old) = stored {
            tracing::info!(
                "[EventIndexStore] Schema version changed ({} -> {}), invalidating index",
                old,
                SCHEMA_VERSION
            );
        }
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM subscriptions", [])?;
        tx.execute("DELETE FROM indexed_files", [])?;
        tx.execute(
            "INSERT OR REPLACE INTO index_meta (identity, version) VALUES (?1, ?2)",
            params![INDEX_ID, SCHEMA_VERSION],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Schema version recorded in the database
    pub fn schema_version(&self) -> Result<Option<i64>, EventStoreError> {
        let conn = self.conn()?;
        let version = conn
            .query_row(
                "SELECT version FROM index_meta WHERE identity = ?1",
                params![INDEX_ID],
                |row| row.get(0),
            )
            .optional()?;
        Ok(version)
    }

    /// Replace everything stored for a file with `payload`.
    ///
    /// An empty payload still marks the file as indexed.
    pub fn put(
        &self,
        file_path: &str,
        file_hash: &str,
        payload: &FilePayload,
    ) -> Result<usize, EventStoreError> {
        let mut encoded = Vec::with_capacity(payload.event_count());
        for (event, subscriptions) in payload.events() {
            let blob = bincode::serde::encode_to_vec(subscriptions, bincode::config::standard())?;
            encoded.push((event, subscriptions.len() as i64, blob));
        }

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            "DELETE FROM subscriptions WHERE file_path = ?1",
            params![file_path],
        )?;
        for (event, entry_count, blob) in &encoded {
            tx.execute(
                r#"
                INSERT INTO subscriptions (file_path, event, entry_count, payload)
                VALUES (?1, ?2, ?3, ?4)
                "#,
                params![file_path, event, entry_count, blob],
            )?;
        }

        let count = payload.subscription_count();
        tx.execute(
            r#"
            INSERT OR REPLACE INTO indexed_files (file_path, file_hash, indexed_at, subscription_count)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![file_path, file_hash, Utc::now().timestamp(), count as i64],
        )?;

        tx.commit()?;
        Ok(count)
    }

    /// Forget a file entirely
    pub fn remove_file(&self, file_path: &str) -> Result<bool, EventStoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM subscriptions WHERE file_path = ?1",
            params![file_path],
        )?;
        let removed = tx.execute(
            "DELETE FROM indexed_files WHERE file_path = ?1",
            params![file_path],
        )?;
        tx.commit()?;
        Ok(removed > 0)
    }

    /// Drop every entry; all files go back to not indexed
    pub fn invalidate_all(&self) -> Result<(), EventStoreError> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM subscriptions", [])?;
        conn.execute("DELETE FROM indexed_files", [])?;
        Ok(())
    }

    /// Per-file fragments stored for an event, ordered by file path
    pub fn all_values_for(
        &self,
        event: &str,
    ) -> Result<Vec<(String, Vec<EventSubscription>)>, EventStoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT file_path, payload FROM subscriptions
            WHERE event = ?1
            ORDER BY file_path
            "#,
        )?;

        let rows = stmt
            .query_map(params![event], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(file_path, blob)| Ok((file_path, decode_subscriptions(&blob)?)))
            .collect()
    }

    /// Every subscription to `event` with the file it was found in
    pub fn lookup_by_event(
        &self,
        event: &str,
    ) -> Result<Vec<(String, EventSubscription)>, EventStoreError> {
        let hits = self
            .all_values_for(event)?
            .into_iter()
            .flat_map(|(file_path, subscriptions)| {
                subscriptions
                    .into_iter()
                    .map(move |subscription| (file_path.clone(), subscription))
            })
            .collect();
        Ok(hits)
    }

    /// Stored payload of a file, `None` if the file is not indexed
    pub fn file_payload(&self, file_path: &str) -> Result<Option<FilePayload>, EventStoreError> {
        if self.indexed_file(file_path)?.is_none() {
            return Ok(None);
        }

        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT event, payload FROM subscriptions WHERE file_path = ?1 ORDER BY event",
        )?;
        let rows = stmt
            .query_map(params![file_path], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut payload = FilePayload::new();
        for (event, blob) in rows {
            payload.insert_group(event, decode_subscriptions(&blob)?);
        }
        Ok(Some(payload))
    }

    /// Indexing state of a file
    pub fn indexed_file(&self, file_path: &str) -> Result<Option<IndexedFile>, EventStoreError> {
        let conn = self.conn()?;
        let file = conn
            .query_row(
                r#"
                SELECT file_path, file_hash, indexed_at, subscription_count
                FROM indexed_files WHERE file_path = ?1
                "#,
                params![file_path],
                row_to_indexed_file,
            )
            .optional()?;
        Ok(file)
    }

    /// All indexed files, ordered by path
    pub fn indexed_files(&self) -> Result<Vec<IndexedFile>, EventStoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT file_path, file_hash, indexed_at, subscription_count
            FROM indexed_files ORDER BY file_path
            "#,
        )?;
        let files = stmt
            .query_map([], row_to_indexed_file)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(files)
    }

    /// Check if file needs reindexing
    pub fn needs_reindex(&self, file_path: &str, file_hash: &str) -> Result<bool, EventStoreError> {
        match self.indexed_file(file_path)? {
            Some(file) => Ok(file.file_hash != file_hash),
            None => Ok(true), // Not indexed yet
        }
    }

    /// Events whose name contains `pattern` (case-insensitive, no wildcards),
    /// handled in at least `min_files` files, ordered by event name
    pub fn search_events(
        &self,
        pattern: &str,
        min_files: usize,
    ) -> Result<Vec<EventSummary>, EventStoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT event, SUM(entry_count), COUNT(file_path)
            FROM subscriptions
            WHERE instr(lower(event), lower(?1)) > 0
            GROUP BY event
            HAVING COUNT(file_path) >= ?2
            ORDER BY event
            "#,
        )?;

        let summaries = stmt
            .query_map(params![pattern, min_files as i64], |row| {
                Ok(EventSummary {
                    event: row.get(0)?,
                    subscription_count: row.get::<_, i64>(1)? as usize,
                    file_count: row.get::<_, i64>(2)? as usize,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(summaries)
    }

    /// Total subscriptions across all files
    pub fn count(&self) -> Result<usize, EventStoreError> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COALESCE(SUM(subscription_count), 0) FROM indexed_files",
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Number of indexed files, empty payloads included
    pub fn file_count(&self) -> Result<usize, EventStoreError> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM indexed_files", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Number of distinct events
    pub fn event_count(&self) -> Result<usize, EventStoreError> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(DISTINCT event) FROM subscriptions",
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

fn decode_subscriptions(blob: &[u8]) -> Result<Vec<EventSubscription>, EventStoreError> {
    let (subscriptions, _) =
        bincode::serde::decode_from_slice::<Vec<EventSubscription>, _>(blob, bincode::config::standard())?;
    Ok(subscriptions)
}

/// Convert a database row to an IndexedFile
fn row_to_indexed_file(row: &rusqlite::Row) -> rusqlite::Result<IndexedFile> {
    let indexed_at: i64 = row.get(2)?;
    Ok(IndexedFile {
        file_path: row.get(0)?,
        file_hash: row.get(1)?,
        indexed_at: Utc
            .timestamp_opt(indexed_at, 0)
            .single()
            .unwrap_or_default(),
        subscription_count: row.get::<_, i64>(3)? as usize,
    })
}

/// Error type for event index operations
#[derive(Debug, thiserror::Error)]
pub enum EventStoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Encode error: {0}")]
    Encode(#[from] bincode::error::EncodeError),
    #[error("Decode error: {0}")]
    Decode(#[from] bincode::error::DecodeError),
    #[error("Index lock poisoned")]
    Poisoned,
}
