//! Embedded index for the disk tier
//!
//! A single SQLite table maps each key to its payload file and bookkeeping.
//! The index, not the directory listing, decides what exists on disk.

use crate::clock::{from_unix_millis, saturating_millis, to_unix_millis};
use crate::entry::Metadata;
use crate::errors::{CacheError, RecoveryHint, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::time::{Duration, SystemTime};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS cache_entries (
    key          TEXT PRIMARY KEY,
    handle       TEXT NOT NULL,
    created_at   INTEGER NOT NULL,
    ttl_ms       INTEGER,
    size_bytes   INTEGER NOT NULL,
    access_count INTEGER NOT NULL DEFAULT 0,
    metadata     TEXT
);
CREATE INDEX IF NOT EXISTS idx_created_at ON cache_entries(created_at);
";

/// One row of the index
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct IndexRecord {
    pub key: String,
    /// Payload file name inside the tier directory
    pub handle: String,
    pub created_at: SystemTime,
    pub ttl: Option<Duration>,
    pub size_bytes: u64,
    pub access_count: u64,
    pub metadata: Metadata,
}

/// Key and payload file of a stored entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HandleRef {
    pub key: String,
    pub handle: String,
    pub size_bytes: u64,
}

pub(crate) struct DiskIndex {
    conn: Connection,
}

impl DiskIndex {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|e| CacheError::StoreUnavailable {
            reason: format!("cannot open index '{}': {e}", path.display()),
            recovery_hint: RecoveryHint::CheckPermissions {
                path: path.to_path_buf(),
            },
        })?;

        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))
            .and_then(|_| conn.pragma_update(None, "synchronous", "NORMAL"))
            .and_then(|_| conn.execute_batch(SCHEMA))
            .map_err(|e| CacheError::StoreUnavailable {
                reason: format!("cannot initialise index '{}': {e}", path.display()),
                recovery_hint: RecoveryHint::RebuildIndex,
            })?;

        Ok(Self { conn })
    }

    pub fn get(&self, key: &str) -> Result<Option<IndexRecord>> {
        let row = self
            .conn
            .query_row(
                "SELECT handle, created_at, ttl_ms, size_bytes, access_count, metadata
                 FROM cache_entries WHERE key = ?1",
                params![key],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, Option<i64>>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, i64>(4)?,
                        row.get::<_, Option<String>>(5)?,
                    ))
                },
            )
            .optional()
            .map_err(|e| index_error("lookup", e))?;

        let Some((handle, created_at, ttl_ms, size_bytes, access_count, metadata)) = row else {
            return Ok(None);
        };

        let metadata = match metadata {
            Some(blob) => serde_json::from_str(&blob).map_err(|e| CacheError::Corruption {
                key: key.to_string(),
                reason: format!("unreadable metadata in index row: {e}"),
                recovery_hint: RecoveryHint::Ignore,
            })?,
            None => Metadata::new(),
        };

        Ok(Some(IndexRecord {
            key: key.to_string(),
            handle,
            created_at: from_unix_millis(created_at),
            ttl: ttl_ms.map(|ms| Duration::from_millis(ms.max(0) as u64)),
            size_bytes: size_bytes.max(0) as u64,
            access_count: access_count.max(0) as u64,
            metadata,
        }))
    }

    /// Insert or replace `record`; returns the handle it replaced, if any
    pub fn upsert(&mut self, record: &IndexRecord) -> Result<Option<String>> {
        let metadata = if record.metadata.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&record.metadata).map_err(|e| CacheError::from(e).with_key(&record.key))?)
        };

        let tx = self
            .conn
            .transaction()
            .map_err(|e| index_error("begin upsert", e))?;

        let previous: Option<String> = tx
            .query_row(
                "SELECT handle FROM cache_entries WHERE key = ?1",
                params![record.key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| index_error("upsert lookup", e))?;

        tx.execute(
            "INSERT OR REPLACE INTO cache_entries
             (key, handle, created_at, ttl_ms, size_bytes, access_count, metadata)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.key,
                record.handle,
                to_unix_millis(record.created_at),
                record.ttl.map(saturating_millis),
                record.size_bytes as i64,
                record.access_count as i64,
                metadata,
            ],
        )
        .map_err(|e| index_error("upsert", e))?;

        tx.commit().map_err(|e| index_error("commit upsert", e))?;
        Ok(previous)
    }

    /// Delete the row for `key`; returns its handle if it existed
    pub fn remove(&mut self, key: &str) -> Result<Option<String>> {
        let tx = self
            .conn
            .transaction()
            .map_err(|e| index_error("begin remove", e))?;

        let handle: Option<String> = tx
            .query_row(
                "SELECT handle FROM cache_entries WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| index_error("remove lookup", e))?;

        tx.execute("DELETE FROM cache_entries WHERE key = ?1", params![key])
            .map_err(|e| index_error("remove", e))?;
        tx.commit().map_err(|e| index_error("commit remove", e))?;
        Ok(handle)
    }

    pub fn record_hit(&self, key: &str) -> Result<()> {
        self.conn
            .execute(
                "UPDATE cache_entries SET access_count = access_count + 1 WHERE key = ?1",
                params![key],
            )
            .map_err(|e| index_error("record hit", e))?;
        Ok(())
    }

    /// Globally oldest entry by `created_at`, skipping `except`
    pub fn oldest_except(&self, except: &str) -> Result<Option<HandleRef>> {
        self.conn
            .query_row(
                "SELECT key, handle, size_bytes FROM cache_entries
                 WHERE key != ?1 ORDER BY created_at ASC, rowid ASC LIMIT 1",
                params![except],
                |row| {
                    Ok(HandleRef {
                        key: row.get(0)?,
                        handle: row.get(1)?,
                        size_bytes: row.get::<_, i64>(2)?.max(0) as u64,
                    })
                },
            )
            .optional()
            .map_err(|e| index_error("find oldest", e))
    }

    /// Summed size of every entry other than `except`
    pub fn total_size_except(&self, except: &str) -> Result<u64> {
        let total: i64 = self
            .conn
            .query_row(
                "SELECT COALESCE(SUM(size_bytes), 0) FROM cache_entries WHERE key != ?1",
                params![except],
                |row| row.get(0),
            )
            .map_err(|e| index_error("sum sizes", e))?;
        Ok(total.max(0) as u64)
    }

    /// (entry count, summed size)
    pub fn totals(&self) -> Result<(u64, u64)> {
        let (count, size): (i64, i64) = self
            .conn
            .query_row(
                "SELECT COUNT(*), COALESCE(SUM(size_bytes), 0) FROM cache_entries",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .map_err(|e| index_error("totals", e))?;
        Ok((count.max(0) as u64, size.max(0) as u64))
    }

    /// Entries whose TTL has elapsed at `now`
    pub fn expired(&self, now: SystemTime) -> Result<Vec<HandleRef>> {
        self.select_handles(
            "SELECT key, handle, size_bytes FROM cache_entries
             WHERE ttl_ms IS NOT NULL AND created_at + ttl_ms <= ?1",
            params![to_unix_millis(now)],
        )
    }

    pub fn all(&self) -> Result<Vec<HandleRef>> {
        self.select_handles("SELECT key, handle, size_bytes FROM cache_entries", [])
    }

    pub fn clear(&self) -> Result<()> {
        self.conn
            .execute("DELETE FROM cache_entries", [])
            .map_err(|e| index_error("clear", e))?;
        Ok(())
    }

    fn select_handles(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<HandleRef>> {
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| index_error("prepare scan", e))?;

        let rows = stmt
            .query_map(params, |row| {
                Ok(HandleRef {
                    key: row.get(0)?,
                    handle: row.get(1)?,
                    size_bytes: row.get::<_, i64>(2)?.max(0) as u64,
                })
            })
            .map_err(|e| index_error("scan", e))?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| index_error("scan row", e))
    }
}

fn index_error(operation: &'static str, source: rusqlite::Error) -> CacheError {
    CacheError::Index {
        operation,
        source,
        recovery_hint: RecoveryHint::RebuildIndex,
    }
}
