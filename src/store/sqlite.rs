//! SQLite content backend.
//!
//! ## Schema
//!
//! ```sql
//! site_content(id TEXT PRIMARY KEY, content TEXT NOT NULL, updated_at TEXT NOT NULL)
//! store_meta(key TEXT PRIMARY KEY, value TEXT NOT NULL)
//! ```
//!
//! `content` is the section document as JSON text and `updated_at` an RFC 3339
//! UTC timestamp with nanosecond precision. `store_meta` holds the SHA-256 of
//! the access key under `access_key_sha256`.
//!
//! ## Access
//!
//! Every operation opens its own connection, checks the access key, runs, and
//! drops the connection. The database file is never created implicitly: a
//! missing file is [`StoreError::Unavailable`], a file without `store_meta` is
//! [`StoreError::NotProvisioned`], and a key whose hash does not match is
//! [`StoreError::AccessDenied`].

use super::{ContentBackend, SectionRecord, StoreError};
use crate::sections::Document;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OpenFlags, OptionalExtension, params};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Duration;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS site_content (
        id TEXT PRIMARY KEY,
        content TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS store_meta (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );
";

const ACCESS_KEY_META: &str = "access_key_sha256";

/// SHA-256 of an access key, as lowercase hex.
pub fn hash_access_key(key: &str) -> String {
    format!("{:x}", Sha256::digest(key.as_bytes()))
}

/// Create the tables and record the access key.
///
/// Safe to run again with the same key. Running it with a different key on an
/// already provisioned database fails with [`StoreError::AccessDenied`]
/// rather than replacing the recorded key.
pub fn provision(path: &Path, key: &str) -> Result<(), StoreError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let conn = Connection::open(path)?;
    conn.query_row("PRAGMA journal_mode=WAL;", [], |_| Ok(()))?;
    conn.execute_batch(SCHEMA)?;

    let wanted = hash_access_key(key);
    let existing: Option<String> = conn
        .query_row(
            "SELECT value FROM store_meta WHERE key = ?1",
            [ACCESS_KEY_META],
            |row| row.get(0),
        )
        .optional()?;
    match existing {
        Some(hash) if hash != wanted => Err(StoreError::AccessDenied),
        Some(_) => Ok(()),
        None => {
            conn.execute(
                "INSERT INTO store_meta (key, value) VALUES (?1, ?2)",
                params![ACCESS_KEY_META, wanted],
            )?;
            tracing::info!(path = %path.display(), "content store provisioned");
            Ok(())
        }
    }
}

/// Sections stored in a provisioned SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteBackend {
    path: PathBuf,
    key_hash: String,
}

impl SqliteBackend {
    pub fn new(path: impl Into<PathBuf>, key: &str) -> Self {
        Self {
            path: path.into(),
            key_hash: hash_access_key(key),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        if !self.path.exists() {
            return Err(StoreError::Unavailable(format!(
                "{} does not exist",
                self.path.display()
            )));
        }
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.busy_timeout(Duration::from_secs(5))?;

        let has_meta: bool = conn.query_row(
            "SELECT count(*) > 0 FROM sqlite_master WHERE type = 'table' AND name = 'store_meta'",
            [],
            |row| row.get(0),
        )?;
        if !has_meta {
            return Err(StoreError::NotProvisioned(self.path.display().to_string()));
        }
        let recorded: Option<String> = conn
            .query_row(
                "SELECT value FROM store_meta WHERE key = ?1",
                [ACCESS_KEY_META],
                |row| row.get(0),
            )
            .optional()?;
        match recorded {
            None => Err(StoreError::NotProvisioned(self.path.display().to_string())),
            Some(hash) if hash == self.key_hash => Ok(conn),
            Some(_) => Err(StoreError::AccessDenied),
        }
    }
}

fn to_record(id: String, content: String, updated_at: String) -> Result<SectionRecord, StoreError> {
    let content: Document = serde_json::from_str(&content)?;
    let updated_at = DateTime::parse_from_rfc3339(&updated_at)
        .map_err(|e| StoreError::Unavailable(format!("bad updated_at for '{id}': {e}")))?
        .with_timezone(&Utc);
    Ok(SectionRecord {
        id,
        content,
        updated_at,
    })
}

impl ContentBackend for SqliteBackend {
    fn read(&self, id: &str) -> Result<Option<SectionRecord>, StoreError> {
        let conn = self.connect()?;
        let row: Option<(String, String, String)> = conn
            .query_row(
                "SELECT id, content, updated_at FROM site_content WHERE id = ?1",
                [id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;
        row.map(|(id, content, updated_at)| to_record(id, content, updated_at))
            .transpose()
    }

    fn write(&self, id: &str, content: &Document) -> Result<SectionRecord, StoreError> {
        let conn = self.connect()?;
        let updated_at = Utc::now();
        let json = serde_json::to_string(content)?;
        conn.execute(
            "INSERT INTO site_content (id, content, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET content = excluded.content, updated_at = excluded.updated_at",
            params![
                id,
                json,
                updated_at.to_rfc3339_opts(SecondsFormat::Nanos, true)
            ],
        )?;
        Ok(SectionRecord {
            id: id.to_string(),
            content: content.clone(),
            updated_at,
        })
    }

    fn read_all(&self) -> Result<Vec<SectionRecord>, StoreError> {
        let conn = self.connect()?;
        let mut stmt =
            conn.prepare("SELECT id, content, updated_at FROM site_content ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;
        let mut records = Vec::new();
        for row in rows {
            let (id, content, updated_at) = row?;
            records.push(to_record(id, content, updated_at)?);
        }
        Ok(records)
    }

    fn describe(&self) -> String {
        format!("sqlite:{}", self.path.display())
    }
}
