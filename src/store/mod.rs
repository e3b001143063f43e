//! Content store adapter.
//!
//! The site keeps its editable content as one row per section: a string id, a
//! JSON document, and the time it was last written. This module reads and
//! writes those rows through the [`ContentBackend`] trait and wraps the
//! backend in a [`StoreAdapter`] that knows whether a store was configured at
//! all.
//!
//! ## Configured vs unavailable
//!
//! The two reasons a read can produce nothing are deliberately distinct:
//!
//! - [`StoreAdapter::Unconfigured`]: no store URL or key was given. This is
//!   a normal way to run the site (static defaults only) and is never logged
//!   as a problem. Every operation returns [`StoreError::Unconfigured`].
//! - A configured backend whose call fails (missing database file, wrong
//!   access key, corrupt row). These are reportable errors; the resolver logs
//!   them and falls back to defaults, writers surface them to the operator.
//!
//! ## Store URLs
//!
//! | URL | Backend |
//! |-----|---------|
//! | `memory:` | [`MemoryBackend`], a fresh in-process map |
//! | `sqlite:<path>` | [`SqliteBackend`] on `<path>` |
//! | `<path>` | [`SqliteBackend`] on `<path>` |
//!
//! ## Backends
//!
//! - [`sqlite::SqliteBackend`]: production backend. The database must be
//!   provisioned first ([`sqlite::provision`]), which creates the
//!   `site_content` table and records the hash of the access key.
//! - [`memory::MemoryBackend`]: for tests and throwaway sessions.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryBackend;
pub use sqlite::SqliteBackend;

use crate::sections::Document;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("content store is not configured")]
    Unconfigured,
    #[error("content store rejected the access key")]
    AccessDenied,
    #[error("content store at {0} has not been provisioned (run `quire store init`)")]
    NotProvisioned(String),
    #[error("content store unavailable: {0}")]
    Unavailable(String),
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// True for the silent "no store" state, false for real failures.
    pub fn is_unconfigured(&self) -> bool {
        matches!(self, StoreError::Unconfigured)
    }
}

/// One stored section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionRecord {
    pub id: String,
    pub content: Document,
    pub updated_at: DateTime<Utc>,
}

/// Row-per-section storage.
///
/// `write` is an upsert and always stamps `updated_at` with the time of the
/// call. `read_all` returns rows ordered by id.
pub trait ContentBackend: Send + Sync {
    fn read(&self, id: &str) -> Result<Option<SectionRecord>, StoreError>;
    fn write(&self, id: &str, content: &Document) -> Result<SectionRecord, StoreError>;
    fn read_all(&self) -> Result<Vec<SectionRecord>, StoreError>;
    /// Human-readable location, for logs and CLI output.
    fn describe(&self) -> String;
}

/// Where a store URL points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    Memory,
    Sqlite(PathBuf),
}

impl StoreLocation {
    pub fn parse(url: &str) -> Self {
        let url = url.trim();
        if url == "memory:" {
            StoreLocation::Memory
        } else if let Some(path) = url.strip_prefix("sqlite:") {
            StoreLocation::Sqlite(PathBuf::from(path.trim_start_matches("//")))
        } else {
            StoreLocation::Sqlite(PathBuf::from(url))
        }
    }
}

/// Prepare the store behind `url` for use with `key`.
///
/// Returns the store's description. `memory:` stores need no preparation.
pub fn provision(url: &str, key: &str) -> Result<String, StoreError> {
    match StoreLocation::parse(url) {
        StoreLocation::Memory => Ok("memory:".to_string()),
        StoreLocation::Sqlite(path) => {
            sqlite::provision(&path, key)?;
            Ok(format!("sqlite:{}", path.display()))
        }
    }
}

/// The content store as seen by the rest of the crate.
#[derive(Clone)]
pub enum StoreAdapter {
    Unconfigured,
    Configured(Arc<dyn ContentBackend>),
}

impl fmt::Debug for StoreAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreAdapter::Unconfigured => write!(f, "StoreAdapter::Unconfigured"),
            StoreAdapter::Configured(b) => write!(f, "StoreAdapter::Configured({})", b.describe()),
        }
    }
}

impl StoreAdapter {
    /// Build an adapter from a URL and access key.
    ///
    /// Either value missing (or blank) yields [`StoreAdapter::Unconfigured`].
    /// No I/O happens here; connection problems surface on first use.
    pub fn from_settings(url: Option<&str>, key: Option<&str>) -> Self {
        let url = url.map(str::trim).filter(|s| !s.is_empty());
        let key = key.map(str::trim).filter(|s| !s.is_empty());
        let (Some(url), Some(key)) = (url, key) else {
            tracing::debug!("content store not configured, serving defaults");
            return StoreAdapter::Unconfigured;
        };
        match StoreLocation::parse(url) {
            StoreLocation::Memory => Self::with_backend(MemoryBackend::new()),
            StoreLocation::Sqlite(path) => Self::with_backend(SqliteBackend::new(path, key)),
        }
    }

    pub fn with_backend(backend: impl ContentBackend + 'static) -> Self {
        StoreAdapter::Configured(Arc::new(backend))
    }

    pub fn is_configured(&self) -> bool {
        matches!(self, StoreAdapter::Configured(_))
    }

    pub fn describe(&self) -> String {
        match self {
            StoreAdapter::Unconfigured => "unconfigured (static defaults)".to_string(),
            StoreAdapter::Configured(b) => b.describe(),
        }
    }

    fn backend(&self) -> Result<&dyn ContentBackend, StoreError> {
        match self {
            StoreAdapter::Unconfigured => Err(StoreError::Unconfigured),
            StoreAdapter::Configured(b) => Ok(b.as_ref()),
        }
    }

    /// Read one section. A section that was never written is `Ok(None)`.
    pub fn read(&self, id: &str) -> Result<Option<SectionRecord>, StoreError> {
        self.backend()?.read(id)
    }

    /// Upsert one section.
    pub fn write(&self, id: &str, content: &Document) -> Result<SectionRecord, StoreError> {
        let record = self.backend()?.write(id, content)?;
        tracing::info!(section = id, updated_at = %record.updated_at, "section written");
        Ok(record)
    }

    /// Every stored section, ordered by id.
    pub fn read_all(&self) -> Result<Vec<SectionRecord>, StoreError> {
        self.backend()?.read_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(v: serde_json::Value) -> Document {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn parse_store_urls() {
        assert_eq!(StoreLocation::parse("memory:"), StoreLocation::Memory);
        assert_eq!(
            StoreLocation::parse("sqlite:site.db"),
            StoreLocation::Sqlite(PathBuf::from("site.db"))
        );
        assert_eq!(
            StoreLocation::parse("sqlite:///var/lib/quire/site.db"),
            StoreLocation::Sqlite(PathBuf::from("/var/lib/quire/site.db"))
        );
        assert_eq!(
            StoreLocation::parse("content/site.db"),
            StoreLocation::Sqlite(PathBuf::from("content/site.db"))
        );
    }

    #[test]
    fn missing_url_or_key_is_unconfigured() {
        assert!(!StoreAdapter::from_settings(None, Some("k")).is_configured());
        assert!(!StoreAdapter::from_settings(Some("memory:"), None).is_configured());
        assert!(!StoreAdapter::from_settings(Some("  "), Some("k")).is_configured());
        assert!(StoreAdapter::from_settings(Some("memory:"), Some("k")).is_configured());
    }

    #[test]
    fn unconfigured_operations_report_unconfigured() {
        let store = StoreAdapter::Unconfigured;
        assert!(store.read("hero").unwrap_err().is_unconfigured());
        assert!(store.read_all().unwrap_err().is_unconfigured());
        assert!(
            store
                .write("hero", &doc(json!({"tagline": "x"})))
                .unwrap_err()
                .is_unconfigured()
        );
    }

    #[test]
    fn write_then_read_round_trip() {
        let store = StoreAdapter::from_settings(Some("memory:"), Some("k"));
        let content = doc(json!({"tagline": "Poet"}));
        let before = Utc::now();
        store.write("hero", &content).unwrap();
        let record = store.read("hero").unwrap().unwrap();
        assert_eq!(record.content, content);
        assert!(record.updated_at >= before);
    }

    #[test]
    fn never_written_section_is_none() {
        let store = StoreAdapter::with_backend(MemoryBackend::new());
        assert!(store.read("hero").unwrap().is_none());
    }

    #[test]
    fn access_denied_is_not_unconfigured() {
        assert!(!StoreError::AccessDenied.is_unconfigured());
    }
}
