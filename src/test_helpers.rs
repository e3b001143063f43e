//! Shared test utilities.
//!
//! Stand-ins for the crate's injected dependencies (content backend,
//! invalidator, session verifier) plus small builders for documents and
//! items.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let store = StoreAdapter::with_backend(FailingBackend::default());
//! let invalidator = Arc::new(RecordingInvalidator::default());
//! let verifier = StaticVerifier::new("token");
//! ```

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{Duration, Utc};
use serde_json::Value;

use crate::auth::{Session, SessionVerifier};
use crate::invalidation::{InvalidationError, Invalidator};
use crate::sections::Document;
use crate::store::{ContentBackend, MemoryBackend, SectionRecord, StoreError};
use crate::types::Poem;

// =========================================================================
// Builders
// =========================================================================

/// A JSON object literal as a [`Document`]. Panics on non-objects.
pub fn doc(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

pub fn poem(id: &str, title: &str, order: i64, enabled: bool) -> Poem {
    Poem {
        id: id.into(),
        title: title.into(),
        enabled,
        order,
        stanzas: vec![format!("{title}, first stanza")],
    }
}

// =========================================================================
// Content backend
// =========================================================================

/// A configured backend that fails.
///
/// The default fails every call. [`FailingBackend::failing_writes`] reads
/// through to a memory backend and fails only writes. Write attempts are
/// counted in a shared counter either way.
#[derive(Default)]
pub struct FailingBackend {
    reads: Option<MemoryBackend>,
    pub write_attempts: Arc<AtomicUsize>,
}

impl FailingBackend {
    pub fn failing_writes(reads: MemoryBackend) -> Self {
        Self {
            reads: Some(reads),
            write_attempts: Arc::default(),
        }
    }

    fn down() -> StoreError {
        StoreError::Unavailable("backend is down".into())
    }
}

impl ContentBackend for FailingBackend {
    fn read(&self, id: &str) -> Result<Option<SectionRecord>, StoreError> {
        match &self.reads {
            Some(memory) => memory.read(id),
            None => Err(Self::down()),
        }
    }

    fn write(&self, _id: &str, _content: &Document) -> Result<SectionRecord, StoreError> {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);
        Err(Self::down())
    }

    fn read_all(&self) -> Result<Vec<SectionRecord>, StoreError> {
        match &self.reads {
            Some(memory) => memory.read_all(),
            None => Err(Self::down()),
        }
    }

    fn describe(&self) -> String {
        "failing:".to_string()
    }
}

// =========================================================================
// Invalidator
// =========================================================================

/// Records every call. Optionally fails them all.
#[derive(Default)]
pub struct RecordingInvalidator {
    fail: bool,
    paths: Mutex<Vec<Vec<String>>>,
    tags: Mutex<Vec<String>>,
}

impl RecordingInvalidator {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn path_calls(&self) -> Vec<Vec<String>> {
        self.paths.lock().unwrap().clone()
    }

    pub fn tag_calls(&self) -> Vec<String> {
        self.tags.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.path_calls().len() + self.tag_calls().len()
    }
}

impl Invalidator for RecordingInvalidator {
    fn invalidate_paths(&self, paths: &[String]) -> Result<(), InvalidationError> {
        self.paths.lock().unwrap().push(paths.to_vec());
        if self.fail {
            return Err(InvalidationError::Rejected("cache offline".into()));
        }
        Ok(())
    }

    fn invalidate_tag(&self, tag: &str) -> Result<(), InvalidationError> {
        self.tags.lock().unwrap().push(tag.to_string());
        if self.fail {
            return Err(InvalidationError::Rejected("cache offline".into()));
        }
        Ok(())
    }
}

// =========================================================================
// Session verifier
// =========================================================================

/// Accepts exactly one token.
pub struct StaticVerifier {
    token: String,
}

impl StaticVerifier {
    pub fn new(token: &str) -> Self {
        Self {
            token: token.to_string(),
        }
    }
}

impl SessionVerifier for StaticVerifier {
    fn verify(&self, token: &str) -> Option<Session> {
        (token == self.token).then(|| Session {
            token: token.to_string(),
            email: "editor@example.com".to_string(),
            expires_at: Utc::now() + Duration::hours(1),
        })
    }
}
