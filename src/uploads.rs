//! Audio uploads.
//!
//! A recording's audio is uploaded once, stored under a path unique to that
//! upload, and the recording is pointed at the resulting public URL (see
//! [`EditSession::attach_recording_file`](crate::editor::EditSession::attach_recording_file)).
//!
//! Limits are checked before anything touches storage. Objects are never
//! overwritten: every upload lands at `audio/<recording_id>/<millis>.<ext>`.

use crate::config::UploadsConfig;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    #[error("file exceeds the {max_bytes} byte limit")]
    TooLarge { max_bytes: u64 },
    #[error("file is not audio")]
    NotAudio,
}

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("object path escapes the store root: {0}")]
    InvalidPath(String),
    #[error("object already exists: {0}")]
    Exists(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadLimits {
    pub max_bytes: u64,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_bytes: 100 * 1024 * 1024,
        }
    }
}

impl UploadLimits {
    pub fn from_config(config: &UploadsConfig) -> Self {
        Self {
            max_bytes: config.max_bytes,
        }
    }

    /// Reject oversized or non-audio files.
    pub fn validate(&self, content_type: &str, len: u64) -> Result<(), Rejection> {
        if !content_type.trim().to_ascii_lowercase().starts_with("audio/") {
            return Err(Rejection::NotAudio);
        }
        if len > self.max_bytes {
            return Err(Rejection::TooLarge {
                max_bytes: self.max_bytes,
            });
        }
        Ok(())
    }
}

/// Where uploads are kept.
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` at `path`. Fails if the path is taken.
    fn put(&self, path: &str, bytes: &[u8], content_type: &str) -> Result<(), UploadError>;
    /// URL visitors fetch `path` from.
    fn public_url(&self, path: &str) -> String;
    /// Stored object paths under `prefix`, sorted.
    fn list(&self, prefix: &str) -> Result<Vec<String>, UploadError>;
}

/// Recording ids become a path segment, so only `[A-Za-z0-9_-]` is allowed.
pub fn is_valid_recording_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// `audio/<recording_id>/<millis>.<ext>`, extension from the uploaded name.
pub fn object_path(recording_id: &str, file_name: &str, millis: i64) -> String {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .unwrap_or("bin");
    format!("audio/{recording_id}/{millis}.{ext}")
}

/// Objects as files under a root directory.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
    public_base_url: String,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &UploadsConfig) -> Self {
        Self::new(&config.root, &config.public_base_url)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ObjectStore for FsObjectStore {
    fn put(&self, path: &str, bytes: &[u8], _content_type: &str) -> Result<(), UploadError> {
        let relative = Path::new(path);
        if relative.as_os_str().is_empty()
            || !relative.components().all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(UploadError::InvalidPath(path.to_string()));
        }
        let target = self.root.join(relative);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(UploadError::Exists(path.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        file.write_all(bytes)?;
        tracing::info!(path, bytes = bytes.len(), "object stored");
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.public_base_url, path.trim_start_matches('/'))
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>, UploadError> {
        if Path::new(prefix)
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(UploadError::InvalidPath(prefix.to_string()));
        }
        let base = self.root.join(prefix);
        if !base.exists() {
            return Ok(Vec::new());
        }
        let mut paths = Vec::new();
        for entry in WalkDir::new(&base) {
            let entry = entry.map_err(io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Ok(rel) = entry.path().strip_prefix(&self.root) {
                let parts: Vec<_> = rel.components().map(|c| c.as_os_str().to_string_lossy()).collect();
                paths.push(parts.join("/"));
            }
        }
        paths.sort();
        Ok(paths)
    }
}
