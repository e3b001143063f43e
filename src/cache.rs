//! Render cache for public pages.
//!
//! Every public route is rendered once and then served from disk until
//! something marks it stale. Nothing expires on a timer: pages change only
//! when the editor publishes (see [`crate::invalidation`]).
//!
//! # Design
//!
//! ## Entries
//!
//! The manifest maps a route (`/`, `/read`, ...) to a [`CacheEntry`]:
//!
//! - **`file`**: the rendered HTML, relative to the output directory
//!   (`index.html`, `read/index.html`).
//! - **`content_hash`**: SHA-256 of the HTML, so `quire build` can report
//!   which pages actually changed after a re-render.
//! - **`rendered_at`**: when the HTML was produced.
//! - **`stale`**: set by invalidation, cleared by the next render.
//! - **`tags`**: the section ids the page was rendered from, plus `site`.
//!   Invalidating a tag marks every page carrying it stale.
//!
//! A lookup is a hit only when the entry exists, is not stale, and its file
//! is still on disk.
//!
//! ## Storage
//!
//! The manifest is a JSON file at `<output_dir>/.render-cache.json`, next to
//! the pages it describes, so the output directory can be served or copied as
//! a unit.
//!
//! ## Concurrency
//!
//! [`PageCache`] keeps the manifest behind a `Mutex` and writes it back after
//! every change. The site renderer and the invalidator share one `PageCache`
//! through an `Arc`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Name of the cache manifest file within the output directory.
const MANIFEST_FILENAME: &str = ".render-cache.json";

/// Version of the manifest format. Bump to discard existing caches when the
/// format changes.
const MANIFEST_VERSION: u32 = 1;

/// Tag carried by every cached page.
pub const SITE_TAG: &str = "site";

/// One cached route.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheEntry {
    pub file: String,
    pub content_hash: String,
    pub rendered_at: DateTime<Utc>,
    pub stale: bool,
    pub tags: Vec<String>,
}

/// On-disk manifest of rendered routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheManifest {
    pub version: u32,
    pub entries: BTreeMap<String, CacheEntry>,
}

impl CacheManifest {
    pub fn empty() -> Self {
        Self {
            version: MANIFEST_VERSION,
            entries: BTreeMap::new(),
        }
    }

    /// Load from the output directory. Returns an empty manifest if the file
    /// is missing, unreadable, or from another format version.
    pub fn load(output_dir: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(manifest_path(output_dir)) else {
            return Self::empty();
        };
        match serde_json::from_str::<Self>(&content) {
            Ok(m) if m.version == MANIFEST_VERSION => m,
            _ => Self::empty(),
        }
    }

    pub fn save(&self, output_dir: &Path) -> io::Result<()> {
        std::fs::create_dir_all(output_dir)?;
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(manifest_path(output_dir), json)
    }

    /// Mark routes stale. Unknown and already-stale routes are skipped.
    /// Returns how many entries changed.
    pub fn mark_stale<'a>(&mut self, routes: impl IntoIterator<Item = &'a str>) -> usize {
        let mut changed = 0;
        for route in routes {
            if let Some(entry) = self.entries.get_mut(&normalize_route(route))
                && !entry.stale
            {
                entry.stale = true;
                changed += 1;
            }
        }
        changed
    }

    /// Mark every route carrying `tag` stale. Returns how many changed.
    pub fn mark_tag_stale(&mut self, tag: &str) -> usize {
        let mut changed = 0;
        for entry in self.entries.values_mut() {
            if !entry.stale && entry.tags.iter().any(|t| t == tag) {
                entry.stale = true;
                changed += 1;
            }
        }
        changed
    }
}

/// The render cache shared by the site and the invalidator.
#[derive(Debug)]
pub struct PageCache {
    output_dir: PathBuf,
    manifest: Mutex<CacheManifest>,
}

impl PageCache {
    /// Open the cache in `output_dir`, loading any existing manifest.
    pub fn open(output_dir: impl Into<PathBuf>) -> Self {
        let output_dir = output_dir.into();
        let manifest = CacheManifest::load(&output_dir);
        Self {
            output_dir,
            manifest: Mutex::new(manifest),
        }
    }

    /// Open with an empty manifest, ignoring what is on disk.
    pub fn fresh(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            manifest: Mutex::new(CacheManifest::empty()),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn manifest(&self) -> MutexGuard<'_, CacheManifest> {
        self.manifest.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Cached HTML for `route` if the entry is fresh and its file exists.
    pub fn lookup(&self, route: &str) -> Option<String> {
        let file = {
            let manifest = self.manifest();
            let entry = manifest.entries.get(&normalize_route(route))?;
            if entry.stale {
                return None;
            }
            entry.file.clone()
        };
        std::fs::read_to_string(self.output_dir.join(file)).ok()
    }

    /// Write `html` for `route` and record a fresh entry.
    ///
    /// Returns the new entry and whether its content differs from the
    /// previous render.
    pub fn store(&self, route: &str, html: &str, tags: Vec<String>) -> io::Result<(CacheEntry, bool)> {
        let route = normalize_route(route);
        let file = route_file(&route);
        let path = self.output_dir.join(&file);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, html)?;

        let entry = CacheEntry {
            file,
            content_hash: hash_content(html),
            rendered_at: Utc::now(),
            stale: false,
            tags,
        };
        let mut manifest = self.manifest();
        let changed = manifest
            .entries
            .get(&route)
            .is_none_or(|old| old.content_hash != entry.content_hash);
        manifest.entries.insert(route, entry.clone());
        manifest.save(&self.output_dir)?;
        Ok((entry, changed))
    }

    /// Mark routes stale and persist. Returns how many entries changed.
    pub fn invalidate_paths(&self, routes: &[String]) -> io::Result<usize> {
        let mut manifest = self.manifest();
        let changed = manifest.mark_stale(routes.iter().map(String::as_str));
        if changed > 0 {
            manifest.save(&self.output_dir)?;
        }
        Ok(changed)
    }

    /// Mark every route tagged `tag` stale and persist.
    pub fn invalidate_tag(&self, tag: &str) -> io::Result<usize> {
        let mut manifest = self.manifest();
        let changed = manifest.mark_tag_stale(tag);
        if changed > 0 {
            manifest.save(&self.output_dir)?;
        }
        Ok(changed)
    }

    /// Snapshot of all entries, ordered by route.
    pub fn entries(&self) -> Vec<(String, CacheEntry)> {
        self.manifest()
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// `/read/` and `read` both become `/read`; the root stays `/`.
pub fn normalize_route(route: &str) -> String {
    let trimmed = route.trim().trim_matches('/');
    format!("/{trimmed}")
}

/// File a route's HTML is written to, relative to the output directory.
pub fn route_file(route: &str) -> String {
    match normalize_route(route).trim_start_matches('/') {
        "" => "index.html".to_string(),
        path => format!("{path}/index.html"),
    }
}

/// SHA-256 of rendered HTML, as a hex string.
pub fn hash_content(html: &str) -> String {
    format!("{:x}", Sha256::digest(html.as_bytes()))
}

/// Resolve the cache manifest path for an output directory.
pub fn manifest_path(output_dir: &Path) -> PathBuf {
    output_dir.join(MANIFEST_FILENAME)
}
