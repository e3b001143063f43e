//! Invalidation gateway.
//!
//! Publishing means telling whatever caches public pages that they are out of
//! date. The [`Invalidator`] trait is that seam: the editor calls it with the
//! fixed list of public paths, the revalidation handlers call it with
//! whatever an authenticated client asked for.
//!
//! [`CacheInvalidator`] is the built-in implementation over the render cache.
//! Invalidating a path that was never rendered, or is already stale, is a
//! successful no-op, so publishing twice in a row is harmless.

use crate::cache::PageCache;
use std::sync::Arc;
use thiserror::Error;

/// Every public path a publish invalidates.
///
/// `/contact` is not rendered by this crate but stays in the list so a
/// fronting cache that serves it still hears about publishes.
pub const PUBLIC_PATHS: [&str; 8] = [
    "/",
    "/read",
    "/listen",
    "/books",
    "/about",
    "/archive",
    "/intervals",
    "/contact",
];

#[derive(Error, Debug)]
pub enum InvalidationError {
    #[error("failed to persist render cache: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalidation rejected: {0}")]
    Rejected(String),
}

pub trait Invalidator: Send + Sync {
    fn invalidate_paths(&self, paths: &[String]) -> Result<(), InvalidationError>;
    fn invalidate_tag(&self, tag: &str) -> Result<(), InvalidationError>;
}

/// [`PUBLIC_PATHS`] as owned strings.
pub fn public_paths() -> Vec<String> {
    PUBLIC_PATHS.iter().map(|p| p.to_string()).collect()
}

/// Marks render-cache entries stale.
#[derive(Debug, Clone)]
pub struct CacheInvalidator {
    cache: Arc<PageCache>,
}

impl CacheInvalidator {
    pub fn new(cache: Arc<PageCache>) -> Self {
        Self { cache }
    }
}

impl Invalidator for CacheInvalidator {
    fn invalidate_paths(&self, paths: &[String]) -> Result<(), InvalidationError> {
        let changed = self.cache.invalidate_paths(paths)?;
        tracing::info!(op = "invalidate_paths", paths = ?paths, changed, "render cache invalidated");
        Ok(())
    }

    fn invalidate_tag(&self, tag: &str) -> Result<(), InvalidationError> {
        let changed = self.cache.invalidate_tag(tag)?;
        tracing::info!(op = "invalidate_tag", tag, changed, "render cache invalidated");
        Ok(())
    }
}
