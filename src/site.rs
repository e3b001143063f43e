//! The public site: routes served through the render cache.
//!
//! ```text
//! serve("/read")
//!   ├─ fresh cache entry?  → cached HTML
//!   └─ miss or stale       → pages::load → render::render_page → cache.store
//! ```
//!
//! [`Site::build`] renders every route up front, in parallel, which is what
//! `quire build` runs after a deploy or a publish.

use crate::cache::PageCache;
use crate::config::SiteConfig;
use crate::pages::{self, Route};
use crate::render;
use crate::resolver::Resolver;
use rayon::prelude::*;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SiteError {
    #[error("no page at {0}")]
    NotFound(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Outcome of rendering one route during a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildResult {
    pub route: Route,
    pub file: String,
    pub bytes: usize,
    /// False when the new HTML is identical to the previous render.
    pub changed: bool,
}

#[derive(Debug)]
pub struct Site {
    resolver: Resolver,
    cache: Arc<PageCache>,
    config: SiteConfig,
    css: String,
}

impl Site {
    pub fn new(resolver: Resolver, cache: Arc<PageCache>, config: SiteConfig) -> Self {
        let css = render::site_css(&config);
        Self {
            resolver,
            cache,
            config,
            css,
        }
    }

    pub fn cache(&self) -> &Arc<PageCache> {
        &self.cache
    }

    /// Render `route` from current content, bypassing the cache.
    pub fn render(&self, route: Route) -> String {
        let data = pages::load(&self.resolver, route);
        render::render_page(&data, &self.config, &self.css).into_string()
    }

    /// HTML for a request path.
    pub fn serve(&self, path: &str) -> Result<String, SiteError> {
        let route: Route = path
            .parse()
            .map_err(|_| SiteError::NotFound(path.to_string()))?;
        if let Some(html) = self.cache.lookup(route.path()) {
            tracing::debug!(path = route.path(), "render cache hit");
            return Ok(html);
        }
        Ok(self.render_and_store(route)?.0)
    }

    /// Render every route and refresh the cache.
    pub fn build(&self) -> Result<Vec<BuildResult>, SiteError> {
        Route::ALL
            .par_iter()
            .map(|&route| {
                let (html, result) = self.render_and_store(route)?;
                debug_assert_eq!(html.len(), result.bytes);
                Ok(result)
            })
            .collect()
    }

    fn render_and_store(&self, route: Route) -> Result<(String, BuildResult), SiteError> {
        let html = self.render(route);
        let (entry, changed) = self.cache.store(route.path(), &html, route.tags())?;
        tracing::info!(path = route.path(), changed, "page rendered");
        let result = BuildResult {
            route,
            file: entry.file,
            bytes: html.len(),
            changed,
        };
        Ok((html, result))
    }
}
