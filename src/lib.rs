//! # quire
//!
//! Content store, page renderer and publish workflow for a small author
//! website. The site's copy (home page blocks, navigation, poems, recordings,
//! books, archive, about and intervals pages) lives as one JSON document per
//! section in a content store. Visitors always get a complete page: anything
//! the store lacks comes from compiled-in defaults.
//!
//! # Architecture: Read Path and Write Path
//!
//! ```text
//! read:   store ─▶ resolver (+ defaults) ─▶ pages (+ fallbacks) ─▶ render ─▶ render cache ─▶ visitor
//! write:  editor buffer ─▶ save_section ─▶ store
//!                       └▶ publish ─▶ invalidator ─▶ render cache marked stale
//! ```
//!
//! Reads never fail. A missing or broken store degrades to defaults, logged
//! but invisible to visitors. Writes fail loudly and leave the editor's draft
//! untouched.
//!
//! Editing and publishing are separate steps. Saving a section writes it to
//! the store; visitors keep seeing the cached pages until a publish marks
//! them stale and the next request re-renders from the store.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`store`] | Section rows behind the [`store::ContentBackend`] trait; SQLite and in-memory backends |
//! | [`resolver`] | Store value → compiled-in default → empty, per section; public navigation |
//! | [`defaults`] | Section defaults and page-level fallback content |
//! | [`sections`] | Section ids and their typed record shapes |
//! | [`types`] | Orderable item types (nav links, poems, recordings, books, archive entries) |
//! | [`collection`] | Move, toggle, insert and remove over orderable lists |
//! | [`editor`] | Edit buffer, per-section saves and publish |
//! | [`invalidation`] | The [`invalidation::Invalidator`] seam and the render-cache implementation |
//! | [`cache`] | On-disk render cache with stale flags and tags |
//! | [`pages`] | Routes and the data each page shows |
//! | [`render`] | Maud templates |
//! | [`site`] | Serving routes through the render cache; parallel builds |
//! | [`handlers`] | Revalidation and audio upload endpoints as plain functions |
//! | [`auth`] | Editor sign-in and session verification |
//! | [`uploads`] | Upload limits and the object store for audio files |
//! | [`config`] | `quire.toml` loading, merging, validation and env overrides |
//! | [`telemetry`] | `tracing` subscriber setup |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Explicit Dependencies
//!
//! Nothing reaches for a global client. The store adapter, invalidator,
//! session verifier and object store are constructed once by the caller and
//! passed to whatever needs them, which is also how tests substitute them.
//!
//! ## One Row Per Section
//!
//! Sections are saved independently and the last write wins. There is no
//! cross-section transaction and no merge: a single editor is assumed.
//!
//! ## Maud Over Template Engines
//!
//! HTML is generated with [Maud](https://maud.lambda.xyz/). Templates are
//! checked at compile time and every interpolation is escaped, which matters
//! here because all rendered text is editor-supplied.

pub mod auth;
pub mod cache;
pub mod collection;
pub mod config;
pub mod defaults;
pub mod editor;
pub mod handlers;
pub mod invalidation;
pub mod output;
pub mod pages;
pub mod render;
pub mod resolver;
pub mod sections;
pub mod site;
pub mod store;
pub mod telemetry;
pub mod types;
pub mod uploads;

#[cfg(test)]
pub(crate) mod test_helpers;
