//! Content resolution.
//!
//! Turns section ids into documents the pages can render, whatever state the
//! store is in. Resolution never fails:
//!
//! ```text
//! store row  →  compiled-in default  →  empty document
//! ```
//!
//! An unconfigured store falls through silently. A configured store that
//! errors is logged at `warn` and falls through the same way, so a visitor
//! never sees a store failure.

use crate::collection;
use crate::defaults;
use crate::sections::{Document, SectionContent, SectionId};
use crate::store::{StoreAdapter, StoreError};
use crate::types::NavItem;
use serde_json::Value;
use std::collections::BTreeMap;

/// Read-side view of the content store with defaults applied.
#[derive(Debug, Clone)]
pub struct Resolver {
    store: StoreAdapter,
}

impl Resolver {
    pub fn new(store: StoreAdapter) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &StoreAdapter {
        &self.store
    }

    /// The stored document for `id`, else its default, else `{}`.
    pub fn resolve(&self, id: &str) -> Document {
        match self.store.read(id) {
            Ok(Some(record)) => record.content,
            Ok(None) => default_or_empty(id),
            Err(e) => {
                log_fallback(id, &e);
                default_or_empty(id)
            }
        }
    }

    /// Every section: defaults overlaid by whatever the store holds.
    ///
    /// The overlay is per section, not per field: a stored section replaces
    /// its default wholesale. Sections without a default still appear when
    /// stored. A failed bulk read returns the defaults unchanged.
    pub fn resolve_all(&self) -> BTreeMap<String, Document> {
        let mut all = defaults::default_documents();
        match self.store.read_all() {
            Ok(records) => {
                for record in records {
                    all.insert(record.id, record.content);
                }
            }
            Err(e) => log_fallback("*", &e),
        }
        all
    }

    /// Public navigation: enabled links in display order.
    ///
    /// Falls back to the built-in links whenever nothing would be shown:
    /// no `items`, an empty list, or a list whose items are all disabled.
    pub fn resolve_navigation(&self) -> Vec<NavItem> {
        let doc = self.resolve(SectionId::NavItems.as_str());
        let items: Vec<NavItem> = match doc.get("items") {
            Some(raw @ Value::Array(_)) => match serde_json::from_value(raw.clone()) {
                Ok(items) => items,
                Err(e) => {
                    tracing::warn!(section = "nav_items", error = %e, "malformed navigation, using built-in links");
                    Vec::new()
                }
            },
            _ => Vec::new(),
        };
        let visible = collection::public_view(&items);
        if visible.is_empty() {
            return defaults::builtin_navigation();
        }
        visible
    }

    /// [`resolve`](Self::resolve) checked against the section's record type.
    ///
    /// A document of the wrong shape is logged and replaced by the default.
    pub fn resolve_section(&self, id: SectionId) -> SectionContent {
        let doc = self.resolve(id.as_str());
        match SectionContent::from_document(id, &doc) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(section = %id, error = %e, "stored section has the wrong shape, using default");
                typed_default(id)
            }
        }
    }
}

fn default_or_empty(id: &str) -> Document {
    defaults::default_document(id).unwrap_or_default()
}

fn typed_default(id: SectionId) -> SectionContent {
    let doc = default_or_empty(id.as_str());
    SectionContent::from_document(id, &doc).unwrap_or_else(|_| SectionContent::empty(id))
}

fn log_fallback(id: &str, err: &StoreError) {
    if err.is_unconfigured() {
        return;
    }
    tracing::warn!(section = id, error = %err, "content store read failed, using defaults");
}
