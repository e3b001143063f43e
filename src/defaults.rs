//! Compiled-in content.
//!
//! Two layers keep the public site presentable before anything has been
//! entered in the admin editor:
//!
//! - **Section defaults** (`static/defaults.json`): one document per section,
//!   returned by the resolver whenever the store has nothing for that id.
//! - **Page fallbacks** (`static/fallbacks.json`): richer copy the pages show
//!   when a resolved section has an empty list or empty fields (the sample
//!   poems, recordings, books, archive categories, about text and intervals
//!   copy).
//!
//! The built-in navigation is a third, code-level fallback used when the
//! `nav_items` document has no items at all.

use crate::sections::{AboutPageSection, Document, IntervalsPageSection};
use crate::types::{Book, Category, NavItem, Poem, Recording};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::LazyLock;

const DEFAULTS_JSON: &str = include_str!("../static/defaults.json");
const FALLBACKS_JSON: &str = include_str!("../static/fallbacks.json");

static DEFAULTS: LazyLock<BTreeMap<String, Document>> = LazyLock::new(|| {
    serde_json::from_str(DEFAULTS_JSON).expect("static/defaults.json must be a map of objects")
});

static FALLBACKS: LazyLock<Fallbacks> = LazyLock::new(|| {
    serde_json::from_str(FALLBACKS_JSON).expect("static/fallbacks.json must match Fallbacks")
});

/// Page-level fallback content.
#[derive(Debug, Clone, Deserialize)]
pub struct Fallbacks {
    pub poems: Vec<Poem>,
    pub recordings: Vec<Recording>,
    pub books: Vec<Book>,
    pub archive_categories: Vec<Category>,
    pub about_page: AboutPageSection,
    pub intervals_page: IntervalsPageSection,
}

/// Default document for a section id, if the site defines one.
pub fn default_document(id: &str) -> Option<Document> {
    DEFAULTS.get(id).cloned()
}

/// Every section default, keyed by id.
pub fn default_documents() -> BTreeMap<String, Document> {
    DEFAULTS.clone()
}

pub fn fallbacks() -> &'static Fallbacks {
    &FALLBACKS
}

/// Navigation shown when `nav_items` has no items.
pub fn builtin_navigation() -> Vec<NavItem> {
    [
        ("read", "Read", "/read"),
        ("listen", "Listen", "/listen"),
        ("books", "Books", "/books"),
        ("about", "About", "/about"),
        ("intervals", "Intervals", "/intervals"),
    ]
    .into_iter()
    .zip(1..)
    .map(|((id, label, href), order)| NavItem {
        id: id.into(),
        label: label.into(),
        href: href.into(),
        enabled: true,
        order,
    })
    .collect()
}
