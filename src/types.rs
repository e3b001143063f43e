//! Item types shared by sections, pages and the editor.
//!
//! Every list-valued section (navigation, poems, recordings, books, archive
//! entries) stores records of one of these types. All of them implement
//! [`Orderable`](crate::collection::Orderable), so the same collection rules
//! apply to each.
//!
//! Fields default when absent from a stored document. A missing `enabled`
//! reads as `false`, so an item only becomes public once it has been enabled
//! explicitly.

use crate::collection::Orderable;
use serde::{Deserialize, Serialize};

/// A link in the site navigation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavItem {
    pub id: String,
    pub label: String,
    pub href: String,
    pub enabled: bool,
    pub order: i64,
}

/// A poem on the Read page. Stanzas keep their line breaks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Poem {
    pub id: String,
    pub title: String,
    pub enabled: bool,
    pub order: i64,
    pub stanzas: Vec<String>,
}

/// An audio recording on the Listen page.
///
/// `file_url` is set once an upload has been stored; older records only
/// carry a `filename` served from `/audio/`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Recording {
    pub id: String,
    pub label: String,
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    pub enabled: bool,
    pub order: i64,
}

impl Recording {
    /// Where a visitor's player fetches the audio from.
    pub fn source_url(&self) -> String {
        match &self.file_url {
            Some(url) if !url.is_empty() => url.clone(),
            _ => format!("/audio/{}", self.filename),
        }
    }
}

/// A book on the Books page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Book {
    pub id: String,
    pub title: String,
    pub publisher: String,
    /// Stored as `type`.
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub description2: String,
    pub link_text: String,
    pub link_url: String,
    pub enabled: bool,
    pub order: i64,
}

/// One published piece listed in the archive.
///
/// Entries written before ids existed deserialize with an empty `id` and
/// `order` 0; see [`assign_missing_ids`](crate::collection::assign_missing_ids).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveEntry {
    pub id: String,
    pub title: String,
    pub publication: String,
    pub date: String,
    pub url: Option<String>,
    pub enabled: bool,
    pub order: i64,
}

/// A fixed archive grouping such as "Poetry / Journals & Magazines".
///
/// Categories are a taxonomy, not a collection: they have no `enabled` or
/// `order` of their own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Category {
    pub id: String,
    pub label: String,
    pub sublabel: String,
    pub entries: Vec<ArchiveEntry>,
}

/// A line in the About page's selected publications list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Publication {
    pub text: String,
    pub link: Option<String>,
}

macro_rules! orderable {
    ($ty:ty, $prefix:literal, |$id:ident, $order:ident| $new:expr) => {
        impl Orderable for $ty {
            const ID_PREFIX: &'static str = $prefix;

            fn id(&self) -> &str {
                &self.id
            }
            fn set_id(&mut self, id: String) {
                self.id = id;
            }
            fn enabled(&self) -> bool {
                self.enabled
            }
            fn set_enabled(&mut self, enabled: bool) {
                self.enabled = enabled;
            }
            fn order(&self) -> i64 {
                self.order
            }
            fn set_order(&mut self, order: i64) {
                self.order = order;
            }
            fn new_item($id: String, $order: i64) -> Self {
                $new
            }
        }
    };
}

orderable!(NavItem, "nav", |id, order| NavItem {
    id,
    label: "New Link".into(),
    href: "/".into(),
    enabled: true,
    order,
});

orderable!(Poem, "poem", |id, order| Poem {
    id,
    title: "New Poem".into(),
    enabled: true,
    order,
    stanzas: vec![String::new()],
});

orderable!(Recording, "rec", |id, order| Recording {
    id,
    label: "New Recording".into(),
    filename: String::new(),
    file_url: None,
    enabled: true,
    order,
});

orderable!(Book, "book", |id, order| Book {
    id,
    title: "New Book".into(),
    publisher: String::new(),
    kind: "Poetry collection".into(),
    description: String::new(),
    description2: String::new(),
    link_text: "Find the book".into(),
    link_url: "#".into(),
    enabled: true,
    order,
});

orderable!(ArchiveEntry, "entry", |id, order| ArchiveEntry {
    id,
    title: String::new(),
    publication: String::new(),
    date: String::new(),
    url: None,
    enabled: true,
    order,
});
