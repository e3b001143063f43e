//! Content sections.
//!
//! The store keeps each section as an opaque JSON object keyed by a string id.
//! This module gives those documents a shape: [`SectionId`] names the twelve
//! sections the site knows about, and [`SectionContent`] is the tagged union of
//! their typed records.
//!
//! ## Section shapes
//!
//! | Id | Record |
//! |----|--------|
//! | `hero` | [`HeroSection`] |
//! | `introduction` | [`IntroductionSection`] |
//! | `current_work` | [`CurrentWorkSection`] |
//! | `read_invitation` | [`ReadInvitationSection`] |
//! | `newsletter` | [`NewsletterSection`] |
//! | `nav_items` | [`NavItemsSection`] |
//! | `read_page` | [`ReadPageSection`] |
//! | `listen_page` | [`ListenPageSection`] |
//! | `books_page` | [`BooksPageSection`] |
//! | `about_page` | [`AboutPageSection`] |
//! | `archive_page` | [`ArchivePageSection`] |
//! | `intervals_page` | [`IntervalsPageSection`] |
//!
//! Every field is optional in storage and falls back to its type's default.
//! Conversion from a [`Document`] checks type shape only: a number where a
//! string belongs is an error, extra fields are ignored.

use crate::types::{Book, Category, NavItem, Poem, Publication, Recording};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A section's stored value: a JSON object of field name to value.
pub type Document = serde_json::Map<String, Value>;

#[derive(Error, Debug)]
pub enum SectionError {
    #[error("unknown section '{0}'")]
    Unknown(String),
    #[error("section '{id}' does not match its shape: {source}")]
    Shape {
        id: SectionId,
        source: serde_json::Error,
    },
}

/// The sections the site renders from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SectionId {
    Hero,
    Introduction,
    CurrentWork,
    ReadInvitation,
    Newsletter,
    NavItems,
    ReadPage,
    ListenPage,
    BooksPage,
    AboutPage,
    ArchivePage,
    IntervalsPage,
}

impl SectionId {
    pub const ALL: [SectionId; 12] = [
        SectionId::Hero,
        SectionId::Introduction,
        SectionId::CurrentWork,
        SectionId::ReadInvitation,
        SectionId::Newsletter,
        SectionId::NavItems,
        SectionId::ReadPage,
        SectionId::ListenPage,
        SectionId::BooksPage,
        SectionId::AboutPage,
        SectionId::ArchivePage,
        SectionId::IntervalsPage,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SectionId::Hero => "hero",
            SectionId::Introduction => "introduction",
            SectionId::CurrentWork => "current_work",
            SectionId::ReadInvitation => "read_invitation",
            SectionId::Newsletter => "newsletter",
            SectionId::NavItems => "nav_items",
            SectionId::ReadPage => "read_page",
            SectionId::ListenPage => "listen_page",
            SectionId::BooksPage => "books_page",
            SectionId::AboutPage => "about_page",
            SectionId::ArchivePage => "archive_page",
            SectionId::IntervalsPage => "intervals_page",
        }
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SectionId {
    type Err = SectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SectionId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| SectionError::Unknown(s.to_string()))
    }
}

// ============================================================================
// Section records
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeroSection {
    pub tagline: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntroductionSection {
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrentWorkSection {
    pub title: String,
    pub description: String,
    pub link_text: String,
    pub link_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadInvitationSection {
    pub text: String,
    pub link_text: String,
    pub link_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsletterSection {
    pub heading: String,
    pub text: String,
    pub placeholder: String,
    pub button_text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavItemsSection {
    pub items: Vec<NavItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadPageSection {
    pub title: String,
    pub intro: String,
    pub footer_text: String,
    pub poems: Vec<Poem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenPageSection {
    pub title: String,
    pub intro: String,
    pub description: String,
    pub recordings: Vec<Recording>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BooksPageSection {
    pub title: String,
    pub books: Vec<Book>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AboutPageSection {
    pub title: String,
    pub opening: Vec<String>,
    pub statement_of_practice: Vec<String>,
    pub selected_publications: Vec<Publication>,
    pub current_work: String,
    pub readings_collaborations: String,
    pub bio_50: String,
    pub bio_100: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchivePageSection {
    pub title: String,
    pub intro: String,
    pub categories: Vec<Category>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntervalsPageSection {
    pub title: String,
    pub paragraphs: Vec<String>,
    pub cta_intro: String,
    pub cta_text: String,
    pub link_text: String,
    pub link_url: String,
}

/// A section document checked against its record type.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionContent {
    Hero(HeroSection),
    Introduction(IntroductionSection),
    CurrentWork(CurrentWorkSection),
    ReadInvitation(ReadInvitationSection),
    Newsletter(NewsletterSection),
    NavItems(NavItemsSection),
    ReadPage(ReadPageSection),
    ListenPage(ListenPageSection),
    BooksPage(BooksPageSection),
    AboutPage(AboutPageSection),
    ArchivePage(ArchivePageSection),
    IntervalsPage(IntervalsPageSection),
}

impl SectionContent {
    /// Parse `doc` as the record type for `id`.
    pub fn from_document(id: SectionId, doc: &Document) -> Result<Self, SectionError> {
        Ok(match id {
            SectionId::Hero => Self::Hero(parse(id, doc)?),
            SectionId::Introduction => Self::Introduction(parse(id, doc)?),
            SectionId::CurrentWork => Self::CurrentWork(parse(id, doc)?),
            SectionId::ReadInvitation => Self::ReadInvitation(parse(id, doc)?),
            SectionId::Newsletter => Self::Newsletter(parse(id, doc)?),
            SectionId::NavItems => Self::NavItems(parse(id, doc)?),
            SectionId::ReadPage => Self::ReadPage(parse(id, doc)?),
            SectionId::ListenPage => Self::ListenPage(parse(id, doc)?),
            SectionId::BooksPage => Self::BooksPage(parse(id, doc)?),
            SectionId::AboutPage => Self::AboutPage(parse(id, doc)?),
            SectionId::ArchivePage => Self::ArchivePage(parse(id, doc)?),
            SectionId::IntervalsPage => Self::IntervalsPage(parse(id, doc)?),
        })
    }

    /// The variant for `id` with every field at its type default.
    pub fn empty(id: SectionId) -> Self {
        match id {
            SectionId::Hero => Self::Hero(Default::default()),
            SectionId::Introduction => Self::Introduction(Default::default()),
            SectionId::CurrentWork => Self::CurrentWork(Default::default()),
            SectionId::ReadInvitation => Self::ReadInvitation(Default::default()),
            SectionId::Newsletter => Self::Newsletter(Default::default()),
            SectionId::NavItems => Self::NavItems(Default::default()),
            SectionId::ReadPage => Self::ReadPage(Default::default()),
            SectionId::ListenPage => Self::ListenPage(Default::default()),
            SectionId::BooksPage => Self::BooksPage(Default::default()),
            SectionId::AboutPage => Self::AboutPage(Default::default()),
            SectionId::ArchivePage => Self::ArchivePage(Default::default()),
            SectionId::IntervalsPage => Self::IntervalsPage(Default::default()),
        }
    }

    pub fn id(&self) -> SectionId {
        match self {
            Self::Hero(_) => SectionId::Hero,
            Self::Introduction(_) => SectionId::Introduction,
            Self::CurrentWork(_) => SectionId::CurrentWork,
            Self::ReadInvitation(_) => SectionId::ReadInvitation,
            Self::Newsletter(_) => SectionId::Newsletter,
            Self::NavItems(_) => SectionId::NavItems,
            Self::ReadPage(_) => SectionId::ReadPage,
            Self::ListenPage(_) => SectionId::ListenPage,
            Self::BooksPage(_) => SectionId::BooksPage,
            Self::AboutPage(_) => SectionId::AboutPage,
            Self::ArchivePage(_) => SectionId::ArchivePage,
            Self::IntervalsPage(_) => SectionId::IntervalsPage,
        }
    }

    /// Serialize back to a storable document.
    pub fn to_document(&self) -> Document {
        let value = match self {
            Self::Hero(s) => serde_json::to_value(s),
            Self::Introduction(s) => serde_json::to_value(s),
            Self::CurrentWork(s) => serde_json::to_value(s),
            Self::ReadInvitation(s) => serde_json::to_value(s),
            Self::Newsletter(s) => serde_json::to_value(s),
            Self::NavItems(s) => serde_json::to_value(s),
            Self::ReadPage(s) => serde_json::to_value(s),
            Self::ListenPage(s) => serde_json::to_value(s),
            Self::BooksPage(s) => serde_json::to_value(s),
            Self::AboutPage(s) => serde_json::to_value(s),
            Self::ArchivePage(s) => serde_json::to_value(s),
            Self::IntervalsPage(s) => serde_json::to_value(s),
        };
        // Plain structs of strings, numbers and vectors always serialize to objects.
        match value {
            Ok(Value::Object(map)) => map,
            _ => Document::new(),
        }
    }
}

fn parse<T: DeserializeOwned>(id: SectionId, doc: &Document) -> Result<T, SectionError> {
    serde_json::from_value(Value::Object(doc.clone()))
        .map_err(|source| SectionError::Shape { id, source })
}
