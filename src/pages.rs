//! Page data.
//!
//! Each public route is built from one or more resolved sections plus the
//! page-level fallbacks in [`defaults::fallbacks`]. This module decides
//! *what* a page shows; [`crate::render`] decides how it looks.
//!
//! | Route | Sections | Fallback rule |
//! |-------|----------|---------------|
//! | `/` | hero, introduction, current_work, read_invitation, newsletter | none |
//! | `/read` | read_page | sample poems when the stored list is empty |
//! | `/listen` | listen_page | sample recordings when the stored list is empty |
//! | `/books` | books_page | sample books when the stored list is empty |
//! | `/about` | about_page | built-in copy for every empty field |
//! | `/archive` | archive_page | built-in categories when the list is empty |
//! | `/intervals` | intervals_page | built-in copy for every empty field |
//!
//! A list with items that are all disabled is not empty: the page shows
//! nothing rather than the samples. Every page also depends on `nav_items`.

use crate::cache::SITE_TAG;
use crate::collection;
use crate::defaults;
use crate::resolver::Resolver;
use crate::sections::{
    AboutPageSection, ArchivePageSection, BooksPageSection, CurrentWorkSection, HeroSection,
    IntervalsPageSection, IntroductionSection, ListenPageSection, NewsletterSection,
    ReadInvitationSection, ReadPageSection, SectionContent, SectionId,
};
use crate::types::NavItem;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A public route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Read,
    Listen,
    Books,
    About,
    Archive,
    Intervals,
}

impl Route {
    pub const ALL: [Route; 7] = [
        Route::Home,
        Route::Read,
        Route::Listen,
        Route::Books,
        Route::About,
        Route::Archive,
        Route::Intervals,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Read => "/read",
            Route::Listen => "/listen",
            Route::Books => "/books",
            Route::About => "/about",
            Route::Archive => "/archive",
            Route::Intervals => "/intervals",
        }
    }

    /// Sections whose content appears on this page, navigation included.
    pub fn sections(self) -> Vec<SectionId> {
        let mut ids = match self {
            Route::Home => vec![
                SectionId::Hero,
                SectionId::Introduction,
                SectionId::CurrentWork,
                SectionId::ReadInvitation,
                SectionId::Newsletter,
            ],
            Route::Read => vec![SectionId::ReadPage],
            Route::Listen => vec![SectionId::ListenPage],
            Route::Books => vec![SectionId::BooksPage],
            Route::About => vec![SectionId::AboutPage],
            Route::Archive => vec![SectionId::ArchivePage],
            Route::Intervals => vec![SectionId::IntervalsPage],
        };
        ids.push(SectionId::NavItems);
        ids
    }

    /// Render cache tags: the section ids plus `site`.
    pub fn tags(self) -> Vec<String> {
        self.sections()
            .into_iter()
            .map(|id| id.as_str().to_string())
            .chain(std::iter::once(SITE_TAG.to_string()))
            .collect()
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for Route {
    type Err = String;

    /// Accepts `/read`, `read` and `/read/`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = crate::cache::normalize_route(s);
        Route::ALL
            .into_iter()
            .find(|r| r.path() == normalized)
            .ok_or_else(|| format!("no page at '{s}'"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HomePage {
    pub hero: HeroSection,
    pub introduction: IntroductionSection,
    pub current_work: CurrentWorkSection,
    pub read_invitation: ReadInvitationSection,
    pub newsletter: NewsletterSection,
}

/// The content of one page, with fallbacks applied and only public items.
#[derive(Debug, Clone, PartialEq)]
pub enum Page {
    Home(HomePage),
    Read(ReadPageSection),
    Listen(ListenPageSection),
    Books(BooksPageSection),
    About(AboutPageSection),
    Archive(ArchivePageSection),
    Intervals(IntervalsPageSection),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageData {
    pub route: Route,
    pub nav: Vec<NavItem>,
    pub page: Page,
}

/// Resolve everything `route` shows.
pub fn load(resolver: &Resolver, route: Route) -> PageData {
    let page = match route {
        Route::Home => Page::Home(load_home(resolver)),
        Route::Read => Page::Read(read_page(resolver)),
        Route::Listen => Page::Listen(listen_page(resolver)),
        Route::Books => Page::Books(books_page(resolver)),
        Route::About => Page::About(about_page(resolver)),
        Route::Archive => Page::Archive(archive_page(resolver)),
        Route::Intervals => Page::Intervals(intervals_page(resolver)),
    };
    PageData {
        route,
        nav: resolver.resolve_navigation(),
        page,
    }
}

fn load_home(resolver: &Resolver) -> HomePage {
    let all = resolver.resolve_all();
    HomePage {
        hero: from_map(&all, SectionId::Hero),
        introduction: from_map(&all, SectionId::Introduction),
        current_work: from_map(&all, SectionId::CurrentWork),
        read_invitation: from_map(&all, SectionId::ReadInvitation),
        newsletter: from_map(&all, SectionId::Newsletter),
    }
}

/// One section out of a `resolve_all` map, falling back to its default.
fn from_map<T: DeserializeOwned + Default>(all: &BTreeMap<String, crate::sections::Document>, id: SectionId) -> T {
    let parse = |doc: &crate::sections::Document| {
        serde_json::from_value::<T>(serde_json::Value::Object(doc.clone()))
    };
    if let Some(doc) = all.get(id.as_str()) {
        match parse(doc) {
            Ok(section) => return section,
            Err(e) => {
                tracing::warn!(section = %id, error = %e, "stored section has the wrong shape, using default");
            }
        }
    }
    defaults::default_document(id.as_str())
        .and_then(|doc| parse(&doc).ok())
        .unwrap_or_default()
}

fn read_page(resolver: &Resolver) -> ReadPageSection {
    let SectionContent::ReadPage(mut page) = resolver.resolve_section(SectionId::ReadPage) else {
        return ReadPageSection::default();
    };
    if page.poems.is_empty() {
        page.poems = defaults::fallbacks().poems.clone();
    }
    page.poems = collection::public_view(&page.poems);
    page
}

fn listen_page(resolver: &Resolver) -> ListenPageSection {
    let SectionContent::ListenPage(mut page) = resolver.resolve_section(SectionId::ListenPage) else {
        return ListenPageSection::default();
    };
    if page.recordings.is_empty() {
        page.recordings = defaults::fallbacks().recordings.clone();
    }
    page.recordings = collection::public_view(&page.recordings);
    page
}

fn books_page(resolver: &Resolver) -> BooksPageSection {
    let SectionContent::BooksPage(mut page) = resolver.resolve_section(SectionId::BooksPage) else {
        return BooksPageSection::default();
    };
    if page.books.is_empty() {
        page.books = defaults::fallbacks().books.clone();
    }
    page.books = collection::public_view(&page.books);
    page
}

/// Built-in copy overlaid field by field. Blank stored fields keep the
/// built-in text, since the section default itself is all blanks.
fn about_page(resolver: &Resolver) -> AboutPageSection {
    let SectionContent::AboutPage(stored) = resolver.resolve_section(SectionId::AboutPage) else {
        return defaults::fallbacks().about_page.clone();
    };
    let base = &defaults::fallbacks().about_page;
    AboutPageSection {
        title: or_text(stored.title, &base.title),
        opening: or_list(stored.opening, &base.opening),
        statement_of_practice: or_list(stored.statement_of_practice, &base.statement_of_practice),
        selected_publications: or_list(stored.selected_publications, &base.selected_publications),
        current_work: or_text(stored.current_work, &base.current_work),
        readings_collaborations: or_text(stored.readings_collaborations, &base.readings_collaborations),
        bio_50: or_text(stored.bio_50, &base.bio_50),
        bio_100: or_text(stored.bio_100, &base.bio_100),
    }
}

fn archive_page(resolver: &Resolver) -> ArchivePageSection {
    let SectionContent::ArchivePage(mut page) = resolver.resolve_section(SectionId::ArchivePage) else {
        return ArchivePageSection::default();
    };
    if page.categories.is_empty() {
        page.categories = defaults::fallbacks().archive_categories.clone();
    }
    page.categories = page
        .categories
        .into_iter()
        .filter_map(|mut category| {
            category.entries = collection::public_view(&category.entries);
            (!category.entries.is_empty()).then_some(category)
        })
        .collect();
    page
}

fn intervals_page(resolver: &Resolver) -> IntervalsPageSection {
    let SectionContent::IntervalsPage(stored) = resolver.resolve_section(SectionId::IntervalsPage) else {
        return defaults::fallbacks().intervals_page.clone();
    };
    let base = &defaults::fallbacks().intervals_page;
    IntervalsPageSection {
        title: or_text(stored.title, &base.title),
        paragraphs: or_list(stored.paragraphs, &base.paragraphs),
        cta_intro: or_text(stored.cta_intro, &base.cta_intro),
        cta_text: or_text(stored.cta_text, &base.cta_text),
        link_text: or_text(stored.link_text, &base.link_text),
        link_url: or_text(stored.link_url, &base.link_url),
    }
}

fn or_text(value: String, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value
    }
}

fn or_list<T: Clone>(value: Vec<T>, fallback: &[T]) -> Vec<T> {
    if value.is_empty() { fallback.to_vec() } else { value }
}
