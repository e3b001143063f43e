//! HTML rendering.
//!
//! Turns [`PageData`] into a complete HTML document. Every page shares the
//! same shell: header with the site title and navigation, the page body, and
//! a footer with the archive and contact links.
//!
//! ## CSS
//!
//! `static/style.css` is embedded at compile time. The color variables it
//! uses are generated from `[colors]` in `quire.toml` and inlined ahead of it
//! (see [`site_css`]).
//!
//! ## HTML Generation
//!
//! Uses [maud](https://maud.lambda.xyz/) for compile-time HTML templating.
//! All interpolated content is escaped.

use crate::config::{self, SiteConfig};
use crate::pages::{HomePage, Page, PageData, Route};
use crate::sections::{
    AboutPageSection, ArchivePageSection, BooksPageSection, IntervalsPageSection,
    ListenPageSection, ReadPageSection,
};
use crate::types::NavItem;
use maud::{DOCTYPE, Markup, html};

const CSS_STATIC: &str = include_str!("../static/style.css");

/// Generated color variables followed by the base stylesheet.
pub fn site_css(config: &SiteConfig) -> String {
    format!("{}\n\n{}", config::generate_color_css(&config.colors), CSS_STATIC)
}

/// Render a full page.
pub fn render_page(data: &PageData, config: &SiteConfig, css: &str) -> Markup {
    let site_title = &config.site.title;
    let (heading, body) = match &data.page {
        Page::Home(home) => (None, render_home(home)),
        Page::Read(page) => (Some(page.title.as_str()), render_read(page)),
        Page::Listen(page) => (Some(page.title.as_str()), render_listen(page)),
        Page::Books(page) => (Some(page.title.as_str()), render_books(page)),
        Page::About(page) => (Some(page.title.as_str()), render_about(page)),
        Page::Archive(page) => (Some(page.title.as_str()), render_archive(page)),
        Page::Intervals(page) => (Some(page.title.as_str()), render_intervals(page)),
    };
    let title = match heading {
        Some(h) if !h.is_empty() => format!("{h} | {site_title}"),
        _ => site_title.clone(),
    };

    let content = html! {
        (site_header(site_title, &data.nav, data.route.path()))
        main { (body) }
        (site_footer())
    };
    base_document(&title, css, data.route, content)
}

// ============================================================================
// HTML Components
// ============================================================================

fn base_document(title: &str, css: &str, route: Route, content: Markup) -> Markup {
    let body_class = match route {
        Route::Home => "home",
        Route::Read => "read",
        Route::Listen => "listen",
        Route::Books => "books",
        Route::About => "about",
        Route::Archive => "archive",
        Route::Intervals => "intervals",
    };
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                style { (css) }
            }
            body class=(body_class) {
                (content)
            }
        }
    }
}

fn site_header(site_title: &str, nav: &[NavItem], current_path: &str) -> Markup {
    html! {
        header.site-header {
            a.site-title href="/" { (site_title) }
            nav.site-nav {
                (render_nav(nav, current_path))
            }
        }
    }
}

/// Navigation links in the order given. The current page is marked.
pub fn render_nav(items: &[NavItem], current_path: &str) -> Markup {
    html! {
        ul {
            @for item in items {
                @let is_current = item.href == current_path;
                li class=[is_current.then_some("current")] {
                    a href=(item.href) { (item.label) }
                }
            }
        }
    }
}

fn site_footer() -> Markup {
    html! {
        footer.site-footer {
            a href="/archive" { "Archive" }
            a href="/contact" { "Contact" }
        }
    }
}

// ============================================================================
// Page Renderers
// ============================================================================

fn render_home(home: &HomePage) -> Markup {
    html! {
        section.hero {
            p.tagline { (home.hero.tagline) }
        }
        section.home-block.introduction {
            p { (home.introduction.text) }
        }
        section.home-block.current-work {
            h2 { (home.current_work.title) }
            p { (home.current_work.description) }
            @if !home.current_work.link_url.is_empty() {
                a href=(home.current_work.link_url) { (home.current_work.link_text) }
            }
        }
        section.home-block.read-invitation {
            p { (home.read_invitation.text) }
            @if !home.read_invitation.link_url.is_empty() {
                a href=(home.read_invitation.link_url) { (home.read_invitation.link_text) }
            }
        }
        section.home-block.newsletter {
            h2 { (home.newsletter.heading) }
            p.muted { (home.newsletter.text) }
            form {
                input type="email" name="email" placeholder=(home.newsletter.placeholder);
                button type="submit" { (home.newsletter.button_text) }
            }
        }
    }
}

fn render_read(page: &ReadPageSection) -> Markup {
    html! {
        h1 { (page.title) }
        @if !page.intro.is_empty() {
            p.muted { (page.intro) }
        }
        @for poem in &page.poems {
            article.poem id=(poem.id) {
                h2 { (poem.title) }
                @for stanza in &poem.stanzas {
                    p.stanza { (stanza) }
                }
            }
        }
        @if !page.footer_text.is_empty() {
            p.muted { (page.footer_text) " " a href="/books" { "Books" } }
        }
    }
}

fn render_listen(page: &ListenPageSection) -> Markup {
    html! {
        h1 { (page.title) }
        @if !page.intro.is_empty() {
            p { (page.intro) }
        }
        @if !page.description.is_empty() {
            p.muted { (page.description) }
        }
        @for recording in &page.recordings {
            div.recording id=(recording.id) {
                p { (recording.label) }
                audio controls preload="none" src=(recording.source_url()) {}
            }
        }
    }
}

fn render_books(page: &BooksPageSection) -> Markup {
    html! {
        h1 { (page.title) }
        @for book in &page.books {
            article.book id=(book.id) {
                h2 { (book.title) }
                p.meta { (book.kind) " · " (book.publisher) }
                @if !book.description.is_empty() {
                    p { (book.description) }
                }
                @if !book.description2.is_empty() {
                    p { (book.description2) }
                }
                @if !book.link_url.is_empty() {
                    a href=(book.link_url) { (book.link_text) }
                }
            }
        }
    }
}

fn render_about(page: &AboutPageSection) -> Markup {
    html! {
        h1 { (page.title) }
        @for paragraph in &page.opening {
            p { (paragraph) }
        }
        @if !page.statement_of_practice.is_empty() {
            h2 { "Statement of practice" }
            @for paragraph in &page.statement_of_practice {
                p { (paragraph) }
            }
        }
        @if !page.selected_publications.is_empty() {
            h2 { "Selected publications" }
            ul {
                @for publication in &page.selected_publications {
                    li {
                        @if let Some(link) = publication.link.as_deref().filter(|l| !l.is_empty()) {
                            a href=(link) { (publication.text) }
                        } @else {
                            (publication.text)
                        }
                    }
                }
            }
        }
        @if !page.current_work.is_empty() {
            h2 { "Current work" }
            p { (page.current_work) }
        }
        @if !page.readings_collaborations.is_empty() {
            h2 { "Readings & collaborations" }
            p { (page.readings_collaborations) }
        }
        @if !page.bio_100.is_empty() {
            h2 { "Biography" }
            p { (page.bio_100) }
        }
        @if !page.bio_50.is_empty() {
            h2 { "Short biography" }
            p { (page.bio_50) }
        }
    }
}

fn render_archive(page: &ArchivePageSection) -> Markup {
    html! {
        h1 { (page.title) }
        @if !page.intro.is_empty() {
            p.muted { (page.intro) }
        }
        @for category in &page.categories {
            section.archive-category id=(category.id) {
                h2 {
                    (category.label)
                    @if !category.sublabel.is_empty() {
                        " " span.sublabel { "/ " (category.sublabel) }
                    }
                }
                ul {
                    @for entry in &category.entries {
                        li {
                            @if let Some(url) = entry.url.as_deref().filter(|u| !u.is_empty()) {
                                a href=(url) { (entry.title) }
                            } @else {
                                (entry.title)
                            }
                            @if !entry.publication.is_empty() {
                                ", " em { (entry.publication) }
                            }
                            @if !entry.date.is_empty() {
                                " " span.meta { "(" (entry.date) ")" }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn render_intervals(page: &IntervalsPageSection) -> Markup {
    html! {
        h1 { (page.title) }
        @for paragraph in &page.paragraphs {
            p { (paragraph) }
        }
        @if !page.cta_intro.is_empty() {
            h2 { (page.cta_intro) }
        }
        @if !page.cta_text.is_empty() {
            p { (page.cta_text) }
        }
        @if !page.link_url.is_empty() {
            a href=(page.link_url) rel="noopener" { (page.link_text) }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
