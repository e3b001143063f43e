//! CLI output formatting.
//!
//! Every command's output is built by a pure `format_*` function returning
//! lines, with a thin `print_*` wrapper that writes them to stdout. Tests
//! assert on the lines directly.
//!
//! # Entity Display Contract
//!
//! Ordered items follow one pattern across commands:
//!
//! 1. **Header line**: 1-based display position + label.
//! 2. **Context lines**: indented `id:`, `order:`, target or status.
//!
//! # Output Format
//!
//! ## Sections
//!
//! ```text
//! Sections (store: sqlite:content/site.db)
//! hero              stored   2026-03-01 10:22 UTC   1 field
//! introduction      default                         1 field
//! ```
//!
//! ## Collections
//!
//! ```text
//! 001 Read
//!     id: read   order: 1   → /read
//! 002 Listen (hidden)
//!     id: listen   order: 2   → /listen
//! ```
//!
//! ## Build
//!
//! ```text
//! /            index.html              4.1 KB
//! /read        read/index.html        12.8 KB  unchanged
//! Rendered 7 pages (1 unchanged) → dist
//! ```

use crate::collection::{self, Orderable};
use crate::sections::Document;
use crate::site::BuildResult;
use crate::store::SectionRecord;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

// ============================================================================
// Helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Truncate to `max` characters, appending `...` if truncated.
fn truncate_desc(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max).collect();
        format!("{cut}...")
    }
}

fn format_size(bytes: usize) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    }
}

fn format_time(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M UTC").to_string()
}

// ============================================================================
// Sections
// ============================================================================

/// One row of the `sections` listing.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionSummary {
    pub id: String,
    pub stored: bool,
    pub updated_at: Option<DateTime<Utc>>,
    pub fields: usize,
}

/// Every section that has a default or a stored row, ordered by id.
pub fn section_summaries(defaults: &BTreeMap<String, Document>, records: &[SectionRecord]) -> Vec<SectionSummary> {
    let mut rows: BTreeMap<String, SectionSummary> = defaults
        .iter()
        .map(|(id, doc)| {
            let summary = SectionSummary {
                id: id.clone(),
                stored: false,
                updated_at: None,
                fields: doc.len(),
            };
            (id.clone(), summary)
        })
        .collect();
    for record in records {
        rows.insert(
            record.id.clone(),
            SectionSummary {
                id: record.id.clone(),
                stored: true,
                updated_at: Some(record.updated_at),
                fields: record.content.len(),
            },
        );
    }
    rows.into_values().collect()
}

pub fn format_sections(store: &str, rows: &[SectionSummary]) -> Vec<String> {
    let mut lines = vec![format!("Sections (store: {store})")];
    for row in rows {
        let source = if row.stored { "stored" } else { "default" };
        let when = row.updated_at.as_ref().map(format_time).unwrap_or_default();
        let plural = if row.fields == 1 { "" } else { "s" };
        lines.push(format!(
            "{:<17} {:<8} {:<22} {} field{}",
            row.id, source, when, row.fields, plural
        ));
    }
    lines
}

pub fn print_sections(store: &str, rows: &[SectionSummary]) {
    for line in format_sections(store, rows) {
        println!("{}", line);
    }
}

/// A section document as indented JSON under an id header.
pub fn format_document(id: &str, doc: &Document) -> Vec<String> {
    let mut lines = vec![id.to_string()];
    let json = serde_json::to_string_pretty(doc).unwrap_or_else(|_| "{}".to_string());
    lines.extend(json.lines().map(|l| format!("    {l}")));
    lines
}

pub fn print_document(id: &str, doc: &Document) {
    for line in format_document(id, doc) {
        println!("{}", line);
    }
}

// ============================================================================
// Collections
// ============================================================================

/// Items in display order. Disabled items are marked `(hidden)`.
///
/// `describe` supplies the label and an optional target shown after `→`.
pub fn format_collection<T, F>(items: &[T], describe: F) -> Vec<String>
where
    T: Orderable,
    F: Fn(&T) -> (String, Option<String>),
{
    if items.is_empty() {
        return vec!["(no items)".to_string()];
    }
    let mut lines = Vec::new();
    for (pos, item) in collection::sorted(items).iter().enumerate() {
        let (label, target) = describe(item);
        let hidden = if item.enabled() { "" } else { " (hidden)" };
        lines.push(format!(
            "{} {}{}",
            format_index(pos + 1),
            truncate_desc(&label, 60),
            hidden
        ));
        let mut context = format!("    id: {}   order: {}", item.id(), item.order());
        if let Some(target) = target.filter(|t| !t.is_empty()) {
            context.push_str(&format!("   → {target}"));
        }
        lines.push(context);
    }
    lines
}

pub fn print_collection<T, F>(items: &[T], describe: F)
where
    T: Orderable,
    F: Fn(&T) -> (String, Option<String>),
{
    for line in format_collection(items, describe) {
        println!("{}", line);
    }
}

// ============================================================================
// Build
// ============================================================================

pub fn format_build_output(results: &[BuildResult], output_dir: &str) -> Vec<String> {
    let mut sorted: Vec<&BuildResult> = results.iter().collect();
    sorted.sort_by_key(|r| r.route.path());

    let mut lines = Vec::new();
    for result in &sorted {
        let status = if result.changed { "" } else { "  unchanged" };
        lines.push(format!(
            "{:<12} {:<22} {:>9}{}",
            result.route.path(),
            result.file,
            format_size(result.bytes),
            status
        ));
    }
    let unchanged = results.iter().filter(|r| !r.changed).count();
    let summary = if unchanged > 0 {
        format!("Rendered {} pages ({} unchanged) → {}", results.len(), unchanged, output_dir)
    } else {
        format!("Rendered {} pages → {}", results.len(), output_dir)
    };
    lines.push(summary);
    lines
}

pub fn print_build_output(results: &[BuildResult], output_dir: &str) {
    for line in format_build_output(results, output_dir) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::Route;
    use crate::test_helpers::{doc, poem};
    use crate::types::NavItem;
    use chrono::TimeZone;
    use serde_json::json;

    // =========================================================================
    // Helper tests
    // =========================================================================

    #[test]
    fn truncate_desc_short() {
        assert_eq!(truncate_desc("Short text", 40), "Short text");
    }

    #[test]
    fn truncate_desc_long() {
        let text = "a".repeat(50);
        assert_eq!(truncate_desc(&text, 40), format!("{}...", "a".repeat(40)));
    }

    #[test]
    fn truncate_desc_multibyte() {
        assert_eq!(truncate_desc("café crème", 4), "café...");
    }

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(123), "123");
    }

    #[test]
    fn format_size_units() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
    }

    // =========================================================================
    // Sections
    // =========================================================================

    #[test]
    fn summaries_merge_defaults_and_records() {
        let mut defaults = BTreeMap::new();
        defaults.insert("hero".to_string(), doc(json!({"tagline": "x"})));
        defaults.insert("newsletter".to_string(), doc(json!({"heading": "x", "text": "y"})));
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 10, 22, 0).unwrap();
        let records = vec![SectionRecord {
            id: "hero".into(),
            content: doc(json!({"tagline": "Poet", "extra": 1})),
            updated_at: at,
        }];

        let rows = section_summaries(&defaults, &records);
        assert_eq!(rows.len(), 2);
        assert!(rows[0].stored);
        assert_eq!(rows[0].fields, 2);
        assert!(!rows[1].stored);

        let lines = format_sections("memory:", &rows);
        assert_eq!(lines[0], "Sections (store: memory:)");
        assert!(lines[1].starts_with("hero"));
        assert!(lines[1].contains("stored"));
        assert!(lines[1].contains("2026-03-01 10:22 UTC"));
        assert!(lines[2].contains("default"));
        assert!(lines[2].ends_with("2 fields"));
    }

    #[test]
    fn document_is_indented_json() {
        let lines = format_document("hero", &doc(json!({"tagline": "Poet"})));
        assert_eq!(lines[0], "hero");
        assert!(lines.iter().any(|l| l.contains("\"tagline\": \"Poet\"")));
        assert!(lines[1..].iter().all(|l| l.starts_with("    ")));
    }

    // =========================================================================
    // Collections
    // =========================================================================

    #[test]
    fn collection_lists_in_display_order_and_marks_hidden() {
        let poems = vec![poem("b", "Second", 2, false), poem("a", "First", 1, true)];
        let lines = format_collection(&poems, |p| (p.title.clone(), None));
        assert_eq!(lines[0], "001 First");
        assert_eq!(lines[1], "    id: a   order: 1");
        assert_eq!(lines[2], "002 Second (hidden)");
    }

    #[test]
    fn collection_shows_target() {
        let nav = crate::defaults::builtin_navigation();
        let lines = format_collection(&nav, |n: &NavItem| (n.label.clone(), Some(n.href.clone())));
        assert_eq!(lines[1], "    id: read   order: 1   → /read");
    }

    #[test]
    fn empty_collection() {
        let lines = format_collection::<NavItem, _>(&[], |n| (n.label.clone(), None));
        assert_eq!(lines, vec!["(no items)"]);
    }

    // =========================================================================
    // Build
    // =========================================================================

    #[test]
    fn build_output_summarizes_unchanged() {
        let results = vec![
            BuildResult {
                route: Route::Read,
                file: "read/index.html".into(),
                bytes: 2048,
                changed: false,
            },
            BuildResult {
                route: Route::Home,
                file: "index.html".into(),
                bytes: 100,
                changed: true,
            },
        ];
        let lines = format_build_output(&results, "dist");
        assert!(lines[0].starts_with("/ "));
        assert!(lines[1].ends_with("unchanged"));
        assert_eq!(lines[2], "Rendered 2 pages (1 unchanged) → dist");
    }
}
