//! Edit buffer and publish workflow.
//!
//! An [`EditSession`] is one operator's editing session. It reads every
//! stored section once when it opens, keeps a local draft of each section in
//! an [`EditBuffer`], and writes sections back one at a time on request.
//! Nothing an editor does is visible to visitors until [`EditSession::publish`]
//! asks the [`Invalidator`] to drop the cached public pages.
//!
//! ```text
//!             update_content / edit_collection
//!   Clean ─────────────────────────────────────▶ Dirty
//!     ▲                                           │  save_section
//!     │ resync_section                            ▼
//!     └──────────────────────────────────────── Saved
//! ```
//!
//! Two flags are tracked separately:
//!
//! - **Per section**: [`SectionState`]. A failed save leaves the section
//!   `Dirty` with the draft intact.
//! - **Per session**: `has_unpublished_changes`, set by any edit and cleared
//!   only by a successful publish. Saving does not clear it.
//!
//! Sections the store has never seen are seeded from their defaults the first
//! time they are read or edited.

use crate::collection::{self, CollectionOp, Orderable};
use crate::defaults;
use crate::invalidation::{self, InvalidationError, Invalidator};
use crate::sections::{Document, SectionId};
use crate::store::{SectionRecord, StoreAdapter, StoreError};
use crate::types::{Category, Recording};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("content store is not configured; edits cannot be saved")]
    ReadOnly,
    #[error("unknown archive category: {0}")]
    UnknownCategory(String),
    #[error("no item '{id}' in {section}")]
    UnknownItem { section: String, id: String },
    #[error("failed to save section {section}: {source}")]
    Save { section: String, source: StoreError },
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("publish failed: {0}")]
    Publish(#[from] InvalidationError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Where a section's draft stands relative to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionState {
    /// Matches what was read from the store (or the default).
    Clean,
    /// Edited locally, not yet written.
    Dirty,
    /// Written by this session.
    Saved,
}

impl fmt::Display for SectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionState::Clean => write!(f, "clean"),
            SectionState::Dirty => write!(f, "dirty"),
            SectionState::Saved => write!(f, "saved"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BufferedSection {
    pub content: Document,
    /// Last store write, `None` for sections seeded from defaults.
    pub updated_at: Option<DateTime<Utc>>,
    pub state: SectionState,
}

impl BufferedSection {
    fn from_record(record: SectionRecord) -> Self {
        Self {
            content: record.content,
            updated_at: Some(record.updated_at),
            state: SectionState::Clean,
        }
    }

    fn from_default(id: &str) -> Self {
        Self {
            content: defaults::default_document(id).unwrap_or_default(),
            updated_at: None,
            state: SectionState::Clean,
        }
    }
}

/// Draft of every section touched in a session.
#[derive(Debug, Clone, Default)]
pub struct EditBuffer {
    sections: BTreeMap<String, BufferedSection>,
    has_unpublished_changes: bool,
}

impl EditBuffer {
    fn entry(&mut self, id: &str) -> &mut BufferedSection {
        self.sections
            .entry(id.to_string())
            .or_insert_with(|| BufferedSection::from_default(id))
    }

    pub fn get(&self, id: &str) -> Option<&BufferedSection> {
        self.sections.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BufferedSection)> {
        self.sections.iter()
    }
}

/// Which list an [`edit_collection`](EditSession::edit_collection) call targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionTarget {
    NavItems,
    Poems,
    Recordings,
    Books,
    /// Entries of one archive category, by category id.
    ArchiveEntries { category: String },
}

impl CollectionTarget {
    pub fn section(&self) -> SectionId {
        match self {
            CollectionTarget::NavItems => SectionId::NavItems,
            CollectionTarget::Poems => SectionId::ReadPage,
            CollectionTarget::Recordings => SectionId::ListenPage,
            CollectionTarget::Books => SectionId::BooksPage,
            CollectionTarget::ArchiveEntries { .. } => SectionId::ArchivePage,
        }
    }

    /// Document field holding the list. Archive entries sit one level down,
    /// inside `categories[].entries`.
    pub fn field(&self) -> &'static str {
        match self {
            CollectionTarget::NavItems => "items",
            CollectionTarget::Poems => "poems",
            CollectionTarget::Recordings => "recordings",
            CollectionTarget::Books => "books",
            CollectionTarget::ArchiveEntries { .. } => "categories",
        }
    }
}

pub struct EditSession {
    buffer: EditBuffer,
    store: StoreAdapter,
    invalidator: Arc<dyn Invalidator>,
}

impl fmt::Debug for EditSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditSession")
            .field("buffer", &self.buffer)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl EditSession {
    /// Start a session, reading every stored section into the buffer.
    ///
    /// A configured store that cannot be read is an error: opening on top of
    /// defaults and saving would overwrite content the operator never saw.
    /// An unconfigured store opens a read-only session over the defaults.
    pub fn open(store: StoreAdapter, invalidator: Arc<dyn Invalidator>) -> Result<Self, EditorError> {
        let mut buffer = EditBuffer::default();
        if store.is_configured() {
            let records = store.read_all()?;
            tracing::debug!(sections = records.len(), store = %store.describe(), "edit session opened");
            for record in records {
                buffer
                    .sections
                    .insert(record.id.clone(), BufferedSection::from_record(record));
            }
        } else {
            tracing::info!("content store not configured, edit session is read-only");
        }
        Ok(Self {
            buffer,
            store,
            invalidator,
        })
    }

    pub fn is_read_only(&self) -> bool {
        !self.store.is_configured()
    }

    pub fn buffer(&self) -> &EditBuffer {
        &self.buffer
    }

    /// The current draft of a section.
    pub fn content(&mut self, id: &str) -> &Document {
        &self.buffer.entry(id).content
    }

    pub fn state(&self, id: &str) -> SectionState {
        self.buffer
            .get(id)
            .map_or(SectionState::Clean, |s| s.state)
    }

    pub fn has_unpublished_changes(&self) -> bool {
        self.buffer.has_unpublished_changes
    }

    /// Ids of sections edited but not saved.
    pub fn dirty_sections(&self) -> Vec<String> {
        self.buffer
            .iter()
            .filter(|(_, s)| s.state == SectionState::Dirty)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Replace a section's draft wholesale.
    pub fn update_content(&mut self, id: &str, content: Document) {
        let section = self.buffer.entry(id);
        section.content = content;
        section.state = SectionState::Dirty;
        self.buffer.has_unpublished_changes = true;
        tracing::debug!(section = id, "section edited");
    }

    /// Set one top-level field of a section's draft.
    pub fn update_field(&mut self, id: &str, field: &str, value: Value) {
        let mut content = self.content(id).clone();
        content.insert(field.to_string(), value);
        self.update_content(id, content);
    }

    /// Apply one collection operation to a list inside its section draft.
    ///
    /// Items stored without ids get one first, so every operation can address
    /// them. The archive's category list is seeded from the built-in
    /// categories when the draft has none.
    pub fn edit_collection(&mut self, target: &CollectionTarget, op: &CollectionOp) -> Result<(), EditorError> {
        let section = target.section();
        let field = target.field();
        let mut content = self.content(section.as_str()).clone();

        let updated = match target {
            CollectionTarget::NavItems => edit_list::<crate::types::NavItem>(content.get(field), op)?,
            CollectionTarget::Poems => edit_list::<crate::types::Poem>(content.get(field), op)?,
            CollectionTarget::Recordings => edit_list::<Recording>(content.get(field), op)?,
            CollectionTarget::Books => edit_list::<crate::types::Book>(content.get(field), op)?,
            CollectionTarget::ArchiveEntries { category } => {
                let mut categories = archive_categories(content.get(field))?;
                let cat = categories
                    .iter_mut()
                    .find(|c| &c.id == category)
                    .ok_or_else(|| EditorError::UnknownCategory(category.clone()))?;
                let entries = collection::assign_missing_ids(&cat.entries);
                cat.entries = collection::apply(&entries, op);
                serde_json::to_value(categories)?
            }
        };

        content.insert(field.to_string(), updated);
        self.update_content(section.as_str(), content);
        Ok(())
    }

    /// Point a recording at an uploaded file.
    pub fn attach_recording_file(&mut self, recording_id: &str, file_url: &str, filename: &str) -> Result<(), EditorError> {
        let section = SectionId::ListenPage.as_str();
        let mut content = self.content(section).clone();
        let mut recordings: Vec<Recording> = parse_list(content.get("recordings"))?;
        let recording = recordings
            .iter_mut()
            .find(|r| r.id == recording_id)
            .ok_or_else(|| EditorError::UnknownItem {
                section: section.to_string(),
                id: recording_id.to_string(),
            })?;
        recording.file_url = Some(file_url.to_string());
        recording.filename = filename.to_string();
        content.insert("recordings".to_string(), serde_json::to_value(recordings)?);
        self.update_content(section, content);
        Ok(())
    }

    /// Write one section's draft to the store.
    ///
    /// On failure the draft and its `Dirty` state are kept so the operator
    /// can retry.
    pub fn save_section(&mut self, id: &str) -> Result<SectionRecord, EditorError> {
        if self.is_read_only() {
            return Err(EditorError::ReadOnly);
        }
        let content = self.content(id).clone();
        match self.store.write(id, &content) {
            Ok(record) => {
                let section = self.buffer.entry(id);
                section.updated_at = Some(record.updated_at);
                section.state = SectionState::Saved;
                Ok(record)
            }
            Err(source) => {
                tracing::error!(section = id, error = %source, "failed to save section");
                Err(EditorError::Save {
                    section: id.to_string(),
                    source,
                })
            }
        }
    }

    /// Invalidate every public page.
    ///
    /// Publishing does not save. Unsaved drafts are logged and left as they
    /// are; visitors keep seeing the stored content for those sections.
    pub fn publish(&mut self) -> Result<Vec<String>, EditorError> {
        let dirty = self.dirty_sections();
        if !dirty.is_empty() {
            tracing::warn!(sections = ?dirty, "publishing with unsaved sections");
        }
        let paths = invalidation::public_paths();
        if let Err(e) = self.invalidator.invalidate_paths(&paths) {
            tracing::error!(op = "publish", error = %e, "failed to invalidate public pages");
            return Err(e.into());
        }
        self.buffer.has_unpublished_changes = false;
        tracing::info!(paths = paths.len(), "site published");
        Ok(paths)
    }

    /// Discard the local draft of a section and reload it from the store.
    pub fn resync_section(&mut self, id: &str) -> Result<(), EditorError> {
        if self.is_read_only() {
            return Err(EditorError::ReadOnly);
        }
        let section = match self.store.read(id)? {
            Some(record) => BufferedSection::from_record(record),
            None => BufferedSection::from_default(id),
        };
        self.buffer.sections.insert(id.to_string(), section);
        tracing::info!(section = id, "section reloaded from store");
        Ok(())
    }
}

fn parse_list<T: DeserializeOwned>(value: Option<&Value>) -> Result<Vec<T>, serde_json::Error> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(v) => serde_json::from_value(v.clone()),
    }
}

fn edit_list<T>(value: Option<&Value>, op: &CollectionOp) -> Result<Value, serde_json::Error>
where
    T: Orderable + Serialize + DeserializeOwned,
{
    let items: Vec<T> = parse_list(value)?;
    let items = collection::assign_missing_ids(&items);
    serde_json::to_value(collection::apply(&items, op))
}

fn archive_categories(value: Option<&Value>) -> Result<Vec<Category>, serde_json::Error> {
    let categories: Vec<Category> = parse_list(value)?;
    if categories.is_empty() {
        return Ok(defaults::fallbacks().archive_categories.clone());
    }
    Ok(categories)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::Direction;
    use crate::store::MemoryBackend;
    use crate::test_helpers::{FailingBackend, RecordingInvalidator, doc, poem};
    use crate::types::{ArchiveEntry, Poem};
    use serde_json::json;
    use std::sync::atomic::Ordering;

    fn session_over(backend: MemoryBackend) -> (EditSession, Arc<RecordingInvalidator>) {
        let invalidator = Arc::new(RecordingInvalidator::default());
        let session = EditSession::open(StoreAdapter::with_backend(backend), invalidator.clone()).unwrap();
        (session, invalidator)
    }

    fn poems_doc(poems: &[Poem]) -> Document {
        doc(json!({"title": "Read", "poems": poems}))
    }

    fn stored_poems(session: &mut EditSession) -> Vec<Poem> {
        parse_list(session.content("read_page").get("poems")).unwrap()
    }

    // =========================================================================
    // Opening
    // =========================================================================

    #[test]
    fn open_seeds_buffer_from_store() {
        let backend = MemoryBackend::seeded([("hero".to_string(), doc(json!({"tagline": "Poet"})))]);
        let (mut session, _) = session_over(backend);

        assert_eq!(session.content("hero")["tagline"], "Poet");
        assert_eq!(session.state("hero"), SectionState::Clean);
        assert!(session.buffer().get("hero").unwrap().updated_at.is_some());
        assert!(!session.has_unpublished_changes());
    }

    #[test]
    fn unseen_sections_start_from_defaults() {
        let (mut session, _) = session_over(MemoryBackend::new());
        assert_eq!(
            session.content("newsletter"),
            &defaults::default_document("newsletter").unwrap()
        );
        assert!(session.content("sidebar").is_empty());
    }

    #[test]
    fn open_fails_when_configured_store_is_down() {
        let result = EditSession::open(
            StoreAdapter::with_backend(FailingBackend::default()),
            Arc::new(RecordingInvalidator::default()),
        );
        assert!(matches!(result, Err(EditorError::Store(_))));
    }

    #[test]
    fn unconfigured_session_is_read_only() {
        let mut session = EditSession::open(
            StoreAdapter::Unconfigured,
            Arc::new(RecordingInvalidator::default()),
        )
        .unwrap();
        assert!(session.is_read_only());
        session.update_field("hero", "tagline", json!("Poet"));
        assert!(matches!(session.save_section("hero"), Err(EditorError::ReadOnly)));
        assert!(matches!(session.resync_section("hero"), Err(EditorError::ReadOnly)));
    }

    // =========================================================================
    // Editing
    // =========================================================================

    #[test]
    fn update_content_marks_dirty_and_unpublished() {
        let (mut session, _) = session_over(MemoryBackend::new());
        session.update_content("hero", doc(json!({"tagline": "Writer"})));

        assert_eq!(session.state("hero"), SectionState::Dirty);
        assert!(session.has_unpublished_changes());
        assert_eq!(session.dirty_sections(), vec!["hero".to_string()]);
    }

    #[test]
    fn update_field_keeps_other_fields() {
        let (mut session, _) = session_over(MemoryBackend::new());
        session.update_field("newsletter", "heading", json!("Notes"));

        let content = session.content("newsletter");
        assert_eq!(content["heading"], "Notes");
        assert_eq!(content["button_text"], "Subscribe");
    }

    #[test]
    fn collection_toggle_on_poems() {
        let backend = MemoryBackend::seeded([(
            "read_page".to_string(),
            poems_doc(&[poem("p1", "A", 1, true), poem("p2", "B", 2, true)]),
        )]);
        let (mut session, _) = session_over(backend);

        session
            .edit_collection(&CollectionTarget::Poems, &CollectionOp::Toggle { id: "p2".into() })
            .unwrap();

        let poems = stored_poems(&mut session);
        assert!(poems[0].enabled);
        assert!(!poems[1].enabled);
        assert_eq!(session.content("read_page")["title"], "Read");
        assert_eq!(session.state("read_page"), SectionState::Dirty);
    }

    #[test]
    fn collection_move_swaps_orders() {
        let backend = MemoryBackend::seeded([(
            "read_page".to_string(),
            poems_doc(&[poem("p1", "A", 1, true), poem("p2", "B", 2, true)]),
        )]);
        let (mut session, _) = session_over(backend);

        session
            .edit_collection(
                &CollectionTarget::Poems,
                &CollectionOp::Move {
                    id: "p2".into(),
                    direction: Direction::Up,
                },
            )
            .unwrap();

        let titles: Vec<_> = collection::sorted(&stored_poems(&mut session))
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(titles, vec!["B", "A"]);
    }

    #[test]
    fn collection_insert_into_empty_default_list() {
        let (mut session, _) = session_over(MemoryBackend::new());
        session
            .edit_collection(&CollectionTarget::Books, &CollectionOp::Insert)
            .unwrap();

        let books: Vec<crate::types::Book> =
            parse_list(session.content("books_page").get("books")).unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].title, "New Book");
        assert_eq!(books[0].order, 1);
        assert!(books[0].id.starts_with("book_"));
    }

    #[test]
    fn collection_remove_on_nav() {
        let (mut session, _) = session_over(MemoryBackend::new());
        session
            .edit_collection(&CollectionTarget::NavItems, &CollectionOp::Remove { id: "listen".into() })
            .unwrap();

        let items: Vec<crate::types::NavItem> =
            parse_list(session.content("nav_items").get("items")).unwrap();
        assert_eq!(items.len(), 4);
        assert!(items.iter().all(|i| i.id != "listen"));
    }

    #[test]
    fn archive_edit_seeds_builtin_categories() {
        let (mut session, _) = session_over(MemoryBackend::new());
        session
            .edit_collection(
                &CollectionTarget::ArchiveEntries {
                    category: "poetry_journals".into(),
                },
                &CollectionOp::Insert,
            )
            .unwrap();

        let categories: Vec<Category> =
            parse_list(session.content("archive_page").get("categories")).unwrap();
        assert_eq!(categories.len(), defaults::fallbacks().archive_categories.len());
        let journals = &categories[0];
        let builtin = defaults::fallbacks().archive_categories[0].entries.len();
        assert_eq!(journals.entries.len(), builtin + 1);
        // Legacy entries got ids on the way through.
        assert!(journals.entries.iter().all(|e| !e.id.is_empty()));
    }

    #[test]
    fn archive_edit_on_unknown_category_fails() {
        let (mut session, _) = session_over(MemoryBackend::new());
        let err = session
            .edit_collection(
                &CollectionTarget::ArchiveEntries {
                    category: "screenplays".into(),
                },
                &CollectionOp::Insert,
            )
            .unwrap_err();
        assert!(matches!(err, EditorError::UnknownCategory(c) if c == "screenplays"));
        assert!(!session.has_unpublished_changes());
    }

    #[test]
    fn archive_toggle_touches_one_category() {
        let entry = ArchiveEntry {
            id: "entry_1".into(),
            title: "Poem".into(),
            enabled: true,
            order: 1,
            ..ArchiveEntry::default()
        };
        let categories = vec![
            Category {
                id: "a".into(),
                entries: vec![entry.clone()],
                ..Category::default()
            },
            Category {
                id: "b".into(),
                entries: vec![entry],
                ..Category::default()
            },
        ];
        let backend = MemoryBackend::seeded([(
            "archive_page".to_string(),
            doc(json!({"title": "Archive", "categories": categories})),
        )]);
        let (mut session, _) = session_over(backend);

        session
            .edit_collection(
                &CollectionTarget::ArchiveEntries { category: "b".into() },
                &CollectionOp::Toggle { id: "entry_1".into() },
            )
            .unwrap();

        let categories: Vec<Category> =
            parse_list(session.content("archive_page").get("categories")).unwrap();
        assert!(categories[0].entries[0].enabled);
        assert!(!categories[1].entries[0].enabled);
    }

    #[test]
    fn attach_recording_file_sets_url_and_name() {
        let (mut session, _) = session_over(MemoryBackend::new());
        session
            .edit_collection(&CollectionTarget::Recordings, &CollectionOp::Insert)
            .unwrap();
        let id: Vec<Recording> = parse_list(session.content("listen_page").get("recordings")).unwrap();
        let id = id[0].id.clone();

        session
            .attach_recording_file(&id, "/media/audio/x/1.m4a", "reading.m4a")
            .unwrap();

        let recordings: Vec<Recording> =
            parse_list(session.content("listen_page").get("recordings")).unwrap();
        assert_eq!(recordings[0].source_url(), "/media/audio/x/1.m4a");
        assert_eq!(recordings[0].filename, "reading.m4a");
    }

    #[test]
    fn attach_to_unknown_recording_fails() {
        let (mut session, _) = session_over(MemoryBackend::new());
        assert!(matches!(
            session.attach_recording_file("rec_missing", "/x", "x.m4a"),
            Err(EditorError::UnknownItem { .. })
        ));
    }

    // =========================================================================
    // Saving
    // =========================================================================

    #[test]
    fn save_writes_to_store_and_marks_saved() {
        let (mut session, _) = session_over(MemoryBackend::new());
        session.update_field("hero", "tagline", json!("Writer"));
        let record = session.save_section("hero").unwrap();

        assert_eq!(record.content["tagline"], "Writer");
        assert_eq!(session.state("hero"), SectionState::Saved);
        // Saving is not publishing.
        assert!(session.has_unpublished_changes());
    }

    #[test]
    fn failed_save_keeps_draft_dirty() {
        let backend = FailingBackend::failing_writes(MemoryBackend::new());
        let attempts = backend.write_attempts.clone();
        let mut session = EditSession::open(
            StoreAdapter::with_backend(backend),
            Arc::new(RecordingInvalidator::default()),
        )
        .unwrap();

        session.update_field("hero", "tagline", json!("Writer"));
        let err = session.save_section("hero").unwrap_err();

        assert!(matches!(err, EditorError::Save { ref section, .. } if section == "hero"));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert_eq!(session.state("hero"), SectionState::Dirty);
        assert_eq!(session.content("hero")["tagline"], "Writer");
        assert!(session.has_unpublished_changes());
    }

    #[test]
    fn resync_discards_draft() {
        let backend = MemoryBackend::seeded([("hero".to_string(), doc(json!({"tagline": "Poet"})))]);
        let (mut session, _) = session_over(backend);
        session.update_field("hero", "tagline", json!("Draft"));

        session.resync_section("hero").unwrap();

        assert_eq!(session.content("hero")["tagline"], "Poet");
        assert_eq!(session.state("hero"), SectionState::Clean);
    }

    // =========================================================================
    // Publishing
    // =========================================================================

    #[test]
    fn publish_invalidates_public_paths_and_clears_flag() {
        let (mut session, invalidator) = session_over(MemoryBackend::new());
        session.update_field("hero", "tagline", json!("Writer"));
        session.save_section("hero").unwrap();

        let paths = session.publish().unwrap();

        assert_eq!(invalidator.path_calls(), vec![paths]);
        assert_eq!(invalidator.path_calls()[0].len(), 8);
        assert!(!session.has_unpublished_changes());
    }

    #[test]
    fn failed_publish_keeps_flag() {
        let invalidator = Arc::new(RecordingInvalidator::failing());
        let mut session =
            EditSession::open(StoreAdapter::with_backend(MemoryBackend::new()), invalidator.clone()).unwrap();
        session.update_field("hero", "tagline", json!("Writer"));

        assert!(matches!(session.publish(), Err(EditorError::Publish(_))));
        assert!(session.has_unpublished_changes());
        assert_eq!(invalidator.call_count(), 1);
    }

    #[test]
    fn publish_with_unsaved_sections_still_invalidates() {
        let (mut session, invalidator) = session_over(MemoryBackend::new());
        session.update_field("hero", "tagline", json!("Unsaved"));

        session.publish().unwrap();

        assert_eq!(invalidator.call_count(), 1);
        assert_eq!(session.state("hero"), SectionState::Dirty);
    }
}
