//! In-process content backend.

use super::{ContentBackend, SectionRecord, StoreError};
use crate::sections::Document;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Sections held in a map for the life of the process.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    rows: Mutex<BTreeMap<String, SectionRecord>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend pre-filled with `sections`, each stamped now.
    pub fn seeded<I>(sections: I) -> Self
    where
        I: IntoIterator<Item = (String, Document)>,
    {
        let now = Utc::now();
        let rows = sections
            .into_iter()
            .map(|(id, content)| {
                let record = SectionRecord {
                    id: id.clone(),
                    content,
                    updated_at: now,
                };
                (id, record)
            })
            .collect();
        Self {
            rows: Mutex::new(rows),
        }
    }

    fn rows(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, SectionRecord>> {
        self.rows.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ContentBackend for MemoryBackend {
    fn read(&self, id: &str) -> Result<Option<SectionRecord>, StoreError> {
        Ok(self.rows().get(id).cloned())
    }

    fn write(&self, id: &str, content: &Document) -> Result<SectionRecord, StoreError> {
        let record = SectionRecord {
            id: id.to_string(),
            content: content.clone(),
            updated_at: Utc::now(),
        };
        self.rows().insert(id.to_string(), record.clone());
        Ok(record)
    }

    fn read_all(&self) -> Result<Vec<SectionRecord>, StoreError> {
        Ok(self.rows().values().cloned().collect())
    }

    fn describe(&self) -> String {
        "memory:".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn read_all_is_ordered_by_id() {
        let backend = MemoryBackend::new();
        for id in ["read_page", "hero", "nav_items"] {
            backend.write(id, &Document::new()).unwrap();
        }
        let ids: Vec<_> = backend.read_all().unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["hero", "nav_items", "read_page"]);
    }

    #[test]
    fn write_is_upsert() {
        let backend = MemoryBackend::new();
        let first = json!({"tagline": "a"}).as_object().cloned().unwrap();
        let second = json!({"tagline": "b"}).as_object().cloned().unwrap();
        let r1 = backend.write("hero", &first).unwrap();
        let r2 = backend.write("hero", &second).unwrap();
        assert!(r2.updated_at >= r1.updated_at);
        assert_eq!(backend.read_all().unwrap().len(), 1);
        assert_eq!(backend.read("hero").unwrap().unwrap().content, second);
    }

    #[test]
    fn seeded_rows_are_readable() {
        let backend = MemoryBackend::seeded([(
            "hero".to_string(),
            json!({"tagline": "seeded"}).as_object().cloned().unwrap(),
        )]);
        assert_eq!(
            backend.read("hero").unwrap().unwrap().content["tagline"],
            "seeded"
        );
    }
}
