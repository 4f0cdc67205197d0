//! Expected-data lookup: ground-truth field maps keyed by document id.
//!
//! A document id may or may not carry its file extension (`"lab_07.pdf"`
//! vs `"lab_07"`), so lookups try every naming variant before giving up.
//! Absence is a normal condition ("no expected data"), not an error.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::models::FieldMap;

/// Source of ground-truth field maps.
pub trait ExpectedDataStore {
    fn load(&self, document_id: &str) -> Option<FieldMap>;
}

/// Candidate lookup names for a document id, most specific first, deduplicated.
pub fn name_variants(document_id: &str) -> Vec<String> {
    let stem = Path::new(document_id)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(document_id);

    let mut variants: Vec<String> = Vec::with_capacity(3);
    for candidate in [
        document_id,
        document_id.strip_suffix(".pdf").unwrap_or(document_id),
        stem,
    ] {
        if !candidate.is_empty() && !variants.iter().any(|v| v == candidate) {
            variants.push(candidate.to_string());
        }
    }
    variants
}

/// Directory of `<name>.json` files, one per document.
#[derive(Debug, Clone)]
pub struct DirectoryExpectedStore {
    dir: PathBuf,
}

impl DirectoryExpectedStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        if !dir.exists() {
            tracing::warn!(path = %dir.display(), "Expected data directory does not exist");
        }
        Self { dir }
    }
}

impl ExpectedDataStore for DirectoryExpectedStore {
    fn load(&self, document_id: &str) -> Option<FieldMap> {
        for name in name_variants(document_id) {
            let path = self.dir.join(format!("{name}.json"));
            if !path.exists() {
                continue;
            }

            // A present but unreadable file stops the search: the variant
            // matched, so falling through would mask a broken reference.
            return match std::fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|raw| serde_json::from_str::<FieldMap>(&raw).map_err(|e| e.to_string()))
            {
                Ok(map) => Some(map),
                Err(e) => {
                    tracing::error!(
                        path = %path.display(),
                        error = %e,
                        "Error loading expected data"
                    );
                    None
                }
            };
        }

        tracing::warn!(doc = %document_id, "No expected data found");
        None
    }
}

/// In-memory store, keyed by any of the name variants.
#[derive(Debug, Clone, Default)]
pub struct MemoryExpectedStore {
    entries: BTreeMap<String, FieldMap>,
}

impl MemoryExpectedStore {
    pub fn insert(&mut self, name: &str, expected: FieldMap) {
        self.entries.insert(name.to_string(), expected);
    }
}

impl ExpectedDataStore for MemoryExpectedStore {
    fn load(&self, document_id: &str) -> Option<FieldMap> {
        name_variants(document_id)
            .iter()
            .find_map(|name| self.entries.get(name).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FieldKey, FieldValue};

    #[test]
    fn variants_for_pdf_name() {
        assert_eq!(name_variants("lab_07.pdf"), vec!["lab_07.pdf", "lab_07"]);
    }

    #[test]
    fn variants_for_bare_name() {
        assert_eq!(name_variants("lab_07"), vec!["lab_07"]);
    }

    #[test]
    fn variants_for_other_extension() {
        assert_eq!(name_variants("scan.PDF"), vec!["scan.PDF", "scan"]);
    }

    #[test]
    fn loads_from_directory_by_stem() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("lab_07.json"),
            r#"{"HEMOGLOBINA": 12.0, "VIH": 1, "NOMBRE": "ANA"}"#,
        )
        .unwrap();

        let store = DirectoryExpectedStore::new(dir.path());
        let map = store.load("lab_07.pdf").expect("expected data");
        assert_eq!(map.get(FieldKey::Hemoglobina), Some(&FieldValue::Real(12.0)));
        assert_eq!(map.get(FieldKey::Vih), Some(&FieldValue::Integer(1)));
    }

    #[test]
    fn missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryExpectedStore::new(dir.path());
        assert!(store.load("nothing.pdf").is_none());
    }

    #[test]
    fn malformed_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.json"), "{ not json").unwrap();
        let store = DirectoryExpectedStore::new(dir.path());
        assert!(store.load("bad.pdf").is_none());
    }

    #[test]
    fn memory_store_matches_without_extension() {
        let mut store = MemoryExpectedStore::default();
        store.insert("lab_01", FieldMap::new().with(FieldKey::Vih, 0));
        assert!(store.load("lab_01.pdf").is_some());
        assert!(store.load("lab_01").is_some());
        assert!(store.load("lab_02.pdf").is_none());
    }
}
