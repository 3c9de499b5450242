//! Document store abstraction and the file-backed implementation.
//!
//! A store holds one [`StoredDocument`] per id: the raw record as it arrived
//! plus whatever the batch phases have written back. [`FsDocumentStore`]
//! keeps each document in `{id}.json` under a single directory and lists ids
//! in lexicographic order, which is the order the batch walks them in.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use canonical::CanonicalDocumentJson;
use chrono::{DateTime, Utc};
use ingest::RawDocumentRecord;
use normalize::{Dialect, NormalizeOutcome};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ValidationStatus;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("document not found: {0}")]
    NotFound(String),
    #[error("invalid document id: {0:?}")]
    InvalidId(String),
    #[error("store I/O error: {0}")]
    Io(String),
    #[error("store decode error: {0}")]
    Decode(String),
    #[error("store encode error: {0}")]
    Encode(String),
}

impl StoreError {
    fn io(path: &Path, err: std::io::Error) -> Self {
        StoreError::Io(format!("{}: {err}", path.display()))
    }
}

/// Output of the normalize phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub doc_id: String,
    pub dialect: Dialect,
    pub outcome: NormalizeOutcome,
    pub canonical_markup: String,
    pub canonical_hash: String,
    /// Parse config version the hash was computed under.
    pub canonical_version: u32,
    pub json: CanonicalDocumentJson,
    pub validation: ValidationStatus,
    pub processed_at: DateTime<Utc>,
}

/// Output of the derive phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedRecord {
    pub markdown: String,
    pub plain_text: String,
    pub derived_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    #[serde(flatten)]
    pub record: RawDocumentRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical: Option<CanonicalRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derived: Option<DerivedRecord>,
}

impl StoredDocument {
    pub fn new(record: RawDocumentRecord) -> Self {
        Self {
            record,
            canonical: None,
            derived: None,
        }
    }
}

/// Selection for [`DocumentStore::list_ids`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery<'a> {
    /// Only ids strictly greater than this one.
    pub after: Option<&'a str>,
    /// Case-insensitive match on the record's content type tag.
    pub content_type: Option<&'a str>,
    pub limit: Option<usize>,
}

/// Storage backend the batch orchestrator reads from and writes back to.
pub trait DocumentStore: Send + Sync {
    /// Ids matching `query`, in ascending lexicographic order.
    fn list_ids(&self, query: &ListQuery<'_>) -> Result<Vec<String>, StoreError>;
    fn load(&self, id: &str) -> Result<StoredDocument, StoreError>;
    fn save_canonical(&self, id: &str, record: &CanonicalRecord) -> Result<(), StoreError>;
    fn save_derived(&self, id: &str, record: &DerivedRecord) -> Result<(), StoreError>;
}

/// A directory of `{id}.json` files.
#[derive(Debug, Clone)]
pub struct FsDocumentStore {
    root: PathBuf,
}

impl FsDocumentStore {
    /// Opens (creating if needed) a store rooted at `root`.
    pub fn open<P: Into<PathBuf>>(root: P) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|err| StoreError::io(&root, err))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes a raw record, replacing any previous document with that id.
    pub fn insert(&self, record: RawDocumentRecord) -> Result<(), StoreError> {
        let id = record.id.clone();
        self.write(&id, &StoredDocument::new(record))
    }

    fn path_for(&self, id: &str) -> Result<PathBuf, StoreError> {
        let valid = !id.is_empty()
            && !id.starts_with('.')
            && !id.contains(['/', '\\'])
            && !id.chars().any(char::is_control);
        if !valid {
            return Err(StoreError::InvalidId(id.to_string()));
        }
        Ok(self.root.join(format!("{id}.json")))
    }

    fn write(&self, id: &str, doc: &StoredDocument) -> Result<(), StoreError> {
        let path = self.path_for(id)?;
        let bytes =
            serde_json::to_vec_pretty(doc).map_err(|err| StoreError::Encode(err.to_string()))?;
        write_atomic(&path, &bytes).map_err(|err| StoreError::io(&path, err))
    }

    fn update(
        &self,
        id: &str,
        apply: impl FnOnce(&mut StoredDocument),
    ) -> Result<(), StoreError> {
        let mut doc = self.load(id)?;
        apply(&mut doc);
        self.write(id, &doc)
    }

    fn matches_content_type(&self, id: &str, wanted: &str) -> Result<bool, StoreError> {
        let doc = self.load(id)?;
        Ok(doc
            .record
            .content_type
            .as_deref()
            .is_some_and(|tag| tag.trim().eq_ignore_ascii_case(wanted.trim())))
    }
}

impl DocumentStore for FsDocumentStore {
    fn list_ids(&self, query: &ListQuery<'_>) -> Result<Vec<String>, StoreError> {
        let entries = fs::read_dir(&self.root).map_err(|err| StoreError::io(&self.root, err))?;
        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| StoreError::io(&self.root, err))?;
            let path = entry.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if id.starts_with('.') || query.after.is_some_and(|after| id <= after) {
                continue;
            }
            ids.push(id.to_string());
        }
        ids.sort();

        let mut selected = Vec::new();
        for id in ids {
            if query.limit.is_some_and(|limit| selected.len() >= limit) {
                break;
            }
            if let Some(wanted) = query.content_type {
                if !self.matches_content_type(&id, wanted)? {
                    continue;
                }
            }
            selected.push(id);
        }
        Ok(selected)
    }

    fn load(&self, id: &str) -> Result<StoredDocument, StoreError> {
        let path = self.path_for(id)?;
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(id.to_string()));
            }
            Err(err) => return Err(StoreError::io(&path, err)),
        };
        serde_json::from_slice(&bytes)
            .map_err(|err| StoreError::Decode(format!("{}: {err}", path.display())))
    }

    fn save_canonical(&self, id: &str, record: &CanonicalRecord) -> Result<(), StoreError> {
        self.update(id, |doc| {
            doc.canonical = Some(record.clone());
            // Derived text belongs to the previous canonical markup.
            doc.derived = None;
        })
    }

    fn save_derived(&self, id: &str, record: &DerivedRecord) -> Result<(), StoreError> {
        self.update(id, |doc| doc.derived = Some(record.clone()))
    }
}

/// Writes through a sibling temp file so readers never see a partial file.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(id: &str, content_type: Option<&str>) -> RawDocumentRecord {
        RawDocumentRecord {
            id: id.into(),
            document_number: Some(format!("SFS 2020:{}", id.len())),
            title: Some("Lag".into()),
            content_type: content_type.map(str::to_string),
            markup: Some("<p>Text.</p>".into()),
        }
    }

    fn store_with(ids: &[(&str, Option<&str>)]) -> (TempDir, FsDocumentStore) {
        let dir = TempDir::new().expect("tempdir");
        let store = FsDocumentStore::open(dir.path()).expect("open store");
        for (id, content_type) in ids {
            store.insert(record(id, *content_type)).expect("insert");
        }
        (dir, store)
    }

    #[test]
    fn ids_are_listed_in_order_after_cursor() {
        let (_dir, store) = store_with(&[("c", None), ("a", None), ("b", None)]);
        let all = store.list_ids(&ListQuery::default()).expect("list");
        assert_eq!(all, vec!["a", "b", "c"]);

        let after = store
            .list_ids(&ListQuery {
                after: Some("a"),
                limit: Some(1),
                ..ListQuery::default()
            })
            .expect("list after");
        assert_eq!(after, vec!["b"]);
    }

    #[test]
    fn content_type_filter_applies_before_limit() {
        let (_dir, store) = store_with(&[
            ("a", Some("SFS_LAW")),
            ("b", Some("AGENCY_REGULATION")),
            ("c", Some("sfs_law")),
        ]);
        let ids = store
            .list_ids(&ListQuery {
                content_type: Some("SFS_LAW"),
                limit: Some(2),
                ..ListQuery::default()
            })
            .expect("list");
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn derived_output_is_written_back() {
        let (_dir, store) = store_with(&[("a", None)]);
        let derived = DerivedRecord {
            markdown: "x\n".into(),
            plain_text: "x".into(),
            derived_at: Utc::now(),
        };
        store.save_derived("a", &derived).expect("save derived");

        let doc = store.load("a").expect("load");
        assert_eq!(doc.derived, Some(derived));
        assert_eq!(doc.record, record("a", None));
        assert!(doc.canonical.is_none());
    }

    #[test]
    fn missing_and_invalid_ids() {
        let (_dir, store) = store_with(&[]);
        assert_eq!(store.load("nope"), Err(StoreError::NotFound("nope".into())));
        assert!(matches!(store.load("../etc"), Err(StoreError::InvalidId(_))));
        assert!(matches!(store.load(""), Err(StoreError::InvalidId(_))));
    }

    #[test]
    fn corrupt_files_are_decode_errors() {
        let (dir, store) = store_with(&[]);
        fs::write(dir.path().join("bad.json"), b"{ not json").expect("write");
        assert!(matches!(store.load("bad"), Err(StoreError::Decode(_))));
    }

    #[test]
    fn non_json_files_and_subdirectories_are_ignored() {
        let (dir, store) = store_with(&[("a", None)]);
        fs::write(dir.path().join("notes.txt"), b"x").expect("write");
        fs::create_dir(dir.path().join(".checkpoints")).expect("mkdir");
        assert_eq!(store.list_ids(&ListQuery::default()).expect("list"), vec!["a"]);
    }
}
