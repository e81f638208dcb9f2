//! Persistent mapping `id -> (vector, metadata)` (spec §4.2).
//!
//! Mirrors the teacher's `Abkve`/`AbkveInner` split — a thin
//! `parking_lot::RwLock` wrapper around an unsynchronized inner struct —
//! but keyed by opaque string ids instead of `u64`s and carrying metadata
//! alongside the vector, per spec §3.

use std::collections::HashMap;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{RetrievalError, Result};

/// Opaque, globally unique item id (UUID v4 string form, spec §3).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(String);

impl ItemId {
    /// Mints a fresh id.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wraps an existing id string (used when round-tripping from disk).
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Borrows the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-item metadata record (spec §3). Strings are UTF-8 and opaque to the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Source path of the image, as supplied by the caller.
    pub path: String,
    /// Free-form category label; defaults to `"unknown"`.
    pub category: String,
    /// Base name of `path`.
    pub filename: String,
    /// Base64-encoded JPEG thumbnail, if one was generated.
    pub thumbnail: Option<String>,
}

impl Metadata {
    /// Builds a record with the default `"unknown"` category.
    pub fn new(path: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            category: "unknown".to_string(),
            filename: filename.into(),
            thumbnail: None,
        }
    }

    /// Builds a record for an id that exists in the vectors file but not
    /// in the metadata file (spec §4.2: "id in vectors without metadata:
    /// present with synthesized unknown category").
    fn synthesized_for(id: &ItemId) -> Self {
        Self {
            path: String::new(),
            category: "unknown".to_string(),
            filename: id.as_str().to_string(),
            thumbnail: None,
        }
    }
}

/// Shallow, per-key patch applied by [`VectorStore::update`]. A field left
/// as `None` is left untouched.
#[derive(Debug, Default, Clone)]
pub struct MetadataPatch {
    /// New `path`, if changing.
    pub path: Option<String>,
    /// New `category`, if changing.
    pub category: Option<String>,
    /// New `filename`, if changing.
    pub filename: Option<String>,
    /// New `thumbnail`, if changing (`Some(None)` clears it).
    pub thumbnail: Option<Option<String>>,
}

impl MetadataPatch {
    fn apply(&self, meta: &mut Metadata) {
        if let Some(path) = &self.path {
            meta.path = path.clone();
        }
        if let Some(category) = &self.category {
            meta.category = category.clone();
        }
        if let Some(filename) = &self.filename {
            meta.filename = filename.clone();
        }
        if let Some(thumbnail) = &self.thumbnail {
            meta.thumbnail = thumbnail.clone();
        }
    }
}

struct Inner {
    vectors: HashMap<ItemId, Vec<f32>>,
    metadata: HashMap<ItemId, Metadata>,
}

/// Persistent `id -> (vector, metadata)` store (spec §4.2, §6).
pub struct VectorStore {
    vector_path: PathBuf,
    meta_path: PathBuf,
    inner: RwLock<Inner>,
}

impl VectorStore {
    /// Opens (and, if present, loads) the store backed by `vector_path`
    /// and `meta_path`. Either file missing or unreadable yields an empty
    /// mapping for that half of the store (spec §4.2); it never fails.
    pub fn open(vector_path: impl Into<PathBuf>, meta_path: impl Into<PathBuf>) -> Self {
        let vector_path = vector_path.into();
        let meta_path = meta_path.into();

        let vectors = load_vectors(&vector_path).unwrap_or_else(|err| {
            tracing::warn!(path = %vector_path.display(), %err, "vectors snapshot unreadable, starting empty");
            HashMap::new()
        });
        let metadata = load_metadata(&meta_path).unwrap_or_else(|err| {
            tracing::warn!(path = %meta_path.display(), %err, "metadata snapshot unreadable, starting empty");
            HashMap::new()
        });

        Self {
            vector_path,
            meta_path,
            inner: RwLock::new(Inner { vectors, metadata }),
        }
    }

    /// Inserts (overwriting any prior record at `id`).
    pub fn insert(&self, id: ItemId, vector: Vec<f32>, meta: Metadata) {
        let mut inner = self.inner.write();
        inner.vectors.insert(id.clone(), vector);
        inner.metadata.insert(id, meta);
    }

    /// Updates an existing record. `vector` and `meta` are gated
    /// independently on their own map's presence — a vector-absent,
    /// metadata-present straggler (permitted post-load, spec §4.2) still
    /// gets its metadata patch applied even though there is no vector to
    /// replace. A no-op on both branches if `id` is absent from both maps.
    pub fn update(&self, id: &ItemId, vector: Option<Vec<f32>>, meta: Option<MetadataPatch>) {
        let mut inner = self.inner.write();
        if let Some(vector) = vector {
            if inner.vectors.contains_key(id) {
                inner.vectors.insert(id.clone(), vector);
            }
        }
        if let Some(patch) = meta {
            if let Some(existing) = inner.metadata.get_mut(id) {
                patch.apply(existing);
            }
        }
    }

    /// Returns a clone of the stored vector, if present.
    pub fn get_vector(&self, id: &ItemId) -> Option<Vec<f32>> {
        self.inner.read().vectors.get(id).cloned()
    }

    /// Returns a clone of the stored metadata, synthesizing an `"unknown"`
    /// record if the id has a vector but no metadata (spec §4.2).
    pub fn get_metadata(&self, id: &ItemId) -> Option<Metadata> {
        let inner = self.inner.read();
        if let Some(meta) = inner.metadata.get(id) {
            return Some(meta.clone());
        }
        if inner.vectors.contains_key(id) {
            return Some(Metadata::synthesized_for(id));
        }
        None
    }

    /// Returns a snapshot copy of the id -> vector mapping so callers can
    /// iterate without holding the store lock (spec §4.2).
    pub fn get_all_vectors(&self) -> HashMap<ItemId, Vec<f32>> {
        self.inner.read().vectors.clone()
    }

    /// Number of items currently stored.
    pub fn len(&self) -> usize {
        self.inner.read().vectors.len()
    }

    /// True if the store holds no vectors.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes `id` from both mappings. Returns whether anything was
    /// removed. Does not persist by itself.
    pub fn delete(&self, id: &ItemId) -> bool {
        let mut inner = self.inner.write();
        let a = inner.vectors.remove(id).is_some();
        let b = inner.metadata.remove(id).is_some();
        a || b
    }

    /// Wipes both mappings and persists empty snapshots.
    pub fn clear(&self) -> Result<()> {
        {
            let mut inner = self.inner.write();
            inner.vectors.clear();
            inner.metadata.clear();
        }
        self.save()
    }

    /// Writes both mappings to their respective files (spec §4.2, §6).
    /// Best-effort: on failure the in-memory state is left mutated, per §7.
    pub fn save(&self) -> Result<()> {
        let inner = self.inner.read();
        save_vectors(&self.vector_path, &inner.vectors).map_err(|source| {
            RetrievalError::PersistenceFailure {
                what: "vector store",
                path: self.vector_path.display().to_string(),
                source,
            }
        })?;
        save_metadata(&self.meta_path, &inner.metadata).map_err(|source| {
            RetrievalError::PersistenceFailure {
                what: "metadata store",
                path: self.meta_path.display().to_string(),
                source,
            }
        })
    }
}

fn load_vectors(path: &Path) -> std::io::Result<HashMap<ItemId, Vec<f32>>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let file = File::open(path)?;
    bincode::deserialize_from(BufReader::new(file))
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

fn save_vectors(path: &Path, vectors: &HashMap<ItemId, Vec<f32>>) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    bincode::serialize_into(BufWriter::new(file), vectors)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
}

fn load_metadata(path: &Path) -> std::io::Result<HashMap<ItemId, Metadata>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let file = File::open(path)?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

fn save_metadata(path: &Path, metadata: &HashMap<ItemId, Metadata>) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), metadata)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store_in(dir: &Path) -> VectorStore {
        VectorStore::open(dir.join("vectors.bin"), dir.join("meta.json"))
    }

    #[test]
    fn insert_then_get_round_trips() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        let id = ItemId::new();
        store.insert(id.clone(), vec![1.0, 2.0], Metadata::new("a.jpg", "a.jpg"));
        assert_eq!(store.get_vector(&id), Some(vec![1.0, 2.0]));
        assert_eq!(store.get_metadata(&id).unwrap().category, "unknown");
    }

    #[test]
    fn update_merges_metadata_shallowly() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        let id = ItemId::new();
        store.insert(id.clone(), vec![1.0], Metadata::new("a.jpg", "a.jpg"));
        store.update(
            &id,
            None,
            Some(MetadataPatch {
                category: Some("cat".to_string()),
                ..Default::default()
            }),
        );
        let meta = store.get_metadata(&id).unwrap();
        assert_eq!(meta.category, "cat");
        assert_eq!(meta.path, "a.jpg", "untouched fields must survive the merge");
    }

    #[test]
    fn update_on_missing_id_is_noop() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        let id = ItemId::new();
        store.update(&id, Some(vec![1.0]), None);
        assert_eq!(store.get_vector(&id), None);
    }

    #[test]
    fn delete_removes_from_both_mappings() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        let id = ItemId::new();
        store.insert(id.clone(), vec![1.0], Metadata::new("a.jpg", "a.jpg"));
        assert!(store.delete(&id));
        assert!(!store.delete(&id), "second delete finds nothing");
        assert_eq!(store.get_vector(&id), None);
        assert_eq!(store.get_metadata(&id), None);
    }

    #[test]
    fn save_then_reopen_round_trips_r1() {
        let dir = tempdir().unwrap();
        let vector_path = dir.path().join("vectors.bin");
        let meta_path = dir.path().join("meta.json");
        let id = ItemId::new();
        {
            let store = VectorStore::open(&vector_path, &meta_path);
            store.insert(id.clone(), vec![1.0, 2.0, 3.0], Metadata::new("a.jpg", "a.jpg"));
            store.save().unwrap();
        }
        let reopened = VectorStore::open(&vector_path, &meta_path);
        assert_eq!(reopened.get_vector(&id), Some(vec![1.0, 2.0, 3.0]));
        assert_eq!(reopened.get_metadata(&id).unwrap().path, "a.jpg");
    }

    #[test]
    fn missing_files_load_as_empty() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        assert!(store.is_empty());
    }

    #[test]
    fn clear_wipes_and_persists() {
        let dir = tempdir().unwrap();
        let vector_path = dir.path().join("vectors.bin");
        let meta_path = dir.path().join("meta.json");
        let store = VectorStore::open(&vector_path, &meta_path);
        store.insert(ItemId::new(), vec![1.0], Metadata::new("a.jpg", "a.jpg"));
        store.clear().unwrap();
        assert!(store.is_empty());
        let reopened = VectorStore::open(&vector_path, &meta_path);
        assert!(reopened.is_empty());
    }
}
