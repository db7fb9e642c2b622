//! Blob persistence for walk state.
//!
//! Every piece of session state lives under one well-known key: the
//! target catalog, the per-depth previous-year caches, the per-level
//! render batches, the selected structure, the finished tree, and the
//! generated paper. `BlobStore` abstracts where the blobs live;
//! `MemoryBlobStore` backs tests and single-process runs, `FileBlobStore`
//! writes one pretty-printed JSON file per key.

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio::fs;
use tracing::{debug, info};

use crate::error::ScaffoldError;

/// Persistence key for one blob of walk state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlobKey {
    /// Previous-year catalog fetched at this depth
    PreviousYearDepth(u32),
    /// Render-item batch minted at this level
    RenderItems(u32),
    /// The cross-year selected structure
    SelectedStructure,
    /// The finished prerequisite tree
    PrerequisiteTree,
    /// The target class's subject-to-chapters map
    AllChapters,
    /// The generated question paper
    QuestionPaper,
}

impl fmt::Display for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlobKey::PreviousYearDepth(depth) => write!(f, "previous_year_depth_{}", depth),
            BlobKey::RenderItems(level) => write!(f, "prereq_render_items_level_{}", level),
            BlobKey::SelectedStructure => write!(f, "selected_structure"),
            BlobKey::PrerequisiteTree => write!(f, "prerequisite_tree"),
            BlobKey::AllChapters => write!(f, "all_chapters"),
            BlobKey::QuestionPaper => write!(f, "question_paper"),
        }
    }
}

/// Read/write access to persisted walk state.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Read a blob, `None` when nothing was written under the key.
    async fn read(&self, key: &BlobKey) -> Result<Option<Value>, ScaffoldError>;

    /// Write a blob, replacing any previous value under the key.
    async fn write(&self, key: &BlobKey, value: &Value) -> Result<(), ScaffoldError>;
}

/// Read a blob and decode it into a typed value.
pub async fn read_as<T>(store: &dyn BlobStore, key: &BlobKey) -> Result<Option<T>, ScaffoldError>
where
    T: DeserializeOwned,
{
    match store.read(key).await? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

/// Encode a typed value and write it under the key.
pub async fn write_as<T>(store: &dyn BlobStore, key: &BlobKey, value: &T) -> Result<(), ScaffoldError>
where
    T: Serialize,
{
    store.write(key, &serde_json::to_value(value)?).await
}

/// In-memory blob store.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: DashMap<String, Value>,
}

impl MemoryBlobStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of blobs held.
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn read(&self, key: &BlobKey) -> Result<Option<Value>, ScaffoldError> {
        Ok(self
            .blobs
            .get(&key.to_string())
            .map(|entry| entry.value().clone()))
    }

    async fn write(&self, key: &BlobKey, value: &Value) -> Result<(), ScaffoldError> {
        debug!(key = %key, "Blob written");
        self.blobs.insert(key.to_string(), value.clone());
        Ok(())
    }
}

/// File-backed blob store, one JSON document per key.
pub struct FileBlobStore {
    root_dir: PathBuf,
}

impl FileBlobStore {
    /// Create a store rooted at the given directory, creating it if needed.
    pub async fn new<P: AsRef<Path>>(root_dir: P) -> Result<Self, ScaffoldError> {
        let root_dir = root_dir.as_ref().to_path_buf();
        fs::create_dir_all(&root_dir).await?;

        info!(path = %root_dir.display(), "Initialized blob store");

        Ok(Self { root_dir })
    }

    fn blob_path(&self, key: &BlobKey) -> PathBuf {
        self.root_dir.join(format!("{}.json", key))
    }
}

#[async_trait]
impl BlobStore for FileBlobStore {
    async fn read(&self, key: &BlobKey) -> Result<Option<Value>, ScaffoldError> {
        let path = self.blob_path(key);
        let raw = match fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    async fn write(&self, key: &BlobKey, value: &Value) -> Result<(), ScaffoldError> {
        let path = self.blob_path(key);
        fs::write(&path, serde_json::to_string_pretty(value)?).await?;
        debug!(key = %key, path = %path.display(), "Blob written");
        Ok(())
    }
}
