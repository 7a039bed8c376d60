use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::Arc;

use polars::prelude::DataFrame;

use crate::data::loader;
use crate::error::LoadError;

/// Identity of an uploaded file: its name plus a fingerprint of its bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileId {
    pub name: String,
    pub len: usize,
    pub digest: u64,
}

impl FileId {
    pub fn of(name: &str, bytes: &[u8]) -> Self {
        let mut hasher = DefaultHasher::new();
        bytes.hash(&mut hasher);
        Self {
            name: name.to_string(),
            len: bytes.len(),
            digest: hasher.finish(),
        }
    }
}

/// A file read off the UI thread, ready to hand to [`DatasetCache::accept`].
pub enum Upload {
    /// Already cached; nothing was parsed.
    Cached(FileId),
    Parsed(FileId, DataFrame),
}

/// Read `path` and parse it unless its identity is in `known`.
pub fn read_upload(path: &Path, known: &HashSet<FileId>) -> Result<Upload, LoadError> {
    let bytes = std::fs::read(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    prepare_upload(&name, &bytes, known)
}

/// Parse uploaded bytes unless the same file is in `known`.
pub fn prepare_upload(name: &str, bytes: &[u8], known: &HashSet<FileId>) -> Result<Upload, LoadError> {
    let id = FileId::of(name, bytes);
    if known.contains(&id) {
        return Ok(Upload::Cached(id));
    }
    let table = loader::load_bytes(bytes)?;
    tracing::info!(
        "Loaded {}: {} rows, {} columns",
        name,
        table.height(),
        table.width()
    );
    Ok(Upload::Parsed(id, table))
}

/// Session-lifetime store of parsed Working Tables.
///
/// Tables are memoized per [`FileId`] so the same upload is never parsed
/// twice. Loading a different file makes it the active dataset; previously
/// parsed tables stay cached and are reused if that file comes back.
#[derive(Default)]
pub struct DatasetCache {
    tables: HashMap<FileId, Arc<DataFrame>>,
    active: Option<FileId>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &FileId) -> Option<Arc<DataFrame>> {
        self.tables.get(id).cloned()
    }

    /// Switch to an already cached file. Returns `None` on a cache miss.
    pub fn activate(&mut self, id: &FileId) -> Option<Arc<DataFrame>> {
        let table = self.get(id)?;
        tracing::info!("Reusing cached table for {}", id.name);
        self.active = Some(id.clone());
        Some(table)
    }

    /// Store a freshly parsed table and make it the active dataset, replacing
    /// whatever was active before.
    pub fn replace(&mut self, id: FileId, table: DataFrame) -> Arc<DataFrame> {
        let table = Arc::new(table);
        if let Some(previous) = self.active.as_ref().filter(|prev| **prev != id) {
            tracing::info!("Replacing dataset {} with {}", previous.name, id.name);
        }
        self.tables.insert(id.clone(), Arc::clone(&table));
        self.active = Some(id);
        table
    }

    /// Make an upload the active dataset. `None` if a cached upload was
    /// evicted in the meantime.
    pub fn accept(&mut self, upload: Upload) -> Option<Arc<DataFrame>> {
        match upload {
            Upload::Cached(id) => self.activate(&id),
            Upload::Parsed(id, table) => Some(self.replace(id, table)),
        }
    }

    pub fn known_ids(&self) -> HashSet<FileId> {
        self.tables.keys().cloned().collect()
    }

    pub fn active(&self) -> Option<Arc<DataFrame>> {
        self.active.as_ref().and_then(|id| self.get(id))
    }

    pub fn active_id(&self) -> Option<&FileId> {
        self.active.as_ref()
    }

    /// Forget the active dataset without evicting cached tables.
    pub fn close(&mut self) {
        self.active = None;
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }
}
