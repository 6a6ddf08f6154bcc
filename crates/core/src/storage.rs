//! Key/value blob persistence.

use std::{
    collections::HashMap,
    fs,
    path::PathBuf,
    sync::Arc,
};

use anyhow::{Context, Result};
use parking_lot::RwLock;

/// Durable store of opaque blobs addressed by a fixed key.
pub trait BlobStore: Send + Sync {
    /// Read the blob stored under `key`, or `None` if nothing was written yet.
    fn read_blob(&self, key: &str) -> Result<Option<Vec<u8>>>;
    /// Replace the blob stored under `key`.
    fn write_blob(&self, key: &str, bytes: &[u8]) -> Result<()>;
}

/// Blob store writing one JSON file per key beneath a root directory.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    root: PathBuf,
}

impl FileBlobStore {
    /// Create a store rooted at the provided directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path backing the given key.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", sanitize_key(key)))
    }
}

impl BlobStore for FileBlobStore {
    fn read_blob(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
        Ok(Some(bytes))
    }

    fn write_blob(&self, key: &str, bytes: &[u8]) -> Result<()> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("failed to create {}", self.root.display()))?;
        let path = self.path_for(key);
        fs::write(&path, bytes).with_context(|| format!("failed to write {}", path.display()))
    }
}

/// In-process blob store. Clones share the same contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    blobs: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryBlobStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryBlobStore {
    fn read_blob(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.blobs.read().get(key).cloned())
    }

    fn write_blob(&self, key: &str, bytes: &[u8]) -> Result<()> {
        self.blobs.write().insert(key.to_string(), bytes.to_vec());
        Ok(())
    }
}

impl<S: BlobStore + ?Sized> BlobStore for Box<S> {
    fn read_blob(&self, key: &str) -> Result<Option<Vec<u8>>> {
        (**self).read_blob(key)
    }

    fn write_blob(&self, key: &str, bytes: &[u8]) -> Result<()> {
        (**self).write_blob(key, bytes)
    }
}

fn sanitize_key(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_') {
            result.push(ch);
        }
    }
    if result.is_empty() {
        "blob".to_string()
    } else {
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_store_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let store = FileBlobStore::new(dir.path().join("nested"));

        assert!(store.read_blob("Players")?.is_none());
        store.write_blob("Players", b"[1,2]")?;
        assert_eq!(store.read_blob("Players")?.as_deref(), Some(&b"[1,2]"[..]));
        assert!(store.path_for("Players").exists());

        store.write_blob("Players", b"[]")?;
        assert_eq!(store.read_blob("Players")?.as_deref(), Some(&b"[]"[..]));
        Ok(())
    }

    #[test]
    fn memory_store_clones_share_contents() -> Result<()> {
        let store = MemoryBlobStore::new();
        let view = store.clone();
        store.write_blob("k", b"v")?;
        assert_eq!(view.read_blob("k")?.as_deref(), Some(&b"v"[..]));
        Ok(())
    }

    #[test]
    fn sanitize_creates_safe_filenames() {
        assert_eq!(sanitize_key("../World Navigation!"), "WorldNavigation");
        assert_eq!(sanitize_key("///"), "blob");
    }
}
