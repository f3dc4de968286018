//! Directory-backed object store.

use super::{validate_key, ObjectInfo, ObjectStore};
use crate::error::StorageError;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Stores each object as a file under `root`, key segments as directories
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    /// Open (creating if needed) a store rooted at `root`
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| StorageError::Io {
            key: root.display().to_string(),
            source,
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem location of `key`
    pub fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(key.split('/').fold(self.root.clone(), |path, part| path.join(part)))
    }

    fn key_for(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let parts: Option<Vec<&str>> = relative.components().map(|c| c.as_os_str().to_str()).collect();
        Some(parts?.join("/"))
    }
}

impl ObjectStore for LocalObjectStore {
    fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let io_error = |source| StorageError::Io {
            key: key.to_string(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        fs::write(&path, bytes).map_err(io_error)?;

        debug!(key, size = bytes.len(), content_type, "stored object");
        Ok(())
    }

    fn list(&self, prefix: &str) -> Result<Vec<ObjectInfo>, StorageError> {
        let mut objects = Vec::new();

        for entry in WalkDir::new(&self.root).follow_links(false) {
            let entry = entry.map_err(|e| StorageError::Io {
                key: prefix.to_string(),
                source: std::io::Error::other(e.to_string()),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(key) = self.key_for(entry.path()) else {
                continue;
            };
            if !key.starts_with(prefix) {
                continue;
            }

            let metadata = entry.metadata().map_err(|e| StorageError::Io {
                key: key.clone(),
                source: std::io::Error::other(e.to_string()),
            })?;
            objects.push(ObjectInfo {
                size: metadata.len(),
                last_modified: metadata.modified().ok().map(DateTime::<Utc>::from),
                key,
            });
        }

        objects.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(objects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn put_then_list_by_prefix() {
        let dir = TempDir::new().unwrap();
        let store = LocalObjectStore::open(dir.path().join("bucket")).unwrap();

        store.put("media/2023/04/abc.jpg", b"one", "image/jpeg").unwrap();
        store.put("media/2022/01/def.mp4", b"three", "video/mp4").unwrap();
        store.put("thumbnails/2023/04/abc.jpg", b"t", "image/jpeg").unwrap();

        let media = store.list("media/").unwrap();
        let keys: Vec<_> = media.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["media/2022/01/def.mp4", "media/2023/04/abc.jpg"]);
        assert_eq!(media[0].size, 5);
        assert!(media[0].last_modified.is_some());

        assert_eq!(store.list("").unwrap().len(), 3);
    }

    #[test]
    fn put_overwrites() {
        let dir = TempDir::new().unwrap();
        let store = LocalObjectStore::open(dir.path()).unwrap();

        store.put("manifest.json", b"old", "application/json").unwrap();
        store.put("manifest.json", b"newer", "application/json").unwrap();

        let path = store.path_for("manifest.json").unwrap();
        assert_eq!(fs::read(path).unwrap(), b"newer");
    }

    #[test]
    fn invalid_key_is_rejected() {
        let dir = TempDir::new().unwrap();
        let store = LocalObjectStore::open(dir.path()).unwrap();
        assert!(matches!(
            store.put("../escape.jpg", b"x", "image/jpeg"),
            Err(StorageError::InvalidKey { .. })
        ));
    }
}
