//! # Storage Module
//!
//! Object storage for the upload command.
//!
//! ## Layout
//! ```text
//! media/YYYY/MM/<hash10><ext>       original (HEIC converted to .jpg)
//! thumbnails/YYYY/MM/<hash10>.jpg   300px thumbnail
//! manifest.json                     index of everything under media/
//! ```
//!
//! `hash10` is the first ten hex digits of the file's xxh3 content hash, so
//! re-uploading the same bytes overwrites rather than duplicates.

mod keys;
mod local;
mod manifest;

pub use keys::{content_hash10, media_key, thumbnail_key, validate_key, MediaKey};
pub use local::LocalObjectStore;
pub use manifest::{build_manifest, publish_manifest, Manifest, ManifestPhoto, TimelineEntry, MANIFEST_KEY};

use crate::error::StorageError;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A stored object as reported by [`ObjectStore::list`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectInfo {
    pub key: String,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Minimal object-store interface
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` under `key`, replacing any existing object
    fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<(), StorageError>;

    /// Objects whose key starts with `prefix`, sorted by key
    fn list(&self, prefix: &str) -> Result<Vec<ObjectInfo>, StorageError>;
}
