//! `manifest.json`: an index of every object under `media/`.

use super::ObjectStore;
use crate::error::StorageError;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

pub const MANIFEST_KEY: &str = "manifest.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestPhoto {
    pub id: String,
    pub path: String,
    pub year: i32,
    pub month: u32,
    pub filename: String,
    pub size: u64,
    /// RFC 3339, absent when the store cannot tell
    pub last_modified: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub year: i32,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// Newest (year, month) first
    pub photos: Vec<ManifestPhoto>,
    /// Oldest year first
    pub timeline: Vec<TimelineEntry>,
    pub generated_at: String,
    pub total_photos: usize,
}

/// Build the manifest from the current contents of the store.
///
/// Keys that do not look like `media/YYYY/MM/<file>` are skipped.
pub fn build_manifest(store: &dyn ObjectStore) -> Result<Manifest, StorageError> {
    let mut photos = Vec::new();

    for object in store.list("media/")? {
        let parts: Vec<&str> = object.key.split('/').collect();
        let [_, year, month, filename] = parts.as_slice() else {
            warn!(key = %object.key, "unexpected media key, skipping");
            continue;
        };
        let (Ok(year), Ok(month)) = (year.parse::<i32>(), month.parse::<u32>()) else {
            warn!(key = %object.key, "media key without a year/month, skipping");
            continue;
        };

        photos.push(ManifestPhoto {
            id: object.key.clone(),
            path: object.key.clone(),
            year,
            month,
            filename: filename.to_string(),
            size: object.size,
            last_modified: object.last_modified.map(|t| t.to_rfc3339()),
        });
    }

    // Stable sort keeps key order inside a month.
    photos.sort_by(|a, b| (b.year, b.month).cmp(&(a.year, a.month)));

    let mut counts: BTreeMap<i32, usize> = BTreeMap::new();
    for photo in &photos {
        *counts.entry(photo.year).or_default() += 1;
    }
    let timeline = counts
        .into_iter()
        .map(|(year, count)| TimelineEntry { year, count })
        .collect();

    Ok(Manifest {
        total_photos: photos.len(),
        photos,
        timeline,
        generated_at: Local::now().to_rfc3339(),
    })
}

/// Build the manifest and store it as `manifest.json`
pub fn publish_manifest(store: &dyn ObjectStore) -> Result<Manifest, StorageError> {
    let manifest = build_manifest(store)?;
    let json = serde_json::to_vec_pretty(&manifest)?;
    store.put(MANIFEST_KEY, &json, "application/json")?;

    info!(total_photos = manifest.total_photos, "manifest uploaded");
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::storage::LocalObjectStore;
    use tempfile::TempDir;

    fn store_with(keys: &[&str]) -> (TempDir, LocalObjectStore) {
        let dir = TempDir::new().unwrap();
        let store = LocalObjectStore::open(dir.path()).unwrap();
        for key in keys {
            store.put(key, b"data", "application/octet-stream").unwrap();
        }
        (dir, store)
    }

    #[test]
    fn photos_newest_first_and_timeline_oldest_first() {
        let (_dir, store) = store_with(&[
            "media/2021/03/a.jpg",
            "media/2023/01/b.jpg",
            "media/2023/11/c.mp4",
            "media/2021/12/d.png",
            "thumbnails/2023/11/c.jpg",
        ]);

        let manifest = build_manifest(&store).unwrap();

        let order: Vec<_> = manifest.photos.iter().map(|p| p.filename.as_str()).collect();
        assert_eq!(order, vec!["c.mp4", "b.jpg", "d.png", "a.jpg"]);
        assert_eq!(
            manifest.timeline,
            vec![
                TimelineEntry { year: 2021, count: 2 },
                TimelineEntry { year: 2023, count: 2 }
            ]
        );
        assert_eq!(manifest.total_photos, 4);
        assert_eq!(manifest.photos[0].id, "media/2023/11/c.mp4");
        assert_eq!(manifest.photos[0].size, 4);
    }

    #[test]
    fn malformed_media_keys_are_skipped() {
        let (_dir, store) = store_with(&["media/loose.jpg", "media/xx/01/a.jpg", "media/2020/05/ok.jpg"]);
        let manifest = build_manifest(&store).unwrap();
        assert_eq!(manifest.total_photos, 1);
    }

    #[test]
    fn publish_writes_manifest_object() {
        let (_dir, store) = store_with(&["media/2020/05/ok.jpg"]);
        publish_manifest(&store).unwrap();

        let bytes = std::fs::read(store.path_for(MANIFEST_KEY).unwrap()).unwrap();
        let parsed: Manifest = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed.total_photos, 1);
        assert_eq!(parsed.photos[0].year, 2020);
    }

    #[test]
    fn empty_store_gives_empty_manifest() {
        let (_dir, store) = store_with(&[]);
        let manifest = build_manifest(&store).unwrap();
        assert!(manifest.photos.is_empty());
        assert!(manifest.timeline.is_empty());
    }
}
