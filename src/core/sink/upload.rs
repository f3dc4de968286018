//! Upload kept files, thumbnails and the manifest to an object store.

use super::GroupSink;
use crate::core::comparator::Selection;
use crate::core::convert::{HeicConverter, Thumbnail, ThumbnailMaker, VideoThumbnailer};
use crate::core::scanner::MediaFormat;
use crate::core::storage::{publish_manifest, MediaKey, ObjectStore, MANIFEST_KEY};
use crate::error::{ConvertError, SinkError, StorageError};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Upload behaviour
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Store HEIC/HEIF as JPEG
    pub convert_heic: bool,
    pub video_thumbnails: bool,
    /// Regenerate `manifest.json` when the run finishes
    pub publish_manifest: bool,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            convert_heic: true,
            video_thumbnails: true,
            publish_manifest: true,
        }
    }
}

pub struct UploadSink {
    store: Box<dyn ObjectStore>,
    config: UploadConfig,
    heic: HeicConverter,
    thumbnails: ThumbnailMaker,
    video: VideoThumbnailer,
    uploaded: usize,
    uploaded_bytes: u64,
    thumbnails_skipped: usize,
}

impl UploadSink {
    pub fn new(store: Box<dyn ObjectStore>, config: UploadConfig) -> Self {
        Self {
            store,
            config,
            heic: HeicConverter::default(),
            thumbnails: ThumbnailMaker::default(),
            video: VideoThumbnailer::default(),
            uploaded: 0,
            uploaded_bytes: 0,
            thumbnails_skipped: 0,
        }
    }

    pub fn uploaded(&self) -> usize {
        self.uploaded
    }

    fn put(&mut self, source: &Path, key: &str, bytes: &[u8], content_type: &str) -> Result<(), SinkError> {
        self.store
            .put(key, bytes, content_type)
            .map_err(|e| SinkError::Upload {
                path: source.to_path_buf(),
                source: e,
            })?;
        self.uploaded_bytes += bytes.len() as u64;
        Ok(())
    }

    /// `Ok(None)` when thumbnails are disabled for this kind of file
    fn thumbnail(&self, path: &Path, format: MediaFormat, jpeg: Option<&[u8]>) -> Result<Option<Thumbnail>, ConvertError> {
        if format.is_video() {
            if !self.config.video_thumbnails {
                return Ok(None);
            }
            return self.video.thumbnail(path).map(Some);
        }

        match jpeg {
            Some(bytes) => {
                let image = image::load_from_memory(bytes).map_err(|e| ConvertError::Image {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })?;
                self.thumbnails.render(&image, path).map(Some)
            }
            None => self.thumbnails.render_file(path).map(Some),
        }
    }
}

impl GroupSink for UploadSink {
    fn name(&self) -> &'static str {
        "upload"
    }

    fn accept(&mut self, selection: &Selection) -> Result<(), SinkError> {
        let path: PathBuf = selection.kept.path.clone();
        let format = MediaFormat::from_path(&path);

        let bytes = fs::read(&path).map_err(|source| SinkError::Read {
            path: path.clone(),
            source,
        })?;
        let key = MediaKey::new(selection.kept.created, &bytes);

        let converted = if format == MediaFormat::Heic && self.config.convert_heic {
            let jpeg = self.heic.to_jpeg_bytes(&path)?;
            self.put(&path, &key.media(".jpg"), &jpeg, "image/jpeg")?;
            Some(jpeg)
        } else {
            let ext = path
                .extension()
                .map(|e| format!(".{}", e.to_string_lossy()))
                .unwrap_or_default();
            self.put(&path, &key.media(&ext), &bytes, format.content_type())?;
            None
        };

        match self.thumbnail(&path, format, converted.as_deref()) {
            Ok(Some(thumb)) => self.put(&path, &key.thumbnail(), &thumb.bytes, thumb.content_type())?,
            Ok(None) => debug!(path = %path.display(), "thumbnail skipped"),
            Err(e) => {
                self.thumbnails_skipped += 1;
                warn!(path = %path.display(), "thumbnail failed, skipping: {e}");
            }
        }

        self.uploaded += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        info!(
            uploaded = self.uploaded,
            bytes = self.uploaded_bytes,
            thumbnails_skipped = self.thumbnails_skipped,
            "upload finished"
        );

        if self.config.publish_manifest {
            publish_manifest(self.store.as_ref()).map_err(|source: StorageError| SinkError::Upload {
                path: PathBuf::from(MANIFEST_KEY),
                source,
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::comparator::FingerprintedFile;
    use crate::core::storage::{content_hash10, LocalObjectStore};
    use chrono::{TimeZone, Utc};
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    fn selection(path: &Path) -> Selection {
        Selection {
            group_id: 0,
            max_distance: 0,
            kept: FingerprintedFile::new(path, None, Utc.with_ymd_and_hms(2022, 7, 3, 9, 0, 0).unwrap()),
            removed: Vec::new(),
        }
    }

    #[test]
    fn uploads_image_thumbnail_and_manifest() {
        let dir = TempDir::new().unwrap();
        let photo = dir.path().join("beach.png");
        RgbImage::from_fn(600, 400, |x, y| Rgb([(x % 255) as u8, (y % 255) as u8, 90]))
            .save(&photo)
            .unwrap();
        let bucket = dir.path().join("bucket");
        let store = LocalObjectStore::open(&bucket).unwrap();

        let mut sink = UploadSink::new(Box::new(store.clone()), UploadConfig::default());
        sink.accept(&selection(&photo)).unwrap();
        sink.finish().unwrap();

        let hash = content_hash10(&fs::read(&photo).unwrap());
        let keys: Vec<_> = store.list("").unwrap().into_iter().map(|o| o.key).collect();
        assert!(keys.contains(&format!("media/2022/07/{}.png", hash)));
        assert!(keys.contains(&format!("thumbnails/2022/07/{}.jpg", hash)));
        assert!(keys.contains(&MANIFEST_KEY.to_string()));
        assert_eq!(sink.uploaded(), 1);
    }

    #[test]
    fn broken_thumbnail_does_not_fail_upload() {
        let dir = TempDir::new().unwrap();
        let photo = dir.path().join("broken.jpg");
        fs::write(&photo, b"not a jpeg").unwrap();
        let store = LocalObjectStore::open(dir.path().join("bucket")).unwrap();

        let config = UploadConfig {
            publish_manifest: false,
            ..UploadConfig::default()
        };
        let mut sink = UploadSink::new(Box::new(store.clone()), config);
        sink.accept(&selection(&photo)).unwrap();

        assert_eq!(store.list("media/").unwrap().len(), 1);
        assert!(store.list("thumbnails/").unwrap().is_empty());
    }

    #[test]
    fn disabled_video_thumbnails_upload_only_the_clip() {
        let dir = TempDir::new().unwrap();
        let clip = dir.path().join("clip.MOV");
        fs::write(&clip, b"moov").unwrap();
        let store = LocalObjectStore::open(dir.path().join("bucket")).unwrap();

        let config = UploadConfig {
            video_thumbnails: false,
            publish_manifest: false,
            ..UploadConfig::default()
        };
        let mut sink = UploadSink::new(Box::new(store.clone()), config);
        sink.accept(&selection(&clip)).unwrap();

        let keys: Vec<_> = store.list("").unwrap().into_iter().map(|o| o.key).collect();
        assert_eq!(keys.len(), 1);
        assert!(keys[0].ends_with(".mov"));
    }

    #[test]
    fn unreadable_file_is_read_error() {
        let dir = TempDir::new().unwrap();
        let store = LocalObjectStore::open(dir.path()).unwrap();
        let mut sink = UploadSink::new(Box::new(store), UploadConfig::default());

        let result = sink.accept(&selection(Path::new("/nonexistent/a.jpg")));
        assert!(matches!(result, Err(SinkError::Read { .. })));
    }
}
