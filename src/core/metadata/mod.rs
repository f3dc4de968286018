//! # Metadata Module
//!
//! Creation-time lookup for media files.
//!
//! ## Providers
//! - [`FileTimes`] - filesystem creation time, falling back to mtime
//! - [`CaptureDate`] - when the picture or clip was actually taken:
//!   - JPEG/PNG: EXIF `DateTimeOriginal`
//!   - Video: `ffprobe` container `creation_time`, then `exiftool`
//!   - HEIC/HEIF: `exiftool` date tags
//!
//! Every provider ends at the file's modification time, so lookups never fail.

mod exif_date;
mod probe;

pub use exif_date::exif_date_taken;
pub use probe::{parse_exiftool_json, parse_ffprobe_json, MediaProbe};

use crate::core::scanner::MediaFormat;
use crate::error::MetadataError;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::Path;
use std::time::SystemTime;
use tracing::{debug, warn};

/// Resolves the moment a media file came into being
pub trait CreationTimeProvider: Send + Sync {
    /// Never fails: falls back to the modification time, then the Unix epoch
    fn creation_time(&self, path: &Path) -> DateTime<Utc>;
}

/// Filesystem timestamps only
#[derive(Debug, Clone, Copy, Default)]
pub struct FileTimes;

impl CreationTimeProvider for FileTimes {
    fn creation_time(&self, path: &Path) -> DateTime<Utc> {
        let created = fs::metadata(path)
            .and_then(|meta| meta.created().or_else(|_| meta.modified()))
            .map(DateTime::<Utc>::from);

        match created {
            Ok(time) => time,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "no filesystem timestamp");
                epoch()
            }
        }
    }
}

/// Capture date from embedded metadata
#[derive(Debug, Clone, Default)]
pub struct CaptureDate {
    probe: MediaProbe,
}

impl CaptureDate {
    pub fn new(probe: MediaProbe) -> Self {
        Self { probe }
    }

    /// Embedded date only, without the mtime fallback
    pub fn embedded_date(&self, path: &Path) -> Result<DateTime<Utc>, MetadataError> {
        let format = MediaFormat::from_path(path);
        if format.is_video() {
            self.probe.ffprobe_creation_time(path).or_else(|e| {
                debug!(path = %path.display(), error = %e, "ffprobe gave no date, trying exiftool");
                self.probe.exiftool_date(path)
            })
        } else if format == MediaFormat::Heic {
            self.probe.exiftool_date(path)
        } else {
            exif_date_taken(path)
        }
    }
}

impl CreationTimeProvider for CaptureDate {
    fn creation_time(&self, path: &Path) -> DateTime<Utc> {
        match self.embedded_date(path).or_else(|e| {
            debug!(path = %path.display(), error = %e, "falling back to modification time");
            modified_time(path)
        }) {
            Ok(time) => time,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "no usable timestamp");
                epoch()
            }
        }
    }
}

/// The file's modification time
pub fn modified_time(path: &Path) -> Result<DateTime<Utc>, MetadataError> {
    fs::metadata(path)
        .and_then(|meta| meta.modified())
        .map(DateTime::<Utc>::from)
        .map_err(|source| MetadataError::Io {
            path: path.to_path_buf(),
            source,
        })
}

fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::from(SystemTime::UNIX_EPOCH)
}
