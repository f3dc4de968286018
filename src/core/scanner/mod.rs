//! # Scanner Module
//!
//! Discovers photo and video files in directories.
//!
//! ## Supported Formats
//! - Images: JPEG (.jpg, .jpeg), PNG (.png), HEIC/HEIF (.heic, .heif)
//! - Videos: MP4 (.mp4), QuickTime (.mov), AVI (.avi), M4V (.m4v)
//!
//! Hidden files and OS clutter (`.DS_Store`, `Thumbs.db`) are skipped.

mod filter;
mod walker;

pub use filter::MediaFilter;
pub use walker::{ScanConfig, WalkDirScanner};

use crate::error::ScanError;
use crate::events::EventSender;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// A discovered media file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaFile {
    /// Path to the file; doubles as its identifier
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Last modified time
    pub modified: SystemTime,
    /// Detected format
    pub format: MediaFormat,
}

impl MediaFile {
    pub fn is_image(&self) -> bool {
        self.format.is_image()
    }

    pub fn is_video(&self) -> bool {
        self.format.is_video()
    }
}

/// Media formats the tools understand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaFormat {
    Jpeg,
    Png,
    Heic,
    Mp4,
    Mov,
    Avi,
    M4v,
    Unknown,
}

impl MediaFormat {
    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => MediaFormat::Jpeg,
            "png" => MediaFormat::Png,
            "heic" | "heif" => MediaFormat::Heic,
            "mp4" => MediaFormat::Mp4,
            "mov" => MediaFormat::Mov,
            "avi" => MediaFormat::Avi,
            "m4v" => MediaFormat::M4v,
            _ => MediaFormat::Unknown,
        }
    }

    /// Detect format from a path's extension
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(MediaFormat::Unknown)
    }

    pub fn is_image(&self) -> bool {
        matches!(self, MediaFormat::Jpeg | MediaFormat::Png | MediaFormat::Heic)
    }

    pub fn is_video(&self) -> bool {
        matches!(
            self,
            MediaFormat::Mp4 | MediaFormat::Mov | MediaFormat::Avi | MediaFormat::M4v
        )
    }

    /// MIME type used when storing the file unchanged
    pub fn content_type(&self) -> &'static str {
        match self {
            MediaFormat::Jpeg => "image/jpeg",
            MediaFormat::Png => "image/png",
            MediaFormat::Heic => "image/heic",
            MediaFormat::Mp4 => "video/mp4",
            MediaFormat::Mov => "video/quicktime",
            MediaFormat::Avi => "video/x-msvideo",
            MediaFormat::M4v => "video/x-m4v",
            MediaFormat::Unknown => "application/octet-stream",
        }
    }
}

/// Result of a scan operation
#[derive(Debug, Default)]
pub struct ScanResult {
    /// Discovered files, sorted by path
    pub files: Vec<MediaFile>,
    /// Errors that occurred during scanning (non-fatal)
    pub errors: Vec<ScanError>,
}

/// Trait for media scanners
///
/// Implement this trait to feed the pipeline from somewhere other than
/// the local filesystem (tests use an in-memory list).
pub trait MediaScanner: Send + Sync {
    /// Scan with progress reporting via events
    fn scan_with_events(&self, paths: &[PathBuf], events: &EventSender) -> ScanResult;

    /// Scan directories and return discovered files
    fn scan(&self, paths: &[PathBuf]) -> ScanResult {
        self.scan_with_events(paths, &crate::events::null_sender())
    }
}
