//! File filtering logic for the scanner.

use super::MediaFormat;
use std::collections::HashSet;
use std::path::Path;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "heic", "heif"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "m4v"];
const SKIP_FILES: &[&str] = &[".ds_store", "thumbs.db"];

/// Decides which files the scanner reports
pub struct MediaFilter {
    extensions: HashSet<String>,
    include_hidden: bool,
}

impl MediaFilter {
    /// Accept images only
    pub fn images() -> Self {
        Self::from_extensions(IMAGE_EXTENSIONS.iter().copied())
    }

    /// Accept images and videos
    pub fn media() -> Self {
        Self::from_extensions(IMAGE_EXTENSIONS.iter().chain(VIDEO_EXTENSIONS).copied())
    }

    fn from_extensions<'a>(extensions: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            extensions: extensions.into_iter().map(str::to_string).collect(),
            include_hidden: false,
        }
    }

    /// Include hidden files (starting with .)
    pub fn with_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// Check if a file should be included
    pub fn should_include(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };

        let lower = name.to_lowercase();
        if SKIP_FILES.contains(&lower.as_str()) {
            return false;
        }

        if !self.include_hidden && name.starts_with('.') {
            return false;
        }

        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.extensions.contains(&ext.to_lowercase()))
            .unwrap_or(false)
    }

    /// Get the media format for a path
    pub fn get_format(&self, path: &Path) -> MediaFormat {
        MediaFormat::from_path(path)
    }
}

impl Default for MediaFilter {
    fn default() -> Self {
        Self::images()
    }
}
