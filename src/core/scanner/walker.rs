//! Directory walking implementation using walkdir.

use super::{filter::MediaFilter, MediaFile, MediaScanner, ScanResult};
use crate::error::ScanError;
use crate::events::{Event, EventSender, ScanEvent};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Configuration for the directory scanner
#[derive(Debug, Clone, Default)]
pub struct ScanConfig {
    /// Whether to follow symbolic links
    pub follow_symlinks: bool,
    /// Whether to include hidden files and directories
    pub include_hidden: bool,
    /// Descend into subdirectories
    pub recursive: bool,
    /// Report videos as well as images
    pub include_videos: bool,
}

/// Scanner implementation using the walkdir crate
pub struct WalkDirScanner {
    config: ScanConfig,
    filter: MediaFilter,
}

impl WalkDirScanner {
    /// Create a new scanner with the given configuration
    pub fn new(config: ScanConfig) -> Self {
        let filter = if config.include_videos {
            MediaFilter::media()
        } else {
            MediaFilter::images()
        }
        .with_hidden(config.include_hidden);

        Self { config, filter }
    }

    fn scan_directory(
        &self,
        root: &Path,
        events: &EventSender,
    ) -> Result<(Vec<MediaFile>, Vec<ScanError>), ScanError> {
        if !root.is_dir() {
            return Err(ScanError::DirectoryNotFound {
                path: root.to_path_buf(),
            });
        }

        let mut files = Vec::new();
        let mut errors = Vec::new();

        let mut walker = WalkDir::new(root).follow_links(self.config.follow_symlinks);
        if !self.config.recursive {
            walker = walker.max_depth(1);
        }

        let include_hidden = self.config.include_hidden;
        let entries = walker.into_iter().filter_entry(|entry| {
            include_hidden
                || entry.depth() == 0
                || !entry.file_type().is_dir()
                || !entry.file_name().to_string_lossy().starts_with('.')
        });

        for entry_result in entries {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                    let error = if e.io_error().map(|io| io.kind())
                        == Some(std::io::ErrorKind::PermissionDenied)
                    {
                        ScanError::PermissionDenied { path: path.clone() }
                    } else {
                        ScanError::ReadDirectory {
                            path: path.clone(),
                            source: std::io::Error::other(e.to_string()),
                        }
                    };
                    warn!(path = %path.display(), "{error}");
                    events.send(Event::Scan(ScanEvent::Error {
                        path,
                        message: error.to_string(),
                    }));
                    errors.push(error);
                    continue;
                }
            };

            let path = entry.path();
            if entry.file_type().is_dir() || !self.filter.should_include(path) {
                continue;
            }

            match fs::metadata(path) {
                Ok(metadata) => files.push(MediaFile {
                    path: path.to_path_buf(),
                    size: metadata.len(),
                    modified: metadata
                        .modified()
                        .unwrap_or(std::time::SystemTime::UNIX_EPOCH),
                    format: self.filter.get_format(path),
                }),
                Err(e) => {
                    let error = ScanError::ReadDirectory {
                        path: path.to_path_buf(),
                        source: e,
                    };
                    events.send(Event::Scan(ScanEvent::Error {
                        path: path.to_path_buf(),
                        message: error.to_string(),
                    }));
                    errors.push(error);
                }
            }
        }

        debug!(root = %root.display(), found = files.len(), "scanned directory");
        Ok((files, errors))
    }
}

impl MediaScanner for WalkDirScanner {
    fn scan_with_events(&self, paths: &[PathBuf], events: &EventSender) -> ScanResult {
        events.send(Event::Scan(ScanEvent::Started {
            paths: paths.to_vec(),
        }));

        let mut result = ScanResult::default();

        for path in paths {
            match self.scan_directory(path, events) {
                Ok((files, errors)) => {
                    result.files.extend(files);
                    result.errors.extend(errors);
                }
                Err(e) => {
                    warn!("{e}");
                    result.errors.push(e);
                }
            }
        }

        result.files.sort_by(|a, b| a.path.cmp(&b.path));
        result.files.dedup_by(|a, b| a.path == b.path);

        let videos = result.files.iter().filter(|f| f.is_video()).count();
        events.send(Event::Scan(ScanEvent::Completed {
            images: result.files.len() - videos,
            videos,
        }));

        result
    }
}
