//! # Error Module
//!
//! Error types for the media sieve.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, file names, what went wrong
//! - **Per-file failures are records, not aborts** - the pipeline converts
//!   `HashError`, `MetadataError` and `SinkError` into failure entries and
//!   keeps going

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum MediaSieveError {
    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Hashing error: {0}")]
    Hash(#[from] HashError),

    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Output error: {0}")]
    Sink(#[from] SinkError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Conversion error: {0}")]
    Convert(#[from] ConvertError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to encode JSON output: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that occur during media scanning
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Permission denied accessing: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to read directory {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that occur during image hashing
#[derive(Error, Debug)]
pub enum HashError {
    #[error("Unsupported image format: {path}")]
    UnsupportedFormat { path: PathBuf },

    #[error("Failed to decode image {path}: {reason}")]
    DecodeError { path: PathBuf, reason: String },

    #[error("Image is empty or corrupted: {path}")]
    EmptyImage { path: PathBuf },

    #[error("Failed to open image file {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from creation-time lookups.
///
/// Always recoverable: providers fall back to the file's modification time.
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("No capture date recorded in {path}")]
    NoDate { path: PathBuf },

    #[error("Unreadable date {value:?} in {path}")]
    BadDate { path: PathBuf, value: String },

    #[error("Failed to read metadata for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Metadata tool failed for {path}: {source}")]
    Tool {
        path: PathBuf,
        #[source]
        source: ToolError,
    },
}

/// Errors from running an external program (ffmpeg, ffprobe, exiftool, sips)
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("{program} could not be started: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} timed out after {timeout:?}")]
    Timeout { program: String, timeout: Duration },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("{program} produced unreadable output: {reason}")]
    Output { program: String, reason: String },
}

/// Errors from format conversion (HEIC, thumbnails, favicon)
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Failed to convert {path}: {source}")]
    Tool {
        path: PathBuf,
        #[source]
        source: ToolError,
    },

    #[error("Failed to process image {path}: {reason}")]
    Image { path: PathBuf, reason: String },

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised by a group sink (copy, upload, report)
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Failed to copy {from} to {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to upload {path}: {source}")]
    Upload {
        path: PathBuf,
        #[source]
        source: StorageError,
    },

    #[error("Conversion failed: {0}")]
    Convert(#[from] ConvertError),

    #[error("Failed to write report {path}: {source}")]
    Report {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from the object store
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Invalid object key: {key}")]
    InvalidKey { key: String },

    #[error("Object store I/O failed for {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize manifest: {0}")]
    Manifest(#[from] serde_json::Error),
}

/// Run-level pipeline errors
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("No media files found in {}", display_paths(.paths))]
    NoInput { paths: Vec<PathBuf> },

    #[error("Run was cancelled")]
    Cancelled,

    #[error("Failed to build worker pool: {0}")]
    WorkerPool(String),
}

impl ScanError {
    /// The file or directory the error is about
    pub fn path(&self) -> &std::path::Path {
        match self {
            ScanError::DirectoryNotFound { path }
            | ScanError::PermissionDenied { path }
            | ScanError::ReadDirectory { path, .. } => path,
        }
    }
}

impl ConvertError {
    pub fn path(&self) -> &std::path::Path {
        match self {
            ConvertError::Tool { path, .. }
            | ConvertError::Image { path, .. }
            | ConvertError::Io { path, .. } => path,
        }
    }
}

impl SinkError {
    /// The file the sink was working on when it failed
    pub fn path(&self) -> &std::path::Path {
        match self {
            SinkError::Copy { from, .. } => from,
            SinkError::Read { path, .. }
            | SinkError::Upload { path, .. }
            | SinkError::Report { path, .. } => path,
            SinkError::Convert(e) => e.path(),
        }
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, MediaSieveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_error_includes_path() {
        let error = ScanError::DirectoryNotFound {
            path: PathBuf::from("/photos/vacation"),
        };
        let message = error.to_string();
        assert!(message.contains("/photos/vacation"));
    }

    #[test]
    fn hash_error_includes_path() {
        let error = HashError::DecodeError {
            path: PathBuf::from("/photos/broken.jpg"),
            reason: "invalid JPEG".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("/photos/broken.jpg"));
        assert!(message.contains("invalid JPEG"));
    }

    #[test]
    fn no_input_lists_directories() {
        let error = PipelineError::NoInput {
            paths: vec![PathBuf::from("/a"), PathBuf::from("/b")],
        };
        assert_eq!(error.to_string(), "No media files found in /a, /b");
    }

    #[test]
    fn tool_timeout_mentions_program() {
        let error = ToolError::Timeout {
            program: "ffmpeg".to_string(),
            timeout: Duration::from_secs(15),
        };
        assert!(error.to_string().contains("ffmpeg"));
    }
}
