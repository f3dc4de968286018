//! Copy kept files to an output directory.

use super::GroupSink;
use crate::core::comparator::Selection;
use crate::core::convert::HeicConverter;
use crate::core::scanner::MediaFormat;
use crate::error::SinkError;
use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Copies the kept file of every selection into `output_dir`.
///
/// Two kept files with the same name get `_1`, `_2`, ... suffixes. Files
/// left in the directory by an earlier run are overwritten.
pub struct CopySink {
    output_dir: PathBuf,
    convert_heic: bool,
    converter: HeicConverter,
    claimed: HashSet<OsString>,
    copied: usize,
}

impl CopySink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            convert_heic: false,
            converter: HeicConverter::default(),
            claimed: HashSet::new(),
            copied: 0,
        }
    }

    /// Write HEIC/HEIF files as JPEG
    pub fn convert_heic(mut self, convert: bool) -> Self {
        self.convert_heic = convert;
        self
    }

    pub fn converter(mut self, converter: HeicConverter) -> Self {
        self.converter = converter;
        self
    }

    pub fn copied(&self) -> usize {
        self.copied
    }

    /// First free name among `stem.ext`, `stem_1.ext`, `stem_2.ext`, ...
    fn claim_name(&mut self, stem: &str, ext: &str) -> OsString {
        let mut n = 0;
        loop {
            let candidate = match (n, ext.is_empty()) {
                (0, true) => stem.to_string(),
                (0, false) => format!("{}.{}", stem, ext),
                (_, true) => format!("{}_{}", stem, n),
                (_, false) => format!("{}_{}.{}", stem, n, ext),
            };
            let candidate = OsString::from(candidate);
            if self.claimed.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}

impl GroupSink for CopySink {
    fn name(&self) -> &'static str {
        "copy"
    }

    fn accept(&mut self, selection: &Selection) -> Result<(), SinkError> {
        let source = &selection.kept.path;
        let copy_error = |to: &Path, e: std::io::Error| SinkError::Copy {
            from: source.clone(),
            to: to.to_path_buf(),
            source: e,
        };

        fs::create_dir_all(&self.output_dir).map_err(|e| copy_error(&self.output_dir, e))?;

        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unnamed".to_string());
        let ext = source
            .extension()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let convert = self.convert_heic && MediaFormat::from_path(source) == MediaFormat::Heic;
        let name = if convert {
            self.claim_name(&stem, "jpg")
        } else {
            self.claim_name(&stem, &ext)
        };
        let destination = self.output_dir.join(name);

        if convert {
            self.converter.to_jpeg_file(source, &destination)?;
        } else {
            fs::copy(source, &destination).map_err(|e| copy_error(&destination, e))?;
            preserve_mtime(source, &destination);
        }

        debug!(from = %source.display(), to = %destination.display(), "copied");
        self.copied += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        info!(copied = self.copied, dir = %self.output_dir.display(), "copy finished");
        Ok(())
    }
}

/// Best effort: carry the source's modification time over to the copy
fn preserve_mtime(source: &Path, destination: &Path) {
    let modified = fs::metadata(source).and_then(|m| m.modified());
    if let Ok(modified) = modified {
        let result = fs::File::options()
            .write(true)
            .open(destination)
            .and_then(|f| f.set_modified(modified));
        if let Err(e) = result {
            debug!(path = %destination.display(), error = %e, "could not preserve mtime");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::comparator::FingerprintedFile;
    use chrono::Utc;
    use tempfile::TempDir;

    fn selection(kept: &Path) -> Selection {
        Selection {
            group_id: 0,
            max_distance: 0,
            kept: FingerprintedFile::new(kept, None, Utc::now()),
            removed: Vec::new(),
        }
    }

    #[test]
    fn copies_kept_file() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("in").join("a.jpg");
        fs::create_dir_all(source.parent().unwrap()).unwrap();
        fs::write(&source, b"jpeg bytes").unwrap();
        let out = dir.path().join("out");

        let mut sink = CopySink::new(&out);
        sink.accept(&selection(&source)).unwrap();

        assert_eq!(fs::read(out.join("a.jpg")).unwrap(), b"jpeg bytes");
        assert_eq!(sink.copied(), 1);
    }

    #[test]
    fn name_collisions_get_numbered() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out");
        let mut sink = CopySink::new(&out);

        for sub in ["x", "y", "z"] {
            let source = dir.path().join(sub).join("IMG_0001.JPG");
            fs::create_dir_all(source.parent().unwrap()).unwrap();
            fs::write(&source, sub.as_bytes()).unwrap();
            sink.accept(&selection(&source)).unwrap();
        }

        assert_eq!(fs::read(out.join("IMG_0001.JPG")).unwrap(), b"x");
        assert_eq!(fs::read(out.join("IMG_0001_1.JPG")).unwrap(), b"y");
        assert_eq!(fs::read(out.join("IMG_0001_2.JPG")).unwrap(), b"z");
    }

    #[test]
    fn missing_source_is_copy_error() {
        let dir = TempDir::new().unwrap();
        let mut sink = CopySink::new(dir.path());

        let result = sink.accept(&selection(Path::new("/nonexistent/a.jpg")));
        assert!(matches!(result, Err(SinkError::Copy { .. })));
    }

    #[test]
    fn claim_name_without_extension() {
        let mut sink = CopySink::new("/unused");
        assert_eq!(sink.claim_name("README", ""), OsString::from("README"));
        assert_eq!(sink.claim_name("README", ""), OsString::from("README_1"));
    }
}
