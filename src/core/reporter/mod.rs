//! # Reporter Module
//!
//! HTML report of the duplicate sets a dedupe run found.
//!
//! Every group with more than one member gets a card showing the kept
//! image next to the removed ones. Images are copied beside `report.html`
//! as `group_<n>_kept_<name>` / `group_<n>_removed_<name>` so the report
//! can be opened offline; HEIC images are converted to JPEG for browsers.

mod html;

pub use html::render_html;

use crate::core::comparator::{MatchType, Selection};
use crate::core::convert::HeicConverter;
use crate::core::scanner::MediaFormat;
use crate::core::sink::GroupSink;
use crate::error::SinkError;
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const REPORT_FILE: &str = "report.html";

/// One image card
#[derive(Debug, Clone)]
pub struct ReportImage {
    pub source: PathBuf,
    /// File name inside the report directory
    pub file_name: String,
    /// False when the copy into the report directory failed
    pub available: bool,
}

/// One duplicate set
#[derive(Debug, Clone)]
pub struct ReportGroup {
    /// 1-based position in the report
    pub number: usize,
    pub match_type: MatchType,
    pub kept: ReportImage,
    pub removed: Vec<ReportImage>,
}

impl ReportGroup {
    pub fn len(&self) -> usize {
        1 + self.removed.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Kept,
    Removed,
}

impl Role {
    fn label(&self) -> &'static str {
        match self {
            Role::Kept => "kept",
            Role::Removed => "removed",
        }
    }
}

/// Collects duplicate sets and writes `report.html` on finish
pub struct HtmlReportSink {
    report_dir: PathBuf,
    title: String,
    converter: HeicConverter,
    groups: Vec<ReportGroup>,
}

impl HtmlReportSink {
    pub fn new(report_dir: impl Into<PathBuf>) -> Self {
        Self {
            report_dir: report_dir.into(),
            title: "Duplicate Images Report".to_string(),
            converter: HeicConverter::default(),
            groups: Vec::new(),
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn report_path(&self) -> PathBuf {
        self.report_dir.join(REPORT_FILE)
    }

    fn report_error(&self, path: &Path, source: std::io::Error) -> SinkError {
        SinkError::Report {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Copy one image next to the report
    fn stage(&self, number: usize, role: Role, source: &Path) -> (ReportImage, Option<SinkError>) {
        let original = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let heic = MediaFormat::from_path(source) == MediaFormat::Heic;
        let name = if heic {
            let stem = Path::new(&original)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| original.clone());
            format!("{}.jpg", stem)
        } else {
            original
        };
        let file_name = format!("group_{}_{}_{}", number, role.label(), name);
        let destination = self.report_dir.join(&file_name);

        let result = if heic {
            self.converter.to_jpeg_file(source, &destination).map_err(SinkError::from)
        } else {
            fs::copy(source, &destination)
                .map(|_| ())
                .map_err(|e| self.report_error(source, e))
        };

        let error = result.err();
        if let Some(e) = &error {
            warn!(path = %source.display(), "report image unavailable: {e}");
        }

        let image = ReportImage {
            source: source.to_path_buf(),
            file_name,
            available: error.is_none(),
        };
        (image, error)
    }
}

impl GroupSink for HtmlReportSink {
    fn name(&self) -> &'static str {
        "report"
    }

    fn accept(&mut self, selection: &Selection) -> Result<(), SinkError> {
        if !selection.is_duplicate_set() {
            return Ok(());
        }
        fs::create_dir_all(&self.report_dir).map_err(|e| self.report_error(&self.report_dir, e))?;

        let number = self.groups.len() + 1;
        let mut first_error = None;

        let (kept, error) = self.stage(number, Role::Kept, &selection.kept.path);
        first_error = first_error.or(error);

        let mut removed = Vec::with_capacity(selection.removed.len());
        for file in &selection.removed {
            let (image, error) = self.stage(number, Role::Removed, &file.path);
            first_error = first_error.or(error);
            removed.push(image);
        }

        self.groups.push(ReportGroup {
            number,
            match_type: selection.match_type(),
            kept,
            removed,
        });

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        let path = self.report_path();
        fs::create_dir_all(&self.report_dir).map_err(|e| self.report_error(&path, e))?;

        let file = fs::File::create(&path).map_err(|e| self.report_error(&path, e))?;
        render_html(&self.groups, &self.title, BufWriter::new(file)).map_err(|e| self.report_error(&path, e))?;

        info!(groups = self.groups.len(), path = %path.display(), "HTML report written");
        Ok(())
    }
}
