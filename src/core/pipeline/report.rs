//! Run results.

use crate::core::comparator::Selection;
use crate::events::PipelineSummary;
use serde::Serialize;
use std::path::PathBuf;

/// Where in the run a file failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureStage {
    Scan,
    Hash,
    Deliver,
}

impl std::fmt::Display for FailureStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureStage::Scan => write!(f, "scan"),
            FailureStage::Hash => write!(f, "hash"),
            FailureStage::Deliver => write!(f, "deliver"),
        }
    }
}

/// One per-file failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub stage: FailureStage,
    pub reason: String,
    /// The file appears in no selection
    pub excluded: bool,
}

/// Everything a run produced
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    /// One per group, in grouping order
    pub selections: Vec<Selection>,
    pub failures: Vec<FileFailure>,
    /// Media files handed to the pipeline
    pub processed: usize,
    pub duration_ms: u64,
}

impl PipelineReport {
    pub fn kept(&self) -> usize {
        self.selections.len()
    }

    pub fn removed(&self) -> usize {
        self.selections.iter().map(|s| s.removed.len()).sum()
    }

    pub fn duplicate_sets(&self) -> impl Iterator<Item = &Selection> {
        self.selections.iter().filter(|s| s.is_duplicate_set())
    }

    /// Failures for files that were dropped from the output entirely
    pub fn excluded(&self) -> impl Iterator<Item = &FileFailure> {
        self.failures.iter().filter(|f| f.excluded)
    }

    pub fn summary(&self) -> PipelineSummary {
        PipelineSummary {
            processed: self.processed,
            kept: self.kept(),
            removed: self.removed(),
            failed: self.failures.len(),
            duration_ms: self.duration_ms,
        }
    }
}
