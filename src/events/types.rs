//! Event type definitions for progress reporting.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted by the media pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Scanning phase events
    Scan(ScanEvent),
    /// Hashing phase events
    Hash(HashEvent),
    /// Grouping phase events
    Group(GroupEvent),
    /// Sink (copy / upload / report) events
    Sink(SinkEvent),
    /// Pipeline-level events
    Pipeline(PipelineEvent),
}

/// Events during the scanning phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScanEvent {
    Started { paths: Vec<PathBuf> },
    /// A file could not be read but scanning continues
    Error { path: PathBuf, message: String },
    Completed { images: usize, videos: usize },
}

/// Events during the hashing phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum HashEvent {
    Started { total: usize, workers: usize },
    Progress(HashProgress),
    /// Hashing failed for one file; the run continues
    Failed { path: PathBuf, message: String },
    Completed { hashed: usize, failed: usize },
}

/// Progress information during hashing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashProgress {
    /// Number of files hashed so far (including failures)
    pub completed: usize,
    /// Total number of files to hash
    pub total: usize,
    /// File that just finished
    pub current_path: PathBuf,
}

/// Events during the grouping phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GroupEvent {
    Started { distinct_fingerprints: usize },
    Completed { groups: usize, removed: usize },
}

/// Events from sinks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SinkEvent {
    Started { selections: usize },
    Progress { completed: usize, total: usize },
    /// A sink rejected one selection; the remaining batch continues
    Failed { path: PathBuf, message: String },
    Completed,
}

/// Pipeline-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineEvent {
    Started,
    PhaseChanged { phase: PipelinePhase },
    Completed { summary: PipelineSummary },
    Cancelled,
}

/// Phases of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelinePhase {
    Scanning,
    Hashing,
    Grouping,
    Delivering,
}

/// Summary of pipeline results
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Files handed to the pipeline
    pub processed: usize,
    /// Representatives retained (one per group)
    pub kept: usize,
    /// Files marked as duplicates
    pub removed: usize,
    /// Files that failed hashing or delivery
    pub failed: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl std::fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelinePhase::Scanning => write!(f, "Scanning"),
            PipelinePhase::Hashing => write!(f, "Hashing"),
            PipelinePhase::Grouping => write!(f, "Grouping"),
            PipelinePhase::Delivering => write!(f, "Delivering"),
        }
    }
}
