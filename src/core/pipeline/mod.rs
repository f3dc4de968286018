//! # Pipeline Module
//!
//! Orchestrates the full dedupe workflow.
//!
//! ## Pipeline Stages
//! 1. **Scan** - Discover media files in the input directories
//! 2. **Hash** - Fingerprint images and resolve creation times (worker pool)
//! 3. **Group** - Cluster fingerprints and select one file per group
//! 4. **Deliver** - Hand each selection to every sink, then finish them
//!
//! ## Parallelism
//! Hashing runs on a dedicated rayon pool, `max(1, cpus - 1)` threads by
//! default. Grouping, selection and sinks run on the calling thread.

mod cancel;
mod executor;
mod report;

pub use cancel::CancellationToken;
pub use executor::{default_workers, Pipeline, PipelineBuilder, PipelineConfig};
pub use report::{FailureStage, FileFailure, PipelineReport};
