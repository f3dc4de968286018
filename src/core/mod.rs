//! # Core Module
//!
//! The UI-agnostic media engine.
//!
//! ## Modules
//! - `scanner` - Discovers media files in directories
//! - `hasher` - Computes perceptual fingerprints
//! - `metadata` - Resolves creation / capture times
//! - `comparator` - Groups similar fingerprints and selects the keeper
//! - `pipeline` - Orchestrates scan, hash, group and delivery
//! - `sink` - Copy and upload destinations for selections
//! - `reporter` - HTML report of duplicate sets
//! - `convert` - HEIC conversion and thumbnails
//! - `storage` - Object store, key layout and manifest
//! - `favicon` - Multi-size favicon builder
//! - `process` - External tools with timeouts

pub mod comparator;
pub mod convert;
pub mod favicon;
pub mod hasher;
pub mod metadata;
pub mod pipeline;
pub mod process;
pub mod reporter;
pub mod scanner;
pub mod sink;
pub mod storage;

// Re-export commonly used types
pub use comparator::{FingerprintedFile, Selection, SimilarityGroup};
pub use hasher::{Fingerprint, HashAlgorithmKind};
pub use pipeline::{Pipeline, PipelineReport};
pub use scanner::MediaFile;
