//! # Comparator Module
//!
//! Clusters fingerprinted images into similarity groups and picks the
//! file to keep in each.
//!
//! ## How It Works
//! 1. Bucket files by exact fingerprint (first-appearance order)
//! 2. Each unvisited bucket seeds a group and absorbs every other unvisited
//!    bucket within the threshold *of the seed*
//! 3. The selector keeps the earliest-created member of each group
//!
//! Only the seed is compared, so grouping is not transitive: C close to B
//! but not to seed A ends up in a group of its own.
//!
//! ## Distance Labels
//! | Distance | Classification |
//! |----------|---------------|
//! | 0        | Exact match   |
//! | 1-4      | Near-exact    |
//! | 5-10     | Similar       |
//! | 11+      | Loose         |

mod grouper;
mod selector;

pub use grouper::SimilarityGrouper;
pub use selector::{select, Selection};

use crate::core::hasher::Fingerprint;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

/// Default Hamming distance threshold
pub const DEFAULT_THRESHOLD: u32 = 5;

/// A file with its fingerprint (if hashing succeeded) and creation time
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FingerprintedFile {
    pub path: PathBuf,
    /// `None` when hashing failed
    pub fingerprint: Option<Fingerprint>,
    pub created: DateTime<Utc>,
}

impl FingerprintedFile {
    pub fn new(path: impl Into<PathBuf>, fingerprint: Option<Fingerprint>, created: DateTime<Utc>) -> Self {
        Self {
            path: path.into(),
            fingerprint,
            created,
        }
    }
}

/// How close the members of a group are to its seed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchType {
    Exact,
    NearExact,
    Similar,
    Loose,
}

impl MatchType {
    pub fn from_distance(distance: u32) -> Self {
        match distance {
            0 => MatchType::Exact,
            1..=4 => MatchType::NearExact,
            5..=10 => MatchType::Similar,
            _ => MatchType::Loose,
        }
    }
}

impl std::fmt::Display for MatchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchType::Exact => write!(f, "Exact Match"),
            MatchType::NearExact => write!(f, "Near-Exact Match"),
            MatchType::Similar => write!(f, "Similar"),
            MatchType::Loose => write!(f, "Loosely Similar"),
        }
    }
}

/// Files connected to one seed fingerprint. Never mutated after grouping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimilarityGroup {
    /// Position in grouping order
    pub id: usize,
    /// Seed fingerprint; `None` for the singleton of a file that failed to hash
    pub seed: Option<Fingerprint>,
    pub members: Vec<FingerprintedFile>,
    /// Largest distance from the seed to any merged bucket
    pub max_distance: u32,
}

impl SimilarityGroup {
    pub fn singleton(id: usize, file: FingerprintedFile) -> Self {
        Self {
            id,
            seed: file.fingerprint.clone(),
            members: vec![file],
            max_distance: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_duplicate_set(&self) -> bool {
        self.members.len() > 1
    }
}
