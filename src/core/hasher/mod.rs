//! # Hasher Module
//!
//! Computes perceptual fingerprints for images.
//!
//! ## Supported Algorithms
//! - **pHash (Perceptual Hash)** - DCT-based, the default
//! - **dHash (Difference Hash)** - brightness gradients
//! - **aHash (Average Hash)** - fastest, good for exact duplicates
//!
//! ## Decoding
//! - JPEG: `zune-jpeg`, falling back to the image crate
//! - PNG: image crate
//! - HEIC/HEIF: external converter to JPEG, then the image crate
//!
//! Every decode problem surfaces as a `HashError` carrying the path; the
//! pipeline records it and moves on.
//!
//! ## Example
//! ```rust,ignore
//! use media_sieve::core::hasher::{HasherConfig, HashAlgorithmKind};
//!
//! let hasher = HasherConfig::new()
//!     .algorithm(HashAlgorithmKind::Perceptual)
//!     .build();
//!
//! let fingerprint = hasher.hash_file(&path)?;
//! ```

mod algorithms;
pub mod fast_decode;
mod traits;

pub use algorithms::LibraryHasher;
pub use traits::{Fingerprint, HashAlgorithmKind, ImageHasher};

/// Configuration builder for hashers
#[derive(Debug, Clone)]
pub struct HasherConfig {
    /// Hash side length; the fingerprint has `hash_size²` bits
    hash_size: u32,
    algorithm: HashAlgorithmKind,
}

impl HasherConfig {
    /// pHash with 64-bit fingerprints
    pub fn new() -> Self {
        Self {
            hash_size: 8,
            algorithm: HashAlgorithmKind::Perceptual,
        }
    }

    /// Set the hash size (8 gives 64 bits, 16 gives 256 bits)
    pub fn hash_size(mut self, size: u32) -> Self {
        self.hash_size = size;
        self
    }

    /// Set the hash algorithm
    pub fn algorithm(mut self, algorithm: HashAlgorithmKind) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn build(self) -> Box<dyn ImageHasher> {
        Box::new(LibraryHasher::new(self.algorithm, self.hash_size.max(2)))
    }
}

impl Default for HasherConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_to_phash() {
        let config = HasherConfig::new();
        assert_eq!(config.algorithm, HashAlgorithmKind::Perceptual);
        assert_eq!(config.hash_size, 8);
    }

    #[test]
    fn build_respects_algorithm() {
        let hasher = HasherConfig::new()
            .algorithm(HashAlgorithmKind::Difference)
            .hash_size(16)
            .build();
        assert_eq!(hasher.kind(), HashAlgorithmKind::Difference);
    }
}
