//! Fingerprint value and the hashing contract.

use crate::error::HashError;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A perceptual fingerprint: a fixed-size ordered bit sequence.
///
/// Equality and hashing are over the raw bits, so identical fingerprints
/// can be bucketed in a map before any distance is computed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint {
    bytes: Vec<u8>,
}

impl Fingerprint {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Parse a hex string such as the one produced by [`Fingerprint::to_hex`]
    pub fn from_hex(hex: &str) -> Option<Self> {
        if hex.len() % 2 != 0 {
            return None;
        }
        (0..hex.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok())
            .collect::<Option<Vec<u8>>>()
            .map(Self::new)
    }

    /// Hamming distance: number of differing bits.
    ///
    /// Fingerprints of different lengths count the surplus bytes as fully
    /// differing, so they are never mistaken for near-duplicates.
    pub fn distance(&self, other: &Self) -> u32 {
        let common: u32 = self
            .bytes
            .iter()
            .zip(other.bytes.iter())
            .map(|(a, b)| (a ^ b).count_ones())
            .sum();
        let surplus = self.bytes.len().abs_diff(other.bytes.len()) as u32 * 8;
        common + surplus
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn bit_count(&self) -> u32 {
        (self.bytes.len() * 8) as u32
    }

    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Available hash algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HashAlgorithmKind {
    /// Average Hash (aHash) - Fast, good for exact duplicates
    Average,
    /// Difference Hash (dHash) - Compares brightness gradients
    Difference,
    /// Perceptual Hash (pHash) - DCT-based, tolerant of small shifts
    Perceptual,
}

impl std::fmt::Display for HashAlgorithmKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HashAlgorithmKind::Average => write!(f, "aHash"),
            HashAlgorithmKind::Difference => write!(f, "dHash"),
            HashAlgorithmKind::Perceptual => write!(f, "pHash"),
        }
    }
}

/// Produces fingerprints for image files.
///
/// Implementations must be deterministic for identical pixel data and must
/// turn every decode problem into a [`HashError`] rather than panicking.
pub trait ImageHasher: Send + Sync {
    /// Fingerprint an already-decoded image
    fn hash_image(&self, image: &DynamicImage) -> Fingerprint;

    /// Decode a file and fingerprint it
    fn hash_file(&self, path: &Path) -> Result<Fingerprint, HashError> {
        let image = super::fast_decode::FastDecoder::decode(path)?;
        if image.width() == 0 || image.height() == 0 {
            return Err(HashError::EmptyImage {
                path: path.to_path_buf(),
            });
        }
        Ok(self.hash_image(&image))
    }

    fn kind(&self) -> HashAlgorithmKind;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_to_self_is_zero() {
        let hash = Fingerprint::new(vec![0xFF, 0x00, 0xAA, 0x55]);
        assert_eq!(hash.distance(&hash), 0);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Fingerprint::new(vec![0xFF, 0x00]);
        let b = Fingerprint::new(vec![0x0F, 0xF0]);
        assert_eq!(a.distance(&b), b.distance(&a));
    }

    #[test]
    fn distance_counts_differing_bits() {
        let a = Fingerprint::new(vec![0b0000]);
        let b = Fingerprint::new(vec![0b0110]);
        assert_eq!(a.distance(&b), 2);
    }

    #[test]
    fn length_mismatch_counts_as_different() {
        let a = Fingerprint::new(vec![0x00]);
        let b = Fingerprint::new(vec![0x00, 0x00]);
        assert_eq!(a.distance(&b), 8);
    }

    #[test]
    fn hex_round_trip() {
        let hash = Fingerprint::new(vec![0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(hash.to_hex(), "deadbeef");
        assert_eq!(Fingerprint::from_hex("deadbeef"), Some(hash));
        assert_eq!(Fingerprint::from_hex("abc"), None);
        assert_eq!(Fingerprint::from_hex("zz"), None);
    }

    #[test]
    fn algorithm_kind_display() {
        assert_eq!(HashAlgorithmKind::Average.to_string(), "aHash");
        assert_eq!(HashAlgorithmKind::Difference.to_string(), "dHash");
        assert_eq!(HashAlgorithmKind::Perceptual.to_string(), "pHash");
    }
}
