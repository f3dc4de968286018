//! Hash algorithm implementations backed by `image_hasher`.
//!
//! - aHash: mean of a downscaled grayscale image
//! - dHash: horizontal brightness gradients
//! - pHash: DCT of the downscaled image, then the mean of the
//!   low-frequency block. Robust to slight shifts and recompression.

use super::traits::{Fingerprint, HashAlgorithmKind, ImageHasher};
use image::DynamicImage;
use image_hasher::{HashAlg, HasherConfig as ImageHasherConfig};

/// An [`ImageHasher`] for one of the supported algorithms
pub struct LibraryHasher {
    kind: HashAlgorithmKind,
    hasher: image_hasher::Hasher,
}

impl LibraryHasher {
    pub fn new(kind: HashAlgorithmKind, hash_size: u32) -> Self {
        let config = ImageHasherConfig::new().hash_size(hash_size, hash_size);
        let config = match kind {
            HashAlgorithmKind::Average => config.hash_alg(HashAlg::Mean),
            HashAlgorithmKind::Difference => config.hash_alg(HashAlg::Gradient),
            HashAlgorithmKind::Perceptual => config.hash_alg(HashAlg::Mean).preproc_dct(),
        };

        Self {
            kind,
            hasher: config.to_hasher(),
        }
    }
}

impl ImageHasher for LibraryHasher {
    fn hash_image(&self, image: &DynamicImage) -> Fingerprint {
        Fingerprint::new(self.hasher.hash_image(image).as_bytes().to_vec())
    }

    fn kind(&self) -> HashAlgorithmKind {
        self.kind
    }
}
