//! Thumbnail generation.
//!
//! Uses fast_image_resize (SIMD) for the downscale and encodes JPEG.

use super::WEB_IMAGE_QUALITY;
use crate::core::hasher::fast_decode::FastDecoder;
use fast_image_resize::{images::Image, FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbImage};
use std::path::Path;

use crate::error::ConvertError;

/// An encoded thumbnail
#[derive(Debug, Clone)]
pub struct Thumbnail {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl Thumbnail {
    pub fn content_type(&self) -> &'static str {
        "image/jpeg"
    }
}

/// Produces thumbnails that fit within `max_width` x `max_height`
#[derive(Debug, Clone, Copy)]
pub struct ThumbnailMaker {
    max_width: u32,
    max_height: u32,
    quality: u8,
}

impl ThumbnailMaker {
    pub fn new(max_width: u32, max_height: u32) -> Self {
        Self {
            max_width: max_width.max(1),
            max_height: max_height.max(1),
            quality: WEB_IMAGE_QUALITY,
        }
    }

    pub fn quality(mut self, quality: u8) -> Self {
        self.quality = quality.clamp(1, 100);
        self
    }

    /// Target size that preserves aspect ratio and never upscales
    pub fn fit(&self, width: u32, height: u32) -> (u32, u32) {
        if width <= self.max_width && height <= self.max_height {
            return (width, height);
        }
        let scale = f64::min(
            self.max_width as f64 / width as f64,
            self.max_height as f64 / height as f64,
        );
        (
            ((width as f64 * scale).round() as u32).max(1),
            ((height as f64 * scale).round() as u32).max(1),
        )
    }

    /// Decode an image file and thumbnail it
    pub fn render_file(&self, path: &Path) -> Result<Thumbnail, ConvertError> {
        let image = FastDecoder::decode(path).map_err(|e| ConvertError::Image {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        self.render(&image, path)
    }

    /// Thumbnail an already-decoded image; `path` only labels errors
    pub fn render(&self, image: &DynamicImage, path: &Path) -> Result<Thumbnail, ConvertError> {
        let image_error = |reason: String| ConvertError::Image {
            path: path.to_path_buf(),
            reason,
        };

        let rgb = image.to_rgb8();
        let (src_width, src_height) = rgb.dimensions();
        if src_width == 0 || src_height == 0 {
            return Err(image_error("image has no pixels".to_string()));
        }
        let (width, height) = self.fit(src_width, src_height);

        let resized = if (width, height) == (src_width, src_height) {
            rgb
        } else {
            let src = Image::from_vec_u8(src_width, src_height, rgb.into_raw(), PixelType::U8x3)
                .map_err(|e| image_error(format!("source buffer: {}", e)))?;
            let mut dst = Image::new(width, height, PixelType::U8x3);
            let options = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Lanczos3));
            Resizer::new()
                .resize(&src, &mut dst, &options)
                .map_err(|e| image_error(format!("resize failed: {}", e)))?;
            RgbImage::from_raw(width, height, dst.into_vec())
                .ok_or_else(|| image_error("resized buffer has the wrong size".to_string()))?
        };

        let mut bytes = Vec::new();
        JpegEncoder::new_with_quality(&mut bytes, self.quality)
            .encode_image(&resized)
            .map_err(|e| image_error(format!("JPEG encode failed: {}", e)))?;

        Ok(Thumbnail {
            bytes,
            width,
            height,
        })
    }
}

impl Default for ThumbnailMaker {
    fn default() -> Self {
        Self::new(300, 300)
    }
}
