//! Image decoding with format-specific fast paths.
//!
//! JPEG goes through zune-jpeg, HEIC/HEIF through the external converter,
//! everything else (and any fast-path failure) through the image crate.

use crate::core::convert::HeicConverter;
use crate::core::scanner::MediaFormat;
use crate::error::HashError;
use image::{DynamicImage, ImageBuffer, Luma, Rgb, Rgba};
use std::fs;
use std::path::Path;
use zune_core::colorspace::ColorSpace;
use zune_core::options::DecoderOptions;
use zune_jpeg::JpegDecoder;

/// Fast image decoder that uses optimized decoders per format
pub struct FastDecoder;

impl FastDecoder {
    /// Decode an image from a file path using the fastest available decoder.
    pub fn decode(path: &Path) -> Result<DynamicImage, HashError> {
        match MediaFormat::from_path(path) {
            MediaFormat::Jpeg => Self::decode_jpeg(path).or_else(|_| Self::decode_fallback(path)),
            MediaFormat::Heic => Self::decode_heic(path),
            MediaFormat::Png => Self::decode_fallback(path),
            _ => Err(HashError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }

    /// Fast JPEG decoding using zune-jpeg
    fn decode_jpeg(path: &Path) -> Result<DynamicImage, HashError> {
        let file_bytes = fs::read(path).map_err(|e| HashError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let options = DecoderOptions::new_fast().jpeg_set_out_colorspace(ColorSpace::RGB);
        let mut decoder = JpegDecoder::new_with_options(&file_bytes, options);

        let pixels = decoder.decode().map_err(|e| HashError::DecodeError {
            path: path.to_path_buf(),
            reason: format!("zune-jpeg decode failed: {:?}", e),
        })?;

        let info = decoder.info().ok_or_else(|| HashError::DecodeError {
            path: path.to_path_buf(),
            reason: "Failed to get image info".to_string(),
        })?;

        let width = info.width as u32;
        let height = info.height as u32;

        let buffer_error = || HashError::DecodeError {
            path: path.to_path_buf(),
            reason: format!("pixel buffer does not match {}x{}", width, height),
        };

        match decoder.get_output_colorspace().unwrap_or(ColorSpace::RGB) {
            ColorSpace::RGB => ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, pixels)
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(buffer_error),
            ColorSpace::RGBA => ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, pixels)
                .map(DynamicImage::ImageRgba8)
                .ok_or_else(buffer_error),
            ColorSpace::Luma => ImageBuffer::<Luma<u8>, _>::from_raw(width, height, pixels)
                .map(DynamicImage::ImageLuma8)
                .ok_or_else(buffer_error),
            _ => Self::decode_fallback(path),
        }
    }

    /// HEIC has no pure-Rust decoder; convert to a JPEG buffer first.
    fn decode_heic(path: &Path) -> Result<DynamicImage, HashError> {
        let jpeg = HeicConverter::default()
            .to_jpeg_bytes(path)
            .map_err(|e| HashError::DecodeError {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        image::load_from_memory(&jpeg).map_err(|e| HashError::DecodeError {
            path: path.to_path_buf(),
            reason: format!("Failed to read converted HEIC: {}", e),
        })
    }

    /// image crate decoding, sniffing the format from content
    fn decode_fallback(path: &Path) -> Result<DynamicImage, HashError> {
        let reader = image::ImageReader::open(path)
            .and_then(|r| r.with_guessed_format())
            .map_err(|e| HashError::IoError {
                path: path.to_path_buf(),
                source: e,
            })?;

        reader.decode().map_err(|e| HashError::DecodeError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}
