//! # Favicon Module
//!
//! Builds a multi-size `favicon.ico` from one source image, plus a PNG of
//! the largest size and a 180px Apple touch icon.
//!
//! Near-white pixels (every channel above the threshold) become fully
//! transparent in the ICO and PNG so a logo on a white background blends
//! into any tab bar. The touch icon keeps its background.

use crate::core::convert::ThumbnailMaker;
use crate::core::hasher::fast_decode::FastDecoder;
use crate::error::ConvertError;
use fast_image_resize::{images::Image, FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::codecs::ico::{IcoEncoder, IcoFrame};
use image::{ExtendedColorType, ImageFormat, RgbaImage};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::info;

/// ICO frames cannot be larger than this
pub const MAX_ICO_SIZE: u32 = 256;

#[derive(Debug, Clone)]
pub struct FaviconConfig {
    /// Square frame sizes for the ICO
    pub sizes: Vec<u32>,
    /// Channels above this value count as white
    pub white_threshold: u8,
    pub apple_touch_size: u32,
}

impl FaviconConfig {
    pub fn sizes(mut self, sizes: Vec<u32>) -> Self {
        self.sizes = sizes;
        self
    }

    pub fn white_threshold(mut self, threshold: u8) -> Self {
        self.white_threshold = threshold;
        self
    }
}

impl Default for FaviconConfig {
    fn default() -> Self {
        Self {
            sizes: vec![16, 32, 48, 64, 128, 256],
            white_threshold: 240,
            apple_touch_size: 180,
        }
    }
}

/// Files written by [`create_favicon`]
#[derive(Debug, Clone)]
pub struct FaviconOutput {
    pub ico: PathBuf,
    pub png: PathBuf,
    pub apple_touch: PathBuf,
}

/// Write `output` (ICO), `output` with a `.png` extension, and
/// `favicon/apple-touch-icon.png` next to `output`
pub fn create_favicon(input: &Path, output: &Path, config: &FaviconConfig) -> Result<FaviconOutput, ConvertError> {
    let image_error = |reason: String| ConvertError::Image {
        path: input.to_path_buf(),
        reason,
    };

    if config.sizes.is_empty() {
        return Err(image_error("no icon sizes requested".to_string()));
    }
    if let Some(bad) = config.sizes.iter().find(|s| **s == 0 || **s > MAX_ICO_SIZE) {
        return Err(image_error(format!("icon size {} is outside 1..={}", bad, MAX_ICO_SIZE)));
    }

    let source = FastDecoder::decode(input)
        .map_err(|e| image_error(e.to_string()))?
        .to_rgba8();

    let mut transparent = source.clone();
    clear_white_background(&mut transparent, config.white_threshold);

    let frames = config
        .sizes
        .iter()
        .map(|size| fit_rgba(&transparent, *size, input))
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ConvertError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    write_ico(&frames, output)?;

    let png = output.with_extension("png");
    let largest = frames
        .iter()
        .max_by_key(|f| f.width() * f.height())
        .ok_or_else(|| image_error("no frames rendered".to_string()))?;
    save_png(largest, &png)?;

    let touch_dir = output
        .parent()
        .map(|p| p.join("favicon"))
        .unwrap_or_else(|| PathBuf::from("favicon"));
    fs::create_dir_all(&touch_dir).map_err(|source| ConvertError::Io {
        path: touch_dir.clone(),
        source,
    })?;
    let apple_touch = touch_dir.join("apple-touch-icon.png");
    save_png(&fit_rgba(&source, config.apple_touch_size, input)?, &apple_touch)?;

    info!(ico = %output.display(), frames = frames.len(), "favicon created");
    Ok(FaviconOutput {
        ico: output.to_path_buf(),
        png,
        apple_touch,
    })
}

/// Make every near-white pixel fully transparent
pub fn clear_white_background(image: &mut RgbaImage, threshold: u8) {
    for pixel in image.pixels_mut() {
        let [r, g, b, _] = pixel.0;
        if r > threshold && g > threshold && b > threshold {
            pixel.0[3] = 0;
        }
    }
}

/// Downscale to fit within `size` x `size`, keeping aspect ratio
fn fit_rgba(image: &RgbaImage, size: u32, path: &Path) -> Result<RgbaImage, ConvertError> {
    let image_error = |reason: String| ConvertError::Image {
        path: path.to_path_buf(),
        reason,
    };

    let (width, height) = ThumbnailMaker::new(size, size).fit(image.width(), image.height());
    if (width, height) == image.dimensions() {
        return Ok(image.clone());
    }

    let src = Image::from_vec_u8(image.width(), image.height(), image.as_raw().clone(), PixelType::U8x4)
        .map_err(|e| image_error(format!("source buffer: {}", e)))?;
    let mut dst = Image::new(width, height, PixelType::U8x4);
    let options = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Lanczos3));
    Resizer::new()
        .resize(&src, &mut dst, &options)
        .map_err(|e| image_error(format!("resize failed: {}", e)))?;

    RgbaImage::from_raw(width, height, dst.into_vec())
        .ok_or_else(|| image_error("resized buffer has the wrong size".to_string()))
}

fn write_ico(frames: &[RgbaImage], output: &Path) -> Result<(), ConvertError> {
    let image_error = |e: image::ImageError| ConvertError::Image {
        path: output.to_path_buf(),
        reason: e.to_string(),
    };

    let ico_frames = frames
        .iter()
        .map(|f| IcoFrame::as_png(f.as_raw(), f.width(), f.height(), ExtendedColorType::Rgba8))
        .collect::<Result<Vec<_>, _>>()
        .map_err(image_error)?;

    let file = File::create(output).map_err(|source| ConvertError::Io {
        path: output.to_path_buf(),
        source,
    })?;
    IcoEncoder::new(BufWriter::new(file))
        .encode_images(&ico_frames)
        .map_err(image_error)
}

fn save_png(image: &RgbaImage, path: &Path) -> Result<(), ConvertError> {
    image
        .save_with_format(path, ImageFormat::Png)
        .map_err(|e| ConvertError::Image {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba};
    use tempfile::TempDir;

    /// Red square on a white background
    fn logo(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("logo.png");
        RgbImage::from_fn(300, 200, |x, y| {
            if (100..200).contains(&x) && (50..150).contains(&y) {
                Rgb([200, 20, 20])
            } else {
                Rgb([255, 255, 255])
            }
        })
        .save(&path)
        .unwrap();
        path
    }

    #[test]
    fn near_white_becomes_transparent() {
        let mut image = RgbaImage::from_pixel(2, 1, Rgba([250, 250, 250, 255]));
        image.put_pixel(1, 0, Rgba([250, 250, 240, 255]));

        clear_white_background(&mut image, 240);

        assert_eq!(image.get_pixel(0, 0).0[3], 0);
        assert_eq!(image.get_pixel(1, 0).0[3], 255);
    }

    #[test]
    fn writes_ico_png_and_touch_icon() {
        let dir = TempDir::new().unwrap();
        let input = logo(&dir);
        let output = dir.path().join("site").join("favicon.ico");

        let written = create_favicon(&input, &output, &FaviconConfig::default()).unwrap();

        assert!(written.ico.exists());
        let png = image::open(&written.png).unwrap();
        assert_eq!((png.width(), png.height()), (256, 171));
        assert_eq!(png.to_rgba8().get_pixel(0, 0).0[3], 0);

        let touch = image::open(&written.apple_touch).unwrap();
        assert_eq!(touch.width(), 180);
        assert_eq!(touch.to_rgba8().get_pixel(0, 0).0[3], 255);
        assert!(written.apple_touch.ends_with("favicon/apple-touch-icon.png"));

        let ico = fs::read(&written.ico).unwrap();
        assert_eq!(&ico[..4], &[0, 0, 1, 0]);
        assert_eq!(u16::from_le_bytes([ico[4], ico[5]]), 6);
    }

    #[test]
    fn oversized_frame_is_rejected() {
        let dir = TempDir::new().unwrap();
        let input = logo(&dir);
        let config = FaviconConfig::default().sizes(vec![16, 512]);

        let result = create_favicon(&input, &dir.path().join("favicon.ico"), &config);
        assert!(matches!(result, Err(ConvertError::Image { .. })));
    }

    #[test]
    fn small_sources_are_not_upscaled() {
        let image = RgbaImage::new(10, 20);
        let resized = fit_rgba(&image, 64, Path::new("/mem")).unwrap();
        assert_eq!(resized.dimensions(), (10, 20));
    }
}
