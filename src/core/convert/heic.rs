//! HEIC/HEIF to JPEG conversion.
//!
//! There is no pure-Rust HEIC decoder, so conversion shells out: `sips` on
//! macOS, `heif-convert` (libheif) elsewhere.

use super::WEB_IMAGE_QUALITY;
use crate::core::process::ExternalTool;
use crate::error::ConvertError;
use std::fs;
use std::path::Path;
use std::time::Duration;

const CONVERT_TIMEOUT: Duration = Duration::from_secs(30);

/// Which converter binary to call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeicBackend {
    /// macOS `sips -s format jpeg`
    Sips,
    /// libheif's `heif-convert`
    HeifConvert,
}

impl HeicBackend {
    pub fn platform_default() -> Self {
        if cfg!(target_os = "macos") {
            HeicBackend::Sips
        } else {
            HeicBackend::HeifConvert
        }
    }

    fn program(&self) -> &'static str {
        match self {
            HeicBackend::Sips => "sips",
            HeicBackend::HeifConvert => "heif-convert",
        }
    }

    fn args(&self, input: &Path, output: &Path, quality: u8) -> Vec<String> {
        let input = input.display().to_string();
        let output = output.display().to_string();
        match self {
            HeicBackend::Sips => vec![
                "-s".into(),
                "format".into(),
                "jpeg".into(),
                "-s".into(),
                "formatOptions".into(),
                quality.to_string(),
                input,
                "--out".into(),
                output,
            ],
            HeicBackend::HeifConvert => vec!["-q".into(), quality.to_string(), input, output],
        }
    }
}

/// Converts HEIC files to JPEG
#[derive(Debug, Clone)]
pub struct HeicConverter {
    backend: HeicBackend,
    quality: u8,
    timeout: Duration,
}

impl HeicConverter {
    pub fn new(backend: HeicBackend) -> Self {
        Self {
            backend,
            quality: WEB_IMAGE_QUALITY,
            timeout: CONVERT_TIMEOUT,
        }
    }

    pub fn quality(mut self, quality: u8) -> Self {
        self.quality = quality.clamp(1, 100);
        self
    }

    /// Write a JPEG version of `input` to `output`
    pub fn to_jpeg_file(&self, input: &Path, output: &Path) -> Result<(), ConvertError> {
        let tool = ExternalTool::new(self.backend.program(), self.timeout);
        tool.run(self.backend.args(input, output, self.quality))
            .map_err(|source| ConvertError::Tool {
                path: input.to_path_buf(),
                source,
            })?;

        match fs::metadata(output) {
            Ok(meta) if meta.len() > 0 => Ok(()),
            Ok(_) => Err(ConvertError::Image {
                path: input.to_path_buf(),
                reason: format!("{} produced an empty file", tool.program()),
            }),
            Err(source) => Err(ConvertError::Io {
                path: output.to_path_buf(),
                source,
            }),
        }
    }

    /// Convert to an in-memory JPEG via a temporary file
    pub fn to_jpeg_bytes(&self, input: &Path) -> Result<Vec<u8>, ConvertError> {
        let temp = tempfile::Builder::new()
            .prefix("media-sieve-heic-")
            .suffix(".jpg")
            .tempfile()
            .map_err(|source| ConvertError::Io {
                path: std::env::temp_dir(),
                source,
            })?;

        self.to_jpeg_file(input, temp.path())?;

        fs::read(temp.path()).map_err(|source| ConvertError::Io {
            path: temp.path().to_path_buf(),
            source,
        })
    }
}

impl Default for HeicConverter {
    fn default() -> Self {
        Self::new(HeicBackend::platform_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sips_arguments() {
        let args = HeicBackend::Sips.args(Path::new("/in.heic"), Path::new("/out.jpg"), 85);
        assert_eq!(
            args,
            vec!["-s", "format", "jpeg", "-s", "formatOptions", "85", "/in.heic", "--out", "/out.jpg"]
        );
    }

    #[test]
    fn heif_convert_arguments() {
        let args = HeicBackend::HeifConvert.args(Path::new("/in.heic"), Path::new("/out.jpg"), 70);
        assert_eq!(args, vec!["-q", "70", "/in.heic", "/out.jpg"]);
    }

    #[test]
    fn quality_is_clamped() {
        assert_eq!(HeicConverter::default().quality(0).quality, 1);
        assert_eq!(HeicConverter::default().quality(200).quality, 100);
    }

    #[test]
    fn missing_input_is_an_error() {
        let result = HeicConverter::default().to_jpeg_bytes(Path::new("/nonexistent/photo.heic"));
        assert!(result.is_err());
    }
}
