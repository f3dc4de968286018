//! Video thumbnails via `ffmpeg`.

use super::Thumbnail;
use crate::core::process::ExternalTool;
use crate::error::ConvertError;
use std::fs;
use std::path::Path;
use std::time::Duration;

const FFMPEG_TIMEOUT: Duration = Duration::from_secs(15);

/// Grabs the first frame of a video, scaled to a fixed width
#[derive(Debug, Clone)]
pub struct VideoThumbnailer {
    tool: ExternalTool,
    width: u32,
}

impl VideoThumbnailer {
    pub fn new(width: u32) -> Self {
        Self {
            tool: ExternalTool::new("ffmpeg", FFMPEG_TIMEOUT),
            width: width.max(1),
        }
    }

    fn args(&self, video: &Path, output: &Path) -> Vec<String> {
        vec![
            "-y".into(),
            "-i".into(),
            video.display().to_string(),
            "-ss".into(),
            "00:00:00.000".into(),
            "-vframes".into(),
            "1".into(),
            "-vf".into(),
            format!("scale={}:-1", self.width),
            output.display().to_string(),
        ]
    }

    pub fn thumbnail(&self, video: &Path) -> Result<Thumbnail, ConvertError> {
        let temp = tempfile::Builder::new()
            .prefix("media-sieve-frame-")
            .suffix(".jpg")
            .tempfile()
            .map_err(|source| ConvertError::Io {
                path: std::env::temp_dir(),
                source,
            })?;

        self.tool
            .run(self.args(video, temp.path()))
            .map_err(|source| ConvertError::Tool {
                path: video.to_path_buf(),
                source,
            })?;

        let bytes = fs::read(temp.path()).map_err(|source| ConvertError::Io {
            path: temp.path().to_path_buf(),
            source,
        })?;
        if bytes.is_empty() {
            return Err(ConvertError::Image {
                path: video.to_path_buf(),
                reason: "ffmpeg did not produce a frame".to_string(),
            });
        }

        let (width, height) = image::load_from_memory(&bytes)
            .map(|img| (img.width(), img.height()))
            .unwrap_or((self.width, 0));

        Ok(Thumbnail {
            bytes,
            width,
            height,
        })
    }
}

impl Default for VideoThumbnailer {
    fn default() -> Self {
        Self::new(300)
    }
}
