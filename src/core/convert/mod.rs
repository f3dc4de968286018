//! # Convert Module
//!
//! Format conversions the sinks need:
//! - HEIC/HEIF to JPEG through an external converter
//! - Still thumbnails (fit within a box, JPEG)
//! - Video thumbnails from the first frame via `ffmpeg`

mod heic;
mod thumbnail;
mod video;

pub use heic::{HeicBackend, HeicConverter};
pub use thumbnail::{Thumbnail, ThumbnailMaker};
pub use video::VideoThumbnailer;

/// JPEG quality used for web copies and thumbnails
pub const WEB_IMAGE_QUALITY: u8 = 85;
