//! Object key layout.

use crate::error::StorageError;
use chrono::{DateTime, Datelike, Utc};
use xxhash_rust::xxh3::xxh3_64;

/// Year/month/hash parts shared by a media object and its thumbnail
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaKey {
    pub year: i32,
    pub month: u32,
    pub hash10: String,
}

impl MediaKey {
    pub fn new(date: DateTime<Utc>, bytes: &[u8]) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
            hash10: content_hash10(bytes),
        }
    }

    /// `media/YYYY/MM/<hash10><ext>`; `ext` includes the dot
    pub fn media(&self, ext: &str) -> String {
        format!("media/{}/{:02}/{}{}", self.year, self.month, self.hash10, ext.to_lowercase())
    }

    /// `thumbnails/YYYY/MM/<hash10>.jpg`
    pub fn thumbnail(&self) -> String {
        format!("thumbnails/{}/{:02}/{}.jpg", self.year, self.month, self.hash10)
    }
}

/// First ten hex digits of the xxh3 hash of `bytes`
pub fn content_hash10(bytes: &[u8]) -> String {
    let mut hex = format!("{:016x}", xxh3_64(bytes));
    hex.truncate(10);
    hex
}

pub fn media_key(date: DateTime<Utc>, bytes: &[u8], ext: &str) -> String {
    MediaKey::new(date, bytes).media(ext)
}

pub fn thumbnail_key(date: DateTime<Utc>, bytes: &[u8]) -> String {
    MediaKey::new(date, bytes).thumbnail()
}

/// Keys are relative, `/`-separated and never escape the store root
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    let invalid = key.is_empty()
        || key.starts_with('/')
        || key.ends_with('/')
        || key.contains('\\')
        || key.split('/').any(|part| part.is_empty() || part == "." || part == "..");

    if invalid {
        return Err(StorageError::InvalidKey { key: key.to_string() });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 4, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn hash10_is_ten_hex_digits() {
        let hash = content_hash10(b"hello");
        assert_eq!(hash.len(), 10);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(hash, content_hash10(b"hello"));
        assert_ne!(hash, content_hash10(b"hello!"));
    }

    #[test]
    fn media_key_pads_month_and_lowercases_extension() {
        let key = media_key(date(), b"bytes", ".JPG");
        let hash = content_hash10(b"bytes");
        assert_eq!(key, format!("media/2023/04/{}.jpg", hash));
    }

    #[test]
    fn thumbnail_key_is_always_jpeg() {
        let key = thumbnail_key(date(), b"bytes");
        assert!(key.starts_with("thumbnails/2023/04/"));
        assert!(key.ends_with(".jpg"));
    }

    #[test]
    fn escaping_keys_are_rejected() {
        assert!(validate_key("media/2023/04/a.jpg").is_ok());
        assert!(validate_key("manifest.json").is_ok());
        for key in ["", "/abs", "media/../x", "a//b", "dir/", "a\\b", "./a"] {
            assert!(validate_key(key).is_err(), "{key:?} should be invalid");
        }
    }
}
