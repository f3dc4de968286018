//! EXIF capture date for still images.

use crate::error::MetadataError;
use chrono::{DateTime, NaiveDateTime, Utc};
use exif::{In, Reader, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Read `DateTimeOriginal` from the image's EXIF block
pub fn exif_date_taken(path: &Path) -> Result<DateTime<Utc>, MetadataError> {
    let file = File::open(path).map_err(|source| MetadataError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = BufReader::new(&file);
    let exif = Reader::new()
        .read_from_container(&mut reader)
        .map_err(|_| MetadataError::NoDate {
            path: path.to_path_buf(),
        })?;

    let field = exif
        .get_field(Tag::DateTimeOriginal, In::PRIMARY)
        .ok_or_else(|| MetadataError::NoDate {
            path: path.to_path_buf(),
        })?;

    let raw = ascii_value(&field.value).ok_or_else(|| MetadataError::NoDate {
        path: path.to_path_buf(),
    })?;

    parse_exif_datetime(&raw).ok_or(MetadataError::BadDate {
        path: path.to_path_buf(),
        value: raw,
    })
}

/// EXIF date format: "YYYY:MM:DD HH:MM:SS", no zone (treated as UTC)
pub(crate) fn parse_exif_datetime(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value.trim(), "%Y:%m:%d %H:%M:%S")
        .ok()
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
}

fn ascii_value(value: &Value) -> Option<String> {
    if let Value::Ascii(ref vec) = value {
        let bytes = vec.first()?;
        let s = std::str::from_utf8(bytes).ok()?;
        let trimmed = s.trim_end_matches('\0').trim();
        if !trimmed.is_empty() {
            return Some(trimmed.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn parses_exif_format() {
        let date = parse_exif_datetime("2023:04:15 12:30:45").unwrap();
        assert_eq!((date.year(), date.month(), date.day()), (2023, 4, 15));
        assert_eq!((date.hour(), date.minute(), date.second()), (12, 30, 45));
    }

    #[test]
    fn rejects_blank_exif_dates() {
        assert!(parse_exif_datetime("    :  :     :  :  ").is_none());
        assert!(parse_exif_datetime("").is_none());
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = exif_date_taken(Path::new("/nonexistent/file.jpg"));
        assert!(matches!(result, Err(MetadataError::Io { .. })));
    }

    #[test]
    fn ascii_value_strips_nul_padding() {
        let value = Value::Ascii(vec![b"2021:01:02 03:04:05\0".to_vec()]);
        assert_eq!(ascii_value(&value).as_deref(), Some("2021:01:02 03:04:05"));
    }
}
