//! Date lookups that shell out to `ffprobe` and `exiftool`.

use crate::core::process::ExternalTool;
use crate::error::{MetadataError, ToolError};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use regex::Regex;
use serde_json::Value;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

/// exiftool tags, most trustworthy first
const EXIFTOOL_DATE_TAGS: [&str; 5] = [
    "DateTimeOriginal",
    "CreateDate",
    "MediaCreateDate",
    "TrackCreateDate",
    "CreationDate",
];

#[derive(Debug, Clone)]
pub struct MediaProbe {
    ffprobe: ExternalTool,
    exiftool: ExternalTool,
}

impl MediaProbe {
    pub fn new(ffprobe: ExternalTool, exiftool: ExternalTool) -> Self {
        Self { ffprobe, exiftool }
    }

    /// Container `creation_time` tag of a video
    pub fn ffprobe_creation_time(&self, path: &Path) -> Result<DateTime<Utc>, MetadataError> {
        let path_arg = path.display().to_string();
        let output = self
            .ffprobe
            .run([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_entries",
                "format_tags=creation_time",
                path_arg.as_str(),
            ])
            .map_err(|source| MetadataError::Tool {
                path: path.to_path_buf(),
                source,
            })?;

        parse_ffprobe_json(&output.stdout_str())
            .map_err(|source| MetadataError::Tool {
                path: path.to_path_buf(),
                source,
            })?
            .ok_or_else(|| MetadataError::NoDate {
                path: path.to_path_buf(),
            })
    }

    /// First date tag exiftool reports for the file
    pub fn exiftool_date(&self, path: &Path) -> Result<DateTime<Utc>, MetadataError> {
        let mut args: Vec<String> = vec!["-j".into()];
        args.extend(EXIFTOOL_DATE_TAGS.iter().map(|tag| format!("-{}", tag)));
        args.push(path.display().to_string());

        let output = self
            .exiftool
            .run(args)
            .map_err(|source| MetadataError::Tool {
                path: path.to_path_buf(),
                source,
            })?;

        parse_exiftool_json(&output.stdout_str())
            .map_err(|source| MetadataError::Tool {
                path: path.to_path_buf(),
                source,
            })?
            .ok_or_else(|| MetadataError::NoDate {
                path: path.to_path_buf(),
            })
    }
}

impl Default for MediaProbe {
    fn default() -> Self {
        Self::new(
            ExternalTool::new("ffprobe", Duration::from_secs(10)),
            ExternalTool::new("exiftool", Duration::from_secs(10)),
        )
    }
}

/// Extract `format.tags.creation_time` from `ffprobe -print_format json`
pub fn parse_ffprobe_json(json: &str) -> Result<Option<DateTime<Utc>>, ToolError> {
    let value: Value = serde_json::from_str(json).map_err(|e| ToolError::Output {
        program: "ffprobe".to_string(),
        reason: e.to_string(),
    })?;

    Ok(value
        .pointer("/format/tags/creation_time")
        .and_then(Value::as_str)
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|date| date.with_timezone(&Utc)))
}

/// Pick the first parseable date tag from `exiftool -j` output
pub fn parse_exiftool_json(json: &str) -> Result<Option<DateTime<Utc>>, ToolError> {
    let value: Value = serde_json::from_str(json).map_err(|e| ToolError::Output {
        program: "exiftool".to_string(),
        reason: e.to_string(),
    })?;

    let Some(record) = value.as_array().and_then(|records| records.first()) else {
        return Ok(None);
    };

    Ok(EXIFTOOL_DATE_TAGS
        .iter()
        .filter_map(|tag| record.get(*tag).and_then(Value::as_str))
        .find_map(parse_exiftool_date))
}

/// exiftool dates look like "2023:04:15 12:30:45+02:00"; a missing or
/// unreadable time of day becomes midnight
fn parse_exiftool_date(raw: &str) -> Option<DateTime<Utc>> {
    static DATE: OnceLock<Option<Regex>> = OnceLock::new();
    let pattern = DATE
        .get_or_init(|| Regex::new(r"(\d{4}):(\d{2}):(\d{2})(?:[ T](\d{2}):(\d{2}):(\d{2}))?").ok())
        .as_ref()?;

    let caps = pattern.captures(raw)?;
    let number = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());

    let date = NaiveDate::from_ymd_opt(number(1)? as i32, number(2)?, number(3)?)?;
    let time = match (number(4), number(5), number(6)) {
        (Some(h), Some(m), Some(s)) => NaiveTime::from_hms_opt(h, m, s).unwrap_or(NaiveTime::MIN),
        _ => NaiveTime::MIN,
    };

    Some(DateTime::from_naive_utc_and_offset(NaiveDateTime::new(date, time), Utc))
}
