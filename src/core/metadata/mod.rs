//! # Metadata Module
//!
//! Capture-date lookup for organizing files by date.
//!
//! A missing capture date is a normal outcome, not an error: such files go
//! to the unclassified folder (or stay where they are). There is no fallback
//! to the file's modification time.
//!
//! The bundled [`ExifDateProvider`] reads EXIF tags in this order:
//! - DateTimeOriginal
//! - DateTimeDigitized
//! - DateTime

use crate::core::scanner::MediaKind;
use chrono::NaiveDateTime;
use exif::{In, Reader, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Source of capture timestamps
pub trait CaptureDateProvider: Send + Sync {
    /// Capture time of the file, if one can be determined
    fn capture_date(&self, path: &Path, kind: MediaKind) -> Option<NaiveDateTime>;
}

/// Reads capture dates from EXIF metadata
#[derive(Debug, Clone, Copy, Default)]
pub struct ExifDateProvider;

const DATE_TAGS: [Tag; 3] = [Tag::DateTimeOriginal, Tag::DateTimeDigitized, Tag::DateTime];

impl CaptureDateProvider for ExifDateProvider {
    fn capture_date(&self, path: &Path, kind: MediaKind) -> Option<NaiveDateTime> {
        if kind != MediaKind::Image {
            return None;
        }

        let file = File::open(path).ok()?;
        let mut bufreader = BufReader::new(&file);
        let exif_reader = Reader::new().read_from_container(&mut bufreader).ok()?;

        DATE_TAGS.iter().find_map(|tag| {
            exif_reader
                .get_field(*tag, In::PRIMARY)
                .and_then(|field| get_string_value(&field.value))
                .and_then(|s| parse_exif_datetime(&s))
        })
    }
}

/// Never knows a capture date
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCaptureDates;

impl CaptureDateProvider for NoCaptureDates {
    fn capture_date(&self, _path: &Path, _kind: MediaKind) -> Option<NaiveDateTime> {
        None
    }
}

/// Parse the EXIF date format: "YYYY:MM:DD HH:MM:SS"
fn parse_exif_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s.trim(), "%Y:%m:%d %H:%M:%S").ok()
}

/// Helper to extract string from EXIF ASCII value
fn get_string_value(value: &Value) -> Option<String> {
    if let Value::Ascii(ref vec) = value {
        if let Some(bytes) = vec.first() {
            if let Ok(s) = std::str::from_utf8(bytes) {
                let trimmed = s.trim_end_matches('\0').trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn parses_exif_datetime() {
        let date = parse_exif_datetime("2021:02:14 09:30:15").unwrap();
        assert_eq!((date.year(), date.month(), date.day()), (2021, 2, 14));
        assert_eq!(date.hour(), 9);
    }

    #[test]
    fn rejects_zeroed_exif_datetime() {
        assert!(parse_exif_datetime("0000:00:00 00:00:00").is_none());
    }

    #[test]
    fn ascii_value_is_trimmed() {
        let value = Value::Ascii(vec![b"2020:01:01 00:00:00\0".to_vec()]);
        assert_eq!(
            get_string_value(&value),
            Some("2020:01:01 00:00:00".to_string())
        );
    }

    #[test]
    fn nonexistent_file_has_no_date() {
        let provider = ExifDateProvider;
        assert!(provider
            .capture_date(Path::new("/nonexistent/file.jpg"), MediaKind::Image)
            .is_none());
    }

    #[test]
    fn non_images_are_not_inspected() {
        let provider = ExifDateProvider;
        assert!(provider
            .capture_date(Path::new("/photos/notes.txt"), MediaKind::Other)
            .is_none());
    }
}
