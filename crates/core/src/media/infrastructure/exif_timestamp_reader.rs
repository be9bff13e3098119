use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::NaiveDateTime;
use exif::{Exif, In, Tag, Value};

use crate::media::domain::timestamp_reader::TimestampReader;

/// Tags consulted for the capture time, most specific first.
const DATE_TAGS: [Tag; 3] = [Tag::DateTimeOriginal, Tag::DateTime, Tag::DateTimeDigitized];

const EXIF_DATETIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Reads the capture time from a photo's EXIF block.
pub struct ExifTimestampReader;

impl ExifTimestampReader {
    pub fn new() -> Self {
        Self
    }

    fn read_exif(path: &Path) -> Result<Exif, exif::Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        exif::Reader::new().read_from_container(&mut reader)
    }
}

impl Default for ExifTimestampReader {
    fn default() -> Self {
        Self::new()
    }
}

impl TimestampReader for ExifTimestampReader {
    fn read(&self, path: &Path) -> Option<NaiveDateTime> {
        let exif = match Self::read_exif(path) {
            Ok(exif) => exif,
            Err(e) => {
                log::debug!("No EXIF in {}: {e}", path.display());
                return None;
            }
        };

        let found = DATE_TAGS.iter().find_map(|&tag| {
            let field = exif.get_field(tag, In::PRIMARY)?;
            match &field.value {
                Value::Ascii(values) => values
                    .first()
                    .and_then(|raw| std::str::from_utf8(raw).ok())
                    .and_then(parse_exif_datetime),
                _ => None,
            }
        });
        if found.is_none() {
            log::debug!("No usable date tag in {}", path.display());
        }
        found
    }
}

/// Parses an EXIF `"YYYY:MM:DD HH:MM:SS"` value.
///
/// Trailing NULs and whitespace are tolerated; zeroed placeholder dates and
/// anything else malformed yield `None`.
pub fn parse_exif_datetime(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    NaiveDateTime::parse_from_str(trimmed, EXIF_DATETIME_FORMAT).ok()
}
