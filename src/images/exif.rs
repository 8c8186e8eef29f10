//! Capture timestamp extraction from embedded EXIF metadata.
//!
//! The first of `DateTimeOriginal`, `DateTimeDigitized` and `DateTime` that
//! parses wins. EXIF stores wall-clock time with no zone; it is read as UTC.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use exif::{In, Tag, Value};

/// Errors reading a timestamp from an image file.
#[derive(thiserror::Error, Debug)]
pub enum TimestampError {
    /// The file could not be opened.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The file is not a container the EXIF reader understands, or its
    /// metadata is corrupt.
    #[error("Unparseable metadata in {path}: {source}")]
    Exif {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: exif::Error,
    },

    /// A date tag was present but malformed.
    #[error("Invalid capture time in {path}: {value}")]
    InvalidDateTime {
        /// File that failed
        path: PathBuf,
        /// Raw tag text
        value: String,
    },
}

/// Source of embedded capture timestamps.
///
/// `Ok(None)` means the file was read but carries no timestamp.
pub trait TimestampReader {
    /// Read the capture timestamp of `path`.
    ///
    /// # Errors
    ///
    /// Returns [`TimestampError`] if the file cannot be read or parsed.
    fn read_timestamp(&self, path: &Path) -> Result<Option<DateTime<Utc>>, TimestampError>;
}

impl<T: TimestampReader + ?Sized> TimestampReader for &T {
    fn read_timestamp(&self, path: &Path) -> Result<Option<DateTime<Utc>>, TimestampError> {
        (**self).read_timestamp(path)
    }
}

const DATE_TAGS: [Tag; 3] = [Tag::DateTimeOriginal, Tag::DateTimeDigitized, Tag::DateTime];

/// [`TimestampReader`] backed by `kamadak-exif`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExifTimestampReader;

impl ExifTimestampReader {
    /// Create a reader.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl TimestampReader for ExifTimestampReader {
    fn read_timestamp(&self, path: &Path) -> Result<Option<DateTime<Utc>>, TimestampError> {
        let file = File::open(path).map_err(|source| TimestampError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut reader = exif::Reader::new();
        reader.continue_on_error(true);

        let exif = match reader
            .read_from_container(&mut BufReader::new(file))
            .or_else(|e| e.distill_partial_result(|_| {}))
        {
            Ok(exif) => exif,
            Err(exif::Error::NotFound(_)) => {
                log::trace!("No EXIF block in {}", path.display());
                return Ok(None);
            }
            Err(source) => {
                return Err(TimestampError::Exif {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let mut invalid = None;
        for tag in DATE_TAGS {
            let Some(field) = exif.get_field(tag, In::PRIMARY) else {
                continue;
            };
            let Value::Ascii(ref parts) = field.value else {
                continue;
            };
            let Some(raw) = parts.first() else {
                continue;
            };
            match parse_exif_datetime(raw) {
                Some(ts) => return Ok(Some(ts)),
                None => {
                    log::trace!("Ignoring malformed {tag} in {}", path.display());
                    invalid.get_or_insert_with(|| String::from_utf8_lossy(raw).into_owned());
                }
            }
        }

        match invalid {
            Some(value) => Err(TimestampError::InvalidDateTime {
                path: path.to_path_buf(),
                value,
            }),
            None => Ok(None),
        }
    }
}

/// Parse the EXIF `YYYY:MM:DD HH:MM:SS` form.
fn parse_exif_datetime(raw: &[u8]) -> Option<DateTime<Utc>> {
    let dt = exif::DateTime::from_ascii(raw).ok()?;
    let naive = NaiveDate::from_ymd_opt(i32::from(dt.year), u32::from(dt.month), u32::from(dt.day))?
        .and_hms_opt(u32::from(dt.hour), u32::from(dt.minute), u32::from(dt.second))?;
    Some(naive.and_utc())
}

#[cfg(test)]
#[path = "../../tests/support/exif_jpeg.rs"]
pub(crate) mod test_support;
