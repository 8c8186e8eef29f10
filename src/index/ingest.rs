//! Track-log ingestion.
//!
//! Reads GPX and CSV track logs and feeds every timed fix into both the
//! [`TimeIndex`] and the [`LocationIndex`].
//!
//! # Supported formats
//!
//! - `.gpx`: tracks, routes and waypoints; fixes without a `<time>` are skipped
//! - `.csv`: a header row with `timestamp,latitude,longitude` and an optional
//!   `elevation` column; timestamps are RFC 3339
//!
//! # Example
//!
//! ```no_run
//! use geoquery::index::{Collector, LocationIndex};
//! use std::path::Path;
//!
//! let mut collector = Collector::new(LocationIndex::new());
//! collector.read_from_path(Path::new("tracks/")).unwrap();
//! let (time_index, location_index) = collector.finish();
//! println!("{} fixes", time_index.len());
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use walkdir::WalkDir;

use super::{GeographicRecord, LocationIndex, TimeIndex};

/// Errors that can occur while reading track logs.
#[derive(thiserror::Error, Debug)]
pub enum IngestError {
    /// An I/O error occurred while reading a file or directory.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A GPX file could not be parsed.
    #[error("Invalid GPX in {path}: {source}")]
    Gpx {
        /// Offending file
        path: PathBuf,
        /// Parser error
        #[source]
        source: gpx::errors::GpxError,
    },

    /// A CSV track log could not be parsed.
    #[error("Invalid CSV track log {path}: {source}")]
    Csv {
        /// Offending file
        path: PathBuf,
        /// Parser error
        #[source]
        source: csv::Error,
    },

    /// A file was named explicitly but has no known track-log extension.
    #[error("Unsupported track-log format: {0}")]
    UnsupportedFormat(PathBuf),
}

/// Counters gathered during ingestion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectorStats {
    /// Track-log files read
    pub files: usize,
    /// Timed fixes added to the indexes
    pub records: usize,
    /// Fixes dropped because they carried no timestamp
    pub untimed: usize,
    /// Files under a `--path` directory skipped for their extension
    pub skipped_files: usize,
}

/// Track-log formats the collector understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrackFormat {
    Gpx,
    Csv,
}

impl TrackFormat {
    fn from_path(path: &Path) -> Option<Self> {
        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .map(str::to_lowercase)?;
        match extension.as_str() {
            "gpx" => Some(Self::Gpx),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: DateTime<Utc>,
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    elevation: Option<f64>,
}

/// Builds the time and location indexes from track-log files.
#[derive(Debug)]
pub struct Collector {
    time_index: TimeIndex,
    location_index: LocationIndex,
    stats: CollectorStats,
}

impl Collector {
    /// Create a collector that fills the given (usually empty) location index.
    #[must_use]
    pub fn new(location_index: LocationIndex) -> Self {
        Self {
            time_index: TimeIndex::new(),
            location_index,
            stats: CollectorStats::default(),
        }
    }

    /// Recursively read every supported track log under `root`.
    ///
    /// Files with other extensions are skipped. Any read or parse failure
    /// aborts ingestion, since a partially loaded track set would silently
    /// produce wrong answers.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError`] on the first unreadable directory or file.
    pub fn read_from_path(&mut self, root: &Path) -> Result<(), IngestError> {
        log::debug!("Reading track logs under {}", root.display());

        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let path = e.path().map_or_else(|| root.to_path_buf(), Path::to_path_buf);
                IngestError::Io {
                    path,
                    source: e
                        .into_io_error()
                        .unwrap_or_else(|| std::io::Error::other("filesystem loop")),
                }
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            match TrackFormat::from_path(entry.path()) {
                Some(format) => self.read_format(entry.path(), format)?,
                None => {
                    log::trace!("Skipping non-track file: {}", entry.path().display());
                    self.stats.skipped_files += 1;
                }
            }
        }

        Ok(())
    }

    /// Read one track-log file.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::UnsupportedFormat`] for unknown extensions, or
    /// the read/parse error of the file.
    pub fn read_from_filepath(&mut self, path: &Path) -> Result<(), IngestError> {
        let format = TrackFormat::from_path(path)
            .ok_or_else(|| IngestError::UnsupportedFormat(path.to_path_buf()))?;
        self.read_format(path, format)
    }

    /// Add a single record to both indexes.
    pub fn add(&mut self, record: GeographicRecord) {
        self.location_index.insert(record.clone());
        self.time_index.insert(record);
        self.stats.records += 1;
    }

    /// Ingestion counters so far.
    #[must_use]
    pub fn stats(&self) -> &CollectorStats {
        &self.stats
    }

    /// Consume the collector and hand back the built indexes.
    #[must_use]
    pub fn finish(self) -> (TimeIndex, LocationIndex) {
        log::debug!(
            "Ingested {} fixes from {} files ({} untimed dropped)",
            self.stats.records,
            self.stats.files,
            self.stats.untimed
        );
        (self.time_index, self.location_index)
    }

    fn read_format(&mut self, path: &Path, format: TrackFormat) -> Result<(), IngestError> {
        let before = self.stats.records;
        match format {
            TrackFormat::Gpx => self.read_gpx(path)?,
            TrackFormat::Csv => self.read_csv(path)?,
        }
        self.stats.files += 1;
        log::debug!(
            "Loaded {} fixes from {}",
            self.stats.records - before,
            path.display()
        );
        Ok(())
    }

    fn read_gpx(&mut self, path: &Path) -> Result<(), IngestError> {
        let file = File::open(path).map_err(|source| IngestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let document = gpx::read(BufReader::new(file)).map_err(|source| IngestError::Gpx {
            path: path.to_path_buf(),
            source,
        })?;

        let track_points = document
            .tracks
            .iter()
            .flat_map(|t| t.segments.iter())
            .flat_map(|s| s.points.iter());
        let route_points = document.routes.iter().flat_map(|r| r.points.iter());

        for waypoint in track_points.chain(route_points).chain(document.waypoints.iter()) {
            let Some(timestamp) = waypoint.time.clone().and_then(gpx_time_to_utc) else {
                self.stats.untimed += 1;
                continue;
            };
            let point = waypoint.point();
            self.add(GeographicRecord::new(timestamp, point.y(), point.x()).with_elevation(waypoint.elevation));
        }

        Ok(())
    }

    fn read_csv(&mut self, path: &Path) -> Result<(), IngestError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|source| IngestError::Csv {
                path: path.to_path_buf(),
                source,
            })?;

        for row in reader.deserialize::<CsvRow>() {
            let row = row.map_err(|source| IngestError::Csv {
                path: path.to_path_buf(),
                source,
            })?;
            self.add(
                GeographicRecord::new(row.timestamp, row.latitude, row.longitude)
                    .with_elevation(row.elevation),
            );
        }

        Ok(())
    }
}

fn gpx_time_to_utc(time: gpx::Time) -> Option<DateTime<Utc>> {
    let odt: ::time::OffsetDateTime = time.into();
    DateTime::from_timestamp(odt.unix_timestamp(), odt.nanosecond())
}
