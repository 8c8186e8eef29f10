//! Bulk correlation of photographs against the track log.
//!
//! This module provides:
//! - [`ImageWalker`]: lazy discovery of image files under a root
//! - [`TimestampReader`] / [`ExifTimestampReader`]: capture time extraction
//! - [`ImageCorrelator`]: per-file resolution with failure isolation
//!
//! # Outcomes
//!
//! Every file yields exactly one [`ImageOutcome`]. A file that cannot be
//! read, or has no capture time, is `SkippedUnreadable`. A file whose time
//! has no fix within the search interval is `SkippedNoMatch`. Neither stops
//! the run. Only a failure to enumerate the tree, or a failing index, does.
//!
//! # Example
//!
//! ```no_run
//! use geoquery::geocode::Enricher;
//! use geoquery::images::{ExifTimestampReader, ImageCorrelator, ImageWalker};
//! use geoquery::index::{LocationIndex, TimeIndex};
//! use geoquery::resolver::QueryEngine;
//! use std::path::Path;
//!
//! let mut engine = QueryEngine::new(TimeIndex::new(), LocationIndex::new(), Enricher::unsupported());
//! let walker = ImageWalker::new(Path::new("/photos/trip"), "jpg");
//! let correlator = ImageCorrelator::new(ExifTimestampReader::new());
//!
//! let report = correlator
//!     .correlate(&mut engine, &walker, |_, _| {})
//!     .unwrap();
//! println!("{} matched", report.matched);
//! ```

pub mod exif;
pub mod walker;

use std::path::Path;

use crate::index::{NearbyIndex, TimeSeries};
use crate::output::{QueryResult, QueryResultSet};
use crate::resolver::{MatchMode, QueryEngine, ResolveError, ResolveOptions};

pub use self::exif::{ExifTimestampReader, TimestampError, TimestampReader};
pub use walker::{ImageWalker, WalkError};

/// Result of correlating one image.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageOutcome {
    /// A fix was found for the capture time.
    Matched(QueryResult),
    /// No usable capture time could be read.
    SkippedUnreadable(String),
    /// The capture time has no fix within the search interval.
    SkippedNoMatch,
}

impl ImageOutcome {
    /// Short human-readable reason for skips.
    #[must_use]
    pub fn skip_reason(&self) -> Option<&'static str> {
        match self {
            Self::Matched(_) => None,
            Self::SkippedUnreadable(_) => Some("Unreadable/unparseable"),
            Self::SkippedNoMatch => Some("No match"),
        }
    }
}

/// Errors that end a correlation run.
#[derive(thiserror::Error, Debug)]
pub enum CorrelateError {
    /// The tree could not be enumerated.
    #[error(transparent)]
    Walk(#[from] WalkError),

    /// The index failed while resolving a capture time.
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// Totals and matches from a correlation run.
#[derive(Debug, Default)]
pub struct CorrelationReport {
    /// Matched results, labelled with relative paths
    pub results: QueryResultSet,
    /// Files matched
    pub matched: usize,
    /// Files without a usable capture time
    pub unreadable: usize,
    /// Files with no fix in range
    pub no_match: usize,
    /// Whether the walk stopped on a shutdown request
    pub interrupted: bool,
}

impl CorrelationReport {
    /// Total files considered.
    #[must_use]
    pub fn total(&self) -> usize {
        self.matched + self.unreadable + self.no_match
    }
}

/// Drives the time resolver once per discovered image.
#[derive(Debug)]
pub struct ImageCorrelator<R> {
    reader: R,
    options: ResolveOptions,
}

impl<R: TimestampReader> ImageCorrelator<R> {
    /// Create a correlator that neither enriches nor annotates.
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            options: ResolveOptions::default(),
        }
    }

    /// Set the resolution switches used for every image.
    #[must_use]
    pub fn with_options(mut self, options: ResolveOptions) -> Self {
        self.options = options;
        self
    }

    /// Correlate a single file. `label` is attached to a match.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Index`] if the index fails. Unreadable files
    /// and misses are outcomes, not errors.
    pub fn correlate_file<T, L>(
        &self,
        engine: &mut QueryEngine<T, L>,
        path: &Path,
        label: &str,
    ) -> Result<ImageOutcome, ResolveError>
    where
        T: TimeSeries,
        L: NearbyIndex,
    {
        let timestamp = match self.reader.read_timestamp(path) {
            Ok(Some(ts)) => ts,
            Ok(None) => {
                return Ok(ImageOutcome::SkippedUnreadable(
                    "no capture timestamp".to_string(),
                ))
            }
            Err(e) => return Ok(ImageOutcome::SkippedUnreadable(e.to_string())),
        };

        match engine.resolve_time(timestamp, MatchMode::Nearest, self.options) {
            Ok(results) => Ok(results
                .into_iter()
                .next()
                .map_or(ImageOutcome::SkippedNoMatch, |first| {
                    ImageOutcome::Matched(first.with_label(label))
                })),
            Err(ResolveError::NotFound(_)) => Ok(ImageOutcome::SkippedNoMatch),
            Err(e) => Err(e),
        }
    }

    /// Walk every image under the walker's root and correlate it.
    ///
    /// `on_outcome` sees each file's relative label and outcome as soon as
    /// it is known. Matches are also collected into the report.
    ///
    /// # Errors
    ///
    /// Returns [`CorrelateError`] on an enumeration or index failure.
    pub fn correlate<T, L, F>(
        &self,
        engine: &mut QueryEngine<T, L>,
        walker: &ImageWalker,
        mut on_outcome: F,
    ) -> Result<CorrelationReport, CorrelateError>
    where
        T: TimeSeries,
        L: NearbyIndex,
        F: FnMut(&str, &ImageOutcome),
    {
        walker.check_root()?;
        let mut report = CorrelationReport::default();

        for entry in walker.walk() {
            let path = entry?;
            let label = relative_label(walker.root(), &path);
            let outcome = self.correlate_file(engine, &path, &label)?;

            match &outcome {
                ImageOutcome::Matched(result) => {
                    log::debug!("{label}: matched {}", result.point.timestamp);
                    report.matched += 1;
                    report.results.add(result.clone());
                }
                ImageOutcome::SkippedUnreadable(reason) => {
                    log::info!("Skipping {label}: {reason}");
                    report.unreadable += 1;
                }
                ImageOutcome::SkippedNoMatch => {
                    log::info!("Skipping {label}: no fix in range");
                    report.no_match += 1;
                }
            }
            on_outcome(&label, &outcome);
        }

        report.interrupted = walker.is_shutdown_requested();
        log::debug!(
            "Correlated {} images: {} matched, {} unreadable, {} without match",
            report.total(),
            report.matched,
            report.unreadable,
            report.no_match
        );
        Ok(report)
    }
}

/// Path of `path` relative to `root`, with forward slashes.
fn relative_label(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let label = relative.to_string_lossy();
    if cfg!(windows) {
        label.replace('\\', "/")
    } else {
        label.into_owned()
    }
}
