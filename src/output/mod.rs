//! Result aggregation and output formatting.
//!
//! [`QueryResultSet`] collects [`QueryResult`]s from any number of queries
//! or correlated images. Results are kept in insertion order until they are
//! rendered, at which point they are sorted by the matched fix's own
//! timestamp (stable, so ties keep insertion order).
//!
//! Renderers:
//! - [`text`]: one tab-delimited line per result
//! - [`json`]: a pretty-printed JSON array

pub mod json;
pub mod text;

use std::io;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::geocode::Place;
use crate::index::GeographicRecord;

pub use json::JsonOutput;
pub use text::TextOutput;

/// One resolved fix, optionally enriched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    /// Source label, e.g. the image path a fix was matched for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// The matched fix.
    pub point: GeographicRecord,
    /// Place description, when enrichment ran and succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place: Option<Place>,
    /// The requested time, when the match was snapped to a different one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_timestamp: Option<DateTime<Utc>>,
}

impl QueryResult {
    /// Result for a bare fix.
    #[must_use]
    pub fn new(point: GeographicRecord) -> Self {
        Self {
            label: None,
            point,
            place: None,
            original_timestamp: None,
        }
    }

    /// Attach a place.
    #[must_use]
    pub fn with_place(mut self, place: Option<Place>) -> Self {
        self.place = place;
        self
    }

    /// Record the pre-snap query time.
    #[must_use]
    pub fn with_original_timestamp(mut self, original: Option<DateTime<Utc>>) -> Self {
        self.original_timestamp = original;
        self
    }

    /// Attach a source label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// An ordered collection of results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResultSet {
    results: Vec<QueryResult>,
}

impl QueryResultSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a result.
    pub fn add(&mut self, result: QueryResult) {
        self.results.push(result);
    }

    /// Append every result of another set.
    pub fn extend(&mut self, other: QueryResultSet) {
        self.results.extend(other.results);
    }

    /// Results in their current order.
    #[must_use]
    pub fn results(&self) -> &[QueryResult] {
        &self.results
    }

    /// Number of results.
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Stable ascending sort by the matched fix's timestamp.
    pub fn sort(&mut self) {
        self.results.sort_by_key(|r| r.point.timestamp);
    }

    /// Sort, then write in the requested format.
    ///
    /// # Errors
    ///
    /// Returns any I/O or serialization error from the writer.
    pub fn print_to<W: io::Write>(&mut self, format: OutputFormat, writer: W) -> io::Result<()> {
        self.sort();
        match format {
            OutputFormat::Text => TextOutput::new(&self.results).write_to(writer),
            OutputFormat::Json => JsonOutput::new(&self.results)
                .write_to(writer)
                .map_err(io::Error::other),
        }
    }
}

impl FromIterator<QueryResult> for QueryResultSet {
    fn from_iter<I: IntoIterator<Item = QueryResult>>(iter: I) -> Self {
        Self {
            results: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for QueryResultSet {
    type Item = QueryResult;
    type IntoIter = std::vec::IntoIter<QueryResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}
