//! Tab-delimited text output.
//!
//! # Columns
//!
//! ```text
//! [label]  timestamp  [[<-original]]  (lat,lon)  [place]
//! ```
//!
//! Bracketed columns only appear when present. Coordinates are printed with
//! six decimal places and timestamps as RFC 3339 in UTC.

use std::fmt::Write as _;
use std::io;

use chrono::{DateTime, SecondsFormat, Utc};

use super::QueryResult;

/// Render a timestamp the way every output line does.
#[must_use]
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Render one result as a single line (without newline).
#[must_use]
pub fn format_result(result: &QueryResult) -> String {
    let mut line = String::new();

    if let Some(label) = &result.label {
        line.push_str(label);
        line.push('\t');
    }

    line.push_str(&format_timestamp(&result.point.timestamp));

    if let Some(original) = &result.original_timestamp {
        let _ = write!(line, "\t[<-{}]", format_timestamp(original));
    }

    let _ = write!(
        line,
        "\t({:.6},{:.6})",
        result.point.latitude, result.point.longitude
    );

    if let Some(place) = &result.place {
        line.push('\t');
        line.push_str(&place.formatted_address);
    }

    line
}

/// Text formatter over a slice of results.
pub struct TextOutput<'a> {
    results: &'a [QueryResult],
}

impl<'a> TextOutput<'a> {
    /// Create a formatter. Results are written in the order given.
    #[must_use]
    pub fn new(results: &'a [QueryResult]) -> Self {
        Self { results }
    }

    /// Write one line per result.
    ///
    /// # Errors
    ///
    /// Returns any error from the writer.
    pub fn write_to<W: io::Write>(&self, mut writer: W) -> io::Result<()> {
        for result in self.results {
            writeln!(writer, "{}", format_result(result))?;
        }
        writer.flush()
    }
}
