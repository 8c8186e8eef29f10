//! JSON output for scripting.
//!
//! Writes the results as a pretty-printed array. Optional fields are
//! omitted rather than written as `null`.

use std::io;

use thiserror::Error;

use super::QueryResult;

/// Errors that can occur during JSON output generation.
#[derive(Debug, Error)]
pub enum JsonOutputError {
    /// I/O error during writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error during JSON serialization.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// JSON formatter over a slice of results.
pub struct JsonOutput<'a> {
    results: &'a [QueryResult],
}

impl<'a> JsonOutput<'a> {
    /// Create a formatter. Results are written in the order given.
    #[must_use]
    pub fn new(results: &'a [QueryResult]) -> Self {
        Self { results }
    }

    /// Serialize to a pretty JSON string.
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self.results)
    }

    /// Write the JSON array followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns `JsonOutputError` if writing or serialization fails.
    pub fn write_to<W: io::Write>(&self, mut writer: W) -> Result<(), JsonOutputError> {
        serde_json::to_writer_pretty(&mut writer, self.results)?;
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }
}
