//! Query parsing.
//!
//! Turns a line of free text into a [`Query`]. Three layouts are recognized,
//! checked in this order:
//!
//! 1. `t <RFC3339>`: an explicit time query
//! 2. `l <lat>,<lon>`: an explicit location query
//! 3. bare text: an RFC 3339 timestamp, else a `lat,lon` pair
//!
//! Malformed input is reported as [`QueryError`], never as a panic.
//!
//! # Example
//!
//! ```
//! use geoquery::query::{parse_query, Query};
//!
//! let query = parse_query("  37.0 , -122.0  ").unwrap();
//! assert_eq!(query, Query::Location { latitude: 37.0, longitude: -122.0 });
//!
//! assert!(parse_query("t not-a-time").is_err());
//! ```

use std::fmt;

use chrono::{DateTime, Utc};

/// A parsed ad-hoc query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Query {
    /// Where was I at this instant?
    Time {
        /// Requested instant, normalized to UTC
        timestamp: DateTime<Utc>,
    },
    /// When was I near this coordinate?
    Location {
        /// Latitude in decimal degrees (not range-checked)
        latitude: f64,
        /// Longitude in decimal degrees (not range-checked)
        longitude: f64,
    },
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Time { timestamp } => write!(f, "{}", timestamp.to_rfc3339()),
            Self::Location {
                latitude,
                longitude,
            } => write!(f, "({latitude},{longitude})"),
        }
    }
}

/// Why a query line was rejected.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The text after `t ` is not an RFC 3339 timestamp.
    #[error("Could not parse annotated time query: {0}")]
    InvalidTimestamp(String),

    /// The text after `l ` is not a `lat,lon` pair.
    #[error("Could not parse annotated location query: {0}")]
    InvalidLocation(String),

    /// Bare text is neither a timestamp nor a coordinate pair.
    #[error("Query layout not recognized: {0}")]
    Unrecognized(String),
}

const TIME_PREFIX: &str = "t ";
const LOCATION_PREFIX: &str = "l ";

/// Parse one query line.
///
/// # Errors
///
/// Returns [`QueryError`] when the line matches none of the layouts.
pub fn parse_query(line: &str) -> Result<Query, QueryError> {
    let line = line.trim();

    if let Some(rest) = line.strip_prefix(TIME_PREFIX) {
        return parse_timestamp(rest)
            .map(|timestamp| Query::Time { timestamp })
            .map_err(|_| QueryError::InvalidTimestamp(rest.to_string()));
    }

    if let Some(rest) = line.strip_prefix(LOCATION_PREFIX) {
        return parse_location(rest)
            .map(|(latitude, longitude)| Query::Location {
                latitude,
                longitude,
            })
            .map_err(|_| QueryError::InvalidLocation(rest.to_string()));
    }

    if let Ok(timestamp) = parse_timestamp(line) {
        return Ok(Query::Time { timestamp });
    }

    parse_location(line)
        .map(|(latitude, longitude)| Query::Location {
            latitude,
            longitude,
        })
        .map_err(|_| QueryError::Unrecognized(line.to_string()))
}

/// Parse an RFC 3339 timestamp and normalize it to UTC.
///
/// # Errors
///
/// Returns [`QueryError::InvalidTimestamp`] when the text is not RFC 3339.
pub fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, QueryError> {
    let text = text.trim();
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| QueryError::InvalidTimestamp(text.to_string()))
}

/// Parse a `lat,lon` pair. Each field is trimmed and parsed independently.
///
/// # Errors
///
/// Returns [`QueryError::InvalidLocation`] unless the text has exactly two
/// comma-separated floating-point fields.
pub fn parse_location(text: &str) -> Result<(f64, f64), QueryError> {
    let invalid = || QueryError::InvalidLocation(text.trim().to_string());

    let mut parts = text.split(',');
    let (Some(lat), Some(lon), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(invalid());
    };

    let latitude = lat.trim().parse::<f64>().map_err(|_| invalid())?;
    let longitude = lon.trim().parse::<f64>().map_err(|_| invalid())?;

    Ok((latitude, longitude))
}
