//! Track-log indexes.
//!
//! This module holds the two indexes every query is answered from:
//! - [`TimeIndex`]: an ordered time series of position fixes
//! - [`LocationIndex`]: a coordinate index answering "what is nearby"
//!
//! The resolvers never touch these types directly. They consume the
//! [`TimeSeries`] and [`NearbyIndex`] traits, so tests (and alternative
//! index backends) can be substituted freely.
//!
//! # Example
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use geoquery::index::{GeographicRecord, TimeIndex, TimeSeries};
//!
//! let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
//! let mut index = TimeIndex::new();
//! index.insert(GeographicRecord::new(ts, 37.0, -122.0));
//!
//! let found = index.exact(ts).unwrap();
//! assert_eq!(found.len(), 1);
//! ```

pub mod ingest;
pub mod location;
pub mod time;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

pub use ingest::{Collector, CollectorStats, IngestError};
pub use location::{LocationIndex, DEFAULT_METRO_RADIUS_KM};
pub use time::TimeIndex;

/// A single position fix from a track log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeographicRecord {
    /// When the fix was taken.
    pub timestamp: DateTime<Utc>,
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// Elevation in meters, when the source file carries one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elevation: Option<f64>,
}

impl GeographicRecord {
    /// Create a record without elevation.
    #[must_use]
    pub fn new(timestamp: DateTime<Utc>, latitude: f64, longitude: f64) -> Self {
        Self {
            timestamp,
            latitude,
            longitude,
            elevation: None,
        }
    }

    /// Attach an elevation.
    #[must_use]
    pub fn with_elevation(mut self, elevation: Option<f64>) -> Self {
        self.elevation = elevation;
        self
    }
}

/// Errors raised by an index backend.
///
/// The in-memory indexes never fail, but the contract allows it so a
/// corrupt or remote backend surfaces as a fault rather than "not found".
#[derive(thiserror::Error, Debug)]
pub enum IndexError {
    /// The backend could not answer the query.
    #[error("Index unavailable: {0}")]
    Unavailable(String),
}

/// Ordered time series contract consumed by the time resolver.
pub trait TimeSeries {
    /// All records at exactly `timestamp`, in insertion order.
    /// An empty vector means no record exists at that instant.
    fn exact(&self, timestamp: DateTime<Utc>) -> Result<Vec<GeographicRecord>, IndexError>;

    /// The indexed timestamp nearest to `timestamp` whose distance is at most
    /// `window`, or `None` when nothing falls inside the window.
    ///
    /// When an earlier and a later timestamp are equally distant the earlier
    /// one is returned.
    fn nearest(
        &self,
        timestamp: DateTime<Utc>,
        window: Duration,
    ) -> Result<Option<DateTime<Utc>>, IndexError>;
}

/// Coordinate index contract consumed by the location resolver.
pub trait NearbyIndex {
    /// All records within the index's metro radius of the coordinate,
    /// nearest first. An empty vector means nothing is nearby.
    fn nearby(&self, latitude: f64, longitude: f64) -> Result<Vec<GeographicRecord>, IndexError>;
}

impl<T: TimeSeries + ?Sized> TimeSeries for &T {
    fn exact(&self, timestamp: DateTime<Utc>) -> Result<Vec<GeographicRecord>, IndexError> {
        (**self).exact(timestamp)
    }

    fn nearest(
        &self,
        timestamp: DateTime<Utc>,
        window: Duration,
    ) -> Result<Option<DateTime<Utc>>, IndexError> {
        (**self).nearest(timestamp, window)
    }
}

impl<T: NearbyIndex + ?Sized> NearbyIndex for &T {
    fn nearby(&self, latitude: f64, longitude: f64) -> Result<Vec<GeographicRecord>, IndexError> {
        (**self).nearby(latitude, longitude)
    }
}
