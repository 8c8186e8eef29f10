//! Query resolution.
//!
//! This module provides:
//! - [`TimeResolver`]: exact or nearest-within-tolerance time lookups, memoized
//! - [`LocationResolver`]: metro-radius coordinate lookups
//! - [`QueryEngine`]: owns both resolvers plus the [`Enricher`] and dispatches
//!   a parsed [`Query`] to the right one
//!
//! # Expected outcomes vs faults
//!
//! "Nothing matched" is [`ResolveError::NotFound`], which callers report and
//! move past. [`ResolveError::Index`] means the index backend itself failed
//! and is propagated as a fault.
//!
//! # Example
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use geoquery::geocode::Enricher;
//! use geoquery::index::{GeographicRecord, LocationIndex, TimeIndex};
//! use geoquery::query::Query;
//! use geoquery::resolver::{QueryEngine, ResolveOptions};
//!
//! let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
//! let record = GeographicRecord::new(ts, 37.0, -122.0);
//! let mut location_index = LocationIndex::new();
//! location_index.insert(record.clone());
//! let time_index = TimeIndex::from_records(vec![record]);
//!
//! let mut engine = QueryEngine::new(time_index, location_index, Enricher::unsupported());
//! let query = Query::Time { timestamp: ts + chrono::Duration::minutes(2) };
//! let results = engine.resolve(&query, ResolveOptions::default()).unwrap();
//! assert_eq!(results.len(), 1);
//! ```

pub mod location;
pub mod time;

use chrono::{DateTime, Duration, Utc};

use crate::geocode::Enricher;
use crate::index::{IndexError, NearbyIndex, TimeSeries};
use crate::output::QueryResultSet;
use crate::query::Query;

pub use location::LocationResolver;
pub use time::{MatchMode, ResolverStats, TimeResolver, DEFAULT_SEARCH_INTERVAL};

/// Errors from resolving a well-formed query.
#[derive(thiserror::Error, Debug)]
pub enum ResolveError {
    /// No indexed fix matches the query.
    #[error("No record found for: [{0}]")]
    NotFound(String),

    /// The index backend failed.
    #[error(transparent)]
    Index(#[from] IndexError),
}

impl ResolveError {
    /// Whether this is the expected "nothing matched" outcome.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Per-call switches for a resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ResolveOptions {
    /// Attach a place to each result (subject to provider support).
    pub enrich: bool,
    /// Record the requested time on results snapped to a different time.
    pub annotate: bool,
}

impl ResolveOptions {
    /// Set the enrichment switch.
    #[must_use]
    pub fn with_enrich(mut self, enrich: bool) -> Self {
        self.enrich = enrich;
        self
    }

    /// Set the annotation switch.
    #[must_use]
    pub fn with_annotate(mut self, annotate: bool) -> Self {
        self.annotate = annotate;
        self
    }
}

/// Both resolvers and the enricher, constructed once per run.
#[derive(Debug)]
pub struct QueryEngine<T, L> {
    time: TimeResolver<T>,
    location: LocationResolver<L>,
    enricher: Enricher,
}

impl<T: TimeSeries, L: NearbyIndex> QueryEngine<T, L> {
    /// Create an engine with the default search interval.
    #[must_use]
    pub fn new(series: T, nearby: L, enricher: Enricher) -> Self {
        Self {
            time: TimeResolver::new(series),
            location: LocationResolver::new(nearby),
            enricher,
        }
    }

    /// Set the nearest-match tolerance window.
    #[must_use]
    pub fn with_search_interval(mut self, window: Duration) -> Self {
        self.time = self.time.with_search_interval(window);
        self
    }

    /// Resolve a timestamp in the given mode.
    ///
    /// # Errors
    ///
    /// See [`TimeResolver::resolve`].
    pub fn resolve_time(
        &mut self,
        timestamp: DateTime<Utc>,
        mode: MatchMode,
        options: ResolveOptions,
    ) -> Result<QueryResultSet, ResolveError> {
        self.time
            .resolve(timestamp, mode, options, &mut self.enricher)
    }

    /// Resolve a coordinate.
    ///
    /// # Errors
    ///
    /// See [`LocationResolver::resolve`].
    pub fn resolve_location(
        &mut self,
        latitude: f64,
        longitude: f64,
        options: ResolveOptions,
    ) -> Result<QueryResultSet, ResolveError> {
        self.location
            .resolve(latitude, longitude, options.enrich, &mut self.enricher)
    }

    /// Resolve an ad-hoc query: nearest match for times, metro radius for
    /// locations.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::NotFound`] when nothing matches.
    pub fn resolve(
        &mut self,
        query: &Query,
        options: ResolveOptions,
    ) -> Result<QueryResultSet, ResolveError> {
        match *query {
            Query::Time { timestamp } => {
                self.resolve_time(timestamp, MatchMode::Nearest, options)
            }
            Query::Location {
                latitude,
                longitude,
            } => self.resolve_location(latitude, longitude, options),
        }
    }

    /// Time resolver counters.
    #[must_use]
    pub fn time_stats(&self) -> ResolverStats {
        self.time.stats()
    }

    /// The enricher, for inspecting geocode cache counters.
    #[must_use]
    pub fn enricher(&self) -> &Enricher {
        &self.enricher
    }
}
