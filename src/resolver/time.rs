//! Timestamp resolution with memoization.
//!
//! # Match modes
//!
//! - [`MatchMode::Exact`]: fixes at precisely the requested instant.
//! - [`MatchMode::Nearest`]: fixes at the indexed instant closest to the
//!   request, provided it lies within the search interval (inclusive). All
//!   co-timestamped fixes at that instant are returned. Between two equally
//!   distant instants the earlier one wins.
//!
//! # Memoization
//!
//! Resolved sets are cached for the life of the resolver under
//! `(requested timestamp, mode, options)`. The key is the requested time,
//! not the matched one, and it includes the enrichment and annotation
//! switches so an unenriched first call never masks a later enriched one.
//! A set whose enrichment failed for any fix is returned but not cached.
//! "Not found" outcomes are not cached either.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use super::{ResolveError, ResolveOptions};
use crate::geocode::{Enricher, Enrichment};
use crate::index::TimeSeries;
use crate::output::text::format_timestamp;
use crate::output::{QueryResult, QueryResultSet};

/// Default nearest-match tolerance.
pub const DEFAULT_SEARCH_INTERVAL: Duration = Duration::minutes(5);

/// How a timestamp is matched against the series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchMode {
    /// Only fixes at exactly the requested instant.
    Exact,
    /// Fixes at the nearest instant within the search interval.
    Nearest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CacheKey {
    timestamp: DateTime<Utc>,
    mode: MatchMode,
    options: ResolveOptions,
}

/// Counters for resolver behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolverStats {
    /// Resolutions answered from the cache
    pub cache_hits: usize,
    /// Resolutions that searched the series
    pub searches: usize,
    /// Resolutions that found nothing
    pub not_found: usize,
}

/// Memoizing time resolver over a [`TimeSeries`].
#[derive(Debug)]
pub struct TimeResolver<S> {
    series: S,
    search_interval: Duration,
    cache: HashMap<CacheKey, QueryResultSet>,
    stats: ResolverStats,
}

impl<S: TimeSeries> TimeResolver<S> {
    /// Create a resolver with [`DEFAULT_SEARCH_INTERVAL`].
    #[must_use]
    pub fn new(series: S) -> Self {
        Self {
            series,
            search_interval: DEFAULT_SEARCH_INTERVAL,
            cache: HashMap::new(),
            stats: ResolverStats::default(),
        }
    }

    /// Set the nearest-match tolerance. Negative values are treated as zero.
    #[must_use]
    pub fn with_search_interval(mut self, window: Duration) -> Self {
        self.search_interval = window.max(Duration::zero());
        self
    }

    /// Current nearest-match tolerance.
    #[must_use]
    pub fn search_interval(&self) -> Duration {
        self.search_interval
    }

    /// Resolve `timestamp` to the matching fixes.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::NotFound`] when no fix matches, and
    /// [`ResolveError::Index`] when the series itself fails.
    pub fn resolve(
        &mut self,
        timestamp: DateTime<Utc>,
        mode: MatchMode,
        options: ResolveOptions,
        enricher: &mut Enricher,
    ) -> Result<QueryResultSet, ResolveError> {
        let key = CacheKey {
            timestamp,
            mode,
            options,
        };
        if let Some(cached) = self.cache.get(&key) {
            self.stats.cache_hits += 1;
            log::trace!("Time cache hit for {}", format_timestamp(&timestamp));
            return Ok(cached.clone());
        }

        self.stats.searches += 1;

        let matched = match mode {
            MatchMode::Exact => Some(timestamp),
            MatchMode::Nearest => self.series.nearest(timestamp, self.search_interval)?,
        };

        let records = match matched {
            Some(matched) => self.series.exact(matched)?,
            None => Vec::new(),
        };

        if records.is_empty() {
            self.stats.not_found += 1;
            log::debug!(
                "No {} time for: [{}]",
                if mode == MatchMode::Exact { "exact" } else { "nearest" },
                format_timestamp(&timestamp)
            );
            return Err(ResolveError::NotFound(format_timestamp(&timestamp)));
        }

        let mut complete = true;
        let results: QueryResultSet = records
            .into_iter()
            .map(|record| {
                let snapped = record.timestamp != timestamp;
                let place = match enricher.enrich(options.enrich, &record) {
                    Enrichment::Placed(place) => Some(place),
                    Enrichment::Skipped => None,
                    Enrichment::Failed => {
                        complete = false;
                        None
                    }
                };
                QueryResult::new(record)
                    .with_place(place)
                    .with_original_timestamp((options.annotate && snapped).then_some(timestamp))
            })
            .collect();

        if complete {
            self.cache.insert(key, results.clone());
        } else {
            log::debug!(
                "Not caching resolution for {}: enrichment incomplete",
                format_timestamp(&timestamp)
            );
        }

        Ok(results)
    }

    /// Resolver counters.
    #[must_use]
    pub fn stats(&self) -> ResolverStats {
        self.stats
    }

    /// Number of memoized resolutions.
    #[must_use]
    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}
