//! Reverse geocoding with a per-run place cache.
//!
//! # Architecture
//!
//! * [`GeocodeProvider`]: turns a coordinate into a formatted address.
//!   [`offline`] and [`nominatim`] hold the shipped implementations.
//! * [`GeocodeCache`]: memoizes provider answers under a key of both
//!   coordinates rounded to six significant digits, so near-duplicate fixes
//!   cost one lookup.
//! * [`Enricher`]: applies the gating rule (enrichment requested *and* a
//!   provider configured) and downgrades provider failures to a logged,
//!   per-lookup [`Enrichment::Failed`].
//!
//! # Cache Keys
//!
//! The rounded key only decides whether a lookup is needed. On a miss the
//! provider always receives the original full-precision coordinates.

pub mod nominatim;
pub mod offline;

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::index::GeographicRecord;

pub use nominatim::NominatimGeocoder;
pub use offline::OfflineGeocoder;

/// Significant digits kept in a cache key.
pub const KEY_SIGNIFICANT_DIGITS: usize = 6;

/// A human-readable place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Place {
    /// Formatted address as returned by the provider.
    pub formatted_address: String,
}

impl Place {
    /// Create a place from an address string.
    #[must_use]
    pub fn new(formatted_address: impl Into<String>) -> Self {
        Self {
            formatted_address: formatted_address.into(),
        }
    }
}

impl fmt::Display for Place {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.formatted_address)
    }
}

/// Errors a provider can report for a single lookup.
#[derive(thiserror::Error, Debug)]
pub enum GeocodeError {
    /// The HTTP request failed, timed out, or returned an error status.
    #[error("Geocoding request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered but had no address for the coordinate.
    #[error("No address found for ({latitude},{longitude})")]
    NoAddress {
        /// Queried latitude
        latitude: f64,
        /// Queried longitude
        longitude: f64,
    },

    /// The provider reported an error of its own.
    #[error("Geocoding provider error: {0}")]
    Provider(String),
}

/// Reverse-geocoding backend.
pub trait GeocodeProvider {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Look up the address of a coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] when the provider cannot answer.
    fn reverse(&self, latitude: f64, longitude: f64) -> Result<Place, GeocodeError>;
}

/// Build the cache key for a coordinate.
///
/// Both values are rendered in scientific notation with
/// [`KEY_SIGNIFICANT_DIGITS`] significant digits.
#[must_use]
pub fn place_key(latitude: f64, longitude: f64) -> String {
    let precision = KEY_SIGNIFICANT_DIGITS - 1;
    format!("{latitude:.precision$e},{longitude:.precision$e}")
}

/// Counters for cache behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeocodeStats {
    /// Lookups answered from the cache
    pub hits: usize,
    /// Lookups that went to the provider
    pub misses: usize,
    /// Provider calls that failed
    pub failures: usize,
}

/// Memoizing wrapper around a provider.
pub struct GeocodeCache {
    provider: Box<dyn GeocodeProvider>,
    places: HashMap<String, Place>,
    stats: GeocodeStats,
}

impl fmt::Debug for GeocodeCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeocodeCache")
            .field("provider", &self.provider.name())
            .field("places", &self.places.len())
            .field("stats", &self.stats)
            .finish()
    }
}

impl GeocodeCache {
    /// Create an empty cache in front of `provider`.
    #[must_use]
    pub fn new(provider: Box<dyn GeocodeProvider>) -> Self {
        Self {
            provider,
            places: HashMap::new(),
            stats: GeocodeStats::default(),
        }
    }

    /// Address for a coordinate, from the cache when possible.
    ///
    /// A failed lookup leaves the cache untouched.
    ///
    /// # Errors
    ///
    /// Propagates the provider's [`GeocodeError`] on a miss.
    pub fn address_for(&mut self, latitude: f64, longitude: f64) -> Result<Place, GeocodeError> {
        let key = place_key(latitude, longitude);
        if let Some(place) = self.places.get(&key) {
            self.stats.hits += 1;
            return Ok(place.clone());
        }

        self.stats.misses += 1;
        log::debug!(
            "Geocode miss for {} via {}; querying ({},{})",
            key,
            self.provider.name(),
            latitude,
            longitude
        );

        match self.provider.reverse(latitude, longitude) {
            Ok(place) => {
                self.places.insert(key, place.clone());
                Ok(place)
            }
            Err(e) => {
                self.stats.failures += 1;
                Err(e)
            }
        }
    }

    /// Number of cached places.
    #[must_use]
    pub fn len(&self) -> usize {
        self.places.len()
    }

    /// Whether nothing has been cached yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }

    /// Cache counters.
    #[must_use]
    pub fn stats(&self) -> GeocodeStats {
        self.stats
    }
}

/// Result of trying to attach a place to one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Enrichment {
    /// Not requested, or no provider configured.
    Skipped,
    /// A place was found.
    Placed(Place),
    /// The provider failed; the record goes out without a place.
    Failed,
}

impl Enrichment {
    /// The place, if one was found.
    #[must_use]
    pub fn into_place(self) -> Option<Place> {
        match self {
            Self::Placed(place) => Some(place),
            Self::Skipped | Self::Failed => None,
        }
    }
}

/// Gatekeeper for place enrichment.
#[derive(Debug, Default)]
pub struct Enricher {
    cache: Option<GeocodeCache>,
}

impl Enricher {
    /// Enricher backed by a cache.
    #[must_use]
    pub fn new(cache: GeocodeCache) -> Self {
        Self { cache: Some(cache) }
    }

    /// Enricher for builds or configurations without geocoding.
    #[must_use]
    pub fn unsupported() -> Self {
        Self { cache: None }
    }

    /// Whether a provider is configured.
    #[must_use]
    pub fn is_supported(&self) -> bool {
        self.cache.is_some()
    }

    /// Underlying cache, if any.
    #[must_use]
    pub fn cache(&self) -> Option<&GeocodeCache> {
        self.cache.as_ref()
    }

    /// Attach a place to `record` when `requested` and supported.
    pub fn enrich(&mut self, requested: bool, record: &GeographicRecord) -> Enrichment {
        if !requested {
            return Enrichment::Skipped;
        }
        let Some(cache) = self.cache.as_mut() else {
            return Enrichment::Skipped;
        };

        match cache.address_for(record.latitude, record.longitude) {
            Ok(place) => Enrichment::Placed(place),
            Err(e) => {
                log::warn!(
                    "Reverse geocoding failed for ({:.6},{:.6}): {}",
                    record.latitude,
                    record.longitude,
                    e
                );
                Enrichment::Failed
            }
        }
    }
}
