//! Coordinate index with a fixed "metro" radius.
//!
//! A query coordinate matches every fix within the metro radius. Results
//! come back nearest first; equal distances keep insertion order.

use geo::{Distance, Haversine, Point};

use super::{GeographicRecord, IndexError, NearbyIndex};

/// Default metro radius in kilometers.
pub const DEFAULT_METRO_RADIUS_KM: f64 = 25.0;

/// In-memory location index.
#[derive(Debug, Clone)]
pub struct LocationIndex {
    records: Vec<GeographicRecord>,
    radius_m: f64,
}

impl Default for LocationIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl LocationIndex {
    /// Create an empty index with the default metro radius.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            radius_m: DEFAULT_METRO_RADIUS_KM * 1000.0,
        }
    }

    /// Set the metro radius in kilometers.
    #[must_use]
    pub fn with_radius_km(mut self, radius_km: f64) -> Self {
        self.radius_m = radius_km * 1000.0;
        self
    }

    /// Metro radius in kilometers.
    #[must_use]
    pub fn radius_km(&self) -> f64 {
        self.radius_m / 1000.0
    }

    /// Add a record.
    pub fn insert(&mut self, record: GeographicRecord) {
        self.records.push(record);
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the index holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl NearbyIndex for LocationIndex {
    fn nearby(&self, latitude: f64, longitude: f64) -> Result<Vec<GeographicRecord>, IndexError> {
        let origin = Point::new(longitude, latitude);

        let mut hits: Vec<(f64, &GeographicRecord)> = self
            .records
            .iter()
            .filter_map(|r| {
                let d = Haversine.distance(origin, Point::new(r.longitude, r.latitude));
                (d <= self.radius_m).then_some((d, r))
            })
            .collect();

        // sort_by is stable, so equal distances stay in insertion order.
        hits.sort_by(|a, b| a.0.total_cmp(&b.0));

        Ok(hits.into_iter().map(|(_, r)| r.clone()).collect())
    }
}
