//! Coordinate resolution within the metro radius.

use super::ResolveError;
use crate::geocode::Enricher;
use crate::index::NearbyIndex;
use crate::output::{QueryResult, QueryResultSet};

/// Location resolver over a [`NearbyIndex`]. Results are not memoized.
#[derive(Debug)]
pub struct LocationResolver<L> {
    nearby: L,
}

impl<L: NearbyIndex> LocationResolver<L> {
    /// Create a resolver.
    #[must_use]
    pub fn new(nearby: L) -> Self {
        Self { nearby }
    }

    /// Every fix within the index's metro radius of the coordinate, nearest
    /// first, each optionally enriched with a place.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::NotFound`] when no fix is within range and
    /// [`ResolveError::Index`] when the index fails.
    pub fn resolve(
        &mut self,
        latitude: f64,
        longitude: f64,
        enrich: bool,
        enricher: &mut Enricher,
    ) -> Result<QueryResultSet, ResolveError> {
        let records = self.nearby.nearby(latitude, longitude)?;
        if records.is_empty() {
            log::debug!("Nothing within range of ({latitude},{longitude})");
            return Err(ResolveError::NotFound(format!("({latitude},{longitude})")));
        }

        Ok(records
            .into_iter()
            .map(|record| {
                let place = enricher.enrich(enrich, &record).into_place();
                QueryResult::new(record).with_place(place)
            })
            .collect())
    }
}
