//! Offline reverse geocoding against the embedded GeoNames city database.

use reverse_geocoder::ReverseGeocoder;

use super::{GeocodeError, GeocodeProvider, Place};

/// Nearest-city geocoder that needs no network or credentials.
pub struct OfflineGeocoder {
    geocoder: ReverseGeocoder,
}

impl Default for OfflineGeocoder {
    fn default() -> Self {
        Self::new()
    }
}

impl OfflineGeocoder {
    /// Load the embedded city database.
    #[must_use]
    pub fn new() -> Self {
        Self {
            geocoder: ReverseGeocoder::new(),
        }
    }
}

impl GeocodeProvider for OfflineGeocoder {
    fn name(&self) -> &str {
        "offline"
    }

    fn reverse(&self, latitude: f64, longitude: f64) -> Result<Place, GeocodeError> {
        let result = self.geocoder.search((latitude, longitude));
        let record = result.record;

        if record.name.is_empty() {
            return Err(GeocodeError::NoAddress {
                latitude,
                longitude,
            });
        }

        let country = rust_iso3166::from_alpha2(&record.cc)
            .map_or_else(|| record.cc.clone(), |c| c.name.to_string());

        let parts: Vec<&str> = [record.name.as_str(), record.admin1.as_str(), country.as_str()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Place::new(parts.join(", ")))
    }
}
