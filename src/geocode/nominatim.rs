//! HTTP reverse geocoding against a Nominatim-compatible endpoint.
//!
//! Works with the public OpenStreetMap instance and with hosted services
//! that accept the same `reverse` API plus a `key` parameter. Every request
//! carries a timeout; nothing is retried.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::Url;
use serde::Deserialize;

use super::{GeocodeError, GeocodeProvider, Place};

/// Public OpenStreetMap reverse endpoint.
pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/reverse";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    display_name: Option<String>,
    error: Option<String>,
}

/// Blocking Nominatim client.
#[derive(Debug)]
pub struct NominatimGeocoder {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
}

impl NominatimGeocoder {
    /// Build a client for `base_url` with a per-request `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Provider`] for an unparseable URL and
    /// [`GeocodeError::Http`] if the HTTP client cannot be constructed.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, GeocodeError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| GeocodeError::Provider(format!("invalid URL '{base_url}': {e}")))?;
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url,
            api_key: None,
        })
    }

    /// Send `key=<api_key>` with every request.
    #[must_use]
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.is_empty());
        self
    }

    fn request_url(&self, latitude: f64, longitude: f64) -> Url {
        let mut url = self.base_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("format", "jsonv2")
                .append_pair("lat", &latitude.to_string())
                .append_pair("lon", &longitude.to_string());
            if let Some(key) = &self.api_key {
                query.append_pair("key", key);
            }
        }
        url
    }
}

impl GeocodeProvider for NominatimGeocoder {
    fn name(&self) -> &str {
        "nominatim"
    }

    fn reverse(&self, latitude: f64, longitude: f64) -> Result<Place, GeocodeError> {
        let response: ReverseResponse = self
            .client
            .get(self.request_url(latitude, longitude))
            .send()?
            .error_for_status()?
            .json()?;

        if let Some(error) = response.error {
            return Err(GeocodeError::Provider(error));
        }

        response
            .display_name
            .filter(|name| !name.is_empty())
            .map(Place::new)
            .ok_or(GeocodeError::NoAddress {
                latitude,
                longitude,
            })
    }
}
