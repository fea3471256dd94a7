//! Place names from reverse geocoding.
//!
//! Landings are usually in or near a settlement, so the flight book labels them
//! with the city or village the coordinate falls into. Unlike the peak lookup,
//! a failure here is returned to the caller.

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use serde::Deserialize;
use tracing::{debug, trace};

use super::{GeoPoint, HttpClient};
use crate::config::PlacesConfig;
use crate::error::{Error, Result};

const SERVICE: &str = "nominatim";

/// Resolves a coordinate to a human place name.
pub trait PlaceResolver: Send + Sync {
    /// Place name for `point`; empty when the address has no city or village.
    ///
    /// # Errors
    ///
    /// Returns an error if the geocoding service cannot be reached or its reply
    /// carries no address.
    fn place_name(&self, point: GeoPoint) -> Result<String>;
}

/// The address fields of a reverse-geocoding reply that the flight book uses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Address {
    /// City the point lies in.
    pub city: Option<String>,
    /// Village the point lies in.
    pub village: Option<String>,
}

impl Address {
    /// City if present, else village, else the empty string.
    #[must_use]
    pub fn place_label(&self) -> String {
        [&self.city, &self.village]
            .into_iter()
            .flatten()
            .find(|name| !name.is_empty())
            .cloned()
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    address: Option<Address>,
    error: Option<String>,
}

/// Reverse geocoding against a Nominatim instance.
#[derive(Debug)]
pub struct NominatimPlaceResolver<C> {
    client: C,
    endpoint: String,
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl<C: HttpClient> NominatimPlaceResolver<C> {
    /// Create a resolver from the `[places]` configuration section.
    #[must_use]
    pub fn new(client: C, config: &PlacesConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            min_interval: config.min_interval(),
            last_request: Mutex::new(None),
        }
    }

    /// Look up the structured address for `point`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the reply is not JSON, or the
    /// reply has no address.
    pub fn address(&self, point: GeoPoint) -> Result<Address> {
        self.wait_turn();

        let url = format!("{}/reverse", self.endpoint);
        let query = [
            ("format", "jsonv2".to_string()),
            ("lat", point.lat.to_string()),
            ("lon", point.lon.to_string()),
        ];
        let body = self.client.get(&url, &query)?;
        let response: ReverseResponse = serde_json::from_slice(&body)?;

        match (response.address, response.error) {
            (Some(address), _) => Ok(address),
            (None, Some(message)) => Err(Error::lookup(SERVICE, message)),
            (None, None) => Err(Error::lookup(SERVICE, "reply has no address")),
        }
    }

    /// Sleep until `min_interval` has passed since the previous request.
    fn wait_turn(&self) {
        let mut last = self
            .last_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                let pause = self.min_interval - elapsed;
                trace!(?pause, "Throttling reverse geocoding");
                std::thread::sleep(pause);
            }
        }
        *last = Some(Instant::now());
    }
}

impl<C: HttpClient> PlaceResolver for NominatimPlaceResolver<C> {
    fn place_name(&self, point: GeoPoint) -> Result<String> {
        let label = self.address(point)?.place_label();
        debug!(%point, place = %label, "Reverse geocoded");
        Ok(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CannedClient {
        body: String,
        calls: AtomicUsize,
        last_url: Mutex<String>,
    }

    impl CannedClient {
        fn new(body: &str) -> Self {
            Self {
                body: body.to_string(),
                calls: AtomicUsize::new(0),
                last_url: Mutex::new(String::new()),
            }
        }
    }

    impl HttpClient for CannedClient {
        fn get(&self, url: &str, _query: &[(&str, String)]) -> Result<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_url.lock().unwrap() = url.to_string();
            Ok(self.body.clone().into_bytes())
        }
    }

    struct DownClient;

    impl HttpClient for DownClient {
        fn get(&self, _url: &str, _query: &[(&str, String)]) -> Result<Vec<u8>> {
            Err(Error::http("connection refused"))
        }
    }

    fn unthrottled() -> PlacesConfig {
        PlacesConfig {
            min_interval_ms: 0,
            ..PlacesConfig::default()
        }
    }

    fn resolve(body: &str) -> Result<String> {
        NominatimPlaceResolver::new(CannedClient::new(body), &unthrottled())
            .place_name(GeoPoint::new(47.3, 11.4))
    }

    #[test]
    fn test_city_wins_over_village() {
        let name = resolve(r#"{"address": {"city": "Innsbruck", "village": "Igls"}}"#).unwrap();
        assert_eq!(name, "Innsbruck");
    }

    #[test]
    fn test_village_when_no_city() {
        let name = resolve(r#"{"address": {"village": "Greifenburg", "country": "Austria"}}"#)
            .unwrap();
        assert_eq!(name, "Greifenburg");
    }

    #[test]
    fn test_empty_when_neither() {
        let name = resolve(r#"{"address": {"town": "Lienz", "country": "Austria"}}"#).unwrap();
        assert_eq!(name, "");
    }

    #[test]
    fn test_empty_city_counts_as_absent() {
        let name = resolve(r#"{"address": {"city": "", "village": "Kössen"}}"#).unwrap();
        assert_eq!(name, "Kössen");
    }

    #[test]
    fn test_error_reply_is_an_error() {
        let err = resolve(r#"{"error": "Unable to geocode"}"#).unwrap_err();
        assert!(err.to_string().contains("Unable to geocode"));
    }

    #[test]
    fn test_reply_without_address_is_an_error() {
        let err = resolve(r#"{"place_id": 1}"#).unwrap_err();
        assert!(err.is_lookup_error());
    }

    #[test]
    fn test_transport_failure_propagates() {
        let resolver = NominatimPlaceResolver::new(DownClient, &unthrottled());
        let err = resolver.place_name(GeoPoint::new(0.0, 0.0)).unwrap_err();
        assert!(matches!(err, Error::Http(_)));
    }

    #[test]
    fn test_reverse_url() {
        let config = PlacesConfig {
            endpoint: "http://localhost:8080/".to_string(),
            min_interval_ms: 0,
        };
        let resolver = NominatimPlaceResolver::new(CannedClient::new(r#"{"address": {}}"#), &config);
        resolver.place_name(GeoPoint::new(1.0, 2.0)).unwrap();

        assert_eq!(
            *resolver.client.last_url.lock().unwrap(),
            "http://localhost:8080/reverse"
        );
    }

    #[test]
    fn test_requests_are_spaced() {
        let config = PlacesConfig {
            min_interval_ms: 50,
            ..PlacesConfig::default()
        };
        let resolver = NominatimPlaceResolver::new(CannedClient::new(r#"{"address": {}}"#), &config);

        let started = Instant::now();
        resolver.place_name(GeoPoint::new(1.0, 2.0)).unwrap();
        resolver.place_name(GeoPoint::new(1.0, 2.0)).unwrap();

        assert!(started.elapsed() >= Duration::from_millis(50));
        assert_eq!(resolver.client.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_address_place_label() {
        let address = Address {
            city: None,
            village: None,
        };
        assert_eq!(address.place_label(), "");
    }
}
