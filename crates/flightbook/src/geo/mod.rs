//! Geospatial context for flights.
//!
//! - [`GeoPoint`] and great-circle distance
//! - [`HttpClient`]: the seam through which lookup services are called
//! - [`peaks`]: nearest named summit around a coordinate (Overpass)
//! - [`places`]: place name for a coordinate (Nominatim reverse geocoding)

mod http;
pub mod peaks;
pub mod places;

use std::fmt;

pub use http::{HttpClient, ReqwestClient};
pub use peaks::{FeatureResolver, NamedFeature, OverpassPeakResolver};
pub use places::{NominatimPlaceResolver, PlaceResolver};

/// Mean earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0088;

/// A WGS-84 latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    /// Latitude in degrees, positive north.
    pub lat: f64,
    /// Longitude in degrees, positive east.
    pub lon: f64,
}

impl GeoPoint {
    /// Create a point from latitude and longitude.
    #[must_use]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Great-circle distance to `other` in kilometers (haversine).
    #[must_use]
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let delta_lat = (other.lat - self.lat).to_radians();
        let delta_lon = (other.lon - self.lon).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().asin();

        EARTH_RADIUS_KM * c
    }
}

/// Formats as `lat,lon`, the form used in the flight book.
impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lon)
    }
}
