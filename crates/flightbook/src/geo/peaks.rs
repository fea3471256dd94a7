//! Nearest named summit around a coordinate.
//!
//! Takeoffs are usually on unnamed slopes, so the flight book labels them with
//! the closest tagged peak. The lookup is best effort: whatever goes wrong,
//! the caller gets the configured fallback label and the run carries on.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use tracing::{debug, error, warn};

use super::{GeoPoint, HttpClient};
use crate::config::PeaksConfig;
use crate::error::{Error, Result};

const SERVICE: &str = "overpass";

/// A tagged summit near the query point.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedFeature {
    /// Value of the `name` tag.
    pub name: String,
    /// Value of the `ele` tag, in meters.
    pub elevation: f64,
    /// Position of the summit.
    pub point: GeoPoint,
    /// Great-circle distance from the query point, in kilometers.
    pub distance_km: f64,
}

/// Resolves a coordinate to the name of a nearby terrain feature.
///
/// Implementations never fail; they answer with a fallback label instead.
pub trait FeatureResolver: Send + Sync {
    /// Name of the nearest feature to `point`, or the fallback label.
    fn nearest_feature_name(&self, point: GeoPoint) -> String;
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    lat: Option<f64>,
    lon: Option<f64>,
    #[serde(default)]
    tags: HashMap<String, String>,
}

/// Peak lookup backed by an Overpass API interpreter.
#[derive(Debug)]
pub struct OverpassPeakResolver<C> {
    client: C,
    endpoint: String,
    search_radius_m: u32,
    fallback_label: String,
}

impl<C: HttpClient> OverpassPeakResolver<C> {
    /// Create a resolver from the `[peaks]` configuration section.
    #[must_use]
    pub fn new(client: C, config: &PeaksConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            search_radius_m: config.search_radius_m,
            fallback_label: config.fallback_label.clone(),
        }
    }

    /// Overpass QL selecting every `natural=peak` node within the radius.
    #[must_use]
    pub fn query(&self, point: GeoPoint) -> String {
        format!(
            "[out:json];node[natural=peak](around:{},{},{});out;",
            self.search_radius_m, point.lat, point.lon
        )
    }

    /// Fetch all named peaks with an elevation around `point`, in the
    /// service's response order.
    ///
    /// Candidates missing a tag, a position, or carrying an unreadable
    /// elevation are left out.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the reply is not valid JSON.
    pub fn candidates(&self, point: GeoPoint) -> Result<Vec<NamedFeature>> {
        let body = self
            .client
            .get(&self.endpoint, &[("data", self.query(point))])?;
        let response: OverpassResponse = serde_json::from_slice(&body)?;

        let features = response
            .elements
            .into_iter()
            .filter_map(|element| to_feature(element, point))
            .collect();
        Ok(features)
    }

    /// The candidate with the smallest whole-kilometer distance to `point`.
    ///
    /// Distances are truncated before comparing, so candidates in the same
    /// kilometer band tie and the first one in response order wins.
    ///
    /// # Errors
    ///
    /// Returns an error if the candidates cannot be fetched.
    pub fn nearest(&self, point: GeoPoint) -> Result<Option<NamedFeature>> {
        let nearest = self
            .candidates(point)?
            .into_iter()
            .min_by_key(|feature| whole_km(feature.distance_km));
        Ok(nearest)
    }
}

impl<C: HttpClient> FeatureResolver for OverpassPeakResolver<C> {
    fn nearest_feature_name(&self, point: GeoPoint) -> String {
        match self.nearest(point) {
            Ok(Some(feature)) => {
                debug!(
                    name = %feature.name,
                    distance_km = feature.distance_km,
                    elevation = feature.elevation,
                    "Nearest peak found"
                );
                feature.name
            }
            Ok(None) => {
                debug!(%point, "No named peak within search radius");
                self.fallback_label.clone()
            }
            Err(e) if e.is_lookup_error() => {
                warn!(%point, "Peak lookup failed: {e}");
                self.fallback_label.clone()
            }
            Err(e) => {
                error!(%point, "Unexpected error during peak lookup: {e}");
                self.fallback_label.clone()
            }
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn whole_km(distance_km: f64) -> i64 {
    distance_km.trunc() as i64
}

fn to_feature(element: OverpassElement, origin: GeoPoint) -> Option<NamedFeature> {
    let (Some(name), Some(raw_ele)) = (element.tags.get("name"), element.tags.get("ele")) else {
        return None;
    };
    let (Some(lat), Some(lon)) = (element.lat, element.lon) else {
        debug!(%name, "Skipping peak without position");
        return None;
    };
    let elevation = match parse_elevation(raw_ele) {
        Ok(elevation) => elevation,
        Err(e) => {
            debug!(%name, "Skipping peak: {e}");
            return None;
        }
    };

    let point = GeoPoint::new(lat, lon);
    Some(NamedFeature {
        name: name.clone(),
        elevation,
        point,
        distance_km: origin.distance_km(&point),
    })
}

fn elevation_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*(-?\d+(?:[.,]\d+)?)\s*(?:m|Meter|meters?)?\s*$")
            .expect("elevation pattern is valid")
    })
}

/// Read an OSM `ele` tag such as `2962`, `2962 m`, `2962 Meter` or `2962,5`.
///
/// # Errors
///
/// Returns an error if the value is not a plain number with an optional
/// meter suffix.
pub fn parse_elevation(raw: &str) -> Result<f64> {
    let captures = elevation_pattern()
        .captures(raw)
        .ok_or_else(|| Error::lookup(SERVICE, format!("unreadable elevation {raw:?}")))?;
    captures[1]
        .replace(',', ".")
        .parse::<f64>()
        .map_err(|e| Error::lookup(SERVICE, format!("unreadable elevation {raw:?}: {e}")))
}
