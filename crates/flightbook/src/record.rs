//! Flight records and their extraction from parsed tracks.
//!
//! A [`FlightRecord`] is one row of the flight book. [`FlightExtractor`] builds
//! it from a [`ParsedTrack`], labelling the takeoff with the nearest peak and
//! the landing with the place it falls into.

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::geo::{FeatureResolver, PlaceResolver};
use crate::source::TrackFile;
use crate::track::{ParsedTrack, Thermal};

/// One row of the flight book.
///
/// Field order is the column order of the written table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlightRecord {
    /// Day of month of the landing.
    #[serde(rename = "Day")]
    pub day: u32,
    /// Month of the landing.
    #[serde(rename = "Month")]
    pub month: u32,
    /// Year of the landing.
    #[serde(rename = "Year")]
    pub year: i32,
    /// Glider type from the log header.
    #[serde(rename = "Glider")]
    pub glider: String,
    /// Takeoff time as `HH:MM`, UTC.
    #[serde(rename = "Takeoff Time (UTC)")]
    pub takeoff_time: String,
    /// Name of the nearest peak to the takeoff.
    #[serde(rename = "Takeoff Location")]
    pub takeoff_location: String,
    /// Takeoff coordinate as `lat,lon`.
    #[serde(rename = "Takeoff lat,lon")]
    pub takeoff_coordinates: String,
    /// GNSS altitude at takeoff in meters.
    #[serde(rename = "GPS Altitude Takeoff (m)")]
    pub takeoff_altitude: i32,
    /// Landing time as `HH:MM`, UTC.
    #[serde(rename = "Landing Time (UTC)")]
    pub landing_time: String,
    /// Place name of the landing.
    #[serde(rename = "Landing Location")]
    pub landing_location: String,
    /// Landing coordinate as `lat,lon`.
    #[serde(rename = "Landing lat,lon")]
    pub landing_coordinates: String,
    /// GNSS altitude at landing in meters.
    #[serde(rename = "GPS Altitude Landing (m)")]
    pub landing_altitude: i32,
    /// Time between takeoff and landing in whole minutes.
    #[serde(rename = "Airtime (min)")]
    pub airtime_min: i64,
    /// Number of thermals.
    #[serde(rename = "Number of thermals")]
    pub thermal_count: usize,
    /// Sum of the per-thermal gains, each rounded to whole meters.
    #[serde(rename = "Thermal gain (m)")]
    pub thermal_gain: i64,
    /// Median of the thermals' vertical velocities, 0 without thermals.
    #[serde(rename = "Median thermal velocity (m/s)")]
    pub median_thermal_velocity: f64,
    /// File name of the source log.
    #[serde(rename = "IGC File")]
    pub igc_file: String,
}

impl FlightRecord {
    /// Column headers of the flight book, in order.
    pub const COLUMNS: [&'static str; 17] = [
        "Day",
        "Month",
        "Year",
        "Glider",
        "Takeoff Time (UTC)",
        "Takeoff Location",
        "Takeoff lat,lon",
        "GPS Altitude Takeoff (m)",
        "Landing Time (UTC)",
        "Landing Location",
        "Landing lat,lon",
        "GPS Altitude Landing (m)",
        "Airtime (min)",
        "Number of thermals",
        "Thermal gain (m)",
        "Median thermal velocity (m/s)",
        "IGC File",
    ];

    /// The `(year, month, day)` key the flight book is ordered by.
    #[must_use]
    pub fn date_key(&self) -> (i32, u32, u32) {
        (self.year, self.month, self.day)
    }
}

/// What the extractor made of one track.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// The track produced a flight book row.
    Record(Box<FlightRecord>),
    /// The parser rejected the track; the notes say why.
    Invalid {
        /// The parser's rejection notes.
        notes: String,
    },
}

/// Builds [`FlightRecord`]s from parsed tracks.
pub struct FlightExtractor {
    features: Box<dyn FeatureResolver>,
    places: Box<dyn PlaceResolver>,
}

impl std::fmt::Debug for FlightExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlightExtractor").finish_non_exhaustive()
    }
}

impl FlightExtractor {
    /// Create an extractor labelling takeoffs with `features` and landings
    /// with `places`.
    #[must_use]
    pub fn new(features: Box<dyn FeatureResolver>, places: Box<dyn PlaceResolver>) -> Self {
        Self { features, places }
    }

    /// Turn one parsed track into a flight book row.
    ///
    /// # Errors
    ///
    /// Returns an error if a valid track lacks its takeoff or landing fix, or
    /// if the landing place cannot be resolved.
    pub fn extract(&self, file: &TrackFile, track: &ParsedTrack) -> Result<Extraction> {
        if !track.valid {
            let notes = track.notes_text();
            warn!(file = %file.name, %notes, "Invalid track");
            return Ok(Extraction::Invalid { notes });
        }

        let takeoff = track
            .takeoff_fix
            .ok_or_else(|| Error::track_parse(&file.path, "valid track has no takeoff fix"))?;
        let landing = track
            .landing_fix
            .ok_or_else(|| Error::track_parse(&file.path, "valid track has no landing fix"))?;

        let airtime_min = airtime_minutes(takeoff.timestamp, landing.timestamp);
        if airtime_min < 0 {
            warn!(file = %file.name, airtime_min, "Landing precedes takeoff");
        }

        let takeoff_location = self.features.nearest_feature_name(takeoff.point());
        let landing_location = self.places.place_name(landing.point())?;

        let record = FlightRecord {
            day: landing.timestamp.day(),
            month: landing.timestamp.month(),
            year: landing.timestamp.year(),
            glider: track.glider_type.clone(),
            takeoff_time: clock_time(takeoff.timestamp),
            takeoff_location,
            takeoff_coordinates: takeoff.point().to_string(),
            takeoff_altitude: takeoff.gnss_alt,
            landing_time: clock_time(landing.timestamp),
            landing_location,
            landing_coordinates: landing.point().to_string(),
            landing_altitude: landing.gnss_alt,
            airtime_min,
            thermal_count: track.thermals.len(),
            thermal_gain: thermal_gain(&track.thermals),
            median_thermal_velocity: median_thermal_velocity(&track.thermals),
            igc_file: file.name.clone(),
        };
        debug!(file = %file.name, airtime_min, thermals = record.thermal_count, "Flight extracted");
        Ok(Extraction::Record(Box::new(record)))
    }
}

fn clock_time(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%H:%M").to_string()
}

/// Whole minutes from takeoff to landing, halves rounded to even.
///
/// Negative when the landing precedes the takeoff.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn airtime_minutes(takeoff: DateTime<Utc>, landing: DateTime<Utc>) -> i64 {
    let secs = (landing - takeoff).num_milliseconds() as f64 / 1000.0;
    (secs / 60.0).round_ties_even() as i64
}

/// Sum of the thermals' altitude gains, each rounded before summing.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn thermal_gain(thermals: &[Thermal]) -> i64 {
    thermals
        .iter()
        .map(|thermal| thermal.alt_change.round_ties_even() as i64)
        .sum()
}

/// Median vertical velocity of the thermals, 0 when there are none.
#[must_use]
pub fn median_thermal_velocity(thermals: &[Thermal]) -> f64 {
    let velocities: Vec<f64> = thermals.iter().map(|t| t.vertical_velocity).collect();
    median(velocities).unwrap_or(0.0)
}

/// Median of `values`; the mean of the two middle values for an even count.
#[must_use]
pub fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}
