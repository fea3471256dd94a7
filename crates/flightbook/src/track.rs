//! Parsed flight tracks.
//!
//! A [`ParsedTrack`] is what a [`TrackParser`] hands to the flight extractor:
//! the fix sequence of one recorder log together with the parser's verdict on
//! validity, the detected takeoff and landing, and the thermal segments.

use std::path::Path;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::geo::GeoPoint;

/// One timestamped position sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fix {
    /// UTC time of the sample.
    pub timestamp: DateTime<Utc>,
    /// Latitude in decimal degrees, WGS-84.
    pub lat: f64,
    /// Longitude in decimal degrees, WGS-84.
    pub lon: f64,
    /// Barometric altitude in meters.
    pub pressure_alt: i32,
    /// GNSS altitude in meters.
    pub gnss_alt: i32,
}

impl Fix {
    /// The position of this fix.
    #[must_use]
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }
}

/// A contiguous climbing segment of a track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thermal {
    /// Time the glider entered the climb.
    pub start: DateTime<Utc>,
    /// Time the glider left the climb.
    pub end: DateTime<Utc>,
    /// Altitude gained over the segment, in meters.
    pub alt_change: f64,
    /// Mean vertical velocity over the segment, in m/s.
    pub vertical_velocity: f64,
}

impl Thermal {
    /// Build the thermal spanning two fixes, using GNSS altitude.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn between(enter: &Fix, exit: &Fix) -> Self {
        let alt_change = f64::from(exit.gnss_alt - enter.gnss_alt);
        let secs = (exit.timestamp - enter.timestamp).num_milliseconds() as f64 / 1000.0;
        let vertical_velocity = if secs > 0.0 { alt_change / secs } else { 0.0 };
        Self {
            start: enter.timestamp,
            end: exit.timestamp,
            alt_change,
            vertical_velocity,
        }
    }
}

/// A recorder log after parsing and flight analysis.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedTrack {
    /// Whether the parser considers this a usable flight.
    pub valid: bool,
    /// Reasons the track was rejected; empty for valid tracks.
    pub notes: Vec<String>,
    /// Glider type from the log header, empty when absent.
    pub glider_type: String,
    /// All fixes in recording order.
    pub fixes: Vec<Fix>,
    /// The fix at which the flight started.
    pub takeoff_fix: Option<Fix>,
    /// The fix at which the flight ended.
    pub landing_fix: Option<Fix>,
    /// Detected thermals in flight order.
    pub thermals: Vec<Thermal>,
}

impl ParsedTrack {
    /// Build an invalid track carrying the given notes.
    #[must_use]
    pub fn invalid(notes: Vec<String>) -> Self {
        Self {
            valid: false,
            notes,
            ..Self::default()
        }
    }

    /// The rejection notes joined for display.
    #[must_use]
    pub fn notes_text(&self) -> String {
        self.notes.join("; ")
    }
}

/// Turns a recorder log on disk into a [`ParsedTrack`].
///
/// An `Err` means the file could not be read at all; a file that was read but
/// does not describe a usable flight comes back as an invalid track instead.
pub trait TrackParser: Send + Sync {
    /// Parse the track at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decoded.
    fn parse(&self, path: &Path) -> Result<ParsedTrack>;
}
