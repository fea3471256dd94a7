//! Flight detection on a fix sequence.
//!
//! Takeoff and landing are found from ground speed, thermals from a smoothed
//! vertical speed between takeoff and landing.

use crate::config::AnalysisConfig;
use crate::track::{Fix, Thermal};

/// Fixes on either side used for the centered vertical-speed estimate.
const VARIO_HALF_WINDOW: usize = 5;

/// Indices of the takeoff and landing fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlightSpan {
    /// Index of the first flying fix.
    pub takeoff: usize,
    /// Index of the last flying fix.
    pub landing: usize,
}

#[allow(clippy::cast_precision_loss)]
fn seconds_between(a: &Fix, b: &Fix) -> f64 {
    (b.timestamp - a.timestamp).num_milliseconds() as f64 / 1000.0
}

/// Ground speed from `a` to `b` in km/h; 0 when no time passed.
#[must_use]
pub fn ground_speed_kmh(a: &Fix, b: &Fix) -> f64 {
    let secs = seconds_between(a, b);
    if secs <= 0.0 {
        return 0.0;
    }
    a.point().distance_km(&b.point()) / secs * 3600.0
}

/// Find the flying part of the track.
///
/// The takeoff is the first fix that starts a run of `min_flying_fixes`
/// fixes each reached above `takeoff_speed_kmh`; the landing is the last fix
/// that ends such a run.
#[must_use]
pub fn detect_flight(fixes: &[Fix], config: &AnalysisConfig) -> Option<FlightSpan> {
    if fixes.len() < 2 {
        return None;
    }
    let needed = config.min_flying_fixes.max(1);
    // flying[i]: the glider moved fast enough to reach fix i
    let flying: Vec<bool> = std::iter::once(false)
        .chain(
            fixes
                .windows(2)
                .map(|pair| ground_speed_kmh(&pair[0], &pair[1]) > config.takeoff_speed_kmh),
        )
        .collect();

    let takeoff = flying
        .windows(needed)
        .position(|run| run.iter().all(|&f| f))?;
    let landing = flying
        .windows(needed)
        .rposition(|run| run.iter().all(|&f| f))?
        + needed
        - 1;

    (takeoff < landing).then_some(FlightSpan { takeoff, landing })
}

/// Centered vertical speed at every fix, in m/s.
fn smoothed_vario(fixes: &[Fix]) -> Vec<f64> {
    let last = fixes.len().saturating_sub(1);
    (0..fixes.len())
        .map(|i| {
            let from = &fixes[i.saturating_sub(VARIO_HALF_WINDOW)];
            let to = &fixes[(i + VARIO_HALF_WINDOW).min(last)];
            let secs = seconds_between(from, to);
            if secs > 0.0 {
                f64::from(to.gnss_alt - from.gnss_alt) / secs
            } else {
                0.0
            }
        })
        .collect()
}

/// Find the thermals within the flying part of the track.
///
/// A thermal is a maximal run of fixes climbing faster than `min_climb_rate`
/// that lasts at least `min_thermal_secs`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn detect_thermals(fixes: &[Fix], span: FlightSpan, config: &AnalysisConfig) -> Vec<Thermal> {
    let flight = &fixes[span.takeoff..=span.landing];
    let vario = smoothed_vario(flight);
    let min_secs = config.min_thermal_secs as f64;

    let mut thermals = Vec::new();
    let mut start: Option<usize> = None;
    for i in 0..=flight.len() {
        let climbing = vario.get(i).is_some_and(|&v| v > config.min_climb_rate);
        match (start, climbing) {
            (None, true) => start = Some(i),
            (Some(enter), false) => {
                let exit = i - 1;
                if seconds_between(&flight[enter], &flight[exit]) >= min_secs {
                    thermals.push(Thermal::between(&flight[enter], &flight[exit]));
                }
                start = None;
            }
            _ => {}
        }
    }
    thermals
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    /// Degrees of latitude covered per second at 36 km/h.
    const NORTH_PER_SEC: f64 = 0.01 / 111.195;

    struct Profile {
        fixes: Vec<Fix>,
        lat: f64,
        alt: i32,
        secs: i64,
    }

    impl Profile {
        fn new() -> Self {
            Self {
                fixes: Vec::new(),
                lat: 47.0,
                alt: 1500,
                secs: 0,
            }
        }

        /// Append one fix per second for `count` seconds.
        fn segment(mut self, count: usize, moving: bool, climb: i32) -> Self {
            for _ in 0..count {
                self.secs += 1;
                if moving {
                    self.lat += NORTH_PER_SEC;
                }
                self.alt += climb;
                self.fixes.push(Fix {
                    timestamp: Utc.timestamp_opt(1_689_321_600 + self.secs, 0).unwrap(),
                    lat: self.lat,
                    lon: 11.0,
                    pressure_alt: self.alt,
                    gnss_alt: self.alt,
                });
            }
            self
        }
    }

    #[test]
    fn test_ground_speed() {
        let fixes = Profile::new().segment(2, true, 0).fixes;
        assert!((ground_speed_kmh(&fixes[0], &fixes[1]) - 36.0).abs() < 0.1);
        assert!(ground_speed_kmh(&fixes[0], &fixes[0]).abs() < f64::EPSILON);
    }

    #[test]
    fn test_detect_flight() {
        let fixes = Profile::new()
            .segment(60, false, 0)
            .segment(300, true, -1)
            .segment(60, false, 0)
            .fixes;
        let span = detect_flight(&fixes, &AnalysisConfig::default()).unwrap();

        assert_eq!(span.takeoff, 60);
        assert_eq!(span.landing, 359);
    }

    #[test]
    fn test_detect_flight_ignores_short_moves() {
        let fixes = Profile::new()
            .segment(30, false, 0)
            .segment(3, true, 0)
            .segment(30, false, 0)
            .fixes;
        assert!(detect_flight(&fixes, &AnalysisConfig::default()).is_none());
    }

    #[test]
    fn test_detect_flight_on_ground_only() {
        let fixes = Profile::new().segment(100, false, 0).fixes;
        assert!(detect_flight(&fixes, &AnalysisConfig::default()).is_none());
    }

    #[test]
    fn test_detect_thermals() {
        let fixes = Profile::new()
            .segment(20, false, 0)
            .segment(100, true, -1)
            .segment(120, true, 2)
            .segment(100, true, -1)
            .segment(20, false, 0)
            .fixes;
        let config = AnalysisConfig::default();
        let span = detect_flight(&fixes, &config).unwrap();
        let thermals = detect_thermals(&fixes, span, &config);

        assert_eq!(thermals.len(), 1);
        let thermal = thermals[0];
        assert!((200.0..=260.0).contains(&thermal.alt_change), "{thermal:?}");
        assert!((1.5..=2.5).contains(&thermal.vertical_velocity), "{thermal:?}");
    }

    #[test]
    fn test_short_climb_is_not_a_thermal() {
        let fixes = Profile::new()
            .segment(20, false, 0)
            .segment(100, true, -1)
            .segment(15, true, 3)
            .segment(100, true, -1)
            .segment(20, false, 0)
            .fixes;
        let config = AnalysisConfig::default();
        let span = detect_flight(&fixes, &config).unwrap();

        assert!(detect_thermals(&fixes, span, &config).is_empty());
    }

    #[test]
    fn test_two_thermals() {
        let fixes = Profile::new()
            .segment(20, false, 0)
            .segment(60, true, -1)
            .segment(90, true, 3)
            .segment(60, true, -1)
            .segment(60, true, 1)
            .segment(60, true, -1)
            .segment(20, false, 0)
            .fixes;
        let config = AnalysisConfig::default();
        let span = detect_flight(&fixes, &config).unwrap();
        let thermals = detect_thermals(&fixes, span, &config);

        assert_eq!(thermals.len(), 2);
        assert!(thermals[0].vertical_velocity > thermals[1].vertical_velocity);
    }
}
