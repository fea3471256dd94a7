//! Configuration management for flightbook.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default configuration directory name.
const CONFIG_DIR_NAME: &str = "flightbook";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `FLIGHTBOOK_`, sections split on `__`)
/// 2. TOML config file at `~/.config/flightbook/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Output table configuration.
    pub output: OutputConfig,
    /// Nearest-peak lookup configuration.
    pub peaks: PeaksConfig,
    /// Reverse-geocoding configuration.
    pub places: PlacesConfig,
    /// Shared HTTP client configuration.
    pub http: HttpConfig,
    /// Track analysis thresholds.
    pub analysis: AnalysisConfig,
}

/// Output-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// File name of the flight book inside the output folder.
    pub filename: String,
}

/// Nearest-peak lookup configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeaksConfig {
    /// Overpass interpreter endpoint.
    pub endpoint: String,
    /// Search radius around the takeoff in meters.
    pub search_radius_m: u32,
    /// Label used when no peak can be determined.
    pub fallback_label: String,
}

/// Reverse-geocoding configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacesConfig {
    /// Nominatim base URL.
    pub endpoint: String,
    /// Minimum spacing between two reverse-geocoding requests.
    /// Set to 0 to disable.
    pub min_interval_ms: u64,
}

impl PlacesConfig {
    /// Get the request spacing as a Duration.
    #[must_use]
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }
}

/// HTTP client configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// User agent sent with every request.
    pub user_agent: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl HttpConfig {
    /// Get the request timeout as a Duration.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Thresholds used by the built-in IGC analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Minimum number of B records for a track to be considered.
    pub min_fixes: usize,
    /// Ground speed above which the glider counts as flying.
    pub takeoff_speed_kmh: f64,
    /// Consecutive flying fixes needed to confirm takeoff or landing.
    pub min_flying_fixes: usize,
    /// Vertical speed above which a fix counts as climbing (m/s).
    pub min_climb_rate: f64,
    /// Minimum duration of a climb to count as a thermal.
    pub min_thermal_secs: i64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            filename: "flightbook.csv".to_string(),
        }
    }
}

impl Default for PeaksConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://overpass-api.de/api/interpreter".to_string(),
            search_radius_m: 2000,
            fallback_label: "Unknown Location".to_string(),
        }
    }
}

impl Default for PlacesConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://nominatim.openstreetmap.org".to_string(),
            min_interval_ms: 1000, // public instance allows one request per second
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: "igc_flightbook".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_fixes: 50,
            takeoff_speed_kmh: 15.0,
            min_flying_fixes: 5,
            min_climb_rate: 0.5,
            min_thermal_secs: 45,
        }
    }
}

impl Config {
    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("FLIGHTBOOK_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        let filename = self.output.filename.trim();
        if filename.is_empty() {
            return Err(Error::config_validation("output filename must not be empty"));
        }
        if !is_bare_file_name(filename) {
            return Err(Error::config_validation(format!(
                "output filename must be a file name without a path separator: {filename}"
            )));
        }

        if self.peaks.endpoint.trim().is_empty() {
            return Err(Error::config_validation("peaks endpoint must not be empty"));
        }
        if self.peaks.search_radius_m == 0 {
            return Err(Error::config_validation(
                "search_radius_m must be greater than 0",
            ));
        }

        if self.places.endpoint.trim().is_empty() {
            return Err(Error::config_validation("places endpoint must not be empty"));
        }

        if self.http.timeout_secs == 0 {
            return Err(Error::config_validation("timeout_secs must be greater than 0"));
        }

        let analysis = &self.analysis;
        if analysis.min_flying_fixes == 0 {
            return Err(Error::config_validation(
                "min_flying_fixes must be greater than 0",
            ));
        }
        if analysis.min_fixes < analysis.min_flying_fixes {
            return Err(Error::config_validation(format!(
                "min_fixes ({}) cannot be less than min_flying_fixes ({})",
                analysis.min_fixes, analysis.min_flying_fixes
            )));
        }
        if analysis.takeoff_speed_kmh <= 0.0 {
            return Err(Error::config_validation(
                "takeoff_speed_kmh must be greater than 0",
            ));
        }
        if analysis.min_thermal_secs <= 0 {
            return Err(Error::config_validation(
                "min_thermal_secs must be greater than 0",
            ));
        }

        Ok(())
    }
}

/// Whether `name` stays inside the folder it is joined to.
pub(crate) fn is_bare_file_name(name: &str) -> bool {
    !name.contains(['/', '\\']) && name != "." && name != ".."
}
