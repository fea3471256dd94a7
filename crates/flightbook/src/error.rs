//! Error types for flightbook.
//!
//! This module defines all error types used throughout the flightbook crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for flightbook operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Track Errors ===
    /// A track file could not be read or decoded.
    #[error("failed to parse track {path}: {message}")]
    TrackParse {
        /// Path to the track file.
        path: PathBuf,
        /// Description of what went wrong.
        message: String,
    },

    // === Lookup Errors ===
    /// An HTTP request to a lookup service failed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// A lookup service answered with something we could not interpret.
    #[error("{service} lookup failed: {message}")]
    Lookup {
        /// Name of the service that was queried.
        service: &'static str,
        /// Description of what went wrong.
        message: String,
    },

    // === Output Errors ===
    /// Failed to write the flight book table.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to move a freshly written table into place.
    #[error("failed to replace {path}: {source}")]
    OutputReplace {
        /// Destination path.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for flightbook operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new track parse error.
    #[must_use]
    pub fn track_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::TrackParse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new HTTP error.
    #[must_use]
    pub fn http(message: impl Into<String>) -> Self {
        Self::Http(message.into())
    }

    /// Create a new lookup error for the named service.
    #[must_use]
    pub fn lookup(service: &'static str, message: impl Into<String>) -> Self {
        Self::Lookup {
            service,
            message: message.into(),
        }
    }

    /// Create a new configuration validation error.
    #[must_use]
    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }

    /// Check if this error came from talking to a lookup service.
    ///
    /// These are the failures the nearest-peak lookup absorbs into its
    /// fallback label.
    #[must_use]
    pub fn is_lookup_error(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Lookup { .. } | Self::Json(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::http("connection refused");
        assert_eq!(err.to_string(), "HTTP error: connection refused");
    }

    #[test]
    fn test_track_parse_error_display() {
        let err = Error::track_parse("/flights/a.igc", "not valid UTF-8");
        let msg = err.to_string();
        assert!(msg.contains("/flights/a.igc"));
        assert!(msg.contains("not valid UTF-8"));
    }

    #[test]
    fn test_lookup_error_display() {
        let err = Error::lookup("nominatim", "reply has no address");
        assert_eq!(
            err.to_string(),
            "nominatim lookup failed: reply has no address"
        );
    }

    #[test]
    fn test_is_lookup_error() {
        assert!(Error::http("timeout").is_lookup_error());
        assert!(Error::lookup("overpass", "bad reply").is_lookup_error());
        assert!(!Error::config_validation("bad").is_lookup_error());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
            assert!(err.is_lookup_error());
        }
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::config_validation("search_radius_m must be greater than 0");
        assert!(err.to_string().contains("search_radius_m"));
    }

    #[test]
    fn test_directory_create_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: io_err,
        };
        assert!(err.to_string().contains("/root/forbidden"));
    }

    #[test]
    fn test_output_replace_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let err = Error::OutputReplace {
            path: PathBuf::from("/out/flightbook.csv"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("/out/flightbook.csv"));
        assert!(msg.contains("disk full"));
    }
}
