//! Built-in IGC track parser.
//!
//! Decodes the file ([`reader`]) and then runs flight detection on the fixes
//! ([`analysis`]). Files that decode but do not hold a usable flight come back
//! as invalid tracks with notes saying why.

pub mod analysis;
pub mod reader;

use std::path::Path;

use tracing::debug;

use crate::config::AnalysisConfig;
use crate::error::{Error, Result};
use crate::track::{ParsedTrack, TrackParser};

pub use analysis::{detect_flight, detect_thermals, FlightSpan};
pub use reader::{read_log, IgcLog};

/// [`TrackParser`] for IGC files.
#[derive(Debug, Clone, Default)]
pub struct IgcParser {
    config: AnalysisConfig,
}

impl IgcParser {
    /// Create a parser using the given detection thresholds.
    #[must_use]
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Parse and analyse the text of an IGC file.
    #[must_use]
    pub fn parse_text(&self, text: &str) -> ParsedTrack {
        let log = read_log(text);
        if log.skipped_records > 0 {
            debug!(skipped = log.skipped_records, "Undecodable B records");
        }

        let mut notes = Vec::new();
        if log.date.is_none() {
            notes.push("Missing date header (HFDTE)".to_string());
        }
        if log.fixes.len() < self.config.min_fixes {
            notes.push(format!(
                "Too few fixes: {} (need at least {})",
                log.fixes.len(),
                self.config.min_fixes
            ));
        }
        let span = detect_flight(&log.fixes, &self.config);
        if span.is_none() {
            notes.push("No takeoff detected".to_string());
        }

        let glider_type = log.glider_type.unwrap_or_default();
        match span {
            Some(span) if notes.is_empty() => ParsedTrack {
                valid: true,
                notes,
                glider_type,
                takeoff_fix: Some(log.fixes[span.takeoff]),
                landing_fix: Some(log.fixes[span.landing]),
                thermals: detect_thermals(&log.fixes, span, &self.config),
                fixes: log.fixes,
            },
            _ => ParsedTrack {
                glider_type,
                fixes: log.fixes,
                ..ParsedTrack::invalid(notes)
            },
        }
    }
}

impl TrackParser for IgcParser {
    fn parse(&self, path: &Path) -> Result<ParsedTrack> {
        let bytes = std::fs::read(path).map_err(|e| Error::track_parse(path, e.to_string()))?;
        // headers are free text and not always UTF-8
        let text = String::from_utf8_lossy(&bytes);
        Ok(self.parse_text(&text))
    }
}
