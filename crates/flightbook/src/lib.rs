//! `flightbook` - Build a flight book from a tree of IGC flight recorder logs
//!
//! This library discovers track files, extracts one statistics row per valid
//! flight, labels takeoff and landing through geospatial lookups, and keeps a
//! date-ordered semicolon-separated table up to date after every file.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod book;
pub mod cli;
pub mod config;
pub mod error;
pub mod geo;
pub mod igc;
pub mod logging;
pub mod pipeline;
pub mod progress;
pub mod record;
pub mod source;
pub mod track;

pub use book::{BookWriter, FlightBook};
pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use pipeline::{HaltReason, Pipeline, RunOutcome, RunRequest, RunSummary};
pub use progress::{ChannelSink, ConsoleSink, ProgressEvent, ProgressSink};
pub use record::{Extraction, FlightExtractor, FlightRecord};
pub use source::TrackFile;
pub use track::{Fix, ParsedTrack, Thermal, TrackParser};
