//! Progress and diagnostic events of a run.
//!
//! The pipeline reports what it is doing through a [`ProgressSink`] handed in
//! by the caller. The CLI prints events to stdout; a GUI would forward them
//! over a channel to its log panel.

use std::fmt;
use std::path::PathBuf;
use std::sync::mpsc::Sender;

use crate::pipeline::RunSummary;

/// Something a run reports to its user.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// No input directory was given.
    MissingInput,
    /// No output directory was given.
    MissingOutput,
    /// Inputs are valid and discovery begins.
    Starting,
    /// The input tree holds no track files.
    NoSources {
        /// The directory that was searched.
        root: PathBuf,
    },
    /// A file is about to be processed.
    Processing {
        /// 1-based position of the file.
        index: usize,
        /// Number of files discovered.
        total: usize,
        /// File name.
        name: String,
    },
    /// The parser rejected a track.
    InvalidTrack {
        /// File name.
        name: String,
        /// The parser's notes.
        notes: String,
    },
    /// A file could not be turned into a record.
    FileFailed {
        /// File name.
        name: String,
        /// What went wrong.
        reason: String,
    },
    /// The flight book was written.
    Saved {
        /// Destination of the table.
        path: PathBuf,
        /// Number of rows written.
        rows: usize,
    },
    /// The run finished.
    Done {
        /// Counts of the finished run.
        summary: RunSummary,
    },
}

impl ProgressEvent {
    /// Whether the event reports a problem rather than progress.
    #[must_use]
    pub fn is_diagnostic(&self) -> bool {
        matches!(
            self,
            Self::MissingInput
                | Self::MissingOutput
                | Self::NoSources { .. }
                | Self::InvalidTrack { .. }
                | Self::FileFailed { .. }
        )
    }
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingInput => write!(f, "Please select IGC file location."),
            Self::MissingOutput => write!(
                f,
                "Please select output folder (and optionally change the filename)."
            ),
            Self::Starting => write!(f, "Starting."),
            Self::NoSources { root } => {
                write!(f, "No IGC files found in {} and subfolders.", root.display())
            }
            Self::Processing { index, total, name } => {
                write!(f, "Processing flight {index}/{total} {name}")
            }
            Self::InvalidTrack { name, notes } => write!(f, "Flight {name} is invalid: {notes}"),
            Self::FileFailed { name, reason } => write!(f, "Skipping {name}: {reason}"),
            Self::Saved { path, rows } => write!(f, "Saved {rows} flights to {}", path.display()),
            Self::Done { .. } => write!(f, "Done."),
        }
    }
}

/// Receives the events of a run.
pub trait ProgressSink: Send + Sync {
    /// Handle one event.
    fn emit(&self, event: ProgressEvent);
}

/// Prints events to stdout, one line each.
///
/// `Saved` events are only printed when `show_saves` is set.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSink {
    show_saves: bool,
}

impl ConsoleSink {
    /// Create a console sink.
    #[must_use]
    pub fn new(show_saves: bool) -> Self {
        Self { show_saves }
    }
}

impl ProgressSink for ConsoleSink {
    fn emit(&self, event: ProgressEvent) {
        if matches!(event, ProgressEvent::Saved { .. }) && !self.show_saves {
            return;
        }
        println!("{event}");
    }
}

/// Forwards events over a channel.
///
/// Events sent after the receiver is gone are dropped.
#[derive(Debug)]
pub struct ChannelSink {
    sender: Sender<ProgressEvent>,
}

impl ChannelSink {
    /// Create a sink sending into `sender`.
    #[must_use]
    pub fn new(sender: Sender<ProgressEvent>) -> Self {
        Self { sender }
    }
}

impl ProgressSink for ChannelSink {
    fn emit(&self, event: ProgressEvent) {
        let _ = self.sender.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_processing_line() {
        let event = ProgressEvent::Processing {
            index: 2,
            total: 3,
            name: "b.igc".to_string(),
        };
        assert_eq!(event.to_string(), "Processing flight 2/3 b.igc");
        assert!(!event.is_diagnostic());
    }

    #[test]
    fn test_invalid_track_line() {
        let event = ProgressEvent::InvalidTrack {
            name: "x.igc".to_string(),
            notes: "Missing date header".to_string(),
        };
        assert_eq!(event.to_string(), "Flight x.igc is invalid: Missing date header");
        assert!(event.is_diagnostic());
    }

    #[test]
    fn test_configuration_lines() {
        assert_eq!(
            ProgressEvent::MissingInput.to_string(),
            "Please select IGC file location."
        );
        assert!(ProgressEvent::MissingOutput
            .to_string()
            .starts_with("Please select output folder"));
        assert_eq!(
            ProgressEvent::NoSources {
                root: PathBuf::from("/flights")
            }
            .to_string(),
            "No IGC files found in /flights and subfolders."
        );
    }

    #[test]
    fn test_channel_sink_forwards() {
        let (tx, rx) = mpsc::channel();
        let sink = ChannelSink::new(tx);
        sink.emit(ProgressEvent::Starting);

        assert_eq!(rx.try_recv().unwrap(), ProgressEvent::Starting);
    }

    #[test]
    fn test_channel_sink_survives_dropped_receiver() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        let sink = ChannelSink::new(tx);
        sink.emit(ProgressEvent::Starting);
    }
}
