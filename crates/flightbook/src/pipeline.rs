//! The flight book run.
//!
//! A run validates its inputs, discovers the track files, and then for each
//! file parses, extracts, accumulates and persists, strictly one file at a
//! time. A bad file is reported and skipped; only missing inputs, an empty
//! input tree, or a failure to write the output stop a run.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{info, warn};

use crate::book::{BookWriter, FlightBook};
use crate::config::{is_bare_file_name, Config};
use crate::error::Result;
use crate::geo::{NominatimPlaceResolver, OverpassPeakResolver, ReqwestClient};
use crate::igc::IgcParser;
use crate::progress::{ProgressEvent, ProgressSink};
use crate::record::{Extraction, FlightExtractor, FlightRecord};
use crate::source::{track_files, TrackFile};
use crate::track::TrackParser;

/// What to process and where to put the result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunRequest {
    /// Directory tree holding the track files.
    pub input_dir: Option<PathBuf>,
    /// Directory receiving the flight book.
    pub output_dir: Option<PathBuf>,
    /// File name of the flight book inside `output_dir`.
    pub output_filename: String,
}

impl RunRequest {
    /// Create a request.
    #[must_use]
    pub fn new(
        input_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        output_filename: impl Into<String>,
    ) -> Self {
        Self {
            input_dir: Some(input_dir.into()),
            output_dir: Some(output_dir.into()),
            output_filename: output_filename.into(),
        }
    }
}

/// Why a run stopped before processing any file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltReason {
    /// No input directory was given.
    MissingInput,
    /// No output directory was given, or the file name is empty or a path.
    MissingOutput,
    /// The input tree holds no track files.
    NoSources,
}

/// Counts of a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Track files discovered.
    pub discovered: usize,
    /// Files that produced a flight book row.
    pub extracted: usize,
    /// Files the parser rejected.
    pub invalid: usize,
    /// Files that failed to parse or extract.
    pub failed: usize,
    /// Where the flight book was written.
    pub output: PathBuf,
    /// Whether the run was stopped before all files were processed.
    pub stopped: bool,
}

impl RunSummary {
    /// Files that went through the per-file loop.
    #[must_use]
    pub fn processed(&self) -> usize {
        self.extracted + self.invalid + self.failed
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The run stopped during validation or discovery; nothing was written.
    Halted(HaltReason),
    /// The per-file loop ran.
    Completed(RunSummary),
}

enum FileOutcome {
    Record(Box<FlightRecord>),
    Invalid(String),
    Failed(String),
}

/// Wires discovery, parsing, extraction and persistence together.
pub struct Pipeline {
    parser: Box<dyn TrackParser>,
    extractor: FlightExtractor,
    sink: Box<dyn ProgressSink>,
    stop: Option<Arc<AtomicBool>>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("extractor", &self.extractor)
            .field("stop", &self.stop)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Create a pipeline from its collaborators.
    #[must_use]
    pub fn new(
        parser: Box<dyn TrackParser>,
        extractor: FlightExtractor,
        sink: Box<dyn ProgressSink>,
    ) -> Self {
        Self {
            parser,
            extractor,
            sink,
            stop: None,
        }
    }

    /// Create the production pipeline: IGC parsing, Overpass peak lookup and
    /// Nominatim reverse geocoding.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &Config, sink: Box<dyn ProgressSink>) -> Result<Self> {
        let client = ReqwestClient::from_config(&config.http)?;
        let extractor = FlightExtractor::new(
            Box::new(OverpassPeakResolver::new(client.clone(), &config.peaks)),
            Box::new(NominatimPlaceResolver::new(client, &config.places)),
        );
        let parser = IgcParser::new(config.analysis.clone());
        Ok(Self::new(Box::new(parser), extractor, sink))
    }

    /// Stop the run once `flag` is set.
    ///
    /// The flag is only looked at between files, after the previous file's
    /// table has been written.
    #[must_use]
    pub fn with_stop_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.stop = Some(flag);
        self
    }

    /// Execute one run.
    ///
    /// # Errors
    ///
    /// Returns an error only if the flight book cannot be written; per-file
    /// problems are reported through the sink and skipped.
    pub fn run(&self, request: &RunRequest) -> Result<RunOutcome> {
        let Some(input_dir) = given(request.input_dir.as_deref()) else {
            return Ok(self.halt(HaltReason::MissingInput, ProgressEvent::MissingInput));
        };
        let Some(output_dir) = given(request.output_dir.as_deref()) else {
            return Ok(self.halt(HaltReason::MissingOutput, ProgressEvent::MissingOutput));
        };
        let filename = &request.output_filename;
        if filename.trim().is_empty() || !is_bare_file_name(filename) {
            return Ok(self.halt(HaltReason::MissingOutput, ProgressEvent::MissingOutput));
        }

        self.sink.emit(ProgressEvent::Starting);
        let files: Vec<TrackFile> = track_files(input_dir).collect();
        if files.is_empty() {
            return Ok(self.halt(
                HaltReason::NoSources,
                ProgressEvent::NoSources {
                    root: input_dir.to_path_buf(),
                },
            ));
        }
        info!(count = files.len(), root = %input_dir.display(), "Track files discovered");

        let writer = BookWriter::new(output_dir.join(&request.output_filename));
        let mut book = FlightBook::new();
        let mut summary = RunSummary {
            discovered: files.len(),
            output: writer.path().to_path_buf(),
            ..RunSummary::default()
        };

        for (index, file) in files.iter().enumerate() {
            if self.stop_requested() {
                info!(processed = summary.processed(), "Stop requested, ending run");
                summary.stopped = true;
                break;
            }

            self.sink.emit(ProgressEvent::Processing {
                index: index + 1,
                total: files.len(),
                name: file.name.clone(),
            });

            match self.process(file) {
                FileOutcome::Record(record) => {
                    book.push(*record);
                    summary.extracted += 1;
                }
                FileOutcome::Invalid(notes) => {
                    summary.invalid += 1;
                    self.sink.emit(ProgressEvent::InvalidTrack {
                        name: file.name.clone(),
                        notes,
                    });
                }
                FileOutcome::Failed(reason) => {
                    summary.failed += 1;
                    self.sink.emit(ProgressEvent::FileFailed {
                        name: file.name.clone(),
                        reason,
                    });
                }
            }

            writer.write(&mut book)?;
            self.sink.emit(ProgressEvent::Saved {
                path: writer.path().to_path_buf(),
                rows: book.len(),
            });
        }

        info!(
            extracted = summary.extracted,
            invalid = summary.invalid,
            failed = summary.failed,
            output = %summary.output.display(),
            "Run finished"
        );
        self.sink.emit(ProgressEvent::Done {
            summary: summary.clone(),
        });
        Ok(RunOutcome::Completed(summary))
    }

    fn process(&self, file: &TrackFile) -> FileOutcome {
        let track = match self.parser.parse(&file.path) {
            Ok(track) => track,
            Err(e) => {
                warn!(file = %file.name, "Failed to parse track: {e}");
                return FileOutcome::Failed(e.to_string());
            }
        };

        match self.extractor.extract(file, &track) {
            Ok(Extraction::Record(record)) => FileOutcome::Record(record),
            Ok(Extraction::Invalid { notes }) => FileOutcome::Invalid(notes),
            Err(e) => {
                warn!(file = %file.name, "Failed to extract flight: {e}");
                FileOutcome::Failed(e.to_string())
            }
        }
    }

    fn halt(&self, reason: HaltReason, event: ProgressEvent) -> RunOutcome {
        info!(?reason, "Run halted before processing");
        self.sink.emit(event);
        RunOutcome::Halted(reason)
    }

    fn stop_requested(&self) -> bool {
        self.stop
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }
}

fn given(path: Option<&Path>) -> Option<&Path> {
    path.filter(|path| !path.as_os_str().is_empty())
}
