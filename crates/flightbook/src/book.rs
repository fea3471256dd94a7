//! The flight book table and its persistence.
//!
//! The whole table is rewritten after every processed file. Each write goes to
//! a sibling temporary file that is then renamed over the destination, so the
//! file on disk is always a complete, date-ordered table.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::record::FlightRecord;

/// Column delimiter of the written table.
pub const DELIMITER: u8 = b';';

/// The flight records of one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlightBook {
    records: Vec<FlightRecord>,
}

impl FlightBook {
    /// Create an empty flight book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record.
    pub fn push(&mut self, record: FlightRecord) {
        self.records.push(record);
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the book has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The records in their current order.
    #[must_use]
    pub fn records(&self) -> &[FlightRecord] {
        &self.records
    }

    /// Order by (year, month, day); flights of the same day keep their
    /// relative order.
    pub fn sort(&mut self) {
        self.records.sort_by_key(FlightRecord::date_key);
    }
}

/// Writes a [`FlightBook`] to a fixed destination.
#[derive(Debug, Clone)]
pub struct BookWriter {
    path: PathBuf,
}

impl BookWriter {
    /// Create a writer for the table at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Destination of the table.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sort `book` and replace the destination with its full contents.
    ///
    /// The header row is always written, so an empty book yields a
    /// header-only table.
    ///
    /// # Errors
    ///
    /// Returns an error if the destination directory cannot be created or the
    /// table cannot be written or moved into place.
    pub fn write(&self, book: &mut FlightBook) -> Result<()> {
        book.sort();

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let staging = self.staging_path();
        let file = File::create(&staging)?;
        let mut writer = csv::WriterBuilder::new()
            .delimiter(DELIMITER)
            .has_headers(false)
            .from_writer(file);
        writer.write_record(FlightRecord::COLUMNS)?;
        for record in book.records() {
            writer.serialize(record)?;
        }
        let file = writer
            .into_inner()
            .map_err(|e| Error::Io(e.into_error()))?;
        file.sync_all()?;

        fs::rename(&staging, &self.path).map_err(|source| Error::OutputReplace {
            path: self.path.clone(),
            source,
        })?;

        debug!(path = %self.path.display(), rows = book.len(), "Flight book written");
        Ok(())
    }

    fn staging_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.path.with_file_name(format!(".{name}.partial"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(year: i32, month: u32, day: u32, file: &str) -> FlightRecord {
        FlightRecord {
            day,
            month,
            year,
            glider: "Advance Alpha 7".to_string(),
            takeoff_time: "10:00".to_string(),
            takeoff_location: "Unknown Location".to_string(),
            takeoff_coordinates: "46.1,7.2".to_string(),
            takeoff_altitude: 1500,
            landing_time: "11:00".to_string(),
            landing_location: "Fiesch".to_string(),
            landing_coordinates: "46.4,8.1".to_string(),
            landing_altitude: 1050,
            airtime_min: 60,
            thermal_count: 2,
            thermal_gain: 540,
            median_thermal_velocity: 1.5,
            igc_file: file.to_string(),
        }
    }

    fn read_rows(path: &Path) -> Vec<csv::StringRecord> {
        csv::ReaderBuilder::new()
            .delimiter(DELIMITER)
            .from_path(path)
            .unwrap()
            .records()
            .collect::<std::result::Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn test_sort_by_date() {
        let mut book = FlightBook::new();
        book.push(record(2023, 8, 1, "c.igc"));
        book.push(record(2022, 12, 31, "a.igc"));
        book.push(record(2023, 1, 15, "b.igc"));
        book.sort();

        let files: Vec<&str> = book.records().iter().map(|r| r.igc_file.as_str()).collect();
        assert_eq!(files, vec!["a.igc", "b.igc", "c.igc"]);
    }

    #[test]
    fn test_sort_is_stable_within_a_day() {
        let mut book = FlightBook::new();
        book.push(record(2023, 5, 2, "second-day.igc"));
        book.push(record(2023, 5, 1, "morning.igc"));
        book.push(record(2023, 5, 1, "afternoon.igc"));
        book.sort();

        let files: Vec<&str> = book.records().iter().map(|r| r.igc_file.as_str()).collect();
        assert_eq!(files, vec!["morning.igc", "afternoon.igc", "second-day.igc"]);
    }

    #[test]
    fn test_write_semicolon_table_with_header() {
        let dir = TempDir::new().unwrap();
        let writer = BookWriter::new(dir.path().join("flightbook.csv"));
        let mut book = FlightBook::new();
        book.push(record(2023, 6, 3, "b.igc"));
        book.push(record(2023, 6, 1, "a.igc"));

        writer.write(&mut book).unwrap();

        let text = fs::read_to_string(writer.path()).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), FlightRecord::COLUMNS.join(";"));
        assert_eq!(
            lines.next().unwrap(),
            "1;6;2023;Advance Alpha 7;10:00;Unknown Location;46.1,7.2;1500;11:00;Fiesch;46.4,8.1;1050;60;2;540;1.5;a.igc"
        );
        assert!(lines.next().unwrap().ends_with(";b.igc"));
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_write_empty_book_has_header_only() {
        let dir = TempDir::new().unwrap();
        let writer = BookWriter::new(dir.path().join("flightbook.csv"));

        writer.write(&mut FlightBook::new()).unwrap();

        let text = fs::read_to_string(writer.path()).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with("Day;Month;Year;Glider;"));
    }

    #[test]
    fn test_write_overwrites_previous_table() {
        let dir = TempDir::new().unwrap();
        let writer = BookWriter::new(dir.path().join("flightbook.csv"));
        let mut book = FlightBook::new();
        book.push(record(2023, 6, 1, "a.igc"));
        writer.write(&mut book).unwrap();
        assert_eq!(read_rows(writer.path()).len(), 1);

        book.push(record(2023, 5, 1, "earlier.igc"));
        writer.write(&mut book).unwrap();

        let rows = read_rows(writer.path());
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][16], "earlier.igc");
    }

    #[test]
    fn test_write_leaves_no_staging_file() {
        let dir = TempDir::new().unwrap();
        let writer = BookWriter::new(dir.path().join("flightbook.csv"));
        writer.write(&mut FlightBook::new()).unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_write_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let writer = BookWriter::new(dir.path().join("new").join("flightbook.csv"));
        writer.write(&mut FlightBook::new()).unwrap();
        assert!(writer.path().exists());
    }

    #[test]
    fn test_fields_with_delimiter_are_quoted() {
        let dir = TempDir::new().unwrap();
        let writer = BookWriter::new(dir.path().join("flightbook.csv"));
        let mut book = FlightBook::new();
        let mut odd = record(2023, 6, 1, "a.igc");
        odd.landing_location = "Saint-Jean; Haut".to_string();
        book.push(odd);
        writer.write(&mut book).unwrap();

        let rows = read_rows(writer.path());
        assert_eq!(&rows[0][9], "Saint-Jean; Haut");
    }
}
