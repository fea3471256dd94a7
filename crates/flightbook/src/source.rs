//! Discovery of track files under a directory tree.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::warn;
use walkdir::WalkDir;

/// Extension of flight recorder logs, compared case-insensitively.
pub const TRACK_EXTENSION: &str = "igc";

/// One candidate recorder log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackFile {
    /// Full path to the file.
    pub path: PathBuf,
    /// File name without directories, as shown in the flight book.
    pub name: String,
}

impl TrackFile {
    /// Wrap a path, taking the name from its last component.
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { path, name }
    }
}

impl fmt::Display for TrackFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Whether `path` carries the track extension in any letter case.
#[must_use]
pub fn is_track_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(TRACK_EXTENSION))
}

/// Lazily walk `root` and yield every track file beneath it.
///
/// Entries are visited in file-name order within each directory. Unreadable
/// entries, including a missing root, are logged and skipped, so a bad root
/// simply yields nothing.
pub fn track_files(root: &Path) -> impl Iterator<Item = TrackFile> {
    WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable entry: {e}");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && is_track_file(entry.path()))
        .map(|entry| TrackFile::new(entry.into_path()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_is_track_file_any_case() {
        assert!(is_track_file(Path::new("a.igc")));
        assert!(is_track_file(Path::new("b.IGC")));
        assert!(is_track_file(Path::new("c.IgC")));
        assert!(!is_track_file(Path::new("d.igc.bak")));
        assert!(!is_track_file(Path::new("igc")));
        assert!(!is_track_file(Path::new("e.kml")));
    }

    #[test]
    fn test_track_files_recursive() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("2023").join("july");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("one.igc"), "").unwrap();
        fs::write(nested.join("two.IGC"), "").unwrap();
        fs::write(nested.join("notes.txt"), "").unwrap();
        fs::create_dir(dir.path().join("folder.igc")).unwrap();

        let mut names: Vec<String> = track_files(dir.path()).map(|f| f.name).collect();
        names.sort();
        assert_eq!(names, vec!["one.igc", "two.IGC"]);
    }

    #[test]
    fn test_track_files_missing_root() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("does-not-exist");
        assert_eq!(track_files(&missing).count(), 0);
    }

    #[test]
    fn test_track_files_empty_root() {
        let dir = TempDir::new().unwrap();
        assert_eq!(track_files(dir.path()).count(), 0);
    }

    #[test]
    fn test_track_file_name() {
        let file = TrackFile::new(PathBuf::from("/flights/2023/flight.igc"));
        assert_eq!(file.name, "flight.igc");
        assert_eq!(file.to_string(), "flight.igc");
    }
}
