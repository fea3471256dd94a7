//! CLI command definitions.

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Run command arguments.
#[derive(Debug, Args)]
pub struct RunCommand {
    /// Folder (searched recursively) holding the IGC files
    pub igc_folder: PathBuf,

    /// Folder to write the flight book into
    pub output_folder: PathBuf,

    /// File name of the flight book [default: from configuration]
    pub output_filename: Option<String>,

    /// Also print a line each time the flight book is saved
    #[arg(long)]
    pub show_saves: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_command_debug() {
        let cmd = RunCommand {
            igc_folder: PathBuf::from("/flights"),
            output_folder: PathBuf::from("/books"),
            output_filename: None,
            show_saves: false,
        };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("igc_folder"));
    }

    #[test]
    fn test_config_command_debug() {
        let cmd = ConfigCommand::Show { json: false };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("Show"));
    }
}
