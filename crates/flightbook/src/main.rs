//! `flightbook` - CLI for building a flight book from IGC files
//!
//! This binary parses arguments, loads configuration, and hands a run to the
//! library pipeline with a console progress sink.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use flightbook::cli::{Cli, Command, ConfigCommand, RunCommand};
use flightbook::{init_logging, Config, ConsoleSink, Pipeline, RunOutcome, RunRequest};

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone()).context("loading configuration")?;

    match cli.command {
        Command::Run(run_cmd) => handle_run(&config, run_cmd),
        Command::Config(config_cmd) => {
            handle_config(&config, config_cmd)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn handle_run(config: &Config, cmd: RunCommand) -> anyhow::Result<ExitCode> {
    let filename = cmd
        .output_filename
        .unwrap_or_else(|| config.output.filename.clone());
    let request = RunRequest::new(cmd.igc_folder, cmd.output_folder, filename);

    let pipeline = Pipeline::from_config(config, Box::new(ConsoleSink::new(cmd.show_saves)))?;
    match pipeline.run(&request).context("writing the flight book")? {
        RunOutcome::Completed(summary) => {
            println!(
                "{} of {} flights written to {} ({} invalid, {} failed)",
                summary.extracted,
                summary.discovered,
                summary.output.display(),
                summary.invalid,
                summary.failed
            );
            Ok(ExitCode::SUCCESS)
        }
        RunOutcome::Halted(_) => Ok(ExitCode::FAILURE),
    }
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Output]");
                println!("  Filename:           {}", config.output.filename);
                println!();
                println!("[Peaks]");
                println!("  Endpoint:           {}", config.peaks.endpoint);
                println!("  Search radius (m):  {}", config.peaks.search_radius_m);
                println!("  Fallback label:     {}", config.peaks.fallback_label);
                println!();
                println!("[Places]");
                println!("  Endpoint:           {}", config.places.endpoint);
                println!("  Min interval (ms):  {}", config.places.min_interval_ms);
                println!();
                println!("[HTTP]");
                println!("  User agent:         {}", config.http.user_agent);
                println!("  Timeout (s):        {}", config.http.timeout_secs);
                println!();
                println!("[Analysis]");
                println!("  Min fixes:          {}", config.analysis.min_fixes);
                println!(
                    "  Takeoff speed:      {} km/h",
                    config.analysis.takeoff_speed_kmh
                );
                println!(
                    "  Min climb rate:     {} m/s",
                    config.analysis.min_climb_rate
                );
                println!(
                    "  Min thermal:        {} s",
                    config.analysis.min_thermal_secs
                );
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
