pub mod calendar;
pub mod cli;
pub mod config;
pub mod organization;
pub mod pipeline;
pub mod report;

use anyhow::{Context, Result};
use log::*;

/// Row counts of one completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub occurrences: usize,
    pub rows: usize,
}

/// Reads the configured iCal file, expands and attributes its events, and
/// writes the CSV (plus the debug JSON when configured). Any read or write
/// failure aborts the run.
pub fn run(config: &Config) -> Result<RunSummary> {
    let settings = config.settings().context("Invalid configuration")?;

    info!("Reading calendar from {}", config.source.display());
    let events = calendar::import_ics_file(&config.source, settings.timezone)
        .with_context(|| format!("Failed to import {}", config.source.display()))?;

    let analysis = pipeline::analyze(&events, &settings);
    info!("Parsed {} iCal entries from {}", analysis.occurrences.len(), config.source.display());

    report::write_csv_file(&config.output, &analysis.records)?;
    if let Some(path) = config.debug_json_path() {
        report::write_debug_json_file(path, &analysis.occurrences)?;
    }

    Ok(RunSummary { occurrences: analysis.occurrences.len(), rows: analysis.records.len() })
}

/// Timestamped logger; `RUST_LOG` overrides the default level.
pub fn init_logger(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format(|buf, record| {
            use std::io::Write;
            writeln!(
                buf,
                "{} [{}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .init();
}

// Re-export commonly used types
pub use calendar::{CalendarError, Occurrence, RawEvent};
pub use config::Config;
