use crate::config::Config;
use clap::Parser;
use std::path::PathBuf;

/// calsift - expand an iCalendar export into per-occurrence CSV rows
/// attributed to the organizations you meet with
#[derive(Debug, Parser)]
#[command(name = "calsift")]
#[command(about = "Expand an iCalendar export into per-occurrence CSV rows", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to the per-user config directory)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// iCal file to read, overriding `source`
    #[arg(long, short = 's')]
    pub source: Option<PathBuf>,

    /// CSV file to write, overriding `output`
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Write the resolved occurrences as JSON to this file
    #[arg(long, conflicts_with = "no_debug_json")]
    pub debug_json: Option<PathBuf>,

    /// Skip the debug JSON dump even if the config names a file
    #[arg(long)]
    pub no_debug_json: bool,

    /// Log at debug level
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

impl Cli {
    /// Applies command line overrides on top of the loaded config.
    pub fn apply(&self, mut config: Config) -> Config {
        if let Some(source) = &self.source {
            config.source = source.clone();
        }
        if let Some(output) = &self.output {
            config.output = output.clone();
        }
        if let Some(debug_json) = &self.debug_json {
            config.debug_json = Some(debug_json.clone());
        }
        if self.no_debug_json {
            config.debug_json = None;
        }
        config
    }
}
