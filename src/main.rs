use anyhow::Result;
use calsift::cli::Cli;
use calsift::Config;
use clap::Parser;
use log::info;

fn main() -> Result<()> {
    let cli = Cli::parse();

    calsift::init_logger(cli.verbose);

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let config = cli.apply(config);

    let summary = calsift::run(&config)?;
    info!(
        "Done: {} of {} occurrences attributed to an organization",
        summary.rows, summary.occurrences
    );
    Ok(())
}
