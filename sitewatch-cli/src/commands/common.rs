//! Common types and utilities shared across CLI commands.

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use console::style;
use sitewatch::config::ConfigFile;
use sitewatch::logging::{init_logging, LoggingGuard};
use sitewatch::mosaic::PlacementPolicy;
use sitewatch::provider::{ReqwestClient, TileService};
use sitewatch::survey::{persistent_construction, StallReport, StallType, SurveyRecord};
use tracing::debug;

use crate::error::CliError;

/// Tile placement policy for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum Placement {
    /// Abort the composite on any size, step or position conflict
    Strict,
    /// Skip conflicting tiles and keep going
    BestEffort,
}

impl From<Placement> for PlacementPolicy {
    fn from(placement: Placement) -> Self {
        match placement {
            Placement::Strict => PlacementPolicy::Strict,
            Placement::BestEffort => PlacementPolicy::BestEffort,
        }
    }
}

/// Load the config file named on the command line, or the default one.
pub fn load_config(path: Option<&Path>) -> Result<ConfigFile, CliError> {
    let config = match path {
        Some(path) => ConfigFile::load_from(path)?,
        None => ConfigFile::load()?,
    };
    Ok(config)
}

/// Start file and console logging as configured.
pub fn start_logging(config: &ConfigFile) -> Result<LoggingGuard, CliError> {
    let guard = init_logging(
        &config.logging.directory,
        &config.logging.file,
        &config.logging.level,
    )
    .map_err(CliError::LoggingInit)?;
    debug!(log = %guard.path().display(), "logging started");
    Ok(guard)
}

/// Tile service over HTTP as configured.
pub fn connect(config: &ConfigFile) -> Result<TileService<ReqwestClient>, CliError> {
    let service_config = config.service_config();
    let client = ReqwestClient::new(&service_config)?;
    Ok(TileService::new(client, &service_config))
}

/// Write the stall report for `records` and print what it found.
pub fn report_stalls(
    records: &[SurveyRecord],
    baseline_year: u32,
    latest_year: u32,
    report_dir: &Path,
) -> Result<Vec<PathBuf>, CliError> {
    let report = StallReport::compute(records, baseline_year, latest_year);
    let written = report.write(report_dir)?;

    println!();
    println!(
        "{} {} → {}",
        style("Stalled projects").bold(),
        baseline_year,
        latest_year
    );
    for stall_type in StallType::ALL {
        let areas = report.areas(stall_type);
        let count = style(areas.len());
        let count = if areas.is_empty() {
            count.dim()
        } else {
            count.yellow()
        };
        println!("  {:<32} {}", stall_type.label(), count);
        if !areas.is_empty() {
            println!("    {}", style(format_areas(&areas)).dim());
        }
    }

    let persistent = persistent_construction(records);
    if !persistent.is_empty() {
        println!();
        println!(
            "{} {}",
            style("Under construction in more than one year:").bold(),
            format_areas(&persistent)
        );
    }

    println!();
    for path in &written {
        println!("  wrote {}", path.display());
    }
    Ok(written)
}

fn format_areas(areas: &[usize]) -> String {
    areas
        .iter()
        .map(|n| format!("#{}", n))
        .collect::<Vec<_>>()
        .join(", ")
}
