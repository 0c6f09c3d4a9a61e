//! Stalls command - stall report from an existing results file.

use std::path::{Path, PathBuf};

use clap::Args;
use sitewatch::survey::{load_records, SurveyRecord};

use super::common::{load_config, report_stalls};
use crate::error::CliError;

#[derive(Debug, Args)]
pub struct StallsArgs {
    /// Results CSV (default: [output] results_file)
    results: Option<PathBuf>,

    /// Baseline year (default: earliest year in the results)
    #[arg(long)]
    baseline: Option<u32>,

    /// Latest year (default: latest year in the results)
    #[arg(long)]
    latest: Option<u32>,

    /// Directory for the report files
    #[arg(long, value_name = "DIR")]
    report_dir: Option<PathBuf>,
}

/// Run the stalls command.
pub fn run(config_path: Option<&Path>, args: StallsArgs) -> Result<(), CliError> {
    let config = load_config(config_path)?;
    let results = args
        .results
        .unwrap_or_else(|| config.output.results_file.clone());
    let records = load_records(&results)?;

    let (baseline, latest) = compared_years(&records, args.baseline, args.latest)?;
    let report_dir = args
        .report_dir
        .unwrap_or_else(|| config.output.report_dir.clone());

    report_stalls(&records, baseline, latest, &report_dir)?;
    Ok(())
}

/// Years to compare, filling missing ones from the records.
fn compared_years(
    records: &[SurveyRecord],
    baseline: Option<u32>,
    latest: Option<u32>,
) -> Result<(u32, u32), CliError> {
    let baseline = baseline.or_else(|| records.iter().map(|r| r.year).min());
    let latest = latest.or_else(|| records.iter().map(|r| r.year).max());
    match (baseline, latest) {
        (Some(baseline), Some(latest)) if baseline < latest => Ok((baseline, latest)),
        (Some(baseline), Some(latest)) => Err(CliError::Usage(format!(
            "baseline year {} must precede latest year {}",
            baseline, latest
        ))),
        _ => Err(CliError::Usage(
            "results are empty; pass --baseline and --latest".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(aoi: usize, year: u32) -> SurveyRecord {
        SurveyRecord::new(aoi, year, None, "https://maps.google.com/?q=0,0".to_string())
    }

    #[test]
    fn test_years_from_records() {
        let records = vec![record(1, 2024), record(1, 2019), record(2, 2021)];
        assert_eq!(compared_years(&records, None, None).unwrap(), (2019, 2024));
        assert_eq!(
            compared_years(&records, Some(2021), None).unwrap(),
            (2021, 2024)
        );
    }

    #[test]
    fn test_single_year_rejected() {
        let records = vec![record(1, 2024)];
        assert!(compared_years(&records, None, None).is_err());
        assert!(compared_years(&[], None, None).is_err());
    }
}
