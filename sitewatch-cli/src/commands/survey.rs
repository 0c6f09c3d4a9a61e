//! Survey command - the full area × year batch.

use std::path::{Path, PathBuf};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use sitewatch::classify::HttpClassifier;
use sitewatch::overlap::JsonOverlapIndex;
use sitewatch::survey::{
    load_areas, ResultsTable, SurveyEvent, SurveyRunner, SurveySummary, YearOutcome,
};
use tracing::info;

use super::common::{connect, load_config, report_stalls, start_logging, Placement};
use crate::error::CliError;

#[derive(Debug, Args)]
pub struct SurveyArgs {
    /// GeoJSON FeatureCollection of building footprints
    areas: PathBuf,

    /// Octant catalog covering the areas
    #[arg(long, value_name = "PATH")]
    octants: PathBuf,

    /// Years to survey, comma separated (default: [survey] years)
    #[arg(long, value_delimiter = ',', value_name = "YEARS")]
    years: Vec<u32>,

    /// Quadtree level of the fetched octants
    #[arg(long)]
    level: Option<u8>,

    /// Skip this many features at the start of the file
    #[arg(long, default_value = "0")]
    skip: usize,

    /// Survey at most this many features
    #[arg(long)]
    limit: Option<usize>,

    /// Directory for composite images
    #[arg(long, value_name = "DIR")]
    image_dir: Option<PathBuf>,

    /// Results CSV, rewritten after every area
    #[arg(long, value_name = "PATH")]
    results: Option<PathBuf>,

    /// Directory for the stall report
    #[arg(long, value_name = "DIR")]
    report_dir: Option<PathBuf>,

    /// How conflicting tiles are handled
    #[arg(long, value_enum)]
    placement: Option<Placement>,

    /// Skip the stall report
    #[arg(long)]
    no_report: bool,
}

/// Run the survey command.
pub fn run(config_path: Option<&Path>, args: SurveyArgs) -> Result<(), CliError> {
    let config = load_config(config_path)?;
    let _logging = start_logging(&config)?;

    let years = if args.years.is_empty() {
        config.survey.years.clone()
    } else {
        args.years.clone()
    };
    let mut survey_config = config.survey_config_for(&years)?;
    survey_config.skip = args.skip;
    survey_config.limit = args.limit;
    if let Some(level) = args.level {
        survey_config.level = level;
    }
    if let Some(dir) = args.image_dir {
        survey_config.image_dir = dir;
    }
    if let Some(path) = args.results {
        survey_config.results_path = path;
    }
    if let Some(placement) = args.placement {
        survey_config.placement = placement.into();
    }

    let areas = load_areas(&args.areas, survey_config.skip, survey_config.limit)?;
    let overlaps = JsonOverlapIndex::load(&args.octants)?;
    let classifier = HttpClassifier::new(config.classifier_config())?;
    let service = connect(&config)?;

    println!(
        "Surveying {} areas for {} at level {}",
        style(areas.len()).bold(),
        format_years(&years),
        survey_config.level
    );
    println!("  Images:  {}", survey_config.image_dir.display());
    println!("  Results: {}", survey_config.results_path.display());
    println!();

    let mut results = ResultsTable::new(survey_config.results_path.clone());
    let runner = SurveyRunner::new(service, overlaps, classifier, survey_config);

    let pb = ProgressBar::new(areas.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{bar:40.green/blue}] {pos}/{len} areas ({percent}%) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏"),
    );

    let summary = runner.run(&areas, &mut results, |event| match event {
        SurveyEvent::AreaStarted { area, .. } => {
            pb.set_message(format!("area #{}", area.number));
        }
        SurveyEvent::AreaFinished { area, years } => {
            for year in years {
                let line = match &year.outcome {
                    YearOutcome::Recorded { record, .. } => format!(
                        "#{} {}: {}",
                        area.number,
                        year.year,
                        style(&record.construction_status).green()
                    ),
                    YearOutcome::NoData => format!(
                        "#{} {}: {} ({}/{} tiles)",
                        area.number,
                        year.year,
                        style("no data").dim(),
                        year.tiles_fetched,
                        year.tiles_requested
                    ),
                    YearOutcome::Failed(reason) => format!(
                        "#{} {}: {} {}",
                        area.number,
                        year.year,
                        style("failed").red(),
                        reason
                    ),
                };
                pb.println(line);
            }
            pb.inc(1);
        }
        SurveyEvent::AreaFailed { area, error } => {
            pb.println(format!(
                "#{}: {} {}",
                area.number,
                style("failed").red(),
                error
            ));
            pb.inc(1);
        }
    });
    pb.finish_with_message("done");

    print_summary(&summary, results.path());

    if args.no_report {
        return Ok(());
    }
    match (years.iter().min(), years.iter().max()) {
        (Some(&baseline), Some(&latest)) if baseline != latest => {
            let report_dir = args
                .report_dir
                .unwrap_or_else(|| config.output.report_dir.clone());
            report_stalls(results.records(), baseline, latest, &report_dir)?;
        }
        _ => info!("single year surveyed, no stall report"),
    }
    Ok(())
}

fn print_summary(summary: &SurveySummary, results: &Path) {
    println!();
    println!("{}", style("Survey complete").bold());
    println!("  Areas:        {}", summary.areas);
    println!("  Recorded:     {}", style(summary.records).green());
    println!("  No data:      {}", summary.no_data);
    if summary.failed_years > 0 {
        println!("  Failed years: {}", style(summary.failed_years).red());
    }
    if summary.failed_areas > 0 {
        println!("  Failed areas: {}", style(summary.failed_areas).red());
    }
    println!("  Results:      {}", results.display());
}

fn format_years(years: &[u32]) -> String {
    years
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
