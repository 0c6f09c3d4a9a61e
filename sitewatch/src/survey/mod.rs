//! Batch survey of construction sites.
//!
//! For every area of interest and every configured imagery year the survey
//! fetches the overlapping tiles, composites and classifies them, keeps the
//! composite on disk and records the result. Comparing the years afterwards
//! yields the stall report.
//!
//! ```ignore
//! let areas = load_areas(Path::new("buildings.geojson"), 0, None)?;
//! let runner = SurveyRunner::new(service, overlaps, classifier, survey_config);
//! let mut results = ResultsTable::new("construction_analysis.csv");
//! let summary = runner.run(&areas, &mut results, |_| {});
//! ```

mod aoi;
mod results;
mod runner;
mod stall;

use std::collections::BTreeMap;
use std::path::PathBuf;

use thiserror::Error;

use crate::locator::DatasetVersion;
use crate::mosaic::{MosaicError, PlacementPolicy, DEFAULT_JPEG_QUALITY};
use crate::overlap::OverlapError;

pub use aoi::{load_areas, parse_areas, AreaOfInterest};
pub use results::{load_records, ResultsTable, SurveyRecord, UNCLASSIFIED};
pub use runner::{SurveyEvent, SurveyRunner, SurveySummary, YearOutcome, YearResult};
pub use stall::{persistent_construction, StallReport, StallType, StalledSite, ALL_STALLED_FILE};

pub const DEFAULT_OCTANT_LEVEL: u8 = 20;
pub const DEFAULT_RESOLUTION: u32 = 200;
pub const DEFAULT_IMAGE_DIR: &str = "images";
pub const DEFAULT_RESULTS_FILE: &str = "construction_analysis.csv";

/// Settings for one survey run.
#[derive(Debug, Clone, PartialEq)]
pub struct SurveyConfig {
    /// Quadtree level whose octants are fetched.
    pub level: u8,
    /// Target resolution passed to the overlap query.
    pub resolution: u32,
    /// Dataset to request for each surveyed year.
    pub years: BTreeMap<u32, DatasetVersion>,
    pub image_dir: PathBuf,
    pub results_path: PathBuf,
    pub skip: usize,
    pub limit: Option<usize>,
    pub placement: PlacementPolicy,
    pub jpeg_quality: u8,
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_OCTANT_LEVEL,
            resolution: DEFAULT_RESOLUTION,
            years: BTreeMap::new(),
            image_dir: PathBuf::from(DEFAULT_IMAGE_DIR),
            results_path: PathBuf::from(DEFAULT_RESULTS_FILE),
            skip: 0,
            limit: None,
            placement: PlacementPolicy::default(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

/// Errors from survey input, output and per-area processing.
#[derive(Debug, Error)]
pub enum SurveyError {
    #[error("failed to read areas from {path}: {source}")]
    ReadAreas {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid GeoJSON: {0}")]
    ParseAreas(#[from] serde_json::Error),

    #[error(transparent)]
    Overlap(#[from] OverlapError),

    #[error(transparent)]
    Mosaic(#[from] MosaicError),

    #[error("results table error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}
