//! Area by year survey loop.

use std::fs;
use std::path::PathBuf;

use tracing::{debug, error, info, warn};

use super::aoi::AreaOfInterest;
use super::results::{ResultsTable, SurveyRecord, UNCLASSIFIED};
use super::stall::persistent_construction;
use super::{SurveyConfig, SurveyError};
use crate::classify::Classifier;
use crate::locator::{DatasetVersion, TileAddress};
use crate::mosaic::{MosaicAssembler, MosaicOutcome};
use crate::overlap::{Octant, OverlapIndex};
use crate::provider::{HttpClient, TileService};
use crate::tile::TileImage;

/// What happened to one area in one year.
#[derive(Debug, Clone, PartialEq)]
pub enum YearOutcome {
    /// Composite saved and result recorded.
    Recorded {
        record: SurveyRecord,
        image: PathBuf,
    },
    /// No tile could be fetched or decoded.
    NoData,
    /// Compositing or saving failed.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct YearResult {
    pub year: u32,
    pub tiles_requested: usize,
    pub tiles_fetched: usize,
    pub outcome: YearOutcome,
}

/// Progress notifications from [`SurveyRunner::run`].
#[derive(Debug)]
pub enum SurveyEvent<'a> {
    AreaStarted {
        area: &'a AreaOfInterest,
        position: usize,
        total: usize,
    },
    AreaFinished {
        area: &'a AreaOfInterest,
        years: &'a [YearResult],
    },
    AreaFailed {
        area: &'a AreaOfInterest,
        error: &'a SurveyError,
    },
}

/// Totals for a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SurveySummary {
    pub areas: usize,
    pub failed_areas: usize,
    pub records: usize,
    pub no_data: usize,
    pub failed_years: usize,
}

/// Runs the survey one area, one year and one tile at a time.
pub struct SurveyRunner<C, O, K>
where
    C: HttpClient,
    O: OverlapIndex,
    K: Classifier,
{
    service: TileService<C>,
    overlaps: O,
    classifier: K,
    assembler: MosaicAssembler,
    config: SurveyConfig,
}

impl<C, O, K> SurveyRunner<C, O, K>
where
    C: HttpClient,
    O: OverlapIndex,
    K: Classifier,
{
    pub fn new(service: TileService<C>, overlaps: O, classifier: K, config: SurveyConfig) -> Self {
        let assembler = MosaicAssembler::new(config.placement).with_quality(config.jpeg_quality);
        Self {
            service,
            overlaps,
            classifier,
            assembler,
            config,
        }
    }

    pub fn config(&self) -> &SurveyConfig {
        &self.config
    }

    /// Surveys every area, rewriting `results` after each one.
    ///
    /// Failures are contained: a failed area is reported through `on_event`
    /// and the loop moves on.
    pub fn run<F>(
        &self,
        areas: &[AreaOfInterest],
        results: &mut ResultsTable,
        mut on_event: F,
    ) -> SurveySummary
    where
        F: FnMut(SurveyEvent<'_>),
    {
        let mut summary = SurveySummary {
            areas: areas.len(),
            ..SurveySummary::default()
        };

        for (position, area) in areas.iter().enumerate() {
            on_event(SurveyEvent::AreaStarted {
                area,
                position,
                total: areas.len(),
            });

            match self.survey_area(area) {
                Ok(years) => {
                    for year in &years {
                        match &year.outcome {
                            YearOutcome::Recorded { .. } => summary.records += 1,
                            YearOutcome::NoData => summary.no_data += 1,
                            YearOutcome::Failed(_) => summary.failed_years += 1,
                        }
                    }
                    results.extend(years.iter().filter_map(|y| match &y.outcome {
                        YearOutcome::Recorded { record, .. } => Some(record.clone()),
                        _ => None,
                    }));
                    on_event(SurveyEvent::AreaFinished {
                        area,
                        years: &years,
                    });
                }
                Err(e) => {
                    error!(aoi = area.number, error = %e, "area failed");
                    summary.failed_areas += 1;
                    on_event(SurveyEvent::AreaFailed { area, error: &e });
                }
            }

            if let Err(e) = results.save() {
                error!(path = %results.path().display(), error = %e, "failed to save results");
            }
        }

        let persistent = persistent_construction(results.records());
        if !persistent.is_empty() {
            info!(
                count = persistent.len(),
                areas = ?persistent,
                "areas under construction in more than one year"
            );
        }
        info!(
            areas = summary.areas,
            failed = summary.failed_areas,
            records = summary.records,
            no_data = summary.no_data,
            "survey complete"
        );
        summary
    }

    /// Surveys one area for every configured year.
    pub fn survey_area(&self, area: &AreaOfInterest) -> Result<Vec<YearResult>, SurveyError> {
        let overlaps = self
            .overlaps
            .find_overlaps(&area.bbox, self.config.resolution)?;
        let octants: &[Octant] = overlaps
            .get(&self.config.level)
            .map(Vec::as_slice)
            .unwrap_or_default();
        info!(
            aoi = area.number,
            bbox = %area.bbox,
            level = self.config.level,
            octants = octants.len(),
            "surveying area"
        );

        let maps_url = area.maps_url();
        let mut years = Vec::with_capacity(self.config.years.len());
        for (&year, dataset) in &self.config.years {
            let tiles = self.fetch_tiles(octants, dataset);
            let tiles_fetched = tiles.len();
            let outcome = self.composite_year(area, year, tiles, &maps_url);
            years.push(YearResult {
                year,
                tiles_requested: octants.len(),
                tiles_fetched,
                outcome,
            });
        }
        Ok(years)
    }

    fn fetch_tiles(&self, octants: &[Octant], dataset: &DatasetVersion) -> Vec<TileImage> {
        octants
            .iter()
            .filter_map(|octant| {
                let address = TileAddress::at_version(octant.path.clone(), *dataset);
                match self.service.fetch_tile(octant, address) {
                    Ok(tile) => Some(tile),
                    Err(e) => {
                        debug!(path = %octant.path, error = %e, "tile unavailable");
                        None
                    }
                }
            })
            .collect()
    }

    fn composite_year(
        &self,
        area: &AreaOfInterest,
        year: u32,
        tiles: Vec<TileImage>,
        maps_url: &str,
    ) -> YearOutcome {
        let outcome = match self.assembler.compose(tiles, &self.classifier) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(aoi = area.number, year, error = %e, "compositing failed");
                return YearOutcome::Failed(e.to_string());
            }
        };

        let (mosaic, classification) = match outcome {
            MosaicOutcome::NoData => {
                info!(aoi = area.number, year, "no imagery");
                return YearOutcome::NoData;
            }
            MosaicOutcome::Composite {
                mosaic,
                classification,
            } => (mosaic, classification),
        };

        let status = classification
            .as_ref()
            .map_or(UNCLASSIFIED, |c| c.phase.as_str());
        let image = self
            .config
            .image_dir
            .join(format!("aoi_{}_{}_{}.jpg", area.number, year, status));

        let saved = fs::create_dir_all(&self.config.image_dir)
            .map_err(|source| SurveyError::Io {
                path: self.config.image_dir.clone(),
                source,
            })
            .and_then(|_| {
                mosaic
                    .save(&image, self.config.jpeg_quality)
                    .map_err(SurveyError::from)
            });
        if let Err(e) = saved {
            warn!(aoi = area.number, year, error = %e, "failed to save composite");
            return YearOutcome::Failed(e.to_string());
        }

        info!(
            aoi = area.number,
            year,
            status,
            tiles = mosaic.placements().len(),
            image = %image.display(),
            "composite saved"
        );
        YearOutcome::Recorded {
            record: SurveyRecord::new(area.number, year, classification.as_ref(), maps_url),
            image,
        }
    }
}
