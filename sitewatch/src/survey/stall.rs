//! Stalled development report.
//!
//! A site is stalled when it is still unfinished in the latest survey year
//! and was already unfinished in the baseline year.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use super::results::{write_records, SurveyRecord};
use super::SurveyError;
use crate::classify::ConstructionPhase;

/// File name of the combined report.
pub const ALL_STALLED_FILE: &str = "all_stalled_projects.csv";

/// Baseline to latest phase transition of a stalled site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StallType {
    ConstructionToConstruction,
    GroundworksToGroundworks,
    GroundworksToConstruction,
    ConstructionToGroundworks,
}

impl StallType {
    pub const ALL: [StallType; 4] = [
        StallType::ConstructionToConstruction,
        StallType::GroundworksToGroundworks,
        StallType::GroundworksToConstruction,
        StallType::ConstructionToGroundworks,
    ];

    /// Category for a pair of phases, or `None` when either is complete.
    pub fn between(baseline: ConstructionPhase, latest: ConstructionPhase) -> Option<Self> {
        use ConstructionPhase::{Construction, Groundworks};
        match (baseline, latest) {
            (Construction, Construction) => Some(StallType::ConstructionToConstruction),
            (Groundworks, Groundworks) => Some(StallType::GroundworksToGroundworks),
            (Groundworks, Construction) => Some(StallType::GroundworksToConstruction),
            (Construction, Groundworks) => Some(StallType::ConstructionToGroundworks),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StallType::ConstructionToConstruction => "Construction-to-Construction",
            StallType::GroundworksToGroundworks => "Groundworks-to-Groundworks",
            StallType::GroundworksToConstruction => "Groundworks-to-Construction",
            StallType::ConstructionToGroundworks => "Construction-to-Groundworks",
        }
    }

    /// File name of this category's report.
    pub fn file_name(&self) -> String {
        format!(
            "stalled_{}.csv",
            self.label().to_ascii_lowercase().replace('-', "_")
        )
    }
}

impl fmt::Display for StallType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A stalled site with its latest-year result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StalledSite {
    pub stall_type: StallType,
    pub record: SurveyRecord,
}

#[derive(Serialize)]
struct StallRow<'a> {
    aoi_number: usize,
    year: u32,
    construction_status: &'a str,
    confidence_level: Option<u8>,
    reasoning: &'a str,
    maps_url: &'a str,
    stall_type: &'static str,
}

impl<'a> From<&'a StalledSite> for StallRow<'a> {
    fn from(site: &'a StalledSite) -> Self {
        Self {
            aoi_number: site.record.aoi_number,
            year: site.record.year,
            construction_status: &site.record.construction_status,
            confidence_level: site.record.confidence_level,
            reasoning: &site.record.reasoning,
            maps_url: &site.record.maps_url,
            stall_type: site.stall_type.label(),
        }
    }
}

/// Stalled sites between two survey years.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StallReport {
    pub baseline_year: u32,
    pub latest_year: u32,
    /// Ordered by area number.
    pub sites: Vec<StalledSite>,
}

impl StallReport {
    /// Compares each area's classified phase in the two years.
    ///
    /// Unclassified rows and areas missing either year are ignored. If an
    /// area has several rows for one year the last one counts.
    pub fn compute(records: &[SurveyRecord], baseline_year: u32, latest_year: u32) -> Self {
        let baseline = phases_in(records, baseline_year);
        let latest = phases_in(records, latest_year);

        let sites = latest
            .iter()
            .filter_map(|(aoi, (latest_phase, record))| {
                let (baseline_phase, _) = baseline.get(aoi)?;
                let stall_type = StallType::between(*baseline_phase, *latest_phase)?;
                Some(StalledSite {
                    stall_type,
                    record: (*record).clone(),
                })
            })
            .collect();

        Self {
            baseline_year,
            latest_year,
            sites,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Sites of one category.
    pub fn of_type(&self, stall_type: StallType) -> impl Iterator<Item = &StalledSite> {
        self.sites.iter().filter(move |s| s.stall_type == stall_type)
    }

    /// Area numbers of one category.
    pub fn areas(&self, stall_type: StallType) -> Vec<usize> {
        self.of_type(stall_type).map(|s| s.record.aoi_number).collect()
    }

    /// Writes one CSV per non-empty category plus the combined report.
    ///
    /// Returns the paths written.
    pub fn write(&self, dir: &Path) -> Result<Vec<PathBuf>, SurveyError> {
        fs::create_dir_all(dir).map_err(|source| SurveyError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut written = Vec::new();
        for stall_type in StallType::ALL {
            let rows: Vec<StallRow> = self.of_type(stall_type).map(StallRow::from).collect();
            if rows.is_empty() {
                continue;
            }
            let path = dir.join(stall_type.file_name());
            write_records(&path, &rows)?;
            written.push(path);
        }

        let rows: Vec<StallRow> = self.sites.iter().map(StallRow::from).collect();
        let path = dir.join(ALL_STALLED_FILE);
        write_records(&path, &rows)?;
        written.push(path);

        info!(
            baseline = self.baseline_year,
            latest = self.latest_year,
            stalled = self.sites.len(),
            files = written.len(),
            "stall report written"
        );
        Ok(written)
    }
}

fn phases_in(
    records: &[SurveyRecord],
    year: u32,
) -> BTreeMap<usize, (ConstructionPhase, &SurveyRecord)> {
    records
        .iter()
        .filter(|r| r.year == year)
        .filter_map(|r| r.phase().map(|phase| (r.aoi_number, (phase, r))))
        .collect()
}

/// Areas classified as under construction in more than one year.
pub fn persistent_construction(records: &[SurveyRecord]) -> Vec<usize> {
    let mut years: BTreeMap<usize, BTreeSet<u32>> = BTreeMap::new();
    for record in records {
        if record.phase() == Some(ConstructionPhase::Construction) {
            years.entry(record.aoi_number).or_default().insert(record.year);
        }
    }
    years
        .into_iter()
        .filter(|(_, years)| years.len() > 1)
        .map(|(aoi, _)| aoi)
        .collect()
}
