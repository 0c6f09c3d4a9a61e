//! Cumulative survey results table.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::SurveyError;
use crate::classify::{Classification, ConstructionPhase};

/// Status written for composites the classifier could not label.
pub const UNCLASSIFIED: &str = "unclassified";

/// One row of the results table: an area in one year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyRecord {
    pub aoi_number: usize,
    pub year: u32,
    pub construction_status: String,
    pub confidence_level: Option<u8>,
    pub reasoning: String,
    pub maps_url: String,
}

impl SurveyRecord {
    pub fn new(
        aoi_number: usize,
        year: u32,
        classification: Option<&Classification>,
        maps_url: impl Into<String>,
    ) -> Self {
        let (status, confidence, reasoning) = match classification {
            Some(c) => (
                c.phase.as_str().to_string(),
                Some(c.confidence),
                c.reasoning.clone(),
            ),
            None => (UNCLASSIFIED.to_string(), None, String::new()),
        };
        Self {
            aoi_number,
            year,
            construction_status: status,
            confidence_level: confidence,
            reasoning,
            maps_url: maps_url.into(),
        }
    }

    /// Classified phase, or `None` for unclassified rows.
    pub fn phase(&self) -> Option<ConstructionPhase> {
        self.construction_status.parse().ok()
    }
}

/// Results accumulated over a survey, persisted as CSV.
///
/// Every [`save`](Self::save) rewrites the whole file so an interrupted run
/// leaves a complete table of everything finished so far.
#[derive(Debug, Clone)]
pub struct ResultsTable {
    path: PathBuf,
    records: Vec<SurveyRecord>,
}

impl ResultsTable {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            records: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(&self) -> &[SurveyRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn extend(&mut self, records: impl IntoIterator<Item = SurveyRecord>) {
        self.records.extend(records);
    }

    /// Writes all records, replacing the file atomically.
    pub fn save(&self) -> Result<(), SurveyError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| SurveyError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let staging = self.path.with_extension("csv.partial");
        write_records(&staging, &self.records)?;
        fs::rename(&staging, &self.path).map_err(|source| SurveyError::Io {
            path: self.path.clone(),
            source,
        })?;
        debug!(path = %self.path.display(), rows = self.records.len(), "results saved");
        Ok(())
    }
}

pub(crate) fn write_records<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), SurveyError> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush().map_err(|source| SurveyError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads a results table written by [`ResultsTable::save`].
pub fn load_records(path: &Path) -> Result<Vec<SurveyRecord>, SurveyError> {
    let mut reader = csv::Reader::from_path(path)?;
    let records = reader.deserialize().collect::<Result<Vec<SurveyRecord>, _>>()?;
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classified(phase: ConstructionPhase) -> Classification {
        Classification::new(phase, 75, "scaffolding, crane")
    }

    #[test]
    fn test_record_from_classification() {
        let record = SurveyRecord::new(
            3,
            2024,
            Some(&classified(ConstructionPhase::Construction)),
            "https://maps.google.com/?q=1,2",
        );
        assert_eq!(record.construction_status, "CONSTRUCTION");
        assert_eq!(record.confidence_level, Some(75));
        assert_eq!(record.phase(), Some(ConstructionPhase::Construction));
    }

    #[test]
    fn test_unclassified_record() {
        let record = SurveyRecord::new(3, 2019, None, "u");
        assert_eq!(record.construction_status, UNCLASSIFIED);
        assert_eq!(record.confidence_level, None);
        assert_eq!(record.phase(), None);
    }

    #[test]
    fn test_save_rewrites_whole_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("results.csv");
        let mut table = ResultsTable::new(&path);

        table.extend([SurveyRecord::new(1, 2019, None, "a")]);
        table.save().unwrap();
        table.extend([SurveyRecord::new(
            1,
            2024,
            Some(&classified(ConstructionPhase::Complete)),
            "a",
        )]);
        table.save().unwrap();

        let loaded = load_records(&path).unwrap();
        assert_eq!(loaded, table.records());
        assert!(!path.with_extension("csv.partial").exists());

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with(
            "aoi_number,year,construction_status,confidence_level,reasoning,maps_url"
        ));
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn test_load_missing_table() {
        assert!(load_records(Path::new("/nonexistent/results.csv")).is_err());
    }
}
