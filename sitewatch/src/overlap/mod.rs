//! Quadtree overlap queries.
//!
//! Enumerating which octants of the service's tree cover an area is done by an
//! external tool. This module defines the query interface the survey consumes
//! ([`OverlapIndex`]) and a file-backed adapter ([`JsonOverlapIndex`]) for
//! octant catalogs that tool exports.
//!
//! # Catalog format
//!
//! ```json
//! {
//!   "octants": [
//!     { "path": "30524153625370535063",
//!       "bbox": { "north": 25.21, "south": 25.20, "east": 55.31, "west": 55.30 } }
//!   ]
//! }
//! ```
//!
//! The level of an octant is the length of its path.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::geo::GeoBoundingBox;

/// An addressable node of the quadtree with its geographic footprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Octant {
    pub path: String,
    pub bbox: GeoBoundingBox,
}

impl Octant {
    pub fn new(path: impl Into<String>, bbox: GeoBoundingBox) -> Self {
        Self {
            path: path.into(),
            bbox,
        }
    }

    /// Depth of the octant below the root.
    pub fn level(&self) -> u8 {
        self.path.len().min(u8::MAX as usize) as u8
    }
}

/// Octants grouped by tree level, each level in the collaborator's order.
pub type OverlapMap = BTreeMap<u8, Vec<Octant>>;

/// Errors from overlap queries.
#[derive(Debug, Error)]
pub enum OverlapError {
    #[error("failed to read octant catalog {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse octant catalog {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("overlap query failed: {0}")]
    Query(String),
}

/// Finds the octants overlapping an area.
pub trait OverlapIndex {
    /// Returns every octant overlapping `bbox`, grouped by level.
    ///
    /// `resolution` is the target ground resolution the caller intends to
    /// sample at; implementations may use it to limit the levels returned.
    fn find_overlaps(
        &self,
        bbox: &GeoBoundingBox,
        resolution: u32,
    ) -> Result<OverlapMap, OverlapError>;
}

/// [`OverlapIndex`] over a precomputed octant catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JsonOverlapIndex {
    octants: Vec<Octant>,
}

impl JsonOverlapIndex {
    pub fn new(octants: Vec<Octant>) -> Self {
        Self { octants }
    }

    /// Loads a catalog file.
    pub fn load(path: &Path) -> Result<Self, OverlapError> {
        let text = fs::read_to_string(path).map_err(|source| OverlapError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let index: Self = serde_json::from_str(&text).map_err(|source| OverlapError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(
            path = %path.display(),
            octants = index.octants.len(),
            "loaded octant catalog"
        );
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.octants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.octants.is_empty()
    }
}

impl OverlapIndex for JsonOverlapIndex {
    /// The catalog holds fixed levels, so `resolution` is not consulted.
    fn find_overlaps(
        &self,
        bbox: &GeoBoundingBox,
        _resolution: u32,
    ) -> Result<OverlapMap, OverlapError> {
        let mut overlaps = OverlapMap::new();
        for octant in self.octants.iter().filter(|o| o.bbox.intersects(bbox)) {
            overlaps
                .entry(octant.level())
                .or_default()
                .push(octant.clone());
        }
        Ok(overlaps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn octant(path: &str, west: f64, south: f64) -> Octant {
        Octant::new(
            path,
            GeoBoundingBox::new(south + 0.01, south, west + 0.01, west),
        )
    }

    #[test]
    fn test_groups_by_level_preserving_order() {
        let index = JsonOverlapIndex::new(vec![
            octant("0123", 0.00, 0.00),
            octant("012", 0.00, 0.00),
            octant("0122", 0.01, 0.00),
            octant("7777", 5.00, 5.00),
        ]);
        let aoi = GeoBoundingBox::new(0.015, 0.005, 0.015, 0.005);

        let overlaps = index.find_overlaps(&aoi, 200).unwrap();
        assert_eq!(overlaps.len(), 2);
        let level4: Vec<_> = overlaps[&4].iter().map(|o| o.path.as_str()).collect();
        assert_eq!(level4, vec!["0123", "0122"]);
        assert_eq!(overlaps[&3].len(), 1);
    }

    #[test]
    fn test_no_overlap() {
        let index = JsonOverlapIndex::new(vec![octant("0", 0.0, 0.0)]);
        let far = GeoBoundingBox::new(50.0, 49.0, 50.0, 49.0);
        assert!(index.find_overlaps(&far, 200).unwrap().is_empty());
    }

    #[test]
    fn test_load_catalog() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"octants":[{{"path":"0123","bbox":{{"north":1.0,"south":0.0,"east":1.0,"west":0.0}}}}]}}"#
        )
        .unwrap();

        let index = JsonOverlapIndex::load(file.path()).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.octants[0].level(), 4);
    }

    #[test]
    fn test_load_invalid_catalog() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            JsonOverlapIndex::load(file.path()),
            Err(OverlapError::Parse { .. })
        ));
    }

    #[test]
    fn test_load_missing_catalog() {
        let result = JsonOverlapIndex::load(Path::new("/nonexistent/catalog.json"));
        assert!(matches!(result, Err(OverlapError::Read { .. })));
    }
}
