//! Areas of interest from GeoJSON.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::SurveyError;
use crate::geo::GeoBoundingBox;

/// A site to survey.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaOfInterest {
    /// One-based position of the feature in its collection.
    pub number: usize,
    pub bbox: GeoBoundingBox,
}

impl AreaOfInterest {
    pub fn new(number: usize, bbox: GeoBoundingBox) -> Self {
        Self { number, bbox }
    }

    /// Centre of the bounding box as `(lat, lon)`.
    ///
    /// Only the footprint's extent is kept, so this is not the area-weighted
    /// polygon centroid. For the small convex footprints surveyed the two
    /// differ by a fraction of a tile, well inside a map link's precision.
    pub fn centroid(&self) -> (f64, f64) {
        self.bbox.center()
    }

    /// Map link centred on the area.
    pub fn maps_url(&self) -> String {
        let (lat, lon) = self.centroid();
        format!("https://maps.google.com/?q={},{}", lat, lon)
    }
}

#[derive(Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Deserialize)]
struct Feature {
    geometry: Option<Value>,
}

/// Reads areas from a GeoJSON FeatureCollection file.
///
/// `skip` and `limit` select a slice of the features before any geometry is
/// inspected; numbering always reflects the position in the full file.
pub fn load_areas(
    path: &Path,
    skip: usize,
    limit: Option<usize>,
) -> Result<Vec<AreaOfInterest>, SurveyError> {
    let text = fs::read_to_string(path).map_err(|source| SurveyError::ReadAreas {
        path: path.to_path_buf(),
        source,
    })?;
    let areas = parse_areas(&text, skip, limit)?;
    debug!(path = %path.display(), areas = areas.len(), "loaded areas of interest");
    Ok(areas)
}

/// Parses areas from GeoJSON text. See [`load_areas`].
pub fn parse_areas(
    json: &str,
    skip: usize,
    limit: Option<usize>,
) -> Result<Vec<AreaOfInterest>, SurveyError> {
    let collection: FeatureCollection = serde_json::from_str(json)?;
    let take = limit.unwrap_or(usize::MAX);

    let areas = collection
        .features
        .iter()
        .enumerate()
        .skip(skip)
        .take(take)
        .filter_map(|(index, feature)| {
            let number = index + 1;
            let bbox = feature.geometry.as_ref().and_then(geometry_bounds);
            if bbox.is_none() {
                warn!(feature = number, "feature has no usable geometry, skipping");
            }
            bbox.map(|bbox| AreaOfInterest::new(number, bbox))
        })
        .collect();
    Ok(areas)
}

/// Bounding box of every position in a GeoJSON geometry.
fn geometry_bounds(geometry: &Value) -> Option<GeoBoundingBox> {
    let mut bbox: Option<GeoBoundingBox> = None;
    if let Some(coordinates) = geometry.get("coordinates") {
        visit_positions(coordinates, &mut bbox);
    }
    if let Some(Value::Array(members)) = geometry.get("geometries") {
        for member in members {
            if let Some(member_bbox) = geometry_bounds(member) {
                bbox = Some(match bbox {
                    Some(b) => b.union(&member_bbox),
                    None => member_bbox,
                });
            }
        }
    }
    bbox.filter(GeoBoundingBox::is_valid)
}

fn visit_positions(value: &Value, bbox: &mut Option<GeoBoundingBox>) {
    let Value::Array(items) = value else {
        return;
    };
    match (
        items.first().and_then(Value::as_f64),
        items.get(1).and_then(Value::as_f64),
    ) {
        (Some(lon), Some(lat)) => match bbox {
            Some(b) => b.include(lat, lon),
            None => *bbox = Some(GeoBoundingBox::point(lat, lon)),
        },
        _ => {
            for item in items {
                visit_positions(item, bbox);
            }
        }
    }
}
