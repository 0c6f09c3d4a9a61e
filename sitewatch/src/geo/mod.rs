//! Geographic bounding boxes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Axis-aligned box in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBoundingBox {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl GeoBoundingBox {
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Self {
        Self {
            north,
            south,
            east,
            west,
        }
    }

    /// Longitudinal extent in degrees.
    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    /// Latitudinal extent in degrees.
    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    /// Centre as `(lat, lon)`.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.north + self.south) / 2.0,
            (self.east + self.west) / 2.0,
        )
    }

    /// Smallest box containing both.
    pub fn union(&self, other: &GeoBoundingBox) -> GeoBoundingBox {
        GeoBoundingBox {
            north: self.north.max(other.north),
            south: self.south.min(other.south),
            east: self.east.max(other.east),
            west: self.west.min(other.west),
        }
    }

    /// Union of every box in `boxes`, or `None` when empty.
    pub fn union_all<'a, I>(boxes: I) -> Option<GeoBoundingBox>
    where
        I: IntoIterator<Item = &'a GeoBoundingBox>,
    {
        boxes
            .into_iter()
            .copied()
            .reduce(|acc, bbox| acc.union(&bbox))
    }

    /// Extends the box to include the point `(lat, lon)`.
    pub fn include(&mut self, lat: f64, lon: f64) {
        self.north = self.north.max(lat);
        self.south = self.south.min(lat);
        self.east = self.east.max(lon);
        self.west = self.west.min(lon);
    }

    /// Degenerate box at a single point.
    pub fn point(lat: f64, lon: f64) -> Self {
        Self::new(lat, lat, lon, lon)
    }

    /// True when the interiors overlap. Boxes sharing only an edge do not.
    pub fn intersects(&self, other: &GeoBoundingBox) -> bool {
        self.west < other.east
            && self.east > other.west
            && self.south < other.north
            && self.north > other.south
    }

    /// True when every edge is finite and north/east are not below south/west.
    pub fn is_valid(&self) -> bool {
        [self.north, self.south, self.east, self.west]
            .iter()
            .all(|v| v.is_finite())
            && self.north >= self.south
            && self.east >= self.west
    }
}

impl fmt::Display for GeoBoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "N:{:.6}, S:{:.6}, E:{:.6}, W:{:.6}",
            self.north, self.south, self.east, self.west
        )
    }
}
