//! Geographic to grid placement.

use crate::geo::GeoBoundingBox;

/// Relative difference at which two tile extents count as different steps.
pub const STEP_TOLERANCE: f64 = 1e-3;

/// Angular size of one grid cell in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridStep {
    pub lon: f64,
    pub lat: f64,
}

impl GridStep {
    /// Step of a single tile's footprint.
    pub fn of(bbox: &GeoBoundingBox) -> Self {
        Self {
            lon: bbox.width(),
            lat: bbox.height(),
        }
    }

    /// True when both extents are positive and finite.
    pub fn is_usable(&self) -> bool {
        self.lon.is_finite() && self.lat.is_finite() && self.lon > 0.0 && self.lat > 0.0
    }

    /// True when `other` matches within [`STEP_TOLERANCE`].
    pub fn matches(&self, other: &GridStep) -> bool {
        let close = |a: f64, b: f64| (a - b).abs() <= a.abs() * STEP_TOLERANCE;
        close(self.lon, other.lon) && close(self.lat, other.lat)
    }
}

/// Grid cell of a tile within the union box.
///
/// Column counts east from the union's west edge and row counts south from
/// its north edge, both rounded to the nearest cell so that floating-point
/// noise in the tile boundaries does not shift a tile by one.
pub fn grid_position(
    tile: &GeoBoundingBox,
    union: &GeoBoundingBox,
    step: &GridStep,
) -> (u32, u32) {
    let x = ((tile.west - union.west) / step.lon).round();
    let y = ((union.north - tile.north) / step.lat).round();
    (cell(x), cell(y))
}

fn cell(v: f64) -> u32 {
    if v.is_finite() && v > 0.0 {
        v.min(u32::MAX as f64) as u32
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn tile(west: f64, north: f64, step: f64) -> GeoBoundingBox {
        GeoBoundingBox::new(north, north - step, west + step, west)
    }

    #[test]
    fn test_two_by_two_grid() {
        let tiles = [
            tile(55.30, 25.22, 0.01),
            tile(55.31, 25.22, 0.01),
            tile(55.30, 25.21, 0.01),
            tile(55.31, 25.21, 0.01),
        ];
        let union = GeoBoundingBox::union_all(tiles.iter()).unwrap();
        let step = GridStep::of(&tiles[0]);

        let positions: Vec<_> = tiles
            .iter()
            .map(|t| grid_position(t, &union, &step))
            .collect();
        assert_eq!(positions, vec![(0, 0), (1, 0), (0, 1), (1, 1)]);
    }

    #[test]
    fn test_rounding_absorbs_float_noise() {
        let union = GeoBoundingBox::new(1.0, 0.0, 1.0, 0.0);
        let step = GridStep { lon: 0.1, lat: 0.1 };
        let noisy = GeoBoundingBox::new(0.7000000001, 0.6, 0.3999999999, 0.2999999999);
        assert_eq!(grid_position(&noisy, &union, &step), (3, 3));
    }

    #[test]
    fn test_step_matching() {
        let step = GridStep { lon: 0.01, lat: 0.01 };
        assert!(step.matches(&GridStep {
            lon: 0.010000001,
            lat: 0.01
        }));
        assert!(!step.matches(&GridStep {
            lon: 0.02,
            lat: 0.01
        }));
        assert!(!GridStep { lon: 0.0, lat: 0.01 }.is_usable());
    }

    proptest! {
        #[test]
        fn test_positions_recover_grid_indices(col in 0u32..64, row in 0u32..64) {
            let step = 0.0137;
            let origin_west = 55.0;
            let origin_north = 25.5;
            let union = GeoBoundingBox::new(origin_north, origin_north - 64.0 * step,
                origin_west + 64.0 * step, origin_west);
            let t = tile(origin_west + col as f64 * step, origin_north - row as f64 * step, step);
            prop_assert_eq!(grid_position(&t, &union, &GridStep::of(&t)), (col, row));
        }
    }
}
