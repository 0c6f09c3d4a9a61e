//! Mosaic assembly.
//!
//! Tiles fetched for one area are decoded, placed on a common grid derived
//! from their geographic footprints, and composited into a single RGB canvas.
//! The composite is written to a short-lived file for classification; the
//! caller decides where the final image is kept.

mod assembler;
mod grid;

use std::path::PathBuf;

use thiserror::Error;

pub use assembler::{Mosaic, MosaicAssembler, MosaicOutcome, Placement, DEFAULT_JPEG_QUALITY};
pub use grid::{grid_position, GridStep, STEP_TOLERANCE};

/// Largest canvas side, in pixels, the assembler will allocate.
pub const MAX_CANVAS_DIMENSION: u32 = 32_768;

/// How tiles that do not fit the sampled grid are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlacementPolicy {
    /// Reject the mosaic on any size, step or cell conflict.
    Strict,
    /// Skip tiles of the wrong pixel size, tolerate step drift and let the
    /// later tile (by path) win a contested cell.
    #[default]
    BestEffort,
}

impl std::str::FromStr for PlacementPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "strict" => Ok(PlacementPolicy::Strict),
            "besteffort" => Ok(PlacementPolicy::BestEffort),
            other => Err(format!("unknown placement policy '{}'", other)),
        }
    }
}

/// Errors from mosaic assembly.
#[derive(Debug, Error)]
pub enum MosaicError {
    #[error("tile {path} is {actual:?} pixels, expected {expected:?}")]
    SizeMismatch {
        path: String,
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("tile {path} spans {actual:?} degrees, expected {expected:?}")]
    StepMismatch {
        path: String,
        expected: (f64, f64),
        actual: (f64, f64),
    },

    #[error("tiles {previous} and {path} both map to cell ({x}, {y})")]
    Collision {
        x: u32,
        y: u32,
        path: String,
        previous: String,
    },

    #[error("tile {path} has a degenerate footprint")]
    InvalidStep { path: String },

    #[error("canvas of {width}x{height} pixels exceeds the size limit")]
    CanvasTooLarge { width: u64, height: u64 },

    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("failed to write composite {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to stage composite for classification: {0}")]
    Staging(std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_from_str() {
        assert_eq!("strict".parse(), Ok(PlacementPolicy::Strict));
        assert_eq!("best-effort".parse(), Ok(PlacementPolicy::BestEffort));
        assert_eq!("BestEffort".parse(), Ok(PlacementPolicy::BestEffort));
        assert!("lenient".parse::<PlacementPolicy>().is_err());
        assert_eq!(PlacementPolicy::default(), PlacementPolicy::BestEffort);
    }
}
