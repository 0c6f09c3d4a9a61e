//! Tile compositing.

use std::collections::HashMap;
use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::{imageops, ImageFormat, ImageReader, RgbImage};
use tracing::{debug, warn};

use super::grid::{grid_position, GridStep};
use super::{MosaicError, PlacementPolicy, MAX_CANVAS_DIMENSION};
use crate::classify::{Classification, Classifier};
use crate::geo::GeoBoundingBox;
use crate::tile::TileImage;

pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Where one tile landed on the canvas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub path: String,
    pub x: u32,
    pub y: u32,
}

/// A composited canvas with the geometry it was built from.
///
/// Holds every tile it was given, placed or not, until it is dropped.
#[derive(Debug, Clone)]
pub struct Mosaic {
    tiles: Vec<TileImage>,
    canvas: RgbImage,
    bbox: GeoBoundingBox,
    step: GridStep,
    tile_size: (u32, u32),
    placements: Vec<Placement>,
    skipped: usize,
}

impl Mosaic {
    pub fn canvas(&self) -> &RgbImage {
        &self.canvas
    }

    /// Union of the placed tiles' footprints.
    pub fn bbox(&self) -> &GeoBoundingBox {
        &self.bbox
    }

    pub fn step(&self) -> &GridStep {
        &self.step
    }

    pub fn tile_size(&self) -> (u32, u32) {
        self.tile_size
    }

    /// Visible tiles, one per occupied cell.
    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    /// Supplied tiles, ordered by path.
    pub fn tiles(&self) -> &[TileImage] {
        &self.tiles
    }

    /// Tiles that were supplied but not placed.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.canvas.dimensions()
    }

    pub fn encode_jpeg(&self, quality: u8) -> Result<Vec<u8>, MosaicError> {
        let mut buf = Vec::new();
        self.canvas
            .write_with_encoder(JpegEncoder::new_with_quality(&mut buf, quality))?;
        Ok(buf)
    }

    /// Writes the composite as a JPEG file.
    pub fn save(&self, path: &Path, quality: u8) -> Result<(), MosaicError> {
        let jpeg = self.encode_jpeg(quality)?;
        fs::write(path, jpeg).map_err(|source| MosaicError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Result of compositing one set of tiles.
#[derive(Debug)]
pub enum MosaicOutcome {
    /// Nothing could be placed.
    NoData,
    /// A composite and, unless the classifier failed, its classification.
    Composite {
        mosaic: Mosaic,
        classification: Option<Classification>,
    },
}

impl MosaicOutcome {
    pub fn is_no_data(&self) -> bool {
        matches!(self, MosaicOutcome::NoData)
    }

    pub fn mosaic(&self) -> Option<&Mosaic> {
        match self {
            MosaicOutcome::Composite { mosaic, .. } => Some(mosaic),
            MosaicOutcome::NoData => None,
        }
    }

    pub fn classification(&self) -> Option<&Classification> {
        match self {
            MosaicOutcome::Composite { classification, .. } => classification.as_ref(),
            MosaicOutcome::NoData => None,
        }
    }
}

struct DecodedTile {
    path: String,
    bbox: GeoBoundingBox,
    pixels: RgbImage,
}

/// Places tiles on a grid and composites them.
///
/// The first decodable tile (in path order) fixes the pixel size and the
/// angular step of the grid. Every tile's cell is its offset from the union's
/// north-west corner divided by that step, rounded to the nearest integer.
#[derive(Debug, Clone, Copy)]
pub struct MosaicAssembler {
    policy: PlacementPolicy,
    quality: u8,
}

impl Default for MosaicAssembler {
    fn default() -> Self {
        Self::new(PlacementPolicy::default())
    }
}

impl MosaicAssembler {
    pub fn new(policy: PlacementPolicy) -> Self {
        Self {
            policy,
            quality: DEFAULT_JPEG_QUALITY,
        }
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality.clamp(1, 100);
        self
    }

    pub fn policy(&self) -> PlacementPolicy {
        self.policy
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Builds the canvas, or `None` when no tile could be decoded.
    pub fn assemble(&self, mut tiles: Vec<TileImage>) -> Result<Option<Mosaic>, MosaicError> {
        if tiles.is_empty() {
            return Ok(None);
        }
        tiles.sort_by(|a, b| a.path().cmp(b.path()));
        let supplied = tiles.len();

        let decoded: Vec<DecodedTile> = tiles.iter().filter_map(decode_tile).collect();
        let Some(sample) = decoded.first() else {
            warn!(tiles = supplied, "no tile could be decoded");
            return Ok(None);
        };
        let tile_size = sample.pixels.dimensions();
        let step = GridStep::of(&sample.bbox);
        if !step.is_usable() {
            return Err(MosaicError::InvalidStep {
                path: sample.path.clone(),
            });
        }

        let kept = self.filter_uniform(decoded, tile_size, step)?;
        let Some(bbox) = GeoBoundingBox::union_all(kept.iter().map(|t| &t.bbox)) else {
            return Ok(None);
        };

        let mut placements: Vec<Placement> = Vec::with_capacity(kept.len());
        let mut occupied: HashMap<(u32, u32), usize> = HashMap::new();
        let mut cells = Vec::with_capacity(kept.len());
        for tile in &kept {
            let (x, y) = grid_position(&tile.bbox, &bbox, &step);
            cells.push((x, y));
            let placement = Placement {
                path: tile.path.clone(),
                x,
                y,
            };
            match occupied.get(&(x, y)) {
                None => {
                    occupied.insert((x, y), placements.len());
                    placements.push(placement);
                }
                Some(&index) => {
                    let previous = placements[index].path.clone();
                    if self.policy == PlacementPolicy::Strict {
                        return Err(MosaicError::Collision {
                            x,
                            y,
                            path: tile.path.clone(),
                            previous,
                        });
                    }
                    warn!(
                        x,
                        y,
                        path = %tile.path,
                        previous = %previous,
                        "cell collision, later tile wins"
                    );
                    placements[index] = placement;
                }
            }
        }

        let max_x = cells.iter().map(|c| c.0).max().unwrap_or(0);
        let max_y = cells.iter().map(|c| c.1).max().unwrap_or(0);
        let width = (u64::from(max_x) + 1) * u64::from(tile_size.0);
        let height = (u64::from(max_y) + 1) * u64::from(tile_size.1);
        if width > u64::from(MAX_CANVAS_DIMENSION) || height > u64::from(MAX_CANVAS_DIMENSION) {
            return Err(MosaicError::CanvasTooLarge { width, height });
        }

        let mut canvas = RgbImage::new(width as u32, height as u32);
        for (tile, (x, y)) in kept.iter().zip(cells) {
            imageops::replace(
                &mut canvas,
                &tile.pixels,
                i64::from(x) * i64::from(tile_size.0),
                i64::from(y) * i64::from(tile_size.1),
            );
        }

        let skipped = supplied - kept.len();
        debug!(
            placed = placements.len(),
            skipped,
            width,
            height,
            bbox = %bbox,
            "assembled mosaic"
        );
        Ok(Some(Mosaic {
            tiles,
            canvas,
            bbox,
            step,
            tile_size,
            placements,
            skipped,
        }))
    }

    /// Assembles the tiles and classifies the composite.
    ///
    /// The classifier reads the composite from a temporary JPEG that is
    /// removed before this returns. A classifier failure leaves the composite
    /// unclassified rather than failing the call.
    pub fn compose<K>(
        &self,
        tiles: Vec<TileImage>,
        classifier: &K,
    ) -> Result<MosaicOutcome, MosaicError>
    where
        K: Classifier + ?Sized,
    {
        let Some(mosaic) = self.assemble(tiles)? else {
            return Ok(MosaicOutcome::NoData);
        };

        let jpeg = mosaic.encode_jpeg(self.quality)?;
        let mut staged = tempfile::Builder::new()
            .prefix("sitewatch-composite-")
            .suffix(".jpg")
            .tempfile()
            .map_err(MosaicError::Staging)?;
        staged
            .write_all(&jpeg)
            .and_then(|_| staged.flush())
            .map_err(MosaicError::Staging)?;

        let classification = match classifier.classify(staged.path()) {
            Ok(classification) => Some(classification),
            Err(e) => {
                warn!(error = %e, "classification failed, composite left unclassified");
                None
            }
        };

        Ok(MosaicOutcome::Composite {
            mosaic,
            classification,
        })
    }

    fn filter_uniform(
        &self,
        decoded: Vec<DecodedTile>,
        tile_size: (u32, u32),
        step: GridStep,
    ) -> Result<Vec<DecodedTile>, MosaicError> {
        let mut kept = Vec::with_capacity(decoded.len());
        for tile in decoded {
            let size = tile.pixels.dimensions();
            if size != tile_size {
                if self.policy == PlacementPolicy::Strict {
                    return Err(MosaicError::SizeMismatch {
                        path: tile.path,
                        expected: tile_size,
                        actual: size,
                    });
                }
                warn!(
                    path = %tile.path,
                    ?size,
                    expected = ?tile_size,
                    "skipping tile of different size"
                );
                continue;
            }

            let tile_step = GridStep::of(&tile.bbox);
            if !step.matches(&tile_step) {
                if self.policy == PlacementPolicy::Strict {
                    return Err(MosaicError::StepMismatch {
                        path: tile.path,
                        expected: (step.lon, step.lat),
                        actual: (tile_step.lon, tile_step.lat),
                    });
                }
                warn!(
                    path = %tile.path,
                    lon = tile_step.lon,
                    lat = tile_step.lat,
                    "tile step differs from sample"
                );
            }
            kept.push(tile);
        }
        Ok(kept)
    }
}

fn decode_tile(tile: &TileImage) -> Option<DecodedTile> {
    let decoded = ImageReader::with_format(Cursor::new(tile.bytes()), ImageFormat::Jpeg).decode();
    match decoded {
        Ok(image) => Some(DecodedTile {
            path: tile.path().to_string(),
            bbox: *tile.bbox(),
            pixels: image.to_rgb8(),
        }),
        Err(e) => {
            warn!(path = tile.path(), error = %e, "skipping undecodable tile");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{ClassifyError, ConstructionPhase};
    use crate::locator::TileAddress;
    use image::Rgb;
    use std::cell::{Cell, RefCell};
    use std::path::PathBuf;

    const RED: Rgb<u8> = Rgb([220, 20, 20]);
    const GREEN: Rgb<u8> = Rgb([20, 220, 20]);
    const BLUE: Rgb<u8> = Rgb([20, 20, 220]);
    const WHITE: Rgb<u8> = Rgb([240, 240, 240]);

    fn jpeg(size: u32, color: Rgb<u8>) -> Vec<u8> {
        let img = RgbImage::from_pixel(size, size, color);
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, ImageFormat::Jpeg)
            .expect("Failed to encode JPEG");
        buffer.into_inner()
    }

    fn tile(path: &str, col: u32, row: u32, step: f64, bytes: Vec<u8>) -> TileImage {
        let west = 55.30 + col as f64 * step;
        let north = 25.22 - row as f64 * step;
        TileImage::new(
            bytes,
            TileAddress::new(path, 990),
            GeoBoundingBox::new(north, north - step, west + step, west),
        )
    }

    fn grid_2x2() -> Vec<TileImage> {
        vec![
            tile("30", 0, 0, 0.01, jpeg(8, RED)),
            tile("31", 1, 0, 0.01, jpeg(8, GREEN)),
            tile("32", 0, 1, 0.01, jpeg(8, BLUE)),
            tile("33", 1, 1, 0.01, jpeg(8, WHITE)),
        ]
    }

    fn near(actual: &Rgb<u8>, expected: Rgb<u8>) -> bool {
        actual
            .0
            .iter()
            .zip(expected.0.iter())
            .all(|(a, e)| (*a as i16 - *e as i16).abs() <= 24)
    }

    struct RecordingClassifier {
        calls: Cell<usize>,
        seen: RefCell<Option<PathBuf>>,
        existed: Cell<bool>,
        fail: bool,
    }

    impl RecordingClassifier {
        fn new(fail: bool) -> Self {
            Self {
                calls: Cell::new(0),
                seen: RefCell::new(None),
                existed: Cell::new(false),
                fail,
            }
        }
    }

    impl Classifier for RecordingClassifier {
        fn classify(&self, image_path: &Path) -> Result<Classification, ClassifyError> {
            self.calls.set(self.calls.get() + 1);
            self.existed.set(image_path.exists());
            *self.seen.borrow_mut() = Some(image_path.to_path_buf());
            if self.fail {
                return Err(ClassifyError::Response("model unavailable".to_string()));
            }
            Ok(Classification::new(
                ConstructionPhase::Construction,
                80,
                "frame visible",
            ))
        }
    }

    #[test]
    fn test_two_by_two_canvas() {
        let mosaic = MosaicAssembler::default()
            .assemble(grid_2x2())
            .unwrap()
            .unwrap();

        assert_eq!(mosaic.dimensions(), (16, 16));
        assert_eq!(mosaic.tile_size(), (8, 8));
        let cells: Vec<_> = mosaic.placements().iter().map(|p| (p.x, p.y)).collect();
        assert_eq!(cells, vec![(0, 0), (1, 0), (0, 1), (1, 1)]);
        assert_eq!(mosaic.skipped(), 0);
        assert_eq!(mosaic.tiles().len(), 4);

        let canvas = mosaic.canvas();
        assert!(near(canvas.get_pixel(4, 4), RED));
        assert!(near(canvas.get_pixel(12, 4), GREEN));
        assert!(near(canvas.get_pixel(4, 12), BLUE));
        assert!(near(canvas.get_pixel(12, 12), WHITE));
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let mut tiles = grid_2x2();
        tiles.reverse();
        let mosaic = MosaicAssembler::default().assemble(tiles).unwrap().unwrap();
        assert!(near(mosaic.canvas().get_pixel(12, 4), GREEN));
    }

    #[test]
    fn test_empty_input_is_no_data() {
        let classifier = RecordingClassifier::new(false);
        let outcome = MosaicAssembler::default()
            .compose(Vec::new(), &classifier)
            .unwrap();
        assert!(outcome.is_no_data());
        assert!(outcome.mosaic().is_none());
        assert_eq!(classifier.calls.get(), 0);
    }

    #[test]
    fn test_undecodable_tiles_are_skipped() {
        let mut tiles = grid_2x2();
        tiles.push(tile("34", 2, 0, 0.01, b"not a jpeg".to_vec()));

        let mosaic = MosaicAssembler::new(PlacementPolicy::Strict)
            .assemble(tiles)
            .unwrap()
            .unwrap();
        assert_eq!(mosaic.placements().len(), 4);
        assert_eq!(mosaic.skipped(), 1);
        assert_eq!(mosaic.tiles().len(), 5);
        assert_eq!(mosaic.tiles()[4].path(), "34");
        assert_eq!(mosaic.dimensions(), (16, 16));
    }

    #[test]
    fn test_nothing_decodable_is_no_data() {
        let classifier = RecordingClassifier::new(false);
        let tiles = vec![tile("0", 0, 0, 0.01, vec![0xFF, 0xD8, 0x00])];
        let outcome = MosaicAssembler::default().compose(tiles, &classifier).unwrap();
        assert!(outcome.is_no_data());
        assert_eq!(classifier.calls.get(), 0);
    }

    #[test]
    fn test_composite_is_classified_from_transient_file() {
        let classifier = RecordingClassifier::new(false);
        let outcome = MosaicAssembler::default()
            .compose(grid_2x2(), &classifier)
            .unwrap();

        assert_eq!(classifier.calls.get(), 1);
        assert!(classifier.existed.get());
        let staged = classifier.seen.borrow().clone().unwrap();
        assert_eq!(staged.extension().and_then(|e| e.to_str()), Some("jpg"));
        assert!(!staged.exists());
        assert_eq!(
            outcome.classification().map(|c| c.phase),
            Some(ConstructionPhase::Construction)
        );
    }

    #[test]
    fn test_classifier_failure_leaves_composite_unclassified() {
        let classifier = RecordingClassifier::new(true);
        let outcome = MosaicAssembler::default()
            .compose(grid_2x2(), &classifier)
            .unwrap();

        assert!(outcome.mosaic().is_some());
        assert!(outcome.classification().is_none());
        let staged = classifier.seen.borrow().clone().unwrap();
        assert!(!staged.exists());
    }

    #[test]
    fn test_size_mismatch() {
        let mut tiles = grid_2x2();
        tiles.push(tile("34", 2, 0, 0.01, jpeg(16, RED)));

        let strict = MosaicAssembler::new(PlacementPolicy::Strict).assemble(tiles.clone());
        assert!(matches!(strict, Err(MosaicError::SizeMismatch { .. })));

        let mosaic = MosaicAssembler::new(PlacementPolicy::BestEffort)
            .assemble(tiles)
            .unwrap()
            .unwrap();
        assert_eq!(mosaic.placements().len(), 4);
        assert_eq!(mosaic.skipped(), 1);
    }

    #[test]
    fn test_collision() {
        let tiles = vec![
            tile("30", 0, 0, 0.01, jpeg(8, RED)),
            tile("31", 0, 0, 0.01, jpeg(8, BLUE)),
        ];

        let strict = MosaicAssembler::new(PlacementPolicy::Strict).assemble(tiles.clone());
        assert!(matches!(strict, Err(MosaicError::Collision { x: 0, y: 0, .. })));

        let mosaic = MosaicAssembler::new(PlacementPolicy::BestEffort)
            .assemble(tiles)
            .unwrap()
            .unwrap();
        assert_eq!(mosaic.placements().len(), 1);
        assert_eq!(mosaic.placements()[0].path, "31");
        assert!(near(mosaic.canvas().get_pixel(4, 4), BLUE));
    }

    #[test]
    fn test_step_mismatch() {
        let tiles = vec![
            tile("30", 0, 0, 0.01, jpeg(8, RED)),
            tile("31", 1, 0, 0.0105, jpeg(8, GREEN)),
        ];

        let strict = MosaicAssembler::new(PlacementPolicy::Strict).assemble(tiles.clone());
        assert!(matches!(strict, Err(MosaicError::StepMismatch { .. })));

        let mosaic = MosaicAssembler::new(PlacementPolicy::BestEffort)
            .assemble(tiles)
            .unwrap()
            .unwrap();
        assert_eq!(mosaic.placements().len(), 2);
    }

    #[test]
    fn test_degenerate_sample() {
        let flat = TileImage::new(
            jpeg(8, RED),
            TileAddress::new("0", 990),
            GeoBoundingBox::point(25.0, 55.0),
        );
        assert!(matches!(
            MosaicAssembler::default().assemble(vec![flat]),
            Err(MosaicError::InvalidStep { .. })
        ));
    }

    #[test]
    fn test_save_composite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aoi_0_2024_CONSTRUCTION.jpg");
        let mosaic = MosaicAssembler::default()
            .assemble(grid_2x2())
            .unwrap()
            .unwrap();

        mosaic.save(&path, DEFAULT_JPEG_QUALITY).unwrap();
        let reloaded = image::open(&path).unwrap();
        assert_eq!((reloaded.width(), reloaded.height()), (16, 16));
    }
}
