//! Retrieved tile imagery.
//!
//! A [`TileImage`] is produced once a node's data has been fetched and its
//! JPEG stream extracted. It owns the raw bytes; decoding to pixels is left to
//! the mosaic so that tiles which are never composited are never decoded.

use crate::geo::GeoBoundingBox;
use crate::locator::TileAddress;

/// Raw JPEG bytes of one tile with the address it was fetched from and its
/// geographic footprint.
///
/// # Example
///
/// ```
/// use sitewatch::geo::GeoBoundingBox;
/// use sitewatch::locator::TileAddress;
/// use sitewatch::tile::TileImage;
///
/// let tile = TileImage::new(
///     vec![0xFF, 0xD8],
///     TileAddress::new("0123", 990),
///     GeoBoundingBox::new(1.0, 0.0, 1.0, 0.0),
/// );
/// assert_eq!(tile.path(), "0123");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TileImage {
    bytes: Vec<u8>,
    address: TileAddress,
    bbox: GeoBoundingBox,
}

impl TileImage {
    pub fn new(bytes: Vec<u8>, address: TileAddress, bbox: GeoBoundingBox) -> Self {
        Self {
            bytes,
            address,
            bbox,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn address(&self) -> &TileAddress {
        &self.address
    }

    pub fn bbox(&self) -> &GeoBoundingBox {
        &self.bbox
    }

    /// Octant path of the tile.
    pub fn path(&self) -> &str {
        self.address.path()
    }

    /// Consumes the tile, returning its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}
