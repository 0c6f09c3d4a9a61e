//! Raster extraction from node-data payloads.
//!
//! A node-data payload nests its texture two levels deep:
//!
//! ```text
//! NodeData
//! └── field 2 (texture container, repeated)
//!     └── field 6 (raw asset, repeated): 3-byte header + JPEG stream
//! ```
//!
//! Only JPEG assets are recognised. Other texture formats and meshes are left
//! untouched.

use thiserror::Error;
use tracing::trace;

use crate::wire::{decode_message, FieldSpec, WireType};

/// Length of the header preceding the JPEG stream in a raw asset.
pub const ASSET_PREFIX_LEN: usize = 3;

/// JPEG start-of-image marker.
pub const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];

/// Errors from imagery extraction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageryError {
    /// No raw asset in the payload held a JPEG stream.
    #[error("no imagery found in node data ({candidates} candidate assets inspected)")]
    NoImageryFound { candidates: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeDataField {
    TextureContainer,
}

const NODE_DATA_FIELDS: &[FieldSpec<NodeDataField>] = &[FieldSpec::new(
    2,
    WireType::LengthDelimited,
    NodeDataField::TextureContainer,
)];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContainerField {
    RawAsset,
}

const CONTAINER_FIELDS: &[FieldSpec<ContainerField>] = &[FieldSpec::new(
    6,
    WireType::LengthDelimited,
    ContainerField::RawAsset,
)];

/// Returns the JPEG stream embedded in a node-data payload.
///
/// Every field-6 asset inside every field-2 container is tried in wire order;
/// the first whose bytes after the 3-byte header start with `FF D8` wins.
/// Truncated or malformed structure only limits the candidates considered.
pub fn extract_jpeg(payload: &[u8]) -> Result<&[u8], ImageryError> {
    let node_data = decode_message(payload, NODE_DATA_FIELDS);
    let mut candidates = 0;

    for container in node_data.all_bytes(NodeDataField::TextureContainer) {
        let container = decode_message(container, CONTAINER_FIELDS);
        for asset in container.all_bytes(ContainerField::RawAsset) {
            candidates += 1;
            if let Some(jpeg) = strip_asset_prefix(asset) {
                return Ok(jpeg);
            }
            trace!(len = asset.len(), "raw asset is not a JPEG stream");
        }
    }

    Err(ImageryError::NoImageryFound { candidates })
}

fn strip_asset_prefix(asset: &[u8]) -> Option<&[u8]> {
    let jpeg = asset.get(ASSET_PREFIX_LEN..)?;
    jpeg.starts_with(&JPEG_SOI).then_some(jpeg)
}
