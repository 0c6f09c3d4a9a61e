//! Metadata decoding for bulk, node and planetoid responses.
//!
//! The tile service describes its quadtree through three message kinds:
//!
//! - **Planetoid metadata**: root of the tree, carrying the epoch used to
//!   request the first bulk response.
//! - **Bulk metadata**: one response per subtree, holding a node container
//!   with per-node records and subtree-wide defaults.
//! - **Node metadata**: one record per addressable tile.
//!
//! All three are decoded with [`crate::wire::decode_message`] against the
//! field tables declared in the submodules. Truncated or malformed input never
//! fails the whole response; it only shortens what is returned.

mod bulk;
mod node;
mod planetoid;

pub use bulk::{
    decode_bulk_metadata, decode_bulk_metadata_with_threshold, BulkMetadata,
    BulkMetadataDefaults, NODE_CONTAINER_THRESHOLD,
};
pub use node::{decode_node_metadata, NodeRecord, PathAndFlags};
pub use planetoid::{decode_planetoid_metadata, PlanetoidMetadata};
