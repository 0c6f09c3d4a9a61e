//! Planetoid (root) metadata.

use crate::wire::{decode_message, FieldSpec, WireType};

use super::node::{NodeField, NODE_FIELDS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlanetoidField {
    RootNode,
    Radius,
    MinTerrainAltitude,
    MaxTerrainAltitude,
}

const PLANETOID_FIELDS: &[FieldSpec<PlanetoidField>] = &[
    FieldSpec::new(1, WireType::LengthDelimited, PlanetoidField::RootNode),
    FieldSpec::new(2, WireType::Fixed32, PlanetoidField::Radius),
    FieldSpec::new(3, WireType::Fixed32, PlanetoidField::MinTerrainAltitude),
    FieldSpec::new(4, WireType::Fixed32, PlanetoidField::MaxTerrainAltitude),
];

/// Root description of a planet.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlanetoidMetadata {
    /// Epoch to use for the root bulk metadata request.
    pub root_epoch: Option<u64>,
    /// Planet radius in metres.
    pub radius: Option<f32>,
    pub min_terrain_altitude: Option<f32>,
    pub max_terrain_altitude: Option<f32>,
}

/// Decodes a planetoid metadata response.
///
/// The root node record carries no path, so its epoch is read directly from
/// the node field table rather than through [`super::decode_node_metadata`].
pub fn decode_planetoid_metadata(data: &[u8]) -> PlanetoidMetadata {
    let message = decode_message(data, PLANETOID_FIELDS);

    let root_epoch = message
        .bytes(PlanetoidField::RootNode)
        .and_then(|root| decode_message(root, NODE_FIELDS).varint(NodeField::Epoch));

    PlanetoidMetadata {
        root_epoch,
        radius: message.fixed32(PlanetoidField::Radius).map(f32::from_bits),
        min_terrain_altitude: message
            .fixed32(PlanetoidField::MinTerrainAltitude)
            .map(f32::from_bits),
        max_terrain_altitude: message
            .fixed32(PlanetoidField::MaxTerrainAltitude)
            .map(f32::from_bits),
    }
}
