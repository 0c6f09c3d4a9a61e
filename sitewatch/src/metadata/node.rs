//! Node metadata records.

use std::fmt;

use crate::locator::TileAddress;
use crate::wire::{decode_message, FieldSpec, WireType};

use super::BulkMetadataDefaults;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum NodeField {
    PathAndFlags,
    Epoch,
    Timestamp,
    ImageryEpoch,
}

pub(super) const NODE_FIELDS: &[FieldSpec<NodeField>] = &[
    FieldSpec::new(1, WireType::Varint, NodeField::PathAndFlags),
    FieldSpec::new(2, WireType::Varint, NodeField::Epoch),
    FieldSpec::new(5, WireType::Varint, NodeField::Timestamp),
    FieldSpec::new(7, WireType::Varint, NodeField::ImageryEpoch),
];

/// The combined path+flags field, read once at parse time.
///
/// The service addresses the node by the whole 64-bit value; the flags are a
/// view of its top two bits and are not stripped from the path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PathAndFlags {
    pub path: u64,
    pub flags: u8,
}

impl PathAndFlags {
    const FLAG_SHIFT: u32 = 62;

    pub fn from_raw(raw: u64) -> Self {
        Self {
            path: raw,
            flags: (raw >> Self::FLAG_SHIFT) as u8,
        }
    }

    /// The wire value, identical to the path.
    pub fn raw(&self) -> u64 {
        self.path
    }
}

/// Metadata for one addressable tile.
///
/// Only constructed by [`decode_node_metadata`], and only when the message
/// carried a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRecord {
    path_and_flags: PathAndFlags,
    epoch: Option<u64>,
    imagery_epoch: Option<u64>,
    timestamp: Option<u64>,
}

impl NodeRecord {
    pub fn path(&self) -> u64 {
        self.path_and_flags.path
    }

    pub fn flags(&self) -> u8 {
        self.path_and_flags.flags
    }

    pub fn path_and_flags(&self) -> PathAndFlags {
        self.path_and_flags
    }

    pub fn epoch(&self) -> Option<u64> {
        self.epoch
    }

    pub fn imagery_epoch(&self) -> Option<u64> {
        self.imagery_epoch
    }

    pub fn timestamp(&self) -> Option<u64> {
        self.timestamp
    }

    /// The path as it appears in locators.
    pub fn octant_path(&self) -> String {
        self.path_and_flags.path.to_string()
    }

    /// Effective imagery epoch and timestamp.
    ///
    /// The node's own values win; the bulk defaults fill whatever the node
    /// left out.
    pub fn resolve(&self, defaults: &BulkMetadataDefaults) -> BulkMetadataDefaults {
        BulkMetadataDefaults {
            imagery_epoch: self.imagery_epoch.or(defaults.imagery_epoch),
            timestamp: self.timestamp.or(defaults.timestamp),
        }
    }

    /// Builds the node-data address for this node.
    pub fn tile_address(&self, defaults: &BulkMetadataDefaults, epoch: u64) -> TileAddress {
        let resolved = self.resolve(defaults);
        let mut address = TileAddress::new(self.octant_path(), epoch);
        if let Some(imagery_epoch) = resolved.imagery_epoch {
            address = address.with_imagery_epoch(imagery_epoch);
        }
        if let Some(timestamp) = resolved.timestamp {
            address = address.with_timestamp(timestamp);
        }
        address
    }
}

impl fmt::Display for NodeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node {} (flags {})", self.path(), self.flags())?;
        if let Some(epoch) = self.epoch {
            write!(f, " epoch={}", epoch)?;
        }
        if let Some(imagery_epoch) = self.imagery_epoch {
            write!(f, " imagery_epoch={}", imagery_epoch)?;
        }
        if let Some(timestamp) = self.timestamp {
            write!(f, " timestamp={}", timestamp)?;
        }
        Ok(())
    }
}

/// Decodes one node metadata message.
///
/// Returns `None` when field 1 is absent. A truncated message still yields a
/// record if the path was read before the truncation point.
pub fn decode_node_metadata(buf: &[u8]) -> Option<NodeRecord> {
    let message = decode_message(buf, NODE_FIELDS);
    let raw = message.varint(NodeField::PathAndFlags)?;

    Some(NodeRecord {
        path_and_flags: PathAndFlags::from_raw(raw),
        epoch: message.varint(NodeField::Epoch),
        imagery_epoch: message.varint(NodeField::ImageryEpoch),
        timestamp: message.varint(NodeField::Timestamp),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::FieldWriter;

    #[test]
    fn test_missing_path_yields_no_record() {
        let buf = FieldWriter::new()
            .varint(2, 990)
            .varint(5, 1036419)
            .varint(7, 350)
            .finish();
        assert!(decode_node_metadata(&buf).is_none());
    }

    #[test]
    fn test_flags_are_top_two_bits() {
        let raw = (0b10u64 << 62) | 383927;
        let buf = FieldWriter::new()
            .varint(1, raw)
            .varint(2, 990)
            .varint(5, 1036419)
            .varint(7, 350)
            .finish();
        let node = decode_node_metadata(&buf).unwrap();

        assert_eq!(node.flags(), (raw >> 62) as u8);
        assert_eq!(node.flags(), 2);
        assert_eq!(node.path(), raw);
        assert_eq!(node.epoch(), Some(990));
        assert_eq!(node.timestamp(), Some(1036419));
        assert_eq!(node.imagery_epoch(), Some(350));
        assert_eq!(node.path_and_flags().raw(), raw);
    }

    #[test]
    fn test_flagged_path_addresses_full_value() {
        let raw = (1u64 << 62) | 42;
        let buf = FieldWriter::new().varint(1, raw).finish();
        let node = decode_node_metadata(&buf).unwrap();

        assert_eq!(node.path(), raw);
        assert_eq!(node.flags(), 1);
        assert_eq!(node.octant_path(), "4611686018427387946");

        let address = node.tile_address(&BulkMetadataDefaults::default(), 990);
        assert_eq!(address.path(), "4611686018427387946");
    }

    #[test]
    fn test_optional_fields_absent() {
        let buf = FieldWriter::new().varint(1, 42).finish();
        let node = decode_node_metadata(&buf).unwrap();
        assert_eq!(node.flags(), 0);
        assert_eq!(node.epoch(), None);
        assert_eq!(node.imagery_epoch(), None);
        assert_eq!(node.timestamp(), None);
    }

    #[test]
    fn test_truncation_after_path_keeps_record() {
        let mut buf = FieldWriter::new().varint(1, 42).varint(2, 7).finish();
        // Field 7 varint with a dangling continuation byte.
        buf.extend_from_slice(&[0x38, 0x80]);
        let node = decode_node_metadata(&buf).unwrap();
        assert_eq!(node.path(), 42);
        assert_eq!(node.epoch(), Some(7));
        assert_eq!(node.imagery_epoch(), None);
    }

    #[test]
    fn test_truncation_before_path_drops_record() {
        let buf = [0x10, 0x05, 0x08, 0xFF];
        assert!(decode_node_metadata(&buf).is_none());
    }

    #[test]
    fn test_tile_address_falls_back_to_defaults() {
        let buf = FieldWriter::new().varint(1, 383927).varint(7, 5).finish();
        let node = decode_node_metadata(&buf).unwrap();
        let defaults = BulkMetadataDefaults {
            imagery_epoch: Some(9),
            timestamp: Some(1025439),
        };

        let resolved = node.resolve(&defaults);
        assert_eq!(resolved.imagery_epoch, Some(5));
        assert_eq!(resolved.timestamp, Some(1025439));
        assert_eq!(
            node.resolve(&BulkMetadataDefaults::default()).timestamp,
            None
        );

        let address = node.tile_address(&defaults, 990);
        assert_eq!(address.path(), "383927");
        assert_eq!(address.epoch(), 990);
        assert_eq!(address.imagery_epoch(), Some(5));
        assert_eq!(address.timestamp(), Some(1025439));
    }

    #[test]
    fn test_display() {
        let buf = FieldWriter::new().varint(1, 12).varint(2, 3).finish();
        let node = decode_node_metadata(&buf).unwrap();
        assert_eq!(node.to_string(), "node 12 (flags 0) epoch=3");
    }
}
