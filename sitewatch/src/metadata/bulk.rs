//! Bulk metadata responses.

use tracing::debug;

use crate::wire::{decode_message, FieldScanner, FieldSpec, FieldValue, WireType};

use super::node::{decode_node_metadata, NodeRecord};

/// Payload size above which a top-level message is taken to be the node
/// container.
///
/// Empirical: the service pads bulk responses with small filler messages and
/// the container is the first one large enough to hold a subtree. Override with
/// [`decode_bulk_metadata_with_threshold`] when a response shape disagrees.
pub const NODE_CONTAINER_THRESHOLD: usize = 1000;

/// Key byte of a field 1 length-delimited node message.
const NODE_TAG: u8 = 0x0A;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BulkField {
    NodeMetadata,
    DefaultImageryEpoch,
    DefaultTimestamp,
}

const BULK_FIELDS: &[FieldSpec<BulkField>] = &[
    FieldSpec::new(1, WireType::LengthDelimited, BulkField::NodeMetadata),
    FieldSpec::new(5, WireType::Varint, BulkField::DefaultImageryEpoch),
    FieldSpec::new(6, WireType::Varint, BulkField::DefaultTimestamp),
];

/// Subtree-wide fallbacks carried by one bulk response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkMetadataDefaults {
    pub imagery_epoch: Option<u64>,
    pub timestamp: Option<u64>,
}

/// Decoded bulk response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkMetadata {
    pub defaults: BulkMetadataDefaults,
    pub nodes: Vec<NodeRecord>,
    /// Node messages discarded for lacking a path.
    pub dropped: usize,
    /// Payload size of the selected container, if one was found.
    pub container_len: Option<usize>,
}

impl BulkMetadata {
    /// True when no container was found in the response.
    pub fn is_empty(&self) -> bool {
        self.container_len.is_none()
    }

    /// Nodes that carry their own imagery epoch.
    pub fn imagery_nodes(&self) -> impl Iterator<Item = &NodeRecord> {
        self.nodes.iter().filter(|n| n.imagery_epoch().is_some())
    }
}

/// Decodes a bulk response using [`NODE_CONTAINER_THRESHOLD`].
pub fn decode_bulk_metadata(data: &[u8]) -> BulkMetadata {
    decode_bulk_metadata_with_threshold(data, NODE_CONTAINER_THRESHOLD)
}

/// Decodes a bulk response, selecting as container the first top-level
/// length-delimited message whose payload is larger than `threshold` bytes.
///
/// Never fails: a response without a container yields an empty result. When
/// the container scan hits a malformed or truncated field, decoding resumes
/// at the next node tag byte, so one corrupt node does not hide the rest.
pub fn decode_bulk_metadata_with_threshold(data: &[u8], threshold: usize) -> BulkMetadata {
    let Some(container) = find_container(data, threshold) else {
        debug!(
            bytes = data.len(),
            threshold, "bulk response has no node container"
        );
        return BulkMetadata::default();
    };

    let mut defaults = BulkMetadataDefaults::default();
    let mut nodes = Vec::new();
    let mut dropped = 0;
    let mut resyncs = 0;
    let mut start = 0;

    while start < container.len() {
        let segment = &container[start..];
        let message = decode_message(segment, BULK_FIELDS);

        defaults = BulkMetadataDefaults {
            imagery_epoch: message
                .varint(BulkField::DefaultImageryEpoch)
                .or(defaults.imagery_epoch),
            timestamp: message
                .varint(BulkField::DefaultTimestamp)
                .or(defaults.timestamp),
        };

        for node_bytes in message.all_bytes(BulkField::NodeMetadata) {
            match decode_node_metadata(node_bytes) {
                Some(node) => nodes.push(node),
                None => dropped += 1,
            }
        }

        let (Some(error), Some(failed_at)) = (message.error(), message.failed_at()) else {
            break;
        };
        let failed_at = start + failed_at;
        debug!(
            offset = failed_at,
            truncated = error.is_truncation(),
            error = %error,
            "node container scan interrupted"
        );
        match next_node_tag(container, failed_at + 1) {
            Some(next) => {
                resyncs += 1;
                start = next;
            }
            None => break,
        }
    }

    debug!(
        container_len = container.len(),
        nodes = nodes.len(),
        dropped,
        resyncs,
        "decoded bulk metadata"
    );

    BulkMetadata {
        defaults,
        nodes,
        dropped,
        container_len: Some(container.len()),
    }
}

/// Position of the next field 1 length-delimited tag at or after `from`.
fn next_node_tag(container: &[u8], from: usize) -> Option<usize> {
    container
        .get(from..)?
        .iter()
        .position(|&b| b == NODE_TAG)
        .map(|i| from + i)
}

fn find_container(data: &[u8], threshold: usize) -> Option<&[u8]> {
    for field in FieldScanner::new(data) {
        match field {
            Ok(field) => {
                if let FieldValue::Bytes(payload) = field.value {
                    if payload.len() > threshold {
                        return Some(payload);
                    }
                }
            }
            Err(e) => {
                debug!(error = %e, "bulk response scan ended early");
                return None;
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::FieldWriter;

    fn node(path: u64, imagery_epoch: Option<u64>) -> Vec<u8> {
        let mut writer = FieldWriter::new().varint(1, path).varint(2, 990);
        if let Some(epoch) = imagery_epoch {
            writer = writer.varint(7, epoch);
        }
        writer.finish()
    }

    fn container(node_count: u64) -> Vec<u8> {
        let mut writer = FieldWriter::new().varint(5, 11).varint(6, 1025439);
        for i in 0..node_count {
            writer = writer.bytes(1, &node(1000 + i, Some(i)));
        }
        // Unknown trailing fields must not disturb the scan.
        writer.bytes(3, &[0u8; 16]).fixed32(4, 0).finish()
    }

    fn response(container: &[u8]) -> Vec<u8> {
        FieldWriter::new()
            .bytes(1, b"filler")
            .bytes(2, &[0u8; 32])
            .bytes(1, container)
            .finish()
    }

    #[test]
    fn test_decodes_container_nodes_and_defaults() {
        let data = response(&container(200));
        let bulk = decode_bulk_metadata(&data);

        assert!(!bulk.is_empty());
        assert_eq!(bulk.nodes.len(), 200);
        assert_eq!(bulk.dropped, 0);
        assert_eq!(bulk.defaults.imagery_epoch, Some(11));
        assert_eq!(bulk.defaults.timestamp, Some(1025439));
        assert_eq!(bulk.nodes[0].path(), 1000);
        assert_eq!(bulk.nodes[199].imagery_epoch(), Some(199));
    }

    #[test]
    fn test_small_messages_are_not_containers() {
        let data = response(&container(2));
        let bulk = decode_bulk_metadata(&data);
        assert!(bulk.is_empty());
        assert!(bulk.nodes.is_empty());
    }

    #[test]
    fn test_threshold_is_tunable() {
        let data = response(&container(2));
        let bulk = decode_bulk_metadata_with_threshold(&data, 40);
        assert_eq!(bulk.nodes.len(), 2);
    }

    #[test]
    fn test_nodes_without_path_are_dropped() {
        let mut writer = FieldWriter::new();
        for i in 0..150 {
            writer = writer.bytes(1, &node(i, None));
        }
        let pathless = FieldWriter::new().varint(2, 990).varint(7, 1).finish();
        writer = writer.bytes(1, &pathless).bytes(1, &pathless);
        let data = FieldWriter::new().bytes(1, &writer.finish()).finish();

        let bulk = decode_bulk_metadata(&data);
        assert_eq!(bulk.nodes.len(), 150);
        assert_eq!(bulk.dropped, 2);
        assert_eq!(bulk.defaults, BulkMetadataDefaults::default());
        assert_eq!(bulk.imagery_nodes().count(), 0);
    }

    #[test]
    fn test_truncated_container_keeps_decoded_nodes() {
        let full = container(200);
        let data = response(&full);
        // Drop the last 30 bytes of the response: the container's declared
        // length now overruns the buffer, so no container is found at the top
        // level.
        let truncated_top = decode_bulk_metadata(&data[..data.len() - 30]);
        assert!(truncated_top.is_empty());

        // A container that is itself cut short mid-node still yields every
        // node before the cut.
        let cut = &full[..full.len() * 2 / 3];
        let data = FieldWriter::new().bytes(1, cut).finish();
        let bulk = decode_bulk_metadata(&data);
        assert!(!bulk.nodes.is_empty());
        assert!(bulk.nodes.len() < 200);
        assert_eq!(bulk.defaults.imagery_epoch, Some(11));
    }

    #[test]
    fn test_scan_resumes_after_unskippable_field() {
        let mut writer = FieldWriter::new().varint(6, 1025439);
        for i in 0..100 {
            writer = writer.bytes(1, &node(1000 + i, Some(i)));
        }
        // Field 2 with the unassigned wire type 6.
        writer = writer.raw(&[0x16, 0x55, 0x66]);
        for i in 100..200 {
            writer = writer.bytes(1, &node(1000 + i, Some(i)));
        }
        let data = FieldWriter::new().bytes(1, &writer.finish()).finish();

        let bulk = decode_bulk_metadata(&data);
        assert_eq!(bulk.nodes.len(), 200);
        assert_eq!(bulk.nodes[99].path(), 1099);
        assert_eq!(bulk.nodes[100].path(), 1100);
        assert_eq!(bulk.defaults.timestamp, Some(1025439));
    }

    #[test]
    fn test_scan_resumes_after_corrupt_length() {
        let mut writer = FieldWriter::new();
        for i in 0..100 {
            writer = writer.bytes(1, &node(2000 + i, None));
        }
        // Field 3 declaring far more bytes than the container holds.
        writer = writer.raw(&[0x1A, 0xFF, 0x7F]);
        for i in 100..150 {
            writer = writer.bytes(1, &node(2000 + i, None));
        }
        let data = FieldWriter::new().bytes(1, &writer.finish()).finish();

        let bulk = decode_bulk_metadata(&data);
        assert_eq!(bulk.nodes.len(), 150);
        assert_eq!(bulk.nodes[149].path(), 2149);
    }

    #[test]
    fn test_next_node_tag() {
        let buf = [0x10, 0x01, 0x0A, 0x00, 0x0A];
        assert_eq!(next_node_tag(&buf, 0), Some(2));
        assert_eq!(next_node_tag(&buf, 3), Some(4));
        assert_eq!(next_node_tag(&buf, 5), None);
        assert_eq!(next_node_tag(&buf, 9), None);
    }

    #[test]
    fn test_garbage_input() {
        let bulk = decode_bulk_metadata(&[0xFF, 0xFF, 0xFF]);
        assert!(bulk.is_empty());
    }
}
