//! Table-driven message decoding.
//!
//! Each message kind declares a small table of the fields it understands. The
//! single [`decode_message`] loop consults that table for every field it scans,
//! so the bulk, node and node-data parsers share one implementation of the
//! skip/truncate/mismatch rules.

use std::fmt::Debug;

use tracing::trace;

use super::error::WireError;
use super::scanner::{FieldScanner, FieldValue};
use super::WireType;

/// Declares one recognised field: its number, expected wire type, and the
/// semantic key it is reported under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec<K> {
    pub number: u64,
    pub wire_type: WireType,
    pub key: K,
}

impl<K> FieldSpec<K> {
    pub const fn new(number: u64, wire_type: WireType, key: K) -> Self {
        Self {
            number,
            wire_type,
            key,
        }
    }
}

/// Fields collected from one message, in wire order.
#[derive(Debug, Clone)]
pub struct DecodedMessage<'a, K> {
    fields: Vec<(K, FieldValue<'a>)>,
    mismatched: usize,
    error: Option<WireError>,
    failed_at: Option<usize>,
}

impl<'a, K: Copy + PartialEq> DecodedMessage<'a, K> {
    /// Last varint reported under `key`.
    pub fn varint(&self, key: K) -> Option<u64> {
        self.values(key).filter_map(|v| v.as_varint()).last()
    }

    /// Last fixed32 reported under `key`.
    pub fn fixed32(&self, key: K) -> Option<u32> {
        self.values(key).filter_map(|v| v.as_fixed32()).last()
    }

    /// First length-delimited payload reported under `key`.
    pub fn bytes(&self, key: K) -> Option<&'a [u8]> {
        self.all_bytes(key).next()
    }

    /// Every length-delimited payload reported under `key`, in wire order.
    pub fn all_bytes(&self, key: K) -> impl Iterator<Item = &'a [u8]> + '_ {
        self.values(key).filter_map(|v| v.as_bytes())
    }

    /// Returns true if at least one field was reported under `key`.
    pub fn has(&self, key: K) -> bool {
        self.values(key).next().is_some()
    }

    fn values(&self, key: K) -> impl Iterator<Item = FieldValue<'a>> + '_ {
        self.fields
            .iter()
            .filter(move |(k, _)| *k == key)
            .map(|(_, v)| *v)
    }

    /// Number of recognised fields that were skipped for carrying the wrong
    /// wire type.
    pub fn mismatched(&self) -> usize {
        self.mismatched
    }

    /// The error that ended the scan early, if any.
    pub fn error(&self) -> Option<&WireError> {
        self.error.as_ref()
    }

    /// Offset of the field that ended the scan early.
    pub fn failed_at(&self) -> Option<usize> {
        self.failed_at
    }

    /// True if the whole buffer was scanned without error.
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Decodes `buf` against `table`.
///
/// - Fields not in the table are skipped by wire type.
/// - A table field with an unexpected wire type is skipped and counted in
///   [`DecodedMessage::mismatched`].
/// - A truncated or unskippable field ends the scan; fields collected before
///   it are kept and the error is available via [`DecodedMessage::error`].
pub fn decode_message<'a, K>(buf: &'a [u8], table: &[FieldSpec<K>]) -> DecodedMessage<'a, K>
where
    K: Copy + PartialEq + Debug,
{
    let mut message = DecodedMessage {
        fields: Vec::new(),
        mismatched: 0,
        error: None,
        failed_at: None,
    };

    let mut scanner = FieldScanner::new(buf);
    loop {
        let position = scanner.position();
        let field = match scanner.next() {
            None => break,
            Some(Ok(field)) => field,
            Some(Err(e)) => {
                trace!(error = %e, position, "message scan ended early");
                message.error = Some(e);
                message.failed_at = Some(position);
                break;
            }
        };

        let Some(spec) = table.iter().find(|s| s.number == field.tag.field_number) else {
            continue;
        };

        if spec.wire_type != field.tag.wire_type {
            trace!(
                field = field.tag.field_number,
                key = ?spec.key,
                expected = ?spec.wire_type,
                actual = ?field.tag.wire_type,
                "skipping field with unexpected wire type"
            );
            message.mismatched += 1;
            continue;
        }

        message.fields.push((spec.key, field.value));
    }

    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::FieldWriter;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Key {
        Name,
        Count,
        Child,
    }

    const TABLE: &[FieldSpec<Key>] = &[
        FieldSpec::new(1, WireType::LengthDelimited, Key::Name),
        FieldSpec::new(2, WireType::Varint, Key::Count),
        FieldSpec::new(3, WireType::LengthDelimited, Key::Child),
    ];

    #[test]
    fn test_collects_table_fields() {
        let buf = FieldWriter::new()
            .bytes(1, b"node")
            .varint(2, 12)
            .finish();
        let msg = decode_message(&buf, TABLE);

        assert!(msg.is_complete());
        assert_eq!(msg.bytes(Key::Name), Some(&b"node"[..]));
        assert_eq!(msg.varint(Key::Count), Some(12));
        assert!(!msg.has(Key::Child));
    }

    #[test]
    fn test_unknown_fields_are_skipped_in_any_order() {
        let buf = FieldWriter::new()
            .fixed64(9, 1)
            .varint(2, 3)
            .bytes(15, &[0xFF; 40])
            .fixed32(11, 7)
            .bytes(1, b"x")
            .finish();
        let msg = decode_message(&buf, TABLE);

        assert!(msg.is_complete());
        assert_eq!(msg.varint(Key::Count), Some(3));
        assert_eq!(msg.bytes(Key::Name), Some(&b"x"[..]));
    }

    #[test]
    fn test_wire_type_mismatch_is_skipped() {
        let buf = FieldWriter::new()
            .bytes(2, b"not a varint")
            .varint(2, 5)
            .finish();
        let msg = decode_message(&buf, TABLE);

        assert_eq!(msg.mismatched(), 1);
        assert_eq!(msg.varint(Key::Count), Some(5));
    }

    #[test]
    fn test_repeated_scalar_last_wins() {
        let buf = FieldWriter::new().varint(2, 1).varint(2, 2).finish();
        assert_eq!(decode_message(&buf, TABLE).varint(Key::Count), Some(2));
    }

    #[test]
    fn test_repeated_bytes_in_order() {
        let buf = FieldWriter::new()
            .bytes(3, b"a")
            .bytes(3, b"b")
            .finish();
        let msg = decode_message(&buf, TABLE);
        let children: Vec<_> = msg.all_bytes(Key::Child).collect();
        assert_eq!(children, vec![&b"a"[..], &b"b"[..]]);
    }

    #[test]
    fn test_truncation_keeps_earlier_fields() {
        let mut buf = FieldWriter::new().varint(2, 8).finish();
        buf.extend_from_slice(&[0x0A, 0x20, b'a']);
        let msg = decode_message(&buf, TABLE);

        assert!(!msg.is_complete());
        assert!(msg.error().unwrap().is_truncation());
        assert_eq!(msg.failed_at(), Some(2));
        assert_eq!(msg.varint(Key::Count), Some(8));
        assert!(!msg.has(Key::Name));
    }

    #[test]
    fn test_empty_buffer() {
        let msg = decode_message::<Key>(&[], TABLE);
        assert!(msg.is_complete());
        assert!(msg.is_empty());
    }
}
