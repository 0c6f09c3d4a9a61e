//! Minimal encoder for the same wire subset.
//!
//! Only used to build fixtures and test payloads; the tile service is never
//! sent wire-format bodies.

use super::{Tag, WireType};

/// Encodes `value` as a base-128 varint.
pub fn encode_varint(value: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(super::MAX_VARINT_LEN);
    put_varint(&mut out, value);
    out
}

fn put_varint(out: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        out.push((value as u8 & 0x7F) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

/// Builder for wire-format messages.
///
/// ```
/// use sitewatch::wire::FieldWriter;
///
/// let node = FieldWriter::new().varint(1, 42).varint(2, 990).finish();
/// let bulk = FieldWriter::new().bytes(1, &node).finish();
/// assert_eq!(bulk[0], 0x0A);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FieldWriter {
    buf: Vec<u8>,
}

impl FieldWriter {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(&mut self, field_number: u64, wire_type: WireType) {
        let tag = Tag {
            field_number,
            wire_type,
        };
        put_varint(&mut self.buf, tag.key());
    }

    /// Appends a varint field.
    pub fn varint(mut self, field_number: u64, value: u64) -> Self {
        self.key(field_number, WireType::Varint);
        put_varint(&mut self.buf, value);
        self
    }

    /// Appends a length-delimited field.
    pub fn bytes(mut self, field_number: u64, payload: &[u8]) -> Self {
        self.key(field_number, WireType::LengthDelimited);
        put_varint(&mut self.buf, payload.len() as u64);
        self.buf.extend_from_slice(payload);
        self
    }

    /// Appends a fixed32 field.
    pub fn fixed32(mut self, field_number: u64, value: u32) -> Self {
        self.key(field_number, WireType::Fixed32);
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    /// Appends a fixed64 field.
    pub fn fixed64(mut self, field_number: u64, value: u64) -> Self {
        self.key(field_number, WireType::Fixed64);
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    /// Appends raw bytes without any framing.
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}
