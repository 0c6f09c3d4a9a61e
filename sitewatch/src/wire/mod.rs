//! Schema-less wire decoding.
//!
//! The tile service speaks a minimal subset of the protobuf wire format:
//! base-128 varints, one-byte-or-more keys packing `(field_number, wire_type)`,
//! and length-delimited payloads. There is no compiled schema, so decoding is a
//! flat forward scan over `(tag, value)` pairs, and each message kind declares
//! the handful of fields it cares about in a [`FieldSpec`] table.
//!
//! # Example
//!
//! ```
//! use sitewatch::wire::{decode_message, FieldSpec, FieldWriter, WireType};
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! enum Key {
//!     Epoch,
//! }
//!
//! const TABLE: &[FieldSpec<Key>] = &[FieldSpec::new(2, WireType::Varint, Key::Epoch)];
//!
//! let bytes = FieldWriter::new().varint(2, 990).finish();
//! let message = decode_message(&bytes, TABLE);
//! assert_eq!(message.varint(Key::Epoch), Some(990));
//! ```

mod encode;
mod error;
mod scanner;
mod table;
mod varint;

pub use encode::{encode_varint, FieldWriter};
pub use error::{WireError, WireResult};
pub use scanner::{decode_length_delimited, Field, FieldScanner, FieldValue};
pub use table::{decode_message, DecodedMessage, FieldSpec};
pub use varint::{decode_varint, MAX_VARINT_LEN};

/// Wire type carried in the low three bits of every field key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireType {
    /// Base-128 varint (0).
    Varint,
    /// Little-endian 8-byte value (1).
    Fixed64,
    /// Varint length followed by that many bytes (2).
    LengthDelimited,
    /// Deprecated group start (3). Cannot be skipped.
    StartGroup,
    /// Deprecated group end (4). Cannot be skipped.
    EndGroup,
    /// Little-endian 4-byte value (5).
    Fixed32,
    /// Values 6 and 7 are not assigned.
    Reserved(u8),
}

impl WireType {
    /// Maps the low three bits of a key to a wire type.
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x7 {
            0 => WireType::Varint,
            1 => WireType::Fixed64,
            2 => WireType::LengthDelimited,
            3 => WireType::StartGroup,
            4 => WireType::EndGroup,
            5 => WireType::Fixed32,
            other => WireType::Reserved(other),
        }
    }

    /// Returns the three-bit wire representation.
    pub fn bits(self) -> u8 {
        match self {
            WireType::Varint => 0,
            WireType::Fixed64 => 1,
            WireType::LengthDelimited => 2,
            WireType::StartGroup => 3,
            WireType::EndGroup => 4,
            WireType::Fixed32 => 5,
            WireType::Reserved(bits) => bits & 0x7,
        }
    }
}

/// A decoded field key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tag {
    pub field_number: u64,
    pub wire_type: WireType,
}

impl Tag {
    /// Splits a full (possibly multi-byte) key into field number and wire type.
    pub fn from_key(key: u64) -> Self {
        Self {
            field_number: key >> 3,
            wire_type: WireType::from_bits((key & 0x7) as u8),
        }
    }

    /// Recombines the tag into its key value.
    pub fn key(&self) -> u64 {
        (self.field_number << 3) | u64::from(self.wire_type.bits())
    }
}

/// Decodes a single-byte key: `field_number = byte >> 3`, `wire_type = byte & 0x7`.
///
/// Sufficient for field numbers below 16, which covers every field the tile
/// service uses. [`FieldScanner`] decodes keys as varints and handles the
/// general case.
pub fn decode_tag(byte: u8) -> Tag {
    Tag::from_key(u64::from(byte))
}
