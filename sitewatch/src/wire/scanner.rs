//! Forward scanning over `(tag, value)` pairs.

use super::error::{WireError, WireResult};
use super::varint::decode_varint;
use super::{Tag, WireType};

/// Decodes a varint length followed by that many bytes.
///
/// Returns the payload slice and the position just past it. A declared length
/// larger than what remains in `buf` yields [`WireError::TruncatedMessage`].
pub fn decode_length_delimited(buf: &[u8], pos: usize) -> WireResult<(&[u8], usize)> {
    let (len, start) = decode_varint(buf, pos)?;
    let end = usize::try_from(len)
        .ok()
        .and_then(|len| start.checked_add(len))
        .filter(|&end| end <= buf.len())
        .ok_or(WireError::truncated(buf.len()))?;
    Ok((&buf[start..end], end))
}

/// Value of a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Varint(u64),
    Fixed64(u64),
    Bytes(&'a [u8]),
    Fixed32(u32),
}

impl<'a> FieldValue<'a> {
    pub fn wire_type(&self) -> WireType {
        match self {
            FieldValue::Varint(_) => WireType::Varint,
            FieldValue::Fixed64(_) => WireType::Fixed64,
            FieldValue::Bytes(_) => WireType::LengthDelimited,
            FieldValue::Fixed32(_) => WireType::Fixed32,
        }
    }

    pub fn as_varint(&self) -> Option<u64> {
        match self {
            FieldValue::Varint(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&'a [u8]> {
        match self {
            FieldValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_fixed32(&self) -> Option<u32> {
        match self {
            FieldValue::Fixed32(v) => Some(*v),
            _ => None,
        }
    }
}

/// One decoded field and the byte offset of its key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field<'a> {
    pub tag: Tag,
    pub value: FieldValue<'a>,
    pub offset: usize,
}

/// Iterator over the top-level fields of one message.
///
/// Yields `Err` at most once: the first truncated or unskippable field ends
/// the scan, and everything yielded before it remains valid.
#[derive(Debug, Clone)]
pub struct FieldScanner<'a> {
    buf: &'a [u8],
    pos: usize,
    finished: bool,
}

impl<'a> FieldScanner<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            finished: false,
        }
    }

    /// Byte offset of the next field.
    pub fn position(&self) -> usize {
        self.pos
    }

    fn read_fixed<const N: usize>(&self, pos: usize) -> WireResult<([u8; N], usize)> {
        let end = pos + N;
        let slice = self
            .buf
            .get(pos..end)
            .ok_or(WireError::truncated(self.buf.len()))?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok((out, end))
    }

    fn read_field(&self) -> WireResult<(Field<'a>, usize)> {
        let offset = self.pos;
        let (key, value_pos) = decode_varint(self.buf, offset)?;
        let tag = Tag::from_key(key);

        if tag.field_number == 0 {
            return Err(WireError::malformed(offset, "field number 0"));
        }

        let (value, next) = match tag.wire_type {
            WireType::Varint => {
                let (v, next) = decode_varint(self.buf, value_pos)?;
                (FieldValue::Varint(v), next)
            }
            WireType::Fixed64 => {
                let (bytes, next) = self.read_fixed::<8>(value_pos)?;
                (FieldValue::Fixed64(u64::from_le_bytes(bytes)), next)
            }
            WireType::LengthDelimited => {
                let (payload, next) = decode_length_delimited(self.buf, value_pos)?;
                (FieldValue::Bytes(payload), next)
            }
            WireType::Fixed32 => {
                let (bytes, next) = self.read_fixed::<4>(value_pos)?;
                (FieldValue::Fixed32(u32::from_le_bytes(bytes)), next)
            }
            other => {
                return Err(WireError::malformed(
                    offset,
                    format!(
                        "field {} has unskippable wire type {}",
                        tag.field_number,
                        other.bits()
                    ),
                ));
            }
        };

        Ok((Field { tag, value, offset }, next))
    }
}

impl<'a> Iterator for FieldScanner<'a> {
    type Item = WireResult<Field<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished || self.pos >= self.buf.len() {
            return None;
        }

        match self.read_field() {
            Ok((field, next)) => {
                self.pos = next;
                Some(Ok(field))
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::FieldWriter;

    #[test]
    fn test_length_delimited_exact() {
        let buf = [0x03, 0xAA, 0xBB, 0xCC, 0x7F];
        let (payload, next) = decode_length_delimited(&buf, 0).unwrap();
        assert_eq!(payload, &[0xAA, 0xBB, 0xCC]);
        assert_eq!(next, 4);
    }

    #[test]
    fn test_length_delimited_empty_payload() {
        let (payload, next) = decode_length_delimited(&[0x00], 0).unwrap();
        assert!(payload.is_empty());
        assert_eq!(next, 1);
    }

    #[test]
    fn test_length_delimited_every_truncation_offset() {
        // Two-byte length prefix (200) followed by 200 payload bytes.
        let mut buf = vec![0xC8, 0x01];
        buf.extend(std::iter::repeat(0x5A).take(200));
        assert!(decode_length_delimited(&buf, 0).is_ok());

        for cut in 0..buf.len() {
            let result = decode_length_delimited(&buf[..cut], 0);
            assert!(
                matches!(result, Err(WireError::TruncatedMessage { .. })),
                "cut at {} should be truncated, got {:?}",
                cut,
                result
            );
        }
    }

    #[test]
    fn test_length_delimited_huge_declared_length() {
        let mut buf = crate::wire::encode_varint(u64::MAX);
        buf.push(0x00);
        assert!(decode_length_delimited(&buf, 0)
            .unwrap_err()
            .is_truncation());
    }

    #[test]
    fn test_scanner_yields_fields_in_order() {
        let buf = FieldWriter::new()
            .varint(1, 7)
            .bytes(2, b"abc")
            .fixed32(3, 0x3F80_0000)
            .fixed64(4, 9)
            .finish();

        let fields: Vec<_> = FieldScanner::new(&buf).collect::<Result<_, _>>().unwrap();
        assert_eq!(fields.len(), 4);
        assert_eq!(fields[0].value, FieldValue::Varint(7));
        assert_eq!(fields[1].value, FieldValue::Bytes(b"abc"));
        assert_eq!(fields[2].value.as_fixed32(), Some(0x3F80_0000));
        assert_eq!(fields[3].value, FieldValue::Fixed64(9));
        assert_eq!(fields[1].tag.field_number, 2);
        assert_eq!(fields[0].offset, 0);
    }

    #[test]
    fn test_scanner_stops_after_truncation() {
        let mut buf = FieldWriter::new().varint(1, 7).finish();
        // Field 2, length 10, only 2 bytes present.
        buf.extend_from_slice(&[0x12, 0x0A, 0x01, 0x02]);

        let mut scanner = FieldScanner::new(&buf);
        assert!(scanner.next().unwrap().is_ok());
        assert!(scanner.next().unwrap().unwrap_err().is_truncation());
        assert!(scanner.next().is_none());
    }

    #[test]
    fn test_scanner_rejects_group_wire_type() {
        // Field 1, wire type 3.
        let buf = [0x0B, 0x00];
        let mut scanner = FieldScanner::new(&buf);
        assert!(matches!(
            scanner.next(),
            Some(Err(WireError::MalformedField { .. }))
        ));
        assert!(scanner.next().is_none());
    }

    #[test]
    fn test_scanner_rejects_field_zero() {
        let buf = [0x00, 0x01];
        assert!(matches!(
            FieldScanner::new(&buf).next(),
            Some(Err(WireError::MalformedField { .. }))
        ));
    }

    #[test]
    fn test_scanner_truncated_fixed32() {
        let buf = [0x15, 0x01, 0x02];
        assert!(FieldScanner::new(&buf)
            .next()
            .unwrap()
            .unwrap_err()
            .is_truncation());
    }
}
