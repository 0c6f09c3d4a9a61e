//! Base-128 varint decoding.

use super::error::{WireError, WireResult};

/// Longest encoding of a 64-bit varint.
pub const MAX_VARINT_LEN: usize = 10;

/// Decodes a varint starting at `pos`.
///
/// Returns the value and the position of the first byte after it. A
/// continuation chain that runs past the end of `buf` yields
/// [`WireError::TruncatedMessage`]; a chain that would overflow 64 bits yields
/// [`WireError::MalformedField`]. Never reads outside `buf`.
pub fn decode_varint(buf: &[u8], pos: usize) -> WireResult<(u64, usize)> {
    let mut value: u64 = 0;
    let mut cursor = pos;

    for index in 0..MAX_VARINT_LEN {
        let byte = *buf.get(cursor).ok_or(WireError::truncated(cursor))?;
        cursor += 1;

        let payload = u64::from(byte & 0x7F);
        // The tenth byte may only contribute the 64th bit.
        if index == MAX_VARINT_LEN - 1 && payload > 1 {
            return Err(WireError::malformed(pos, "varint exceeds 64 bits"));
        }
        value |= payload << (7 * index);

        if byte & 0x80 == 0 {
            return Ok((value, cursor));
        }
    }

    Err(WireError::malformed(pos, "varint longer than 10 bytes"))
}
