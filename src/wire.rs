//! Wire-level primitives: field keys, wire types, and length prefixes.
//!
//! Follows the Protocol Buffers binary encoding as published at
//! <https://protobuf.dev/programming-guides/encoding> under "Message
//! Structure". The deprecated group wire codes (3 and 4) are not
//! representable here: they are rejected when a key is decoded and can never
//! be produced on encode.

use crate::error::DecodeErrorKind;
use crate::leb128::LebCodec;
use crate::util::{likely, unlikely, CastFrom};

/// Minimum legal field number.
pub const MINIMUM_FIELD_NUMBER: u32 = 1;
/// Maximum legal field number (29 bits).
pub const MAXIMUM_FIELD_NUMBER: u32 = (1 << 29) - 1;

/// Payload encoding selector carried in the low three bits of a field key.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum WireType {
    /// Variable length integer.
    ///
    /// Used for: `int32`, `int64`, `uint32`, `uint64`, `sint32`, `sint64`,
    /// `bool`, `enum`.
    Varint = 0,
    /// 64-bit little-endian payload.
    ///
    /// Used for: `fixed64`, `sfixed64`, `double`.
    Fixed64 = 1,
    /// Length-prefixed payload.
    ///
    /// Used for: `string`, `bytes`, nested messages, map entries, packed
    /// `repeated` fields.
    LengthDelimited = 2,
    /// 32-bit little-endian payload.
    ///
    /// Used for: `fixed32`, `sfixed32`, `float`.
    Fixed32 = 5,
}

impl WireType {
    /// Try to decode a [`WireType`] from the low three bits of a key.
    #[inline(always)]
    pub fn try_from_val(value: u8) -> Result<Self, DecodeErrorKind> {
        match value {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::Fixed64),
            2 => Ok(WireType::LengthDelimited),
            5 => Ok(WireType::Fixed32),
            // 3 (SGROUP) and 4 (EGROUP) land here alongside 6 and 7.
            other => Err(DecodeErrorKind::InvalidWireType { value: other }),
        }
    }

    /// Return the raw 3-bit code for this [`WireType`].
    #[inline(always)]
    #[allow(clippy::as_conversions)]
    pub const fn into_val(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for WireType {
    type Error = DecodeErrorKind;

    #[inline(always)]
    fn try_from(value: u8) -> Result<Self, DecodeErrorKind> {
        WireType::try_from_val(value)
    }
}

/// Encodes `field_number` and `wire_type` as a protobuf field key.
///
/// Hot path for encoding, called once per field record. The caller is
/// responsible for `field_number` being in range; out-of-range numbers are
/// rejected before any bytes are emitted.
#[inline(always)]
pub fn encode_key<B: bytes::BufMut>(wire_type: WireType, field_number: u32, buf: &mut B) {
    let key = (field_number << 3) | u32::from(wire_type.into_val());
    key.encode_leb128(buf);
}

/// The encoded length of a field key for `field_number`.
///
/// The wire type lives in the low three bits and never changes the length.
#[inline(always)]
pub fn encoded_key_len(field_number: u32) -> usize {
    (field_number << 3).encoded_leb128_len()
}

/// Decodes a field key, returning its field number and wire type.
///
/// Hot path for decoding, called once per field record. Fails on wire codes
/// 3, 4, 6, 7 and on field numbers outside `[1, 2^29 - 1]`.
#[inline]
#[allow(clippy::as_conversions)] // Masked 3-bit and 29-bit narrowings.
pub fn decode_key<B: bytes::Buf>(buf: &mut B) -> Result<(u32, WireType), DecodeErrorKind> {
    // Keys fit in u32: the max is `(2^29 - 1) << 3 | 7` which is u32::MAX.
    // Overlong encodings are still legal on the wire though, so decode
    // through u64 and range-check rather than rejecting a wasteful encoder.
    let (key, _) = u64::decode_leb128_buf(buf)?;

    let wire_type = WireType::try_from_val((key & 0b111) as u8)?;
    let field_number = key >> 3;
    if unlikely(field_number < u64::from(MINIMUM_FIELD_NUMBER))
        || unlikely(field_number > u64::from(MAXIMUM_FIELD_NUMBER))
    {
        return Err(DecodeErrorKind::InvalidFieldNumber {
            value: field_number,
        });
    }

    Ok((field_number as u32, wire_type))
}

/// Decodes the length prefix of a length-delimited payload, enforcing the
/// caller's ceiling.
#[inline(always)]
pub fn decode_len<B: bytes::Buf>(buf: &mut B, max_len: usize) -> Result<usize, DecodeErrorKind> {
    let chunk = buf.chunk();
    // Fast path: most lengths fit in one byte (< 128).
    let len = if likely(!chunk.is_empty() && chunk[0] < 0x80) {
        let len = u64::cast_from(chunk[0]);
        buf.advance(1);
        len
    } else {
        u64::decode_leb128_buf(buf)?.0
    };

    match usize::try_from(len) {
        Ok(len) if len <= max_len => Ok(len),
        _ => Err(DecodeErrorKind::LengthExceeded {
            length: len,
            limit: max_len,
        }),
    }
}
