//! LEB128 variable-length integer encoding/decoding.

// This module uses `as` casts which have been reviewed for correctness.
#![allow(clippy::as_conversions)]

use crate::error::DecodeErrorKind;

/// Integers that can round-trip through the LEB128 wire encoding.
///
/// Implemented for `u64` (the general varint carrier: every varint payload on
/// the wire is at most 10 bytes / 64 bits) and `u32` (field keys and
/// ZigZag-mapped `sint32` values, at most 5 bytes).
pub trait LebCodec: Sized + Copy {
    /// Maximum number of bytes a LEB128 encoding of `Self` may occupy.
    const MAX_LEB_BYTES: usize;

    /// Decode a LEB128 integer from the front of `data`.
    ///
    /// Returns the decoded value and the number of bytes consumed. Fails with
    /// [`DecodeErrorKind::Truncated`] if `data` ends before a terminating byte
    /// (high bit clear) is seen, and [`DecodeErrorKind::VarintTooLong`] if no
    /// terminator appears within [`LebCodec::MAX_LEB_BYTES`] bytes or the
    /// final byte carries bits beyond the width of `Self`.
    fn decode_leb128(data: &[u8]) -> Result<(Self, usize), DecodeErrorKind>;

    /// Decode a LEB128 integer from a [`bytes::Buf`], advancing it past the
    /// consumed bytes.
    fn decode_leb128_buf<B: bytes::Buf>(buf: &mut B) -> Result<(Self, usize), DecodeErrorKind> {
        let chunk = buf.chunk();

        // Fast path: the current chunk is long enough that `decode_leb128`
        // can never report a spurious truncation.
        if chunk.len() >= Self::MAX_LEB_BYTES {
            let (value, bytes_read) = Self::decode_leb128(chunk)?;
            buf.advance(bytes_read);
            return Ok((value, bytes_read));
        }

        // Slow path: the varint may straddle chunk boundaries, pull bytes one
        // at a time into a stack buffer.
        let mut scratch = [0u8; 10];
        for i in 0..Self::MAX_LEB_BYTES {
            if !buf.has_remaining() {
                return Err(DecodeErrorKind::Truncated);
            }
            scratch[i] = buf.get_u8();
            if scratch[i] < 0x80 {
                return Self::decode_leb128(&scratch[..=i]);
            }
        }
        Err(DecodeErrorKind::VarintTooLong)
    }

    /// Encode `self` as LEB128 into the provided buffer, returning the number
    /// of bytes written.
    fn encode_leb128<B: bytes::BufMut>(self, buf: &mut B) -> usize;

    /// The number of bytes `encode_leb128` will write for this value.
    fn encoded_leb128_len(self) -> usize;
}

impl LebCodec for u64 {
    const MAX_LEB_BYTES: usize = 10;

    #[inline]
    fn decode_leb128(data: &[u8]) -> Result<(Self, usize), DecodeErrorKind> {
        let mut value: u64 = 0;
        for (i, &byte) in data.iter().take(Self::MAX_LEB_BYTES).enumerate() {
            if byte < 0x80 {
                // The 10th byte contributes bits 63.. so only its low bit may
                // be set without overflowing 64 bits.
                if i == Self::MAX_LEB_BYTES - 1 && byte > 0x01 {
                    return Err(DecodeErrorKind::VarintTooLong);
                }
                value |= (byte as u64) << (7 * i);
                return Ok((value, i + 1));
            }
            value |= ((byte & 0x7f) as u64) << (7 * i);
        }
        if data.len() < Self::MAX_LEB_BYTES {
            Err(DecodeErrorKind::Truncated)
        } else {
            Err(DecodeErrorKind::VarintTooLong)
        }
    }

    #[inline]
    fn encode_leb128<B: bytes::BufMut>(self, buf: &mut B) -> usize {
        let mut value = self;
        let mut written = 0;
        loop {
            written += 1;
            if value < 0x80 {
                buf.put_u8(value as u8);
                return written;
            }
            buf.put_u8((value as u8 & 0x7f) | 0x80);
            value >>= 7;
        }
    }

    /// LEB128 encodes 7 bits per byte, so the byte count is
    /// `ceil(significant_bits / 7)` with a minimum of 1 for the value 0.
    #[inline]
    fn encoded_leb128_len(self) -> usize {
        let bits = 64 - (self | 1).leading_zeros() as usize;
        bits.div_ceil(7)
    }
}

impl LebCodec for u32 {
    const MAX_LEB_BYTES: usize = 5;

    #[inline]
    fn decode_leb128(data: &[u8]) -> Result<(Self, usize), DecodeErrorKind> {
        let mut value: u32 = 0;
        for (i, &byte) in data.iter().take(Self::MAX_LEB_BYTES).enumerate() {
            if byte < 0x80 {
                // The 5th byte contributes bits 28.. so anything above its
                // low nibble overflows 32 bits.
                if i == Self::MAX_LEB_BYTES - 1 && byte > 0x0f {
                    return Err(DecodeErrorKind::VarintOutOfRange { target: "u32" });
                }
                value |= (byte as u32) << (7 * i);
                return Ok((value, i + 1));
            }
            value |= ((byte & 0x7f) as u32) << (7 * i);
        }
        if data.len() < Self::MAX_LEB_BYTES {
            Err(DecodeErrorKind::Truncated)
        } else {
            Err(DecodeErrorKind::VarintOutOfRange { target: "u32" })
        }
    }

    #[inline]
    fn encode_leb128<B: bytes::BufMut>(self, buf: &mut B) -> usize {
        let mut value = self;
        let mut written = 0;
        loop {
            written += 1;
            if value < 0x80 {
                buf.put_u8(value as u8);
                return written;
            }
            buf.put_u8((value as u8 & 0x7f) | 0x80);
            value >>= 7;
        }
    }

    #[inline]
    fn encoded_leb128_len(self) -> usize {
        let bits = 32 - (self | 1).leading_zeros() as usize;
        bits.div_ceil(7)
    }
}
