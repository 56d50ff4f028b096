//! Schemaless decoding of a wire stream into [`RawField`] records.
//!
//! This is the first half of the decode pipeline and is useful on its own for
//! inspecting a message without a schema: every record keeps its payload as
//! uninterpreted bytes, and [`encode_raw_fields`] can forward such a sequence
//! back out verbatim.

use alloc::vec::Vec;

use bytes::{Buf, BufMut, Bytes};

use crate::error::{DecodeError, DecodeErrorKind, EncodeError, EncodeErrorKind};
use crate::leb128::LebCodec;
use crate::util::CastFrom;
use crate::value::RawField;
use crate::wire::{
    self, WireType, MAXIMUM_FIELD_NUMBER, MINIMUM_FIELD_NUMBER,
};

/// Reads one varint payload, preserving its raw bytes.
///
/// The bytes (not the decoded value) become the record payload so that the
/// typed decoder can re-interpret them under whichever varint flavor the
/// schema declares.
fn read_raw_varint<B: Buf>(buf: &mut B) -> Result<Bytes, DecodeErrorKind> {
    let mut scratch = [0u8; 10];
    for i in 0..scratch.len() {
        if !buf.has_remaining() {
            return Err(DecodeErrorKind::Truncated);
        }
        let byte = buf.get_u8();
        scratch[i] = byte;
        if byte < 0x80 {
            // Final byte of a 10-byte varint may only carry the low bit.
            if i == scratch.len() - 1 && byte > 0x01 {
                return Err(DecodeErrorKind::VarintTooLong);
            }
            return Ok(Bytes::copy_from_slice(&scratch[..=i]));
        }
    }
    Err(DecodeErrorKind::VarintTooLong)
}

/// Reads exactly `n` payload bytes for the fixed wire types.
fn read_exact<B: Buf>(buf: &mut B, n: usize) -> Result<Bytes, DecodeErrorKind> {
    if buf.remaining() < n {
        return Err(DecodeErrorKind::Truncated);
    }
    Ok(buf.copy_to_bytes(n))
}

/// Parses a wire stream into raw field records, in stream order.
///
/// Stops successfully at clean end of input. A partial tag, partial payload,
/// or disallowed wire code fails; nothing is returned for a stream that does
/// not parse in full.
pub(crate) fn decode_raw_fields<B: Buf>(
    mut buf: B,
    max_len: usize,
) -> Result<Vec<RawField>, DecodeError> {
    let mut fields = Vec::new();
    while buf.has_remaining() {
        let (field_number, wire_type) = wire::decode_key(&mut buf)?;
        let payload = match wire_type {
            WireType::Varint => read_raw_varint(&mut buf)?,
            WireType::Fixed64 => read_exact(&mut buf, 8)?,
            WireType::Fixed32 => read_exact(&mut buf, 4)?,
            WireType::LengthDelimited => {
                let len = wire::decode_len(&mut buf, max_len)?;
                read_exact(&mut buf, len)?
            }
        };
        fields.push(RawField {
            field_number,
            wire_type,
            payload,
        });
    }
    Ok(fields)
}

/// Re-emits raw field records exactly as they came off the wire, returning
/// the number of bytes written.
///
/// Field numbers are validated; payloads are trusted to match their wire
/// type's framing (which holds for every record produced by
/// [`from_raw_bytes`](crate::from_raw_bytes)).
pub(crate) fn encode_raw_fields<B: BufMut>(
    sink: &mut B,
    fields: &[RawField],
) -> Result<usize, EncodeError> {
    let mut written = 0;
    for field in fields {
        if field.field_number < MINIMUM_FIELD_NUMBER || field.field_number > MAXIMUM_FIELD_NUMBER {
            return Err(EncodeErrorKind::InvalidFieldNumber {
                value: field.field_number,
            }
            .into());
        }
        wire::encode_key(field.wire_type, field.field_number, sink);
        written += wire::encoded_key_len(field.field_number);
        if field.wire_type == WireType::LengthDelimited {
            let len = u64::cast_from(field.payload.len());
            written += len.encode_leb128(sink);
        }
        sink.put_slice(&field.payload);
        written += field.payload.len();
    }
    Ok(written)
}
