//! Serialization of typed fields into the wire format.
//!
//! Encoding runs in two phases, both recursive over the value tree. A
//! validation pass checks field numbers, repeated homogeneity, map key
//! legality, and nesting depth up front; emission then measures nested
//! payloads with `encoded_*_len` and writes length prefixes directly, so no
//! staging buffers and no seekable sink are needed.
//!
//! Repeated fields pick their wire form per the packing policy: empty emits a
//! single zero-length record, one element emits as that element standalone,
//! two or more self-contained elements pack into one length-delimited record,
//! and composite elements emit one tagged record each.

use bytes::BufMut;

use crate::error::{EncodeError, EncodeErrorKind};
use crate::leb128::LebCodec;
use crate::util::CastFrom;
use crate::value::{is_homogeneous, Field, Value};
use crate::wire::{self, WireType, MAXIMUM_FIELD_NUMBER, MINIMUM_FIELD_NUMBER};
use crate::zigzag::{zigzag_encode_32, zigzag_encode_64};
use crate::EncodeOptions;

/// Validates and serializes fields into `sink`, returning bytes written.
pub(crate) fn encode_fields<B: BufMut>(
    sink: &mut B,
    fields: &[Field],
    opts: &EncodeOptions,
) -> Result<usize, EncodeError> {
    for field in fields {
        validate_field(field, 0, opts)?;
    }
    let mut written = 0;
    for field in fields {
        written += emit_field(sink, field.field_number, &field.value);
    }
    Ok(written)
}

/// Total encoded size of `fields`, assuming they validate.
///
/// Backs [`encoded_len`](crate::encoded_len) and the nested length
/// prefixes of `emit_field`.
pub(crate) fn encoded_fields_len(fields: &[Field]) -> usize {
    fields
        .iter()
        .map(|field| encoded_field_len(field.field_number, &field.value))
        .sum()
}

fn validate_field(field: &Field, depth: usize, opts: &EncodeOptions) -> Result<(), EncodeError> {
    if field.field_number < MINIMUM_FIELD_NUMBER || field.field_number > MAXIMUM_FIELD_NUMBER {
        return Err(EncodeErrorKind::InvalidFieldNumber {
            value: field.field_number,
        }
        .into());
    }
    validate_value(field.field_number, &field.value, depth, opts)
}

fn validate_value(
    field_number: u32,
    value: &Value,
    depth: usize,
    opts: &EncodeOptions,
) -> Result<(), EncodeError> {
    match value {
        Value::Message(fields) => {
            let next = depth + 1;
            if next > opts.max_depth {
                return Err(EncodeErrorKind::DepthExceeded {
                    limit: opts.max_depth,
                }
                .into());
            }
            for nested in fields {
                validate_field(nested, next, opts).map_err(|err| err.at_field(field_number))?;
            }
            Ok(())
        }
        Value::Repeated(elements) => {
            if !is_homogeneous(elements) {
                return Err(EncodeErrorKind::HeterogeneousRepeated { field_number }.into());
            }
            for element in elements {
                validate_value(field_number, element, depth, opts)?;
            }
            Ok(())
        }
        Value::Map(pairs) => {
            let next = depth + 1;
            if next > opts.max_depth {
                return Err(EncodeErrorKind::DepthExceeded {
                    limit: opts.max_depth,
                }
                .into());
            }
            for (key, value) in pairs {
                let key_is_legal = key.is_self_contained()
                    || matches!(key, Value::String(_) | Value::Bytes(_));
                if !key_is_legal {
                    return Err(EncodeErrorKind::InvalidMapKeyType {
                        field_number,
                        type_name: key.type_name(),
                    }
                    .into());
                }
                validate_value(field_number, key, next, opts)?;
                validate_value(field_number, value, next, opts)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Payload size of a value, excluding its tag and any outer length prefix.
#[allow(clippy::as_conversions)] // Two's-complement casts mirror the wire rules.
fn encoded_value_len(value: &Value) -> usize {
    match value {
        Value::Int32(v) => (*v as i64 as u64).encoded_leb128_len(),
        Value::Int64(v) => (*v as u64).encoded_leb128_len(),
        Value::Uint32(v) => u64::from(*v).encoded_leb128_len(),
        Value::Uint64(v) => v.encoded_leb128_len(),
        Value::Sint32(v) => zigzag_encode_32(*v).encoded_leb128_len(),
        Value::Sint64(v) => zigzag_encode_64(*v).encoded_leb128_len(),
        Value::Bool(_) => 1,
        Value::Enum(v) => (*v as i64 as u64).encoded_leb128_len(),
        Value::Fixed32(_) | Value::Sfixed32(_) | Value::Float(_) => 4,
        Value::Fixed64(_) | Value::Sfixed64(_) | Value::Double(_) => 8,
        Value::String(s) => s.len(),
        Value::Bytes(b) => b.len(),
        Value::Message(fields) => encoded_fields_len(fields),
        // A repeated value appearing as a single record payload (packed
        // array, or nested repeated element) is its elements concatenated.
        Value::Repeated(elements) => elements.iter().map(framed_value_len).sum(),
        // A map value appearing as a single record payload is one entry body.
        Value::Map(pairs) => pairs.iter().map(|(k, v)| entry_body_len(k, v)).sum(),
    }
}

/// Size of a value as one record payload, including the length prefix that
/// length-delimited values carry.
fn framed_value_len(value: &Value) -> usize {
    let len = encoded_value_len(value);
    match value.wire_type() {
        WireType::LengthDelimited => u64::cast_from(len).encoded_leb128_len() + len,
        _ => len,
    }
}

fn entry_body_len(key: &Value, value: &Value) -> usize {
    wire::encoded_key_len(1)
        + framed_value_len(key)
        + wire::encoded_key_len(2)
        + framed_value_len(value)
}

/// Size of an entire field: tag(s) plus framed payload(s), honoring the
/// repeated packing policy and per-pair map records.
fn encoded_field_len(field_number: u32, value: &Value) -> usize {
    let key_len = wire::encoded_key_len(field_number);
    match value {
        Value::Repeated(elements) => match elements.as_slice() {
            // Explicit empty record marks presence deterministically.
            [] => key_len + 1,
            [single] => key_len + framed_value_len(single),
            elements if elements[0].is_self_contained() => {
                let packed: usize = elements.iter().map(encoded_value_len).sum();
                key_len + u64::cast_from(packed).encoded_leb128_len() + packed
            }
            elements => elements
                .iter()
                .map(|element| key_len + framed_value_len(element))
                .sum(),
        },
        Value::Map(pairs) => pairs
            .iter()
            .map(|(key, value)| {
                let body = entry_body_len(key, value);
                key_len + u64::cast_from(body).encoded_leb128_len() + body
            })
            .sum(),
        value => key_len + framed_value_len(value),
    }
}

/// Writes a value's payload bytes, excluding tag and outer length prefix.
#[allow(clippy::as_conversions)] // Two's-complement casts mirror the wire rules.
fn emit_value<B: BufMut>(sink: &mut B, value: &Value) -> usize {
    match value {
        Value::Int32(v) => (*v as i64 as u64).encode_leb128(sink),
        Value::Int64(v) => (*v as u64).encode_leb128(sink),
        Value::Uint32(v) => u64::from(*v).encode_leb128(sink),
        Value::Uint64(v) => v.encode_leb128(sink),
        Value::Sint32(v) => zigzag_encode_32(*v).encode_leb128(sink),
        Value::Sint64(v) => zigzag_encode_64(*v).encode_leb128(sink),
        Value::Bool(v) => {
            sink.put_u8(u8::from(*v));
            1
        }
        Value::Enum(v) => (*v as i64 as u64).encode_leb128(sink),
        Value::Fixed32(v) => {
            sink.put_u32_le(*v);
            4
        }
        Value::Sfixed32(v) => {
            sink.put_i32_le(*v);
            4
        }
        Value::Float(v) => {
            // to_bits round-trips the exact IEEE-754 pattern, NaNs included.
            sink.put_u32_le(v.to_bits());
            4
        }
        Value::Fixed64(v) => {
            sink.put_u64_le(*v);
            8
        }
        Value::Sfixed64(v) => {
            sink.put_i64_le(*v);
            8
        }
        Value::Double(v) => {
            sink.put_u64_le(v.to_bits());
            8
        }
        Value::String(s) => {
            sink.put_slice(s.as_bytes());
            s.len()
        }
        Value::Bytes(b) => {
            sink.put_slice(b);
            b.len()
        }
        Value::Message(fields) => {
            let mut written = 0;
            for field in fields {
                written += emit_field(sink, field.field_number, &field.value);
            }
            written
        }
        Value::Repeated(elements) => {
            let mut written = 0;
            for element in elements {
                written += emit_framed_value(sink, element);
            }
            written
        }
        Value::Map(pairs) => {
            let mut written = 0;
            for (key, value) in pairs {
                written += emit_entry_body(sink, key, value);
            }
            written
        }
    }
}

/// Writes a value as one record payload, adding the length prefix for
/// length-delimited values.
fn emit_framed_value<B: BufMut>(sink: &mut B, value: &Value) -> usize {
    match value.wire_type() {
        WireType::LengthDelimited => {
            let len = encoded_value_len(value);
            let prefix = u64::cast_from(len).encode_leb128(sink);
            prefix + emit_value(sink, value)
        }
        _ => emit_value(sink, value),
    }
}

fn emit_entry_body<B: BufMut>(sink: &mut B, key: &Value, value: &Value) -> usize {
    wire::encode_key(key.wire_type(), 1, sink);
    let mut written = wire::encoded_key_len(1) + emit_framed_value(sink, key);
    wire::encode_key(value.wire_type(), 2, sink);
    written += wire::encoded_key_len(2) + emit_framed_value(sink, value);
    written
}

/// Writes an entire field: tag(s) plus framed payload(s).
fn emit_field<B: BufMut>(sink: &mut B, field_number: u32, value: &Value) -> usize {
    let key_len = wire::encoded_key_len(field_number);
    match value {
        Value::Repeated(elements) => match elements.as_slice() {
            [] => {
                wire::encode_key(WireType::LengthDelimited, field_number, sink);
                sink.put_u8(0);
                key_len + 1
            }
            // A lone element goes out exactly as a singular field would,
            // sparing the length-prefix overhead of a one-item packed array.
            [single] => {
                wire::encode_key(single.wire_type(), field_number, sink);
                key_len + emit_framed_value(sink, single)
            }
            elements if elements[0].is_self_contained() => {
                let packed: usize = elements.iter().map(encoded_value_len).sum();
                wire::encode_key(WireType::LengthDelimited, field_number, sink);
                let prefix = u64::cast_from(packed).encode_leb128(sink);
                let mut written = key_len + prefix;
                for element in elements {
                    written += emit_value(sink, element);
                }
                written
            }
            elements => {
                let mut written = 0;
                for element in elements {
                    wire::encode_key(element.wire_type(), field_number, sink);
                    written += key_len + emit_framed_value(sink, element);
                }
                written
            }
        },
        Value::Map(pairs) => {
            let mut written = 0;
            for (key, value) in pairs {
                wire::encode_key(WireType::LengthDelimited, field_number, sink);
                let body = entry_body_len(key, value);
                let prefix = u64::cast_from(body).encode_leb128(sink);
                written += key_len + prefix + emit_entry_body(sink, key, value);
            }
            written
        }
        value => {
            wire::encode_key(value.wire_type(), field_number, sink);
            key_len + emit_framed_value(sink, value)
        }
    }
}
