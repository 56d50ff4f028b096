//! Schema-directed interpretation of raw field records into typed values.
//!
//! The decoder walks [`RawField`]s in stream order, interprets each payload
//! under the schema's [`ValueType`], and merges repeated occurrences of a
//! field number. Output fields come back in schema declaration order so the
//! result is deterministic regardless of wire ordering.
//!
//! Merging deliberately preserves *every* occurrence of a singular field by
//! promoting duplicates to `repeated`, instead of proto3's last-wins.
//! Consumers wanting last-wins take the final element.

use alloc::vec;
use alloc::vec::Vec;

use bytes::Bytes;

use crate::error::{DecodeError, DecodeErrorKind};
use crate::leb128::LebCodec;
use crate::raw;
use crate::value::{Field, FieldType, RawField, Value, ValueType};
use crate::wire::WireType;
use crate::zigzag::{zigzag_decode_32, zigzag_decode_64};
use crate::DecodeOptions;

#[cfg(feature = "smallvec")]
type SlotVec = smallvec::SmallVec<[Option<Value>; 16]>;

#[cfg(not(feature = "smallvec"))]
type SlotVec = Vec<Option<Value>>;

/// Decodes raw records against a schema, producing typed fields in schema
/// declaration order.
pub(crate) fn decode_fields(
    raw_fields: &[RawField],
    schema: &[FieldType],
    opts: &DecodeOptions,
) -> Result<Vec<Field>, DecodeError> {
    decode_fields_at_depth(raw_fields, schema, opts, 0)
}

fn decode_fields_at_depth(
    raw_fields: &[RawField],
    schema: &[FieldType],
    opts: &DecodeOptions,
    depth: usize,
) -> Result<Vec<Field>, DecodeError> {
    // One accumulator slot per schema entry; filling by schema index makes
    // the final ordering fall out for free.
    let mut slots: SlotVec = schema.iter().map(|_| None).collect();

    for raw_field in raw_fields {
        let index = schema
            .iter()
            .position(|entry| entry.field_number == raw_field.field_number)
            .ok_or(DecodeErrorKind::UnknownField {
                field_number: raw_field.field_number,
            })?;

        let decoded = decode_one(raw_field, &schema[index].value_type, opts, depth)
            .map_err(|err| err.at_field(raw_field.field_number))?;

        match &mut slots[index] {
            slot @ None => *slot = Some(decoded),
            Some(existing) => {
                merge_into(existing, decoded, raw_field.field_number)?;
            }
        }
    }

    Ok(schema
        .iter()
        .zip(slots)
        .filter_map(|(entry, slot)| slot.map(|value| Field::new(entry.field_number, value)))
        .collect())
}

/// Interprets a single raw record under a schema type.
///
/// For `repeated` types the result is always a `Value::Repeated` (one
/// element for an unpacked record, many for a packed one); for `map` types a
/// `Value::Map` holding the single decoded entry. Merging combines them.
fn decode_one(
    raw_field: &RawField,
    value_type: &ValueType,
    opts: &DecodeOptions,
    depth: usize,
) -> Result<Value, DecodeError> {
    match value_type {
        ValueType::Repeated(element) => {
            // A packed record is only recognizable for self-contained element
            // types; everything else length-delimited is one unpacked
            // element.
            if element.is_self_contained()
                && raw_field.wire_type == WireType::LengthDelimited
            {
                decode_packed(raw_field, element)
            } else {
                let value = decode_one(raw_field, element, opts, depth)?;
                Ok(Value::Repeated(vec![value]))
            }
        }
        ValueType::Map(key_type, value_type) => {
            decode_map_entry(raw_field, key_type, value_type, opts, depth)
        }
        ValueType::Message(nested) => {
            expect_wire_type(raw_field, WireType::LengthDelimited)?;
            let next = depth + 1;
            if next > opts.max_depth {
                return Err(DecodeErrorKind::DepthExceeded {
                    limit: opts.max_depth,
                }
                .into());
            }
            let records = raw::decode_raw_fields(raw_field.payload.clone(), opts.max_len)?;
            let fields = decode_fields_at_depth(&records, nested, opts, next)?;
            Ok(Value::Message(fields))
        }
        ValueType::String => {
            expect_wire_type(raw_field, WireType::LengthDelimited)?;
            match core::str::from_utf8(&raw_field.payload) {
                Ok(text) => Ok(Value::String(text.into())),
                Err(_) => Err(DecodeErrorKind::InvalidUtf8.into()),
            }
        }
        ValueType::Bytes => {
            expect_wire_type(raw_field, WireType::LengthDelimited)?;
            Ok(Value::Bytes(raw_field.payload.clone()))
        }
        ValueType::Fixed32 | ValueType::Sfixed32 | ValueType::Float => {
            expect_wire_type(raw_field, WireType::Fixed32)?;
            let bytes = fixed_payload::<4>(&raw_field.payload)?;
            Ok(fixed32_to_value(bytes, value_type))
        }
        ValueType::Fixed64 | ValueType::Sfixed64 | ValueType::Double => {
            expect_wire_type(raw_field, WireType::Fixed64)?;
            let bytes = fixed_payload::<8>(&raw_field.payload)?;
            Ok(fixed64_to_value(bytes, value_type))
        }
        _ => {
            // Varint-class scalars.
            expect_wire_type(raw_field, WireType::Varint)?;
            let (value, used) = u64::decode_leb128(&raw_field.payload)?;
            if used != raw_field.payload.len() {
                return Err(DecodeErrorKind::InvalidVarint.into());
            }
            Ok(varint_to_value(value, value_type)?)
        }
    }
}

fn expect_wire_type(raw_field: &RawField, expected: WireType) -> Result<(), DecodeErrorKind> {
    if raw_field.wire_type != expected {
        return Err(DecodeErrorKind::WireTypeMismatch {
            field_number: raw_field.field_number,
            expected,
            actual: raw_field.wire_type,
        });
    }
    Ok(())
}

fn fixed_payload<const N: usize>(payload: &Bytes) -> Result<[u8; N], DecodeErrorKind> {
    <[u8; N]>::try_from(&payload[..]).map_err(|_| DecodeErrorKind::LengthMismatch {
        expected: N,
        actual: payload.len(),
    })
}

/// Converts a decoded unsigned varint into a varint-class scalar, applying
/// the type's range and domain checks.
fn varint_to_value(raw: u64, value_type: &ValueType) -> Result<Value, DecodeErrorKind> {
    #[allow(clippy::as_conversions)] // Bit reinterpretation, not a narrowing.
    let as_signed = raw as i64;
    match value_type {
        // int32/enum arrive sign-extended to 64 bits, so the range check runs
        // on the signed reinterpretation.
        ValueType::Int32 => match i32::try_from(as_signed) {
            Ok(v) => Ok(Value::Int32(v)),
            Err(_) => Err(DecodeErrorKind::VarintOutOfRange { target: "int32" }),
        },
        ValueType::Enum => match i32::try_from(as_signed) {
            Ok(v) => Ok(Value::Enum(v)),
            Err(_) => Err(DecodeErrorKind::VarintOutOfRange { target: "enum" }),
        },
        ValueType::Int64 => Ok(Value::Int64(as_signed)),
        ValueType::Uint32 => match u32::try_from(raw) {
            Ok(v) => Ok(Value::Uint32(v)),
            Err(_) => Err(DecodeErrorKind::VarintOutOfRange { target: "uint32" }),
        },
        ValueType::Uint64 => Ok(Value::Uint64(raw)),
        ValueType::Sint32 => match u32::try_from(raw) {
            Ok(v) => Ok(Value::Sint32(zigzag_decode_32(v))),
            Err(_) => Err(DecodeErrorKind::VarintOutOfRange { target: "sint32" }),
        },
        ValueType::Sint64 => Ok(Value::Sint64(zigzag_decode_64(raw))),
        ValueType::Bool => match raw {
            0 => Ok(Value::Bool(false)),
            1 => Ok(Value::Bool(true)),
            other => Err(DecodeErrorKind::InvalidBool { value: other }),
        },
        _ => unreachable!("caller dispatches only varint-class types here"),
    }
}

fn fixed32_to_value(bytes: [u8; 4], value_type: &ValueType) -> Value {
    match value_type {
        ValueType::Fixed32 => Value::Fixed32(u32::from_le_bytes(bytes)),
        ValueType::Sfixed32 => Value::Sfixed32(i32::from_le_bytes(bytes)),
        // from_le_bytes preserves the exact bit pattern, NaN payloads
        // included.
        ValueType::Float => Value::Float(f32::from_le_bytes(bytes)),
        _ => unreachable!("caller dispatches only fixed32-class types here"),
    }
}

fn fixed64_to_value(bytes: [u8; 8], value_type: &ValueType) -> Value {
    match value_type {
        ValueType::Fixed64 => Value::Fixed64(u64::from_le_bytes(bytes)),
        ValueType::Sfixed64 => Value::Sfixed64(i64::from_le_bytes(bytes)),
        ValueType::Double => Value::Double(f64::from_le_bytes(bytes)),
        _ => unreachable!("caller dispatches only fixed64-class types here"),
    }
}

/// Decodes a packed array: element payloads concatenated with no tags,
/// consumed until the record payload is exhausted.
fn decode_packed(raw_field: &RawField, element: &ValueType) -> Result<Value, DecodeError> {
    let payload = &raw_field.payload;
    let mut elements = Vec::new();
    let mut offset = 0;

    match element.wire_type() {
        WireType::Varint => {
            while offset < payload.len() {
                let (value, used) = u64::decode_leb128(&payload[offset..])?;
                elements.push(varint_to_value(value, element)?);
                offset += used;
            }
        }
        WireType::Fixed32 => {
            // A trailing partial element is a truncated payload.
            if payload.len() % 4 != 0 {
                return Err(DecodeErrorKind::Truncated.into());
            }
            for chunk in payload.chunks_exact(4) {
                let mut bytes = [0u8; 4];
                bytes.copy_from_slice(chunk);
                elements.push(fixed32_to_value(bytes, element));
            }
        }
        WireType::Fixed64 => {
            if payload.len() % 8 != 0 {
                return Err(DecodeErrorKind::Truncated.into());
            }
            for chunk in payload.chunks_exact(8) {
                let mut bytes = [0u8; 8];
                bytes.copy_from_slice(chunk);
                elements.push(fixed64_to_value(bytes, element));
            }
        }
        WireType::LengthDelimited => {
            unreachable!("packed arrays only hold self-contained elements")
        }
    }

    Ok(Value::Repeated(elements))
}

/// Decodes one map entry: a submessage with the key at field 1 and the value
/// at field 2, either defaulting to its type's zero value when absent. Any
/// other field number inside the entry is rejected.
fn decode_map_entry(
    raw_field: &RawField,
    key_type: &ValueType,
    value_type: &ValueType,
    opts: &DecodeOptions,
    depth: usize,
) -> Result<Value, DecodeError> {
    expect_wire_type(raw_field, WireType::LengthDelimited)?;
    if !key_type.is_valid_map_key() {
        return Err(DecodeErrorKind::InvalidMapKeyType {
            type_name: key_type.type_name(),
        }
        .into());
    }

    let next = depth + 1;
    if next > opts.max_depth {
        return Err(DecodeErrorKind::DepthExceeded {
            limit: opts.max_depth,
        }
        .into());
    }

    let records = raw::decode_raw_fields(raw_field.payload.clone(), opts.max_len)?;

    let mut key = None;
    let mut value = None;
    for record in &records {
        match record.field_number {
            // A repeated key or value tag inside one entry is last-wins: the
            // entry is a submessage of two singular fields.
            1 => {
                key = Some(
                    decode_one(record, key_type, opts, next).map_err(|err| err.at_field(1))?,
                );
            }
            2 => {
                value = Some(
                    decode_one(record, value_type, opts, next)
                        .map_err(|err| err.at_field(2))?,
                );
            }
            other => {
                return Err(DecodeErrorKind::InvalidMapEntry {
                    field_number: other,
                }
                .into());
            }
        }
    }

    let key = match key {
        // An unpacked repeated-typed occurrence wraps in `Repeated`, which is
        // fine for values; keys are scalars so this cannot trigger for them.
        Some(key) => key,
        None => key_type.zero_value(),
    };
    let value = value.unwrap_or_else(|| value_type.zero_value());

    Ok(Value::Map(vec![(key, value)]))
}

/// Combines a newly decoded occurrence with the accumulator entry for the
/// same field number.
fn merge_into(slot: &mut Value, incoming: Value, field_number: u32) -> Result<(), DecodeError> {
    // Placeholder is immediately overwritten on every path below.
    let existing = core::mem::replace(slot, Value::Bool(false));
    *slot = merge_values(existing, incoming, field_number)?;
    Ok(())
}

fn merge_values(
    existing: Value,
    incoming: Value,
    field_number: u32,
) -> Result<Value, DecodeError> {
    fn conflict(field_number: u32, existing: &Value, incoming: &Value) -> DecodeError {
        DecodeErrorKind::MergeConflict {
            field_number,
            existing: existing.type_name(),
            incoming: incoming.type_name(),
        }
        .into()
    }

    match (existing, incoming) {
        (Value::Repeated(mut old), Value::Repeated(more)) => {
            if let (Some(a), Some(b)) = (old.first(), more.first()) {
                if !a.same_shape(b) {
                    return Err(conflict(field_number, a, b));
                }
            }
            old.extend(more);
            Ok(Value::Repeated(old))
        }
        (Value::Map(mut old), Value::Map(more)) => {
            // Later pairs with the same key override earlier ones on lookup,
            // but all are retained in wire order.
            if let (Some((ka, va)), Some((kb, vb))) = (old.first(), more.first()) {
                if !ka.same_shape(kb) || !va.same_shape(vb) {
                    return Err(DecodeErrorKind::MergeConflict {
                        field_number,
                        existing: "map",
                        incoming: "map",
                    }
                    .into());
                }
            }
            old.extend(more);
            Ok(Value::Map(old))
        }
        (Value::Repeated(mut old), single) => {
            if let Some(head) = old.first() {
                if !head.same_shape(&single) {
                    return Err(conflict(field_number, head, &single));
                }
            }
            old.push(single);
            Ok(Value::Repeated(old))
        }
        (single, Value::Repeated(more)) => {
            if let Some(head) = more.first() {
                if !single.same_shape(head) {
                    return Err(conflict(field_number, &single, head));
                }
            }
            let mut merged = vec![single];
            merged.extend(more);
            Ok(Value::Repeated(merged))
        }
        (a, b) if a.same_shape(&b) => Ok(Value::Repeated(vec![a, b])),
        (a, b) => Err(conflict(field_number, &a, &b)),
    }
}

/// Merges two already-decoded field lists under the same rules the decoder
/// applies to duplicate field numbers on the wire.
///
/// Fields unique to either side pass through; fields present in both merge
/// per occurrence (repeated and map concatenate, singular values promote to
/// `repeated`). Incompatible shapes fail with
/// [`DecodeErrorKind::MergeConflict`].
pub(crate) fn merge_field_lists(
    base: Vec<Field>,
    extra: Vec<Field>,
) -> Result<Vec<Field>, DecodeError> {
    let mut merged = base;
    for field in extra {
        match merged
            .iter_mut()
            .find(|existing| existing.field_number == field.field_number)
        {
            Some(existing) => {
                merge_into(&mut existing.value, field.value, field.field_number)?;
            }
            None => merged.push(field),
        }
    }
    Ok(merged)
}
