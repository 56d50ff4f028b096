//! Schema-directed dynamic codec for the Protocol Buffers wire format.
//!
//! Unlike generated-code protobuf libraries, this crate has no compile-time
//! message types: schemas are plain [`FieldType`] values built at runtime,
//! and decoded messages are trees of [`Value`]s. That makes it suitable for
//! tooling that meets messages it has never seen before - inspectors,
//! proxies, test harnesses - while still doing full typed decoding when a
//! schema is at hand.
//!
//! The wire format follows proto3 semantics: wire types 0, 1, 2, and 5, with
//! the deprecated group codes rejected. Packed repeated fields are produced
//! for self-contained element types and accepted in both packed and unpacked
//! form.
//!
//! One deliberate departure from proto3: when a singular field number occurs
//! more than once on the wire, *all* occurrences are preserved by promotion
//! to `repeated`, instead of keeping only the last. Callers wanting
//! last-wins semantics take the final element.
//!
//! ```
//! use protodyn::{Field, FieldType, Value, ValueType};
//!
//! let schema = [
//!     FieldType::new(1, ValueType::String),
//!     FieldType::new(2, ValueType::Uint64),
//! ];
//! let fields = [
//!     Field::new(1, Value::String("accumulator".into())),
//!     Field::new(2, Value::Uint64(42)),
//! ];
//!
//! let encoded = protodyn::to_bytes(&fields)?;
//! let decoded = protodyn::from_bytes(&encoded[..], &schema)?;
//! assert_eq!(decoded, fields);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Without a schema, [`from_raw_bytes`] still splits a message into its raw
//! records for inspection or verbatim forwarding via [`encode_raw_fields`].

#![no_std]
#![deny(clippy::as_conversions)]

extern crate alloc;

#[cfg(any(feature = "std", test))]
extern crate std;

pub mod error;
pub mod leb128;
pub mod value;
pub mod wire;
pub mod zigzag;

mod decode;
mod encode;
mod raw;
mod util;

use alloc::vec::Vec;

use bytes::{Buf, BufMut};

pub use crate::error::{
    DecodeError, DecodeErrorKind, EncodeError, EncodeErrorKind, SchemaError,
};
pub use crate::value::{
    is_homogeneous, validate_schema, Field, FieldType, RawField, Value, ValueType,
};
pub use crate::wire::WireType;

/// Knobs guarding the decoder against pathological inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Maximum allowed nesting of messages and map entries. The outermost
    /// message sits at depth zero.
    pub max_depth: usize,
    /// Maximum accepted length-prefix value, bounding any single allocation.
    pub max_len: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions {
            max_depth: 100,
            max_len: 256 * 1024 * 1024,
        }
    }
}

/// Knobs guarding the encoder against pathological inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Maximum allowed nesting of messages and map entries.
    pub max_depth: usize,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        EncodeOptions { max_depth: 100 }
    }
}

/// Serializes fields into a freshly allocated byte vector.
///
/// Field order, repeated element order, and map pair order are preserved, so
/// the output is deterministic for a given input.
pub fn to_bytes(fields: &[Field]) -> Result<Vec<u8>, EncodeError> {
    to_bytes_with(fields, &EncodeOptions::default())
}

/// [`to_bytes`] with explicit [`EncodeOptions`].
pub fn to_bytes_with(fields: &[Field], opts: &EncodeOptions) -> Result<Vec<u8>, EncodeError> {
    let mut out = Vec::new();
    encode::encode_fields(&mut out, fields, opts)?;
    Ok(out)
}

/// Serializes fields into a caller-provided sink, returning bytes written.
///
/// Validation runs before the first byte is emitted, so a failed call leaves
/// the sink untouched.
pub fn to_bytes_into_sink<B: BufMut>(sink: &mut B, fields: &[Field]) -> Result<usize, EncodeError> {
    to_bytes_into_sink_with(sink, fields, &EncodeOptions::default())
}

/// [`to_bytes_into_sink`] with explicit [`EncodeOptions`].
pub fn to_bytes_into_sink_with<B: BufMut>(
    sink: &mut B,
    fields: &[Field],
    opts: &EncodeOptions,
) -> Result<usize, EncodeError> {
    encode::encode_fields(sink, fields, opts)
}

/// The number of bytes [`to_bytes`] produces for `fields`.
///
/// Assumes the fields would validate; recurses over the value tree without a
/// depth guard.
pub fn encoded_len(fields: &[Field]) -> usize {
    encode::encoded_fields_len(fields)
}

/// Parses a wire stream into raw records without a schema.
///
/// Records come back in stream order with uninterpreted payloads. Useful for
/// inspecting unknown messages; feed the result to [`from_raw_fields`] once
/// a schema is known.
pub fn from_raw_bytes<B: Buf>(src: B) -> Result<Vec<RawField>, DecodeError> {
    from_raw_bytes_with(src, &DecodeOptions::default())
}

/// [`from_raw_bytes`] with explicit [`DecodeOptions`].
pub fn from_raw_bytes_with<B: Buf>(
    src: B,
    opts: &DecodeOptions,
) -> Result<Vec<RawField>, DecodeError> {
    raw::decode_raw_fields(src, opts.max_len)
}

/// Re-emits raw records exactly as they came off the wire, returning bytes
/// written.
///
/// The schemaless dual of [`to_bytes_into_sink`]: together with
/// [`from_raw_bytes`] it forwards messages without interpreting them.
pub fn encode_raw_fields<B: BufMut>(
    sink: &mut B,
    fields: &[RawField],
) -> Result<usize, EncodeError> {
    raw::encode_raw_fields(sink, fields)
}

/// Decodes a wire stream against a schema, producing typed fields in schema
/// declaration order.
pub fn from_bytes<B: Buf>(src: B, schema: &[FieldType]) -> Result<Vec<Field>, DecodeError> {
    from_bytes_with(src, schema, &DecodeOptions::default())
}

/// [`from_bytes`] with explicit [`DecodeOptions`].
pub fn from_bytes_with<B: Buf>(
    src: B,
    schema: &[FieldType],
    opts: &DecodeOptions,
) -> Result<Vec<Field>, DecodeError> {
    let raw_fields = raw::decode_raw_fields(src, opts.max_len)?;
    decode::decode_fields(&raw_fields, schema, opts)
}

/// Interprets already-parsed raw records against a schema.
///
/// Unlike records produced by [`from_raw_bytes`], caller-constructed
/// [`RawField`]s are not trusted: varint payloads must hold exactly one
/// well-formed varint and fixed payloads exactly 4 or 8 bytes.
pub fn from_raw_fields(
    raw_fields: &[RawField],
    schema: &[FieldType],
) -> Result<Vec<Field>, DecodeError> {
    from_raw_fields_with(raw_fields, schema, &DecodeOptions::default())
}

/// [`from_raw_fields`] with explicit [`DecodeOptions`].
pub fn from_raw_fields_with(
    raw_fields: &[RawField],
    schema: &[FieldType],
    opts: &DecodeOptions,
) -> Result<Vec<Field>, DecodeError> {
    decode::decode_fields(raw_fields, schema, opts)
}

/// Merges two decoded field lists the way the decoder merges duplicate field
/// numbers on the wire.
///
/// Decoding the concatenation of two wire messages equals decoding each and
/// merging the results, so this is the typed-side equivalent of appending
/// bytes. Repeated and map fields concatenate; singular values promote to
/// `repeated`; incompatible shapes fail with
/// [`DecodeErrorKind::MergeConflict`].
pub fn merge_fields(base: Vec<Field>, extra: Vec<Field>) -> Result<Vec<Field>, DecodeError> {
    decode::merge_field_lists(base, extra)
}
