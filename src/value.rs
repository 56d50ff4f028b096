//! The dynamic value model: [`Value`], [`ValueType`], and the field records
//! that tie them to field numbers.
//!
//! [`Value`] carries decoded data, [`ValueType`] is its type-only mirror used
//! as the schema, and [`RawField`] is the schemaless record produced by the
//! raw decoder. The two sides of the codec meet here: every `Value`
//! discriminant has exactly one wire-type mapping, and every `ValueType` can
//! produce the proto3 zero value of its type.

use alloc::string::String;
use alloc::vec::Vec;

use bytes::Bytes;

use crate::error::SchemaError;
use crate::wire::{WireType, MAXIMUM_FIELD_NUMBER, MINIMUM_FIELD_NUMBER};

/// A decoded protobuf value.
///
/// The first fourteen discriminants are *self-contained*: they encode without
/// a length prefix and are legal inside packed arrays. The rest require
/// length-delimited framing.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Two's-complement varint, 32-bit.
    Int32(i32),
    /// Two's-complement varint, 64-bit.
    Int64(i64),
    /// Unsigned varint, 32-bit.
    Uint32(u32),
    /// Unsigned varint, 64-bit.
    Uint64(u64),
    /// ZigZag varint, 32-bit.
    Sint32(i32),
    /// ZigZag varint, 64-bit.
    Sint64(i64),
    /// Varint 0 or 1.
    Bool(bool),
    /// Open enum value, carried as a 32-bit two's-complement varint.
    Enum(i32),
    /// Little-endian unsigned 32-bit.
    Fixed32(u32),
    /// Little-endian signed 32-bit.
    Sfixed32(i32),
    /// IEEE-754 single precision, little-endian.
    Float(f32),
    /// Little-endian unsigned 64-bit.
    Fixed64(u64),
    /// Little-endian signed 64-bit.
    Sfixed64(i64),
    /// IEEE-754 double precision, little-endian.
    Double(f64),
    /// Length-delimited UTF-8 text.
    String(String),
    /// Length-delimited octets.
    Bytes(Bytes),
    /// Nested message: an ordered sequence of fields.
    Message(Vec<Field>),
    /// Homogeneous ordered sequence of values.
    Repeated(Vec<Value>),
    /// Ordered key/value pairs. Wire order is preserved; consumers treating
    /// this as an associative container deduplicate by key themselves.
    Map(Vec<(Value, Value)>),
}

impl Value {
    /// The wire type this value uses when emitted as a single record.
    ///
    /// For `Repeated` this is the packed / empty form
    /// ([`WireType::LengthDelimited`]); the encoder may instead emit one
    /// tagged record per element, each with the element's own wire type.
    pub fn wire_type(&self) -> WireType {
        match self {
            Value::Int32(_)
            | Value::Int64(_)
            | Value::Uint32(_)
            | Value::Uint64(_)
            | Value::Sint32(_)
            | Value::Sint64(_)
            | Value::Bool(_)
            | Value::Enum(_) => WireType::Varint,
            Value::Fixed32(_) | Value::Sfixed32(_) | Value::Float(_) => WireType::Fixed32,
            Value::Fixed64(_) | Value::Sfixed64(_) | Value::Double(_) => WireType::Fixed64,
            Value::String(_)
            | Value::Bytes(_)
            | Value::Message(_)
            | Value::Repeated(_)
            | Value::Map(_) => WireType::LengthDelimited,
        }
    }

    /// True for values that encode without a length prefix and may therefore
    /// appear inside a packed array.
    pub fn is_self_contained(&self) -> bool {
        matches!(
            self,
            Value::Int32(_)
                | Value::Int64(_)
                | Value::Uint32(_)
                | Value::Uint64(_)
                | Value::Sint32(_)
                | Value::Sint64(_)
                | Value::Bool(_)
                | Value::Enum(_)
                | Value::Fixed32(_)
                | Value::Sfixed32(_)
                | Value::Float(_)
                | Value::Fixed64(_)
                | Value::Sfixed64(_)
                | Value::Double(_)
        )
    }

    /// The protobuf name of this value's type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int32(_) => "int32",
            Value::Int64(_) => "int64",
            Value::Uint32(_) => "uint32",
            Value::Uint64(_) => "uint64",
            Value::Sint32(_) => "sint32",
            Value::Sint64(_) => "sint64",
            Value::Bool(_) => "bool",
            Value::Enum(_) => "enum",
            Value::Fixed32(_) => "fixed32",
            Value::Sfixed32(_) => "sfixed32",
            Value::Float(_) => "float",
            Value::Fixed64(_) => "fixed64",
            Value::Sfixed64(_) => "sfixed64",
            Value::Double(_) => "double",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Message(_) => "message",
            Value::Repeated(_) => "repeated",
            Value::Map(_) => "map",
        }
    }

    /// The value as a signed integer, widening from any of the signed
    /// scalar representations (`int32`, `int64`, `sint32`, `sint64`,
    /// `sfixed32`, `sfixed64`, `enum`).
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int32(v) | Value::Sint32(v) | Value::Sfixed32(v) | Value::Enum(v) => {
                Some(i64::from(*v))
            }
            Value::Int64(v) | Value::Sint64(v) | Value::Sfixed64(v) => Some(*v),
            _ => None,
        }
    }

    /// The value as an unsigned integer, widening from any of the unsigned
    /// scalar representations (`uint32`, `uint64`, `fixed32`, `fixed64`).
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Uint32(v) | Value::Fixed32(v) => Some(u64::from(*v)),
            Value::Uint64(v) | Value::Fixed64(v) => Some(*v),
            _ => None,
        }
    }

    /// The value as a float, widening `float` to `double`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(f64::from(*v)),
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// The value as a bool, for `bool` values only.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// The text of a `string` value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// The octets of a `bytes` value.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// The fields of a `message` value.
    pub fn as_message(&self) -> Option<&[Field]> {
        match self {
            Value::Message(fields) => Some(fields),
            _ => None,
        }
    }

    /// The elements of a `repeated` value.
    pub fn as_repeated(&self) -> Option<&[Value]> {
        match self {
            Value::Repeated(values) => Some(values),
            _ => None,
        }
    }

    /// The pairs of a `map` value, in wire order.
    pub fn as_map(&self) -> Option<&[(Value, Value)]> {
        match self {
            Value::Map(pairs) => Some(pairs),
            _ => None,
        }
    }

    /// Whether two values have the same type and, recursively, the same
    /// element shape.
    ///
    /// Any two messages are shape-compatible: a message record on the wire is
    /// an opaque length-delimited payload, so differing field sets (proto3
    /// omits defaults) do not affect framing. Empty `Repeated`/`Map` values
    /// are compatible with any value of the same discriminant.
    pub fn same_shape(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Message(_), Value::Message(_)) => true,
            (Value::Repeated(a), Value::Repeated(b)) => match (a.first(), b.first()) {
                (Some(x), Some(y)) => x.same_shape(y),
                _ => true,
            },
            (Value::Map(a), Value::Map(b)) => match (a.first(), b.first()) {
                (Some((ka, va)), Some((kb, vb))) => ka.same_shape(kb) && va.same_shape(vb),
                _ => true,
            },
            _ => core::mem::discriminant(self) == core::mem::discriminant(other),
        }
    }
}

/// Returns true if every element of a repeated value shares the first
/// element's type and shape.
///
/// Vacuously true for empty and single-element slices.
pub fn is_homogeneous(values: &[Value]) -> bool {
    match values.split_first() {
        Some((head, tail)) => tail.iter().all(|v| head.same_shape(v)),
        None => true,
    }
}

/// Type-only mirror of [`Value`], used as the schema for typed decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueType {
    /// See [`Value::Int32`].
    Int32,
    /// See [`Value::Int64`].
    Int64,
    /// See [`Value::Uint32`].
    Uint32,
    /// See [`Value::Uint64`].
    Uint64,
    /// See [`Value::Sint32`].
    Sint32,
    /// See [`Value::Sint64`].
    Sint64,
    /// See [`Value::Bool`].
    Bool,
    /// See [`Value::Enum`].
    Enum,
    /// See [`Value::Fixed32`].
    Fixed32,
    /// See [`Value::Sfixed32`].
    Sfixed32,
    /// See [`Value::Float`].
    Float,
    /// See [`Value::Fixed64`].
    Fixed64,
    /// See [`Value::Sfixed64`].
    Sfixed64,
    /// See [`Value::Double`].
    Double,
    /// See [`Value::String`].
    String,
    /// See [`Value::Bytes`].
    Bytes,
    /// Nested message with its own schema.
    Message(Vec<FieldType>),
    /// Homogeneous sequence of the element type.
    Repeated(alloc::boxed::Box<ValueType>),
    /// Key/value pairs; the key type must satisfy
    /// [`ValueType::is_valid_map_key`].
    Map(alloc::boxed::Box<ValueType>, alloc::boxed::Box<ValueType>),
}

impl ValueType {
    /// The wire type a singular value of this type occupies on the wire.
    ///
    /// For `Repeated` this is the packed / empty form; unpacked elements
    /// arrive under the element type's own wire type and the typed decoder
    /// accepts both.
    pub fn wire_type(&self) -> WireType {
        match self {
            ValueType::Int32
            | ValueType::Int64
            | ValueType::Uint32
            | ValueType::Uint64
            | ValueType::Sint32
            | ValueType::Sint64
            | ValueType::Bool
            | ValueType::Enum => WireType::Varint,
            ValueType::Fixed32 | ValueType::Sfixed32 | ValueType::Float => WireType::Fixed32,
            ValueType::Fixed64 | ValueType::Sfixed64 | ValueType::Double => WireType::Fixed64,
            ValueType::String
            | ValueType::Bytes
            | ValueType::Message(_)
            | ValueType::Repeated(_)
            | ValueType::Map(..) => WireType::LengthDelimited,
        }
    }

    /// True for types whose values encode without a length prefix.
    pub fn is_self_contained(&self) -> bool {
        matches!(
            self,
            ValueType::Int32
                | ValueType::Int64
                | ValueType::Uint32
                | ValueType::Uint64
                | ValueType::Sint32
                | ValueType::Sint64
                | ValueType::Bool
                | ValueType::Enum
                | ValueType::Fixed32
                | ValueType::Sfixed32
                | ValueType::Float
                | ValueType::Fixed64
                | ValueType::Sfixed64
                | ValueType::Double
        )
    }

    /// The protobuf name of this type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            ValueType::Int32 => "int32",
            ValueType::Int64 => "int64",
            ValueType::Uint32 => "uint32",
            ValueType::Uint64 => "uint64",
            ValueType::Sint32 => "sint32",
            ValueType::Sint64 => "sint64",
            ValueType::Bool => "bool",
            ValueType::Enum => "enum",
            ValueType::Fixed32 => "fixed32",
            ValueType::Sfixed32 => "sfixed32",
            ValueType::Float => "float",
            ValueType::Fixed64 => "fixed64",
            ValueType::Sfixed64 => "sfixed64",
            ValueType::Double => "double",
            ValueType::String => "string",
            ValueType::Bytes => "bytes",
            ValueType::Message(_) => "message",
            ValueType::Repeated(_) => "repeated",
            ValueType::Map(..) => "map",
        }
    }

    /// Types permitted as map keys: self-contained scalars, `string`, and
    /// `bytes`. Composite types (`message`, `repeated`, `map`) are not.
    pub fn is_valid_map_key(&self) -> bool {
        self.is_self_contained() || matches!(self, ValueType::String | ValueType::Bytes)
    }

    /// The proto3 zero value of this type.
    ///
    /// Used for absent key or value fields inside map entries.
    pub fn zero_value(&self) -> Value {
        match self {
            ValueType::Int32 => Value::Int32(0),
            ValueType::Int64 => Value::Int64(0),
            ValueType::Uint32 => Value::Uint32(0),
            ValueType::Uint64 => Value::Uint64(0),
            ValueType::Sint32 => Value::Sint32(0),
            ValueType::Sint64 => Value::Sint64(0),
            ValueType::Bool => Value::Bool(false),
            ValueType::Enum => Value::Enum(0),
            ValueType::Fixed32 => Value::Fixed32(0),
            ValueType::Sfixed32 => Value::Sfixed32(0),
            ValueType::Float => Value::Float(0.0),
            ValueType::Fixed64 => Value::Fixed64(0),
            ValueType::Sfixed64 => Value::Sfixed64(0),
            ValueType::Double => Value::Double(0.0),
            ValueType::String => Value::String(String::new()),
            ValueType::Bytes => Value::Bytes(Bytes::new()),
            ValueType::Message(_) => Value::Message(Vec::new()),
            ValueType::Repeated(_) => Value::Repeated(Vec::new()),
            ValueType::Map(..) => Value::Map(Vec::new()),
        }
    }
}

/// A field number paired with a decoded value.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Field number, `1..=2^29 - 1`.
    pub field_number: u32,
    /// The decoded value.
    pub value: Value,
}

impl Field {
    /// Construct a field. The number is validated on encode.
    pub fn new(field_number: u32, value: Value) -> Self {
        Field {
            field_number,
            value,
        }
    }
}

/// A field number paired with its schema type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldType {
    /// Field number, `1..=2^29 - 1`.
    pub field_number: u32,
    /// The expected type of the field's values.
    pub value_type: ValueType,
}

impl FieldType {
    /// Construct a schema entry. Validity is checked by
    /// [`validate_schema`](crate::validate_schema).
    pub fn new(field_number: u32, value_type: ValueType) -> Self {
        FieldType {
            field_number,
            value_type,
        }
    }
}

/// A wire record as seen by the schemaless raw decoder: field number, wire
/// type, and the uninterpreted payload bytes.
///
/// For [`WireType::Varint`] the payload is the raw varint bytes (1-10 bytes,
/// continuation bits intact); for the fixed wire types it is exactly 4 or 8
/// bytes; for [`WireType::LengthDelimited`] it is the payload *without* the
/// length prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawField {
    /// Field number, `1..=2^29 - 1`.
    pub field_number: u32,
    /// How the payload was framed on the wire.
    pub wire_type: WireType,
    /// Uninterpreted payload bytes.
    pub payload: Bytes,
}

/// Checks that a schema is well-formed: field numbers in range and unique per
/// message level, and map key types legal. Recurses into nested messages,
/// repeated element types, and map key/value types.
///
/// The decoder and encoder enforce the same rules lazily; this helper lets a
/// caller fail fast at schema construction.
pub fn validate_schema(schema: &[FieldType]) -> Result<(), SchemaError> {
    for (i, entry) in schema.iter().enumerate() {
        if entry.field_number < MINIMUM_FIELD_NUMBER || entry.field_number > MAXIMUM_FIELD_NUMBER {
            return Err(SchemaError::InvalidFieldNumber {
                value: entry.field_number,
            });
        }
        if schema[..i]
            .iter()
            .any(|prev| prev.field_number == entry.field_number)
        {
            return Err(SchemaError::DuplicateFieldNumber {
                field_number: entry.field_number,
            });
        }
        validate_value_type(entry.field_number, &entry.value_type)?;
    }
    Ok(())
}

fn validate_value_type(field_number: u32, value_type: &ValueType) -> Result<(), SchemaError> {
    match value_type {
        ValueType::Message(nested) => validate_schema(nested),
        ValueType::Repeated(element) => validate_value_type(field_number, element),
        ValueType::Map(key, value) => {
            if !key.is_valid_map_key() {
                return Err(SchemaError::InvalidMapKeyType {
                    field_number,
                    type_name: key.type_name(),
                });
            }
            validate_value_type(field_number, value)
        }
        _ => Ok(()),
    }
}
