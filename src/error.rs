//! Typed errors for the wire codec.
//!
//! Decode and encode failures carry a structured kind plus the chain of field
//! numbers from the outermost message down to the failure site, so an error
//! three messages deep still names where it happened.

use alloc::vec::Vec;
use core::fmt;

use crate::wire::WireType;

/// The reason a decode failed, without location context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeErrorKind {
    /// Field number on the wire is outside `[1, 2^29 - 1]`.
    InvalidFieldNumber { value: u64 },
    /// Wire code is not one of 0, 1, 2, 5.
    InvalidWireType { value: u8 },
    /// Input ended mid-tag, mid-varint, or mid-payload.
    Truncated,
    /// A varint ran past the 10-byte / 64-bit ceiling.
    VarintTooLong,
    /// A decoded varint does not fit the schema-declared type.
    VarintOutOfRange { target: &'static str },
    /// A varint payload that is not exactly one well-formed varint.
    ///
    /// Only reachable through caller-constructed [`RawField`]s; the raw
    /// decoder never produces such a payload.
    ///
    /// [`RawField`]: crate::RawField
    InvalidVarint,
    /// A fixed-width payload whose length is not exactly 4 or 8 bytes.
    ///
    /// Like [`DecodeErrorKind::InvalidVarint`], only reachable through
    /// caller-constructed raw fields.
    LengthMismatch { expected: usize, actual: usize },
    /// A `string` payload is not well-formed UTF-8.
    InvalidUtf8,
    /// A `bool` payload was neither 0 nor 1.
    InvalidBool { value: u64 },
    /// Field number present on the wire but absent from the schema.
    UnknownField { field_number: u32 },
    /// The wire type on the wire does not match the schema-declared type.
    WireTypeMismatch {
        field_number: u32,
        expected: WireType,
        actual: WireType,
    },
    /// A map entry submessage carried a tag other than 1 (key) or 2 (value).
    InvalidMapEntry { field_number: u32 },
    /// A map key type that protobuf does not permit.
    InvalidMapKeyType { type_name: &'static str },
    /// The same field number appeared with incompatible value shapes.
    MergeConflict {
        field_number: u32,
        existing: &'static str,
        incoming: &'static str,
    },
    /// Nesting deeper than the configured maximum.
    DepthExceeded { limit: usize },
    /// A length prefix larger than the configured maximum.
    LengthExceeded { length: u64, limit: usize },
}

impl fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeErrorKind::InvalidFieldNumber { value } => {
                write!(f, "invalid field number: {value}")
            }
            DecodeErrorKind::InvalidWireType { value: value @ (3 | 4) } => {
                write!(f, "unsupported wire type {value} (deprecated group encoding)")
            }
            DecodeErrorKind::InvalidWireType { value } => {
                write!(f, "invalid wire type value: {value}")
            }
            DecodeErrorKind::Truncated => {
                write!(f, "unexpected end of input")
            }
            DecodeErrorKind::VarintTooLong => {
                write!(f, "varint exceeds the 10 byte / 64 bit ceiling")
            }
            DecodeErrorKind::VarintOutOfRange { target } => {
                write!(f, "varint out of range for {target}")
            }
            DecodeErrorKind::InvalidVarint => {
                write!(f, "payload is not a single well-formed varint")
            }
            DecodeErrorKind::LengthMismatch { expected, actual } => {
                write!(f, "payload length mismatch: expected {expected}, got {actual}")
            }
            DecodeErrorKind::InvalidUtf8 => {
                write!(f, "invalid UTF-8 in string field")
            }
            DecodeErrorKind::InvalidBool { value } => {
                write!(f, "bool payload must be 0 or 1, got {value}")
            }
            DecodeErrorKind::UnknownField { field_number } => {
                write!(f, "field {field_number} is not present in the schema")
            }
            DecodeErrorKind::WireTypeMismatch {
                field_number,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "field {field_number}: expected wire type {expected:?}, got {actual:?}"
                )
            }
            DecodeErrorKind::InvalidMapEntry { field_number } => {
                write!(
                    f,
                    "map entry may only contain key (1) and value (2), got field {field_number}"
                )
            }
            DecodeErrorKind::InvalidMapKeyType { type_name } => {
                write!(f, "{type_name} is not a valid map key type")
            }
            DecodeErrorKind::MergeConflict {
                field_number,
                existing,
                incoming,
            } => {
                write!(
                    f,
                    "field {field_number} occurs with incompatible shapes: {existing} then {incoming}"
                )
            }
            DecodeErrorKind::DepthExceeded { limit } => {
                write!(f, "message nesting exceeds the depth limit of {limit}")
            }
            DecodeErrorKind::LengthExceeded { length, limit } => {
                write!(f, "length prefix {length} exceeds the limit of {limit}")
            }
        }
    }
}

/// A decode failure: the kind plus the field-number path leading to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeError {
    kind: DecodeErrorKind,
    path: Vec<u32>,
}

impl DecodeError {
    /// The structured reason for the failure.
    pub fn kind(&self) -> DecodeErrorKind {
        self.kind
    }

    /// Field numbers from the outermost message to the failure site.
    ///
    /// Empty when the failure happened at the top level.
    pub fn path(&self) -> &[u32] {
        &self.path
    }

    /// Record that this error surfaced while decoding `field_number`.
    ///
    /// Called on the way out of each recursion level, so the outermost field
    /// ends up first.
    pub(crate) fn at_field(mut self, field_number: u32) -> Self {
        self.path.insert(0, field_number);
        self
    }
}

impl From<DecodeErrorKind> for DecodeError {
    fn from(kind: DecodeErrorKind) -> Self {
        DecodeError {
            kind,
            path: Vec::new(),
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for field_number in &self.path {
            write!(f, "at field {field_number}: ")?;
        }
        write!(f, "{}", self.kind)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DecodeError {}

/// The reason an encode failed, without location context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeErrorKind {
    /// Field number outside `[1, 2^29 - 1]`.
    InvalidFieldNumber { value: u32 },
    /// A `repeated` value whose elements differ in type or shape.
    HeterogeneousRepeated { field_number: u32 },
    /// A map key value of a type protobuf does not permit.
    InvalidMapKeyType {
        field_number: u32,
        type_name: &'static str,
    },
    /// Nesting deeper than the configured maximum.
    DepthExceeded { limit: usize },
}

impl fmt::Display for EncodeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeErrorKind::InvalidFieldNumber { value } => {
                write!(f, "invalid field number: {value}")
            }
            EncodeErrorKind::HeterogeneousRepeated { field_number } => {
                write!(
                    f,
                    "repeated field {field_number} mixes element types or shapes"
                )
            }
            EncodeErrorKind::InvalidMapKeyType {
                field_number,
                type_name,
            } => {
                write!(
                    f,
                    "map field {field_number}: {type_name} is not a valid map key type"
                )
            }
            EncodeErrorKind::DepthExceeded { limit } => {
                write!(f, "message nesting exceeds the depth limit of {limit}")
            }
        }
    }
}

/// An encode failure: the kind plus the field-number path leading to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeError {
    kind: EncodeErrorKind,
    path: Vec<u32>,
}

impl EncodeError {
    /// The structured reason for the failure.
    pub fn kind(&self) -> EncodeErrorKind {
        self.kind
    }

    /// Field numbers from the outermost message to the failure site.
    pub fn path(&self) -> &[u32] {
        &self.path
    }

    pub(crate) fn at_field(mut self, field_number: u32) -> Self {
        self.path.insert(0, field_number);
        self
    }
}

impl From<EncodeErrorKind> for EncodeError {
    fn from(kind: EncodeErrorKind) -> Self {
        EncodeError {
            kind,
            path: Vec::new(),
        }
    }
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for field_number in &self.path {
            write!(f, "at field {field_number}: ")?;
        }
        write!(f, "{}", self.kind)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for EncodeError {}

/// A malformed schema, reported by [`validate_schema`](crate::validate_schema).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaError {
    /// Field number outside `[1, 2^29 - 1]`.
    InvalidFieldNumber { value: u32 },
    /// The same field number declared twice in one message.
    DuplicateFieldNumber { field_number: u32 },
    /// A map key type protobuf does not permit.
    InvalidMapKeyType {
        field_number: u32,
        type_name: &'static str,
    },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaError::InvalidFieldNumber { value } => {
                write!(f, "invalid field number: {value}")
            }
            SchemaError::DuplicateFieldNumber { field_number } => {
                write!(f, "field number {field_number} declared more than once")
            }
            SchemaError::InvalidMapKeyType {
                field_number,
                type_name,
            } => {
                write!(
                    f,
                    "map field {field_number}: {type_name} is not a valid map key type"
                )
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for SchemaError {}
