//! Hostile-input behavior: truncation at every offset, resource-exhaustion
//! guards, and malformed caller-supplied raw fields.

use bytes::Bytes;
use protodyn::{
    DecodeErrorKind, DecodeOptions, Field, FieldType, RawField, Value, ValueType, WireType,
};

/// A representative valid message used as the truncation target.
fn sample_message() -> (Vec<u8>, Vec<FieldType>) {
    let fields = vec![
        Field::new(1, Value::Uint64(150)),
        Field::new(2, Value::String("payload".into())),
        Field::new(
            3,
            Value::Message(vec![Field::new(1, Value::Sfixed64(-5))]),
        ),
        Field::new(
            4,
            Value::Repeated(vec![Value::Int32(1), Value::Int32(2), Value::Int32(3)]),
        ),
    ];
    let schema = vec![
        FieldType::new(1, ValueType::Uint64),
        FieldType::new(2, ValueType::String),
        FieldType::new(
            3,
            ValueType::Message(vec![FieldType::new(1, ValueType::Sfixed64)]),
        ),
        FieldType::new(4, ValueType::Repeated(Box::new(ValueType::Int32))),
    ];
    (protodyn::to_bytes(&fields).unwrap(), schema)
}

#[test]
fn every_truncation_point_fails_cleanly_or_yields_a_prefix() {
    let (encoded, _) = sample_message();
    let full = protodyn::from_raw_bytes(&encoded[..]).unwrap();

    for cut in 0..encoded.len() {
        match protodyn::from_raw_bytes(&encoded[..cut]) {
            // A cut on a record boundary yields exactly the leading records.
            Ok(records) => {
                assert!(records.len() < full.len());
                assert_eq!(records[..], full[..records.len()]);
            }
            Err(err) => assert_eq!(err.kind(), DecodeErrorKind::Truncated),
        }
    }
}

#[test]
fn typed_decode_of_truncated_input_never_panics() {
    let (encoded, schema) = sample_message();
    for cut in 0..encoded.len() {
        // Either a clean error or a structurally valid prefix decode.
        let _ = protodyn::from_bytes(&encoded[..cut], &schema);
    }
}

#[test]
fn eleven_byte_varint_rejected() {
    let mut wire = vec![0x08];
    wire.extend_from_slice(&[0x80; 10]);
    wire.push(0x00);
    let err = protodyn::from_raw_bytes(&wire[..]).unwrap_err();
    assert_eq!(err.kind(), DecodeErrorKind::VarintTooLong);
}

#[test]
fn ten_byte_varint_overflowing_u64_rejected() {
    // Ten bytes whose final byte carries more than the top bit of u64.
    let wire = [
        0x08, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x7f,
    ];
    let err = protodyn::from_raw_bytes(&wire[..]).unwrap_err();
    assert_eq!(err.kind(), DecodeErrorKind::VarintTooLong);
}

#[test]
fn giant_length_prefix_stopped_by_limit() {
    // Claims a ~2^62 byte payload; must fail before allocating anything.
    let wire = [
        0x0a, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x40,
    ];
    let err = protodyn::from_raw_bytes(&wire[..]).unwrap_err();
    assert!(matches!(
        err.kind(),
        DecodeErrorKind::LengthExceeded { .. }
    ));
}

#[test]
fn length_prefix_just_over_configured_limit() {
    let opts = DecodeOptions {
        max_len: 4,
        ..DecodeOptions::default()
    };
    // Length 5 payload with max_len 4.
    let wire = [0x0a, 0x05, 1, 2, 3, 4, 5];
    let err = protodyn::from_raw_bytes_with(&wire[..], &opts).unwrap_err();
    assert_eq!(
        err.kind(),
        DecodeErrorKind::LengthExceeded {
            length: 5,
            limit: 4
        }
    );

    // At the limit it parses.
    let wire = [0x0a, 0x04, 1, 2, 3, 4];
    assert!(protodyn::from_raw_bytes_with(&wire[..], &opts).is_ok());
}

#[test]
fn nesting_bomb_stopped_by_depth_limit() {
    // 120 nested messages around a single varint, decoded under the default
    // 100-level guard. Each wrap reuses the encoder on a bytes field, which
    // produces exactly one length-delimited record around the previous body.
    let mut schema = vec![FieldType::new(1, ValueType::Uint64)];
    let mut body = protodyn::to_bytes(&[Field::new(1, Value::Uint64(1))]).unwrap();
    for _ in 0..120 {
        schema = vec![FieldType::new(1, ValueType::Message(schema))];
        body = protodyn::to_bytes(&[Field::new(1, Value::Bytes(Bytes::from(body)))]).unwrap();
    }

    let err = protodyn::from_bytes(&body[..], &schema).unwrap_err();
    assert_eq!(err.kind(), DecodeErrorKind::DepthExceeded { limit: 100 });
}

#[test]
fn deep_nesting_within_limit_succeeds() {
    // 30 levels, well inside the default guard.
    let mut value = Value::Uint64(9);
    let mut value_type = ValueType::Uint64;
    for _ in 0..30 {
        value = Value::Message(vec![Field::new(1, value)]);
        value_type = ValueType::Message(vec![FieldType::new(1, value_type)]);
    }
    let fields = vec![Field::new(1, value)];
    let schema = vec![FieldType::new(1, value_type)];

    let encoded = protodyn::to_bytes(&fields).unwrap();
    assert_eq!(protodyn::from_bytes(&encoded[..], &schema).unwrap(), fields);
}

#[test]
fn encode_depth_bomb_rejected() {
    let mut value = Value::Uint64(1);
    for _ in 0..200 {
        value = Value::Message(vec![Field::new(1, value)]);
    }
    let err = protodyn::to_bytes(&[Field::new(1, value)]).unwrap_err();
    assert!(matches!(
        err.kind(),
        protodyn::EncodeErrorKind::DepthExceeded { .. }
    ));
}

#[test]
fn caller_raw_field_with_garbage_varint_payload() {
    let schema = vec![FieldType::new(1, ValueType::Uint64)];

    // Trailing junk after the varint.
    let raw = [RawField {
        field_number: 1,
        wire_type: WireType::Varint,
        payload: Bytes::from_static(&[0x01, 0x02]),
    }];
    let err = protodyn::from_raw_fields(&raw, &schema).unwrap_err();
    assert_eq!(err.kind(), DecodeErrorKind::InvalidVarint);

    // Unterminated varint.
    let raw = [RawField {
        field_number: 1,
        wire_type: WireType::Varint,
        payload: Bytes::from_static(&[0x80]),
    }];
    let err = protodyn::from_raw_fields(&raw, &schema).unwrap_err();
    assert_eq!(err.kind(), DecodeErrorKind::Truncated);
}

#[test]
fn caller_raw_field_with_short_fixed_payload() {
    let schema = vec![FieldType::new(1, ValueType::Fixed64)];
    let raw = [RawField {
        field_number: 1,
        wire_type: WireType::Fixed64,
        payload: Bytes::from_static(&[1, 2, 3]),
    }];
    let err = protodyn::from_raw_fields(&raw, &schema).unwrap_err();
    assert_eq!(
        err.kind(),
        DecodeErrorKind::LengthMismatch {
            expected: 8,
            actual: 3
        }
    );
}

#[test]
fn map_entry_bombs() {
    let schema = vec![FieldType::new(
        1,
        ValueType::Map(Box::new(ValueType::Int32), Box::new(ValueType::Int32)),
    )];

    // Entry whose key record is truncated.
    let wire = [0x0a, 0x01, 0x08];
    let err = protodyn::from_bytes(&wire[..], &schema).unwrap_err();
    assert_eq!(err.kind(), DecodeErrorKind::Truncated);

    // Entry with a wire-type mismatch on the value.
    let wire = [0x0a, 0x07, 0x08, 0x01, 0x15, 0x01, 0x02, 0x03, 0x04];
    let err = protodyn::from_bytes(&wire[..], &schema).unwrap_err();
    assert_eq!(
        err.kind(),
        DecodeErrorKind::WireTypeMismatch {
            field_number: 2,
            expected: WireType::Varint,
            actual: WireType::Fixed32,
        }
    );
}

#[test]
fn zero_length_input_is_fine() {
    assert_eq!(protodyn::from_raw_bytes(&[][..]).unwrap(), vec![]);
}

#[test]
fn all_single_bytes_handled() {
    // No single byte may panic the raw decoder.
    for byte in 0..=u8::MAX {
        let _ = protodyn::from_raw_bytes(&[byte][..]);
    }
}

#[test]
fn random_byte_soup_never_panics() {
    // A cheap deterministic PRNG; the point is panic-freedom, not coverage.
    let mut state = 0x2545_f491_4f6c_dd1du64;
    let schema = vec![
        FieldType::new(1, ValueType::Uint64),
        FieldType::new(2, ValueType::String),
        FieldType::new(3, ValueType::Repeated(Box::new(ValueType::Sint32))),
    ];
    for _ in 0..512 {
        let mut soup = Vec::with_capacity(32);
        for _ in 0..32 {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            soup.push(u8::try_from(state & 0xff).unwrap());
        }
        let _ = protodyn::from_raw_bytes(&soup[..]);
        let _ = protodyn::from_bytes(&soup[..], &schema);
    }
}
