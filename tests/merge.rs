//! Merging semantics: duplicate field numbers on the wire, concatenated
//! messages, and the typed-side `merge_fields` equivalent.

use proptest::prelude::*;
use protodyn::{DecodeErrorKind, Field, FieldType, Value, ValueType};

fn int_repeated_schema() -> Vec<FieldType> {
    vec![FieldType::new(
        1,
        ValueType::Repeated(Box::new(ValueType::Int32)),
    )]
}

#[test]
fn concatenated_wire_messages_merge() {
    let first = protodyn::to_bytes(&[Field::new(
        1,
        Value::Repeated(vec![Value::Int32(1), Value::Int32(2)]),
    )])
    .unwrap();
    let second = protodyn::to_bytes(&[Field::new(
        1,
        Value::Repeated(vec![Value::Int32(3), Value::Int32(4)]),
    )])
    .unwrap();

    let mut combined = first.clone();
    combined.extend_from_slice(&second);

    let schema = int_repeated_schema();
    let decoded = protodyn::from_bytes(&combined[..], &schema).unwrap();
    assert_eq!(
        decoded,
        vec![Field::new(
            1,
            Value::Repeated(vec![
                Value::Int32(1),
                Value::Int32(2),
                Value::Int32(3),
                Value::Int32(4)
            ])
        )]
    );
}

#[test]
fn concatenation_equals_typed_merge() {
    // Decoding concatenated bytes gives the same result as decoding each
    // half and merging the typed fields.
    let first_fields = vec![
        Field::new(1, Value::Repeated(vec![Value::Int32(5)])),
        Field::new(2, Value::Uint64(7)),
    ];
    let second_fields = vec![
        Field::new(1, Value::Repeated(vec![Value::Int32(6)])),
        Field::new(3, Value::String("tail".into())),
    ];
    let schema = vec![
        FieldType::new(1, ValueType::Repeated(Box::new(ValueType::Int32))),
        FieldType::new(2, ValueType::Uint64),
        FieldType::new(3, ValueType::String),
    ];

    let first = protodyn::to_bytes(&first_fields).unwrap();
    let second = protodyn::to_bytes(&second_fields).unwrap();
    let mut combined = first.clone();
    combined.extend_from_slice(&second);

    let from_wire = protodyn::from_bytes(&combined[..], &schema).unwrap();

    let a = protodyn::from_bytes(&first[..], &schema).unwrap();
    let b = protodyn::from_bytes(&second[..], &schema).unwrap();
    let merged = protodyn::merge_fields(a, b).unwrap();

    // Wire decode returns schema order; the typed merge keeps base order and
    // appends, which coincides here by construction.
    assert_eq!(from_wire, merged);
}

#[test]
fn singular_scalar_occurrences_all_preserved() {
    let schema = vec![FieldType::new(1, ValueType::Uint64)];
    // Field 1 three times: proto3 last-wins would keep only 3.
    let wire = [0x08, 0x01, 0x08, 0x02, 0x08, 0x03];
    let decoded = protodyn::from_bytes(&wire[..], &schema).unwrap();
    assert_eq!(
        decoded,
        vec![Field::new(
            1,
            Value::Repeated(vec![
                Value::Uint64(1),
                Value::Uint64(2),
                Value::Uint64(3)
            ])
        )]
    );

    // Last-wins consumers take the final element.
    match &decoded[0].value {
        Value::Repeated(values) => assert_eq!(values.last(), Some(&Value::Uint64(3))),
        other => panic!("unexpected value {other:?}"),
    }
}

#[test]
fn duplicate_message_occurrences_promote_to_repeated() {
    let schema = vec![FieldType::new(
        1,
        ValueType::Message(vec![FieldType::new(1, ValueType::Uint64)]),
    )];
    // Two submessage records for field 1.
    let wire = [0x0a, 0x02, 0x08, 0x01, 0x0a, 0x02, 0x08, 0x02];
    let decoded = protodyn::from_bytes(&wire[..], &schema).unwrap();
    assert_eq!(
        decoded,
        vec![Field::new(
            1,
            Value::Repeated(vec![
                Value::Message(vec![Field::new(1, Value::Uint64(1))]),
                Value::Message(vec![Field::new(1, Value::Uint64(2))]),
            ])
        )]
    );
}

#[test]
fn map_occurrences_concatenate_preserving_duplicates() {
    let schema = vec![FieldType::new(
        1,
        ValueType::Map(Box::new(ValueType::Int32), Box::new(ValueType::Int32)),
    )];
    // Same key twice with different values: both retained, wire order.
    let fields = vec![Field::new(
        1,
        Value::Map(vec![
            (Value::Int32(1), Value::Int32(10)),
            (Value::Int32(1), Value::Int32(20)),
        ]),
    )];
    let encoded = protodyn::to_bytes(&fields).unwrap();
    let decoded = protodyn::from_bytes(&encoded[..], &schema).unwrap();
    assert_eq!(decoded, fields);
}

#[test]
fn merge_fields_promotes_singular_pair() {
    let merged = protodyn::merge_fields(
        vec![Field::new(1, Value::Uint64(1))],
        vec![Field::new(1, Value::Uint64(2))],
    )
    .unwrap();
    assert_eq!(
        merged,
        vec![Field::new(
            1,
            Value::Repeated(vec![Value::Uint64(1), Value::Uint64(2)])
        )]
    );
}

#[test]
fn merge_fields_appends_scalar_to_promoted_repeated() {
    let base = protodyn::merge_fields(
        vec![Field::new(1, Value::Uint64(1))],
        vec![Field::new(1, Value::Uint64(2))],
    )
    .unwrap();
    let merged = protodyn::merge_fields(base, vec![Field::new(1, Value::Uint64(3))]).unwrap();
    assert_eq!(
        merged,
        vec![Field::new(
            1,
            Value::Repeated(vec![
                Value::Uint64(1),
                Value::Uint64(2),
                Value::Uint64(3)
            ])
        )]
    );
}

#[test]
fn merge_fields_concatenates_maps() {
    let merged = protodyn::merge_fields(
        vec![Field::new(
            1,
            Value::Map(vec![(Value::Int32(1), Value::Int32(10))]),
        )],
        vec![Field::new(
            1,
            Value::Map(vec![(Value::Int32(2), Value::Int32(20))]),
        )],
    )
    .unwrap();
    assert_eq!(
        merged,
        vec![Field::new(
            1,
            Value::Map(vec![
                (Value::Int32(1), Value::Int32(10)),
                (Value::Int32(2), Value::Int32(20)),
            ])
        )]
    );
}

#[test]
fn merge_fields_rejects_shape_conflicts() {
    let err = protodyn::merge_fields(
        vec![Field::new(1, Value::Uint64(1))],
        vec![Field::new(1, Value::String("one".into()))],
    )
    .unwrap_err();
    assert_eq!(
        err.kind(),
        DecodeErrorKind::MergeConflict {
            field_number: 1,
            existing: "uint64",
            incoming: "string",
        }
    );

    let err = protodyn::merge_fields(
        vec![Field::new(1, Value::Repeated(vec![Value::Int32(1)]))],
        vec![Field::new(1, Value::Repeated(vec![Value::Bool(true)]))],
    )
    .unwrap_err();
    assert_eq!(
        err.kind(),
        DecodeErrorKind::MergeConflict {
            field_number: 1,
            existing: "int32",
            incoming: "bool",
        }
    );
}

#[test]
fn merge_fields_empty_sides() {
    let fields = vec![Field::new(1, Value::Uint64(1))];
    assert_eq!(
        protodyn::merge_fields(fields.clone(), vec![]).unwrap(),
        fields
    );
    assert_eq!(
        protodyn::merge_fields(vec![], fields.clone()).unwrap(),
        fields
    );
}

proptest! {
    #[test]
    fn proptest_concatenation_associativity(
        left in proptest::collection::vec(any::<i32>(), 0..16),
        right in proptest::collection::vec(any::<i32>(), 0..16),
    ) {
        let to_fields = |values: &[i32]| {
            vec![Field::new(
                1,
                Value::Repeated(values.iter().copied().map(Value::Int32).collect()),
            )]
        };
        let schema = int_repeated_schema();

        let a = protodyn::to_bytes(&to_fields(&left)).unwrap();
        let b = protodyn::to_bytes(&to_fields(&right)).unwrap();
        let mut combined = a.clone();
        combined.extend_from_slice(&b);

        let from_wire = protodyn::from_bytes(&combined[..], &schema).unwrap();
        let merged = protodyn::merge_fields(
            protodyn::from_bytes(&a[..], &schema).unwrap(),
            protodyn::from_bytes(&b[..], &schema).unwrap(),
        )
        .unwrap();
        prop_assert_eq!(from_wire, merged.clone());

        // And the merged result matches decoding the concatenated elements
        // directly.
        let mut all = left.clone();
        all.extend_from_slice(&right);
        let expected = protodyn::from_bytes(
            &protodyn::to_bytes(&to_fields(&all)).unwrap()[..],
            &schema,
        )
        .unwrap();
        prop_assert_eq!(merged, expected);
    }
}
