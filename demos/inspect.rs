//! Schemaless inspection of a wire message, then a typed decode of the same
//! bytes once a schema is supplied.
//!
//! Run with: `cargo run --example inspect`

use protodyn::{Field, FieldType, Value, ValueType};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A message produced by some other system.
    let fields = vec![
        Field::new(1, Value::String("sensor-7".into())),
        Field::new(2, Value::Uint64(1_722_550_000)),
        Field::new(
            3,
            Value::Repeated(vec![
                Value::Double(21.5),
                Value::Double(21.7),
                Value::Double(21.4),
            ]),
        ),
        Field::new(
            4,
            Value::Map(vec![(
                Value::String("unit".into()),
                Value::String("celsius".into()),
            )]),
        ),
    ];
    let wire = protodyn::to_bytes(&fields)?;
    println!("{} bytes on the wire", wire.len());

    // First pass: no schema, just the raw structure.
    println!("\nraw records:");
    for record in protodyn::from_raw_bytes(&wire[..])? {
        println!(
            "  field {:>2}  {:?}  {} byte payload",
            record.field_number,
            record.wire_type,
            record.payload.len()
        );
    }

    // Second pass: full typed decode under a schema.
    let schema = vec![
        FieldType::new(1, ValueType::String),
        FieldType::new(2, ValueType::Uint64),
        FieldType::new(3, ValueType::Repeated(Box::new(ValueType::Double))),
        FieldType::new(
            4,
            ValueType::Map(Box::new(ValueType::String), Box::new(ValueType::String)),
        ),
    ];
    println!("\ntyped fields:");
    for field in protodyn::from_bytes(&wire[..], &schema)? {
        println!("  field {:>2} = {:?}", field.field_number, field.value);
    }

    Ok(())
}
