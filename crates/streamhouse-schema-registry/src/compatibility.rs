//! Schema Compatibility Checking
//!
//! Used by the in-memory backend to emulate a registry's compatibility
//! policy. Only the structural rules needed for record evolution are
//! covered: added reader fields need defaults, shared fields must have
//! matching (or promotable) types.

use crate::types::CompatibilityMode;
use apache_avro::Schema as AvroSchema;

/// Check whether `candidate` may be registered after `existing` under `mode`.
pub fn check_compatibility(
    existing: &AvroSchema,
    candidate: &AvroSchema,
    mode: CompatibilityMode,
) -> bool {
    match mode {
        CompatibilityMode::Backward | CompatibilityMode::BackwardTransitive => {
            // New schema reads data written with the old one
            can_read(candidate, existing)
        }
        CompatibilityMode::Forward | CompatibilityMode::ForwardTransitive => {
            can_read(existing, candidate)
        }
        CompatibilityMode::Full | CompatibilityMode::FullTransitive => {
            can_read(candidate, existing) && can_read(existing, candidate)
        }
        CompatibilityMode::None => true,
    }
}

/// True when data written with `writer` can be resolved into `reader`.
pub fn can_read(reader: &AvroSchema, writer: &AvroSchema) -> bool {
    match (reader, writer) {
        (r, w) if r == w => true,

        (AvroSchema::Record(r), AvroSchema::Record(w)) => {
            if r.name != w.name {
                return false;
            }

            r.fields.iter().all(|reader_field| {
                match w.fields.iter().find(|f| f.name == reader_field.name) {
                    Some(writer_field) => can_read(&reader_field.schema, &writer_field.schema),
                    None => reader_field.default.is_some(),
                }
            })
        }

        (AvroSchema::Union(r), AvroSchema::Union(w)) => w
            .variants()
            .iter()
            .all(|wv| r.variants().iter().any(|rv| can_read(rv, wv))),
        (AvroSchema::Union(r), w) => r.variants().iter().any(|rv| can_read(rv, w)),

        _ => primitive_promotable(reader, writer),
    }
}

fn primitive_promotable(reader: &AvroSchema, writer: &AvroSchema) -> bool {
    matches!(
        (reader, writer),
        (AvroSchema::Long, AvroSchema::Int)
            | (AvroSchema::Float, AvroSchema::Int)
            | (AvroSchema::Float, AvroSchema::Long)
            | (AvroSchema::Double, AvroSchema::Int)
            | (AvroSchema::Double, AvroSchema::Long)
            | (AvroSchema::Double, AvroSchema::Float)
            | (AvroSchema::String, AvroSchema::Bytes)
            | (AvroSchema::Bytes, AvroSchema::String)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> AvroSchema {
        AvroSchema::parse_str(s).unwrap()
    }

    const V1: &str =
        r#"{"type": "record", "name": "User", "fields": [{"name": "name", "type": "string"}]}"#;

    #[test]
    fn test_same_schema_compatible() {
        let v1 = parse(V1);
        assert!(check_compatibility(&v1, &v1, CompatibilityMode::Full));
    }

    #[test]
    fn test_backward_compatible_new_field_with_default() {
        let v1 = parse(V1);
        let v2 = parse(
            r#"{"type": "record", "name": "User", "fields": [{"name": "name", "type": "string"}, {"name": "age", "type": "int", "default": 0}]}"#,
        );

        assert!(check_compatibility(&v1, &v2, CompatibilityMode::Backward));
        // Old readers simply drop the new field
        assert!(check_compatibility(&v1, &v2, CompatibilityMode::Forward));
    }

    #[test]
    fn test_backward_incompatible_new_required_field() {
        let v1 = parse(V1);
        let v2 = parse(
            r#"{"type": "record", "name": "User", "fields": [{"name": "name", "type": "string"}, {"name": "age", "type": "int"}]}"#,
        );

        assert!(!check_compatibility(&v1, &v2, CompatibilityMode::Backward));
        assert!(check_compatibility(&v1, &v2, CompatibilityMode::None));
    }

    #[test]
    fn test_type_promotion() {
        let int = parse(r#"{"type": "record", "name": "N", "fields": [{"name": "v", "type": "int"}]}"#);
        let long = parse(r#"{"type": "record", "name": "N", "fields": [{"name": "v", "type": "long"}]}"#);

        assert!(can_read(&long, &int));
        assert!(!can_read(&int, &long));
    }
}
