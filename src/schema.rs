//! Schema parsing and schema-directed skipping.
//!
//! A schema is an ordered list of `wire-type | name-length | name` entries,
//! with sub-schemas inlined after struct entries, element types after slice
//! entries, and key/value types after map entries. The parser materialises
//! the whole tree once per unseen schema hash; everything downstream (the
//! matcher, the walker, skip plans) works off the tree.

use crate::error::{Error, Result};
use crate::limits::DecodeLimits;
use crate::reader::Reader;
use crate::wire::WireType;

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaField {
    pub name: String,
    pub ty: SchemaType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaType {
    pub wire: WireType,
    pub kind: SchemaKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SchemaKind {
    Scalar,
    Struct(Vec<SchemaField>),
    Slice(Box<SchemaType>),
    Map {
        key: WireType,
        value: Box<SchemaType>,
    },
}

impl SchemaType {
    pub(crate) fn scalar(wire: WireType) -> SchemaType {
        SchemaType {
            wire,
            kind: SchemaKind::Scalar,
        }
    }

    /// The same type with the pointer modifier cleared; used after a
    /// presence byte has been consumed.
    pub(crate) fn without_pointer(&self) -> SchemaType {
        SchemaType {
            wire: self.wire.without_pointer(),
            kind: self.kind.clone(),
        }
    }

    /// Compiles the byte-exact skip action for a value of this type.
    pub fn skip_plan(&self) -> SkipPlan {
        let inner = match &self.kind {
            SchemaKind::Scalar => scalar_plan(self.wire),
            SchemaKind::Struct(fields) => {
                SkipPlan::Struct(fields.iter().map(|f| f.ty.skip_plan()).collect())
            }
            SchemaKind::Slice(elem) => {
                if elem.wire.is_delta() {
                    SkipPlan::DeltaSlice(Box::new(scalar_plan(elem.wire.base())))
                } else {
                    SkipPlan::Slice(Box::new(elem.skip_plan()))
                }
            }
            SchemaKind::Map { key, value } => SkipPlan::Map(
                Box::new(scalar_plan(*key)),
                Box::new(value.skip_plan()),
            ),
        };
        if self.wire.is_pointer() {
            SkipPlan::Pointer(Box::new(inner))
        } else {
            inner
        }
    }
}

fn scalar_plan(wire: WireType) -> SkipPlan {
    match wire.base() {
        WireType::BOOL | WireType::INT8 | WireType::UINT8 => SkipPlan::Byte,
        WireType::STRING | WireType::BYTES | WireType::TIME => SkipPlan::LenPrefixed,
        _ => SkipPlan::Varint,
    }
}

/// Compiled skip action for one field: consumes exactly the field's bytes
/// without writing anywhere. The pointer variant consumes the presence byte
/// first and returns immediately on zero.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipPlan {
    Byte,
    Varint,
    LenPrefixed,
    Pointer(Box<SkipPlan>),
    Slice(Box<SkipPlan>),
    /// Count, first value by the inner plan, then `count - 1` varints.
    DeltaSlice(Box<SkipPlan>),
    Struct(Vec<SkipPlan>),
    Map(Box<SkipPlan>, Box<SkipPlan>),
}

impl SkipPlan {
    pub fn skip(&self, r: &mut Reader<'_>, limits: &DecodeLimits) -> Result<()> {
        match self {
            SkipPlan::Byte => r.skip(1),
            SkipPlan::Varint => r.skip_uvarint(),
            SkipPlan::LenPrefixed => {
                let len = r.read_uvarint()? as usize;
                r.skip(len)
            }
            SkipPlan::Pointer(inner) => match r.read_u8()? {
                0 => Ok(()),
                1 => inner.skip(r, limits),
                b => Err(Error::Malformed(format!("presence byte {b} out of range"))),
            },
            SkipPlan::Slice(elem) => {
                let count = r.read_uvarint()?;
                // An element that spans zero bytes makes the loop a no-op
                // regardless of count.
                if matches!(**elem, SkipPlan::Struct(ref plans) if plans.is_empty()) {
                    return Ok(());
                }
                for _ in 0..count {
                    elem.skip(r, limits)?;
                }
                Ok(())
            }
            SkipPlan::DeltaSlice(first) => {
                let count = r.read_uvarint()?;
                if count == 0 {
                    return Ok(());
                }
                first.skip(r, limits)?;
                for _ in 1..count {
                    r.skip_uvarint()?;
                }
                Ok(())
            }
            SkipPlan::Struct(fields) => {
                for f in fields {
                    f.skip(r, limits)?;
                }
                Ok(())
            }
            SkipPlan::Map(key, value) => {
                let count = r.read_uvarint()?;
                for _ in 0..count {
                    key.skip(r, limits)?;
                    value.skip(r, limits)?;
                }
                Ok(())
            }
        }
    }
}

/// Parses a schema byte range into its field tree. The range must be
/// exactly one schema: trailing bytes are malformed.
pub fn parse_schema(bytes: &[u8], limits: &DecodeLimits) -> Result<Vec<SchemaField>> {
    limits.check_schema(bytes.len())?;
    let mut r = Reader::new(bytes);
    let fields = parse_fields(&mut r, limits)?;
    debug_assert_eq!(r.bytes_left(), 0);
    Ok(fields)
}

fn parse_fields(r: &mut Reader<'_>, limits: &DecodeLimits) -> Result<Vec<SchemaField>> {
    let mut fields = Vec::new();
    while r.bytes_left() > 0 {
        let wire = WireType::from_wire(r.read_uvarint()?)?;
        let name_len = r.read_u8()? as usize;
        let name = std::str::from_utf8(r.read(name_len)?)
            .map_err(|e| Error::Malformed(format!("invalid utf-8 in field name: {e}")))?
            .to_string();
        let ty = parse_type(r, wire, limits)?;
        fields.push(SchemaField { name, ty });
    }
    Ok(fields)
}

/// Parses the type suffix that follows a wire byte (and, for fields, the
/// name). Slices recurse through their element chain, structs carry an
/// inline sub-schema, maps carry key and value types.
fn parse_type(r: &mut Reader<'_>, wire: WireType, limits: &DecodeLimits) -> Result<SchemaType> {
    if wire.is_delta() && !wire.is_integer() {
        return Err(Error::Malformed(format!(
            "delta modifier on non-integer wire type {wire}"
        )));
    }
    if wire.is_slice() {
        let elem_wire = WireType::from_wire(r.read_uvarint()?)?;
        let elem = parse_type(r, elem_wire, limits)?;
        return Ok(SchemaType {
            wire,
            kind: SchemaKind::Slice(Box::new(elem)),
        });
    }
    match wire.base() {
        WireType::STRUCT => {
            let sub_len = r.read_len("schema", limits.max_schema_size)?;
            let sub_bytes = r.read(sub_len)?;
            let mut sub = Reader::new(sub_bytes);
            let fields = parse_fields(&mut sub, limits)?;
            Ok(SchemaType {
                wire,
                kind: SchemaKind::Struct(fields),
            })
        }
        WireType::MAP => {
            let key = WireType::from_wire(r.read_uvarint()?)?;
            if key.base() == WireType::STRUCT
                || key.base() == WireType::MAP
                || key.is_slice()
            {
                return Err(Error::Malformed(format!(
                    "map key wire type {key} is not a scalar"
                )));
            }
            let value_wire = WireType::from_wire(r.read_uvarint()?)?;
            let value = parse_type(r, value_wire, limits)?;
            Ok(SchemaType {
                wire,
                kind: SchemaKind::Map {
                    key,
                    value: Box::new(value),
                },
            })
        }
        _ => Ok(SchemaType {
            wire,
            kind: SchemaKind::Scalar,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::varint::append_uvarint;

    fn field(schema: &mut Vec<u8>, wire: WireType, name: &str) {
        append_uvarint(schema, wire.on_wire() as u64);
        schema.push(name.len() as u8);
        schema.extend_from_slice(name.as_bytes());
    }

    #[test]
    fn test_parse_scalars() {
        let mut schema = Vec::new();
        field(&mut schema, WireType::STRING, "name");
        field(&mut schema, WireType::INT, "age");
        let fields = parse_schema(&schema, &DecodeLimits::default()).unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].name, "name");
        assert_eq!(fields[0].ty.wire, WireType::STRING);
        assert_eq!(fields[1].name, "age");
        assert_eq!(fields[1].ty.kind, SchemaKind::Scalar);
    }

    #[test]
    fn test_parse_nested_struct() {
        let mut sub = Vec::new();
        field(&mut sub, WireType::STRING, "first");
        field(&mut sub, WireType::INT, "age");

        let mut schema = Vec::new();
        field(&mut schema, WireType::STRUCT, "child");
        append_uvarint(&mut schema, sub.len() as u64);
        schema.extend_from_slice(&sub);

        let fields = parse_schema(&schema, &DecodeLimits::default()).unwrap();
        match &fields[0].ty.kind {
            SchemaKind::Struct(sub_fields) => {
                assert_eq!(sub_fields.len(), 2);
                assert_eq!(sub_fields[1].name, "age");
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn test_parse_nested_slice_chain() {
        // [][]int32
        let mut schema = Vec::new();
        field(&mut schema, WireType::INT32.with_slice(), "grid");
        append_uvarint(&mut schema, WireType::INT32.with_slice().on_wire() as u64);
        append_uvarint(&mut schema, WireType::INT32.on_wire() as u64);

        let fields = parse_schema(&schema, &DecodeLimits::default()).unwrap();
        let SchemaKind::Slice(inner) = &fields[0].ty.kind else {
            panic!("expected slice");
        };
        let SchemaKind::Slice(leaf) = &inner.kind else {
            panic!("expected nested slice");
        };
        assert_eq!(leaf.wire, WireType::INT32);
    }

    #[test]
    fn test_parse_map() {
        let mut schema = Vec::new();
        field(&mut schema, WireType::MAP, "labels");
        append_uvarint(&mut schema, WireType::STRING.on_wire() as u64);
        append_uvarint(&mut schema, WireType::INT64.on_wire() as u64);

        let fields = parse_schema(&schema, &DecodeLimits::default()).unwrap();
        match &fields[0].ty.kind {
            SchemaKind::Map { key, value } => {
                assert_eq!(*key, WireType::STRING);
                assert_eq!(value.wire, WireType::INT64);
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn test_reject_struct_map_key() {
        let mut schema = Vec::new();
        field(&mut schema, WireType::MAP, "bad");
        append_uvarint(&mut schema, WireType::STRUCT.on_wire() as u64);
        append_uvarint(&mut schema, WireType::INT.on_wire() as u64);
        assert!(parse_schema(&schema, &DecodeLimits::default()).is_err());
    }

    #[test]
    fn test_reject_delta_on_string() {
        let mut schema = Vec::new();
        field(&mut schema, WireType::STRING.with_slice(), "bad");
        append_uvarint(
            &mut schema,
            WireType::STRING.with_delta().on_wire() as u64,
        );
        assert!(parse_schema(&schema, &DecodeLimits::default()).is_err());
    }

    #[test]
    fn test_schema_size_cap() {
        let mut schema = Vec::new();
        field(&mut schema, WireType::STRING, "name");
        let limits = DecodeLimits {
            max_schema_size: 2,
            ..DecodeLimits::default()
        };
        assert!(matches!(
            parse_schema(&schema, &limits),
            Err(Error::BoundsExceeded { what: "schema", .. })
        ));
    }

    #[test]
    fn test_skip_scalars() {
        let ty = SchemaType::scalar(WireType::INT32);
        let mut body = Vec::new();
        append_uvarint(&mut body, crate::varint::zigzag(-500));
        body.push(7);
        let mut r = Reader::new(&body);
        ty.skip_plan().skip(&mut r, &DecodeLimits::default()).unwrap();
        assert_eq!(r.bytes_left(), 1);
    }

    #[test]
    fn test_skip_pointer_nil() {
        let ty = SchemaType::scalar(WireType::STRING.with_pointer());
        let body = [0u8, 9];
        let mut r = Reader::new(&body);
        ty.skip_plan().skip(&mut r, &DecodeLimits::default()).unwrap();
        assert_eq!(r.bytes_left(), 1);
    }

    #[test]
    fn test_skip_delta_slice() {
        // count=3, first raw zigzag varint, then two deltas.
        let ty = SchemaType {
            wire: WireType::INT32.with_slice(),
            kind: SchemaKind::Slice(Box::new(SchemaType::scalar(
                WireType::INT32.with_delta(),
            ))),
        };
        let mut body = Vec::new();
        append_uvarint(&mut body, 3);
        append_uvarint(&mut body, crate::varint::zigzag(10));
        append_uvarint(&mut body, crate::varint::zigzag(5));
        append_uvarint(&mut body, crate::varint::zigzag(-5));
        let mut r = Reader::new(&body);
        ty.skip_plan().skip(&mut r, &DecodeLimits::default()).unwrap();
        assert_eq!(r.bytes_left(), 0);
    }

    #[test]
    fn test_skip_map() {
        let ty = SchemaType {
            wire: WireType::MAP,
            kind: SchemaKind::Map {
                key: WireType::STRING,
                value: Box::new(SchemaType::scalar(WireType::BOOL)),
            },
        };
        let mut body = Vec::new();
        append_uvarint(&mut body, 2);
        for (k, v) in [("on", 1u8), ("off", 0)] {
            append_uvarint(&mut body, k.len() as u64);
            body.extend_from_slice(k.as_bytes());
            body.push(v);
        }
        let mut r = Reader::new(&body);
        ty.skip_plan().skip(&mut r, &DecodeLimits::default()).unwrap();
        assert_eq!(r.bytes_left(), 0);
    }

    #[test]
    fn test_skip_empty_struct_elements_cannot_spin() {
        let ty = SchemaType {
            wire: WireType::STRUCT.with_slice(),
            kind: SchemaKind::Slice(Box::new(SchemaType {
                wire: WireType::STRUCT,
                kind: SchemaKind::Struct(Vec::new()),
            })),
        };
        let mut body = Vec::new();
        append_uvarint(&mut body, u64::MAX);
        let mut r = Reader::new(&body);
        ty.skip_plan().skip(&mut r, &DecodeLimits::default()).unwrap();
        assert_eq!(r.bytes_left(), 0);
    }
}
