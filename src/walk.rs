//! Schema-directed traversal: walks a document's schema and body in
//! lockstep, surfacing field boundaries to a visitor without needing a
//! target type. Used by tooling that inspects documents it has no struct
//! for.

use crate::document::parse_header;
use crate::error::{Error, Result};
use crate::limits::DecodeLimits;
use crate::reader::Reader;
use crate::schema::{parse_schema, SchemaField, SchemaKind, SchemaType};

/// What a visitor did with the bytes it was offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// The visitor consumed exactly the offered value from the reader.
    Read,
    /// The visitor did not touch the reader; the walker skips the value.
    Skip,
}

/// Callbacks fired at field boundaries. All methods default to observing
/// nothing: `visit_field` skips, `visit_array_start` descends.
pub trait Visitor {
    fn visit_flags(&mut self, _flags: u8) {}

    fn visit_schema_hash(&mut self, _hash: u32) {}

    /// Offered for scalar fields, scalar slice elements, maps, and delta
    /// slices. A `Visit::Read` return promises the reader advanced exactly
    /// past the value.
    fn visit_field(
        &mut self,
        _name: &str,
        _ty: &SchemaType,
        _r: &mut Reader<'_>,
        _limits: &DecodeLimits,
    ) -> Result<Visit> {
        Ok(Visit::Skip)
    }

    fn visit_struct_start(&mut self, _name: &str) {}

    fn visit_struct_end(&mut self) {}

    /// Offered once per slice, after the walker has consumed the count.
    /// Returning `Visit::Skip` suppresses the element callbacks and the
    /// matching `visit_array_end`.
    fn visit_array_start(&mut self, _name: &str, _elem: &SchemaType, _count: usize) -> Visit {
        Visit::Read
    }

    fn visit_array_end(&mut self) {}
}

pub fn walk<V: Visitor>(doc: &[u8], visitor: &mut V) -> Result<()> {
    walk_with_limits(doc, visitor, DecodeLimits::default())
}

/// Validates a document's framing without a target type: header, schema,
/// and body must parse, and the body must be exactly consumed.
pub fn verify(doc: &[u8]) -> Result<()> {
    verify_with_limits(doc, DecodeLimits::default())
}

pub fn verify_with_limits(doc: &[u8], limits: DecodeLimits) -> Result<()> {
    struct Silent;
    impl Visitor for Silent {}
    walk_with_limits(doc, &mut Silent, limits)
}

pub fn walk_with_limits<V: Visitor>(
    doc: &[u8],
    visitor: &mut V,
    limits: DecodeLimits,
) -> Result<()> {
    let (flags, hash, schema, body) = parse_header(doc, &limits)?;
    visitor.visit_flags(flags);
    visitor.visit_schema_hash(hash);
    if schema.is_empty() {
        // Trusted documents carry no schema to direct the walk.
        return Err(Error::SchemaNotFound(hash));
    }
    let fields = parse_schema(schema, &limits)?;
    let mut r = Reader::new(body);
    walk_fields(&fields, &mut r, visitor, &limits)?;
    if r.bytes_left() != 0 {
        return Err(Error::InvalidDocument(
            "body bytes remain after walking every field",
        ));
    }
    Ok(())
}

fn walk_fields<V: Visitor>(
    fields: &[SchemaField],
    r: &mut Reader<'_>,
    visitor: &mut V,
    limits: &DecodeLimits,
) -> Result<()> {
    for f in fields {
        walk_value(&f.name, &f.ty, r, visitor, limits)?;
    }
    Ok(())
}

fn walk_value<V: Visitor>(
    name: &str,
    ty: &SchemaType,
    r: &mut Reader<'_>,
    visitor: &mut V,
    limits: &DecodeLimits,
) -> Result<()> {
    if ty.wire.is_pointer() {
        // A nil field produces no callback at all.
        match r.read_u8()? {
            0 => return Ok(()),
            1 => return walk_value(name, &ty.without_pointer(), r, visitor, limits),
            b => return Err(Error::Malformed(format!("presence byte {b} out of range"))),
        }
    }
    match &ty.kind {
        SchemaKind::Struct(fields) => {
            visitor.visit_struct_start(name);
            walk_fields(fields, r, visitor, limits)?;
            visitor.visit_struct_end();
            Ok(())
        }
        SchemaKind::Slice(elem) if !elem.wire.is_delta() => {
            let count = r.read_uvarint()? as usize;
            match visitor.visit_array_start(name, elem, count) {
                Visit::Read => {
                    for _ in 0..count {
                        walk_value(name, elem, r, visitor, limits)?;
                    }
                    visitor.visit_array_end();
                    Ok(())
                }
                Visit::Skip => {
                    let plan = elem.skip_plan();
                    for _ in 0..count {
                        plan.skip(r, limits)?;
                    }
                    Ok(())
                }
            }
        }
        // Delta slices, maps, and scalars are offered whole; a skipping
        // visitor gets them consumed by the same rules the decoder's skip
        // path uses.
        _ => match visitor.visit_field(name, ty, r, limits)? {
            Visit::Read => Ok(()),
            Visit::Skip => ty.skip_plan().skip(r, limits),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{DocumentBuilder, SliceBuilder};
    use crate::wire::WireType;

    #[derive(Default)]
    struct Tally {
        fields: Vec<String>,
        arrays: usize,
        array_ends: usize,
        structs: usize,
        struct_ends: usize,
        hash: u32,
    }

    impl Visitor for Tally {
        fn visit_schema_hash(&mut self, hash: u32) {
            self.hash = hash;
        }

        fn visit_field(
            &mut self,
            name: &str,
            _ty: &SchemaType,
            _r: &mut Reader<'_>,
            _limits: &DecodeLimits,
        ) -> Result<Visit> {
            self.fields.push(name.to_string());
            Ok(Visit::Skip)
        }

        fn visit_struct_start(&mut self, _name: &str) {
            self.structs += 1;
        }

        fn visit_struct_end(&mut self) {
            self.struct_ends += 1;
        }

        fn visit_array_start(&mut self, _name: &str, _elem: &SchemaType, _count: usize) -> Visit {
            self.arrays += 1;
            Visit::Read
        }

        fn visit_array_end(&mut self) {
            self.array_ends += 1;
        }
    }

    fn sample_doc() -> Vec<u8> {
        let mut child = DocumentBuilder::new();
        child.append_str("first", "A");
        child.append_int("age", 25);

        let mut names = SliceBuilder::new();
        names.append_str("x");
        names.append_str("y");

        let mut b = DocumentBuilder::new();
        b.append_str("s", "top");
        b.append_struct("child", &child);
        b.append_slice("names", &names);
        b.append_i64("n", 41_263);
        b.bytes()
    }

    #[test]
    fn test_walk_visits_everything_and_exhausts_body() {
        let doc = sample_doc();
        let mut tally = Tally::default();
        walk(&doc, &mut tally).unwrap();
        assert_eq!(tally.fields, vec!["s", "first", "age", "names", "names", "n"]);
        assert_eq!(tally.structs, 1);
        assert_eq!(tally.struct_ends, 1);
        assert_eq!(tally.arrays, 1);
        assert_eq!(tally.array_ends, 1);
        assert_eq!(tally.hash, crate::document::schema_hash(&doc).unwrap());
    }

    #[test]
    fn test_array_skip_suppresses_elements_and_end() {
        struct SkipArrays(Tally);
        impl Visitor for SkipArrays {
            fn visit_field(
                &mut self,
                name: &str,
                ty: &SchemaType,
                r: &mut Reader<'_>,
                limits: &DecodeLimits,
            ) -> Result<Visit> {
                self.0.visit_field(name, ty, r, limits)
            }
            fn visit_array_start(&mut self, _n: &str, _e: &SchemaType, _c: usize) -> Visit {
                self.0.arrays += 1;
                Visit::Skip
            }
            fn visit_array_end(&mut self) {
                self.0.array_ends += 1;
            }
        }

        let doc = sample_doc();
        let mut v = SkipArrays(Tally::default());
        walk(&doc, &mut v).unwrap();
        assert_eq!(v.0.arrays, 1);
        assert_eq!(v.0.array_ends, 0);
        assert_eq!(v.0.fields, vec!["s", "first", "age", "n"]);
    }

    #[test]
    fn test_walk_refuses_trusted_document() {
        let doc = [0u8, 1, 2, 3, 4, 0];
        let mut tally = Tally::default();
        assert!(matches!(
            walk(&doc, &mut tally),
            Err(Error::SchemaNotFound(_))
        ));
    }

    #[test]
    fn test_reading_visitor_must_consume_exactly() {
        struct ReadInts;
        impl Visitor for ReadInts {
            fn visit_field(
                &mut self,
                _name: &str,
                ty: &SchemaType,
                r: &mut Reader<'_>,
                _limits: &DecodeLimits,
            ) -> Result<Visit> {
                if ty.wire == WireType::INT {
                    r.read_isize()?;
                    return Ok(Visit::Read);
                }
                Ok(Visit::Skip)
            }
        }

        let mut b = DocumentBuilder::new();
        b.append_int("a", -4);
        b.append_str("s", "tail");
        let doc = b.bytes();
        walk(&doc, &mut ReadInts).unwrap();
    }
}
