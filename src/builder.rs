//! Progressive, schemaless document construction. Schema and body grow in
//! two internal buffers as values are appended; `bytes` frames them into a
//! document bit-identical to what the compiled encoder emits for the
//! equivalent record.

use byteorder::{ByteOrder, LittleEndian};

use crate::buffer::Buffer;
use crate::codec::ElementCodec;
use crate::varint::append_uvarint;
use crate::wire::WireType;

#[derive(Default)]
pub struct DocumentBuilder {
    schema: Vec<u8>,
    body: Buffer,
}

impl DocumentBuilder {
    pub fn new() -> DocumentBuilder {
        DocumentBuilder::default()
    }

    pub fn is_empty(&self) -> bool {
        self.schema.is_empty()
    }

    fn push_entry(&mut self, wire: WireType, name: &str) {
        assert!(
            name.len() <= 255,
            "glint field name `{name}` is longer than 255 bytes"
        );
        append_uvarint(&mut self.schema, wire.on_wire() as u64);
        self.schema.push(name.len() as u8);
        self.schema.extend_from_slice(name.as_bytes());
    }

    /// Appends any encodable value under `name`. The named `append_*`
    /// variants below are spellings of this for the common scalar kinds.
    pub fn append<V: ElementCodec>(&mut self, name: &str, value: &V) {
        self.push_entry(V::wire(), name);
        V::append_schema(&mut self.schema);
        value.encode(&mut self.body);
    }

    pub fn append_bool(&mut self, name: &str, v: bool) {
        self.append(name, &v);
    }

    pub fn append_i8(&mut self, name: &str, v: i8) {
        self.append(name, &v);
    }

    pub fn append_i16(&mut self, name: &str, v: i16) {
        self.append(name, &v);
    }

    pub fn append_i32(&mut self, name: &str, v: i32) {
        self.append(name, &v);
    }

    pub fn append_i64(&mut self, name: &str, v: i64) {
        self.append(name, &v);
    }

    pub fn append_int(&mut self, name: &str, v: isize) {
        self.append(name, &v);
    }

    pub fn append_u8(&mut self, name: &str, v: u8) {
        self.append(name, &v);
    }

    pub fn append_u16(&mut self, name: &str, v: u16) {
        self.append(name, &v);
    }

    pub fn append_u32(&mut self, name: &str, v: u32) {
        self.append(name, &v);
    }

    pub fn append_u64(&mut self, name: &str, v: u64) {
        self.append(name, &v);
    }

    pub fn append_uint(&mut self, name: &str, v: usize) {
        self.append(name, &v);
    }

    pub fn append_f32(&mut self, name: &str, v: f32) {
        self.append(name, &v);
    }

    pub fn append_f64(&mut self, name: &str, v: f64) {
        self.append(name, &v);
    }

    pub fn append_str(&mut self, name: &str, v: &str) {
        self.push_entry(WireType::STRING, name);
        self.body.append_str(v);
    }

    pub fn append_bytes(&mut self, name: &str, v: &[u8]) {
        self.push_entry(WireType::BYTES, name);
        self.body.append_byte_slice(v);
    }

    pub fn append_time(&mut self, name: &str, v: std::time::SystemTime) {
        self.append(name, &v);
    }

    /// Appends a nested struct built in its own builder: its schema is
    /// inlined as this field's sub-schema, its body spliced into ours.
    pub fn append_struct(&mut self, name: &str, sub: &DocumentBuilder) {
        self.push_entry(WireType::STRUCT, name);
        append_uvarint(&mut self.schema, sub.schema.len() as u64);
        self.schema.extend_from_slice(&sub.schema);
        self.body.append_raw(sub.body.bytes());
    }

    /// Appends a slice built in a [`SliceBuilder`]: the element schema is
    /// spliced in after the slice wire type, the element bodies after a
    /// count varint.
    pub fn append_slice(&mut self, name: &str, slice: &SliceBuilder) {
        let elem = slice
            .elem
            .as_ref()
            .expect("slice builder has no element type; append an element first");
        self.push_entry(elem.outer, name);
        self.schema.extend_from_slice(&elem.schema);
        self.body.append_uvarint(slice.count);
        self.body.append_raw(slice.body.bytes());
    }

    /// Frames the accumulated schema and body into a complete document.
    pub fn bytes(&self) -> Vec<u8> {
        let mut doc = Vec::with_capacity(6 + self.schema.len() + self.body.len());
        doc.push(0); // flags
        let mut hash = [0u8; 4];
        LittleEndian::write_u32(&mut hash, crc32fast::hash(&self.schema));
        doc.extend_from_slice(&hash);
        append_uvarint(&mut doc, self.schema.len() as u64);
        doc.extend_from_slice(&self.schema);
        doc.extend_from_slice(self.body.bytes());
        doc
    }
}

#[derive(Debug, Clone, PartialEq)]
struct ElemInfo {
    /// The wire type the containing field carries (element base plus the
    /// slice modifier).
    outer: WireType,
    /// Element wire varint plus any element suffix, as spliced into the
    /// outer schema.
    schema: Vec<u8>,
}

/// Builds a slice body (`count | element | …`) plus the element schema the
/// outer document splices in. Every element must share one type.
#[derive(Default)]
pub struct SliceBuilder {
    elem: Option<ElemInfo>,
    count: u64,
    body: Buffer,
}

impl SliceBuilder {
    pub fn new() -> SliceBuilder {
        SliceBuilder::default()
    }

    pub fn len(&self) -> usize {
        self.count as usize
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    fn set_elem(&mut self, info: ElemInfo) {
        match &self.elem {
            None => self.elem = Some(info),
            Some(existing) => assert_eq!(
                *existing, info,
                "slice builder elements must all share one type"
            ),
        }
    }

    /// Appends any encodable element. Byte payloads belong in
    /// [`DocumentBuilder::append_bytes`], not in a slice of `u8`.
    pub fn append<V: ElementCodec>(&mut self, value: &V) {
        let mut schema = Vec::new();
        append_uvarint(&mut schema, V::wire().on_wire() as u64);
        V::append_schema(&mut schema);
        self.set_elem(ElemInfo {
            outer: V::wire().base().with_slice(),
            schema,
        });
        self.count += 1;
        value.encode(&mut self.body);
    }

    pub fn append_bool(&mut self, v: bool) {
        self.append(&v);
    }

    pub fn append_i32(&mut self, v: i32) {
        self.append(&v);
    }

    pub fn append_i64(&mut self, v: i64) {
        self.append(&v);
    }

    pub fn append_int(&mut self, v: isize) {
        self.append(&v);
    }

    pub fn append_u64(&mut self, v: u64) {
        self.append(&v);
    }

    pub fn append_f64(&mut self, v: f64) {
        self.append(&v);
    }

    pub fn append_str(&mut self, v: &str) {
        self.set_elem(ElemInfo {
            outer: WireType::STRING.with_slice(),
            schema: vec![WireType::STRING.on_wire()],
        });
        self.count += 1;
        self.body.append_str(v);
    }

    /// Appends one struct element. All elements must carry an identical
    /// sub-schema.
    pub fn append_struct(&mut self, sub: &DocumentBuilder) {
        let mut schema = vec![WireType::STRUCT.on_wire()];
        append_uvarint(&mut schema, sub.schema.len() as u64);
        schema.extend_from_slice(&sub.schema);
        self.set_elem(ElemInfo {
            outer: WireType::STRUCT.with_slice(),
            schema,
        });
        self.count += 1;
        self.body.append_raw(sub.body.bytes());
    }

    /// Appends one nested-slice element.
    pub fn append_slice(&mut self, inner: &SliceBuilder) {
        let inner_elem = inner
            .elem
            .as_ref()
            .expect("nested slice builder has no element type");
        let mut schema = Vec::new();
        append_uvarint(&mut schema, inner_elem.outer.on_wire() as u64);
        schema.extend_from_slice(&inner_elem.schema);
        self.set_elem(ElemInfo {
            outer: inner_elem.outer.base().with_slice(),
            schema,
        });
        self.count += 1;
        self.body.append_uvarint(inner.count);
        self.body.append_raw(inner.body.bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parse_header;
    use crate::limits::DecodeLimits;
    use crate::schema::{parse_schema, SchemaKind};

    #[test]
    fn test_document_layout() {
        let mut b = DocumentBuilder::new();
        b.append_str("name", "SampleUser");
        b.append_int("age", 30);
        let doc = b.bytes();

        let (flags, hash, schema, body) = parse_header(&doc, &DecodeLimits::default()).unwrap();
        assert_eq!(flags, 0);
        assert_eq!(hash, crc32fast::hash(schema));

        let fields = parse_schema(schema, &DecodeLimits::default()).unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].name, "name");
        assert_eq!(fields[0].ty.wire, WireType::STRING);
        assert_eq!(fields[1].name, "age");
        assert_eq!(fields[1].ty.wire, WireType::INT);

        // length(10) | "SampleUser" | zigzag(30)
        assert_eq!(body[0], 10);
        assert_eq!(&body[1..11], b"SampleUser");
        assert_eq!(body[11], 60);
        assert_eq!(body.len(), 12);
    }

    #[test]
    fn test_nested_struct() {
        let mut child = DocumentBuilder::new();
        child.append_str("first", "A");
        child.append_int("age", 25);

        let mut b = DocumentBuilder::new();
        b.append_struct("child", &child);
        let doc = b.bytes();

        let (_, _, schema, body) = parse_header(&doc, &DecodeLimits::default()).unwrap();
        let fields = parse_schema(schema, &DecodeLimits::default()).unwrap();
        match &fields[0].ty.kind {
            SchemaKind::Struct(sub) => {
                assert_eq!(sub.len(), 2);
                assert_eq!(sub[0].name, "first");
            }
            other => panic!("unexpected kind {other:?}"),
        }
        assert_eq!(body, &[1, b'A', 50]);
    }

    #[test]
    fn test_slice_of_struct() {
        let mut row = DocumentBuilder::new();
        row.append_str("first", "A");
        row.append_int("age", 25);
        let mut row2 = DocumentBuilder::new();
        row2.append_str("first", "B");
        row2.append_int("age", 31);

        let mut rows = SliceBuilder::new();
        rows.append_struct(&row);
        rows.append_struct(&row2);

        let mut b = DocumentBuilder::new();
        b.append_slice("rows", &rows);
        let doc = b.bytes();

        let (_, _, schema, body) = parse_header(&doc, &DecodeLimits::default()).unwrap();
        let fields = parse_schema(schema, &DecodeLimits::default()).unwrap();
        assert_eq!(fields[0].ty.wire, WireType::STRUCT.with_slice());
        let SchemaKind::Slice(elem) = &fields[0].ty.kind else {
            panic!("expected slice");
        };
        assert!(matches!(elem.kind, SchemaKind::Struct(_)));
        assert_eq!(body[0], 2);
    }

    #[test]
    fn test_nested_slices() {
        let mut inner = SliceBuilder::new();
        inner.append_i32(1);
        inner.append_i32(2);
        let mut outer = SliceBuilder::new();
        outer.append_slice(&inner);

        let mut b = DocumentBuilder::new();
        b.append_slice("grid", &outer);
        let doc = b.bytes();

        let (_, _, schema, _) = parse_header(&doc, &DecodeLimits::default()).unwrap();
        let fields = parse_schema(schema, &DecodeLimits::default()).unwrap();
        let SchemaKind::Slice(mid) = &fields[0].ty.kind else {
            panic!("expected slice");
        };
        let SchemaKind::Slice(leaf) = &mid.kind else {
            panic!("expected nested slice");
        };
        assert_eq!(leaf.wire, WireType::INT32);
    }

    #[test]
    #[should_panic(expected = "share one type")]
    fn test_mixed_element_types_panic() {
        let mut s = SliceBuilder::new();
        s.append_i32(1);
        s.append_str("x");
    }

    #[test]
    fn test_deterministic_bytes() {
        let build = || {
            let mut b = DocumentBuilder::new();
            b.append_bool("ok", true);
            b.append_f64("ratio", 0.5);
            b.bytes()
        };
        assert_eq!(build(), build());
    }
}
