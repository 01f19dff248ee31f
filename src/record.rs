//! The compiled description of a record type: its field table, schema
//! bytes, CRC32 hash, and name lookup. Built once per type behind a
//! `OnceLock` (the derive macro emits the caching `shape()` body) and
//! shared by every encoder, decoder, and nested use of the type.

use std::sync::Arc;

use crate::buffer::Buffer;
use crate::codec::FieldCodec;
use crate::lookup::FieldLookup;
use crate::varint::append_uvarint;

/// One wire field of a record: its schema name and the codec carrying the
/// monomorphised accessor functions for that field.
pub struct FieldDef<T> {
    pub name: &'static str,
    pub codec: Arc<dyn FieldCodec<T>>,
}

impl<T> FieldDef<T> {
    pub fn new(name: &'static str, codec: Arc<dyn FieldCodec<T>>) -> FieldDef<T> {
        FieldDef { name, codec }
    }
}

impl<T> Clone for FieldDef<T> {
    fn clone(&self) -> Self {
        FieldDef {
            name: self.name,
            codec: Arc::clone(&self.codec),
        }
    }
}

/// Implemented by `#[derive(Glint)]`. A record is an ordered set of named
/// fields; its schema, hash, and lookup tables live on the shared
/// [`Shape`].
pub trait Record: Default + Send + Sync + Sized + 'static {
    /// The field table in declaration order.
    fn fields() -> Vec<FieldDef<Self>>;

    /// The compiled, process-wide shape for this type.
    fn shape() -> &'static Shape<Self>;
}

pub struct Shape<T> {
    pub fields: Vec<FieldDef<T>>,
    /// Schema body bytes (no flags, hash, or length prefix).
    pub schema: Vec<u8>,
    /// IEEE CRC32 of the schema body.
    pub hash: u32,
    pub(crate) lookup: FieldLookup,
}

impl<T: Record> Shape<T> {
    pub fn build() -> Shape<T> {
        let fields = T::fields();
        let mut schema = Vec::new();
        for f in &fields {
            assert!(
                f.name.len() <= 255,
                "glint field name `{}` is longer than 255 bytes",
                f.name
            );
            append_uvarint(&mut schema, f.codec.wire().on_wire() as u64);
            schema.push(f.name.len() as u8);
            schema.extend_from_slice(f.name.as_bytes());
            f.codec.append_schema(&mut schema);
        }
        let hash = crc32fast::hash(&schema);
        let lookup = FieldLookup::build(fields.iter().map(|f| f.name));
        Shape {
            fields,
            schema,
            hash,
            lookup,
        }
    }

    /// Writes the body bytes of `value` (no header) into `buf`.
    pub(crate) fn encode_body(&self, value: &T, buf: &mut Buffer) {
        for f in &self.fields {
            f.codec.encode(value, buf);
        }
    }
}

/// The schema bytes a compiled encoder for `T` emits after the header.
pub fn schema_of<T: Record>() -> &'static [u8] {
    &T::shape().schema
}

/// The schema CRC32 a compiled encoder for `T` places in the header.
pub fn schema_hash_of<T: Record>() -> u32 {
    T::shape().hash
}
