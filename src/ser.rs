//! Serde bridge: serialises any `Serialize` struct into a glint document
//! through the builder API. The bridge covers the shapes the wire format
//! has a spelling for — scalar fields, strings, byte blobs, nested
//! structs, and sequences; anything else is reported as unsupported.

use serde::{ser, Serialize};

use crate::builder::{DocumentBuilder, SliceBuilder};
use crate::error::{Error, Result};

impl ser::Error for Error {
    fn custom<T: std::fmt::Display>(msg: T) -> Error {
        Error::Malformed(msg.to_string())
    }
}

fn unsupported(what: &str) -> Error {
    Error::Malformed(format!("{what} has no glint document representation"))
}

/// Serialises `value` (which must be a struct) into a complete document.
pub fn to_document<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut builder = DocumentBuilder::new();
    value.serialize(DocSerializer { b: &mut builder })?;
    Ok(builder.bytes())
}

/// Top level: only structs become documents.
struct DocSerializer<'a> {
    b: &'a mut DocumentBuilder,
}

macro_rules! doc_unsupported {
    ($method:ident, $ty:ty) => {
        fn $method(self, _v: $ty) -> Result<()> {
            Err(unsupported("a top-level scalar"))
        }
    };
}

impl<'a> ser::Serializer for DocSerializer<'a> {
    type Ok = ();
    type Error = Error;

    type SerializeSeq = ser::Impossible<(), Error>;
    type SerializeTuple = ser::Impossible<(), Error>;
    type SerializeTupleStruct = ser::Impossible<(), Error>;
    type SerializeTupleVariant = ser::Impossible<(), Error>;
    type SerializeMap = ser::Impossible<(), Error>;
    type SerializeStruct = RootStruct<'a>;
    type SerializeStructVariant = ser::Impossible<(), Error>;

    doc_unsupported!(serialize_bool, bool);
    doc_unsupported!(serialize_i8, i8);
    doc_unsupported!(serialize_i16, i16);
    doc_unsupported!(serialize_i32, i32);
    doc_unsupported!(serialize_i64, i64);
    doc_unsupported!(serialize_u8, u8);
    doc_unsupported!(serialize_u16, u16);
    doc_unsupported!(serialize_u32, u32);
    doc_unsupported!(serialize_u64, u64);
    doc_unsupported!(serialize_f32, f32);
    doc_unsupported!(serialize_f64, f64);
    doc_unsupported!(serialize_char, char);
    doc_unsupported!(serialize_str, &str);
    doc_unsupported!(serialize_bytes, &[u8]);

    fn serialize_none(self) -> Result<()> {
        Err(unsupported("a top-level option"))
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<()> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<()> {
        Err(unsupported("a unit value"))
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<()> {
        Err(unsupported("a unit struct"))
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
    ) -> Result<()> {
        Err(unsupported("an enum variant"))
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<()> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<()> {
        Err(unsupported("an enum variant"))
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        Err(unsupported("a top-level sequence"))
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        Err(unsupported("a tuple"))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        Err(unsupported("a tuple struct"))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(unsupported("an enum variant"))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Err(unsupported("a top-level map"))
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStruct> {
        Ok(RootStruct { b: self.b })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(unsupported("an enum variant"))
    }
}

struct RootStruct<'a> {
    b: &'a mut DocumentBuilder,
}

impl ser::SerializeStruct for RootStruct<'_> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<()> {
        value.serialize(FieldSerializer {
            b: &mut *self.b,
            name: key,
        })
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

/// Serialises one named field into a document builder.
struct FieldSerializer<'a> {
    b: &'a mut DocumentBuilder,
    name: &'static str,
}

macro_rules! field_scalar {
    ($method:ident, $ty:ty, $append:ident) => {
        fn $method(self, v: $ty) -> Result<()> {
            self.b.$append(self.name, v);
            Ok(())
        }
    };
}

impl<'a> ser::Serializer for FieldSerializer<'a> {
    type Ok = ();
    type Error = Error;

    type SerializeSeq = FieldSeq<'a>;
    type SerializeTuple = ser::Impossible<(), Error>;
    type SerializeTupleStruct = ser::Impossible<(), Error>;
    type SerializeTupleVariant = ser::Impossible<(), Error>;
    type SerializeMap = ser::Impossible<(), Error>;
    type SerializeStruct = FieldStruct<'a>;
    type SerializeStructVariant = ser::Impossible<(), Error>;

    field_scalar!(serialize_bool, bool, append_bool);
    field_scalar!(serialize_i8, i8, append_i8);
    field_scalar!(serialize_i16, i16, append_i16);
    field_scalar!(serialize_i32, i32, append_i32);
    field_scalar!(serialize_i64, i64, append_i64);
    field_scalar!(serialize_u8, u8, append_u8);
    field_scalar!(serialize_u16, u16, append_u16);
    field_scalar!(serialize_u32, u32, append_u32);
    field_scalar!(serialize_u64, u64, append_u64);
    field_scalar!(serialize_f32, f32, append_f32);
    field_scalar!(serialize_f64, f64, append_f64);

    fn serialize_char(self, v: char) -> Result<()> {
        let mut buf = [0u8; 4];
        self.b.append_str(self.name, v.encode_utf8(&mut buf));
        Ok(())
    }

    fn serialize_str(self, v: &str) -> Result<()> {
        self.b.append_str(self.name, v);
        Ok(())
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<()> {
        self.b.append_bytes(self.name, v);
        Ok(())
    }

    fn serialize_none(self) -> Result<()> {
        Err(unsupported("an optional field"))
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<()> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<()> {
        Err(unsupported("a unit field"))
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<()> {
        Err(unsupported("a unit struct"))
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
    ) -> Result<()> {
        Err(unsupported("an enum variant"))
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<()> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<()> {
        Err(unsupported("an enum variant"))
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        Ok(FieldSeq {
            b: self.b,
            name: self.name,
            slice: SliceBuilder::new(),
        })
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        Err(unsupported("a tuple"))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        Err(unsupported("a tuple struct"))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(unsupported("an enum variant"))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Err(unsupported("a map field (use the typed encoder for maps)"))
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStruct> {
        Ok(FieldStruct {
            b: self.b,
            name: self.name,
            sub: DocumentBuilder::new(),
        })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(unsupported("an enum variant"))
    }
}

/// Nested struct field: built into its own builder, spliced in at `end`.
struct FieldStruct<'a> {
    b: &'a mut DocumentBuilder,
    name: &'static str,
    sub: DocumentBuilder,
}

impl ser::SerializeStruct for FieldStruct<'_> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<()> {
        value.serialize(FieldSerializer {
            b: &mut self.sub,
            name: key,
        })
    }

    fn end(self) -> Result<()> {
        self.b.append_struct(self.name, &self.sub);
        Ok(())
    }
}

/// Sequence field: elements accumulate in a slice builder.
struct FieldSeq<'a> {
    b: &'a mut DocumentBuilder,
    name: &'static str,
    slice: SliceBuilder,
}

impl ser::SerializeSeq for FieldSeq<'_> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        value.serialize(ElementSerializer {
            slice: &mut self.slice,
        })
    }

    fn end(self) -> Result<()> {
        self.b.append_slice(self.name, &self.slice);
        Ok(())
    }
}

/// One sequence element.
struct ElementSerializer<'a> {
    slice: &'a mut SliceBuilder,
}

macro_rules! elem_scalar {
    ($method:ident, $ty:ty) => {
        fn $method(self, v: $ty) -> Result<()> {
            self.slice.append(&v);
            Ok(())
        }
    };
}

impl<'a> ser::Serializer for ElementSerializer<'a> {
    type Ok = ();
    type Error = Error;

    type SerializeSeq = ElementSeq<'a>;
    type SerializeTuple = ser::Impossible<(), Error>;
    type SerializeTupleStruct = ser::Impossible<(), Error>;
    type SerializeTupleVariant = ser::Impossible<(), Error>;
    type SerializeMap = ser::Impossible<(), Error>;
    type SerializeStruct = ElementStruct<'a>;
    type SerializeStructVariant = ser::Impossible<(), Error>;

    elem_scalar!(serialize_bool, bool);
    elem_scalar!(serialize_i8, i8);
    elem_scalar!(serialize_i16, i16);
    elem_scalar!(serialize_i32, i32);
    elem_scalar!(serialize_i64, i64);
    elem_scalar!(serialize_u16, u16);
    elem_scalar!(serialize_u32, u32);
    elem_scalar!(serialize_u64, u64);
    elem_scalar!(serialize_f32, f32);
    elem_scalar!(serialize_f64, f64);

    fn serialize_u8(self, _v: u8) -> Result<()> {
        Err(unsupported(
            "a byte-slice element (byte payloads are Bytes fields)",
        ))
    }

    fn serialize_char(self, v: char) -> Result<()> {
        let mut buf = [0u8; 4];
        self.slice.append_str(v.encode_utf8(&mut buf));
        Ok(())
    }

    fn serialize_str(self, v: &str) -> Result<()> {
        self.slice.append_str(v);
        Ok(())
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<()> {
        Err(unsupported("a bytes element"))
    }

    fn serialize_none(self) -> Result<()> {
        Err(unsupported("an optional element"))
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<()> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<()> {
        Err(unsupported("a unit element"))
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<()> {
        Err(unsupported("a unit struct"))
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
    ) -> Result<()> {
        Err(unsupported("an enum variant"))
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<()> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<()> {
        Err(unsupported("an enum variant"))
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        Ok(ElementSeq {
            outer: self.slice,
            inner: SliceBuilder::new(),
        })
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        Err(unsupported("a tuple"))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        Err(unsupported("a tuple struct"))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(unsupported("an enum variant"))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Err(unsupported("a map element"))
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStruct> {
        Ok(ElementStruct {
            slice: self.slice,
            sub: DocumentBuilder::new(),
        })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(unsupported("an enum variant"))
    }
}

struct ElementStruct<'a> {
    slice: &'a mut SliceBuilder,
    sub: DocumentBuilder,
}

impl ser::SerializeStruct for ElementStruct<'_> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<()> {
        value.serialize(FieldSerializer {
            b: &mut self.sub,
            name: key,
        })
    }

    fn end(self) -> Result<()> {
        self.slice.append_struct(&self.sub);
        Ok(())
    }
}

struct ElementSeq<'a> {
    outer: &'a mut SliceBuilder,
    inner: SliceBuilder,
}

impl ser::SerializeSeq for ElementSeq<'_> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        value.serialize(ElementSerializer {
            slice: &mut self.inner,
        })
    }

    fn end(self) -> Result<()> {
        self.outer.append_slice(&self.inner);
        Ok(())
    }
}
