//! Per-type codecs.
//!
//! [`ElementCodec`] is implemented for every type that can appear on the
//! wire: scalars, `String`, `SystemTime`, `Option<V>`, `Vec<E>`,
//! `HashMap<K, V>`, and (through the derive macro) records. A field of a
//! record is an [`FieldCodec`] trait object wrapping the element codec with
//! the accessor function pointers the derive generated for that field;
//! option variants (`delta`, `zigzag`, `stringer`, `encoder`) are separate
//! field codecs selected at derive time, so an unsupported combination is a
//! missing trait impl rather than a runtime surprise.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::SystemTime;

use crate::buffer::Buffer;
use crate::decode::{Instr, Program};
use crate::error::{Error, Result};
use crate::limits::DecodeLimits;
use crate::reader::Reader;
use crate::record::Record;
use crate::schema::{SchemaKind, SchemaType};
use crate::varint::append_uvarint;
use crate::wire::WireType;

/// Borrowing accessor for one field, monomorphised by the derive.
pub type FieldRef<T, V> = fn(&T) -> &V;
/// Mutating accessor for one field; the Rust form of an assigner's target
/// offset.
pub type FieldMut<T, V> = fn(&mut T) -> &mut V;

/// A compiled read for one value of a known schema type.
pub type ReadFn<V> = Box<dyn Fn(&mut Reader<'_>, &DecodeLimits) -> Result<V> + Send + Sync>;

fn check_wire(expected: WireType, ty: &SchemaType) -> Result<()> {
    if ty.wire != expected {
        return Err(Error::mismatch(expected, ty.wire));
    }
    Ok(())
}

/// A type that can be encoded to and decoded from the wire, either as a
/// record field, a slice element, or a map value.
pub trait ElementCodec: Sized + Send + Sync + 'static {
    /// Full wire type of this element, modifiers included.
    fn wire() -> WireType;

    /// Schema bytes following this element's wire varint (element chains,
    /// sub-schemas). Scalars have none.
    fn append_schema(_out: &mut Vec<u8>) {}

    fn encode(&self, buf: &mut Buffer);

    /// Validates the received type against this element and compiles the
    /// read for it.
    fn reader(ty: &SchemaType) -> Result<ReadFn<Self>>;

    /// Compiles a top-level field instruction. Scalars override this to
    /// return dense instruction variants; the default routes through
    /// [`ElementCodec::reader`].
    fn field_instr<T: 'static>(get: FieldMut<T, Self>, ty: &SchemaType) -> Result<Instr<T>> {
        let read = Self::reader(ty)?;
        Ok(Instr::Run(Box::new(move |r, t, lim| {
            *get(t) = read(r, lim)?;
            Ok(())
        })))
    }

    // Hooks consulted by the blanket `Vec<Self>` impl. `u8` overrides the
    // lot: a byte slice is wire type Bytes, not slice-of-uint8.

    fn vec_wire() -> WireType {
        Self::wire().base().with_slice()
    }

    fn vec_schema(out: &mut Vec<u8>) {
        append_uvarint(out, Self::wire().on_wire() as u64);
        Self::append_schema(out);
    }

    fn vec_encode(v: &[Self], buf: &mut Buffer) {
        buf.append_uvarint(v.len() as u64);
        for e in v {
            e.encode(buf);
        }
    }

    fn vec_reader(ty: &SchemaType) -> Result<ReadFn<Vec<Self>>> {
        let SchemaKind::Slice(elem_ty) = &ty.kind else {
            return Err(Error::mismatch(Self::vec_wire(), ty.wire));
        };
        check_wire(Self::vec_wire(), ty)?;
        let read = Self::reader(elem_ty)?;
        Ok(Box::new(move |r, lim| {
            let count = r.read_uvarint()? as usize;
            let mut out = Vec::with_capacity(lim.clamp_cap(count));
            for _ in 0..count {
                out.push(read(r, lim)?);
            }
            Ok(out)
        }))
    }

    fn vec_field_instr<T: 'static>(
        get: FieldMut<T, Vec<Self>>,
        ty: &SchemaType,
    ) -> Result<Instr<T>> {
        let SchemaKind::Slice(elem_ty) = &ty.kind else {
            return Err(Error::mismatch(Self::vec_wire(), ty.wire));
        };
        check_wire(Self::vec_wire(), ty)?;
        let read = Self::reader(elem_ty)?;
        Ok(Instr::Run(Box::new(move |r, t, lim| {
            let out = get(t);
            out.clear();
            let count = r.read_uvarint()? as usize;
            out.reserve(lim.clamp_cap(count));
            for _ in 0..count {
                out.push(read(r, lim)?);
            }
            Ok(())
        })))
    }
}

macro_rules! scalar_codec {
    ($ty:ty, $wire:expr, $append:ident, $read:ident, $variant:ident) => {
        impl ElementCodec for $ty {
            fn wire() -> WireType {
                $wire
            }

            fn encode(&self, buf: &mut Buffer) {
                buf.$append(*self);
            }

            fn reader(ty: &SchemaType) -> Result<ReadFn<Self>> {
                check_wire(Self::wire(), ty)?;
                Ok(Box::new(|r, _lim| r.$read()))
            }

            fn field_instr<T: 'static>(
                get: FieldMut<T, Self>,
                ty: &SchemaType,
            ) -> Result<Instr<T>> {
                check_wire(Self::wire(), ty)?;
                Ok(Instr::$variant(get))
            }
        }
    };
}

scalar_codec!(bool, WireType::BOOL, append_bool, read_bool, Bool);
scalar_codec!(i8, WireType::INT8, append_i8, read_i8, I8);
scalar_codec!(i16, WireType::INT16, append_i16, read_i16, I16);
scalar_codec!(i32, WireType::INT32, append_i32, read_i32, I32);
scalar_codec!(i64, WireType::INT64, append_i64, read_i64, I64);
scalar_codec!(isize, WireType::INT, append_isize, read_isize, Isize);
scalar_codec!(u16, WireType::UINT16, append_u16, read_u16, U16);
scalar_codec!(u32, WireType::UINT32, append_u32, read_u32, U32);
scalar_codec!(u64, WireType::UINT64, append_u64, read_u64, U64);
scalar_codec!(usize, WireType::UINT, append_usize, read_usize, Usize);
scalar_codec!(f32, WireType::FLOAT32, append_f32, read_f32, F32);
scalar_codec!(f64, WireType::FLOAT64, append_f64, read_f64, F64);

impl ElementCodec for u8 {
    fn wire() -> WireType {
        WireType::UINT8
    }

    fn encode(&self, buf: &mut Buffer) {
        buf.append_u8(*self);
    }

    fn reader(ty: &SchemaType) -> Result<ReadFn<Self>> {
        check_wire(Self::wire(), ty)?;
        Ok(Box::new(|r, _lim| r.read_u8()))
    }

    fn field_instr<T: 'static>(get: FieldMut<T, Self>, ty: &SchemaType) -> Result<Instr<T>> {
        check_wire(Self::wire(), ty)?;
        Ok(Instr::U8(get))
    }

    fn vec_wire() -> WireType {
        WireType::BYTES
    }

    fn vec_schema(_out: &mut Vec<u8>) {}

    fn vec_encode(v: &[u8], buf: &mut Buffer) {
        buf.append_byte_slice(v);
    }

    fn vec_reader(ty: &SchemaType) -> Result<ReadFn<Vec<u8>>> {
        check_wire(WireType::BYTES, ty)?;
        Ok(Box::new(|r, lim| r.read_byte_slice(lim)))
    }

    fn vec_field_instr<T: 'static>(
        get: FieldMut<T, Vec<u8>>,
        ty: &SchemaType,
    ) -> Result<Instr<T>> {
        check_wire(WireType::BYTES, ty)?;
        Ok(Instr::Bytes(get))
    }
}

impl ElementCodec for String {
    fn wire() -> WireType {
        WireType::STRING
    }

    fn encode(&self, buf: &mut Buffer) {
        buf.append_str(self);
    }

    fn reader(ty: &SchemaType) -> Result<ReadFn<Self>> {
        check_wire(Self::wire(), ty)?;
        Ok(Box::new(|r, lim| r.read_str(lim)))
    }

    fn field_instr<T: 'static>(get: FieldMut<T, Self>, ty: &SchemaType) -> Result<Instr<T>> {
        check_wire(Self::wire(), ty)?;
        Ok(Instr::Str(get))
    }
}

impl ElementCodec for SystemTime {
    fn wire() -> WireType {
        WireType::TIME
    }

    fn encode(&self, buf: &mut Buffer) {
        buf.append_time(*self);
    }

    fn reader(ty: &SchemaType) -> Result<ReadFn<Self>> {
        check_wire(Self::wire(), ty)?;
        Ok(Box::new(|r, lim| r.read_time(lim)))
    }

    fn field_instr<T: 'static>(get: FieldMut<T, Self>, ty: &SchemaType) -> Result<Instr<T>> {
        check_wire(Self::wire(), ty)?;
        Ok(Instr::Time(get))
    }
}

/// Pointer-modified element: one presence byte, then the value when
/// present.
impl<E: ElementCodec> ElementCodec for Option<E> {
    fn wire() -> WireType {
        E::wire().with_pointer()
    }

    fn append_schema(out: &mut Vec<u8>) {
        E::append_schema(out);
    }

    fn encode(&self, buf: &mut Buffer) {
        match self {
            None => buf.append_u8(0),
            Some(v) => {
                buf.append_u8(1);
                v.encode(buf);
            }
        }
    }

    fn reader(ty: &SchemaType) -> Result<ReadFn<Self>> {
        if !ty.wire.is_pointer() {
            return Err(Error::mismatch(Self::wire(), ty.wire));
        }
        let inner_ty = ty.without_pointer();
        let read = E::reader(&inner_ty)?;
        Ok(Box::new(move |r, lim| match r.read_u8()? {
            0 => Ok(None),
            1 => Ok(Some(read(r, lim)?)),
            b => Err(Error::Malformed(format!("presence byte {b} out of range"))),
        }))
    }
}

impl<E: ElementCodec> ElementCodec for Vec<E> {
    fn wire() -> WireType {
        E::vec_wire()
    }

    fn append_schema(out: &mut Vec<u8>) {
        E::vec_schema(out);
    }

    fn encode(&self, buf: &mut Buffer) {
        E::vec_encode(self, buf);
    }

    fn reader(ty: &SchemaType) -> Result<ReadFn<Self>> {
        E::vec_reader(ty)
    }

    fn field_instr<T: 'static>(get: FieldMut<T, Self>, ty: &SchemaType) -> Result<Instr<T>> {
        E::vec_field_instr(get, ty)
    }
}

/// Map keys are restricted to scalar wire types with a total equality.
pub trait MapKey: Sized + Eq + std::hash::Hash + Send + Sync + 'static {
    const WIRE: WireType;
    fn encode_key(&self, buf: &mut Buffer);
    fn read_key(r: &mut Reader<'_>, limits: &DecodeLimits) -> Result<Self>;
}

macro_rules! map_key {
    ($ty:ty, $wire:expr, $append:ident, $read:ident) => {
        impl MapKey for $ty {
            const WIRE: WireType = $wire;

            fn encode_key(&self, buf: &mut Buffer) {
                buf.$append(*self);
            }

            fn read_key(r: &mut Reader<'_>, _limits: &DecodeLimits) -> Result<Self> {
                r.$read()
            }
        }
    };
}

map_key!(bool, WireType::BOOL, append_bool, read_bool);
map_key!(i8, WireType::INT8, append_i8, read_i8);
map_key!(i16, WireType::INT16, append_i16, read_i16);
map_key!(i32, WireType::INT32, append_i32, read_i32);
map_key!(i64, WireType::INT64, append_i64, read_i64);
map_key!(isize, WireType::INT, append_isize, read_isize);
map_key!(u8, WireType::UINT8, append_u8, read_u8);
map_key!(u16, WireType::UINT16, append_u16, read_u16);
map_key!(u32, WireType::UINT32, append_u32, read_u32);
map_key!(u64, WireType::UINT64, append_u64, read_u64);
map_key!(usize, WireType::UINT, append_usize, read_usize);

impl MapKey for String {
    const WIRE: WireType = WireType::STRING;

    fn encode_key(&self, buf: &mut Buffer) {
        buf.append_str(self);
    }

    fn read_key(r: &mut Reader<'_>, limits: &DecodeLimits) -> Result<Self> {
        r.read_str(limits)
    }
}

impl<K: MapKey, V: ElementCodec> ElementCodec for HashMap<K, V> {
    fn wire() -> WireType {
        WireType::MAP
    }

    fn append_schema(out: &mut Vec<u8>) {
        append_uvarint(out, K::WIRE.on_wire() as u64);
        append_uvarint(out, V::wire().on_wire() as u64);
        V::append_schema(out);
    }

    /// Entries go out in iteration order; receivers must not assume any
    /// key order.
    fn encode(&self, buf: &mut Buffer) {
        buf.append_uvarint(self.len() as u64);
        for (k, v) in self {
            k.encode_key(buf);
            v.encode(buf);
        }
    }

    fn reader(ty: &SchemaType) -> Result<ReadFn<Self>> {
        let SchemaKind::Map { key, value } = &ty.kind else {
            return Err(Error::mismatch(WireType::MAP, ty.wire));
        };
        check_wire(WireType::MAP, ty)?;
        if *key != K::WIRE {
            return Err(Error::mismatch(K::WIRE, *key));
        }
        let read_value = V::reader(value)?;
        Ok(Box::new(move |r, lim| {
            let count = r.read_uvarint()? as usize;
            let mut out = HashMap::with_capacity(lim.clamp_cap(count));
            for _ in 0..count {
                let k = K::read_key(r, lim)?;
                let v = read_value(r, lim)?;
                out.insert(k, v);
            }
            Ok(out)
        }))
    }
}

// Helpers behind the derive's generated `ElementCodec` impl for records.

pub fn struct_schema<S: Record>(out: &mut Vec<u8>) {
    let shape = S::shape();
    append_uvarint(out, shape.schema.len() as u64);
    out.extend_from_slice(&shape.schema);
}

pub fn struct_encode<S: Record>(value: &S, buf: &mut Buffer) {
    S::shape().encode_body(value, buf);
}

fn struct_program<S: Record>(ty: &SchemaType) -> Result<Arc<Program<S>>> {
    let SchemaKind::Struct(fields) = &ty.kind else {
        return Err(Error::mismatch(WireType::STRUCT, ty.wire));
    };
    check_wire(WireType::STRUCT, ty)?;
    Ok(Arc::new(Program::compile(fields)?))
}

pub fn struct_reader<S: Record>(ty: &SchemaType) -> Result<ReadFn<S>> {
    let program = struct_program::<S>(ty)?;
    Ok(Box::new(move |r, lim| {
        let mut value = S::default();
        program.run(r, &mut value, lim)?;
        Ok(value)
    }))
}

/// Nested-record fields decode in place: the sub-program produced by the
/// schema match is stored on the outer instruction and run against the
/// field directly.
pub fn struct_field_instr<T: 'static, S: Record>(
    get: FieldMut<T, S>,
    ty: &SchemaType,
) -> Result<Instr<T>> {
    let program = struct_program::<S>(ty)?;
    Ok(Instr::Run(Box::new(move |r, t, lim| {
        program.run(r, get(t), lim)
    })))
}

/// A field whose wire form is the element codec of its Rust type; the
/// common case with no options.
pub struct ValueField<T, V> {
    get: FieldRef<T, V>,
    get_mut: FieldMut<T, V>,
}

/// Schema writing, body writing, and instruction compilation for one field
/// of a record.
pub trait FieldCodec<T>: Send + Sync {
    fn wire(&self) -> WireType;
    fn append_schema(&self, out: &mut Vec<u8>);
    fn encode(&self, value: &T, buf: &mut Buffer);
    fn compile(&self, ty: &SchemaType) -> Result<Instr<T>>;
}

impl<T: 'static, V: ElementCodec> FieldCodec<T> for ValueField<T, V> {
    fn wire(&self) -> WireType {
        V::wire()
    }

    fn append_schema(&self, out: &mut Vec<u8>) {
        V::append_schema(out);
    }

    fn encode(&self, value: &T, buf: &mut Buffer) {
        (self.get)(value).encode(buf);
    }

    fn compile(&self, ty: &SchemaType) -> Result<Instr<T>> {
        V::field_instr(self.get_mut, ty)
    }
}

pub fn value_field<T: 'static, V: ElementCodec>(
    get: FieldRef<T, V>,
    get_mut: FieldMut<T, V>,
) -> Arc<dyn FieldCodec<T>> {
    Arc::new(ValueField { get, get_mut })
}

/// Integer slice element eligible for delta encoding. Reconstruction is
/// widened to `i64` (wrapping) so consecutive differences beyond the
/// element type's range survive the round trip.
pub trait DeltaElement: ElementCodec + Copy {
    fn widen(self) -> i64;
    fn narrow(v: i64) -> Self;
    fn read_first(r: &mut Reader<'_>) -> Result<Self>;
}

macro_rules! delta_element {
    ($ty:ty, $read:ident) => {
        impl DeltaElement for $ty {
            fn widen(self) -> i64 {
                self as i64
            }

            fn narrow(v: i64) -> Self {
                v as $ty
            }

            fn read_first(r: &mut Reader<'_>) -> Result<Self> {
                r.$read()
            }
        }
    };
}

delta_element!(i8, read_i8);
delta_element!(i16, read_i16);
delta_element!(i32, read_i32);
delta_element!(i64, read_i64);
delta_element!(isize, read_isize);
delta_element!(u16, read_u16);
delta_element!(u32, read_u32);
delta_element!(u64, read_u64);
delta_element!(usize, read_usize);

/// `delta` option: the element wire type carries the delta modifier and
/// the body becomes first-value + zigzag deltas.
pub struct DeltaField<T, E: DeltaElement> {
    get: FieldRef<T, Vec<E>>,
    get_mut: FieldMut<T, Vec<E>>,
}

impl<T: 'static, E: DeltaElement> FieldCodec<T> for DeltaField<T, E> {
    fn wire(&self) -> WireType {
        E::wire().base().with_slice()
    }

    fn append_schema(&self, out: &mut Vec<u8>) {
        append_uvarint(out, E::wire().with_delta().on_wire() as u64);
    }

    fn encode(&self, value: &T, buf: &mut Buffer) {
        let xs = (self.get)(value);
        buf.append_uvarint(xs.len() as u64);
        let Some(first) = xs.first() else {
            return;
        };
        first.encode(buf);
        let mut prev = first.widen();
        for x in &xs[1..] {
            let w = x.widen();
            buf.append_ivarint(w.wrapping_sub(prev));
            prev = w;
        }
    }

    fn compile(&self, ty: &SchemaType) -> Result<Instr<T>> {
        let expected_elem = E::wire().with_delta();
        let SchemaKind::Slice(elem) = &ty.kind else {
            return Err(Error::mismatch(self.wire(), ty.wire));
        };
        if elem.wire != expected_elem {
            return Err(Error::mismatch(expected_elem, elem.wire));
        }
        let get_mut = self.get_mut;
        Ok(Instr::Run(Box::new(move |r, t, lim| {
            let out = get_mut(t);
            out.clear();
            let count = r.read_uvarint()? as usize;
            out.reserve(lim.clamp_cap(count));
            if count == 0 {
                return Ok(());
            }
            let first = E::read_first(r)?;
            out.push(first);
            let mut prev = first.widen();
            for _ in 1..count {
                prev = prev.wrapping_add(r.read_ivarint()?);
                out.push(E::narrow(prev));
            }
            Ok(())
        })))
    }
}

/// Field types the `delta` option accepts. Applying the option to anything
/// else is a compile error at the derive site.
pub trait DeltaCodec: Sized {
    fn build<T: 'static>(
        get: FieldRef<T, Self>,
        get_mut: FieldMut<T, Self>,
    ) -> Arc<dyn FieldCodec<T>>;
}

impl<E: DeltaElement> DeltaCodec for Vec<E> {
    fn build<T: 'static>(
        get: FieldRef<T, Vec<E>>,
        get_mut: FieldMut<T, Vec<E>>,
    ) -> Arc<dyn FieldCodec<T>> {
        Arc::new(DeltaField { get, get_mut })
    }
}

pub fn delta_field<T: 'static, V: DeltaCodec>(
    get: FieldRef<T, V>,
    get_mut: FieldMut<T, V>,
) -> Arc<dyn FieldCodec<T>> {
    V::build(get, get_mut)
}

/// `zigzag` option on an `i64` field: declared as wire type Int and
/// encoded zigzag, trading the 64-bit plain encoding's fixed cost for
/// small-magnitude compactness.
pub struct ZigzagI64Field<T> {
    get: FieldRef<T, i64>,
    get_mut: FieldMut<T, i64>,
}

impl<T: 'static> FieldCodec<T> for ZigzagI64Field<T> {
    fn wire(&self) -> WireType {
        WireType::INT
    }

    fn append_schema(&self, _out: &mut Vec<u8>) {}

    fn encode(&self, value: &T, buf: &mut Buffer) {
        buf.append_ivarint(*(self.get)(value));
    }

    fn compile(&self, ty: &SchemaType) -> Result<Instr<T>> {
        check_wire(WireType::INT, ty)?;
        let get_mut = self.get_mut;
        Ok(Instr::Run(Box::new(move |r, t, _lim| {
            *get_mut(t) = r.read_ivarint()?;
            Ok(())
        })))
    }
}

pub struct ZigzagI64SliceField<T> {
    get: FieldRef<T, Vec<i64>>,
    get_mut: FieldMut<T, Vec<i64>>,
}

impl<T: 'static> FieldCodec<T> for ZigzagI64SliceField<T> {
    fn wire(&self) -> WireType {
        WireType::INT.with_slice()
    }

    fn append_schema(&self, out: &mut Vec<u8>) {
        append_uvarint(out, WireType::INT.on_wire() as u64);
    }

    fn encode(&self, value: &T, buf: &mut Buffer) {
        let xs = (self.get)(value);
        buf.append_uvarint(xs.len() as u64);
        for x in xs {
            buf.append_ivarint(*x);
        }
    }

    fn compile(&self, ty: &SchemaType) -> Result<Instr<T>> {
        let SchemaKind::Slice(elem) = &ty.kind else {
            return Err(Error::mismatch(self.wire(), ty.wire));
        };
        if elem.wire != WireType::INT {
            return Err(Error::mismatch(WireType::INT, elem.wire));
        }
        let get_mut = self.get_mut;
        Ok(Instr::Run(Box::new(move |r, t, lim| {
            let out = get_mut(t);
            out.clear();
            let count = r.read_uvarint()? as usize;
            out.reserve(lim.clamp_cap(count));
            for _ in 0..count {
                out.push(r.read_ivarint()?);
            }
            Ok(())
        })))
    }
}

pub trait ZigzagCodec: Sized {
    fn build<T: 'static>(
        get: FieldRef<T, Self>,
        get_mut: FieldMut<T, Self>,
    ) -> Arc<dyn FieldCodec<T>>;
}

impl ZigzagCodec for i64 {
    fn build<T: 'static>(
        get: FieldRef<T, i64>,
        get_mut: FieldMut<T, i64>,
    ) -> Arc<dyn FieldCodec<T>> {
        Arc::new(ZigzagI64Field { get, get_mut })
    }
}

impl ZigzagCodec for Vec<i64> {
    fn build<T: 'static>(
        get: FieldRef<T, Vec<i64>>,
        get_mut: FieldMut<T, Vec<i64>>,
    ) -> Arc<dyn FieldCodec<T>> {
        Arc::new(ZigzagI64SliceField { get, get_mut })
    }
}

pub fn zigzag_field<T: 'static, V: ZigzagCodec>(
    get: FieldRef<T, V>,
    get_mut: FieldMut<T, V>,
) -> Arc<dyn FieldCodec<T>> {
    V::build(get, get_mut)
}

/// `stringer` option: the field travels as a String produced by `Display`
/// and is rebuilt with `FromStr`.
pub struct StringerField<T, V> {
    get: FieldRef<T, V>,
    get_mut: FieldMut<T, V>,
}

impl<T: 'static, V> FieldCodec<T> for StringerField<T, V>
where
    V: fmt::Display + FromStr + Send + Sync + 'static,
    <V as FromStr>::Err: fmt::Display,
{
    fn wire(&self) -> WireType {
        WireType::STRING
    }

    fn append_schema(&self, _out: &mut Vec<u8>) {}

    fn encode(&self, value: &T, buf: &mut Buffer) {
        buf.append_str(&(self.get)(value).to_string());
    }

    fn compile(&self, ty: &SchemaType) -> Result<Instr<T>> {
        check_wire(WireType::STRING, ty)?;
        let get_mut = self.get_mut;
        Ok(Instr::Run(Box::new(move |r, t, lim| {
            let s = r.read_str(lim)?;
            *get_mut(t) = s
                .parse()
                .map_err(|e| Error::Malformed(format!("cannot parse `{s}`: {e}")))?;
            Ok(())
        })))
    }
}

pub fn stringer_field<T: 'static, V>(
    get: FieldRef<T, V>,
    get_mut: FieldMut<T, V>,
) -> Arc<dyn FieldCodec<T>>
where
    V: fmt::Display + FromStr + Send + Sync + 'static,
    <V as FromStr>::Err: fmt::Display,
{
    Arc::new(StringerField { get, get_mut })
}

/// Binary round-trip capability for the `encoder` option; the field
/// travels as wire type Bytes.
pub trait BinaryMarshal: Sized + Send + Sync + 'static {
    fn marshal_binary(&self) -> Vec<u8>;
    fn unmarshal_binary(data: &[u8]) -> Result<Self>;
}

pub struct BinaryField<T, V: BinaryMarshal> {
    get: FieldRef<T, V>,
    get_mut: FieldMut<T, V>,
}

impl<T: 'static, V: BinaryMarshal> FieldCodec<T> for BinaryField<T, V> {
    fn wire(&self) -> WireType {
        WireType::BYTES
    }

    fn append_schema(&self, _out: &mut Vec<u8>) {}

    fn encode(&self, value: &T, buf: &mut Buffer) {
        buf.append_byte_slice(&(self.get)(value).marshal_binary());
    }

    fn compile(&self, ty: &SchemaType) -> Result<Instr<T>> {
        check_wire(WireType::BYTES, ty)?;
        let get_mut = self.get_mut;
        Ok(Instr::Run(Box::new(move |r, t, lim| {
            let len = r.read_uvarint()? as usize;
            lim.check_byte_slice(len)?;
            let bytes = r.read(len)?;
            *get_mut(t) = V::unmarshal_binary(bytes)?;
            Ok(())
        })))
    }
}

pub fn binary_field<T: 'static, V: BinaryMarshal>(
    get: FieldRef<T, V>,
    get_mut: FieldMut<T, V>,
) -> Arc<dyn FieldCodec<T>> {
    Arc::new(BinaryField { get, get_mut })
}
