//! Dynamic document values for tooling that has no target struct: the
//! walker feeds a visitor that reconstructs fields as [`Value`]s. Not used
//! on the typed hot path.

use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::limits::DecodeLimits;
use crate::reader::Reader;
use crate::schema::{SchemaKind, SchemaType};
use crate::walk::{walk_with_limits, Visit, Visitor};
use crate::wire::WireType;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    String(String),
    #[serde(with = "serde_bytes")]
    Bytes(Vec<u8>),
    Time(SystemTime),
    Array(Vec<Value>),
    // Pairs in wire order; map keys carry no defined order.
    Map(Vec<(Value, Value)>),
    Struct(Vec<(String, Value)>),
}

impl Value {
    /// Schema-directed read of one value. Integer bases widen into
    /// `Int`/`Uint`; delta slices are reconstructed the same way the typed
    /// decoder does it.
    pub fn read(ty: &SchemaType, r: &mut Reader<'_>, limits: &DecodeLimits) -> Result<Value> {
        if ty.wire.is_pointer() {
            return match r.read_u8()? {
                0 => Ok(Value::Nil),
                1 => Value::read(&ty.without_pointer(), r, limits),
                b => Err(crate::error::Error::Malformed(format!(
                    "presence byte {b} out of range"
                ))),
            };
        }
        match &ty.kind {
            SchemaKind::Scalar => Self::read_scalar(ty.wire, r, limits),
            SchemaKind::Struct(fields) => {
                let mut out = Vec::with_capacity(fields.len());
                for f in fields {
                    out.push((f.name.clone(), Value::read(&f.ty, r, limits)?));
                }
                Ok(Value::Struct(out))
            }
            SchemaKind::Slice(elem) if elem.wire.is_delta() => {
                Self::read_delta_slice(elem, r, limits)
            }
            SchemaKind::Slice(elem) => {
                let count = r.read_uvarint()? as usize;
                let mut out = Vec::with_capacity(limits.clamp_cap(count));
                for _ in 0..count {
                    out.push(Value::read(elem, r, limits)?);
                }
                Ok(Value::Array(out))
            }
            SchemaKind::Map { key, value } => {
                let key_ty = SchemaType::scalar(*key);
                let count = r.read_uvarint()? as usize;
                let mut out = Vec::with_capacity(limits.clamp_cap(count));
                for _ in 0..count {
                    let k = Value::read(&key_ty, r, limits)?;
                    let v = Value::read(value, r, limits)?;
                    out.push((k, v));
                }
                Ok(Value::Map(out))
            }
        }
    }

    fn read_scalar(wire: WireType, r: &mut Reader<'_>, limits: &DecodeLimits) -> Result<Value> {
        Ok(match wire.base() {
            WireType::BOOL => Value::Bool(r.read_bool()?),
            WireType::INT8 => Value::Int(r.read_i8()? as i64),
            WireType::INT | WireType::INT16 | WireType::INT32 => Value::Int(r.read_ivarint()?),
            WireType::INT64 => Value::Int(r.read_i64()?),
            WireType::UINT8 => Value::Uint(r.read_u8()? as u64),
            WireType::UINT | WireType::UINT16 | WireType::UINT32 | WireType::UINT64 => {
                Value::Uint(r.read_uvarint()?)
            }
            WireType::FLOAT32 => Value::Float(r.read_f32()? as f64),
            WireType::FLOAT64 => Value::Float(r.read_f64()?),
            WireType::STRING => Value::String(r.read_str(limits)?),
            WireType::BYTES => Value::Bytes(r.read_byte_slice(limits)?),
            WireType::TIME => Value::Time(r.read_time(limits)?),
            other => {
                return Err(crate::error::Error::Malformed(format!(
                    "wire type {other} is not a scalar"
                )))
            }
        })
    }

    fn read_delta_slice(
        elem: &SchemaType,
        r: &mut Reader<'_>,
        limits: &DecodeLimits,
    ) -> Result<Value> {
        let base = elem.wire.base();
        let signed = matches!(
            base,
            WireType::INT | WireType::INT8 | WireType::INT16 | WireType::INT32 | WireType::INT64
        );
        let count = r.read_uvarint()? as usize;
        let mut out = Vec::with_capacity(limits.clamp_cap(count));
        if count == 0 {
            return Ok(Value::Array(out));
        }
        let mut acc: i64 = match base {
            WireType::INT8 => r.read_i8()? as i64,
            WireType::INT | WireType::INT16 | WireType::INT32 => r.read_ivarint()?,
            WireType::INT64 => r.read_i64()?,
            WireType::UINT8 => r.read_u8()? as i64,
            _ => r.read_uvarint()? as i64,
        };
        let push = |out: &mut Vec<Value>, v: i64| {
            out.push(if signed {
                Value::Int(v)
            } else {
                Value::Uint(v as u64)
            })
        };
        push(&mut out, acc);
        for _ in 1..count {
            acc = acc.wrapping_add(r.read_ivarint()?);
            push(&mut out, acc);
        }
        Ok(Value::Array(out))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Uint(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Uint(v) => Some(*v),
            Value::Int(v) => u64::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Uint(a), Value::Uint(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Time(a), Value::Time(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Struct(a), Value::Struct(b)) => a == b,
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Value {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Value {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Value {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Value {
        Value::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Value {
        Value::Uint(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Value {
        Value::Float(v)
    }
}

/// A whole document lifted into dynamic values, header included.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentValue {
    pub flags: u8,
    pub hash: u32,
    pub fields: Vec<(String, Value)>,
}

impl DocumentValue {
    pub fn parse(doc: &[u8]) -> Result<DocumentValue> {
        Self::parse_with_limits(doc, DecodeLimits::default())
    }

    pub fn parse_with_limits(doc: &[u8], limits: DecodeLimits) -> Result<DocumentValue> {
        let mut visitor = ValueVisitor::default();
        walk_with_limits(doc, &mut visitor, limits)?;
        Ok(DocumentValue {
            flags: visitor.flags,
            hash: visitor.hash,
            fields: visitor.root,
        })
    }

    /// First top-level field with the given name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Dotted-path lookup: struct segments select fields, numeric segments
    /// index arrays, other segments match string map keys.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut cur = self.get(segments.next()?)?;
        for seg in segments {
            cur = match cur {
                Value::Struct(fields) => {
                    &fields.iter().find(|(n, _)| n == seg)?.1
                }
                Value::Array(items) => items.get(seg.parse::<usize>().ok()?)?,
                Value::Map(pairs) => {
                    &pairs.iter().find(|(k, _)| k.as_str() == Some(seg))?.1
                }
                _ => return None,
            };
        }
        Some(cur)
    }
}

enum Frame {
    Struct {
        name: String,
        fields: Vec<(String, Value)>,
    },
    Array {
        name: String,
        items: Vec<Value>,
    },
}

#[derive(Default)]
struct ValueVisitor {
    flags: u8,
    hash: u32,
    root: Vec<(String, Value)>,
    stack: Vec<Frame>,
}

impl ValueVisitor {
    fn insert(&mut self, name: &str, value: Value) {
        match self.stack.last_mut() {
            Some(Frame::Struct { fields, .. }) => fields.push((name.to_string(), value)),
            Some(Frame::Array { items, .. }) => items.push(value),
            None => self.root.push((name.to_string(), value)),
        }
    }
}

impl Visitor for ValueVisitor {
    fn visit_flags(&mut self, flags: u8) {
        self.flags = flags;
    }

    fn visit_schema_hash(&mut self, hash: u32) {
        self.hash = hash;
    }

    fn visit_field(
        &mut self,
        name: &str,
        ty: &SchemaType,
        r: &mut Reader<'_>,
        limits: &DecodeLimits,
    ) -> Result<Visit> {
        let v = Value::read(ty, r, limits)?;
        self.insert(name, v);
        Ok(Visit::Read)
    }

    fn visit_struct_start(&mut self, name: &str) {
        self.stack.push(Frame::Struct {
            name: name.to_string(),
            fields: Vec::new(),
        });
    }

    fn visit_struct_end(&mut self) {
        if let Some(Frame::Struct { name, fields }) = self.stack.pop() {
            self.insert(&name, Value::Struct(fields));
        }
    }

    fn visit_array_start(&mut self, name: &str, _elem: &SchemaType, count: usize) -> Visit {
        self.stack.push(Frame::Array {
            name: name.to_string(),
            items: Vec::with_capacity(count.min(4096)),
        });
        Visit::Read
    }

    fn visit_array_end(&mut self) {
        if let Some(Frame::Array { name, items }) = self.stack.pop() {
            self.insert(&name, Value::Array(items));
        }
    }
}
