//! Schema-matched decoding.
//!
//! A [`Program`] is the compiled form of one received schema against one
//! target record type: an ordered list of instructions in the *sender's*
//! field order, where each instruction either assigns into the receiver's
//! field (through an accessor baked in at derive time) or skips bytes the
//! receiver has no use for. Programs are immutable once compiled and are
//! shared across concurrent decodes through the instruction cache.

use std::sync::Arc;
use std::time::SystemTime;

use crate::cache::{DecodeContext, InstructionCache};
use crate::codec::FieldMut;
use crate::document::parse_header;
use crate::error::{Error, Result};
use crate::limits::DecodeLimits;
use crate::reader::Reader;
use crate::record::Record;
use crate::schema::{parse_schema, SchemaField, SkipPlan};

pub type RunFn<T> =
    Box<dyn Fn(&mut Reader<'_>, &mut T, &DecodeLimits) -> Result<()> + Send + Sync>;

/// One step of a compiled decode. Scalar assigns carry a monomorphised
/// accessor and are dispatched by the dense match in [`Program::run`];
/// compound and pointer-modified fields go through a boxed run function
/// that captures whatever sub-program the schema matcher built for them.
pub enum Instr<T> {
    Bool(FieldMut<T, bool>),
    I8(FieldMut<T, i8>),
    I16(FieldMut<T, i16>),
    I32(FieldMut<T, i32>),
    I64(FieldMut<T, i64>),
    Isize(FieldMut<T, isize>),
    U8(FieldMut<T, u8>),
    U16(FieldMut<T, u16>),
    U32(FieldMut<T, u32>),
    U64(FieldMut<T, u64>),
    Usize(FieldMut<T, usize>),
    F32(FieldMut<T, f32>),
    F64(FieldMut<T, f64>),
    Str(FieldMut<T, String>),
    Bytes(FieldMut<T, Vec<u8>>),
    Time(FieldMut<T, SystemTime>),
    Run(RunFn<T>),
    Skip(SkipPlan),
}

pub struct Program<T> {
    instrs: Vec<Instr<T>>,
}

impl<T: Record> Program<T> {
    /// Pairs each entry of a received schema with either the target's
    /// assigner or a skip action. Known fields must match the compiled
    /// wire type exactly (modifiers included); unknown fields of any
    /// shape become skips sized from their own schema.
    pub fn compile(fields: &[SchemaField]) -> Result<Program<T>> {
        let shape = T::shape();
        let mut instrs = Vec::with_capacity(fields.len());
        for sf in fields {
            match shape.lookup.get(&sf.name) {
                Some(idx) => {
                    let instr = shape.fields[idx]
                        .codec
                        .compile(&sf.ty)
                        .map_err(|e| e.named(&sf.name))?;
                    instrs.push(instr);
                }
                None => instrs.push(Instr::Skip(sf.ty.skip_plan())),
            }
        }
        Ok(Program { instrs })
    }
}

impl<T> Program<T> {
    pub fn len(&self) -> usize {
        self.instrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instrs.is_empty()
    }

    /// Executes the instruction list against a body reader. Field
    /// assignments happen in schema (sender) order.
    pub fn run(&self, r: &mut Reader<'_>, target: &mut T, limits: &DecodeLimits) -> Result<()> {
        for instr in &self.instrs {
            match instr {
                Instr::Bool(get) => *get(target) = r.read_bool()?,
                Instr::I8(get) => *get(target) = r.read_i8()?,
                Instr::I16(get) => *get(target) = r.read_i16()?,
                Instr::I32(get) => *get(target) = r.read_i32()?,
                Instr::I64(get) => *get(target) = r.read_i64()?,
                Instr::Isize(get) => *get(target) = r.read_isize()?,
                Instr::U8(get) => *get(target) = r.read_u8()?,
                Instr::U16(get) => *get(target) = r.read_u16()?,
                Instr::U32(get) => *get(target) = r.read_u32()?,
                Instr::U64(get) => *get(target) = r.read_u64()?,
                Instr::Usize(get) => *get(target) = r.read_usize()?,
                Instr::F32(get) => *get(target) = r.read_f32()?,
                Instr::F64(get) => *get(target) = r.read_f64()?,
                Instr::Str(get) => r.read_str_into(get(target), limits)?,
                Instr::Bytes(get) => r.read_byte_slice_into(get(target), limits)?,
                Instr::Time(get) => *get(target) = r.read_time(limits)?,
                Instr::Run(f) => f(r, target, limits)?,
                Instr::Skip(plan) => plan.skip(r, limits)?,
            }
        }
        Ok(())
    }
}

/// Compiled decoder for a record type. Immutable after construction and
/// safe for concurrent use; the per-instance instruction cache is the only
/// shared mutable state.
pub struct Decoder<T: Record> {
    limits: DecodeLimits,
    cache: InstructionCache<T>,
}

impl<T: Record> Default for Decoder<T> {
    fn default() -> Self {
        Decoder::new()
    }
}

impl<T: Record> Decoder<T> {
    pub fn new() -> Decoder<T> {
        Decoder::with_limits(DecodeLimits::default())
    }

    pub fn with_limits(limits: DecodeLimits) -> Decoder<T> {
        Decoder {
            limits,
            cache: InstructionCache::new(),
        }
    }

    pub fn limits(&self) -> &DecodeLimits {
        &self.limits
    }

    pub fn cache(&self) -> &InstructionCache<T> {
        &self.cache
    }

    /// Parses a document into `value` using the decoder's own instruction
    /// cache. Fields absent from the sender's schema keep their current
    /// value; fields absent from the target are consumed and discarded.
    pub fn unmarshal(&self, doc: &[u8], value: &mut T) -> Result<()> {
        self.unmarshal_inner(doc, value, &self.cache, 0)
    }

    /// As [`Decoder::unmarshal`], with a caller-supplied cache and affinity
    /// id. The affinity id is part of the cache key, so one cache can serve
    /// several logical streams without cross-talk.
    pub fn unmarshal_with_context(
        &self,
        doc: &[u8],
        value: &mut T,
        ctx: &DecodeContext<'_, T>,
    ) -> Result<()> {
        self.unmarshal_inner(doc, value, ctx.cache, ctx.affinity)
    }

    fn unmarshal_inner(
        &self,
        doc: &[u8],
        value: &mut T,
        cache: &InstructionCache<T>,
        affinity: u64,
    ) -> Result<()> {
        let (_flags, hash, schema, body) = parse_header(doc, &self.limits)?;
        let program = match cache.get(hash, affinity) {
            Some(p) => p,
            None if schema.is_empty() => return Err(Error::SchemaNotFound(hash)),
            None => {
                log::debug!("compiling instruction list for schema hash {hash}");
                let fields = parse_schema(schema, &self.limits)?;
                let program = Arc::new(Program::compile(&fields)?);
                cache.insert(hash, affinity, program)
            }
        };
        let mut r = Reader::new(body);
        program.run(&mut r, value, &self.limits)?;
        if r.bytes_left() != 0 {
            return Err(Error::InvalidDocument(
                "body bytes remain after all instructions executed",
            ));
        }
        Ok(())
    }
}
