//! glintx — a self-describing binary serialization format.
//!
//! Documents carry their own schema: `flags | crc32(schema) | schema-length
//! | schema | body`. Encoders are compiled once per record type and write
//! header and body with no allocation beyond buffer growth; decoders parse
//! an unseen schema once, compile it into an instruction list against the
//! target type, cache the list under the schema's CRC32, and replay it for
//! every later document of the same shape. Peers that share a hash may omit
//! the schema entirely (trusted mode, 6-byte header).
//!
//! ```no_run
//! use glintx::{Buffer, Decoder, Encoder, Glint};
//!
//! #[derive(Glint, Default, PartialEq, Debug)]
//! struct Login {
//!     name: String,
//!     age: isize,
//! }
//!
//! let enc = Encoder::<Login>::new();
//! let mut buf = Buffer::new();
//! enc.marshal(&Login { name: "SampleUser".into(), age: 30 }, &mut buf);
//!
//! let dec = Decoder::<Login>::new();
//! let mut out = Login::default();
//! dec.unmarshal(buf.bytes(), &mut out).unwrap();
//! ```

mod buffer;
mod builder;
mod cache;
pub mod codec;
pub mod compat;
mod decode;
mod document;
mod encode;
mod error;
mod limits;
mod lookup;
mod print;
mod reader;
mod record;
mod schema;
mod ser;
mod time;
mod value;
mod varint;
mod walk;
mod wire;

pub use buffer::Buffer;
pub use builder::{DocumentBuilder, SliceBuilder};
pub use cache::{DecodeContext, InstructionCache};
pub use codec::{BinaryMarshal, ElementCodec, FieldCodec, MapKey};
pub use decode::{Decoder, Instr, Program};
pub use document::{
    flags, hash_bytes, parse_trust_header, schema_hash, trust_header_value, HEADER_LEN,
    TRUSTED_HEADER_LEN, TRUST_HEADER,
};
pub use encode::Encoder;
pub use error::{Error, Result};
pub use limits::DecodeLimits;
pub use print::{render, render_with_limits};
pub use reader::Reader;
pub use record::{schema_hash_of, schema_of, FieldDef, Record, Shape};
pub use schema::{parse_schema, SchemaField, SchemaKind, SchemaType, SkipPlan};
pub use ser::to_document;
pub use value::{DocumentValue, Value};
pub use walk::{verify, verify_with_limits, walk, walk_with_limits, Visit, Visitor};
pub use wire::WireType;

// Re-export the derive macro.
pub use glint_macro::Glint;
