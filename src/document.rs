//! Document header layout and the trust-handshake surface.
//!
//! A document is `flags (1) | schema-hash (4, little-endian CRC32) |
//! schema-length (varint) | schema | body`. In trusted mode the schema
//! length is zero and the schema bytes are absent, leaving the four hash
//! bytes as the sole identifier.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Error, Result};
use crate::limits::DecodeLimits;
use crate::reader::Reader;

/// Flags byte plus the four hash bytes.
pub const HEADER_LEN: usize = 5;

/// Length of the header an encoder emits in trusted mode: the five header
/// bytes followed by a zero schema length.
pub const TRUSTED_HEADER_LEN: usize = 6;

/// Transport key carrying the decimal schema hash a decoder has most
/// recently seen.
pub const TRUST_HEADER: &str = "X-Glint-Trust";

pub fn trust_header_value(hash: u32) -> String {
    hash.to_string()
}

pub fn parse_trust_header(value: &str) -> Option<u32> {
    value.trim().parse().ok()
}

/// Splits a document into `(flags, hash, schema bytes, body bytes)`.
pub fn parse_header<'a>(
    doc: &'a [u8],
    limits: &DecodeLimits,
) -> Result<(u8, u32, &'a [u8], &'a [u8])> {
    if doc.len() < HEADER_LEN {
        return Err(Error::InvalidDocument("header shorter than 5 bytes"));
    }
    let flags = doc[0];
    let hash = LittleEndian::read_u32(&doc[1..HEADER_LEN]);
    let mut r = Reader::new(&doc[HEADER_LEN..]);
    let schema_len = r.read_uvarint()? as usize;
    limits.check_schema(schema_len)?;
    if schema_len > r.bytes_left() {
        return Err(Error::InvalidDocument("schema length overruns document"));
    }
    let schema = r.read(schema_len)?;
    Ok((flags, hash, schema, r.remaining()))
}

/// The flags byte of a document.
pub fn flags(doc: &[u8]) -> Result<u8> {
    if doc.is_empty() {
        return Err(Error::InvalidDocument("header shorter than 5 bytes"));
    }
    Ok(doc[0])
}

/// The four raw hash bytes from a document header.
pub fn hash_bytes(doc: &[u8]) -> Result<[u8; 4]> {
    if doc.len() < HEADER_LEN {
        return Err(Error::InvalidDocument("header shorter than 5 bytes"));
    }
    Ok([doc[1], doc[2], doc[3], doc[4]])
}

/// The schema CRC32 from a document header.
pub fn schema_hash(doc: &[u8]) -> Result<u32> {
    Ok(LittleEndian::read_u32(&hash_bytes(doc)?))
}
