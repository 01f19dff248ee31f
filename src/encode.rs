//! The compiled encoder: header and schema bytes are produced once at
//! construction, and `marshal` is a straight-line run over the field table
//! with no allocation beyond buffer growth.

use byteorder::{ByteOrder, LittleEndian};

use crate::buffer::Buffer;
use crate::record::Record;
use crate::varint::{append_uvarint, uvarint_len};

/// Compiled encoder for a record type. Immutable once built; share freely
/// across threads.
pub struct Encoder<T: Record> {
    shape: &'static crate::record::Shape<T>,
    /// `flags | hash | schema-length | schema`, ready to copy.
    header: Vec<u8>,
    /// `flags | hash | 0x00`: the header emitted when the buffer is
    /// trusted, standing in for the full header and schema.
    trust_header: [u8; 6],
}

impl<T: Record> Default for Encoder<T> {
    fn default() -> Self {
        Encoder::new()
    }
}

impl<T: Record> Encoder<T> {
    pub fn new() -> Encoder<T> {
        let shape = T::shape();
        let mut hash = [0u8; 4];
        LittleEndian::write_u32(&mut hash, shape.hash);

        let mut header = Vec::with_capacity(
            5 + uvarint_len(shape.schema.len() as u64) + shape.schema.len(),
        );
        header.push(0); // flags
        header.extend_from_slice(&hash);
        append_uvarint(&mut header, shape.schema.len() as u64);
        header.extend_from_slice(&shape.schema);

        let trust_header = [0, hash[0], hash[1], hash[2], hash[3], 0];

        Encoder {
            shape,
            header,
            trust_header,
        }
    }

    /// Writes a complete document for `value` into `buf`: the precomputed
    /// header (6 bytes when the buffer is trusted, header-plus-schema
    /// otherwise) followed by the body.
    pub fn marshal(&self, value: &T, buf: &mut Buffer) {
        if buf.is_trusted() {
            buf.append_raw(&self.trust_header);
        } else {
            buf.append_raw(&self.header);
        }
        self.shape.encode_body(value, buf);
    }

    /// Convenience wrapper marshalling into a fresh vector.
    pub fn marshal_vec(&self, value: &T) -> Vec<u8> {
        let mut buf = Buffer::with_capacity(self.header.len() + 64);
        self.marshal(value, &mut buf);
        buf.into_vec()
    }

    /// The schema bytes this encoder embeds after the header (no flags,
    /// hash, or length prefix).
    pub fn schema(&self) -> &[u8] {
        &self.shape.schema
    }

    /// IEEE CRC32 of the schema bytes; the document identity in trusted
    /// mode.
    pub fn hash(&self) -> u32 {
        self.shape.hash
    }
}
