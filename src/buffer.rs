use std::sync::Mutex;
use std::time::SystemTime;

use lazy_static::lazy_static;

use crate::varint::{append_ivarint, append_uvarint};

lazy_static! {
    static ref POOL: Mutex<Vec<Vec<u8>>> = Mutex::new(Vec::new());
}

/// Append-only output buffer for encoded documents. A buffer is mutable
/// scratch space owned by one thread at a time; pool it between uses.
///
/// The `trusted` flag selects the 6-byte trusted header on the next
/// marshal in place of the full header and schema.
#[derive(Debug, Default)]
pub struct Buffer {
    data: Vec<u8>,
    trusted: bool,
}

impl Buffer {
    pub fn new() -> Buffer {
        Buffer::default()
    }

    pub fn with_capacity(cap: usize) -> Buffer {
        Buffer {
            data: Vec::with_capacity(cap),
            trusted: false,
        }
    }

    /// Takes a pooled backing allocation if one is available. Terminate the
    /// buffer's life with [`Buffer::return_to_pool`].
    pub fn from_pool() -> Buffer {
        let data = POOL
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop()
            .unwrap_or_default();
        Buffer {
            data,
            trusted: false,
        }
    }

    /// Returns the backing allocation to the pool. Using the buffer after
    /// this point means allocating a fresh one.
    pub fn return_to_pool(mut self) {
        self.data.clear();
        POOL.lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(self.data);
    }

    pub fn set_trusted(&mut self, trusted: bool) {
        self.trusted = trusted;
    }

    pub fn is_trusted(&self) -> bool {
        self.trusted
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Clears the contents, keeping the allocation and the trusted flag.
    pub fn clear(&mut self) {
        self.data.clear();
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    pub fn append_raw(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    pub fn append_u8(&mut self, v: u8) {
        self.data.push(v);
    }

    pub fn append_i8(&mut self, v: i8) {
        self.data.push(v as u8);
    }

    pub fn append_bool(&mut self, v: bool) {
        self.data.push(v as u8);
    }

    pub fn append_uvarint(&mut self, v: u64) {
        append_uvarint(&mut self.data, v);
    }

    pub fn append_ivarint(&mut self, v: i64) {
        append_ivarint(&mut self.data, v);
    }

    pub fn append_u16(&mut self, v: u16) {
        self.append_uvarint(v as u64);
    }

    pub fn append_u32(&mut self, v: u32) {
        self.append_uvarint(v as u64);
    }

    pub fn append_u64(&mut self, v: u64) {
        self.append_uvarint(v);
    }

    pub fn append_usize(&mut self, v: usize) {
        self.append_uvarint(v as u64);
    }

    pub fn append_i16(&mut self, v: i16) {
        self.append_ivarint(v as i64);
    }

    pub fn append_i32(&mut self, v: i32) {
        self.append_ivarint(v as i64);
    }

    /// 64-bit signed integers ride the unsigned encoding of their
    /// two's-complement bit pattern.
    pub fn append_i64(&mut self, v: i64) {
        self.append_uvarint(v as u64);
    }

    pub fn append_isize(&mut self, v: isize) {
        self.append_ivarint(v as i64);
    }

    pub fn append_f32(&mut self, v: f32) {
        self.append_uvarint(v.to_bits() as u64);
    }

    pub fn append_f64(&mut self, v: f64) {
        self.append_uvarint(v.to_bits());
    }

    pub fn append_str(&mut self, v: &str) {
        self.append_uvarint(v.len() as u64);
        self.data.extend_from_slice(v.as_bytes());
    }

    pub fn append_byte_slice(&mut self, v: &[u8]) {
        self.append_uvarint(v.len() as u64);
        self.data.extend_from_slice(v);
    }

    pub fn append_time(&mut self, v: SystemTime) {
        let (payload, len) = crate::time::marshal_array(v);
        self.append_uvarint(len as u64);
        self.data.extend_from_slice(&payload[..len]);
    }
}
