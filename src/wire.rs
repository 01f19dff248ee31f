use std::fmt;

use crate::error::{Error, Result};

/// On-wire classifier for a field: a 5-bit base kind plus three modifier
/// bits. The internal `SKIP` marker lives above the low byte and never
/// appears in a schema.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct WireType(u16);

impl WireType {
    pub const BOOL: WireType = WireType(1);
    pub const INT: WireType = WireType(2);
    pub const INT8: WireType = WireType(3);
    pub const INT16: WireType = WireType(4);
    pub const INT32: WireType = WireType(5);
    pub const INT64: WireType = WireType(6);
    pub const UINT: WireType = WireType(7);
    pub const UINT8: WireType = WireType(8);
    pub const UINT16: WireType = WireType(9);
    pub const UINT32: WireType = WireType(10);
    pub const UINT64: WireType = WireType(11);
    pub const FLOAT32: WireType = WireType(12);
    pub const FLOAT64: WireType = WireType(13);
    pub const STRING: WireType = WireType(14);
    pub const BYTES: WireType = WireType(15);
    pub const STRUCT: WireType = WireType(16);
    pub const MAP: WireType = WireType(17);
    pub const TIME: WireType = WireType(18);

    pub const BASE_MASK: u16 = 0x1F;
    pub const SLICE_BIT: u16 = 0x20;
    pub const POINTER_BIT: u16 = 0x40;
    pub const DELTA_BIT: u16 = 0x80;
    /// Internal-only marker used by skip instructions.
    pub(crate) const SKIP_BIT: u16 = 0x100;

    /// Validates a wire-type varint read from a schema.
    pub fn from_wire(raw: u64) -> Result<WireType> {
        if raw > 0xFF {
            return Err(Error::Malformed(format!("wire type {raw:#x} out of range")));
        }
        let w = WireType(raw as u16);
        let base = w.0 & Self::BASE_MASK;
        if !(1..=18).contains(&base) {
            return Err(Error::Malformed(format!("unknown base wire type {base}")));
        }
        Ok(w)
    }

    pub const fn base(self) -> WireType {
        WireType(self.0 & Self::BASE_MASK)
    }

    pub const fn is_slice(self) -> bool {
        self.0 & Self::SLICE_BIT != 0
    }

    pub const fn is_pointer(self) -> bool {
        self.0 & Self::POINTER_BIT != 0
    }

    pub const fn is_delta(self) -> bool {
        self.0 & Self::DELTA_BIT != 0
    }

    pub const fn with_slice(self) -> WireType {
        WireType(self.0 | Self::SLICE_BIT)
    }

    pub const fn with_pointer(self) -> WireType {
        WireType(self.0 | Self::POINTER_BIT)
    }

    pub const fn with_delta(self) -> WireType {
        WireType(self.0 | Self::DELTA_BIT)
    }

    pub const fn without_pointer(self) -> WireType {
        WireType(self.0 & !Self::POINTER_BIT)
    }

    /// True for bases whose body is an integer varint (or raw byte).
    pub const fn is_integer(self) -> bool {
        let b = self.0 & Self::BASE_MASK;
        b >= Self::INT.0 && b <= Self::UINT64.0
    }

    /// The byte written into a schema. Wire types always fit in 8 bits on
    /// the wire; the skip marker is stripped here by construction.
    pub const fn on_wire(self) -> u8 {
        (self.0 & 0xFF) as u8
    }

    pub const fn raw(self) -> u16 {
        self.0
    }

    fn base_name(self) -> &'static str {
        match self.base() {
            WireType::BOOL => "bool",
            WireType::INT => "int",
            WireType::INT8 => "int8",
            WireType::INT16 => "int16",
            WireType::INT32 => "int32",
            WireType::INT64 => "int64",
            WireType::UINT => "uint",
            WireType::UINT8 => "uint8",
            WireType::UINT16 => "uint16",
            WireType::UINT32 => "uint32",
            WireType::UINT64 => "uint64",
            WireType::FLOAT32 => "float32",
            WireType::FLOAT64 => "float64",
            WireType::STRING => "string",
            WireType::BYTES => "bytes",
            WireType::STRUCT => "struct",
            WireType::MAP => "map",
            WireType::TIME => "time",
            _ => "invalid",
        }
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_pointer() {
            f.write_str("*")?;
        }
        if self.is_slice() {
            f.write_str("[]")?;
        }
        f.write_str(self.base_name())?;
        if self.is_delta() {
            f.write_str("+delta")?;
        }
        Ok(())
    }
}

impl fmt::Debug for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WireType({self})")
    }
}
