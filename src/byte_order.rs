//! Runtime-selectable byte order.
//!
//! Classic mini-SEED records may be big- or little-endian; the order is discovered
//! per-record (see [`crate::header::DataHeader::from_bytes`]), so it has to be a value,
//! not a compile-time marker type the way `byteorder`'s `BigEndian`/`LittleEndian` are.

use byteorder::{BigEndian, ByteOrder as _, LittleEndian};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ByteOrder {
    Big,
    Little,
}

impl ByteOrder {
    pub fn read_u16(self, buf: &[u8]) -> u16 {
        match self {
            ByteOrder::Big => BigEndian::read_u16(buf),
            ByteOrder::Little => LittleEndian::read_u16(buf),
        }
    }

    pub fn read_i16(self, buf: &[u8]) -> i16 {
        self.read_u16(buf) as i16
    }

    pub fn read_u32(self, buf: &[u8]) -> u32 {
        match self {
            ByteOrder::Big => BigEndian::read_u32(buf),
            ByteOrder::Little => LittleEndian::read_u32(buf),
        }
    }

    pub fn read_i32(self, buf: &[u8]) -> i32 {
        self.read_u32(buf) as i32
    }

    pub fn write_u16(self, buf: &mut [u8], v: u16) {
        match self {
            ByteOrder::Big => BigEndian::write_u16(buf, v),
            ByteOrder::Little => LittleEndian::write_u16(buf, v),
        }
    }

    pub fn write_i16(self, buf: &mut [u8], v: i16) {
        self.write_u16(buf, v as u16)
    }

    pub fn write_u32(self, buf: &mut [u8], v: u32) {
        match self {
            ByteOrder::Big => BigEndian::write_u32(buf, v),
            ByteOrder::Little => LittleEndian::write_u32(buf, v),
        }
    }

    pub fn write_i32(self, buf: &mut [u8], v: i32) {
        self.write_u32(buf, v as u32)
    }
}
