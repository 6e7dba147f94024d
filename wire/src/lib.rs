//! Helper routines for the protocol buffer binary wire format. See
//! [https://protobuf.dev/programming-guides/encoding/](https://protobuf.dev/programming-guides/encoding/)
//! for documentation about the format.
//!
//! The compiler consults this crate whenever generated code depends on a
//! fact about the encoding that is known at generation time, such as the
//! name of a wire type or the encoded size of a field key.
//!
//! ```
//! use protogo_wire::*;
//!
//! let mut bb = ByteBufferMut::new();
//! bb.write_key(2, WireType::Bytes);
//! bb.write_length_delimited(b"hi");
//!
//! let data = bb.data();
//! assert_eq!(data, [18, 2, 104, 105]);
//! assert_eq!(size_varint(make_key(2, WireType::Bytes)), 1);
//!
//! let mut bb = ByteBuffer::new(&data);
//! assert_eq!(bb.read_key(), Ok((2, WireType::Bytes)));
//! assert_eq!(bb.read_length_delimited(), Ok(&b"hi"[..]));
//! ```

pub mod bb;

pub use bb::*;

/// Largest field number the format can carry in a key.
pub const MAX_FIELD_NUMBER: i32 = (1 << 29) - 1;

/// The six wire types a field key can announce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireType {
    Varint     = 0,
    Fixed64    = 1,
    Bytes      = 2,
    StartGroup = 3,
    EndGroup   = 4,
    Fixed32    = 5,
}

impl WireType {
    pub fn from_u8(value: u8) -> Option<WireType> {
        match value {
            0 => Some(WireType::Varint),
            1 => Some(WireType::Fixed64),
            2 => Some(WireType::Bytes),
            3 => Some(WireType::StartGroup),
            4 => Some(WireType::EndGroup),
            5 => Some(WireType::Fixed32),
            _ => None,
        }
    }

    /// Name of the matching constant exported by the Go `proto` runtime.
    pub fn go_constant(self) -> &'static str {
        match self {
            WireType::Varint     => "WireVarint",
            WireType::Fixed64    => "WireFixed64",
            WireType::Bytes      => "WireBytes",
            WireType::StartGroup => "WireStartGroup",
            WireType::EndGroup   => "WireEndGroup",
            WireType::Fixed32    => "WireFixed32",
        }
    }
}

/// Packs a field number and wire type into the key that prefixes every field.
pub fn make_key(number: i32, wire: WireType) -> u64 {
    ((number as u32 as u64) << 3) | wire as u64
}

/// Number of bytes `value` occupies as a base-128 varint.
pub fn size_varint(mut value: u64) -> usize {
    let mut n = 1;
    while value >= 0x80 {
        value >>= 7;
        n += 1;
    }
    n
}

/// ZigZag-maps a signed 32-bit integer so small magnitudes stay small.
pub fn zigzag32(value: i32) -> u32 {
    ((value << 1) ^ (value >> 31)) as u32
}

/// ZigZag-maps a signed 64-bit integer so small magnitudes stay small.
pub fn zigzag64(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

pub fn unzigzag32(value: u32) -> i32 {
    ((value >> 1) as i32) ^ -((value & 1) as i32)
}

pub fn unzigzag64(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}
