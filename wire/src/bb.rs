use std::borrow::Cow;
use std::str;

use crate::{make_key, WireType, MAX_FIELD_NUMBER};

/// A protocol buffer byte buffer meant for reading.
///
/// Example usage:
///
/// ```
/// let mut bb = protogo_wire::ByteBuffer::new(&[172, 2, 1, 0, 0, 0]);
/// assert_eq!(bb.read_varint(), Ok(300));
/// assert_eq!(bb.read_fixed32(), Ok(1));
/// ```
///
pub struct ByteBuffer<'a> {
    data: &'a [u8],
    index: usize,
}

impl<'a> ByteBuffer<'a> {
    /// Create a new ByteBuffer that wraps the provided byte slice. The lifetime
    /// of the returned ByteBuffer must not outlive the lifetime of the byte
    /// slice.
    pub fn new(data: &[u8]) -> ByteBuffer {
        ByteBuffer { data, index: 0 }
    }

    /// Retrieves the underlying byte slice.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Retrieves the current index into the underlying byte slice. This starts
    /// off as 0 and ends up as `self.data().len()` when everything has been
    /// read.
    pub fn index(&self) -> usize {
        self.index
    }

    /// True once every byte has been consumed.
    pub fn is_empty(&self) -> bool {
        self.index >= self.data.len()
    }

    /// Try to read a byte starting at the current index.
    pub fn read_byte(&mut self) -> Result<u8, ()> {
        if self.index >= self.data.len() {
            Err(())
        } else {
            let value = self.data[self.index];
            self.index += 1;
            Ok(value)
        }
    }

    /// Try to read `len` raw bytes starting at the current index.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], ()> {
        if self.index + len > self.data.len() {
            Err(())
        } else {
            let value = &self.data[self.index..self.index + len];
            self.index += len;
            Ok(value)
        }
    }

    /// Try to read a base-128 varint of at most ten bytes.
    pub fn read_varint(&mut self) -> Result<u64, ()> {
        let mut result: u64 = 0;

        for shift in (0..64).step_by(7) {
            let byte = self.read_byte()?;
            result |= ((byte & 127) as u64) << shift;

            if (byte & 128) == 0 {
                return Ok(result);
            }
        }

        Err(())
    }

    /// Try to read a little-endian 32-bit value.
    pub fn read_fixed32(&mut self) -> Result<u32, ()> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Try to read a little-endian 64-bit value.
    pub fn read_fixed64(&mut self) -> Result<u64, ()> {
        let bytes = self.read_bytes(8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(bytes);
        Ok(u64::from_le_bytes(raw))
    }

    /// Try to read a ZigZag-encoded signed 32-bit varint.
    pub fn read_zigzag32(&mut self) -> Result<i32, ()> {
        Ok(crate::unzigzag32(self.read_varint()? as u32))
    }

    /// Try to read a ZigZag-encoded signed 64-bit varint.
    pub fn read_zigzag64(&mut self) -> Result<i64, ()> {
        Ok(crate::unzigzag64(self.read_varint()?))
    }

    /// Try to read a field key, returning the field number and wire type.
    pub fn read_key(&mut self) -> Result<(i32, WireType), ()> {
        let key = self.read_varint()?;
        let wire = WireType::from_u8((key & 7) as u8).ok_or(())?;
        let number = key >> 3;
        if number == 0 || number > MAX_FIELD_NUMBER as u64 {
            return Err(());
        }
        Ok((number as i32, wire))
    }

    /// Try to read a varint length prefix followed by that many bytes.
    pub fn read_length_delimited(&mut self) -> Result<&'a [u8], ()> {
        let len = self.read_varint()?;
        self.read_bytes(usize::try_from(len).map_err(|_| ())?)
    }

    /// Try to read a length-delimited UTF-8 string. Invalid sequences are
    /// replaced rather than rejected.
    pub fn read_string(&mut self) -> Result<Cow<'a, str>, ()> {
        Ok(String::from_utf8_lossy(self.read_length_delimited()?))
    }

    /// Skip the payload of a field whose key has already been read. Groups
    /// are skipped up to and including their matching end marker.
    pub fn skip_field(&mut self, number: i32, wire: WireType) -> Result<(), ()> {
        match wire {
            WireType::Varint => self.read_varint().map(|_| ()),
            WireType::Fixed64 => self.read_bytes(8).map(|_| ()),
            WireType::Fixed32 => self.read_bytes(4).map(|_| ()),
            WireType::Bytes => self.read_length_delimited().map(|_| ()),
            WireType::StartGroup => loop {
                let (inner, inner_wire) = self.read_key()?;
                if inner_wire == WireType::EndGroup {
                    return if inner == number { Ok(()) } else { Err(()) };
                }
                self.skip_field(inner, inner_wire)?;
            },
            WireType::EndGroup => Err(()),
        }
    }
}

#[test]
fn read_byte() {
    let read = |bytes| ByteBuffer::new(bytes).read_byte();
    assert_eq!(read(&[]), Err(()));
    assert_eq!(read(&[0]), Ok(0));
    assert_eq!(read(&[1]), Ok(1));
    assert_eq!(read(&[254]), Ok(254));
    assert_eq!(read(&[255]), Ok(255));
}

#[test]
fn read_bytes() {
    let read = |bytes, len| ByteBuffer::new(bytes).read_bytes(len);
    assert_eq!(read(&[], 0), Ok(vec![].as_slice()));
    assert_eq!(read(&[], 1), Err(()));
    assert_eq!(read(&[0], 0), Ok(vec![].as_slice()));
    assert_eq!(read(&[0], 1), Ok(vec![0].as_slice()));
    assert_eq!(read(&[0], 2), Err(()));

    let mut bb = ByteBuffer::new(&[1, 2, 3, 4, 5]);
    assert_eq!(bb.read_bytes(3), Ok(vec![1, 2, 3].as_slice()));
    assert_eq!(bb.read_bytes(2), Ok(vec![4, 5].as_slice()));
    assert_eq!(bb.read_bytes(1), Err(()));
    assert!(bb.is_empty());
}

#[test]
fn read_varint() {
    let read = |bytes| ByteBuffer::new(bytes).read_varint();
    assert_eq!(read(&[]), Err(()));
    assert_eq!(read(&[0]), Ok(0));
    assert_eq!(read(&[1]), Ok(1));
    assert_eq!(read(&[127]), Ok(127));
    assert_eq!(read(&[128]), Err(()));
    assert_eq!(read(&[128, 1]), Ok(128));
    assert_eq!(read(&[150, 1]), Ok(150));
    assert_eq!(read(&[172, 2]), Ok(300));
    assert_eq!(read(&[255, 255, 255, 255, 15]), Ok(4294967295));
    assert_eq!(
        read(&[255, 255, 255, 255, 255, 255, 255, 255, 255, 1]),
        Ok(u64::MAX)
    );
    assert_eq!(
        read(&[255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 1]),
        Err(())
    );
}

#[test]
fn read_fixed() {
    assert_eq!(ByteBuffer::new(&[1, 0, 0, 0]).read_fixed32(), Ok(1));
    assert_eq!(ByteBuffer::new(&[0, 0, 0, 128]).read_fixed32(), Ok(1 << 31));
    assert_eq!(ByteBuffer::new(&[1, 0, 0]).read_fixed32(), Err(()));
    assert_eq!(
        ByteBuffer::new(&[1, 2, 0, 0, 0, 0, 0, 0]).read_fixed64(),
        Ok(513)
    );
    assert_eq!(ByteBuffer::new(&[0; 7]).read_fixed64(), Err(()));
}

#[test]
fn read_zigzag() {
    assert_eq!(ByteBuffer::new(&[0]).read_zigzag32(), Ok(0));
    assert_eq!(ByteBuffer::new(&[1]).read_zigzag32(), Ok(-1));
    assert_eq!(ByteBuffer::new(&[2]).read_zigzag32(), Ok(1));
    assert_eq!(ByteBuffer::new(&[3]).read_zigzag64(), Ok(-2));
    assert_eq!(
        ByteBuffer::new(&[255, 255, 255, 255, 15]).read_zigzag32(),
        Ok(i32::MIN)
    );
}

#[test]
fn read_key() {
    let read = |bytes| ByteBuffer::new(bytes).read_key();
    assert_eq!(read(&[8]), Ok((1, WireType::Varint)));
    assert_eq!(read(&[18]), Ok((2, WireType::Bytes)));
    assert_eq!(read(&[128, 1]), Ok((16, WireType::Varint)));
    assert_eq!(read(&[0]), Err(()));
    assert_eq!(read(&[14]), Err(()));
}

#[test]
fn read_string() {
    let read = |bytes| ByteBuffer::new(bytes).read_string();
    assert_eq!(read(&[]), Err(()));
    assert_eq!(read(&[0]), Ok(Cow::Borrowed("")));
    assert_eq!(read(&[1]), Err(()));
    assert_eq!(read(&[3, 97, 98, 99]), Ok(Cow::Borrowed("abc")));
    assert_eq!(read(&[4, 240, 159, 141, 149]), Ok(Cow::Borrowed("🍕")));
}

#[test]
fn skip_fields() {
    // 1: varint 150, 2: group { 3: fixed32 }, 4: bytes "x"
    let data = [8, 150, 1, 19, 29, 1, 0, 0, 0, 20, 34, 1, 120];
    let mut bb = ByteBuffer::new(&data);

    let (n, w) = bb.read_key().unwrap();
    assert_eq!((n, w), (1, WireType::Varint));
    assert_eq!(bb.skip_field(n, w), Ok(()));

    let (n, w) = bb.read_key().unwrap();
    assert_eq!((n, w), (2, WireType::StartGroup));
    assert_eq!(bb.skip_field(n, w), Ok(()));

    let (n, w) = bb.read_key().unwrap();
    assert_eq!((n, w), (4, WireType::Bytes));
    assert_eq!(bb.read_length_delimited(), Ok(&b"x"[..]));
    assert!(bb.is_empty());
}

#[test]
fn skip_mismatched_group() {
    // group 2 closed by an end marker for field 5
    let mut bb = ByteBuffer::new(&[19, 44]);
    let (n, w) = bb.read_key().unwrap();
    assert_eq!(bb.skip_field(n, w), Err(()));
}

/// A protocol buffer byte buffer meant for writing.
///
/// Example usage:
///
/// ```
/// let mut bb = protogo_wire::ByteBufferMut::new();
/// bb.write_varint(300);
/// bb.write_zigzag32(-1);
/// assert_eq!(bb.data(), [172, 2, 1]);
/// ```
///
#[derive(Default)]
pub struct ByteBufferMut {
    data: Vec<u8>,
}

impl ByteBufferMut {
    /// Creates an empty ByteBufferMut ready for writing.
    pub fn new() -> ByteBufferMut {
        ByteBufferMut { data: vec![] }
    }

    /// Consumes this buffer and returns the underlying backing store. Use this
    /// to get the data out when you're done writing to the buffer.
    pub fn data(self) -> Vec<u8> {
        self.data
    }

    /// Returns the number of bytes written so far.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Write a byte to the end of the buffer.
    pub fn write_byte(&mut self, value: u8) {
        self.data.push(value);
    }

    /// Write a raw byte slice to the end of the buffer.
    pub fn write_bytes(&mut self, value: &[u8]) {
        self.data.extend_from_slice(value);
    }

    /// Write a base-128 varint to the end of the buffer.
    pub fn write_varint(&mut self, mut value: u64) {
        while value >= 128 {
            self.write_byte((value as u8 & 127) | 128);
            value >>= 7;
        }
        self.write_byte(value as u8);
    }

    /// Write a little-endian 32-bit value to the end of the buffer.
    pub fn write_fixed32(&mut self, value: u32) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    /// Write a little-endian 64-bit value to the end of the buffer.
    pub fn write_fixed64(&mut self, value: u64) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_zigzag32(&mut self, value: i32) {
        self.write_varint(crate::zigzag32(value) as u64);
    }

    pub fn write_zigzag64(&mut self, value: i64) {
        self.write_varint(crate::zigzag64(value));
    }

    /// Write the key announcing field `number` with the given wire type.
    pub fn write_key(&mut self, number: i32, wire: WireType) {
        self.write_varint(make_key(number, wire));
    }

    /// Write a varint length prefix followed by the bytes themselves.
    pub fn write_length_delimited(&mut self, value: &[u8]) {
        self.write_varint(value.len() as u64);
        self.write_bytes(value);
    }

    pub fn write_string(&mut self, value: &str) {
        self.write_length_delimited(value.as_bytes());
    }
}

#[cfg(test)]
fn write_once(cb: fn(&mut ByteBufferMut)) -> Vec<u8> {
    let mut bb = ByteBufferMut::new();
    cb(&mut bb);
    bb.data()
}

#[test]
fn write_varint() {
    assert_eq!(write_once(|bb| bb.write_varint(0)), [0]);
    assert_eq!(write_once(|bb| bb.write_varint(1)), [1]);
    assert_eq!(write_once(|bb| bb.write_varint(127)), [127]);
    assert_eq!(write_once(|bb| bb.write_varint(128)), [128, 1]);
    assert_eq!(write_once(|bb| bb.write_varint(300)), [172, 2]);
    assert_eq!(
        write_once(|bb| bb.write_varint(-1i64 as u64)),
        [255, 255, 255, 255, 255, 255, 255, 255, 255, 1]
    );
}

#[test]
fn write_fixed() {
    assert_eq!(write_once(|bb| bb.write_fixed32(1)), [1, 0, 0, 0]);
    assert_eq!(write_once(|bb| bb.write_fixed64(513)), [1, 2, 0, 0, 0, 0, 0, 0]);
    assert_eq!(
        write_once(|bb| bb.write_fixed64(1.5f64.to_bits())),
        [0, 0, 0, 0, 0, 0, 248, 63]
    );
}

#[test]
fn write_zigzag() {
    assert_eq!(write_once(|bb| bb.write_zigzag32(0)), [0]);
    assert_eq!(write_once(|bb| bb.write_zigzag32(-1)), [1]);
    assert_eq!(write_once(|bb| bb.write_zigzag32(1)), [2]);
    assert_eq!(write_once(|bb| bb.write_zigzag64(-64)), [127]);
    assert_eq!(write_once(|bb| bb.write_zigzag64(64)), [128, 1]);
}

#[test]
fn write_key_and_payload() {
    assert_eq!(write_once(|bb| bb.write_key(1, WireType::Varint)), [8]);
    assert_eq!(write_once(|bb| bb.write_key(16, WireType::Bytes)), [130, 1]);
    assert_eq!(write_once(|bb| bb.write_string("abc")), [3, 97, 98, 99]);
    assert_eq!(write_once(|bb| bb.write_length_delimited(&[])), [0]);
}

#[test]
fn write_read_sequence() {
    let mut out = ByteBufferMut::new();
    out.write_key(1, WireType::Fixed64);
    out.write_fixed64((-2.25f64).to_bits());
    out.write_key(2, WireType::Varint);
    out.write_zigzag64(-300);
    out.write_key(3, WireType::Bytes);
    out.write_string("🍕");
    let data = out.data();

    let mut bb = ByteBuffer::new(&data);
    assert_eq!(bb.read_key(), Ok((1, WireType::Fixed64)));
    assert_eq!(bb.read_fixed64().map(f64::from_bits), Ok(-2.25));
    assert_eq!(bb.read_key(), Ok((2, WireType::Varint)));
    assert_eq!(bb.read_zigzag64(), Ok(-300));
    assert_eq!(bb.read_key(), Ok((3, WireType::Bytes)));
    assert_eq!(bb.read_string(), Ok(Cow::Borrowed("🍕")));
    assert!(bb.is_empty());
}
