//! A position-tracked byte buffer.
//!
//! All multi-byte fixed-width values are little-endian.

use std::io::{Cursor, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{NetError, NetResult};

const SEGMENT_BITS: u8 = 0x7F;
const CONTINUE_BIT: u8 = 0x80;

/// Maximum encoded length of a 32-bit varint.
pub const MAX_VARINT32_LEN: usize = 5;
/// Maximum encoded length of a 64-bit varint.
pub const MAX_VARINT64_LEN: usize = 10;

/// Sequential reader and writer over one owned buffer.
///
/// Writes overwrite bytes at the offset and grow the
/// buffer past its end. Reads never go past the end:
/// a short read is a [`NetError::MalformedData`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByteCursor {
    inner: Cursor<Vec<u8>>,
}

impl From<Vec<u8>> for ByteCursor {
    fn from(buffer: Vec<u8>) -> Self {
        Self {
            inner: Cursor::new(buffer),
        }
    }
}

impl From<&[u8]> for ByteCursor {
    fn from(buffer: &[u8]) -> Self {
        Self::from(buffer.to_vec())
    }
}

impl ByteCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::from(Vec::with_capacity(capacity))
    }

    /// The current read/write offset.
    pub fn offset(&self) -> usize {
        self.inner.position() as usize
    }

    /// Moves the offset. Fails if `offset` lies past the end of the buffer.
    pub fn set_offset(&mut self, offset: usize) -> NetResult<()> {
        if offset > self.len() {
            return Err(NetError::malformed(format!(
                "offset {offset} past end of {} byte buffer",
                self.len()
            )));
        }
        self.inner.set_position(offset as u64);
        Ok(())
    }

    /// Advances the offset by `count` bytes without reading them.
    pub fn skip(&mut self, count: usize) -> NetResult<()> {
        self.set_offset(self.offset().saturating_add(count))
    }

    /// Rewinds to the start without clearing the contents.
    pub fn reset_stream(&mut self) {
        self.inner.set_position(0);
    }

    /// Drops every byte at or after the offset.
    pub fn truncate(&mut self) {
        let offset = self.offset();
        self.inner.get_mut().truncate(offset);
    }

    pub fn len(&self) -> usize {
        self.inner.get_ref().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.get_ref().is_empty()
    }

    /// Number of bytes left to read.
    pub fn remaining(&self) -> usize {
        self.len().saturating_sub(self.offset())
    }

    pub fn remaining_slice(&self) -> &[u8] {
        &self.inner.get_ref()[self.offset().min(self.len())..]
    }

    pub fn as_slice(&self) -> &[u8] {
        self.inner.get_ref()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.inner.into_inner()
    }

    fn ensure_remaining(&self, count: usize) -> NetResult<()> {
        if self.remaining() < count {
            return Err(NetError::malformed(format!(
                "needed {count} bytes, {} remaining",
                self.remaining()
            )));
        }
        Ok(())
    }

    pub fn get_u8(&mut self) -> NetResult<u8> {
        Ok(self.inner.read_u8()?)
    }

    pub fn put_u8(&mut self, value: u8) -> NetResult<()> {
        Ok(self.inner.write_u8(value)?)
    }

    /// One byte, nonzero is true.
    pub fn get_bool(&mut self) -> NetResult<bool> {
        Ok(self.get_u8()? != 0)
    }

    pub fn put_bool(&mut self, value: bool) -> NetResult<()> {
        self.put_u8(value as u8)
    }

    pub fn get_i16(&mut self) -> NetResult<i16> {
        Ok(self.inner.read_i16::<LittleEndian>()?)
    }

    pub fn put_i16(&mut self, value: i16) -> NetResult<()> {
        Ok(self.inner.write_i16::<LittleEndian>(value)?)
    }

    pub fn get_u16(&mut self) -> NetResult<u16> {
        Ok(self.inner.read_u16::<LittleEndian>()?)
    }

    pub fn put_u16(&mut self, value: u16) -> NetResult<()> {
        Ok(self.inner.write_u16::<LittleEndian>(value)?)
    }

    pub fn get_i32(&mut self) -> NetResult<i32> {
        Ok(self.inner.read_i32::<LittleEndian>()?)
    }

    pub fn put_i32(&mut self, value: i32) -> NetResult<()> {
        Ok(self.inner.write_i32::<LittleEndian>(value)?)
    }

    pub fn get_u32(&mut self) -> NetResult<u32> {
        Ok(self.inner.read_u32::<LittleEndian>()?)
    }

    pub fn put_u32(&mut self, value: u32) -> NetResult<()> {
        Ok(self.inner.write_u32::<LittleEndian>(value)?)
    }

    pub fn get_i64(&mut self) -> NetResult<i64> {
        Ok(self.inner.read_i64::<LittleEndian>()?)
    }

    pub fn put_i64(&mut self, value: i64) -> NetResult<()> {
        Ok(self.inner.write_i64::<LittleEndian>(value)?)
    }

    pub fn get_u64(&mut self) -> NetResult<u64> {
        Ok(self.inner.read_u64::<LittleEndian>()?)
    }

    pub fn put_u64(&mut self, value: u64) -> NetResult<()> {
        Ok(self.inner.write_u64::<LittleEndian>(value)?)
    }

    pub fn get_f32(&mut self) -> NetResult<f32> {
        Ok(self.inner.read_f32::<LittleEndian>()?)
    }

    pub fn put_f32(&mut self, value: f32) -> NetResult<()> {
        Ok(self.inner.write_f32::<LittleEndian>(value)?)
    }

    pub fn get_uvarint32(&mut self) -> NetResult<u32> {
        let mut value = 0u32;
        for i in 0..MAX_VARINT32_LEN {
            let byte = self.get_u8()?;
            // the last byte carries the top 4 bits only
            if i == MAX_VARINT32_LEN - 1 && byte > 0x0f {
                return Err(NetError::malformed("varint overflows 32 bits"));
            }
            value |= u32::from(byte & SEGMENT_BITS) << (7 * i);
            if byte & CONTINUE_BIT == 0 {
                return Ok(value);
            }
        }
        Err(NetError::malformed("varint exceeds 5 bytes"))
    }

    pub fn put_uvarint32(&mut self, mut value: u32) -> NetResult<()> {
        loop {
            if value & !u32::from(SEGMENT_BITS) == 0 {
                return self.put_u8(value as u8);
            }
            self.put_u8((value as u8 & SEGMENT_BITS) | CONTINUE_BIT)?;
            value >>= 7;
        }
    }

    pub fn get_uvarint64(&mut self) -> NetResult<u64> {
        let mut value = 0u64;
        for i in 0..MAX_VARINT64_LEN {
            let byte = self.get_u8()?;
            if i == MAX_VARINT64_LEN - 1 && byte > 0x01 {
                return Err(NetError::malformed("varlong overflows 64 bits"));
            }
            value |= u64::from(byte & SEGMENT_BITS) << (7 * i);
            if byte & CONTINUE_BIT == 0 {
                return Ok(value);
            }
        }
        Err(NetError::malformed("varlong exceeds 10 bytes"))
    }

    pub fn put_uvarint64(&mut self, mut value: u64) -> NetResult<()> {
        loop {
            if value & !u64::from(SEGMENT_BITS) == 0 {
                return self.put_u8(value as u8);
            }
            self.put_u8((value as u8 & SEGMENT_BITS) | CONTINUE_BIT)?;
            value >>= 7;
        }
    }

    /// Zig-zag encoded signed varint.
    pub fn get_varint32(&mut self) -> NetResult<i32> {
        let raw = self.get_uvarint32()?;
        Ok((raw >> 1) as i32 ^ -((raw & 1) as i32))
    }

    pub fn put_varint32(&mut self, value: i32) -> NetResult<()> {
        self.put_uvarint32(((value << 1) ^ (value >> 31)) as u32)
    }

    /// Zig-zag encoded signed varlong.
    pub fn get_varint64(&mut self) -> NetResult<i64> {
        let raw = self.get_uvarint64()?;
        Ok((raw >> 1) as i64 ^ -((raw & 1) as i64))
    }

    pub fn put_varint64(&mut self, value: i64) -> NetResult<()> {
        self.put_uvarint64(((value << 1) ^ (value >> 63)) as u64)
    }

    /// Reads an unsigned varint and rewinds to where it started.
    pub fn peek_uvarint32(&mut self) -> NetResult<u32> {
        let offset = self.offset();
        let value = self.get_uvarint32();
        self.inner.set_position(offset as u64);
        value
    }

    pub fn get_bytes(&mut self, count: usize) -> NetResult<Vec<u8>> {
        self.ensure_remaining(count)?;
        let mut bytes = vec![0; count];
        self.inner.read_exact(&mut bytes)?;
        Ok(bytes)
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) -> NetResult<()> {
        Ok(self.inner.write_all(bytes)?)
    }

    /// A varint length prefix followed by that many raw bytes.
    pub fn get_string_bytes(&mut self) -> NetResult<Vec<u8>> {
        let len = self.get_uvarint32()? as usize;
        self.get_bytes(len)
    }

    /// Only the length is checked. Invalid UTF-8 sequences become
    /// U+FFFD.
    pub fn get_string(&mut self) -> NetResult<String> {
        let bytes = self.get_string_bytes()?;
        Ok(match String::from_utf8(bytes) {
            Ok(s) => s,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        })
    }

    pub fn put_string(&mut self, value: &str) -> NetResult<()> {
        let len = u32::try_from(value.len())
            .map_err(|_| NetError::malformed("string longer than u32::MAX bytes"))?;
        self.put_uvarint32(len)?;
        self.put_bytes(value.as_bytes())
    }
}

/// Encoded length of `value` as an unsigned varint.
pub fn uvarint32_len(value: u32) -> usize {
    match value {
        0..=0x7F => 1,
        0x80..=0x3FFF => 2,
        0x4000..=0x1F_FFFF => 3,
        0x20_0000..=0xFFF_FFFF => 4,
        _ => 5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn written(f: impl FnOnce(&mut ByteCursor) -> NetResult<()>) -> Vec<u8> {
        let mut c = ByteCursor::new();
        f(&mut c).unwrap();
        c.into_inner()
    }

    #[test]
    fn uvarint32_encoding() {
        macro_rules! test {
            ($a:expr, $b:expr) => {{
                assert_eq!(written(|c| c.put_uvarint32($a)), $b.to_vec());
                let mut c = ByteCursor::from($b.to_vec());
                assert_eq!(c.get_uvarint32().unwrap(), $a);
                assert_eq!(c.remaining(), 0);
                assert_eq!(uvarint32_len($a), $b.len());
            }};
        }

        test!(0, [0x00]);
        test!(1, [0x01]);
        test!(127, [0x7f]);
        test!(128, [0x80, 0x01]);
        test!(255, [0xff, 0x01]);
        test!(25565, [0xdd, 0xc7, 0x01]);
        test!(2097151, [0xff, 0xff, 0x7f]);
        test!(u32::MAX, [0xff, 0xff, 0xff, 0xff, 0x0f]);
    }

    #[test]
    fn zigzag_encoding() {
        assert_eq!(written(|c| c.put_varint32(0)), [0x00]);
        assert_eq!(written(|c| c.put_varint32(-1)), [0x01]);
        assert_eq!(written(|c| c.put_varint32(1)), [0x02]);
        assert_eq!(written(|c| c.put_varint32(-64)), [0x7f]);
        assert_eq!(written(|c| c.put_varint32(64)), [0x80, 0x01]);

        for v in [0, 1, -1, 63, -64, i32::MAX, i32::MIN] {
            let mut c = ByteCursor::from(written(|c| c.put_varint32(v)));
            assert_eq!(c.get_varint32().unwrap(), v);
        }
        for v in [0, -1, i64::MAX, i64::MIN, 1 << 40] {
            let mut c = ByteCursor::from(written(|c| c.put_varint64(v)));
            assert_eq!(c.get_varint64().unwrap(), v);
        }
    }

    #[test]
    fn uvarint64_bounds() {
        let bytes = written(|c| c.put_uvarint64(u64::MAX));
        assert_eq!(bytes.len(), MAX_VARINT64_LEN);
        let mut c = ByteCursor::from(bytes);
        assert_eq!(c.get_uvarint64().unwrap(), u64::MAX);
    }

    #[test]
    fn overlong_varint_is_malformed() {
        let mut c = ByteCursor::from(vec![0xff; 6]);
        assert!(matches!(c.get_uvarint32(), Err(NetError::MalformedData(_))));
        let mut c = ByteCursor::from(vec![0xff; 11]);
        assert!(matches!(c.get_uvarint64(), Err(NetError::MalformedData(_))));
    }

    #[test]
    fn varint_overflowing_last_byte_is_malformed() {
        let mut c = ByteCursor::from(vec![0xff, 0xff, 0xff, 0xff, 0x7f]);
        assert!(matches!(c.get_uvarint32(), Err(NetError::MalformedData(_))));
        let mut c = ByteCursor::from(vec![0xff, 0xff, 0xff, 0xff, 0x10]);
        assert!(matches!(c.get_uvarint32(), Err(NetError::MalformedData(_))));

        let mut overlong = vec![0xff; 9];
        overlong.push(0x02);
        let mut c = ByteCursor::from(overlong);
        assert!(matches!(c.get_uvarint64(), Err(NetError::MalformedData(_))));
    }

    #[test]
    fn truncated_varint_is_malformed() {
        let mut c = ByteCursor::from(vec![0x80, 0x80]);
        assert!(matches!(c.get_uvarint32(), Err(NetError::MalformedData(_))));
    }

    #[test]
    fn fixed_width_little_endian() {
        let bytes = written(|c| {
            c.put_u16(0x0102)?;
            c.put_i32(-2)?;
            c.put_u64(0x0102030405060708)?;
            c.put_f32(1.5)
        });
        assert_eq!(&bytes[..2], &[0x02, 0x01]);
        assert_eq!(&bytes[2..6], &[0xfe, 0xff, 0xff, 0xff]);
        assert_eq!(&bytes[6..14], &[8, 7, 6, 5, 4, 3, 2, 1]);

        let mut c = ByteCursor::from(bytes);
        assert_eq!(c.get_u16().unwrap(), 0x0102);
        assert_eq!(c.get_i32().unwrap(), -2);
        assert_eq!(c.get_u64().unwrap(), 0x0102030405060708);
        assert_eq!(c.get_f32().unwrap(), 1.5);
    }

    #[test]
    fn reading_past_end_fails() {
        let mut c = ByteCursor::from(vec![1, 2, 3]);
        assert!(c.get_u32().is_err());
        c.reset_stream();
        assert!(c.get_bytes(4).is_err());
        assert_eq!(c.offset(), 0);
        assert!(c.set_offset(4).is_err());
        assert!(c.skip(3).is_ok());
        assert!(matches!(c.get_bool(), Err(NetError::MalformedData(_))));
    }

    #[test]
    fn strings() {
        let bytes = written(|c| {
            c.put_string("")?;
            c.put_string("héllo")
        });
        assert_eq!(bytes[0], 0);
        assert_eq!(bytes[1], 6);
        let mut c = ByteCursor::from(bytes);
        assert_eq!(c.get_string().unwrap(), "");
        assert_eq!(c.get_string().unwrap(), "héllo");

        // length prefix claims more than is there
        let mut c = ByteCursor::from(vec![5, b'a', b'b']);
        assert!(matches!(c.get_string(), Err(NetError::MalformedData(_))));

        let mut c = ByteCursor::from(vec![3, b'a', 0xff, 0xfe]);
        assert_eq!(c.get_string().unwrap(), "a\u{fffd}\u{fffd}");
        assert_eq!(c.remaining(), 0);
    }

    #[test]
    fn reset_overwrites_in_place() {
        let mut c = ByteCursor::from(vec![9, 9, 9, 9]);
        c.put_u8(1).unwrap();
        assert_eq!(c.as_slice(), &[1, 9, 9, 9]);
        c.reset_stream();
        c.put_u16(0x0302).unwrap();
        assert_eq!(c.len(), 4);
        c.truncate();
        assert_eq!(c.as_slice(), &[2, 3]);
    }

    #[test]
    fn peek_does_not_consume() {
        let mut c = ByteCursor::from(vec![0x80, 0x01, 0x00]);
        assert_eq!(c.peek_uvarint32().unwrap(), 128);
        assert_eq!(c.offset(), 0);
    }
}
