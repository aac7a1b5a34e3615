//! Bounds-checked, big-endian primitive reads over a borrowed byte slice.
//!
//! This is deliberately not a `std::io::Read` impl: every NBT tag needs
//! to know exactly how many bytes it consumed, and the decoder below walks
//! the same slice recursively, so a plain cursor over `&[u8]` is simpler and
//! faster than going through the `Read` trait's error type at every tag.

use crate::error::{Error, Result};

/// A cursor over a byte slice that reads big-endian primitives and never
/// panics: every read is bounds-checked against the remaining input.
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(Error::Truncated {
                offset: self.pos,
                need: n,
                have: self.remaining(),
            });
        }
        let s = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(s)
    }

    pub fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn i8(&mut self) -> Result<i8> {
        Ok(self.u8()? as i8)
    }

    pub fn u16(&mut self) -> Result<u16> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn i16(&mut self) -> Result<i16> {
        Ok(self.u16()? as i16)
    }

    pub fn i32(&mut self) -> Result<i32> {
        let b = self.take(4)?;
        Ok(i32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn i64(&mut self) -> Result<i64> {
        let b = self.take(8)?;
        let mut arr = [0u8; 8];
        arr.copy_from_slice(b);
        Ok(i64::from_be_bytes(arr))
    }

    pub fn f32(&mut self) -> Result<f32> {
        Ok(f32::from_bits(self.u32()?))
    }

    pub fn f64(&mut self) -> Result<f64> {
        let b = self.take(8)?;
        let mut arr = [0u8; 8];
        arr.copy_from_slice(b);
        Ok(f64::from_bits(u64::from_be_bytes(arr)))
    }

    /// Returns a length-bounded, zero-copy slice of the next `len` bytes
    /// without advancing a sub-reader of its own; advances `self` by `len`.
    pub fn slice(&mut self, len: usize) -> Result<&'a [u8]> {
        self.take(len)
    }

    /// Returns a zero-copy sub-reader over the next `len` bytes, advancing
    /// past them in `self`.
    pub fn sub_reader(&mut self, len: usize) -> Result<ByteReader<'a>> {
        Ok(ByteReader::new(self.take(len)?))
    }
}
