//! Bounds-checked little-endian byte cursor.
//!
//! Every packet decoder reads through a `ByteReader` instead of slicing the
//! input directly: each `read_*` call advances an internal cursor and fails
//! with [`DecodeError::ShortRead`] rather than panicking when the buffer runs
//! out, per SPEC_FULL.md §4.1 ("short payloads are an error").

use crate::DecodeError;

/// A forward-only cursor over a byte slice.
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
        self.buf.len().saturating_sub(self.pos)
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if self.remaining() < n {
            return Err(DecodeError::ShortRead {
                wanted: n,
                available: self.remaining(),
            });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8, DecodeError> {
        Ok(self.take(1)?[0] as i8)
    }

    pub fn read_u16(&mut self) -> Result<u16, DecodeError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn read_i16(&mut self) -> Result<i16, DecodeError> {
        let b = self.take(2)?;
        Ok(i16::from_le_bytes([b[0], b[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_u64(&mut self) -> Result<u64, DecodeError> {
        let b = self.take(8)?;
        Ok(u64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    /// IEEE-754 32-bit float. NaN/infinity are normalized to `0.0` here;
    /// callers that need to distinguish "missing" from "zero" should check
    /// `is_finite()` on the raw bits before calling this (SPEC_FULL.md §4.1:
    /// "NaN and infinity are mapped to missing at the edge").
    pub fn read_f32(&mut self) -> Result<f32, DecodeError> {
        let b = self.take(4)?;
        let raw = f32::from_le_bytes([b[0], b[1], b[2], b[3]]);
        Ok(if raw.is_finite() { raw } else { 0.0 })
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        self.take(n)
    }

    /// A NUL-padded fixed-length string field, trimmed at the first NUL.
    /// Invalid UTF-8 falls back to a lossy Latin-1 decode byte-by-byte.
    pub fn read_fixed_str(&mut self, len: usize) -> Result<String, DecodeError> {
        let raw = self.take(len)?;
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        let trimmed = &raw[..end];
        Ok(match std::str::from_utf8(trimmed) {
            Ok(s) => s.to_string(),
            Err(_) => trimmed.iter().map(|&b| b as char).collect(),
        })
    }

    pub fn skip(&mut self, n: usize) -> Result<(), DecodeError> {
        self.take(n)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_primitives_in_order() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&42u16.to_le_bytes());
        buf.push(7);
        buf.extend_from_slice(&1.5f32.to_le_bytes());
        let mut r = ByteReader::new(&buf);
        assert_eq!(r.read_u16().unwrap(), 42);
        assert_eq!(r.read_u8().unwrap(), 7);
        assert_eq!(r.read_f32().unwrap(), 1.5);
    }

    #[test]
    fn short_read_is_an_error_not_a_panic() {
        let buf = [0u8; 2];
        let mut r = ByteReader::new(&buf);
        assert!(r.read_u32().is_err());
    }

    #[test]
    fn nan_float_is_mapped_to_missing() {
        let buf = f32::NAN.to_le_bytes();
        let mut r = ByteReader::new(&buf);
        assert_eq!(r.read_f32().unwrap(), 0.0);
    }

    #[test]
    fn fixed_str_trims_at_first_nul() {
        let mut buf = [0u8; 8];
        buf[..5].copy_from_slice(b"HAM\0\0");
        let mut r = ByteReader::new(&buf);
        assert_eq!(r.read_fixed_str(8).unwrap(), "HAM");
    }

    #[test]
    fn fixed_str_falls_back_to_latin1_on_invalid_utf8() {
        let buf = [0xFF, 0x00];
        let mut r = ByteReader::new(&buf);
        let s = r.read_fixed_str(2).unwrap();
        assert_eq!(s.chars().count(), 1);
    }
}
