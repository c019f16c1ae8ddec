//! Bit-packed message buffer shared by every vote packet.
//!
//! Fields are written back to back with no framing or type markers. The
//! cursor is bit-addressed and bits fill each byte LSB-first:
//!
//! ```text
//! bool  -> 1 bit
//! u8    -> 8 bits at the current cursor (may straddle two bytes)
//! i16   -> 16 bits, little-endian
//! i32   -> 32 bits, little-endian
//! str   -> var-u32 byte count, then UTF-8 bytes
//! pad   -> zero bits up to the next byte boundary
//! ```
//!
//! Reader and writer must agree field-for-field; a single skipped field
//! shifts everything after it.

use bit::BitIndex;
use thiserror::Error;

/// A var-u32 never needs more than five 7-bit groups.
const MAX_VAR_U32_BYTES: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("end of message: needed {needed} bits, {remaining} remaining")]
    EndOfMessage { needed: usize, remaining: usize },
    #[error("variable-length integer longer than {MAX_VAR_U32_BYTES} bytes")]
    VarIntOverflow,
}

#[derive(Debug, Default, Clone)]
pub struct MessageWriter {
    buf: Vec<u8>,
    bit_pos: usize,
}

impl MessageWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bits written so far.
    pub fn bit_len(&self) -> usize {
        self.bit_pos
    }

    pub fn write_bool(&mut self, value: bool) {
        self.push_bit(value);
    }

    pub fn write_u8(&mut self, value: u8) {
        self.write_bits(value as u32, 8);
    }

    pub fn write_i16(&mut self, value: i16) {
        self.write_bits(value as u16 as u32, 16);
    }

    pub fn write_i32(&mut self, value: i32) {
        self.write_bits(value as u32, 32);
    }

    pub fn write_var_u32(&mut self, mut value: u32) {
        loop {
            let mut group = (value & 0x7F) as u8;
            value >>= 7;
            if value != 0 {
                group |= 0x80;
            }
            self.write_u8(group);
            if value == 0 {
                break;
            }
        }
    }

    pub fn write_string(&mut self, value: &str) {
        let bytes = value.as_bytes();
        self.write_var_u32(bytes.len() as u32);
        for &b in bytes {
            self.write_u8(b);
        }
    }

    /// Zero-fill up to the next byte boundary.
    pub fn write_pad_bits(&mut self) {
        while self.bit_pos % 8 != 0 {
            self.push_bit(false);
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    fn write_bits(&mut self, value: u32, count: usize) {
        for i in 0..count {
            self.push_bit(value.bit(i));
        }
    }

    fn push_bit(&mut self, value: bool) {
        let index = self.bit_pos / 8;
        if index == self.buf.len() {
            self.buf.push(0);
        }
        self.buf[index].set_bit(self.bit_pos % 8, value);
        self.bit_pos += 1;
    }
}

#[derive(Debug, Clone)]
pub struct MessageReader<'a> {
    buf: &'a [u8],
    bit_pos: usize,
}

impl<'a> MessageReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, bit_pos: 0 }
    }

    pub fn remaining_bits(&self) -> usize {
        (self.buf.len() * 8).saturating_sub(self.bit_pos)
    }

    pub fn read_bool(&mut self) -> Result<bool, CodecError> {
        self.ensure(1)?;
        Ok(self.pop_bit())
    }

    pub fn read_u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.read_bits(8)? as u8)
    }

    pub fn read_i16(&mut self) -> Result<i16, CodecError> {
        Ok(self.read_bits(16)? as u16 as i16)
    }

    pub fn read_i32(&mut self) -> Result<i32, CodecError> {
        Ok(self.read_bits(32)? as i32)
    }

    pub fn read_var_u32(&mut self) -> Result<u32, CodecError> {
        let mut value = 0u32;
        for i in 0..MAX_VAR_U32_BYTES {
            let group = self.read_u8()?;
            value |= ((group & 0x7F) as u32) << (7 * i);
            if group & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(CodecError::VarIntOverflow)
    }

    /// Invalid UTF-8 is replaced rather than rejected.
    pub fn read_string(&mut self) -> Result<String, CodecError> {
        let len = self.read_var_u32()? as usize;
        self.ensure(len.saturating_mul(8))?;
        let bytes = (0..len)
            .map(|_| self.read_bits(8).map(|b| b as u8))
            .collect::<Result<Vec<u8>, _>>()?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Skip to the next byte boundary.
    pub fn read_pad_bits(&mut self) {
        self.bit_pos = (self.bit_pos + 7) & !7;
    }

    fn ensure(&self, needed: usize) -> Result<(), CodecError> {
        let remaining = self.remaining_bits();
        if needed > remaining {
            return Err(CodecError::EndOfMessage { needed, remaining });
        }
        Ok(())
    }

    fn read_bits(&mut self, count: usize) -> Result<u32, CodecError> {
        self.ensure(count)?;
        let mut value = 0u32;
        for i in 0..count {
            value.set_bit(i, self.pop_bit());
        }
        Ok(value)
    }

    fn pop_bit(&mut self) -> bool {
        let bit = self.buf[self.bit_pos / 8].bit(self.bit_pos % 8);
        self.bit_pos += 1;
        bit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bools_pack_lsb_first() {
        let mut w = MessageWriter::new();
        w.write_bool(true);
        w.write_bool(false);
        w.write_bool(true);
        w.write_pad_bits();
        assert_eq!(w.into_bytes(), vec![0b0000_0101]);
    }

    #[test]
    fn test_unaligned_byte_straddles_boundary() {
        let mut w = MessageWriter::new();
        w.write_bool(true);
        w.write_u8(0xFF);
        assert_eq!(w.bit_len(), 9);
        assert_eq!(w.into_bytes(), vec![0xFF, 0x01]);
    }

    #[test]
    fn test_integers_are_little_endian() {
        let mut w = MessageWriter::new();
        w.write_i32(0x0102_0304);
        w.write_i16(-2);
        assert_eq!(w.into_bytes(), vec![0x04, 0x03, 0x02, 0x01, 0xFE, 0xFF]);
    }

    #[test]
    fn test_unaligned_fields_read_back() {
        let mut w = MessageWriter::new();
        w.write_bool(false);
        w.write_i32(-123_456);
        w.write_bool(true);
        w.write_i16(i16::MIN);
        w.write_string("Humpback");
        w.write_pad_bits();
        let bytes = w.into_bytes();

        let mut r = MessageReader::new(&bytes);
        assert!(!r.read_bool().unwrap());
        assert_eq!(r.read_i32().unwrap(), -123_456);
        assert!(r.read_bool().unwrap());
        assert_eq!(r.read_i16().unwrap(), i16::MIN);
        assert_eq!(r.read_string().unwrap(), "Humpback");
        r.read_pad_bits();
        assert_eq!(r.remaining_bits(), 0);
    }

    #[test]
    fn test_var_u32_multi_byte() {
        let mut w = MessageWriter::new();
        w.write_var_u32(300);
        let bytes = w.into_bytes();
        assert_eq!(bytes, vec![0xAC, 0x02]);
        assert_eq!(MessageReader::new(&bytes).read_var_u32().unwrap(), 300);
    }

    #[test]
    fn test_var_u32_overflow_rejected() {
        let bytes = [0xFF; 6];
        assert_eq!(
            MessageReader::new(&bytes).read_var_u32(),
            Err(CodecError::VarIntOverflow)
        );
    }

    #[test]
    fn test_empty_string_is_single_zero() {
        let mut w = MessageWriter::new();
        w.write_string("");
        assert_eq!(w.into_bytes(), vec![0x00]);
    }

    #[test]
    fn test_invalid_utf8_is_lossy() {
        let bytes = [0x02, 0xC3, 0x28];
        let s = MessageReader::new(&bytes).read_string().unwrap();
        assert!(s.contains('\u{FFFD}'));
    }

    #[test]
    fn test_read_past_end_errors() {
        let bytes = [0x01];
        let mut r = MessageReader::new(&bytes);
        r.read_bool().unwrap();
        assert_eq!(
            r.read_u8(),
            Err(CodecError::EndOfMessage { needed: 8, remaining: 7 })
        );
    }

    #[test]
    fn test_string_length_beyond_buffer_errors() {
        let bytes = [0x10, b'a'];
        assert!(matches!(
            MessageReader::new(&bytes).read_string(),
            Err(CodecError::EndOfMessage { .. })
        ));
    }

    #[test]
    fn test_pad_bits_noop_when_aligned() {
        let bytes = [0xAA, 0xBB];
        let mut r = MessageReader::new(&bytes);
        r.read_pad_bits();
        assert_eq!(r.read_u8().unwrap(), 0xAA);
        r.read_bool().unwrap();
        r.read_pad_bits();
        assert_eq!(r.remaining_bits(), 0);
    }
}
