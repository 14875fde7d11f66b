//! Bit-level layout of the PSI header fields.
//!
//! Offsets are relative to the first byte of the structure the field belongs to
//! (the `table_id` byte for section fields, the `stream_type` byte for ES entries).
use byteorder::{BigEndian, ByteOrder};

use crate::{ErrorKind, Result};

/// A bit range within a single byte.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Field8 {
    offset: usize,
    mask: u8,
    shift: u32,
}
impl Field8 {
    const fn new(offset: usize, mask: u8, shift: u32) -> Self {
        Field8 {
            offset,
            mask,
            shift,
        }
    }

    pub fn read(&self, bytes: &[u8]) -> Result<u8> {
        let b = track_assert_some!(
            bytes.get(self.offset),
            ErrorKind::ShortPayload,
            "offset={}, len={}",
            self.offset,
            bytes.len()
        );
        Ok((b & self.mask) >> self.shift)
    }
}

/// A bit range within a big-endian 16-bit word; the field is right-aligned in the word.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Field16 {
    offset: usize,
    mask: u16,
}
impl Field16 {
    const fn new(offset: usize, mask: u16) -> Self {
        Field16 { offset, mask }
    }

    pub fn read(&self, bytes: &[u8]) -> Result<u16> {
        let word = track!(self.word(bytes))?;
        Ok(BigEndian::read_u16(word) & self.mask)
    }

    /// Returns the two bytes of the word with the field set to `value` and every other bit
    /// copied from `bytes`.
    pub fn encode(&self, bytes: &[u8], value: u16) -> Result<[u8; 2]> {
        track_assert!(
            value <= self.mask,
            ErrorKind::InvalidInput,
            "Too large value: {} (mask={:#06x})",
            value,
            self.mask
        );
        let word = track!(self.word(bytes))?;
        let n = (BigEndian::read_u16(word) & !self.mask) | value;
        let mut buf = [0; 2];
        BigEndian::write_u16(&mut buf, n);
        Ok(buf)
    }

    fn word<'a>(&self, bytes: &'a [u8]) -> Result<&'a [u8]> {
        let word = track_assert_some!(
            bytes.get(self.offset..self.offset + 2),
            ErrorKind::ShortPayload,
            "offset={}, len={}",
            self.offset,
            bytes.len()
        );
        Ok(word)
    }
}

// Section header.
pub(crate) const SECTION_LENGTH: Field16 = Field16::new(1, 0x0FFF);
pub(crate) const TABLE_ID_EXTENSION: Field16 = Field16::new(3, 0xFFFF);
pub(crate) const VERSION_NUMBER: Field8 = Field8::new(5, 0b0011_1110, 1);
pub(crate) const CURRENT_NEXT_INDICATOR: Field8 = Field8::new(5, 0b0000_0001, 0);

// PMT section.
pub(crate) const PCR_PID: Field16 = Field16::new(8, 0x1FFF);
pub(crate) const PROGRAM_INFO_LENGTH: Field16 = Field16::new(10, 0x0FFF);

// PMT elementary stream entry.
pub(crate) const ES_STREAM_TYPE: Field8 = Field8::new(0, 0xFF, 0);
pub(crate) const ES_PID: Field16 = Field16::new(1, 0x1FFF);
pub(crate) const ES_INFO_LENGTH: Field16 = Field16::new(3, 0x0FFF);

// PAT entry.
pub(crate) const PROGRAM_NUMBER: Field16 = Field16::new(0, 0xFFFF);
pub(crate) const PROGRAM_MAP_PID: Field16 = Field16::new(2, 0x1FFF);

// Descriptor.
pub(crate) const DESCRIPTOR_TAG: Field8 = Field8::new(0, 0xFF, 0);
pub(crate) const DESCRIPTOR_LENGTH: Field8 = Field8::new(1, 0xFF, 0);
