//! Transport stream packet.
//!
//! The packet is kept as its raw 188 bytes; the accessors below slice header and payload out of
//! it on demand.
//!
//! # References
//!
//! - [MPEG transport stream](https://en.wikipedia.org/wiki/MPEG_transport_stream)
use byteorder::{BigEndian, ByteOrder};
use std::fmt;

pub use self::accumulator::{Accumulation, Accumulator};
pub use self::reader::{PacketReader, ReadPacket};
pub use self::types::Pid;
pub use self::writer::{PacketWriter, WritePacket};

use crate::{ErrorKind, Result};

mod accumulator;
mod reader;
mod types;
mod writer;

/// Transport stream packet.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Packet([u8; Packet::SIZE]);
impl Packet {
    /// Size of a packet in bytes.
    pub const SIZE: usize = 188;

    /// Synchronization byte.
    ///
    /// Each packet starts with this byte.
    pub const SYNC_BYTE: u8 = 0x47;

    /// Filler used to pad the unused tail of a packet.
    pub const STUFFING_BYTE: u8 = 0xFF;

    /// Makes a new `Packet` instance.
    ///
    /// # Errors
    ///
    /// If the first byte is not `SYNC_BYTE`, it will return an `ErrorKind::InvalidInput` error.
    pub fn new(bytes: [u8; Packet::SIZE]) -> Result<Self> {
        track_assert_eq!(bytes[0], Self::SYNC_BYTE, ErrorKind::InvalidInput);
        Ok(Packet(bytes))
    }

    /// Makes a new `Packet` from a slice that must be exactly `Packet::SIZE` bytes long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        track_assert_eq!(
            bytes.len(),
            Self::SIZE,
            ErrorKind::InvalidInput,
            "Unexpected packet size"
        );
        let mut buf = [0; Packet::SIZE];
        buf.copy_from_slice(bytes);
        track!(Self::new(buf))
    }

    /// Builds a packet from `header` followed by `payload`, padding the rest with `STUFFING_BYTE`.
    pub(crate) fn padded(header: &[u8], payload: &[u8]) -> Result<Self> {
        track_assert!(
            header.len() + payload.len() <= Self::SIZE,
            ErrorKind::InvalidInput,
            "header={}, payload={}",
            header.len(),
            payload.len()
        );
        let mut buf = [Self::STUFFING_BYTE; Packet::SIZE];
        buf[..header.len()].copy_from_slice(header);
        buf[header.len()..header.len() + payload.len()].copy_from_slice(payload);
        track!(Self::new(buf))
    }

    /// Returns the raw bytes of the packet.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0[..]
    }

    /// Returns the packet identifier.
    pub fn pid(&self) -> Pid {
        Pid::from_masked(BigEndian::read_u16(&self.0[1..3]))
    }

    /// Returns `true` if a PES packet or a PSI section starts in this packet.
    pub fn payload_unit_start_indicator(&self) -> bool {
        (self.0[1] & 0b0100_0000) != 0
    }

    /// Returns the 4-bit continuity counter.
    pub fn continuity_counter(&self) -> u8 {
        self.0[3] & 0b0000_1111
    }

    /// Returns `true` if the packet carries payload bytes.
    pub fn has_payload(&self) -> bool {
        self.adaptation_field_control()
            .map_or(false, |c| c.has_payload())
    }

    /// Returns everything before the payload: the 4-byte header and the adaptation field if any.
    pub fn header(&self) -> Result<&[u8]> {
        let len = track!(self.header_len())?;
        Ok(&self.0[..len])
    }

    /// Returns the payload bytes.
    ///
    /// # Errors
    ///
    /// If the packet has no payload, it will return an `ErrorKind::NoPayload` error.
    pub fn payload(&self) -> Result<&[u8]> {
        let control = track!(self.adaptation_field_control())?;
        track_assert!(
            control.has_payload(),
            ErrorKind::NoPayload,
            "pid={}",
            self.pid()
        );
        let len = track!(self.header_len())?;
        Ok(&self.0[len..])
    }

    fn adaptation_field_control(&self) -> Result<AdaptationFieldControl> {
        track!(AdaptationFieldControl::from_u8((self.0[3] >> 4) & 0b11))
    }

    fn header_len(&self) -> Result<usize> {
        let control = track!(self.adaptation_field_control())?;
        if !control.has_adaptation_field() {
            return Ok(4);
        }
        let len = 4 + 1 + self.0[4] as usize;
        track_assert!(
            len <= Self::SIZE,
            ErrorKind::InvalidInput,
            "Too large adaptation field: {}",
            self.0[4]
        );
        Ok(len)
    }
}
impl AsRef<[u8]> for Packet {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}
impl fmt::Debug for Packet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Packet")
            .field("pid", &self.pid())
            .field("pusi", &self.payload_unit_start_indicator())
            .field("cc", &self.continuity_counter())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum AdaptationFieldControl {
    PayloadOnly = 0b01,
    AdaptationFieldOnly = 0b10,
    AdaptationFieldAndPayload = 0b11,
}
impl AdaptationFieldControl {
    fn has_adaptation_field(self) -> bool {
        self != AdaptationFieldControl::PayloadOnly
    }

    fn has_payload(self) -> bool {
        self != AdaptationFieldControl::AdaptationFieldOnly
    }

    fn from_u8(n: u8) -> Result<Self> {
        Ok(match n {
            0b01 => AdaptationFieldControl::PayloadOnly,
            0b10 => AdaptationFieldControl::AdaptationFieldOnly,
            0b11 => AdaptationFieldControl::AdaptationFieldAndPayload,
            0b00 => track_panic!(ErrorKind::InvalidInput, "Reserved for future use"),
            _ => track_panic!(ErrorKind::InvalidInput, "Unexpected value: {}", n),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fixtures;

    #[test]
    fn header_fields() {
        let packet = fixtures::pmt_packets()[0].clone();
        assert_eq!(packet.pid().as_u16(), 100);
        assert!(packet.payload_unit_start_indicator());
        assert_eq!(packet.continuity_counter(), 0);
        assert_eq!(track_try_unwrap!(packet.header()), &[0x47, 0x40, 0x64, 0x10][..]);
        assert_eq!(track_try_unwrap!(packet.payload()).len(), Packet::SIZE - 4);

        let packet = fixtures::pmt_packets()[1].clone();
        assert!(!packet.payload_unit_start_indicator());
        assert_eq!(packet.continuity_counter(), 1);
    }

    #[test]
    fn adaptation_field_is_part_of_header() {
        let mut bytes = [0xFF; Packet::SIZE];
        bytes[..7].copy_from_slice(&[0x47, 0x40, 0x64, 0x30, 0x02, 0x00, 0xAA]);
        bytes[7] = 0x00;
        let packet = track_try_unwrap!(Packet::new(bytes));
        assert_eq!(track_try_unwrap!(packet.header()).len(), 7);
        assert_eq!(track_try_unwrap!(packet.payload())[0], 0x00);
    }

    #[test]
    fn adaptation_field_only() {
        let mut bytes = [0xFF; Packet::SIZE];
        bytes[..5].copy_from_slice(&[0x47, 0x00, 0x64, 0x20, 183]);
        let packet = track_try_unwrap!(Packet::new(bytes));
        assert!(!packet.has_payload());
        assert_eq!(track_try_unwrap!(packet.header()).len(), Packet::SIZE);
        let e = packet.payload().err().unwrap();
        assert_eq!(*e.kind(), ErrorKind::NoPayload);
    }

    #[test]
    fn invalid_packets() {
        assert!(Packet::new([0; Packet::SIZE]).is_err());
        assert!(Packet::from_slice(&[0x47; 10]).is_err());

        let mut bytes = [0xFF; Packet::SIZE];
        bytes[..5].copy_from_slice(&[0x47, 0x00, 0x64, 0x30, 200]);
        let packet = track_try_unwrap!(Packet::new(bytes));
        assert!(packet.header().is_err());
    }

    #[test]
    fn padded() {
        let packet = track_try_unwrap!(Packet::padded(&[0x47, 0x40, 0x64, 0x10], &[0, 2]));
        assert_eq!(&packet.as_bytes()[..6], &[0x47, 0x40, 0x64, 0x10, 0, 2]);
        assert!(packet.as_bytes()[6..].iter().all(|&b| b == Packet::STUFFING_BYTE));
    }
}
