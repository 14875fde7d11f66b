//! Program specific information.
//!
//! A PSI payload starts with a pointer field followed by one or more sections:
//!
//! ```text
//! pointer_field (8) | stuffing (8 * pointer_field)
//! table_id (8) | flags (4) | section_length (12) | body ... | CRC_32 (32)
//! table_id (8) | ...
//! 0xFF 0xFF ...
//! ```
//!
//! Sections can span several TS packets; [`psi_accumulator_done`] tells an
//! [`Accumulator`](crate::packet::Accumulator) when all of them have arrived.
use byteorder::{BigEndian, ByteOrder};
use crc::{Crc, CRC_32_MPEG_2};
use trackable::error::ErrorKindExt;

pub use self::es::{Descriptor, ElementaryStream, StreamType};
pub use self::filter::{filter_pmt_packets_to_pids, FilteredPmt};
pub use self::pat::{is_pmt, read_pat, Pat, ProgramMap};
pub use self::pmt::{read_pmt, MultiSectionPolicy, Pmt, PmtParser};

use self::fields::SECTION_LENGTH;
use crate::packet::{Accumulation, Accumulator, Packet, Pid, ReadPacket};
use crate::{ErrorKind, Result};

mod es;
mod fields;
mod filter;
mod pat;
mod pmt;

/// Number of bytes preceding the section body: `table_id` and the flags/`section_length` word.
pub const SECTION_HEADER_LEN: usize = 3;

/// Size of the CRC_32 trailer of a section.
pub const CRC_LEN: usize = 4;

const CRC_MPEG: Crc<u32> = Crc::<u32>::new(&CRC_32_MPEG_2);

/// Returns the pointer field of a PSI payload.
pub fn pointer_field(payload: &[u8]) -> Result<u8> {
    let b = track_assert_some!(payload.first(), ErrorKind::ShortPayload, "Empty payload");
    Ok(*b)
}

/// Returns the offset of the first section in a PSI payload.
pub(crate) fn section_start(payload: &[u8]) -> Result<usize> {
    let start = 1 + track!(pointer_field(payload))? as usize;
    track_assert!(
        start <= payload.len(),
        ErrorKind::ShortPayload,
        "pointer_field={}, len={}",
        start - 1,
        payload.len()
    );
    Ok(start)
}

/// Completion predicate for accumulating PSI payloads.
///
/// Returns `true` once every section announced in `payload` is fully contained in it.
/// A section list ends at a stuffing byte (`0xFF`) or when fewer than 3 bytes remain.
/// This does not depend on the table type, so it can be used for PAT, PMT or any other table.
pub fn psi_accumulator_done(payload: &[u8]) -> Result<bool> {
    if payload.is_empty() {
        return Ok(false);
    }
    let start = 1 + payload[0] as usize;
    if payload.len() < start {
        return Ok(false);
    }

    let mut rest = &payload[start..];
    while rest.len() >= SECTION_HEADER_LEN && rest[0] != Packet::STUFFING_BYTE {
        let len = SECTION_HEADER_LEN + track!(SECTION_LENGTH.read(rest))? as usize;
        if rest.len() < len {
            return Ok(false);
        }
        rest = &rest[len..];
    }
    Ok(true)
}

/// Returns an iterator over the sections of an accumulated PSI payload.
pub fn sections(payload: &[u8]) -> Result<Sections<'_>> {
    let start = track!(section_start(payload))?;
    Ok(Sections {
        rest: &payload[start..],
    })
}

/// Iterator over the sections of a PSI payload.
///
/// Yields an `ErrorKind::ShortPayload` error (and then stops) if a section runs past the end
/// of the payload.
#[derive(Debug)]
pub struct Sections<'a> {
    rest: &'a [u8],
}
impl<'a> Iterator for Sections<'a> {
    type Item = Result<Section<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.rest;
        if rest.len() < SECTION_HEADER_LEN || rest[0] == Packet::STUFFING_BYTE {
            return None;
        }
        let len = match track!(SECTION_LENGTH.read(rest)) {
            Ok(n) => SECTION_HEADER_LEN + n as usize,
            Err(e) => return Some(Err(e)),
        };
        if rest.len() < len {
            self.rest = &[];
            let e = track!(crate::Error::from(
                ErrorKind::ShortPayload.cause(format!(
                    "Truncated section: table_id={}, section_length={}, available={}",
                    rest[0],
                    len - SECTION_HEADER_LEN,
                    rest.len()
                ))
            ));
            return Some(Err(e));
        }
        let (bytes, rest) = rest.split_at(len);
        self.rest = rest;
        Some(Ok(Section { bytes }))
    }
}

/// A complete PSI section, from `table_id` through `CRC_32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section<'a> {
    bytes: &'a [u8],
}
impl<'a> Section<'a> {
    /// Returns the table identifier.
    pub fn table_id(&self) -> u8 {
        self.bytes[0]
    }

    /// Returns the value of the 12-bit `section_length` field.
    pub fn section_length(&self) -> u16 {
        (self.bytes.len() - SECTION_HEADER_LEN) as u16
    }

    /// Returns the whole section.
    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Returns the CRC_32 stored at the end of the section.
    pub fn crc32(&self) -> Result<u32> {
        track_assert!(
            self.bytes.len() >= SECTION_HEADER_LEN + CRC_LEN,
            ErrorKind::ShortPayload,
            "section_length={}",
            self.section_length()
        );
        Ok(BigEndian::read_u32(&self.bytes[self.bytes.len() - CRC_LEN..]))
    }

    /// Checks the stored CRC_32 against the one computed over the section.
    pub fn verify_crc(&self) -> Result<()> {
        let expected = track!(self.crc32())?;
        let actual = compute_crc(&self.bytes[..self.bytes.len() - CRC_LEN]);
        track_assert_eq!(
            actual,
            expected,
            ErrorKind::CrcMismatch,
            "table_id={}",
            self.table_id()
        );
        Ok(())
    }
}

/// Computes the MPEG-2 CRC_32 (ISO/IEC 13818-1, Annex A) of `bytes`.
pub fn compute_crc(bytes: &[u8]) -> u32 {
    CRC_MPEG.checksum(bytes)
}

/// Extracts the CRC_32 of the first section in a PSI payload.
///
/// # Errors
///
/// Returns an `ErrorKind::ShortPayload` error if `payload` is shorter than 4 bytes and an
/// `ErrorKind::PmtParse` error if the declared `section_length` runs past the end of `payload`.
pub fn extract_crc(payload: &[u8]) -> Result<u32> {
    track_assert!(
        payload.len() >= 4,
        ErrorKind::ShortPayload,
        "len={}",
        payload.len()
    );
    let start = track!(section_start(payload))?;
    let section = &payload[start..];
    let section_length = track!(SECTION_LENGTH.read(section))? as usize;

    let end = SECTION_HEADER_LEN + section_length;
    track_assert!(
        end <= section.len() && section_length >= CRC_LEN,
        ErrorKind::PmtParse,
        "section_length={}, available={}",
        section_length,
        section.len()
    );
    Ok(BigEndian::read_u32(&section[end - CRC_LEN..end]))
}

/// Reads packets on `pid` from `source` and accumulates them into PSI payloads.
///
/// Each complete payload is passed to `parse`; `Ok(None)` means the payload carried nothing
/// useful and accumulation starts over. Returns `Ok(None)` if the source runs out first.
fn read_table<R, T, F>(mut source: R, pid: Pid, mut parse: F) -> Result<Option<T>>
where
    R: ReadPacket,
    F: FnMut(&[u8]) -> Result<Option<T>>,
{
    let mut acc = Accumulator::new(psi_accumulator_done);
    while let Some(packet) = track!(source.read_packet())? {
        if packet.pid() != pid || !packet.has_payload() {
            continue;
        }
        if acc.bytes().is_empty() && !packet.payload_unit_start_indicator() {
            log::trace!("Waiting for a section start on pid={}", pid);
            continue;
        }

        let (_, state) = track!(acc.write_packet(&packet))?;
        if state == Accumulation::Pending {
            continue;
        }
        if let Some(table) = track!(parse(acc.bytes()))? {
            return Ok(Some(table));
        }
        log::debug!("Discarding an empty table on pid={}", pid);
        acc = Accumulator::new(psi_accumulator_done);
    }
    Ok(None)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fixtures;

    #[test]
    fn accumulator_done() {
        assert!(!track_try_unwrap!(psi_accumulator_done(&[])));
        assert!(!track_try_unwrap!(psi_accumulator_done(&[3, 0xFF])));
        assert!(track_try_unwrap!(psi_accumulator_done(&[0])));
        assert!(track_try_unwrap!(psi_accumulator_done(&[0, 0xFF, 0xFF])));

        let payload = fixtures::pmt_payload();
        let first = Packet::SIZE - 4;
        assert!(!track_try_unwrap!(psi_accumulator_done(&payload[..first])));
        assert!(track_try_unwrap!(psi_accumulator_done(&payload)));
    }

    #[test]
    fn accumulate_pmt_packets() {
        let mut acc = Accumulator::new(psi_accumulator_done);
        let packets = fixtures::pmt_packets();
        let (_, state) = track_try_unwrap!(acc.write_packet(&packets[0]));
        assert_eq!(state, Accumulation::Pending);
        let (_, state) = track_try_unwrap!(acc.write_packet(&packets[1]));
        assert_eq!(state, Accumulation::Complete);

        let pmt = track_try_unwrap!(Pmt::parse(acc.bytes()));
        assert_eq!(pmt.version_number(), 0);
        assert!(pmt.current_next_indicator());
        assert_eq!(pmt.pids(), &fixtures::pmt_pids()[..]);
    }

    #[test]
    fn iterate_sections() {
        let mut payload = vec![1, 0xAA];
        payload.extend_from_slice(&[0x00, 0xB0, 0x01, 0x99]);
        payload.extend_from_slice(&[0x02, 0xB0, 0x02, 0x98, 0x97]);
        payload.extend_from_slice(&[0xFF, 0xFF]);

        let sections = track_try_unwrap!(sections(&payload))
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].table_id(), 0);
        assert_eq!(sections[0].bytes(), &[0x00, 0xB0, 0x01, 0x99][..]);
        assert_eq!(sections[1].table_id(), 2);
        assert_eq!(sections[1].section_length(), 2);
    }

    #[test]
    fn truncated_section() {
        let payload = [0, 0x02, 0xB0, 0x10, 0x00];
        let mut iter = track_try_unwrap!(sections(&payload));
        let e = iter.next().unwrap().err().unwrap();
        assert_eq!(*e.kind(), ErrorKind::ShortPayload);
        assert!(iter.next().is_none());

        assert!(sections(&[]).is_err());
        assert!(sections(&[5, 0]).is_err());
    }

    #[test]
    fn crc() {
        let payload = fixtures::pmt_payload();
        let section = track_try_unwrap!(sections(&payload)).next().unwrap().unwrap();
        assert_eq!(section.section_length(), 186);
        assert_eq!(track_try_unwrap!(section.crc32()), 0x2B59_BC22);
        assert_eq!(
            compute_crc(&section.bytes()[..section.bytes().len() - CRC_LEN]),
            0x2B59_BC22
        );
        track_try_unwrap!(section.verify_crc());
        assert_eq!(track_try_unwrap!(extract_crc(&payload)), 0x2B59_BC22);
    }

    #[test]
    fn crc_mismatch() {
        let mut payload = fixtures::pmt_payload();
        payload[1 + 189 - 1] ^= 0x01;
        let section = track_try_unwrap!(sections(&payload)).next().unwrap().unwrap();
        let e = section.verify_crc().err().unwrap();
        assert_eq!(*e.kind(), ErrorKind::CrcMismatch);
    }

    #[test]
    fn extract_crc_bounds() {
        let e = extract_crc(&[0, 2, 0xB0]).err().unwrap();
        assert_eq!(*e.kind(), ErrorKind::ShortPayload);

        let payload = [0, 0x02, 0xB0, 0x04, 0xDE, 0xAD, 0xBE, 0xEF];
        assert_eq!(track_try_unwrap!(extract_crc(&payload)), 0xDEAD_BEEF);

        let e = extract_crc(&payload[..7]).err().unwrap();
        assert_eq!(*e.kind(), ErrorKind::PmtParse);
    }
}
