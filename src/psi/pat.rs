use std::collections::BTreeMap;

use super::fields::{PROGRAM_MAP_PID, PROGRAM_NUMBER, TABLE_ID_EXTENSION, VERSION_NUMBER};
use super::CRC_LEN;
use crate::packet::{Packet, Pid, ReadPacket};
use crate::{ErrorKind, Result};

const PAT_FIXED_LEN: usize = 8;
const PAT_ENTRY_LEN: usize = 4;

/// Mapping from program numbers to the PIDs carrying their program map tables.
pub trait ProgramMap {
    /// Returns the program number to PMT PID mapping.
    fn program_map(&self) -> &BTreeMap<u16, Pid>;
}
impl ProgramMap for BTreeMap<u16, Pid> {
    fn program_map(&self) -> &BTreeMap<u16, Pid> {
        self
    }
}

/// Program Association Table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pat {
    transport_stream_id: u16,
    version_number: u8,
    network_pid: Option<Pid>,
    program_map: BTreeMap<u16, Pid>,
}
impl Pat {
    /// Table identifier of PAT sections.
    pub const TABLE_ID: u8 = 0;

    /// Parses a PAT from an accumulated PSI payload (pointer field included).
    ///
    /// Entries of every PAT section in the payload are merged.
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let mut pat = Pat::default();
        for section in track!(super::sections(payload))? {
            let section = track!(section)?;
            if section.table_id() != Self::TABLE_ID {
                continue;
            }

            let bytes = section.bytes();
            track_assert!(
                bytes.len() >= PAT_FIXED_LEN + CRC_LEN,
                ErrorKind::ShortPayload,
                "Too short PAT section: section_length={}",
                section.section_length()
            );
            pat.transport_stream_id = track!(TABLE_ID_EXTENSION.read(bytes))?;
            pat.version_number = track!(VERSION_NUMBER.read(bytes))?;

            let entries = &bytes[PAT_FIXED_LEN..bytes.len() - CRC_LEN];
            track_assert_eq!(
                entries.len() % PAT_ENTRY_LEN,
                0,
                ErrorKind::InvalidInput,
                "Unexpected PAT section length"
            );
            for entry in entries.chunks(PAT_ENTRY_LEN) {
                let program_number = track!(PROGRAM_NUMBER.read(entry))?;
                let pid = Pid::from_masked(track!(PROGRAM_MAP_PID.read(entry))?);
                if program_number == 0 {
                    pat.network_pid = Some(pid);
                } else {
                    pat.program_map.insert(program_number, pid);
                }
            }
        }
        Ok(pat)
    }

    /// Returns the transport stream identifier.
    pub fn transport_stream_id(&self) -> u16 {
        self.transport_stream_id
    }

    /// Returns the 5-bit version number.
    pub fn version_number(&self) -> u8 {
        self.version_number
    }

    /// Returns the network PID (the entry for program number 0), if any.
    pub fn network_pid(&self) -> Option<Pid> {
        self.network_pid
    }
}
impl ProgramMap for Pat {
    fn program_map(&self) -> &BTreeMap<u16, Pid> {
        &self.program_map
    }
}

/// Returns `true` if `packet` is carried on the PMT PID of one of the programs in `pat`.
///
/// # Errors
///
/// Returns an `ErrorKind::NilTable` error if `pat` is `None`.
pub fn is_pmt(packet: &Packet, pat: Option<&dyn ProgramMap>) -> Result<bool> {
    let pat = track_assert_some!(pat, ErrorKind::NilTable, "No PAT supplied");
    let pid = packet.pid();
    Ok(pat.program_map().values().any(|&p| p == pid))
}

/// Reads packets from `source` until a PAT listing at least one program is assembled.
///
/// # Errors
///
/// Returns an `ErrorKind::PatNotFound` error if the source ends first.
pub fn read_pat<R: ReadPacket>(source: R) -> Result<Pat> {
    let pat = track!(super::read_table(source, Pid::PAT, |payload| {
        let pat = track!(Pat::parse(payload))?;
        Ok(if pat.program_map().is_empty() {
            None
        } else {
            Some(pat)
        })
    }))?;
    let pat = track_assert_some!(pat, ErrorKind::PatNotFound);
    Ok(pat)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fixtures;
    use crate::packet::PacketReader;

    fn pid(n: u16) -> Pid {
        track_try_unwrap!(Pid::new(n))
    }

    #[test]
    fn parse_pat_packet() {
        let packet = fixtures::pat_packet();
        let pat = track_try_unwrap!(Pat::parse(track_try_unwrap!(packet.payload())));
        assert_eq!(pat.transport_stream_id(), 0);
        assert_eq!(pat.version_number(), 1);
        assert_eq!(pat.network_pid(), None);
        assert_eq!(pat.program_map().get(&1), Some(&pid(480)));
        assert_eq!(pat.program_map().len(), 1);
    }

    #[test]
    fn network_pid_is_not_a_program() {
        let mut payload = vec![0];
        payload.extend_from_slice(&fixtures::pat_section(&[(0, 0x10), (1, 0x100), (2, 0x200)]));
        let pat = track_try_unwrap!(Pat::parse(&payload));
        assert_eq!(pat.network_pid(), Some(pid(0x10)));
        assert_eq!(
            pat.program_map().values().cloned().collect::<Vec<_>>(),
            vec![pid(0x100), pid(0x200)]
        );
    }

    #[test]
    fn is_pmt_packet() {
        let mut map: BTreeMap<u16, Pid> = BTreeMap::new();
        map.insert(1, pid(100));
        let map: &dyn ProgramMap = &map;
        let packets = fixtures::pmt_packets();
        assert!(track_try_unwrap!(is_pmt(&packets[0], Some(map))));
        assert!(!track_try_unwrap!(is_pmt(&fixtures::pat_packet(), Some(map))));

        let pat = fixtures::pat_packet();
        let pat = track_try_unwrap!(Pat::parse(track_try_unwrap!(pat.payload())));
        let mut bytes = [0xFF; Packet::SIZE];
        bytes[..4].copy_from_slice(&[0x47, 0x41, 0xE0, 0x10]);
        let packet = track_try_unwrap!(Packet::new(bytes));
        assert!(track_try_unwrap!(is_pmt(&packet, Some(&pat))));

        let e = is_pmt(&packets[0], None).err().unwrap();
        assert_eq!(*e.kind(), ErrorKind::NilTable);
    }

    #[test]
    fn read_pat_from_stream() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(fixtures::pmt_packets()[0].as_bytes());
        bytes.extend_from_slice(fixtures::pat_packet().as_bytes());
        let pat = track_try_unwrap!(read_pat(PacketReader::new(&bytes[..])));
        assert_eq!(pat.program_map().get(&1), Some(&pid(480)));

        let e = read_pat(PacketReader::new(&bytes[..Packet::SIZE])).err().unwrap();
        assert_eq!(*e.kind(), ErrorKind::PatNotFound);
    }
}
