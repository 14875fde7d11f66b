use std::cmp;

use trackable::error::ErrorKindExt;

use super::fields::{ES_INFO_LENGTH, ES_PID, PROGRAM_INFO_LENGTH, SECTION_LENGTH};
use super::pmt::{ES_FIXED_LEN, PMT_FIXED_LEN};
use super::{Pmt, CRC_LEN, SECTION_HEADER_LEN};
use crate::packet::{Packet, Pid};
use crate::{Error, ErrorKind, Result};

/// Result of [`filter_pmt_packets_to_pids`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilteredPmt {
    /// The rewritten PMT packets.
    pub packets: Vec<Packet>,

    /// Requested PIDs that the PMT does not list.
    pub missing_pids: Vec<Pid>,
}
impl FilteredPmt {
    /// Returns `true` if every requested PID was found in the PMT.
    pub fn is_complete(&self) -> bool {
        self.missing_pids.is_empty()
    }

    /// Returns an `ErrorKind::PidNotInPmt` error naming the missing PIDs, if any.
    pub fn missing_pids_error(&self) -> Option<Error> {
        if self.is_complete() {
            None
        } else {
            Some(missing_pids_error(&self.missing_pids))
        }
    }
}

/// Rewrites the PMT carried by `packets` so that it only lists the elementary streams on `pids`.
///
/// `packets` must hold exactly one accumulated PMT (see
/// [`psi_accumulator_done`](super::psi_accumulator_done)). Program-level descriptors are kept
/// as they are; `section_length` and `CRC_32` are recomputed. The output reuses the headers of
/// the input packets, in order, and stops as soon as the rewritten table is exhausted, so it may
/// be shorter than the input. The unused tail of the last packet is filled with `0xFF`.
///
/// If `packets` is empty, the result is empty too; if `pids` is empty, `packets` are returned
/// unchanged.
///
/// The PAT PID and the PID carrying the PMT itself are never reported as missing.
///
/// # Errors
///
/// Returns an `ErrorKind::PidNotInPmt` error if none of `pids` is listed in the PMT.
/// When only some of them are missing, the packets are still built and the missing PIDs are
/// reported in `FilteredPmt::missing_pids`.
pub fn filter_pmt_packets_to_pids(packets: &[Packet], pids: &[Pid]) -> Result<FilteredPmt> {
    if packets.is_empty() || pids.is_empty() {
        return Ok(FilteredPmt {
            packets: packets.to_vec(),
            missing_pids: Vec::new(),
        });
    }

    let mut payload = Vec::with_capacity(packets.len() * Packet::SIZE);
    for packet in packets {
        payload.extend_from_slice(track!(packet.payload())?);
    }

    let unfiltered = track!(Pmt::parse(&payload))?;
    let pmt_pid = packets[0].pid();
    let missing_pids = pids
        .iter()
        .cloned()
        .filter(|&pid| !unfiltered.pid_exists(pid) && pid != Pid::PAT && pid != pmt_pid)
        .collect::<Vec<_>>();
    if missing_pids.len() == pids.len() {
        return Err(track!(missing_pids_error(&missing_pids)));
    }
    if !missing_pids.is_empty() {
        log::warn!("PIDs not in the PMT on pid={}: {:?}", pmt_pid, missing_pids);
    }

    let table = track!(rewrite_pmt(&payload, pids))?;

    let mut rest = &table[..];
    let mut filtered = Vec::new();
    for packet in packets {
        if rest.is_empty() {
            break;
        }
        let header = track!(packet.header())?;
        let n = cmp::min(rest.len(), Packet::SIZE - header.len());
        filtered.push(track!(Packet::padded(header, &rest[..n]))?);
        rest = &rest[n..];
    }
    track_assert!(
        rest.is_empty(),
        ErrorKind::InvalidInput,
        "{} bytes of the rewritten PMT do not fit in the packets",
        rest.len()
    );
    log::debug!(
        "Filtered the PMT on pid={} to {} packet(s)",
        pmt_pid,
        filtered.len()
    );

    Ok(FilteredPmt {
        packets: filtered,
        missing_pids,
    })
}

/// Builds a new PSI payload (pointer field, PMT section, CRC) keeping only the ES entries on `pids`.
fn rewrite_pmt(payload: &[u8], pids: &[Pid]) -> Result<Vec<u8>> {
    let start = track!(super::section_start(payload))?;
    let section = &payload[start..];
    track_assert!(
        section.len() >= PMT_FIXED_LEN,
        ErrorKind::PmtParse,
        "Too short PMT section: {} bytes",
        section.len()
    );
    track_assert_eq!(
        section[0],
        Pmt::TABLE_ID,
        ErrorKind::PmtParse,
        "The first section is not a PMT"
    );
    let section_length = track!(SECTION_LENGTH.read(section))? as usize;
    let end = SECTION_HEADER_LEN + section_length;
    track_assert!(
        PMT_FIXED_LEN + CRC_LEN <= end && end <= section.len(),
        ErrorKind::PmtParse,
        "section_length={}, available={}",
        section_length,
        section.len()
    );
    let crc_start = end - CRC_LEN;

    let program_info_len = track!(PROGRAM_INFO_LENGTH.read(section))? as usize;
    let es_start = PMT_FIXED_LEN + program_info_len;
    track_assert!(
        es_start <= crc_start,
        ErrorKind::PmtParse,
        "program_info_length={}",
        program_info_len
    );

    // Everything after the section_length field, up to the CRC.
    let mut body = section[SECTION_HEADER_LEN..es_start].to_vec();
    let mut offset = es_start;
    while offset + ES_FIXED_LEN <= crc_start {
        let entry = &section[offset..];
        let pid = Pid::from_masked(track!(ES_PID.read(entry))?);
        let es_info_len = track!(ES_INFO_LENGTH.read(entry))? as usize;
        let next = offset + ES_FIXED_LEN + es_info_len;
        track_assert!(
            next <= crc_start,
            ErrorKind::PmtParse,
            "pid={}, ES_info_length={}",
            pid,
            es_info_len
        );
        if pids.contains(&pid) {
            body.extend_from_slice(&section[offset..next]);
        }
        offset = next;
    }

    let new_section_length = body.len() + CRC_LEN;
    let length = track!(SECTION_LENGTH.encode(section, new_section_length as u16))?;

    let mut table = Vec::with_capacity(start + SECTION_HEADER_LEN + new_section_length);
    table.extend_from_slice(&payload[..start]);
    table.push(section[0]);
    table.extend_from_slice(&length);
    table.extend_from_slice(&body);
    let crc = super::compute_crc(&table[start..]);
    table.extend_from_slice(&crc.to_be_bytes());
    Ok(table)
}

fn missing_pids_error(pids: &[Pid]) -> Error {
    let pids = pids.iter().map(|p| p.as_u16()).collect::<Vec<_>>();
    ErrorKind::PidNotInPmt
        .cause(format!("PIDs not in PMT: {:?}", pids))
        .into()
}
