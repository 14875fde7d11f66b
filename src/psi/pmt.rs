use std::cmp;
use std::fmt;

use super::es::{self, Descriptor, ElementaryStream, StreamType};
use super::fields::{
    CURRENT_NEXT_INDICATOR, ES_INFO_LENGTH, ES_PID, ES_STREAM_TYPE, PCR_PID, PROGRAM_INFO_LENGTH,
    TABLE_ID_EXTENSION, VERSION_NUMBER,
};
use super::{Section, CRC_LEN};
use crate::packet::{Pid, ReadPacket};
use crate::{ErrorKind, Result};

/// Length of the fixed part of a PMT section, from `table_id` through `program_info_length`.
pub(crate) const PMT_FIXED_LEN: usize = 12;

/// Length of the fixed part of an elementary stream entry, from `stream_type` through
/// `ES_info_length`.
pub(crate) const ES_FIXED_LEN: usize = 5;

/// How to handle a payload that carries more than one PMT section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MultiSectionPolicy {
    /// Keep the first PMT section and ignore the others.
    FirstWins,

    /// Each PMT section replaces the previous one.
    LastWins,

    /// Fail with `ErrorKind::AmbiguousSection`.
    Reject,
}
impl Default for MultiSectionPolicy {
    fn default() -> Self {
        MultiSectionPolicy::LastWins
    }
}

/// Program Map Table parser.
///
/// # Examples
///
/// ```
/// use mpeg2ts_psi::psi::{MultiSectionPolicy, PmtParser};
///
/// let parser = PmtParser::new()
///     .multi_section_policy(MultiSectionPolicy::Reject)
///     .verify_crc(true);
/// assert!(parser.parse(&[0, 0xFF]).unwrap().pids().is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct PmtParser {
    policy: MultiSectionPolicy,
    verify_crc: bool,
}
impl PmtParser {
    /// Makes a new `PmtParser` with the default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how payloads carrying several PMT sections are handled.
    ///
    /// The default value is `MultiSectionPolicy::LastWins`.
    pub fn multi_section_policy(mut self, policy: MultiSectionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets whether the CRC_32 of each PMT section is checked.
    ///
    /// The default value is `false`.
    pub fn verify_crc(mut self, verify: bool) -> Self {
        self.verify_crc = verify;
        self
    }

    /// Parses a PMT from an accumulated PSI payload (pointer field included).
    ///
    /// Sections with a table id other than `Pmt::TABLE_ID` are skipped. If no PMT section is
    /// found, the returned table has no elementary streams.
    pub fn parse(&self, payload: &[u8]) -> Result<Pmt> {
        let mut pmt: Option<Pmt> = None;
        for section in track!(super::sections(payload))? {
            let section = track!(section)?;
            if section.table_id() != Pmt::TABLE_ID {
                log::debug!("Skipping a section with table_id={}", section.table_id());
                continue;
            }
            if pmt.is_some() {
                match self.policy {
                    MultiSectionPolicy::FirstWins => {
                        log::debug!("Ignoring an extra PMT section");
                        continue;
                    }
                    MultiSectionPolicy::Reject => {
                        track_panic!(ErrorKind::AmbiguousSection, "Multiple PMT sections")
                    }
                    MultiSectionPolicy::LastWins => log::debug!("Replacing the previous PMT section"),
                }
            }
            pmt = Some(track!(self.parse_section(section))?);
        }
        Ok(pmt.unwrap_or_default())
    }

    /// Reads packets from `source` until a non-empty PMT carried on `pid` is assembled.
    ///
    /// A payload that completes without any elementary stream is discarded and accumulation
    /// starts over.
    ///
    /// # Errors
    ///
    /// Returns an `ErrorKind::PmtNotFound` error if the source ends first.
    pub fn read_pmt<R: ReadPacket>(&self, source: R, pid: Pid) -> Result<Pmt> {
        let pmt = track!(super::read_table(source, pid, |payload| {
            let pmt = track!(self.parse(payload))?;
            Ok(if pmt.pids().is_empty() { None } else { Some(pmt) })
        }))?;
        let pmt = track_assert_some!(pmt, ErrorKind::PmtNotFound, "pid={}", pid);
        Ok(pmt)
    }

    fn parse_section(&self, section: Section<'_>) -> Result<Pmt> {
        let bytes = section.bytes();
        track_assert!(
            bytes.len() >= PMT_FIXED_LEN,
            ErrorKind::PmtParse,
            "Too short PMT section: section_length={}",
            section.section_length()
        );
        if self.verify_crc {
            track!(section.verify_crc())?;
        }
        // A section without room for a CRC after the fixed header has no ES entries.
        let crc_start = cmp::max(bytes.len().saturating_sub(CRC_LEN), PMT_FIXED_LEN);

        let program_number = track!(TABLE_ID_EXTENSION.read(bytes))?;
        let version_number = track!(VERSION_NUMBER.read(bytes))?;
        let current_next_indicator = track!(CURRENT_NEXT_INDICATOR.read(bytes))? != 0;
        let pcr_pid = Pid::from_masked(track!(PCR_PID.read(bytes))?);
        let pcr_pid = if pcr_pid.is_null() {
            None
        } else {
            Some(pcr_pid)
        };

        let program_info_len = track!(PROGRAM_INFO_LENGTH.read(bytes))? as usize;
        let es_start = PMT_FIXED_LEN + program_info_len;
        track_assert!(
            es_start <= crc_start,
            ErrorKind::PmtParse,
            "program_info_length={}, section_length={}",
            program_info_len,
            section.section_length()
        );
        let program_descriptors = track!(es::parse_descriptors(&bytes[PMT_FIXED_LEN..es_start]))?;

        let mut elementary_streams = Vec::new();
        let mut offset = es_start;
        while offset + ES_FIXED_LEN <= crc_start {
            let entry = &bytes[offset..];
            let stream_type = StreamType::new(track!(ES_STREAM_TYPE.read(entry))?);
            let elementary_pid = Pid::from_masked(track!(ES_PID.read(entry))?);
            let es_info_len = track!(ES_INFO_LENGTH.read(entry))? as usize;

            let start = offset + ES_FIXED_LEN;
            let end = start + es_info_len;
            track_assert!(
                end <= crc_start,
                ErrorKind::DescriptorParse,
                "pid={}, ES_info_length={}, available={}",
                elementary_pid,
                es_info_len,
                crc_start - start
            );
            let descriptors = track!(es::parse_descriptors(&bytes[start..end]))?;
            elementary_streams.push(ElementaryStream::new(
                stream_type,
                elementary_pid,
                descriptors,
            ));
            offset = end;
        }

        let pids = elementary_streams
            .iter()
            .map(|es| es.elementary_pid())
            .collect();
        Ok(Pmt {
            program_number,
            version_number,
            current_next_indicator,
            pcr_pid,
            program_descriptors,
            elementary_streams,
            pids,
        })
    }
}

/// Program Map Table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pmt {
    program_number: u16,
    version_number: u8,
    current_next_indicator: bool,
    pcr_pid: Option<Pid>,
    program_descriptors: Vec<Descriptor>,
    elementary_streams: Vec<ElementaryStream>,
    pids: Vec<Pid>,
}
impl Pmt {
    /// Table identifier of PMT sections.
    pub const TABLE_ID: u8 = 2;

    /// Parses a PMT from an accumulated PSI payload using the default `PmtParser` options.
    pub fn parse(payload: &[u8]) -> Result<Self> {
        track!(PmtParser::new().parse(payload))
    }

    /// Returns the elementary stream PIDs, in the order of `elementary_streams()`.
    pub fn pids(&self) -> &[Pid] {
        &self.pids
    }

    /// Returns the program number this table describes.
    pub fn program_number(&self) -> u16 {
        self.program_number
    }

    /// Returns the 5-bit version number.
    pub fn version_number(&self) -> u8 {
        self.version_number
    }

    /// Returns `true` if the table is currently applicable, `false` if it becomes valid next.
    pub fn current_next_indicator(&self) -> bool {
        self.current_next_indicator
    }

    /// Returns the PID carrying the program clock reference, if any.
    pub fn pcr_pid(&self) -> Option<Pid> {
        self.pcr_pid
    }

    /// Returns the program-level descriptors.
    pub fn program_descriptors(&self) -> &[Descriptor] {
        &self.program_descriptors
    }

    /// Returns the elementary streams, in table order.
    pub fn elementary_streams(&self) -> &[ElementaryStream] {
        &self.elementary_streams
    }

    /// Returns `true` if `pid` is the PID of one of the elementary streams.
    pub fn pid_exists(&self, pid: Pid) -> bool {
        self.pids.contains(&pid)
    }

    /// Removes the elementary streams carried on any of `pids`.
    ///
    /// PIDs that are not in the table are ignored.
    pub fn remove_elementary_streams(&mut self, pids: &[Pid]) {
        self.elementary_streams
            .retain(|es| !pids.contains(&es.elementary_pid()));
        self.pids = self
            .elementary_streams
            .iter()
            .map(|es| es.elementary_pid())
            .collect();
    }

    /// Returns `true` if `pid` belongs to a stream whose presentation lags its EBP markers.
    pub fn is_pid_for_stream_where_presentation_lags_ebp(&self, pid: Pid) -> bool {
        self.elementary_streams
            .iter()
            .find(|es| es.elementary_pid() == pid)
            .map_or(false, |es| es.is_stream_where_presentation_lags_ebp())
    }
}
impl fmt::Display for Pmt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "PMT[")?;
        for (i, es) in self.elementary_streams.iter().enumerate() {
            if i != 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", es)?;
        }
        write!(f, "]")
    }
}

/// Reads packets from `source` until a PMT carried on `pid` is assembled.
///
/// See [`PmtParser::read_pmt`].
pub fn read_pmt<R: ReadPacket>(source: R, pid: Pid) -> Result<Pmt> {
    track!(PmtParser::new().read_pmt(source, pid))
}
