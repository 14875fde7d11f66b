//! Test inputs shared by the unit tests.
use byteorder::{BigEndian, ByteOrder};
use hex_literal::hex;

use crate::packet::{Packet, Pid};
use crate::psi;

/// Program 1 on PID 100 with six elementary streams, split over two packets.
pub fn pmt_packets() -> Vec<Packet> {
    let first = hex!(
        "474064100002b0ba0001c10000e065f00b0504435545490e03c03dd01be065f0"
        "16970028046400283fe907108302808502800e03c0392087e066f02197000504"
        "45414333cc03c0c2100a04656e6700e907108302808502800e03c000f087e067"
        "f0219700050445414333cc03c0c4100a0473706100e907108302808502800e03"
        "c001e00fe068f01697000a04656e6700e907108302808502800e03c000f00fe0"
        "69f01697000a0473706100e907108302808502800e03c000f086e0dc"
    );
    let second = hex!("47006411" "f0002b59bc22");
    vec![
        track_try_unwrap!(Packet::new(first)),
        track_try_unwrap!(Packet::padded(&second[..4], &second[4..])),
    ]
}

pub fn pmt_stream_bytes() -> Vec<u8> {
    pmt_packets()
        .iter()
        .flat_map(|p| p.as_bytes().iter().cloned())
        .collect()
}

/// Concatenated payloads of `pmt_packets()`, pointer field and stuffing included.
pub fn pmt_payload() -> Vec<u8> {
    let mut payload = Vec::new();
    for packet in pmt_packets() {
        payload.extend_from_slice(track_try_unwrap!(packet.payload()));
    }
    payload
}

pub fn pmt_pids() -> Vec<Pid> {
    [101, 102, 103, 104, 105, 220]
        .iter()
        .map(|&n| track_try_unwrap!(Pid::new(n)))
        .collect()
}

/// Program 1 mapped to PID 480.
pub fn pat_packet() -> Packet {
    let bytes = hex!("47400011" "0000b00d0000c300000001e1e0e85f74ec");
    track_try_unwrap!(Packet::padded(&bytes[..4], &bytes[4..]))
}

pub fn null_packet() -> Packet {
    track_try_unwrap!(Packet::padded(&hex!("471fff10"), &[]))
}

#[derive(Debug, Clone)]
pub struct EsSpec {
    pub stream_type: u8,
    pub pid: u16,
    pub descriptors: Vec<u8>,
}

/// Builds a PMT section for program 1 with a valid CRC.
///
/// The PCR PID is the first stream's PID, or 0x1FFF when there are no streams.
pub fn pmt_section(version: u8, program_info: &[u8], streams: &[EsSpec]) -> Vec<u8> {
    let mut body = Vec::new();
    push_u16(&mut body, 1);
    body.push(0xC1 | (version << 1));
    body.extend_from_slice(&[0, 0]);
    let pcr_pid = streams.first().map_or(0x1FFF, |es| es.pid);
    push_u16(&mut body, 0xE000 | pcr_pid);
    push_u16(&mut body, 0xF000 | program_info.len() as u16);
    body.extend_from_slice(program_info);
    for es in streams {
        body.push(es.stream_type);
        push_u16(&mut body, 0xE000 | es.pid);
        push_u16(&mut body, 0xF000 | es.descriptors.len() as u16);
        body.extend_from_slice(&es.descriptors);
    }
    finish_section(0x02, 0xB000, body)
}

/// Builds a PAT section (transport stream ID 1, version 0) from `(program_number, pid)` entries.
pub fn pat_section(entries: &[(u16, u16)]) -> Vec<u8> {
    let mut body = Vec::new();
    push_u16(&mut body, 1);
    body.extend_from_slice(&[0xC1, 0, 0]);
    for &(program_number, pid) in entries {
        push_u16(&mut body, program_number);
        push_u16(&mut body, 0xE000 | pid);
    }
    finish_section(0x00, 0xB000, body)
}

pub fn pmt_payload_from(section: &[u8]) -> Vec<u8> {
    let mut payload = vec![0];
    payload.extend_from_slice(section);
    payload
}

/// Splits `payload` over as many packets on `pid` as needed, stuffing the last one.
pub fn packetize(pid: Pid, payload: &[u8]) -> Vec<Packet> {
    payload
        .chunks(Packet::SIZE - 4)
        .enumerate()
        .map(|(i, chunk)| {
            let pusi = if i == 0 { 0x40 } else { 0x00 };
            let header = [
                Packet::SYNC_BYTE,
                pusi | (pid.as_u16() >> 8) as u8,
                pid.as_u16() as u8,
                0x10 | (i as u8 & 0x0F),
            ];
            track_try_unwrap!(Packet::padded(&header, chunk))
        })
        .collect()
}

fn push_u16(buf: &mut Vec<u8>, n: u16) {
    let mut word = [0; 2];
    BigEndian::write_u16(&mut word, n);
    buf.extend_from_slice(&word);
}

fn finish_section(table_id: u8, flags: u16, body: Vec<u8>) -> Vec<u8> {
    let mut section = vec![table_id];
    push_u16(&mut section, flags | (body.len() + psi::CRC_LEN) as u16);
    section.extend_from_slice(&body);
    let mut crc = [0; 4];
    BigEndian::write_u32(&mut crc, psi::compute_crc(&section));
    section.extend_from_slice(&crc);
    section
}
