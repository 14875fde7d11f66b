extern crate clap;
extern crate env_logger;
#[macro_use]
extern crate log;
extern crate mpeg2ts_psi;
#[macro_use]
extern crate trackable;

use clap::{App, Arg};
use mpeg2ts_psi::packet::{
    Accumulation, Accumulator, Packet, PacketReader, PacketWriter, Pid, ReadPacket, WritePacket,
};
use mpeg2ts_psi::psi;
use trackable::error::Failure;

fn parse_pid(s: &str) -> Pid {
    let n: u16 = track_try_unwrap!(s.parse().map_err(Failure::from_error));
    track_try_unwrap!(Pid::new(n))
}

fn main() {
    env_logger::init();
    let matches = App::new("filter_pmt")
        .arg(
            Arg::with_name("PMT_PID")
                .long("pmt-pid")
                .takes_value(true)
                .required(true),
        )
        .arg(
            Arg::with_name("KEEP_PID")
                .long("keep-pid")
                .takes_value(true)
                .multiple(true)
                .required(true),
        )
        .get_matches();
    let pmt_pid = parse_pid(matches.value_of("PMT_PID").unwrap());
    let keep = matches
        .values_of("KEEP_PID")
        .unwrap()
        .map(parse_pid)
        .collect::<Vec<_>>();

    let mut reader = PacketReader::new(std::io::stdin());
    let mut writer = PacketWriter::new(std::io::stdout());
    let mut pending: Vec<Packet> = Vec::new();
    let mut acc = Accumulator::new(psi::psi_accumulator_done);
    while let Some(packet) = track_try_unwrap!(reader.read_packet()) {
        if packet.pid() != pmt_pid {
            track_try_unwrap!(writer.write_packet(&packet));
            continue;
        }
        if !packet.has_payload() || (pending.is_empty() && !packet.payload_unit_start_indicator())
        {
            track_try_unwrap!(writer.write_packet(&packet));
            continue;
        }

        let (_, state) = track_try_unwrap!(acc.write_packet(&packet));
        pending.push(packet);
        if state == Accumulation::Pending {
            continue;
        }

        match psi::filter_pmt_packets_to_pids(&pending, &keep) {
            Ok(filtered) => {
                if let Some(e) = filtered.missing_pids_error() {
                    warn!("{}", e);
                }
                for p in &filtered.packets {
                    track_try_unwrap!(writer.write_packet(p));
                }
            }
            Err(e) => {
                warn!("Passing the PMT through unchanged: {}", e);
                for p in &pending {
                    track_try_unwrap!(writer.write_packet(p));
                }
            }
        }
        pending.clear();
        acc = Accumulator::new(psi::psi_accumulator_done);
    }
    for p in &pending {
        track_try_unwrap!(writer.write_packet(p));
    }
}
