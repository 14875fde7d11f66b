extern crate clap;
extern crate env_logger;
extern crate mpeg2ts_psi;
#[macro_use]
extern crate trackable;

use clap::{App, Arg};
use mpeg2ts_psi::packet::{PacketReader, Pid};
use mpeg2ts_psi::psi::{self, PmtParser, ProgramMap};
use trackable::error::Failure;

fn main() {
    env_logger::init();
    let matches = App::new("dump_pmt")
        .arg(
            Arg::with_name("PMT_PID")
                .long("pmt-pid")
                .takes_value(true)
                .help("PID of the PMT; looked up in the PAT if omitted"),
        )
        .arg(Arg::with_name("VERIFY_CRC").long("verify-crc"))
        .get_matches();

    let mut reader = PacketReader::new(std::io::stdin());
    let pmt_pid = match matches.value_of("PMT_PID") {
        Some(s) => {
            let n: u16 = track_try_unwrap!(s.parse().map_err(Failure::from_error));
            track_try_unwrap!(Pid::new(n))
        }
        None => {
            let pat = track_try_unwrap!(psi::read_pat(&mut reader));
            let (program_number, pid) = track_try_unwrap!(pat
                .program_map()
                .iter()
                .next()
                .map(|(&n, &pid)| (n, pid))
                .ok_or_else(|| Failure::from_error("Empty PAT")));
            println!("PAT: program={} pmt_pid={}", program_number, pid);
            pid
        }
    };

    let parser = PmtParser::new().verify_crc(matches.is_present("VERIFY_CRC"));
    let pmt = track_try_unwrap!(parser.read_pmt(&mut reader, pmt_pid));
    println!(
        "PMT: program={} version={} pcr_pid={:?}",
        pmt.program_number(),
        pmt.version_number(),
        pmt.pcr_pid().map(|p| p.as_u16())
    );
    for d in pmt.program_descriptors() {
        println!("  {:?}", d);
    }
    for es in pmt.elementary_streams() {
        println!("{}", es);
        for d in es.descriptors() {
            match d.iso639_language_code() {
                Some(lang) => println!("  tag={:#04x} lang={}", d.tag, lang),
                None => println!("  {:?}", d),
            }
        }
    }
}
