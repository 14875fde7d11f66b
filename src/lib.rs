//! MPEG-2 transport stream program specific information (PSI).
//!
//! This crate reassembles PSI sections from fixed-size TS packets, parses
//! Program Map Tables (PMT) and rewrites a PMT so that it only lists a chosen
//! subset of elementary stream PIDs.
//!
//! # Examples
//!
//! ```no_run
//! use mpeg2ts_psi::packet::{PacketReader, Pid};
//! use mpeg2ts_psi::psi::read_pmt;
//!
//! let reader = PacketReader::new(std::io::stdin());
//! let pmt = read_pmt(reader, Pid::new(100)?)?;
//! println!("{}", pmt);
//! # Ok::<(), mpeg2ts_psi::Error>(())
//! ```
//!
//! # References
//!
//! - ISO/IEC 13818-1, section 2.4.4 (Program specific information)
#![warn(missing_docs)]
#[macro_use]
extern crate trackable;

pub use crate::error::{Error, ErrorKind};

macro_rules! track_io {
    ($expr:expr) => {
        $expr.map_err(|e: ::std::io::Error| {
            use trackable::error::ErrorKindExt;
            track!(crate::Error::from(crate::ErrorKind::Other.cause(e)))
        })
    };
}

pub mod packet;
pub mod psi;

mod error;
#[cfg(test)]
mod fixtures;

/// This crate specific `Result` type.
pub type Result<T> = std::result::Result<T, Error>;
