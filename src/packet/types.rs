use std::fmt;

use crate::{ErrorKind, Result};

/// Packet identifier: the 13-bit channel label in every TS packet header.
///
/// Values above 0x1FFF cannot be built; fields read off the wire go through `from_masked`
/// so the reserved bits next to a PID never leak into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pid(u16);
impl Pid {
    /// Largest 13-bit value.
    pub const MAX: u16 = (1 << 13) - 1;

    /// PID carrying the program association table.
    pub const PAT: Pid = Pid(0);

    /// PID of null (stuffing) packets; in a PMT's `PCR_PID` it means "no PCR".
    pub const NULL: Pid = Pid(0x1FFF);

    /// Checks that `n` fits in 13 bits.
    ///
    /// # Errors
    ///
    /// Returns an `ErrorKind::InvalidInput` error if `n` exceeds `Pid::MAX`.
    pub fn new(n: u16) -> Result<Self> {
        track_assert!(n <= Self::MAX, ErrorKind::InvalidInput, "PID out of range: {:#06x}", n);
        Ok(Pid(n))
    }

    /// Returns `true` for `Pid::NULL`.
    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }

    /// Makes a `Pid` from the low 13 bits of `n`, discarding the reserved bits above them.
    pub(crate) fn from_masked(n: u16) -> Self {
        Pid(n & Self::MAX)
    }

    /// Returns the PID as a plain number.
    pub fn as_u16(&self) -> u16 {
        self.0
    }
}
impl From<u8> for Pid {
    fn from(f: u8) -> Self {
        Pid(u16::from(f))
    }
}
impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
