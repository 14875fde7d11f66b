use trackable::error::{ErrorKind as TrackableErrorKind, TrackableError};

/// This crate specific `Error` type.
#[derive(Debug, Clone, trackable::TrackableError)]
pub struct Error(TrackableError<ErrorKind>);

/// Possible error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The input is too short to hold the structure it should contain.
    ShortPayload,

    /// A PMT section is truncated or one of its length fields points outside the buffer.
    PmtParse,

    /// An elementary stream descriptor runs past the end of its section.
    DescriptorParse,

    /// The CRC-32 stored in a section differs from the computed one.
    CrcMismatch,

    /// Some of the requested PIDs are not listed in the PMT.
    PidNotInPmt,

    /// A program association table was required but none was supplied.
    NilTable,

    /// The packet carries no payload.
    NoPayload,

    /// The stream ended before a PMT for the requested PID was assembled.
    PmtNotFound,

    /// The stream ended before a PAT was assembled.
    PatNotFound,

    /// A packet was written to an accumulator that already completed.
    AccumulatorDone,

    /// A buffer carries more than one PMT section and the parser was told to reject it.
    AmbiguousSection,

    /// Malformed packet-level input (sync byte, PID range, packet size).
    InvalidInput,

    /// Other errors (I/O errors, for example).
    Other,
}
impl TrackableErrorKind for ErrorKind {}
