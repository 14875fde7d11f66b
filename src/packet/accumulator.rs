use std::fmt;

use crate::packet::Packet;
use crate::{ErrorKind, Result};

/// Outcome of writing a packet to an [`Accumulator`].
///
/// Failures are reported through the `Err` side of the returned `Result`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Accumulation {
    /// More packets are needed.
    Pending,

    /// The buffer is complete and can be taken with [`Accumulator::bytes`].
    Complete,
}

/// Reassembles a logical byte buffer from the payloads of successive packets.
///
/// After every write the completion predicate is asked whether the buffer is finished.
/// The predicate must be a pure function of the bytes; it is re-evaluated on the whole buffer
/// each time.
///
/// An accumulator serves a single buffer: once it reports `Accumulation::Complete`, further writes
/// fail with `ErrorKind::AccumulatorDone` and a new accumulator has to be made.
pub struct Accumulator<F> {
    buf: Vec<u8>,
    done_fn: F,
    done: bool,
}
impl<F> Accumulator<F>
where
    F: Fn(&[u8]) -> Result<bool>,
{
    /// Makes a new `Accumulator` instance that completes when `done_fn` returns `true`.
    pub fn new(done_fn: F) -> Self {
        Accumulator {
            buf: Vec::new(),
            done_fn,
            done: false,
        }
    }

    /// Appends the payload of `packet` and evaluates the completion predicate.
    ///
    /// Returns the number of payload bytes appended together with the accumulation state.
    ///
    /// # Errors
    ///
    /// Errors reported by the predicate are returned as they are; the accumulator should be
    /// discarded afterwards.
    pub fn write_packet(&mut self, packet: &Packet) -> Result<(usize, Accumulation)> {
        track_assert!(
            !self.done,
            ErrorKind::AccumulatorDone,
            "pid={}",
            packet.pid()
        );
        let payload = track!(packet.payload())?;
        self.buf.extend_from_slice(payload);

        if track!((self.done_fn)(&self.buf))? {
            log::trace!(
                "Accumulated {} bytes (last pid={})",
                self.buf.len(),
                packet.pid()
            );
            self.done = true;
            Ok((payload.len(), Accumulation::Complete))
        } else {
            Ok((payload.len(), Accumulation::Pending))
        }
    }

    /// Returns the bytes accumulated so far.
    pub fn bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Converts `Accumulator` into the accumulated bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Returns `true` if the completion predicate has been satisfied.
    pub fn is_done(&self) -> bool {
        self.done
    }
}
impl<F> fmt::Debug for Accumulator<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Accumulator")
            .field("len", &self.buf.len())
            .field("done", &self.done)
            .finish()
    }
}
