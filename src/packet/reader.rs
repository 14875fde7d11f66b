use std::io::Read;

use crate::packet::Packet;
use crate::Result;

/// The `ReadPacket` trait allows for reading TS packets from a source.
pub trait ReadPacket {
    /// Reads a TS packet.
    ///
    /// If the end of the stream is reached, it will return `Ok(None)`.
    fn read_packet(&mut self) -> Result<Option<Packet>>;
}
impl<'a, T: ReadPacket + ?Sized> ReadPacket for &'a mut T {
    fn read_packet(&mut self) -> Result<Option<Packet>> {
        (**self).read_packet()
    }
}

/// TS packet reader.
#[derive(Debug)]
pub struct PacketReader<R> {
    stream: R,
}
impl<R: Read> PacketReader<R> {
    /// Makes a new `PacketReader` instance.
    pub fn new(stream: R) -> Self {
        PacketReader { stream }
    }

    /// Returns a reference to the underlaying byte stream.
    pub fn stream(&self) -> &R {
        &self.stream
    }

    /// Converts `PacketReader` into the underlaying byte stream `R`.
    pub fn into_stream(self) -> R {
        self.stream
    }
}
impl<R: Read> ReadPacket for PacketReader<R> {
    fn read_packet(&mut self) -> Result<Option<Packet>> {
        let mut buf = [0; Packet::SIZE];
        let mut filled = 0;
        while filled < buf.len() {
            let n = track_io!(self.stream.read(&mut buf[filled..]))?;
            if n == 0 {
                // A truncated trailing packet is treated as the end of the stream.
                if filled != 0 {
                    log::debug!("Discarding {} trailing bytes", filled);
                }
                return Ok(None);
            }
            filled += n;
        }
        track!(Packet::new(buf)).map(Some)
    }
}
