use std::io::Write;

use crate::packet::Packet;
use crate::Result;

/// The `WritePacket` trait allows for writing TS packets to a destination.
pub trait WritePacket {
    /// Writes a TS packet.
    fn write_packet(&mut self, packet: &Packet) -> Result<()>;
}

/// TS packet writer.
#[derive(Debug)]
pub struct PacketWriter<W> {
    stream: W,
}
impl<W: Write> PacketWriter<W> {
    /// Makes a new `PacketWriter` instance.
    pub fn new(stream: W) -> Self {
        PacketWriter { stream }
    }

    /// Returns a reference to the underlaying byte stream.
    pub fn stream(&self) -> &W {
        &self.stream
    }

    /// Converts `PacketWriter` into the underlaying byte stream.
    pub fn into_stream(self) -> W {
        self.stream
    }
}
impl<W: Write> WritePacket for PacketWriter<W> {
    fn write_packet(&mut self, packet: &Packet) -> Result<()> {
        track_io!(self.stream.write_all(packet.as_bytes()))
    }
}
