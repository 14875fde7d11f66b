use std::fmt;

use super::fields::{DESCRIPTOR_LENGTH, DESCRIPTOR_TAG};
use crate::packet::Pid;
use crate::{ErrorKind, Result};

/// Stream type of an elementary stream (ISO/IEC 13818-1, Table 2-34).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamType(u8);
#[allow(missing_docs)]
impl StreamType {
    pub const MPEG1_VIDEO: StreamType = StreamType(0x01);
    pub const MPEG2_VIDEO: StreamType = StreamType(0x02);
    pub const MPEG1_AUDIO: StreamType = StreamType(0x03);
    pub const MPEG2_AUDIO: StreamType = StreamType(0x04);
    pub const PRIVATE_SECTIONS: StreamType = StreamType(0x05);
    pub const PES_PRIVATE_DATA: StreamType = StreamType(0x06);
    pub const ADTS_AAC: StreamType = StreamType(0x0F);
    pub const MPEG4_VISUAL: StreamType = StreamType(0x10);
    pub const LATM_AAC: StreamType = StreamType(0x11);
    pub const METADATA: StreamType = StreamType(0x15);
    pub const H264: StreamType = StreamType(0x1B);
    pub const H265: StreamType = StreamType(0x24);
    pub const AC3: StreamType = StreamType(0x81);
    pub const SCTE35: StreamType = StreamType(0x86);
    pub const EAC3: StreamType = StreamType(0x87);
}
impl StreamType {
    /// Makes a new `StreamType` instance.
    pub fn new(n: u8) -> Self {
        StreamType(n)
    }

    /// Returns the value of the `StreamType`.
    pub fn as_u8(&self) -> u8 {
        self.0
    }

    /// Returns `true` if the stream type denotes an audio codec.
    pub fn is_audio(&self) -> bool {
        matches!(
            *self,
            StreamType::MPEG1_AUDIO
                | StreamType::MPEG2_AUDIO
                | StreamType::ADTS_AAC
                | StreamType::LATM_AAC
                | StreamType::AC3
                | StreamType::EAC3
        )
    }

    /// Returns `true` if the stream type denotes a video codec.
    pub fn is_video(&self) -> bool {
        matches!(
            *self,
            StreamType::MPEG1_VIDEO
                | StreamType::MPEG2_VIDEO
                | StreamType::MPEG4_VISUAL
                | StreamType::H264
                | StreamType::H265
        )
    }

    /// Returns a short human readable name for well-known stream types.
    pub fn name(&self) -> Option<&'static str> {
        Some(match *self {
            StreamType::MPEG1_VIDEO => "MPEG-1 Video",
            StreamType::MPEG2_VIDEO => "MPEG-2 Video",
            StreamType::MPEG1_AUDIO => "MPEG-1 Audio",
            StreamType::MPEG2_AUDIO => "MPEG-2 Audio",
            StreamType::PRIVATE_SECTIONS => "Private Sections",
            StreamType::PES_PRIVATE_DATA => "PES Private Data",
            StreamType::ADTS_AAC => "AAC (ADTS)",
            StreamType::MPEG4_VISUAL => "MPEG-4 Visual",
            StreamType::LATM_AAC => "AAC (LATM)",
            StreamType::METADATA => "Metadata",
            StreamType::H264 => "H.264",
            StreamType::H265 => "H.265",
            StreamType::AC3 => "AC-3",
            StreamType::SCTE35 => "SCTE-35",
            StreamType::EAC3 => "E-AC-3",
            _ => return None,
        })
    }
}
impl From<u8> for StreamType {
    fn from(f: u8) -> Self {
        StreamType(f)
    }
}
impl fmt::Display for StreamType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{:#04x} ({})", self.0, name),
            None => write!(f, "{:#04x}", self.0),
        }
    }
}

/// An elementary stream entry of a program map table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementaryStream {
    stream_type: StreamType,
    elementary_pid: Pid,
    descriptors: Vec<Descriptor>,
}
impl ElementaryStream {
    /// Makes a new `ElementaryStream` instance.
    pub fn new(stream_type: StreamType, elementary_pid: Pid, descriptors: Vec<Descriptor>) -> Self {
        ElementaryStream {
            stream_type,
            elementary_pid,
            descriptors,
        }
    }

    /// Returns the stream type.
    pub fn stream_type(&self) -> StreamType {
        self.stream_type
    }

    /// Returns the PID of the packets carrying the stream.
    pub fn elementary_pid(&self) -> Pid {
        self.elementary_pid
    }

    /// Returns the ES-level descriptors, in stream order.
    pub fn descriptors(&self) -> &[Descriptor] {
        &self.descriptors
    }

    /// Returns `true` for audio streams.
    pub fn is_audio(&self) -> bool {
        self.stream_type.is_audio()
    }

    /// Returns `true` for video streams.
    pub fn is_video(&self) -> bool {
        self.stream_type.is_video()
    }

    /// Returns `true` if the presentation time of this stream lags its encoder boundary points.
    ///
    /// Audio frames do not line up with video frames, so audio streams are the ones where EBP
    /// markers precede the presentation time.
    pub fn is_stream_where_presentation_lags_ebp(&self) -> bool {
        self.is_audio()
    }
}
impl fmt::Display for ElementaryStream {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "ES[type={} pid={} descriptors={}]",
            self.stream_type,
            self.elementary_pid,
            self.descriptors.len()
        )
    }
}

/// Program or elementary stream descriptor.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Descriptor {
    pub tag: u8,
    pub data: Vec<u8>,
}
impl Descriptor {
    /// Tag of the registration descriptor.
    pub const REGISTRATION_TAG: u8 = 0x05;

    /// Tag of the ISO 639 language descriptor.
    pub const ISO_639_LANGUAGE_TAG: u8 = 0x0A;

    /// Returns the `format_identifier` of a registration descriptor (e.g. `b"CUEI"`).
    pub fn registration_format_identifier(&self) -> Option<&[u8]> {
        if self.tag != Self::REGISTRATION_TAG || self.data.len() < 4 {
            return None;
        }
        Some(&self.data[..4])
    }

    /// Returns the first language code of an ISO 639 language descriptor (e.g. `"eng"`).
    pub fn iso639_language_code(&self) -> Option<&str> {
        if self.tag != Self::ISO_639_LANGUAGE_TAG || self.data.len() < 3 {
            return None;
        }
        std::str::from_utf8(&self.data[..3]).ok()
    }
}

/// Parses a descriptor loop that fills `block` exactly.
pub(super) fn parse_descriptors(mut block: &[u8]) -> Result<Vec<Descriptor>> {
    let mut descriptors = Vec::new();
    while !block.is_empty() {
        track_assert!(
            block.len() >= 2,
            ErrorKind::DescriptorParse,
            "Truncated descriptor header: {} bytes left",
            block.len()
        );
        let tag = track!(DESCRIPTOR_TAG.read(block))?;
        let len = track!(DESCRIPTOR_LENGTH.read(block))? as usize;
        track_assert!(
            2 + len <= block.len(),
            ErrorKind::DescriptorParse,
            "tag={:#04x}, length={}, available={}",
            tag,
            len,
            block.len() - 2
        );
        descriptors.push(Descriptor {
            tag,
            data: block[2..2 + len].to_vec(),
        });
        block = &block[2 + len..];
    }
    Ok(descriptors)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn descriptors() {
        let block = [0x05, 0x04, b'C', b'U', b'E', b'I', 0x0A, 0x04, b'e', b'n', b'g', 0x00];
        let descriptors = track_try_unwrap!(parse_descriptors(&block));
        assert_eq!(descriptors.len(), 2);
        assert_eq!(
            descriptors[0].registration_format_identifier(),
            Some(&b"CUEI"[..])
        );
        assert_eq!(descriptors[0].iso639_language_code(), None);
        assert_eq!(descriptors[1].iso639_language_code(), Some("eng"));
        assert!(track_try_unwrap!(parse_descriptors(&[])).is_empty());
    }

    #[test]
    fn descriptor_overrun() {
        let e = parse_descriptors(&[0x0A, 0x04, b'e', b'n']).err().unwrap();
        assert_eq!(*e.kind(), ErrorKind::DescriptorParse);

        let e = parse_descriptors(&[0x0A]).err().unwrap();
        assert_eq!(*e.kind(), ErrorKind::DescriptorParse);
    }

    #[test]
    fn stream_types() {
        assert!(StreamType::from(0x0F).is_audio());
        assert!(StreamType::H264.is_video());
        assert!(!StreamType::SCTE35.is_audio());
        assert_eq!(StreamType::new(0x1B).to_string(), "0x1b (H.264)");
        assert_eq!(StreamType::new(0xC0).to_string(), "0xc0");

        let es = ElementaryStream::new(StreamType::EAC3, Pid::from(102), Vec::new());
        assert!(es.is_stream_where_presentation_lags_ebp());
        assert_eq!(es.to_string(), "ES[type=0x87 (E-AC-3) pid=102 descriptors=0]");
    }
}
