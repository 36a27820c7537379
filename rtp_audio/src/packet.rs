use heapless::Vec;

use crate::codecs::{Codec, Samples, MAX_DATAGRAM, MAX_PAYLOAD};
use crate::error::{CodecError, Result};
use crate::rtp::{RtpHeader, HEADER_LEN};

pub type Datagram = Vec<u8, MAX_DATAGRAM>;

/// One RTP packet: a header plus its payload as canonical PCM samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtpPacket {
    pub header: RtpHeader,
    payload: Samples,
}

impl RtpPacket {
    pub fn new(header: RtpHeader) -> Self {
        Self {
            header,
            payload: Vec::new(),
        }
    }

    pub fn with_samples(
        header: RtpHeader,
        samples: &[i16],
    ) -> std::result::Result<Self, CodecError> {
        let mut packet = Self::new(header);
        packet.push_samples(samples)?;
        Ok(packet)
    }

    /// Append samples to the payload. Nothing is appended if they don't fit.
    pub fn push_samples(&mut self, samples: &[i16]) -> std::result::Result<(), CodecError> {
        let total = self.payload.len() + samples.len();
        if total > MAX_PAYLOAD {
            return Err(CodecError::PayloadTooLarge(total));
        }
        // Capacity checked above.
        let _ = self.payload.extend_from_slice(samples);
        Ok(())
    }

    pub fn samples(&self) -> &[i16] {
        &self.payload
    }

    pub fn sample_count(&self) -> usize {
        self.payload.len()
    }

    pub fn into_samples(self) -> Samples {
        self.payload
    }
}

/// Combines the header codec with a payload `Codec` to move between
/// datagrams and [`RtpPacket`]s.
pub struct PacketAssembler {
    codec: Box<dyn Codec + Send>,
}

impl PacketAssembler {
    pub fn new(codec: impl Codec + Send + 'static) -> Self {
        Self {
            codec: Box::new(codec),
        }
    }

    /// Decode the header and transcode the payload. Header errors come back
    /// as `RtpError::Protocol`, payload errors as `RtpError::Codec`.
    pub fn from_bytes(&self, datagram: &[u8]) -> Result<RtpPacket> {
        let (header, raw) = Self::split(datagram)?;
        let payload = self.codec.decode(header.payload_type, raw)?;
        Ok(RtpPacket { header, payload })
    }

    pub fn to_bytes(&self, packet: &RtpPacket) -> Result<Datagram> {
        packet.header.validate()?;
        let encoded = self.codec.encode(packet.header.payload_type, packet.samples())?;
        Self::frame_encoded(&packet.header, &encoded)
    }

    /// Build a datagram around payload bytes that are already encoded.
    pub fn frame_encoded(header: &RtpHeader, payload: &[u8]) -> Result<Datagram> {
        header.validate()?;
        if payload.len() > MAX_PAYLOAD {
            return Err(CodecError::PayloadTooLarge(payload.len()).into());
        }

        let mut out: Datagram = Vec::new();
        // Both fit: HEADER_LEN + MAX_PAYLOAD == MAX_DATAGRAM.
        let _ = out.extend_from_slice(&header.encode());
        let _ = out.extend_from_slice(payload);
        Ok(out)
    }

    /// Decode only the header, returning the raw payload untouched.
    pub fn split(datagram: &[u8]) -> Result<(RtpHeader, &[u8])> {
        let header = RtpHeader::decode(datagram)?;
        Ok((header, &datagram[HEADER_LEN..]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codecs::UlawCodec;
    use crate::error::{ProtocolError, RtpError};
    use crate::rtp::PayloadType;

    fn datagram(b1: u8, payload: &[u8]) -> std::vec::Vec<u8> {
        let mut bytes = vec![
            0x80, b1, 0x00, 0x0D, 0x00, 0x00, 0x00, 0x2A, 0x00, 0x00, 0x38, 0x27,
        ];
        bytes.extend_from_slice(payload);
        bytes
    }

    #[test]
    fn decodes_mulaw_payload_to_pcm() {
        let assembler = PacketAssembler::new(UlawCodec);
        let packet = assembler.from_bytes(&datagram(0, &[0xff; 160])).unwrap();
        assert_eq!(packet.header.sequence_number, 13);
        assert_eq!(packet.header.ssrc, 14375);
        assert_eq!(packet.sample_count(), 160);
        assert!(packet.samples().iter().all(|&s| s == 0));
    }

    #[test]
    fn decodes_long_mulaw_frame() {
        // 80 ms at 8 kHz
        let assembler = PacketAssembler::new(UlawCodec);
        let packet = assembler.from_bytes(&datagram(0, &[0xff; 640])).unwrap();
        assert_eq!(packet.sample_count(), 640);
        assert_eq!(assembler.to_bytes(&packet).unwrap().len(), HEADER_LEN + 640);
    }

    #[test]
    fn largest_datagram_payload_decodes() {
        let assembler = PacketAssembler::new(UlawCodec);
        let packet = assembler
            .from_bytes(&datagram(0, &[0xff; MAX_DATAGRAM - HEADER_LEN]))
            .unwrap();
        assert_eq!(packet.sample_count(), MAX_PAYLOAD);
    }

    #[test]
    fn header_only_datagram_has_empty_payload() {
        let assembler = PacketAssembler::new(UlawCodec);
        let packet = assembler.from_bytes(&datagram(0, &[])).unwrap();
        assert_eq!(packet.sample_count(), 0);
    }

    #[test]
    fn unregistered_payload_type_is_a_codec_error() {
        let assembler = PacketAssembler::new(UlawCodec);
        let err = assembler.from_bytes(&datagram(99, &[0xff; 160])).unwrap_err();
        assert!(matches!(
            err,
            RtpError::Codec(CodecError::UnsupportedPayloadType(99))
        ));
    }

    #[test]
    fn header_errors_pass_through() {
        let assembler = PacketAssembler::new(UlawCodec);
        let mut bytes = datagram(0, &[0xff; 8]);
        bytes[0] = 0x40;
        assert!(matches!(
            assembler.from_bytes(&bytes),
            Err(RtpError::Protocol(ProtocolError::UnsupportedVersion(1)))
        ));
    }

    #[test]
    fn to_bytes_prefixes_header() {
        let assembler = PacketAssembler::new(UlawCodec);
        let mut header = RtpHeader::new(PayloadType::Mulaw8K, 14375);
        header.sequence_number = 13;
        header.timestamp = 42;
        let packet = RtpPacket::with_samples(header, &[0; 160]).unwrap();

        let bytes = assembler.to_bytes(&packet).unwrap();
        assert_eq!(bytes.len(), HEADER_LEN + 160);
        assert_eq!(bytes[..HEADER_LEN], datagram(0, &[])[..]);
        assert!(bytes[HEADER_LEN..].iter().all(|&b| b == 0xff));

        let back = assembler.from_bytes(&bytes).unwrap();
        assert_eq!(back, packet);
    }

    #[test]
    fn to_bytes_refuses_variable_length_headers() {
        let assembler = PacketAssembler::new(UlawCodec);
        let mut header = RtpHeader::default();
        header.csrc_count = 1;
        let packet = RtpPacket::new(header);
        assert!(matches!(
            assembler.to_bytes(&packet),
            Err(RtpError::Protocol(ProtocolError::UnsupportedFeature { .. }))
        ));
    }

    #[test]
    fn split_leaves_payload_raw() {
        let bytes = datagram(8, &[1, 2, 3]);
        let (header, raw) = PacketAssembler::split(&bytes).unwrap();
        assert_eq!(header.payload_type, PayloadType::Alaw8K);
        assert_eq!(raw, &[1, 2, 3]);
    }

    #[test]
    fn push_samples_is_bounded() {
        let mut packet = RtpPacket::new(RtpHeader::default());
        packet.push_samples(&[1; 1_400]).unwrap();
        assert_eq!(
            packet.push_samples(&[1; 89]),
            Err(CodecError::PayloadTooLarge(MAX_PAYLOAD + 1))
        );
        assert_eq!(packet.sample_count(), 1_400);
        packet.push_samples(&[2; 88]).unwrap();
        assert_eq!(packet.into_samples().len(), MAX_PAYLOAD);
    }
}
