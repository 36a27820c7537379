pub mod ulaw;

use heapless::Vec;

use crate::error::CodecError;
use crate::rtp::{PayloadType, HEADER_LEN};

/// Largest UDP datagram the transport reads or writes.
pub const MAX_DATAGRAM: usize = 1500;

/// Largest payload carried in one packet, in bytes on the wire and in
/// samples once decoded: whatever is left of a datagram after the header.
pub const MAX_PAYLOAD: usize = MAX_DATAGRAM - HEADER_LEN;

pub type Samples = Vec<i16, MAX_PAYLOAD>;
pub type EncodedPayload = Vec<u8, MAX_PAYLOAD>;

/// Converts between wire payload bytes and canonical 16-bit PCM for a given
/// payload type.
pub trait Codec {
    fn encode(
        &self,
        payload_type: PayloadType,
        samples: &[i16],
    ) -> Result<EncodedPayload, CodecError>;

    fn decode(&self, payload_type: PayloadType, bytes: &[u8]) -> Result<Samples, CodecError>;
}

/// G.711 μ-law at 8 kHz, the handset's only payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct UlawCodec;

impl Codec for UlawCodec {
    fn encode(
        &self,
        payload_type: PayloadType,
        samples: &[i16],
    ) -> Result<EncodedPayload, CodecError> {
        match payload_type.normalize() {
            PayloadType::Mulaw8K => ulaw::encode_ulaw(samples),
            other => Err(CodecError::UnsupportedPayloadType(other.into())),
        }
    }

    fn decode(&self, payload_type: PayloadType, bytes: &[u8]) -> Result<Samples, CodecError> {
        match payload_type.normalize() {
            PayloadType::Mulaw8K => ulaw::decode_ulaw(bytes),
            other => Err(CodecError::UnsupportedPayloadType(other.into())),
        }
    }
}
