//! RTP media core for the dial bridge: the fixed 12-byte header codec,
//! packet assembly over a payload codec, outgoing sequence state, and the
//! UDP transport that ties them together.

pub mod codecs;
pub mod config;
pub mod error;
pub mod packet;
pub mod rtp;
pub mod sequence;
pub mod transport;

pub use codecs::ulaw::{decode_ulaw, encode_ulaw};
pub use codecs::{Codec, UlawCodec, MAX_DATAGRAM, MAX_PAYLOAD};
pub use config::{ReceivePolicy, TransportConfig};
pub use error::{CodecError, ConfigError, ProtocolError, RtpError};
pub use packet::{Datagram, PacketAssembler, RtpPacket};
pub use rtp::{PayloadType, RtpHeader, HEADER_LEN};
pub use sequence::SequenceState;
pub use transport::{Arrival, Consumer, Outbound, Transport, TransportState};
