use thiserror::Error;

use crate::transport::TransportState;

/// Malformed or structurally unsupported RTP header. Fatal to one packet.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("datagram too short for an RTP header ({0} bytes)")]
    Truncated(usize),
    #[error("unsupported RTP version {0}")]
    UnsupportedVersion(u8),
    #[error("unsupported header layout (csrc_count={csrc_count}, extension={extension})")]
    UnsupportedFeature { csrc_count: u8, extension: bool },
}

/// Payload type recognised on the wire but not transcodable. Fatal to one packet.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    #[error("unsupported payload type {0}")]
    UnsupportedPayloadType(u8),
    #[error("payload too large ({0} units)")]
    PayloadTooLarge(usize),
}

/// Invalid startup input. Fatal to the bind or registration that raised it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("RTP port {0} is odd; odd ports are reserved for RTCP")]
    OddPort(u16),
    #[error("no even ephemeral port available")]
    NoEvenPort,
    #[error("a consumer is already registered")]
    ConsumerAlreadySet,
    #[error("invalid consumer: {0}")]
    InvalidConsumer(String),
}

#[derive(Debug, Error)]
pub enum RtpError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),
    #[error("operation not valid while transport is {0:?}")]
    InvalidState(TransportState),
}

pub type Result<T> = std::result::Result<T, RtpError>;
