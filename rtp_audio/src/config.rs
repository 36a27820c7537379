use std::net::Ipv4Addr;

use crate::rtp::{PayloadType, DEFAULT_SSRC};

/// What to do with a decoded packet when no consumer is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReceivePolicy {
    /// Keep only the most recent packet, overwriting anything not yet taken.
    #[default]
    CacheLatest,
    Discard,
}

/// Session settings, fixed for the life of a `Transport`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    pub listen_addr: Ipv4Addr,
    /// Must be even. Zero picks an even ephemeral port.
    pub port: u16,
    pub ssrc: u32,
    pub payload_type: PayloadType,
    pub receive_policy: ReceivePolicy,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            listen_addr: Ipv4Addr::UNSPECIFIED,
            port: 0,
            ssrc: DEFAULT_SSRC,
            payload_type: PayloadType::Mulaw8K,
            receive_policy: ReceivePolicy::default(),
        }
    }
}

impl TransportConfig {
    pub fn new(listen_addr: Ipv4Addr, port: u16) -> Self {
        Self {
            listen_addr,
            port,
            ..Self::default()
        }
    }

    pub fn with_ssrc(mut self, ssrc: u32) -> Self {
        self.ssrc = ssrc;
        self
    }

    pub fn with_receive_policy(mut self, policy: ReceivePolicy) -> Self {
        self.receive_policy = policy;
        self
    }
}
