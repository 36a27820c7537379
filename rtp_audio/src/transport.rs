use std::io::ErrorKind;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};

use crate::codecs::{Codec, MAX_DATAGRAM};
use crate::config::{ReceivePolicy, TransportConfig};
use crate::error::{ConfigError, Result, RtpError};
use crate::packet::{PacketAssembler, RtpPacket};
use crate::rtp::RtpHeader;
use crate::sequence::SequenceState;

const RX_BUF_SIZE: usize = MAX_DATAGRAM;
const EPHEMERAL_ATTEMPTS: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Unbound,
    Bound,
    Closed,
}

/// Outcome of one inbound datagram.
#[derive(Debug)]
pub enum Arrival {
    Delivered,
    Cached,
    Discarded,
    /// The datagram did not decode; the error has already been logged.
    Dropped(RtpError),
}

pub type Consumer = Box<dyn FnMut(RtpPacket, &mut Outbound<'_>) + Send>;

/// Send side of a bound transport, lent to the consumer for the duration of
/// one delivery so it can answer (echo, relay) or shut the session down.
pub struct Outbound<'a> {
    socket: &'a UdpSocket,
    assembler: &'a PacketAssembler,
    sequence: &'a mut SequenceState,
    template: RtpHeader,
    close_requested: &'a mut bool,
}

impl Outbound<'_> {
    /// Encode `samples` with the session codec and send them to `dest`.
    pub fn send(&mut self, samples: &[i16], dest: SocketAddr) -> Result<usize> {
        let header = self.next_header();
        let packet = RtpPacket::with_samples(header, samples)?;
        let datagram = self.assembler.to_bytes(&packet)?;
        self.transmit(&datagram, dest, packet.sample_count() as u32)
    }

    /// Send payload bytes that are already in the session's wire format.
    pub fn send_encoded(&mut self, payload: &[u8], dest: SocketAddr) -> Result<usize> {
        let header = self.next_header();
        let datagram = PacketAssembler::frame_encoded(&header, payload)?;
        let ticks = header.payload_type.clock_ticks(payload.len());
        self.transmit(&datagram, dest, ticks)
    }

    pub fn sequence(&self) -> SequenceState {
        *self.sequence
    }

    /// Close the transport once the current delivery returns.
    pub fn close(&mut self) {
        *self.close_requested = true;
    }

    fn next_header(&self) -> RtpHeader {
        let mut header = self.template;
        header.sequence_number = self.sequence.sequence_number();
        header.timestamp = self.sequence.timestamp();
        header
    }

    // The sequence advances after every attempt, sent or not, so a failed
    // send shows up as a gap at the receiver rather than a duplicate.
    fn transmit(&mut self, datagram: &[u8], dest: SocketAddr, ticks: u32) -> Result<usize> {
        let result = self.socket.send_to(datagram, dest);
        let seq = self.sequence.sequence_number();
        self.sequence.advance(ticks);

        match result {
            Ok(sent) => {
                log::debug!("RTP TX: seq={seq} {sent} bytes -> {dest}");
                Ok(sent)
            }
            Err(e) => {
                log::warn!("RTP TX: send of seq={seq} to {dest} failed: {e}");
                Err(e.into())
            }
        }
    }
}

/// One RTP session over a single UDP socket.
///
/// Datagrams are handled one at a time on the caller's thread: each is
/// decoded and handed to the consumer (or the receive policy) before the next
/// is read. Nothing here is locked; wrap the whole transport if it has to be
/// shared between threads.
pub struct Transport {
    config: TransportConfig,
    state: TransportState,
    socket: Option<UdpSocket>,
    assembler: PacketAssembler,
    sequence: SequenceState,
    template: RtpHeader,
    consumer: Option<Consumer>,
    latest: Option<RtpPacket>,
    close_requested: bool,
}

impl Transport {
    pub fn new(config: TransportConfig, codec: impl Codec + Send + 'static) -> Self {
        let template = RtpHeader::new(config.payload_type, config.ssrc);
        Self {
            config,
            state: TransportState::Unbound,
            socket: None,
            assembler: PacketAssembler::new(codec),
            sequence: SequenceState::random(),
            template,
            consumer: None,
            latest: None,
            close_requested: false,
        }
    }

    /// Start from explicit counters instead of a random seed.
    pub fn with_sequence(mut self, sequence: SequenceState) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn sequence(&self) -> SequenceState {
        self.sequence
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.bound_socket()?.local_addr()?)
    }

    /// Bind the configured address. The port must be even; the odd port
    /// above it belongs to RTCP.
    pub fn bind(&mut self) -> Result<SocketAddr> {
        if self.state != TransportState::Unbound {
            return Err(RtpError::InvalidState(self.state));
        }

        let port = self.config.port;
        if port % 2 != 0 {
            return Err(ConfigError::OddPort(port).into());
        }

        let socket = if port == 0 {
            bind_even_ephemeral(self.config.listen_addr)?
        } else {
            UdpSocket::bind(SocketAddrV4::new(self.config.listen_addr, port))?
        };
        let local = socket.local_addr()?;

        self.socket = Some(socket);
        self.state = TransportState::Bound;
        log::info!(
            "RTP transport bound on {local}, ssrc={:#010x}, pt={}",
            self.config.ssrc,
            self.config.payload_type
        );
        Ok(local)
    }

    /// Register the packet consumer. Only one may ever be set.
    pub fn set_consumer<F>(&mut self, consumer: F) -> std::result::Result<(), ConfigError>
    where
        F: FnMut(RtpPacket, &mut Outbound<'_>) + Send + 'static,
    {
        if self.consumer.is_some() {
            return Err(ConfigError::ConsumerAlreadySet);
        }
        self.consumer = Some(Box::new(consumer));
        Ok(())
    }

    pub fn has_consumer(&self) -> bool {
        self.consumer.is_some()
    }

    /// Pop the cached packet left by `ReceivePolicy::CacheLatest`.
    pub fn take_latest(&mut self) -> Option<RtpPacket> {
        self.latest.take()
    }

    pub fn send(&mut self, samples: &[i16], dest: SocketAddr) -> Result<usize> {
        self.outbound()?.send(samples, dest)
    }

    pub fn send_encoded(&mut self, payload: &[u8], dest: SocketAddr) -> Result<usize> {
        self.outbound()?.send_encoded(payload, dest)
    }

    /// Block until one datagram arrives and process it.
    ///
    /// Only socket failures are returned as errors. A datagram that fails to
    /// decode is logged and reported as [`Arrival::Dropped`].
    pub fn poll_once(&mut self) -> Result<Arrival> {
        let mut buf = [0u8; RX_BUF_SIZE];
        let (len, from) = self.bound_socket()?.recv_from(&mut buf)?;

        match self.handle_datagram(&buf[..len]) {
            Ok(arrival) => Ok(arrival),
            Err(e @ (RtpError::Protocol(_) | RtpError::Codec(_))) => {
                log::warn!("RTP RX: dropping {len} byte datagram from {from}: {e}");
                Ok(Arrival::Dropped(e))
            }
            Err(e) => Err(e),
        }
    }

    /// Decode one datagram and deliver it. This is the receive handler for
    /// hosts that drive their own readiness loop.
    pub fn handle_datagram(&mut self, datagram: &[u8]) -> Result<Arrival> {
        if self.state != TransportState::Bound {
            return Err(RtpError::InvalidState(self.state));
        }

        let packet = self.assembler.from_bytes(datagram)?;
        log::debug!("RTP RX: {} ({} samples)", packet.header, packet.sample_count());

        let arrival = match self.consumer.as_mut() {
            Some(consumer) => {
                let socket = self
                    .socket
                    .as_ref()
                    .ok_or(RtpError::InvalidState(self.state))?;
                let mut outbound = Outbound {
                    socket,
                    assembler: &self.assembler,
                    sequence: &mut self.sequence,
                    template: self.template,
                    close_requested: &mut self.close_requested,
                };
                consumer(packet, &mut outbound);
                Arrival::Delivered
            }
            None => match self.config.receive_policy {
                ReceivePolicy::CacheLatest => {
                    if let Some(stale) = self.latest.replace(packet) {
                        log::debug!(
                            "RTP RX: overwrote undelivered seq={}",
                            stale.header.sequence_number
                        );
                    }
                    Arrival::Cached
                }
                ReceivePolicy::Discard => Arrival::Discarded,
            },
        };

        if self.close_requested {
            self.close();
        }
        Ok(arrival)
    }

    /// Process datagrams until the transport is closed.
    pub fn run(&mut self) -> Result<()> {
        log::info!("RTP transport listening on {}", self.local_addr()?);

        while self.state == TransportState::Bound {
            match self.poll_once() {
                Ok(_) => {}
                // ICMP port-unreachable from an earlier send, reported on
                // some platforms as a receive error, or a signal landing
                // during the wait.
                Err(RtpError::Io(e)) if is_transient(e.kind()) => {
                    log::warn!("RTP RX: ignoring socket error: {e}");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    pub fn close(&mut self) {
        self.close_requested = false;
        if self.state == TransportState::Closed {
            return;
        }
        self.socket = None;
        self.state = TransportState::Closed;
        log::info!("RTP transport closed");
    }

    fn bound_socket(&self) -> Result<&UdpSocket> {
        match (self.state, self.socket.as_ref()) {
            (TransportState::Bound, Some(socket)) => Ok(socket),
            _ => Err(RtpError::InvalidState(self.state)),
        }
    }

    fn outbound(&mut self) -> Result<Outbound<'_>> {
        let socket = match (self.state, self.socket.as_ref()) {
            (TransportState::Bound, Some(socket)) => socket,
            _ => return Err(RtpError::InvalidState(self.state)),
        };
        Ok(Outbound {
            socket,
            assembler: &self.assembler,
            sequence: &mut self.sequence,
            template: self.template,
            close_requested: &mut self.close_requested,
        })
    }
}

fn is_transient(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::ConnectionReset | ErrorKind::ConnectionRefused | ErrorKind::Interrupted
    )
}

// Odd ports handed out along the way stay open until we're done so the OS
// doesn't offer them again.
fn bind_even_ephemeral(ip: Ipv4Addr) -> Result<UdpSocket> {
    let mut rejected = Vec::new();
    for _ in 0..EPHEMERAL_ATTEMPTS {
        let socket = UdpSocket::bind(SocketAddrV4::new(ip, 0))?;
        if socket.local_addr()?.port() % 2 == 0 {
            return Ok(socket);
        }
        rejected.push(socket);
    }
    Err(ConfigError::NoEvenPort.into())
}
