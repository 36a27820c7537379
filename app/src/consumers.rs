use std::net::SocketAddr;
use std::str::FromStr;

use rtp_audio::{ConfigError, Consumer, Outbound, RtpPacket};

use crate::AppError;

/// Packets per summary line from the log consumer; one second of 20 ms frames.
const LOG_EVERY: u64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerKind {
    /// Send every received frame back to the configured remote endpoint.
    Echo,
    /// Log arrivals and sequence gaps, nothing else.
    Log,
    /// Register nothing; the transport keeps only the latest packet.
    Cache,
}

impl FromStr for ConsumerKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "echo" => Ok(ConsumerKind::Echo),
            "log" => Ok(ConsumerKind::Log),
            "cache" => Ok(ConsumerKind::Cache),
            _ => Err(ConfigError::InvalidConsumer(s.to_string())),
        }
    }
}

/// Build the consumer for `kind`. `None` means the transport's receive
/// policy handles arrivals on its own.
pub fn build(
    kind: ConsumerKind,
    remote: Option<SocketAddr>,
) -> Result<Option<Consumer>, AppError> {
    match kind {
        ConsumerKind::Echo => {
            let remote = remote.ok_or_else(|| {
                AppError::Config("echo consumer needs remote_addr".to_string())
            })?;
            Ok(Some(Box::new(echo(remote))))
        }
        ConsumerKind::Log => Ok(Some(Box::new(log_arrivals()))),
        ConsumerKind::Cache => Ok(None),
    }
}

// Replies always go to the configured remote, never to whoever sent the
// packet, so a spoofed datagram can't redirect the stream.
fn echo(remote: SocketAddr) -> impl FnMut(RtpPacket, &mut Outbound<'_>) + Send + 'static {
    move |packet, out| {
        if let Err(e) = out.send(packet.samples(), remote) {
            log::warn!("echo: failed to relay seq={}: {e}", packet.header.sequence_number);
        }
    }
}

fn log_arrivals() -> impl FnMut(RtpPacket, &mut Outbound<'_>) + Send + 'static {
    let mut tracker = GapTracker::default();
    move |packet, _out| {
        if let Some(lost) = tracker.observe(packet.header.sequence_number) {
            log::warn!(
                "RTP RX: {lost} packet(s) missing before seq={}",
                packet.header.sequence_number
            );
        }
        log::debug!("RTP RX: {}", packet.header);
        if tracker.received % LOG_EVERY == 0 {
            log::info!("RTP RX: {} packets, {} lost", tracker.received, tracker.lost);
        }
    }
}

#[derive(Debug, Default)]
struct GapTracker {
    last_seq: Option<u16>,
    received: u64,
    lost: u64,
}

impl GapTracker {
    /// Record a sequence number, returning how many were skipped since the
    /// previous one. Late or duplicate packets count as no gap.
    fn observe(&mut self, seq: u16) -> Option<u64> {
        self.received += 1;
        let prev = self.last_seq.replace(seq);
        let prev = prev?;

        let delta = seq.wrapping_sub(prev);
        if delta == 0 || delta >= 0x8000 {
            self.last_seq = Some(prev);
            return None;
        }

        let missing = u64::from(delta - 1);
        if missing == 0 {
            return None;
        }
        self.lost += missing;
        Some(missing)
    }
}
