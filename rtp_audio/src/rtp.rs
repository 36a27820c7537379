use core::fmt;

use crate::error::ProtocolError;

pub const RTP_VERSION: u8 = 2;
pub const HEADER_LEN: usize = 12;

/// Default SSRC, matching what the handset's original server advertised.
pub const DEFAULT_SSRC: u32 = 14375;

/// Static payload types this bridge knows about. Anything else is carried
/// through as `Unassigned` so headers survive a decode/encode cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadType {
    Mulaw8K,
    Alaw8K,
    G7228K,
    G7298K,
    /// Any other 7-bit value. Build these with `From<u8>`; an `Unassigned`
    /// holding a known number is treated as that known type.
    Unassigned(u8),
}

impl PayloadType {
    /// Map an `Unassigned` alias of a known number onto its named variant.
    pub fn normalize(self) -> Self {
        PayloadType::from(u8::from(self))
    }

    pub fn name(&self) -> &'static str {
        match self.normalize() {
            PayloadType::Mulaw8K => "Mulaw8K",
            PayloadType::Alaw8K => "Alaw8K",
            PayloadType::G7228K => "G7228K",
            PayloadType::G7298K => "G7298K",
            PayloadType::Unassigned(_) => "unassigned",
        }
    }

    /// RTP clock ticks represented by `encoded_len` bytes of payload.
    ///
    /// G.711 runs one byte per 8 kHz sample. G.722 also advances one tick per
    /// byte because its RTP clock is fixed at 8 kHz. G.729 packs 80 samples
    /// into 10 bytes.
    pub fn clock_ticks(&self, encoded_len: usize) -> u32 {
        let ticks = match self.normalize() {
            PayloadType::G7298K => encoded_len * 8,
            _ => encoded_len,
        };
        ticks as u32
    }
}

impl From<u8> for PayloadType {
    fn from(value: u8) -> Self {
        match value & 0x7f {
            0 => PayloadType::Mulaw8K,
            8 => PayloadType::Alaw8K,
            9 => PayloadType::G7228K,
            18 => PayloadType::G7298K,
            other => PayloadType::Unassigned(other),
        }
    }
}

impl From<PayloadType> for u8 {
    fn from(pt: PayloadType) -> Self {
        match pt {
            PayloadType::Mulaw8K => 0,
            PayloadType::Alaw8K => 8,
            PayloadType::G7228K => 9,
            PayloadType::G7298K => 18,
            PayloadType::Unassigned(n) => n & 0x7f,
        }
    }
}

impl fmt::Display for PayloadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), u8::from(*self))
    }
}

/// The fixed 12-byte RTP header. CSRC lists and header extensions are not
/// supported, so a valid header always has `csrc_count == 0` and
/// `extension == false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RtpHeader {
    pub version: u8,
    pub padding: bool,
    pub extension: bool,
    pub csrc_count: u8,
    pub marker: bool,
    pub payload_type: PayloadType,
    pub sequence_number: u16,
    pub timestamp: u32,
    pub ssrc: u32,
}

impl Default for RtpHeader {
    fn default() -> Self {
        Self::new(PayloadType::Mulaw8K, DEFAULT_SSRC)
    }
}

impl RtpHeader {
    pub fn new(payload_type: PayloadType, ssrc: u32) -> Self {
        Self {
            version: RTP_VERSION,
            padding: false,
            extension: false,
            csrc_count: 0,
            marker: false,
            payload_type,
            sequence_number: 0,
            timestamp: 0,
            ssrc,
        }
    }

    /// Check that this header fits the fixed 12-byte layout.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.version != RTP_VERSION {
            return Err(ProtocolError::UnsupportedVersion(self.version));
        }
        if self.csrc_count != 0 || self.extension {
            return Err(ProtocolError::UnsupportedFeature {
                csrc_count: self.csrc_count,
                extension: self.extension,
            });
        }
        Ok(())
    }

    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let b0 = (self.version & 0b11) << 6
            | ((self.padding as u8) << 5)
            | ((self.extension as u8) << 4)
            | (self.csrc_count & 0x0f);
        let b1 = ((self.marker as u8) << 7) | (u8::from(self.payload_type) & 0x7f);

        let mut out = [0u8; HEADER_LEN];
        out[0] = b0;
        out[1] = b1;
        out[2..4].copy_from_slice(&self.sequence_number.to_be_bytes());
        out[4..8].copy_from_slice(&self.timestamp.to_be_bytes());
        out[8..12].copy_from_slice(&self.ssrc.to_be_bytes());
        out
    }

    /// Decode the header from the first 12 bytes of `bytes`. Anything after
    /// that is left for the caller.
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        if bytes.len() < HEADER_LEN {
            return Err(ProtocolError::Truncated(bytes.len()));
        }

        let b0 = bytes[0];
        let b1 = bytes[1];

        let header = RtpHeader {
            version: b0 >> 6,
            padding: (b0 & 0x20) != 0,
            extension: (b0 & 0x10) != 0,
            csrc_count: b0 & 0x0f,
            marker: (b1 & 0x80) != 0,
            payload_type: PayloadType::from(b1 & 0x7f),
            sequence_number: u16::from_be_bytes([bytes[2], bytes[3]]),
            timestamp: u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            ssrc: u32::from_be_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
        };

        header.validate()?;

        if header.padding {
            log::warn!(
                "RTP header seq={} is padded; padding is not stripped",
                header.sequence_number
            );
        }
        if header.marker {
            log::debug!("RTP header seq={} has marker bit set", header.sequence_number);
        }

        Ok(header)
    }
}

impl fmt::Display for RtpHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RTPv{} pt={} seq={} ts={} ssrc={:#010x}",
            self.version, self.payload_type, self.sequence_number, self.timestamp, self.ssrc
        )?;
        if self.marker {
            f.write_str(" M")?;
        }
        if self.padding {
            f.write_str(" P")?;
        }
        Ok(())
    }
}
