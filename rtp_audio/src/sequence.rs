use rand::Rng;

/// Upper bound (inclusive) for the initial sequence number, about a quarter
/// of the 16-bit range.
pub const MAX_INITIAL_SEQUENCE: u16 = 16_383;
/// Upper bound (inclusive) for the initial timestamp, about a quarter of the
/// 32-bit range.
pub const MAX_INITIAL_TIMESTAMP: u32 = 536_870_911;

/// Outgoing sequence number and timestamp for one RTP session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceState {
    sequence_number: u16,
    timestamp: u32,
}

impl SequenceState {
    /// Seed a new session with random starting points well below wraparound.
    pub fn random() -> Self {
        let mut rng = rand::rng();
        Self {
            sequence_number: rng.random_range(0..=MAX_INITIAL_SEQUENCE),
            timestamp: rng.random_range(0..=MAX_INITIAL_TIMESTAMP),
        }
    }

    pub fn from_parts(sequence_number: u16, timestamp: u32) -> Self {
        Self {
            sequence_number,
            timestamp,
        }
    }

    pub fn sequence_number(&self) -> u16 {
        self.sequence_number
    }

    pub fn timestamp(&self) -> u32 {
        self.timestamp
    }

    /// Step past one transmitted packet carrying `ticks` samples.
    pub fn advance(&mut self, ticks: u32) {
        self.sequence_number = self.sequence_number.wrapping_add(1);
        self.timestamp = self.timestamp.wrapping_add(ticks);
    }
}
