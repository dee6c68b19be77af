//! Per-link frame sequence counter

/// 8-bit frame sequence counter.
///
/// Starts at 0, hands out each value once and wraps from 255 back to 0.
/// The only way to get a counter at 0 again is to build a new one.
#[derive(Debug, Default)]
pub struct SequenceCounter {
    next: u8,
}

impl SequenceCounter {
    pub fn new() -> Self {
        Self { next: 0 }
    }

    /// Value the next frame will carry
    pub fn peek(&self) -> u8 {
        self.next
    }

    /// Take the current value and move to the next one.
    pub fn advance(&mut self) -> u8 {
        let current = self.next;
        self.next = self.next.wrapping_add(1);
        current
    }
}

/// Number of frames lost between `expected` and `received`, modulo 256.
///
/// Gaps of 256 frames or more are indistinguishable from no gap.
pub fn sequence_gap(expected: u8, received: u8) -> u8 {
    received.wrapping_sub(expected)
}
