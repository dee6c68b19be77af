//! Frame size breakdown and nominal transmission time.

use super::wire::{FRAME_SIZE, METADATA_SIZE, SYNC_HEADER_LEN};
use crate::types::observation::OBSERVATION_SIZE;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default UART rate the link runs at
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Start bit + 8 data bits + stop bit
pub const DEFAULT_BITS_PER_BYTE: u32 = 10;

/// Serial line parameters used for the transmission estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkTiming {
    /// Nominal bit rate in bit/s
    pub baud_rate: u32,

    /// Line bits spent per data byte, framing included
    pub bits_per_byte: u32,
}

impl Default for LinkTiming {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            bits_per_byte: DEFAULT_BITS_PER_BYTE,
        }
    }
}

impl LinkTiming {
    pub fn new(baud_rate: u32, bits_per_byte: u32) -> Self {
        Self {
            baud_rate,
            bits_per_byte,
        }
    }

    /// Nominal time on the line for `bytes` bytes, in whole microseconds.
    ///
    /// Returns 0 for a zero baud rate.
    pub fn transmit_micros(&self, bytes: usize) -> u64 {
        if self.baud_rate == 0 {
            return 0;
        }
        let bits = bytes as u64 * self.bits_per_byte as u64;
        bits * 1_000_000 / self.baud_rate as u64
    }

    /// Nominal time for one byte, in nanoseconds
    pub fn byte_nanos(&self) -> u64 {
        if self.baud_rate == 0 {
            return 0;
        }
        self.bits_per_byte as u64 * 1_000_000_000 / self.baud_rate as u64
    }
}

/// Size composition of a wire frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FrameComposition {
    pub header_size: usize,
    pub metadata_size: usize,
    pub observation_size: usize,
    pub total_size: usize,
    /// Estimated line time for one frame, microseconds
    pub transmit_us: u64,
}

impl FrameComposition {
    pub fn new(timing: &LinkTiming) -> Self {
        Self {
            header_size: SYNC_HEADER_LEN,
            metadata_size: METADATA_SIZE,
            observation_size: OBSERVATION_SIZE,
            total_size: FRAME_SIZE,
            transmit_us: timing.transmit_micros(FRAME_SIZE),
        }
    }

    /// Estimate formatted as `<ms>.<thousandths> ms`
    pub fn transmit_display(&self) -> TransmitTime {
        TransmitTime(self.transmit_us)
    }
}

/// Microsecond duration shown as milliseconds with three decimals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransmitTime(pub u64);

impl fmt::Display for TransmitTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:03} ms", self.0 / 1000, self.0 % 1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_composition() {
        let c = FrameComposition::new(&LinkTiming::default());
        assert_eq!(c.header_size, 4);
        assert_eq!(c.metadata_size, 2);
        assert_eq!(c.observation_size, 41);
        assert_eq!(c.total_size, 47);
        assert_eq!(c.transmit_us, 4079);
        assert_eq!(c.transmit_display().to_string(), "4.079 ms");
    }

    #[test]
    fn test_composition_is_deterministic() {
        let timing = LinkTiming::new(9600, 10);
        assert_eq!(FrameComposition::new(&timing), FrameComposition::new(&timing));
        assert_eq!(FrameComposition::new(&timing).transmit_us, 48_958);
    }

    #[test]
    fn test_other_line_settings() {
        // 8N2: 11 bits per byte
        let timing = LinkTiming::new(1_000_000, 11);
        assert_eq!(timing.transmit_micros(47), 517);
        assert_eq!(timing.byte_nanos(), 11_000);
    }

    #[test]
    fn test_zero_baud_rate() {
        let timing = LinkTiming::new(0, 10);
        assert_eq!(timing.transmit_micros(47), 0);
        assert_eq!(timing.byte_nanos(), 0);
    }

    #[test]
    fn test_transmit_display_padding() {
        assert_eq!(TransmitTime(12_005).to_string(), "12.005 ms");
        assert_eq!(TransmitTime(999).to_string(), "0.999 ms");
    }
}
