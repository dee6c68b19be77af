//! Output formatting utilities for CLI commands

use advlink_shared::protocol::decoder::{DecodedFrame, SequenceGap};
use advlink_shared::utils::bytes_to_hex;
use colored::Colorize;

/// Print success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print warning message
pub fn warning(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print a `label: value` row
pub fn field(label: &str, value: impl std::fmt::Display) {
    println!("  {:<20} {}", format!("{}:", label).dimmed(), value);
}

/// One line per decoded frame
pub fn frame_line(decoded: &DecodedFrame) -> String {
    let obs = &decoded.frame.observation;
    format!(
        "@{:<8} seq={:<3} addr={} type={} adv=0x{:02x} rssi={:>4} len={:<2} data={}",
        decoded.offset,
        decoded.frame.sequence,
        obs.address(),
        obs.address_type(),
        obs.advertisement_type(),
        obs.signal_strength(),
        obs.payload_length(),
        bytes_to_hex(obs.payload())
    )
}

pub fn gap_line(gap: &SequenceGap) -> String {
    format!(
        "sequence gap: expected {}, received {} ({} missing)",
        gap.expected, gap.received, gap.missing
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use advlink_shared::{Address, Frame, Observation};

    #[test]
    fn test_frame_line() {
        let obs = Observation::new(
            Address([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]),
            0,
            3,
            -60,
            &[0x02, 0x01, 0x06],
        );
        let decoded = DecodedFrame {
            offset: 47,
            frame: Frame::new(1, obs),
            gap: None,
        };
        let line = frame_line(&decoded);
        assert!(line.contains("seq=1"));
        assert!(line.contains("addr=AA:BB:CC:DD:EE:FF"));
        assert!(line.contains("rssi= -60"));
        assert!(line.contains("data=020106"));
    }

    #[test]
    fn test_gap_line() {
        let gap = SequenceGap {
            expected: 254,
            received: 2,
            missing: 4,
        };
        assert_eq!(
            gap_line(&gap),
            "sequence gap: expected 254, received 2 (4 missing)"
        );
    }
}
