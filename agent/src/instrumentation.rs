//! Frame size and latency reporting
//!
//! Two independent measurements, neither of which affects control flow: the
//! static composition of a frame with its nominal line time, logged once at
//! startup, and the measured duration of each frame's byte loop.

use crate::metrics;
use advlink_shared::protocol::composition::TransmitTime;
use advlink_shared::{FrameComposition, LinkTiming};
use serde::Serialize;
use std::time::Duration;
use tracing::info;

/// Log the frame composition and the nominal transmission time.
pub fn report_composition(timing: &LinkTiming) -> FrameComposition {
    let composition = FrameComposition::new(timing);

    info!("----------------------------------------");
    info!("Serial frame:");
    info!("- Header size: {} bytes", composition.header_size);
    info!("- Metadata size: {} bytes", composition.metadata_size);
    info!("- Observation size: {} bytes", composition.observation_size);
    info!("- Total frame size: {} bytes", composition.total_size);
    info!(
        "- Transmission time: {} ({} baud, {} bits/byte)",
        composition.transmit_display(),
        timing.baud_rate,
        timing.bits_per_byte
    );
    info!("----------------------------------------");

    composition
}

/// Measured write of one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTiming {
    pub sequence: u8,
    pub bytes: usize,
    pub elapsed: Duration,
}

impl FrameTiming {
    /// Measured time in the same format as the composition estimate
    pub fn elapsed_display(&self) -> TransmitTime {
        micros(self.elapsed)
    }
}

fn micros(d: Duration) -> TransmitTime {
    TransmitTime(d.as_micros() as u64)
}

/// Log a frame's measured latency and feed the metrics.
pub fn record_frame(timing: &FrameTiming) {
    info!(
        "Frame {} transmitted in {}",
        timing.sequence,
        timing.elapsed_display()
    );

    metrics::FRAMES_TOTAL.inc();
    metrics::BYTES_TOTAL.inc_by(timing.bytes as f64);
    metrics::FRAME_WRITE_DURATION.observe(timing.elapsed.as_secs_f64());
    metrics::LAST_SEQUENCE.set(timing.sequence as i64);
}

/// Running latency summary over many frames
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LatencySummary {
    pub frames: u64,
    pub total: Duration,
    pub min: Option<Duration>,
    pub max: Option<Duration>,
}

impl LatencySummary {
    pub fn record(&mut self, elapsed: Duration) {
        self.frames += 1;
        self.total += elapsed;
        self.min = Some(self.min.map_or(elapsed, |m| m.min(elapsed)));
        self.max = Some(self.max.map_or(elapsed, |m| m.max(elapsed)));
    }

    pub fn mean(&self) -> Option<Duration> {
        if self.frames == 0 {
            return None;
        }
        let nanos = self.total.as_nanos() / self.frames as u128;
        Some(Duration::from_nanos(nanos as u64))
    }

    /// Log the summary next to the nominal estimate.
    pub fn log(&self, composition: &FrameComposition) {
        match (self.mean(), self.min, self.max) {
            (Some(mean), Some(min), Some(max)) => info!(
                "Frame write latency over {} frames: mean {}, min {}, max {} (nominal {})",
                self.frames,
                micros(mean),
                micros(min),
                micros(max),
                composition.transmit_display()
            ),
            _ => info!("No frames transmitted"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_composition_values() {
        let c = report_composition(&LinkTiming::default());
        assert_eq!(c.total_size, 47);
        assert_eq!(c.transmit_us, 4079);
    }

    #[test]
    fn test_latency_summary() {
        let mut summary = LatencySummary::default();
        assert_eq!(summary.mean(), None);

        summary.record(Duration::from_micros(4000));
        summary.record(Duration::from_micros(6000));

        assert_eq!(summary.frames, 2);
        assert_eq!(summary.mean(), Some(Duration::from_micros(5000)));
        assert_eq!(summary.min, Some(Duration::from_micros(4000)));
        assert_eq!(summary.max, Some(Duration::from_micros(6000)));
    }

    #[test]
    fn test_frame_time_matches_estimate_format() {
        let timing = FrameTiming {
            sequence: 7,
            bytes: 47,
            elapsed: Duration::from_micros(4079),
        };
        assert_eq!(timing.elapsed_display().to_string(), "4.079 ms");

        let fast = FrameTiming {
            elapsed: Duration::from_micros(12),
            ..timing
        };
        assert_eq!(fast.elapsed_display().to_string(), "0.012 ms");
        record_frame(&fast);
    }

    #[test]
    fn test_mean_over_more_than_u32_frames() {
        let summary = LatencySummary {
            frames: 1 << 32,
            total: Duration::from_secs(1 << 32),
            min: Some(Duration::from_secs(1)),
            max: Some(Duration::from_secs(1)),
        };
        assert_eq!(summary.mean(), Some(Duration::from_secs(1)));
    }
}
