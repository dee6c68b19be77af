//! Capture adapter
//!
//! Sits between the scan subsystem and the transport. Each report is copied
//! into an [`Observation`], stamped with the next sequence number and written
//! out as one frame. The adapter owns the sequence counter, so sequence
//! numbers are only ever handed out under the same lock that serializes
//! writes to the sink.

use crate::error::{AgentError, TransportError};
use crate::instrumentation::{record_frame, FrameTiming, LatencySummary};
use crate::metrics;
use crate::scanner::AdvertisementReport;
use crate::transport::TransportSink;
use advlink_shared::{encode_frame, Observation, SequenceCounter, FRAME_SIZE, PAYLOAD_CAPACITY};
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Counters kept by the adapter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CaptureStats {
    pub frames_sent: u64,
    pub bytes_written: u64,
    pub payloads_truncated: u64,
    pub write_failures: u64,
    pub last_sequence: Option<u8>,
    pub latency: LatencySummary,
}

/// Frames observations onto a sink
#[derive(Debug)]
pub struct CaptureAdapter<S: TransportSink> {
    sink: S,
    sequence: SequenceCounter,
    stats: CaptureStats,
}

impl<S: TransportSink> CaptureAdapter<S> {
    /// Wrap `sink`, checking readiness once.
    ///
    /// A sink that is not ready is fatal; there is no retry.
    pub fn new(sink: S) -> Result<Self, AgentError> {
        if !sink.is_ready() {
            error!("Transport {} is not ready", sink.name());
            return Err(AgentError::TransportNotReady(sink.name().to_string()));
        }

        info!("Capture adapter attached to {}", sink.name());
        Ok(Self {
            sink,
            sequence: SequenceCounter::new(),
            stats: CaptureStats::default(),
        })
    }

    /// Scanner callback: capture one report and transmit it.
    ///
    /// The report's payload is only borrowed, so it is copied (and truncated
    /// to [`PAYLOAD_CAPACITY`]) before anything else happens.
    pub fn on_advertisement(
        &mut self,
        report: &AdvertisementReport<'_>,
    ) -> Result<FrameTiming, TransportError> {
        let (observation, observed) = Observation::from_payload_iter(
            report.address,
            report.address_type,
            report.adv_type,
            report.rssi,
            report.data.iter().copied(),
        );

        if observed > PAYLOAD_CAPACITY {
            debug!(
                "Truncated payload from {} ({} bytes, kept {})",
                report.address, observed, PAYLOAD_CAPACITY
            );
            self.stats.payloads_truncated += 1;
            metrics::PAYLOAD_TRUNCATIONS.inc();
        }

        self.send(&observation)
    }

    /// Frame `observation` with the next sequence number and write it.
    ///
    /// The sequence number is consumed even when the write fails.
    pub fn send(&mut self, observation: &Observation) -> Result<FrameTiming, TransportError> {
        let sequence = self.sequence.advance();
        let frame = encode_frame(observation, sequence);

        let start = Instant::now();
        let written = self.sink.write_frame(&frame);
        let elapsed = start.elapsed();

        if let Err(e) = written {
            warn!("Frame {} failed on {}: {}", sequence, self.sink.name(), e);
            self.stats.write_failures += 1;
            metrics::TRANSPORT_ERRORS.inc();
            return Err(e);
        }

        let timing = FrameTiming {
            sequence,
            bytes: FRAME_SIZE,
            elapsed,
        };
        record_frame(&timing);

        self.stats.frames_sent += 1;
        self.stats.bytes_written += FRAME_SIZE as u64;
        self.stats.last_sequence = Some(sequence);
        self.stats.latency.record(elapsed);

        Ok(timing)
    }

    pub fn stats(&self) -> CaptureStats {
        self.stats
    }

    /// Sequence number the next frame will carry
    pub fn next_sequence(&self) -> u8 {
        self.sequence.peek()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}
