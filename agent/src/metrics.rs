//! Prometheus metrics for the capture pipeline

use once_cell::sync::Lazy;
use prometheus::{
    register_counter, register_histogram, register_int_gauge, Counter, Encoder, Histogram,
    IntGauge, TextEncoder,
};

// ── Frame metrics ────────────────────────────────────────────────────────────

pub static FRAMES_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!("advlink_frames_total", "Frames written to the transport").unwrap()
});

pub static BYTES_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!("advlink_bytes_total", "Bytes written to the transport").unwrap()
});

pub static FRAME_WRITE_DURATION: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "advlink_frame_write_seconds",
        "Measured time to push one frame through the byte loop",
        vec![0.0005, 0.001, 0.002, 0.004, 0.005, 0.01, 0.025, 0.05, 0.1]
    )
    .unwrap()
});

pub static LAST_SEQUENCE: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("advlink_last_sequence", "Sequence number of the last frame sent").unwrap()
});

// ── Capture metrics ──────────────────────────────────────────────────────────

pub static PAYLOAD_TRUNCATIONS: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "advlink_payload_truncations_total",
        "Advertisements whose payload exceeded the frame capacity"
    )
    .unwrap()
});

pub static TRANSPORT_ERRORS: Lazy<Counter> = Lazy::new(|| {
    register_counter!("advlink_transport_errors_total", "Failed frame writes").unwrap()
});

/// Render all registered metrics to Prometheus text format.
pub fn encode_metrics() -> anyhow::Result<String> {
    let encoder = TextEncoder::new();
    let families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}
