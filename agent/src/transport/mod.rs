//! Byte-oriented transport sinks
//!
//! The framing core only needs two things from a link: write one byte,
//! blocking until it is accepted, and tell whether the device is ready.
//! [`TransportSink::write_frame`] is the byte loop the pipeline measures;
//! sinks that batch internally override [`TransportSink::flush`].

pub mod device;
pub mod memory;
pub mod paced;

pub use device::{DeviceSink, OpenMode};
pub use memory::MemorySink;
pub use paced::PacedSink;

use crate::config::{TransportConfig, TransportKind};
use crate::error::TransportError;
use advlink_shared::LinkTiming;
use std::time::Duration;
use tracing::info;

/// Blocking byte sink
pub trait TransportSink {
    /// Human-readable name for logs
    fn name(&self) -> &str;

    /// Whether the underlying device can accept bytes. Polled once at
    /// startup.
    fn is_ready(&self) -> bool;

    /// Write one byte, blocking until the device accepts it.
    fn write_byte(&mut self, byte: u8) -> Result<(), TransportError>;

    /// Push out anything held back by a buffering sink.
    fn flush(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    /// Write a whole frame byte by byte, then flush.
    fn write_frame(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        for &b in bytes {
            self.write_byte(b)?;
        }
        self.flush()
    }
}

impl<T: TransportSink + ?Sized> TransportSink for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), TransportError> {
        (**self).write_byte(byte)
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        (**self).flush()
    }

    fn write_frame(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        (**self).write_frame(bytes)
    }
}

/// Boxed sink handed across threads
pub type BoxedSink = Box<dyn TransportSink + Send>;

/// Build the sink described by the configuration.
///
/// Opening never fails here; a device that could not be opened shows up as
/// not ready.
pub fn open(config: &TransportConfig, timing: &LinkTiming) -> BoxedSink {
    let base: BoxedSink = match config.kind {
        TransportKind::Memory => Box::new(MemorySink::new()),
        TransportKind::Device | TransportKind::File => {
            let mode = if config.kind == TransportKind::Device {
                OpenMode::Device
            } else {
                OpenMode::File
            };
            let path = config.resolved_path().unwrap_or_default();
            Box::new(DeviceSink::open(path, mode, config.buffered))
        }
    };

    if !config.pace {
        return base;
    }

    let delay = config
        .inter_byte_delay_us
        .map(Duration::from_micros)
        .unwrap_or_else(|| Duration::from_nanos(timing.byte_nanos()));
    let paced = PacedSink::new(base, delay);
    info!("Pacing {} at {:?} per byte", paced.name(), paced.byte_delay());
    Box::new(paced)
}
