//! Sink wrapper that holds each byte for its line time

use super::TransportSink;
use crate::error::TransportError;
use std::time::Duration;

/// Blocks after every byte for a fixed delay, the way a polled UART
/// busy-waits between characters.
#[derive(Debug)]
pub struct PacedSink<S> {
    inner: S,
    byte_delay: Duration,
}

impl<S: TransportSink> PacedSink<S> {
    pub fn new(inner: S, byte_delay: Duration) -> Self {
        Self { inner, byte_delay }
    }

    pub fn byte_delay(&self) -> Duration {
        self.byte_delay
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: TransportSink> TransportSink for PacedSink<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn is_ready(&self) -> bool {
        self.inner.is_ready()
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), TransportError> {
        self.inner.write_byte(byte)?;
        if !self.byte_delay.is_zero() {
            std::thread::sleep(self.byte_delay);
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        self.inner.flush()
    }
}
