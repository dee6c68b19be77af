//! In-memory sink

use super::TransportSink;
use crate::error::TransportError;

/// Collects written bytes in a `Vec`. Never blocks.
#[derive(Debug)]
pub struct MemorySink {
    bytes: Vec<u8>,
    ready: bool,
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySink {
    pub fn new() -> Self {
        Self {
            bytes: Vec::new(),
            ready: true,
        }
    }

    /// A sink that reports not ready, for exercising startup failure
    pub fn not_ready() -> Self {
        Self {
            bytes: Vec::new(),
            ready: false,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl TransportSink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), TransportError> {
        self.bytes.push(byte);
        Ok(())
    }
}
