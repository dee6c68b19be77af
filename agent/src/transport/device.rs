//! Character device / file sink
//!
//! Writes frames to a serial device node such as `/dev/ttyUSB0`, or to a
//! regular file for later decoding. Line settings (baud rate, parity, stop
//! bits) belong to the device and are configured outside the agent.

use super::TransportSink;
use crate::error::TransportError;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// How the path is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Existing device node, opened write-only
    Device,
    /// Regular file, created or truncated
    File,
}

enum Writer {
    Direct(File),
    Buffered(BufWriter<File>),
}

/// Sink backed by an open file descriptor.
///
/// In direct mode every byte is its own `write` call. In buffered mode bytes
/// collect in a `BufWriter` and go out on [`TransportSink::flush`], once per
/// frame.
pub struct DeviceSink {
    name: String,
    writer: Option<Writer>,
}

impl DeviceSink {
    /// Open `path`. Failure is logged and leaves the sink not ready.
    pub fn open(path: impl Into<PathBuf>, mode: OpenMode, buffered: bool) -> Self {
        let path = path.into();
        let name = path.display().to_string();

        let writer = match open_path(&path, mode) {
            Ok(file) => {
                debug!("Opened transport {} ({:?}, buffered={})", name, mode, buffered);
                Some(if buffered {
                    Writer::Buffered(BufWriter::new(file))
                } else {
                    Writer::Direct(file)
                })
            }
            Err(e) => {
                warn!("Failed to open transport {}: {}", name, e);
                None
            }
        };

        Self { name, writer }
    }

    fn io_error(&self, source: std::io::Error) -> TransportError {
        TransportError::Io {
            name: self.name.clone(),
            source,
        }
    }
}

fn open_path(path: &Path, mode: OpenMode) -> std::io::Result<File> {
    match mode {
        OpenMode::Device => OpenOptions::new().write(true).open(path),
        OpenMode::File => OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path),
    }
}

impl TransportSink for DeviceSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_ready(&self) -> bool {
        self.writer.is_some()
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), TransportError> {
        let result = match self.writer.as_mut() {
            Some(Writer::Direct(f)) => f.write_all(&[byte]),
            Some(Writer::Buffered(w)) => w.write_all(&[byte]),
            None => return Err(TransportError::NotOpen(self.name.clone())),
        };
        result.map_err(|e| self.io_error(e))
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        let result = match self.writer.as_mut() {
            Some(Writer::Direct(f)) => f.flush(),
            Some(Writer::Buffered(w)) => w.flush(),
            None => return Err(TransportError::NotOpen(self.name.clone())),
        };
        result.map_err(|e| self.io_error(e))
    }
}
