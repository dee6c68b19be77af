//! Receiver-side frame decoder for a raw byte stream.
//!
//! Locates frames by their sync header, decodes them and reports sequence
//! discontinuities. Bytes that cannot start a valid frame are skipped one at
//! a time, so the decoder resynchronizes after corruption or truncation.

use super::sequence::sequence_gap;
use super::wire::{Frame, FRAME_SIZE, SYNC_HEADER, SYNC_HEADER_LEN};
use serde::Serialize;

/// Discontinuity between two consecutive decoded frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SequenceGap {
    pub expected: u8,
    pub received: u8,
    /// Frames missing modulo 256
    pub missing: u8,
}

/// A frame found in the stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    /// Stream offset of the first sync byte
    pub offset: u64,
    pub frame: Frame,
    /// Set when the sequence did not follow the previous frame
    pub gap: Option<SequenceGap>,
}

/// Decoder counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DecoderStats {
    pub frames: u64,
    pub gaps: u64,
    pub missing_frames: u64,
    pub discarded_bytes: u64,
    pub rejected_candidates: u64,
}

/// Incremental stream decoder
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
    /// Stream offset of `buffer[0]`
    base_offset: u64,
    last_sequence: Option<u8>,
    stats: DecoderStats,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(FRAME_SIZE * 4),
            ..Default::default()
        }
    }

    /// Feed bytes and return every frame completed by them.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<DecodedFrame> {
        self.buffer.extend_from_slice(bytes);
        let mut out = Vec::new();

        loop {
            match find_sync(&self.buffer) {
                Some(pos) => self.discard(pos),
                None => {
                    // Keep a possible partial header at the tail
                    let keep = self.buffer.len().min(SYNC_HEADER_LEN - 1);
                    let drop = self.buffer.len() - keep;
                    self.discard(drop);
                    break;
                }
            }

            if self.buffer.len() < FRAME_SIZE {
                break;
            }

            match Frame::decode(&self.buffer[..FRAME_SIZE]) {
                Ok(frame) => {
                    let gap = self.track_sequence(frame.sequence);
                    out.push(DecodedFrame {
                        offset: self.base_offset,
                        frame,
                        gap,
                    });
                    self.stats.frames += 1;
                    self.advance(FRAME_SIZE);
                }
                Err(_) => {
                    self.stats.rejected_candidates += 1;
                    self.discard(1);
                }
            }
        }

        out
    }

    /// Bytes held waiting for the rest of a frame
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    fn track_sequence(&mut self, received: u8) -> Option<SequenceGap> {
        let gap = self.last_sequence.and_then(|last| {
            let expected = last.wrapping_add(1);
            (expected != received).then(|| SequenceGap {
                expected,
                received,
                missing: sequence_gap(expected, received),
            })
        });

        if let Some(g) = gap {
            self.stats.gaps += 1;
            self.stats.missing_frames += g.missing as u64;
        }
        self.last_sequence = Some(received);
        gap
    }

    fn discard(&mut self, n: usize) {
        self.stats.discarded_bytes += n as u64;
        self.advance(n);
    }

    fn advance(&mut self, n: usize) {
        self.buffer.drain(..n);
        self.base_offset += n as u64;
    }
}

fn find_sync(buf: &[u8]) -> Option<usize> {
    buf.windows(SYNC_HEADER_LEN).position(|w| w == SYNC_HEADER)
}
