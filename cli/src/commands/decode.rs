//! Decode command implementation

use crate::output;
use advlink_shared::protocol::decoder::{DecodedFrame, DecoderStats, FrameDecoder};
use advlink_shared::utils::bytes_to_hex;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

const CHUNK_SIZE: usize = 4096;

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Capture file (raw bytes as written to the link)
    pub file: PathBuf,

    /// One JSON object per frame, then a summary object
    #[arg(long, conflicts_with = "summary")]
    pub json: bool,

    /// Only print the summary
    #[arg(long)]
    pub summary: bool,
}

pub fn run(args: DecodeArgs) -> Result<()> {
    let size = std::fs::metadata(&args.file)
        .with_context(|| format!("Failed to stat {}", args.file.display()))?
        .len();

    let progress = if args.summary {
        let bar = ProgressBar::new(size);
        bar.set_style(
            ProgressStyle::with_template("{bar:40} {bytes}/{total_bytes}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar
    } else {
        ProgressBar::hidden()
    };

    let print_frame = |decoded: &DecodedFrame| {
        if args.summary {
            return;
        }
        if args.json {
            println!("{}", frame_json(decoded));
            return;
        }
        if let Some(gap) = &decoded.gap {
            println!("{}", output::gap_line(gap).yellow());
        }
        println!("{}", output::frame_line(decoded));
    };
    let (stats, pending) = decode_file(&args.file, print_frame, |n| progress.inc(n as u64))?;
    progress.finish_and_clear();

    if args.json {
        let value = serde_json::json!({ "stats": stats, "trailing_bytes": pending });
        println!("{}", value);
        return Ok(());
    }

    output::info(&format!("Decoded {}", args.file.display()));
    output::field("Frames", stats.frames);
    output::field("Sequence gaps", stats.gaps);
    output::field("Missing frames", stats.missing_frames);
    output::field("Discarded bytes", stats.discarded_bytes);
    output::field("Rejected candidates", stats.rejected_candidates);

    if pending > 0 {
        output::warning(&format!("{} trailing bytes do not form a frame", pending));
    }
    if stats.gaps == 0 && stats.discarded_bytes == 0 {
        output::success("Stream is continuous");
    } else {
        output::warning("Stream has gaps or corrupt data");
    }

    Ok(())
}

/// Feed `path` through a decoder in chunks. Returns the decoder counters and
/// the number of bytes left over at the end.
pub fn decode_file(
    path: &Path,
    mut on_frame: impl FnMut(&DecodedFrame),
    mut on_chunk: impl FnMut(usize),
) -> Result<(DecoderStats, usize)> {
    let mut file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut decoder = FrameDecoder::new();
    let mut chunk = [0u8; CHUNK_SIZE];

    loop {
        let n = file
            .read(&mut chunk)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if n == 0 {
            break;
        }
        for decoded in decoder.push(&chunk[..n]) {
            on_frame(&decoded);
        }
        on_chunk(n);
    }

    Ok((decoder.stats(), decoder.pending()))
}

fn frame_json(decoded: &DecodedFrame) -> serde_json::Value {
    let obs = &decoded.frame.observation;
    serde_json::json!({
        "offset": decoded.offset,
        "sequence": decoded.frame.sequence,
        "address": obs.address(),
        "address_type": obs.address_type(),
        "adv_type": obs.advertisement_type(),
        "rssi": obs.signal_strength(),
        "data": bytes_to_hex(obs.payload()),
        "gap": decoded.gap,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use advlink_shared::{encode_frame, Address, Observation};
    use std::io::Write;

    fn capture(sequences: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let obs = Observation::new(Address([1, 2, 3, 4, 5, 6]), 0, 0, -70, &[0xAB; 10]);
        for &seq in sequences {
            file.write_all(&encode_frame(&obs, seq)).unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_decode_file_counts_gaps() {
        let file = capture(&[0, 1, 2, 5, 6]);
        let mut sequences = Vec::new();

        let (stats, pending) =
            decode_file(file.path(), |d| sequences.push(d.frame.sequence), |_| {}).unwrap();

        assert_eq!(sequences, vec![0, 1, 2, 5, 6]);
        assert_eq!(stats.frames, 5);
        assert_eq!(stats.gaps, 1);
        assert_eq!(stats.missing_frames, 2);
        assert_eq!(pending, 0);
    }

    #[test]
    fn test_decode_file_trailing_partial_frame() {
        let mut file = capture(&[7, 8]);
        file.write_all(&[0x55, 0x55, 0x55, 0x55, 0x01]).unwrap();
        file.flush().unwrap();

        let (stats, pending) = decode_file(file.path(), |_| {}, |_| {}).unwrap();
        assert_eq!(stats.frames, 2);
        assert_eq!(pending, 5);
    }

    #[test]
    fn test_frame_json_fields() {
        let file = capture(&[3]);
        let mut values = Vec::new();
        decode_file(file.path(), |d| values.push(frame_json(d)), |_| {}).unwrap();

        assert_eq!(values[0]["sequence"], 3);
        assert_eq!(values[0]["address"], "01:02:03:04:05:06");
        assert_eq!(values[0]["rssi"], -70);
        assert_eq!(values[0]["data"], "ab".repeat(10));
    }

    #[test]
    fn test_missing_file() {
        assert!(decode_file(Path::new("/nonexistent.bin"), |_| {}, |_| {}).is_err());
    }
}
