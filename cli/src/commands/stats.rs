//! Stats command implementation

use crate::output;
use advlink_shared::{FrameComposition, LinkTiming};
use anyhow::Result;
use clap::Args;

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Baud rate of the link
    #[arg(long, default_value_t = advlink_shared::protocol::composition::DEFAULT_BAUD_RATE)]
    pub baud: u32,

    /// Bits on the wire per byte
    #[arg(long, default_value_t = advlink_shared::protocol::composition::DEFAULT_BITS_PER_BYTE)]
    pub bits_per_byte: u32,

    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: StatsArgs) -> Result<()> {
    if args.baud == 0 || args.bits_per_byte == 0 {
        anyhow::bail!("Baud rate and bits per byte must be greater than 0");
    }

    let timing = LinkTiming::new(args.baud, args.bits_per_byte);
    let composition = FrameComposition::new(&timing);

    if args.json {
        let value = serde_json::json!({
            "timing": timing,
            "composition": composition,
            "frames_per_second": frames_per_second(&composition),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    output::info(&format!(
        "Frame at {} baud, {} bits/byte",
        timing.baud_rate, timing.bits_per_byte
    ));
    output::field("Header size", format!("{} bytes", composition.header_size));
    output::field("Metadata size", format!("{} bytes", composition.metadata_size));
    output::field("Observation size", format!("{} bytes", composition.observation_size));
    output::field("Total frame size", format!("{} bytes", composition.total_size));
    output::field("Transmission time", composition.transmit_display());
    output::field(
        "Max frame rate",
        format!("{:.1} frames/s", frames_per_second(&composition)),
    );

    Ok(())
}

fn frames_per_second(composition: &FrameComposition) -> f64 {
    if composition.transmit_us == 0 {
        return 0.0;
    }
    1_000_000.0 / composition.transmit_us as f64
}
