//! Run command implementation

use crate::output;
use advlink_agent::RunArgs;
use anyhow::Result;
use clap::Args;

#[derive(Args, Debug)]
pub struct RunCommandArgs {
    #[command(flatten)]
    pub agent: RunArgs,

    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

pub async fn run(args: RunCommandArgs) -> Result<()> {
    let config = args.agent.load_config()?;
    let summary = advlink_agent::run(config).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let stats = &summary.capture;
    if summary.interrupted {
        output::warning(&format!(
            "Interrupted after {} frames",
            stats.frames_sent
        ));
    } else {
        output::success(&format!(
            "Sent {} frames from {} to {}",
            stats.frames_sent, summary.source, summary.transport
        ));
    }

    output::field("Reports", summary.reports);
    output::field("Bytes written", stats.bytes_written);
    output::field("Truncated payloads", stats.payloads_truncated);
    if let Some(seq) = stats.last_sequence {
        output::field("Last sequence", seq);
    }
    if let Some(mean) = stats.latency.mean() {
        output::field("Mean frame write", format!("{:?}", mean));
    }
    output::field("Nominal frame time", summary.composition.transmit_display());

    Ok(())
}
