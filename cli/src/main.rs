//! CLI for advlink
//!
//! Commands:
//! - run: capture advertisements onto a link (wraps the agent)
//! - stats: frame composition and nominal line time
//! - decode: read a capture and report frames and sequence gaps

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod output;

#[derive(Parser)]
#[command(name = "advlink")]
#[command(about = "advlink - advertisement capture over a serial link", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture advertisements and write frames to the transport
    Run(commands::run::RunCommandArgs),

    /// Show frame composition and estimated transmission time
    Stats(commands::stats::StatsArgs),

    /// Decode a capture file and report sequence gaps
    Decode(commands::decode::DecodeArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => {
            init_tracing(args.verbose);
            commands::run::run(args).await
        }
        Commands::Stats(args) => commands::stats::run(args),
        Commands::Decode(args) => commands::decode::run(args),
    };

    if let Err(e) = &result {
        output::error(&format!("{:#}", e));
    }
    result
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}
