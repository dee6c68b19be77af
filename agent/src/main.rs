//! Advertisement capture agent
//!
//! Scans for advertisements and writes each one as a fixed 47-byte frame to
//! a serial device, a capture file or memory.

use clap::Parser;
use color_eyre::eyre::WrapErr;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use advlink_agent::RunArgs;

#[derive(Parser, Debug)]
#[command(name = "advlink-agent")]
#[command(about = "Frame advertisement observations onto a serial link", long_about = None)]
#[command(version)]
struct Args {
    #[command(flatten)]
    run: RunArgs,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    init_tracing(args.verbose).wrap_err("Failed to initialize logging")?;

    let config = args
        .run
        .load_config()
        .map_err(|e| color_eyre::eyre::eyre!("{:#}", e))?;

    if args.print_config {
        let rendered = config
            .to_toml()
            .map_err(|e| color_eyre::eyre::eyre!("{:#}", e))?;
        print!("{}", rendered);
        return Ok(());
    }

    info!("Starting advlink agent");
    info!("Configuration: {:?}", config);

    let summary = advlink_agent::run(config)
        .await
        .map_err(|e| color_eyre::eyre::eyre!("{:#}", e))?;

    if summary.interrupted {
        info!("Stopped by signal after {} frames", summary.capture.frames_sent);
    } else {
        info!("Capture complete: {} frames", summary.capture.frames_sent);
    }

    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init()?;

    Ok(())
}
