//! Command-line overrides shared by `advlink-agent` and `advlink run`

use crate::config::{AgentConfig, ScanType, SourceConfig, TransportKind};
use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// TOML configuration file
    #[arg(short, long, env = "ADVLINK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Serial device node to write frames to
    #[arg(long, conflicts_with_all = ["file", "memory"])]
    pub device: Option<PathBuf>,

    /// Write frames to a regular capture file instead of a device
    #[arg(long, conflicts_with = "memory")]
    pub file: Option<PathBuf>,

    /// Keep frames in memory (dry run)
    #[arg(long)]
    pub memory: bool,

    /// Replay advertisements from a JSON-lines recording
    #[arg(long, conflicts_with = "synthetic")]
    pub replay: Option<PathBuf>,

    /// Generate N synthetic advertisements
    #[arg(long, value_name = "N")]
    pub synthetic: Option<u64>,

    /// Delay between reports (e.g. "10ms", "1s")
    #[arg(long)]
    pub report_interval: Option<String>,

    /// Baud rate used for the transmission estimate and pacing
    #[arg(long)]
    pub baud: Option<u32>,

    /// Bits on the wire per byte (start + data + parity + stop)
    #[arg(long)]
    pub bits_per_byte: Option<u32>,

    /// Hold each byte for its nominal line time
    #[arg(long)]
    pub pace: bool,

    /// Batch bytes and flush once per frame
    #[arg(long)]
    pub buffered: bool,

    /// Active scan (also deliver scan responses)
    #[arg(long)]
    pub active: bool,

    /// Deliver repeated advertisements from the same peer
    #[arg(long)]
    pub keep_duplicates: bool,

    /// Write Prometheus metrics here on shutdown
    #[arg(long)]
    pub metrics_out: Option<PathBuf>,
}

impl RunArgs {
    /// Load the layered configuration and apply these flags on top.
    pub fn load_config(&self) -> Result<AgentConfig> {
        let mut config = AgentConfig::load(self.config.as_deref())?;
        self.apply(&mut config)?;
        Ok(config)
    }

    pub fn apply(&self, config: &mut AgentConfig) -> Result<()> {
        if let Some(path) = &self.device {
            config.transport.kind = TransportKind::Device;
            config.transport.path = Some(path.clone());
        }
        if let Some(path) = &self.file {
            config.transport.kind = TransportKind::File;
            config.transport.path = Some(path.clone());
        }
        if self.memory {
            config.transport.kind = TransportKind::Memory;
        }
        if self.pace {
            config.transport.pace = true;
        }
        if self.buffered {
            config.transport.buffered = true;
        }

        if let Some(baud) = self.baud {
            config.timing.baud_rate = baud;
        }
        if let Some(bits) = self.bits_per_byte {
            config.timing.bits_per_byte = bits;
        }

        if self.active {
            config.scan.scan_type = ScanType::Active;
        }
        if self.keep_duplicates {
            config.scan.filter_duplicates = false;
        }

        let interval_ms = self
            .report_interval
            .as_deref()
            .map(advlink_shared::utils::parse_duration)
            .transpose()
            .context("Failed to parse report interval")?
            .map(|d| d.as_millis() as u64);

        if let Some(path) = &self.replay {
            config.source = SourceConfig::Replay {
                path: path.clone(),
                pace_ms: interval_ms,
            };
        } else if let Some(count) = self.synthetic {
            config.source = SourceConfig::Synthetic {
                count,
                interval_ms,
            };
        } else if let Some(ms) = interval_ms {
            match &mut config.source {
                SourceConfig::Replay { pace_ms, .. } => *pace_ms = Some(ms),
                SourceConfig::Synthetic { interval_ms, .. } => *interval_ms = Some(ms),
            }
        }

        if let Some(path) = &self.metrics_out {
            config.metrics_out = Some(path.clone());
        }

        Ok(())
    }
}
