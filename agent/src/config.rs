//! Configuration types for the capture agent
//!
//! Layers, lowest first: built-in defaults, an optional TOML file, then
//! `ADVLINK_*` environment variables (`ADVLINK_TRANSPORT__PATH=/dev/ttyACM0`).
//! Command-line flags are applied on top by the binaries.

use advlink_shared::LinkTiming;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable prefix
pub const ENV_PREFIX: &str = "ADVLINK";

/// Shortest scan interval/window, in 0.625 ms units
pub const SCAN_UNITS_MIN: u16 = 0x0004;

/// Longest scan interval/window, in 0.625 ms units
pub const SCAN_UNITS_MAX: u16 = 0x4000;

/// Fast scan interval (60 ms)
pub const SCAN_FAST_INTERVAL: u16 = 0x0060;

/// Fast scan window (30 ms)
pub const SCAN_FAST_WINDOW: u16 = 0x0030;

/// Device node used when a device transport names no path
pub const DEFAULT_DEVICE_PATH: &str = "/dev/ttyUSB0";

/// Advertisement type of a scan response
pub const ADV_TYPE_SCAN_RSP: u8 = 0x04;

/// Kind of link the frames are written to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Serial device node
    Device,
    /// Regular capture file
    File,
    /// Discard into memory (dry run)
    Memory,
}

impl std::str::FromStr for TransportKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "device" => Ok(TransportKind::Device),
            "file" => Ok(TransportKind::File),
            "memory" => Ok(TransportKind::Memory),
            _ => anyhow::bail!("Invalid transport kind: {}", s),
        }
    }
}

/// Transport section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportConfig {
    pub kind: TransportKind,

    /// Device node or capture file. A device falls back to
    /// [`DEFAULT_DEVICE_PATH`]; a file has no default.
    pub path: Option<PathBuf>,

    /// Batch bytes and flush once per frame
    pub buffered: bool,

    /// Hold every byte for its nominal line time
    pub pace: bool,

    /// Fixed inter-byte delay overriding the line time when pacing
    pub inter_byte_delay_us: Option<u64>,
}

impl TransportConfig {
    /// Path the sink opens, if the kind writes to one.
    pub fn resolved_path(&self) -> Option<PathBuf> {
        match (self.kind, &self.path) {
            (TransportKind::Memory, _) => None,
            (_, Some(path)) if !path.as_os_str().is_empty() => Some(path.clone()),
            (TransportKind::Device, _) => Some(PathBuf::from(DEFAULT_DEVICE_PATH)),
            (TransportKind::File, _) => None,
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            kind: TransportKind::Device,
            path: None,
            buffered: false,
            pace: false,
            inter_byte_delay_us: None,
        }
    }
}

/// Passive scanning only listens; active scanning also requests scan
/// responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanType {
    Passive,
    Active,
}

/// Parameters handed to the scan subsystem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanParams {
    pub scan_type: ScanType,

    /// Report each peer address once per scan session
    pub filter_duplicates: bool,

    /// Scan interval, 0.625 ms units
    pub interval: u16,

    /// Scan window, 0.625 ms units
    pub window: u16,
}

impl Default for ScanParams {
    fn default() -> Self {
        Self {
            scan_type: ScanType::Passive,
            filter_duplicates: true,
            interval: SCAN_FAST_INTERVAL,
            window: SCAN_FAST_WINDOW,
        }
    }
}

impl ScanParams {
    /// Whether a report of this advertisement type reaches the adapter.
    ///
    /// Scan responses only exist for active scans.
    pub fn accepts(&self, adv_type: u8) -> bool {
        self.scan_type == ScanType::Active || adv_type != ADV_TYPE_SCAN_RSP
    }

    pub fn interval_ms(&self) -> f64 {
        self.interval as f64 * 0.625
    }

    pub fn window_ms(&self) -> f64 {
        self.window as f64 * 0.625
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, value) in [("interval", self.interval), ("window", self.window)] {
            if !(SCAN_UNITS_MIN..=SCAN_UNITS_MAX).contains(&value) {
                anyhow::bail!(
                    "Scan {} 0x{:04x} out of range 0x{:04x}..=0x{:04x}",
                    name,
                    value,
                    SCAN_UNITS_MIN,
                    SCAN_UNITS_MAX
                );
            }
        }

        if self.window > self.interval {
            anyhow::bail!(
                "Scan window 0x{:04x} larger than interval 0x{:04x}",
                self.window,
                self.interval
            );
        }

        Ok(())
    }
}

/// Where advertisement reports come from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SourceConfig {
    /// JSON-lines recording of advertisements
    Replay {
        path: PathBuf,
        #[serde(default)]
        pace_ms: Option<u64>,
    },
    /// Deterministic generated reports
    Synthetic {
        count: u64,
        #[serde(default)]
        interval_ms: Option<u64>,
    },
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig::Synthetic {
            count: 256,
            interval_ms: None,
        }
    }
}

/// Agent configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub transport: TransportConfig,

    /// Line parameters for the transmission estimate and pacing
    pub timing: LinkTiming,

    pub scan: ScanParams,

    pub source: SourceConfig,

    /// Write Prometheus text metrics here on shutdown
    pub metrics_out: Option<PathBuf>,
}

impl AgentConfig {
    /// Load defaults, then `path` (if any), then environment overrides.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let defaults = config::Config::try_from(&AgentConfig::default())
            .context("Failed to build default configuration")?;

        let mut builder = config::Config::builder().add_source(defaults);
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder
            .build()
            .context("Failed to load configuration")?
            .try_deserialize()
            .context("Invalid configuration values")
    }

    /// Render as TOML
    pub fn to_toml(&self) -> anyhow::Result<String> {
        toml::to_string_pretty(self).context("Failed to render configuration")
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.timing.baud_rate == 0 {
            anyhow::bail!("Baud rate must be greater than 0");
        }

        if self.timing.bits_per_byte == 0 {
            anyhow::bail!("Bits per byte must be greater than 0");
        }

        if self.transport.kind == TransportKind::File && self.transport.resolved_path().is_none() {
            anyhow::bail!("File transport requires a path");
        }

        self.scan.validate()?;

        Ok(())
    }
}
