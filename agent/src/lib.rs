//! Advertisement capture agent library
//!
//! Wires a scan source to a transport sink through the capture adapter:
//! every admitted advertisement becomes one fixed-size frame on the link.

pub mod args;
pub mod collector;
pub mod config;
pub mod error;
pub mod instrumentation;
pub mod metrics;
pub mod scanner;
pub mod transport;

pub use args::RunArgs;
pub use collector::{CaptureAdapter, CaptureStats};
pub use config::{AgentConfig, ScanParams, ScanType, SourceConfig, TransportConfig, TransportKind};
pub use error::{AgentError, TransportError};

use anyhow::{Context, Result};
use advlink_shared::FrameComposition;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};
use transport::TransportSink;

/// Outcome of one capture run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub source: String,
    pub transport: String,
    pub composition: FrameComposition,
    pub reports: u64,
    pub capture: CaptureStats,
    pub interrupted: bool,
}

/// Run the agent with the sink described by the configuration.
pub async fn run(config: AgentConfig) -> Result<RunSummary> {
    config.validate().context("Invalid configuration")?;
    let sink = transport::open(&config.transport, &config.timing);
    let (summary, _) = run_capture(config, sink).await?;
    Ok(summary)
}

/// Run the agent against an already opened sink, handing the sink back.
pub async fn run_with_sink<S>(config: AgentConfig, sink: S) -> Result<(RunSummary, S)>
where
    S: TransportSink + Send + 'static,
{
    config.validate().context("Invalid configuration")?;
    run_capture(config, sink).await
}

async fn run_capture<S>(config: AgentConfig, sink: S) -> Result<(RunSummary, S)>
where
    S: TransportSink + Send + 'static,
{
    // 1. Readiness is checked once; failure here ends the run
    let transport_name = sink.name().to_string();
    let adapter = CaptureAdapter::new(sink)?;
    let capture = Arc::new(Mutex::new(adapter));

    // 2. Static frame composition
    let composition = instrumentation::report_composition(&config.timing);

    // 3. Scan on a blocking thread, serialized through the adapter lock
    let mut source = scanner::open(&config.source);
    let source_name = source.name().to_string();
    let params = config.scan.clone();
    let stop = Arc::new(AtomicBool::new(false));

    info!(
        "Scanning from {} ({:?}, interval {} ms, window {} ms, filter duplicates: {})",
        source_name,
        params.scan_type,
        params.interval_ms(),
        params.window_ms(),
        params.filter_duplicates
    );

    let mut scan = {
        let capture = capture.clone();
        let stop = stop.clone();
        tokio::task::spawn_blocking(move || {
            source.scan(&params, &stop, &mut |report| {
                let mut adapter = capture.lock().map_err(|_| AgentError::Poisoned)?;
                adapter.on_advertisement(report)?;
                Ok(())
            })
        })
    };

    // 4. Wait for the source to finish or for Ctrl-C
    let (reports, interrupted) = tokio::select! {
        res = &mut scan => {
            let reports = res.context("Scan task panicked")?.context("Scan failed")?;
            (reports, false)
        }
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, stopping scan");
            stop.store(true, Ordering::Relaxed);
            let reports = scan.await.context("Scan task panicked")?.context("Scan failed")?;
            (reports, true)
        }
    };

    // 5. Summary
    let adapter = Arc::try_unwrap(capture)
        .map_err(|_| anyhow::anyhow!("Capture adapter still shared"))?
        .into_inner()
        .map_err(|_| AgentError::Poisoned)?;
    let stats = adapter.stats();

    info!(
        "Captured {} reports, sent {} frames ({} bytes, {} truncated payloads)",
        reports, stats.frames_sent, stats.bytes_written, stats.payloads_truncated
    );
    stats.latency.log(&composition);

    if let Some(path) = &config.metrics_out {
        let text = metrics::encode_metrics()?;
        std::fs::write(path, text)
            .with_context(|| format!("Failed to write metrics: {}", path.display()))?;
        info!("Metrics written to {}", path.display());
    }

    let summary = RunSummary {
        source: source_name,
        transport: transport_name,
        composition,
        reports,
        capture: stats,
        interrupted,
    };
    Ok((summary, adapter.into_sink()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MemorySink;
    use std::io::Write;

    /// Collects formatted log output
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    fn memory_config() -> AgentConfig {
        let mut config = AgentConfig::default();
        config.transport.kind = TransportKind::Memory;
        config.source = SourceConfig::Synthetic {
            count: 2,
            interval_ms: None,
        };
        config
    }

    fn capture_logs(buffer: &LogBuffer) -> tracing::subscriber::DefaultGuard {
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    #[tokio::test]
    async fn test_not_ready_sink_fails_before_composition_report() {
        let logs = LogBuffer::default();
        let _guard = capture_logs(&logs);

        let err = run_with_sink(memory_config(), MemorySink::not_ready())
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AgentError>(),
            Some(AgentError::TransportNotReady(_))
        ));

        let output = logs.contents();
        assert!(output.contains("is not ready"));
        assert!(!output.contains("Total frame size"));
    }

    #[tokio::test]
    async fn test_ready_sink_reports_composition_after_attach() {
        let logs = LogBuffer::default();
        let _guard = capture_logs(&logs);

        let (summary, sink) = run_with_sink(memory_config(), MemorySink::new())
            .await
            .unwrap();
        assert_eq!(summary.capture.frames_sent, 2);
        assert_eq!(sink.bytes().len(), 2 * advlink_shared::FRAME_SIZE);

        let output = logs.contents();
        let attached = output.find("Capture adapter attached").unwrap();
        let composition = output.find("Total frame size: 47 bytes").unwrap();
        assert!(attached < composition);
    }

    #[tokio::test]
    async fn test_invalid_config_rejected_before_opening() {
        let mut config = memory_config();
        config.transport.kind = TransportKind::File;
        let err = run(config).await.unwrap_err();
        assert!(format!("{:#}", err).contains("File transport requires a path"));
    }
}
