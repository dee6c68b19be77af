use advlink_agent::config::{AgentConfig, ScanType, SourceConfig, TransportKind};
use advlink_agent::scanner::{RecordedAdvertisement, SyntheticScanner};
use advlink_agent::transport::MemorySink;
use advlink_agent::AgentError;
use advlink_shared::protocol::decoder::FrameDecoder;
use advlink_shared::{Address, FRAME_SIZE, PAYLOAD_CAPACITY};
use anyhow::Result;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

fn memory_config(source: SourceConfig) -> AgentConfig {
    let mut config = AgentConfig::default();
    config.transport.kind = TransportKind::Memory;
    config.source = source;
    config
}

fn recording(records: &[RecordedAdvertisement]) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    for record in records {
        writeln!(file, "{}", record.to_line()?)?;
    }
    Ok(file)
}

#[tokio::test]
async fn test_synthetic_run_to_capture_file() -> Result<()> {
    let out = NamedTempFile::new()?;
    let mut config = AgentConfig::default();
    config.transport.kind = TransportKind::File;
    config.transport.path = Some(out.path().to_path_buf());
    config.transport.buffered = true;
    config.source = SourceConfig::Synthetic {
        count: 300,
        interval_ms: None,
    };

    let summary = advlink_agent::run(config).await?;
    assert_eq!(summary.reports, 300);
    assert_eq!(summary.capture.frames_sent, 300);
    assert!(!summary.interrupted);

    let bytes = std::fs::read(out.path())?;
    assert_eq!(bytes.len(), 300 * FRAME_SIZE);

    let mut decoder = FrameDecoder::new();
    let frames = decoder.push(&bytes);
    assert_eq!(frames.len(), 300);

    for (k, decoded) in frames.iter().enumerate() {
        let obs = &decoded.frame.observation;
        let expected = SyntheticScanner::payload_for(k as u64);
        let kept = expected.len().min(PAYLOAD_CAPACITY);

        assert_eq!(decoded.frame.sequence, (k % 256) as u8);
        assert_eq!(decoded.gap, None);
        assert_eq!(obs.address(), SyntheticScanner::address_for(k as u64));
        assert_eq!(obs.payload(), &expected[..kept]);
    }

    // Sequence 255 -> 0 on the 257th frame
    assert_eq!(frames[255].frame.sequence, 255);
    assert_eq!(frames[256].frame.sequence, 0);

    let stats = decoder.stats();
    assert_eq!(stats.gaps, 0);
    assert_eq!(stats.discarded_bytes, 0);

    Ok(())
}

#[tokio::test]
async fn test_replay_reference_advertisement() -> Result<()> {
    let address: Address = "AA:BB:CC:DD:EE:FF".parse()?;
    let file = recording(&[RecordedAdvertisement::new(
        address,
        0,
        3,
        -60,
        &[0x02, 0x01, 0x06],
    )])?;

    let config = memory_config(SourceConfig::Replay {
        path: file.path().to_path_buf(),
        pace_ms: None,
    });
    let (summary, sink) = advlink_agent::run_with_sink(config, MemorySink::new()).await?;
    assert_eq!(summary.capture.frames_sent, 1);
    assert_eq!(summary.composition.total_size, 47);
    assert_eq!(summary.composition.transmit_us, 4079);

    let bytes = sink.into_bytes();
    assert_eq!(bytes.len(), FRAME_SIZE);
    assert_eq!(bytes[0..4], [0x55; 4]);
    assert_eq!(bytes[4], 0x01);
    assert_eq!(bytes[5], 0x00);
    assert_eq!(bytes[6..12], [0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
    assert_eq!(bytes[12], 0);
    assert_eq!(bytes[13], 3);
    assert_eq!(bytes[14], 0xC4);
    assert_eq!(bytes[15], 3);
    assert_eq!(bytes[16..19], [0x02, 0x01, 0x06]);
    assert!(bytes[19..].iter().all(|&b| b == 0));

    Ok(())
}

#[tokio::test]
async fn test_passive_scan_skips_scan_responses() -> Result<()> {
    let a: Address = "11:22:33:44:55:66".parse()?;
    let b: Address = "11:22:33:44:55:77".parse()?;
    let file = recording(&[
        RecordedAdvertisement::new(a, 0, 0x00, -40, &[0x01]),
        RecordedAdvertisement::new(b, 0, 0x04, -41, &[0x02]),
    ])?;
    let source = SourceConfig::Replay {
        path: file.path().to_path_buf(),
        pace_ms: None,
    };

    let config = memory_config(source.clone());
    let (summary, _) = advlink_agent::run_with_sink(config, MemorySink::new()).await?;
    assert_eq!(summary.capture.frames_sent, 1);

    let mut config = memory_config(source);
    config.scan.scan_type = ScanType::Active;
    let (summary, _) = advlink_agent::run_with_sink(config, MemorySink::new()).await?;
    assert_eq!(summary.capture.frames_sent, 2);

    Ok(())
}

#[tokio::test]
async fn test_missing_device_is_fatal() {
    let mut config = AgentConfig::default();
    config.transport.kind = TransportKind::Device;
    config.transport.path = Some(PathBuf::from("/nonexistent/advlink/ttyUSB9"));

    let err = advlink_agent::run(config).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<AgentError>(),
        Some(AgentError::TransportNotReady(_))
    ));
}

#[tokio::test]
async fn test_not_ready_sink_sends_nothing() {
    let config = memory_config(SourceConfig::default());
    let err = advlink_agent::run_with_sink(config, MemorySink::not_ready())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("not ready"));
}

#[tokio::test]
async fn test_bad_recording_fails_run() -> Result<()> {
    let mut file = NamedTempFile::new()?;
    writeln!(file, "not json")?;

    let config = memory_config(SourceConfig::Replay {
        path: file.path().to_path_buf(),
        pace_ms: None,
    });
    assert!(advlink_agent::run_with_sink(config, MemorySink::new()).await.is_err());
    Ok(())
}

#[tokio::test]
async fn test_metrics_written_on_shutdown() -> Result<()> {
    let metrics = NamedTempFile::new()?;
    let mut config = memory_config(SourceConfig::Synthetic {
        count: 45,
        interval_ms: None,
    });
    config.metrics_out = Some(metrics.path().to_path_buf());

    let summary = advlink_agent::run(config).await?;
    // Lengths 32..=40 are truncated
    assert_eq!(summary.capture.payloads_truncated, 9);

    let text = std::fs::read_to_string(metrics.path())?;
    assert!(text.contains("advlink_frames_total"));
    assert!(text.contains("advlink_payload_truncations_total"));
    assert!(text.contains("advlink_frame_write_seconds"));

    Ok(())
}
