//! Replay of recorded advertisements
//!
//! Input is JSON lines, one advertisement per line:
//!
//! ```text
//! {"address":"AA:BB:CC:DD:EE:FF","address_type":0,"adv_type":3,"rssi":-60,"data":"020106"}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.

use super::{AdvertisementReport, ReportFilter, ReportHandler, ScanSource};
use crate::config::ScanParams;
use advlink_shared::utils::{bytes_to_hex, hex_to_bytes};
use advlink_shared::Address;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info};

/// One line of a recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedAdvertisement {
    pub address: Address,
    #[serde(default)]
    pub address_type: u8,
    #[serde(default)]
    pub adv_type: u8,
    pub rssi: i8,
    /// Advertising data as hex
    #[serde(default)]
    pub data: String,
}

impl RecordedAdvertisement {
    pub fn new(address: Address, address_type: u8, adv_type: u8, rssi: i8, data: &[u8]) -> Self {
        Self {
            address,
            address_type,
            adv_type,
            rssi,
            data: bytes_to_hex(data),
        }
    }

    /// Render as one JSON line
    pub fn to_line(&self) -> Result<String> {
        serde_json::to_string(self).context("Failed to serialize advertisement")
    }
}

/// Scanner that reads a JSON-lines recording
#[derive(Debug)]
pub struct ReplayScanner {
    path: PathBuf,
    name: String,
    pace: Option<Duration>,
}

impl ReplayScanner {
    pub fn new(path: PathBuf, pace: Option<Duration>) -> Self {
        let name = format!("replay:{}", path.display());
        Self { path, name, pace }
    }
}

impl ScanSource for ReplayScanner {
    fn name(&self) -> &str {
        &self.name
    }

    fn scan(
        &mut self,
        params: &ScanParams,
        stop: &AtomicBool,
        on_report: &mut ReportHandler<'_>,
    ) -> Result<u64> {
        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open recording: {}", self.path.display()))?;
        let reader = BufReader::new(file);
        let mut filter = ReportFilter::new(params);
        let mut delivered = 0u64;

        info!("Replaying advertisements from {}", self.path.display());

        for (index, line) in reader.lines().enumerate() {
            if stop.load(Ordering::Relaxed) {
                debug!("Replay stopped after {} reports", delivered);
                break;
            }

            let line_no = index + 1;
            let line = line.with_context(|| format!("Failed to read line {}", line_no))?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let record: RecordedAdvertisement = serde_json::from_str(trimmed)
                .with_context(|| format!("Invalid advertisement on line {}", line_no))?;
            let data = hex_to_bytes(&record.data)
                .with_context(|| format!("Invalid data on line {}", line_no))?;

            let report = AdvertisementReport {
                address: record.address,
                address_type: record.address_type,
                rssi: record.rssi,
                adv_type: record.adv_type,
                data: &data,
            };
            if !filter.admit(params, &report) {
                continue;
            }

            on_report(&report)?;
            delivered += 1;

            if let Some(pace) = self.pace {
                std::thread::sleep(pace);
            }
        }

        Ok(delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_recording(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file
    }

    fn collect(scanner: &mut ReplayScanner, params: &ScanParams) -> Result<Vec<(Address, Vec<u8>)>> {
        let stop = AtomicBool::new(false);
        let mut seen = Vec::new();
        scanner.scan(params, &stop, &mut |r| {
            seen.push((r.address, r.data.to_vec()));
            Ok(())
        })?;
        Ok(seen)
    }

    #[test]
    fn test_replays_lines_in_order() {
        let file = write_recording(&[
            "# recorded on bench",
            r#"{"address":"AA:BB:CC:DD:EE:FF","address_type":0,"adv_type":3,"rssi":-60,"data":"020106"}"#,
            "",
            r#"{"address":"11:22:33:44:55:66","rssi":-80}"#,
        ]);
        let mut scanner = ReplayScanner::new(file.path().to_path_buf(), None);

        let seen = collect(&mut scanner, &ScanParams::default()).unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].0.to_string(), "AA:BB:CC:DD:EE:FF");
        assert_eq!(seen[0].1, vec![0x02, 0x01, 0x06]);
        assert!(seen[1].1.is_empty());
    }

    #[test]
    fn test_duplicates_filtered_by_default() {
        let line = r#"{"address":"AA:BB:CC:DD:EE:FF","rssi":-60,"data":"00"}"#;
        let file = write_recording(&[line, line, line]);
        let mut scanner = ReplayScanner::new(file.path().to_path_buf(), None);

        assert_eq!(collect(&mut scanner, &ScanParams::default()).unwrap().len(), 1);

        let params = ScanParams {
            filter_duplicates: false,
            ..Default::default()
        };
        assert_eq!(collect(&mut scanner, &params).unwrap().len(), 3);
    }

    #[test]
    fn test_bad_line_reports_line_number() {
        let file = write_recording(&[
            r#"{"address":"AA:BB:CC:DD:EE:FF","rssi":-60}"#,
            r#"{"address":"not-an-address","rssi":-60}"#,
        ]);
        let mut scanner = ReplayScanner::new(file.path().to_path_buf(), None);

        let err = collect(&mut scanner, &ScanParams::default()).unwrap_err();
        assert!(format!("{:#}", err).contains("line 2"));
    }

    #[test]
    fn test_missing_file() {
        let mut scanner = ReplayScanner::new(PathBuf::from("/nonexistent/capture.jsonl"), None);
        assert!(collect(&mut scanner, &ScanParams::default()).is_err());
    }

    #[test]
    fn test_stop_flag_halts_replay() {
        let line = r#"{"address":"AA:BB:CC:DD:EE:FF","rssi":-60}"#;
        let file = write_recording(&[line, line]);
        let mut scanner = ReplayScanner::new(file.path().to_path_buf(), None);

        let stop = AtomicBool::new(true);
        let delivered = scanner
            .scan(&ScanParams::default(), &stop, &mut |_| Ok(()))
            .unwrap();
        assert_eq!(delivered, 0);
    }

    #[test]
    fn test_recorded_line_format() {
        let record = RecordedAdvertisement::new(
            Address([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]),
            0,
            3,
            -60,
            &[0x02, 0x01, 0x06],
        );
        let line = record.to_line().unwrap();
        assert!(line.contains("\"AA:BB:CC:DD:EE:FF\""));
        assert!(line.contains("\"020106\""));
        let back: RecordedAdvertisement = serde_json::from_str(&line).unwrap();
        assert_eq!(back, record);
    }
}
