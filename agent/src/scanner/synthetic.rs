//! Deterministic report generator for load and wraparound runs

use super::{AdvertisementReport, ReportFilter, ReportHandler, ScanSource};
use crate::config::ScanParams;
use advlink_shared::Address;
use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Longest payload generated; a bit over the frame capacity so truncation
/// is exercised.
pub const MAX_SYNTHETIC_PAYLOAD: usize = 40;

/// Generates `count` reports from distinct addresses.
///
/// Report `i` carries a payload of `i % 41` bytes and RSSI `-30 - i % 70`.
#[derive(Debug)]
pub struct SyntheticScanner {
    count: u64,
    interval: Option<Duration>,
}

impl SyntheticScanner {
    pub fn new(count: u64, interval: Option<Duration>) -> Self {
        Self { count, interval }
    }

    /// Address of report `i`
    pub fn address_for(i: u64) -> Address {
        let b = (i as u32).to_be_bytes();
        Address([0xC0, 0xFF, b[0], b[1], b[2], b[3]])
    }

    /// Payload of report `i`
    pub fn payload_for(i: u64) -> Vec<u8> {
        let len = (i % (MAX_SYNTHETIC_PAYLOAD as u64 + 1)) as usize;
        (0..len).map(|j| (i as usize + j) as u8).collect()
    }
}

impl ScanSource for SyntheticScanner {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn scan(
        &mut self,
        params: &ScanParams,
        stop: &AtomicBool,
        on_report: &mut ReportHandler<'_>,
    ) -> Result<u64> {
        let mut filter = ReportFilter::new(params);
        let mut delivered = 0u64;

        for i in 0..self.count {
            if stop.load(Ordering::Relaxed) {
                break;
            }

            let data = Self::payload_for(i);
            let report = AdvertisementReport {
                address: Self::address_for(i),
                address_type: (i % 2) as u8,
                rssi: -30 - (i % 70) as i8,
                adv_type: 0x03,
                data: &data,
            };
            if !filter.admit(params, &report) {
                continue;
            }

            on_report(&report)?;
            delivered += 1;

            if let Some(interval) = self.interval {
                std::thread::sleep(interval);
            }
        }

        Ok(delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generates_count_reports() {
        let mut scanner = SyntheticScanner::new(300, None);
        let stop = AtomicBool::new(false);
        let mut lengths = Vec::new();

        let delivered = scanner
            .scan(&ScanParams::default(), &stop, &mut |r| {
                lengths.push(r.data.len());
                Ok(())
            })
            .unwrap();

        assert_eq!(delivered, 300);
        assert_eq!(lengths[0], 0);
        assert_eq!(lengths[40], 40);
        assert_eq!(lengths[41], 0);
    }

    #[test]
    fn test_handler_error_stops_scan() {
        let mut scanner = SyntheticScanner::new(10, None);
        let stop = AtomicBool::new(false);
        let mut calls = 0;

        let result = scanner.scan(&ScanParams::default(), &stop, &mut |_| {
            calls += 1;
            if calls == 3 {
                anyhow::bail!("sink gone");
            }
            Ok(())
        });

        assert!(result.is_err());
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_addresses_are_distinct() {
        assert_ne!(SyntheticScanner::address_for(1), SyntheticScanner::address_for(257));
    }
}
