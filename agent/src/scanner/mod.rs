//! Scan subsystem stand-ins
//!
//! A [`ScanSource`] plays the part of the radio's scanner: it delivers one
//! [`AdvertisementReport`] per detected advertisement, serially, to a
//! callback. The report borrows the payload, so the callback has to consume
//! it before returning.

pub mod replay;
pub mod synthetic;

pub use replay::{RecordedAdvertisement, ReplayScanner};
pub use synthetic::SyntheticScanner;

use crate::config::{ScanParams, SourceConfig};
use advlink_shared::Address;
use anyhow::Result;
use std::collections::HashSet;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

/// One advertisement as delivered by the scanner
#[derive(Debug, Clone, Copy)]
pub struct AdvertisementReport<'a> {
    pub address: Address,
    pub address_type: u8,
    pub rssi: i8,
    pub adv_type: u8,
    /// Raw advertising data, valid only for the duration of the callback
    pub data: &'a [u8],
}

/// Callback invoked once per report
pub type ReportHandler<'h> = dyn FnMut(&AdvertisementReport<'_>) -> Result<()> + 'h;

/// Source of advertisement reports
pub trait ScanSource {
    fn name(&self) -> &str;

    /// Deliver reports until the source is exhausted, `stop` is set, or the
    /// handler fails. Returns the number of reports delivered.
    fn scan(
        &mut self,
        params: &ScanParams,
        stop: &AtomicBool,
        on_report: &mut ReportHandler<'_>,
    ) -> Result<u64>;
}

/// Boxed source handed to the scan thread
pub type BoxedSource = Box<dyn ScanSource + Send>;

/// Build the source described by the configuration
pub fn open(config: &SourceConfig) -> BoxedSource {
    match config {
        SourceConfig::Replay { path, pace_ms } => Box::new(ReplayScanner::new(
            path.clone(),
            pace_ms.map(Duration::from_millis),
        )),
        SourceConfig::Synthetic { count, interval_ms } => Box::new(SyntheticScanner::new(
            *count,
            interval_ms.map(Duration::from_millis),
        )),
    }
}

/// Applies the scan parameters' filtering to a report stream
#[derive(Debug, Default)]
pub struct ReportFilter {
    filter_duplicates: bool,
    seen: HashSet<(Address, u8)>,
}

impl ReportFilter {
    pub fn new(params: &ScanParams) -> Self {
        Self {
            filter_duplicates: params.filter_duplicates,
            seen: HashSet::new(),
        }
    }

    /// Whether `report` should be delivered
    pub fn admit(&mut self, params: &ScanParams, report: &AdvertisementReport<'_>) -> bool {
        if !params.accepts(report.adv_type) {
            return false;
        }
        if self.filter_duplicates {
            return self.seen.insert((report.address, report.address_type));
        }
        true
    }
}
