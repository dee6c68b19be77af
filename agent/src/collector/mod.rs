//! Observation capture
//!
//! Turns scanner reports into framed observations on a transport sink.

pub mod capture;

pub use capture::{CaptureAdapter, CaptureStats};
