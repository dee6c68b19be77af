//! Shared types and wire framing for advlink
//!
//! This crate holds the observation record, the fixed-layout serial frame
//! and the receiver-side decoder used by the agent, the CLI and tests.

pub mod protocol;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use protocol::composition::{FrameComposition, LinkTiming};
pub use protocol::sequence::SequenceCounter;
pub use protocol::wire::{encode_frame, Frame, MessageType, WireError, FRAME_SIZE};
pub use types::observation::{Address, Observation, PAYLOAD_CAPACITY};
