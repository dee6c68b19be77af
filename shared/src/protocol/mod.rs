//! Serial wire protocol
//!
//! Framing, sequence numbering, stream decoding and size/timing composition
//! of the frames sent over the link.

pub mod composition;
pub mod decoder;
pub mod sequence;
pub mod wire;
