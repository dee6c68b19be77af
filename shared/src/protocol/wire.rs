//! Fixed-layout wire frame carried over the serial link.
//!
//! Every frame is [`FRAME_SIZE`] bytes. Fields are written one at a time at
//! fixed offsets, so the layout does not depend on how the compiler lays
//! out [`Observation`] in memory.
//!
//! ```text
//! offset 0..3   sync_header      4 x 0x55
//! offset 4      message_type     0x01 = advertisement data
//! offset 5      sequence         wraps mod 256
//! offset 6..11  address          6 bytes
//! offset 12     address_type     1 byte
//! offset 13     adv_type         1 byte
//! offset 14     signal_strength  1 signed byte
//! offset 15     payload_length   0..31
//! offset 16..46 payload          31 bytes, zero-padded
//! ```
//!
//! There is no checksum and no escaping. A receiver that needs integrity
//! has to add its own layer on top.

use crate::types::observation::{
    Address, Observation, ADDRESS_LEN, OBSERVATION_SIZE, PAYLOAD_CAPACITY,
};
use thiserror::Error;

/// Sentinel byte repeated across the sync header (0b0101_0101)
pub const SYNC_BYTE: u8 = 0x55;

/// Length of the sync header
pub const SYNC_HEADER_LEN: usize = 4;

/// Sync header as it appears on the wire
pub const SYNC_HEADER: [u8; SYNC_HEADER_LEN] = [SYNC_BYTE; SYNC_HEADER_LEN];

/// Message type + sequence
pub const METADATA_SIZE: usize = 2;

/// Total frame size
pub const FRAME_SIZE: usize = SYNC_HEADER_LEN + METADATA_SIZE + OBSERVATION_SIZE;

const OFFSET_TYPE: usize = 4;
const OFFSET_SEQUENCE: usize = 5;
const OFFSET_ADDRESS: usize = 6;
const OFFSET_ADDRESS_TYPE: usize = OFFSET_ADDRESS + ADDRESS_LEN;
const OFFSET_ADV_TYPE: usize = OFFSET_ADDRESS_TYPE + 1;
const OFFSET_RSSI: usize = OFFSET_ADV_TYPE + 1;
const OFFSET_PAYLOAD_LEN: usize = OFFSET_RSSI + 1;
const OFFSET_PAYLOAD: usize = OFFSET_PAYLOAD_LEN + 1;

/// Message type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    /// Advertisement observation
    AdvertisementData = 0x01,
}

impl MessageType {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for MessageType {
    type Error = WireError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(MessageType::AdvertisementData),
            other => Err(WireError::UnknownMessageType(other)),
        }
    }
}

/// Errors raised while decoding a frame
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    #[error("frame must be {expected} bytes, got {0}", expected = FRAME_SIZE)]
    InvalidLength(usize),

    #[error("bad sync header {0:02x?}")]
    BadSyncHeader([u8; SYNC_HEADER_LEN]),

    #[error("unknown message type 0x{0:02x}")]
    UnknownMessageType(u8),

    #[error("payload length {0} exceeds capacity {capacity}", capacity = PAYLOAD_CAPACITY)]
    PayloadTooLong(u8),

    #[error("non-zero padding after payload of {0} bytes")]
    DirtyPadding(u8),
}

/// A decoded or to-be-encoded frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub message_type: MessageType,
    pub sequence: u8,
    pub observation: Observation,
}

impl Frame {
    /// Create an advertisement-data frame
    pub fn new(sequence: u8, observation: Observation) -> Self {
        Self {
            message_type: MessageType::AdvertisementData,
            sequence,
            observation,
        }
    }

    /// Serialize into a fresh, zero-filled buffer.
    pub fn encode(&self) -> [u8; FRAME_SIZE] {
        let mut buf = [0u8; FRAME_SIZE];
        let obs = &self.observation;

        buf[..SYNC_HEADER_LEN].copy_from_slice(&SYNC_HEADER);
        buf[OFFSET_TYPE] = self.message_type.as_u8();
        buf[OFFSET_SEQUENCE] = self.sequence;
        buf[OFFSET_ADDRESS..OFFSET_ADDRESS_TYPE].copy_from_slice(obs.address().bytes());
        buf[OFFSET_ADDRESS_TYPE] = obs.address_type();
        buf[OFFSET_ADV_TYPE] = obs.advertisement_type();
        buf[OFFSET_RSSI] = obs.signal_strength() as u8;
        buf[OFFSET_PAYLOAD_LEN] = obs.payload_length();
        buf[OFFSET_PAYLOAD..].copy_from_slice(obs.payload_buffer());

        buf
    }

    /// Parse exactly one frame.
    pub fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        if bytes.len() != FRAME_SIZE {
            return Err(WireError::InvalidLength(bytes.len()));
        }

        let mut header = [0u8; SYNC_HEADER_LEN];
        header.copy_from_slice(&bytes[..SYNC_HEADER_LEN]);
        if header != SYNC_HEADER {
            return Err(WireError::BadSyncHeader(header));
        }

        let message_type = MessageType::try_from(bytes[OFFSET_TYPE])?;
        let sequence = bytes[OFFSET_SEQUENCE];

        let mut address = [0u8; ADDRESS_LEN];
        address.copy_from_slice(&bytes[OFFSET_ADDRESS..OFFSET_ADDRESS_TYPE]);

        let payload_length = bytes[OFFSET_PAYLOAD_LEN];
        if payload_length as usize > PAYLOAD_CAPACITY {
            return Err(WireError::PayloadTooLong(payload_length));
        }
        let mut payload = [0u8; PAYLOAD_CAPACITY];
        payload.copy_from_slice(&bytes[OFFSET_PAYLOAD..]);

        let observation = Observation::from_wire_parts(
            Address(address),
            bytes[OFFSET_ADDRESS_TYPE],
            bytes[OFFSET_ADV_TYPE],
            bytes[OFFSET_RSSI] as i8,
            payload_length,
            payload,
        )
        .ok_or(WireError::DirtyPadding(payload_length))?;

        Ok(Self {
            message_type,
            sequence,
            observation,
        })
    }
}

/// Encode one observation with the given sequence number.
///
/// Pure: the caller owns and advances the sequence counter.
pub fn encode_frame(observation: &Observation, sequence: u8) -> [u8; FRAME_SIZE] {
    Frame::new(sequence, *observation).encode()
}
