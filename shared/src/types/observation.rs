//! Observation record for one captured advertisement
//!
//! An [`Observation`] always occupies the same number of bytes on the wire,
//! whatever the advertised payload length. Payload bytes past
//! `payload_length` are zero for every record.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Payload capacity of a single observation
pub const PAYLOAD_CAPACITY: usize = 31;

/// Length of a hardware address
pub const ADDRESS_LEN: usize = 6;

/// Encoded size of an observation: address, address type, advertisement
/// type, signal strength, payload length and the fixed payload buffer.
pub const OBSERVATION_SIZE: usize = ADDRESS_LEN + 1 + 1 + 1 + 1 + PAYLOAD_CAPACITY;

/// 6-byte hardware address, kept in the order the scan subsystem reports it.
///
/// Formats as colon-separated uppercase hex in that same byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(pub [u8; ADDRESS_LEN]);

impl Address {
    pub fn bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            b[0], b[1], b[2], b[3], b[4], b[5]
        )
    }
}

impl FromStr for Address {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; ADDRESS_LEN];
        let mut parts = s.trim().split(':');

        for (i, slot) in bytes.iter_mut().enumerate() {
            let part = parts
                .next()
                .ok_or_else(|| anyhow::anyhow!("Address {:?} has only {} octets", s, i))?;
            if part.len() != 2 {
                anyhow::bail!("Invalid octet {:?} in address {:?}", part, s);
            }
            *slot = u8::from_str_radix(part, 16)
                .map_err(|e| anyhow::anyhow!("Invalid octet {:?} in address {:?}: {}", part, s, e))?;
        }

        if parts.next().is_some() {
            anyhow::bail!("Address {:?} has more than {} octets", s, ADDRESS_LEN);
        }

        Ok(Address(bytes))
    }
}

impl TryFrom<String> for Address {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(addr: Address) -> Self {
        addr.to_string()
    }
}

/// One captured advertisement in its fixed-size form.
///
/// Fields are private so that `payload_length <= PAYLOAD_CAPACITY` and the
/// zero padding after it always hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Observation {
    address: Address,
    address_type: u8,
    advertisement_type: u8,
    signal_strength: i8,
    payload_length: u8,
    payload: [u8; PAYLOAD_CAPACITY],
}

impl Observation {
    /// Build an observation from a raw payload of any length.
    ///
    /// Payloads longer than [`PAYLOAD_CAPACITY`] are truncated silently.
    pub fn new(
        address: Address,
        address_type: u8,
        advertisement_type: u8,
        signal_strength: i8,
        payload: &[u8],
    ) -> Self {
        let payload_length = payload.len().min(PAYLOAD_CAPACITY);
        let mut buffer = [0u8; PAYLOAD_CAPACITY];
        buffer[..payload_length].copy_from_slice(&payload[..payload_length]);

        Self {
            address,
            address_type,
            advertisement_type,
            signal_strength,
            payload_length: payload_length as u8,
            payload: buffer,
        }
    }

    /// Build an observation from a one-shot byte view.
    ///
    /// Keeps the first [`PAYLOAD_CAPACITY`] bytes and drains the rest.
    /// Returns the observation together with the number of bytes the view
    /// actually held.
    pub fn from_payload_iter<I>(
        address: Address,
        address_type: u8,
        advertisement_type: u8,
        signal_strength: i8,
        payload: I,
    ) -> (Self, usize)
    where
        I: IntoIterator<Item = u8>,
    {
        let mut iter = payload.into_iter();
        let mut buffer = [0u8; PAYLOAD_CAPACITY];
        let mut kept = 0;

        for (slot, byte) in buffer.iter_mut().zip(iter.by_ref()) {
            *slot = byte;
            kept += 1;
        }
        let observed = kept + iter.count();

        let observation = Self {
            address,
            address_type,
            advertisement_type,
            signal_strength,
            payload_length: kept as u8,
            payload: buffer,
        };
        (observation, observed)
    }

    /// Rebuild an observation from decoded wire fields.
    ///
    /// Returns `None` if `payload_length` exceeds the capacity or any byte
    /// after it is non-zero.
    pub(crate) fn from_wire_parts(
        address: Address,
        address_type: u8,
        advertisement_type: u8,
        signal_strength: i8,
        payload_length: u8,
        payload: [u8; PAYLOAD_CAPACITY],
    ) -> Option<Self> {
        let len = payload_length as usize;
        if len > PAYLOAD_CAPACITY || payload[len..].iter().any(|&b| b != 0) {
            return None;
        }

        Some(Self {
            address,
            address_type,
            advertisement_type,
            signal_strength,
            payload_length,
            payload,
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn address_type(&self) -> u8 {
        self.address_type
    }

    pub fn advertisement_type(&self) -> u8 {
        self.advertisement_type
    }

    pub fn signal_strength(&self) -> i8 {
        self.signal_strength
    }

    pub fn payload_length(&self) -> u8 {
        self.payload_length
    }

    /// Meaningful payload bytes only
    pub fn payload(&self) -> &[u8] {
        &self.payload[..self.payload_length as usize]
    }

    /// Whole fixed buffer, padding included
    pub fn payload_buffer(&self) -> &[u8; PAYLOAD_CAPACITY] {
        &self.payload
    }
}
