//! Raw CAN 2.0 frame value type and its fixed 16-byte wire image.
//!
//! The wire layout matches the Linux `struct can_frame`:
//!
//! | Offset | Size | Field |
//! |---|---|---|
//! | 0 | 4 | identifier word (native endian, flags in bits 29-31) |
//! | 4 | 1 | payload length (0-8) |
//! | 5 | 3 | reserved, zero |
//! | 8 | 8 | payload, unused bytes zero |

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── Wire constants ──────────────────────────────────────────────

/// Maximum payload length of a classic CAN frame.
pub const CAN_MAX_DLEN: usize = 8;

/// Size in bytes of one frame on the wire.
pub const CAN_FRAME_WIRE_SIZE: usize = 16;

/// Offset of the payload bytes within the wire image.
const WIRE_DATA_OFFSET: usize = 8;

/// Offset of the length byte within the wire image.
const WIRE_LEN_OFFSET: usize = 4;

/// Extended frame format flag (29-bit identifier).
pub const CAN_EFF_FLAG: u32 = 0x8000_0000;

/// Remote transmission request flag.
pub const CAN_RTR_FLAG: u32 = 0x4000_0000;

/// Error frame flag.
pub const CAN_ERR_FLAG: u32 = 0x2000_0000;

/// Standard (11-bit) identifier mask.
pub const CAN_SFF_MASK: u32 = 0x0000_07FF;

/// Extended (29-bit) identifier mask.
pub const CAN_EFF_MASK: u32 = 0x1FFF_FFFF;

// ── Errors ──────────────────────────────────────────────────────

/// Errors raised while building a frame.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("payload of {len} bytes exceeds the 8-byte CAN limit")]
    PayloadTooLong { len: usize },
}

// ── Flags ───────────────────────────────────────────────────────

/// Flag bits carried in the identifier word.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameFlags {
    pub extended: bool,
    pub remote: bool,
    pub error: bool,
}

impl FrameFlags {
    pub fn from_raw_id(raw_id: u32) -> Self {
        Self {
            extended: raw_id & CAN_EFF_FLAG != 0,
            remote: raw_id & CAN_RTR_FLAG != 0,
            error: raw_id & CAN_ERR_FLAG != 0,
        }
    }
}

// ── Frame ───────────────────────────────────────────────────────

/// A classic CAN frame. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanFrame {
    raw_id: u32,
    len: u8,
    data: [u8; CAN_MAX_DLEN],
}

impl CanFrame {
    /// Build a frame from an identifier word and up to eight payload bytes.
    pub fn new(raw_id: u32, payload: &[u8]) -> Result<Self, FrameError> {
        if payload.len() > CAN_MAX_DLEN {
            return Err(FrameError::PayloadTooLong { len: payload.len() });
        }
        let mut data = [0u8; CAN_MAX_DLEN];
        data[..payload.len()].copy_from_slice(payload);
        Ok(Self {
            raw_id,
            len: payload.len() as u8,
            data,
        })
    }

    /// Build from parts the caller has already validated (`len <= 8`).
    pub(crate) const fn from_raw_parts(raw_id: u32, len: u8, data: [u8; CAN_MAX_DLEN]) -> Self {
        Self { raw_id, len, data }
    }

    /// Identifier with the flag bits masked off.
    pub fn id(&self) -> u32 {
        if self.raw_id & CAN_EFF_FLAG != 0 {
            self.raw_id & CAN_EFF_MASK
        } else {
            self.raw_id & CAN_SFF_MASK
        }
    }

    /// Identifier word exactly as carried on the wire.
    pub fn raw_id(&self) -> u32 {
        self.raw_id
    }

    pub fn flags(&self) -> FrameFlags {
        FrameFlags::from_raw_id(self.raw_id)
    }

    /// Number of valid payload bytes.
    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The valid payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.data[..self.len()]
    }

    /// Encode into the 16-byte wire image.
    pub fn to_wire(&self) -> [u8; CAN_FRAME_WIRE_SIZE] {
        let mut wire = [0u8; CAN_FRAME_WIRE_SIZE];
        wire[..4].copy_from_slice(&self.raw_id.to_ne_bytes());
        wire[WIRE_LEN_OFFSET] = self.len;
        wire[WIRE_DATA_OFFSET..].copy_from_slice(&self.data);
        wire
    }

    /// Decode a 16-byte wire image. A length above 8 is clamped to 8;
    /// payload bytes past the length are kept so a clamped frame still
    /// carries whatever the sender wrote.
    pub fn from_wire(wire: &[u8; CAN_FRAME_WIRE_SIZE]) -> Self {
        let mut id_bytes = [0u8; 4];
        id_bytes.copy_from_slice(&wire[..4]);
        let mut data = [0u8; CAN_MAX_DLEN];
        data.copy_from_slice(&wire[WIRE_DATA_OFFSET..]);
        Self {
            raw_id: u32::from_ne_bytes(id_bytes),
            len: wire[WIRE_LEN_OFFSET].min(CAN_MAX_DLEN as u8),
            data,
        }
    }
}

impl std::fmt::Display for CanFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:03X} [{}]", self.id(), self.len)?;
        for b in self.payload() {
            write!(f, " {b:02X}")?;
        }
        Ok(())
    }
}
