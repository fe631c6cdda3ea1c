//! Fixed-format RPM request/response payloads.
//!
//! Pure functions, no I/O. The request's first byte (its own byte count,
//! 0x03) doubles as the discriminator the emulated ECU checks for, and the
//! response's first byte (0x04) is what the querying side checks for. That
//! overlap of "byte count" and "service" is kept bit-for-bit.

use crate::frame::{CAN_MAX_DLEN, CanFrame};

// ── Identifiers ─────────────────────────────────────────────────

/// Functional broadcast address used for requests.
pub const FUNCTIONAL_REQUEST_ID: u32 = 0x7DF;

/// Physical response address of the emulated ECU.
pub const PHYSICAL_RESPONSE_ID: u32 = 0x7E8;

// ── Payload bytes ───────────────────────────────────────────────

/// Mode 01: show current data.
pub const MODE_CURRENT_DATA: u8 = 0x01;

/// Offset added to request mode to get response SID.
pub const RESPONSE_SID_OFFSET: u8 = 0x40;

/// PID 0x0C: engine RPM.
pub const PID_ENGINE_RPM: u8 = 0x0C;

/// First byte of an RPM request, checked by the emulated ECU.
pub const REQUEST_DISCRIMINATOR: u8 = 0x03;

/// First byte of an RPM response, checked by the querying side.
pub const RESPONSE_DISCRIMINATOR: u8 = 0x04;

/// Trailing pad byte of the response.
pub const RESPONSE_PAD: u8 = 0x40;

const REQUEST_LEN: u8 = 3;
const RESPONSE_LEN: u8 = 5;

// ── Encoders ────────────────────────────────────────────────────

/// Build the "read engine RPM" request: `7DF [3] 03 01 0C`.
pub fn encode_request() -> CanFrame {
    let mut data = [0u8; CAN_MAX_DLEN];
    data[..REQUEST_LEN as usize].copy_from_slice(&[
        REQUEST_DISCRIMINATOR,
        MODE_CURRENT_DATA,
        PID_ENGINE_RPM,
    ]);
    CanFrame::from_raw_parts(FUNCTIONAL_REQUEST_ID, REQUEST_LEN, data)
}

/// Build the RPM response carrying `value`: `7E8 [5] 04 41 0C vv 40`.
pub fn encode_response(value: u8) -> CanFrame {
    let mut data = [0u8; CAN_MAX_DLEN];
    data[..RESPONSE_LEN as usize].copy_from_slice(&[
        RESPONSE_DISCRIMINATOR,
        MODE_CURRENT_DATA + RESPONSE_SID_OFFSET,
        PID_ENGINE_RPM,
        value,
        RESPONSE_PAD,
    ]);
    CanFrame::from_raw_parts(PHYSICAL_RESPONSE_ID, RESPONSE_LEN, data)
}

// ── Decoder ─────────────────────────────────────────────────────

/// Semantic view of an inbound payload.
///
/// Each field is the payload byte at its position, or `None` when the
/// frame is too short to carry it. No further validation is done:
/// unrecognized discriminators are "not interesting", never malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedPayload {
    /// Byte 0: byte count, used as the discriminator.
    pub discriminator: Option<u8>,
    /// Byte 1: service / mode (0x01 request, 0x41 response).
    pub service: Option<u8>,
    /// Byte 2: parameter id.
    pub pid: Option<u8>,
    /// Byte 3: returned value (responses only).
    pub value: Option<u8>,
}

impl DecodedPayload {
    /// True when the emulated ECU should answer this frame.
    pub fn is_rpm_query(&self) -> bool {
        self.discriminator == Some(REQUEST_DISCRIMINATOR)
    }

    /// The carried RPM value, if this is an RPM response.
    pub fn rpm(&self) -> Option<u8> {
        if self.discriminator == Some(RESPONSE_DISCRIMINATOR) {
            self.value
        } else {
            None
        }
    }
}

/// Split a frame's payload into its semantic fields.
pub fn decode(frame: &CanFrame) -> DecodedPayload {
    let payload = frame.payload();
    DecodedPayload {
        discriminator: payload.first().copied(),
        service: payload.get(1).copied(),
        pid: payload.get(2).copied(),
        value: payload.get(3).copied(),
    }
}
