//! Bus endpoint abstraction.
//!
//! `BusEndpoint` trait with `send`/`readable`/`receive`. Two impls:
//! - `SocketCanEndpoint`: Linux-only, raw SocketCAN socket (in `socket.rs`)
//! - `MockBusEndpoint`: all platforms, scripted traffic (in `mock.rs`)
//!
//! An endpoint is only ever handed out fully bound; construction either
//! yields a usable endpoint or an error, never a half-open one.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use obdx_protocol::{CAN_FRAME_WIRE_SIZE, CanFrame};

use crate::error::{CanError, CanResult};

/// Longest interface name the kernel accepts (`IFNAMSIZ - 1`).
pub const MAX_IFACE_NAME_LEN: usize = 15;

/// Identifies which endpoint a readiness event or frame came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceHandle(pub i32);

impl std::fmt::Display for SourceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Trait for CAN bus endpoint implementations.
#[async_trait]
pub trait BusEndpoint: Send + Sync {
    /// Handle used by the multiplexer's wrong-source check.
    fn handle(&self) -> SourceHandle;

    /// Interface this endpoint is bound to (e.g., "can0").
    fn interface(&self) -> &str;

    /// Write the frame's exact wire image. Short writes are failures.
    async fn send(&self, frame: &CanFrame) -> CanResult<()>;

    /// Resolve once a frame is waiting to be received.
    async fn readable(&self) -> CanResult<()>;

    /// Read the next frame into the endpoint's scratch buffer.
    async fn receive(&self) -> CanResult<Received>;
}

/// A received frame plus the metadata gathered alongside it.
///
/// Flag bits travel in the frame's identifier word; see [`CanFrame::flags`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Received {
    pub frame: CanFrame,
    /// Endpoint the frame was read from.
    pub source: SourceHandle,
    /// User-space receive time, taken when the read returned. This is not
    /// the kernel's `SO_TIMESTAMP` arrival time.
    pub timestamp: DateTime<Utc>,
    /// Bytes actually transferred by the read.
    pub wire_len: usize,
}

impl Received {
    /// True when fewer bytes than a full wire image arrived.
    pub fn is_short(&self) -> bool {
        self.wire_len < CAN_FRAME_WIRE_SIZE
    }
}

// ── Receive scratch buffer ──────────────────────────────────────

/// The single reusable receive buffer of an endpoint.
///
/// Reads overwrite it in place. A short read only replaces the prefix it
/// covered; the rest still holds the previous frame's bytes.
#[derive(Debug, Clone)]
pub struct RecvScratch {
    buf: [u8; CAN_FRAME_WIRE_SIZE],
}

impl RecvScratch {
    pub fn new() -> Self {
        Self {
            buf: [0u8; CAN_FRAME_WIRE_SIZE],
        }
    }

    /// Raw buffer for a read syscall to fill.
    pub fn as_mut_bytes(&mut self) -> &mut [u8; CAN_FRAME_WIRE_SIZE] {
        &mut self.buf
    }

    /// Copy `bytes` over the start of the buffer. Returns the count copied.
    pub fn absorb(&mut self, bytes: &[u8]) -> usize {
        let n = bytes.len().min(CAN_FRAME_WIRE_SIZE);
        self.buf[..n].copy_from_slice(&bytes[..n]);
        n
    }

    /// Package the buffer contents after a read of `wire_len` bytes,
    /// stamping them with the current wall-clock time.
    ///
    /// Short reads are logged and still returned for best-effort decoding.
    pub fn finish(&self, interface: &str, source: SourceHandle, wire_len: usize) -> Received {
        let frame = CanFrame::from_wire(&self.buf);
        let received = Received {
            frame,
            source,
            timestamp: Utc::now(),
            wire_len,
        };
        if received.is_short() {
            tracing::warn!(
                interface,
                wire_len,
                expected = CAN_FRAME_WIRE_SIZE,
                "incomplete CAN frame"
            );
        } else {
            tracing::trace!(interface, %frame, "frame received");
        }
        received
    }
}

impl Default for RecvScratch {
    fn default() -> Self {
        Self::new()
    }
}

/// Reject interface names the kernel could never resolve.
pub fn validate_interface_name(name: &str) -> CanResult<()> {
    if name.is_empty() {
        return Err(CanError::Config("interface name must not be empty".into()));
    }
    if name.len() > MAX_IFACE_NAME_LEN {
        return Err(CanError::Config(format!(
            "interface name {name:?} is longer than {MAX_IFACE_NAME_LEN} bytes"
        )));
    }
    if name.contains(['/', '\0']) || name.chars().any(char::is_whitespace) {
        return Err(CanError::Config(format!(
            "interface name {name:?} contains invalid characters"
        )));
    }
    Ok(())
}
