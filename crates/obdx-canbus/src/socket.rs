//! SocketCAN endpoint for Linux hosts.
//!
//! A raw `CAN_RAW` socket bound to one interface, switched to non-blocking
//! mode and driven through tokio's reactor. Frames cross the socket as
//! their exact 16-byte wire image. The socket is closed when the endpoint
//! is dropped.

use std::io::{self, Read, Write};
use std::os::fd::AsRawFd;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use obdx_protocol::CanFrame;
use socketcan::{CanAddr, CanSocket, Socket};
use tokio::io::unix::AsyncFd;

use crate::endpoint::{BusEndpoint, Received, RecvScratch, SourceHandle, validate_interface_name};
use crate::error::{CanError, CanResult};

/// Raw SocketCAN endpoint bound to a single interface.
pub struct SocketCanEndpoint {
    interface: String,
    fd: AsyncFd<CanSocket>,
    scratch: Mutex<RecvScratch>,
}

impl SocketCanEndpoint {
    /// Resolve `interface`, open a raw CAN socket and bind it.
    ///
    /// An unknown or down interface is a `Config` error; failing to
    /// allocate or bind the socket is a `Resource` error.
    pub fn open(interface: &str) -> CanResult<Self> {
        validate_interface_name(interface)?;
        let addr = resolve_addr(interface)?;

        let socket = CanSocket::open_addr(&addr)
            .map_err(|e| CanError::resource(format!("unable to bind on iface {interface}"), e))?;
        socket.set_nonblocking(true).map_err(|e| {
            CanError::resource(format!("unable to set non-blocking on iface {interface}"), e)
        })?;
        let fd = AsyncFd::new(socket).map_err(|e| {
            CanError::resource(format!("unable to register iface {interface} for polling"), e)
        })?;

        tracing::info!(interface, fd = fd.as_raw_fd(), "CAN endpoint bound");
        Ok(Self {
            interface: interface.to_string(),
            fd,
            scratch: Mutex::new(RecvScratch::new()),
        })
    }
}

#[async_trait]
impl BusEndpoint for SocketCanEndpoint {
    fn handle(&self) -> SourceHandle {
        SourceHandle(self.fd.as_raw_fd())
    }

    fn interface(&self) -> &str {
        &self.interface
    }

    async fn send(&self, frame: &CanFrame) -> CanResult<()> {
        let wire = frame.to_wire();
        loop {
            let mut guard = self.fd.writable().await.map_err(|e| {
                CanError::io(format!("error polling {} for write", self.interface), e)
            })?;
            match guard.try_io(|inner| {
                let mut socket = inner.get_ref().as_raw_socket();
                socket.write(&wire)
            }) {
                Ok(Ok(n)) if n == wire.len() => {
                    tracing::trace!(interface = %self.interface, %frame, "frame sent");
                    return Ok(());
                }
                Ok(Ok(n)) => {
                    return Err(CanError::io(
                        format!("short write on {}", self.interface),
                        io::Error::new(
                            io::ErrorKind::WriteZero,
                            format!("wrote {n} of {} bytes", wire.len()),
                        ),
                    ));
                }
                Ok(Err(e)) => {
                    return Err(CanError::io(
                        format!("error sending on {}", self.interface),
                        e,
                    ));
                }
                Err(_would_block) => continue,
            }
        }
    }

    async fn readable(&self) -> CanResult<()> {
        // Dropping the guard without clearing keeps the readiness for `receive`.
        self.fd
            .readable()
            .await
            .map(|_guard| ())
            .map_err(|e| CanError::io(format!("error polling {} for read", self.interface), e))
    }

    async fn receive(&self) -> CanResult<Received> {
        loop {
            let mut guard = self.fd.readable().await.map_err(|e| {
                CanError::io(format!("error polling {} for read", self.interface), e)
            })?;
            let result = guard.try_io(|inner| {
                let mut scratch = self.scratch.lock().unwrap_or_else(PoisonError::into_inner);
                let mut socket = inner.get_ref().as_raw_socket();
                let n = socket.read(scratch.as_mut_bytes())?;
                Ok(scratch.finish(&self.interface, self.handle(), n))
            });
            match result {
                Ok(Ok(received)) => return Ok(received),
                Ok(Err(e)) => {
                    return Err(CanError::io(
                        format!("error receiving on {}", self.interface),
                        e,
                    ));
                }
                Err(_would_block) => continue,
            }
        }
    }
}

impl Drop for SocketCanEndpoint {
    fn drop(&mut self) {
        tracing::debug!(interface = %self.interface, "closing CAN endpoint");
    }
}

/// Look up the interface index. Nothing is allocated yet, so a failure
/// here is a configuration problem rather than a resource one.
fn resolve_addr(interface: &str) -> CanResult<CanAddr> {
    CanAddr::from_iface(interface)
        .map_err(|e| CanError::Config(format!("unable to open iface {interface}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_interface_is_config_error() {
        let result = resolve_addr("obdxnosuch0");
        assert!(
            matches!(result, Err(CanError::Config(msg)) if msg.starts_with("unable to open iface obdxnosuch0"))
        );
    }

    #[tokio::test]
    async fn open_rejects_invalid_name_before_any_io() {
        let result = SocketCanEndpoint::open("an-interface-name-way-too-long");
        assert!(matches!(result, Err(CanError::Config(_))));
    }

    #[tokio::test]
    async fn open_unknown_interface_is_config_error() {
        let result = SocketCanEndpoint::open("obdxnosuch0");
        assert!(matches!(result, Err(CanError::Config(_))));
    }
}
