//! CAN bus exchange error types.

use thiserror::Error;

use crate::endpoint::SourceHandle;

/// Errors that can occur while setting up or driving an exchange.
#[derive(Debug, Error)]
pub enum CanError {
    /// Bad interface name, conflicting role flags, missing interface.
    #[error("configuration error: {0}")]
    Config(String),

    /// Socket or multiplexer facility could not be allocated.
    #[error("{context}: {source}")]
    Resource {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Send/receive transport failure.
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("timeout waiting for receive on {interface} after {timeout_ms}ms")]
    Timeout { interface: String, timeout_ms: u64 },

    /// The multiplexer woke on a different endpoint than the one waited on.
    #[error("received event on unexpected socket: expected {expected}, got {got}")]
    UnexpectedSource {
        expected: SourceHandle,
        got: SourceHandle,
    },
}

impl CanError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub fn resource(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Resource {
            context: context.into(),
            source,
        }
    }
}

/// Convenience alias for CAN bus results.
pub type CanResult<T> = Result<T, CanError>;
