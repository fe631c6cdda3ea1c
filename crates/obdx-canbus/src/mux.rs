//! Bounded readiness wait over a fixed set of endpoints.
//!
//! Endpoints are registered once, up front. Each `wait` watches all of
//! them for one event, like a single-event `epoll_wait`, and then checks
//! that the endpoint that woke is the one the caller expected.

use std::future::{Future, poll_fn};
use std::pin::Pin;
use std::task::Poll;
use std::time::Duration;

use crate::endpoint::{BusEndpoint, SourceHandle};
use crate::error::{CanError, CanResult};

/// How long a diagnostic responder has to answer.
pub const REPLY_TIMEOUT: Duration = Duration::from_millis(1000);

/// What to do when a wait expires with nothing ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutPolicy {
    /// The caller is only waiting for a queried response: timeout is an error.
    Escalate,
    /// The caller is idling for the next query: timeout means "try again".
    Retry,
}

/// Result of one bounded wait.
#[derive(Debug)]
pub enum WaitOutcome {
    /// The expected endpoint has a frame waiting.
    Ready(SourceHandle),
    /// Nothing arrived in time and the policy was `Retry`.
    Timeout,
    Error(CanError),
}

/// Readiness multiplexer over registered endpoints.
pub struct Multiplexer<'a> {
    endpoints: Vec<&'a dyn BusEndpoint>,
    timeout: Duration,
}

impl<'a> Multiplexer<'a> {
    pub fn new(endpoints: Vec<&'a dyn BusEndpoint>, timeout: Duration) -> Self {
        for ep in &endpoints {
            tracing::debug!(
                interface = ep.interface(),
                handle = %ep.handle(),
                "registered endpoint for readiness"
            );
        }
        Self { endpoints, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Handles of all registered endpoints, in registration order.
    pub fn registered(&self) -> Vec<SourceHandle> {
        self.endpoints.iter().map(|ep| ep.handle()).collect()
    }

    /// Wait up to the configured timeout for `expected` to become readable.
    pub async fn wait(&self, expected: SourceHandle, policy: TimeoutPolicy) -> WaitOutcome {
        let Some(target) = self.endpoints.iter().find(|ep| ep.handle() == expected) else {
            return WaitOutcome::Error(CanError::Config(format!(
                "endpoint {expected} was never registered for polling"
            )));
        };

        match tokio::time::timeout(self.timeout, self.first_ready()).await {
            Err(_elapsed) => match policy {
                TimeoutPolicy::Escalate => WaitOutcome::Error(CanError::Timeout {
                    interface: target.interface().to_string(),
                    timeout_ms: self.timeout.as_millis() as u64,
                }),
                TimeoutPolicy::Retry => {
                    tracing::trace!(interface = target.interface(), "idle wait expired");
                    WaitOutcome::Timeout
                }
            },
            Ok(Err(e)) => WaitOutcome::Error(e),
            Ok(Ok(got)) if got != expected => {
                WaitOutcome::Error(CanError::UnexpectedSource { expected, got })
            }
            Ok(Ok(got)) => WaitOutcome::Ready(got),
        }
    }

    /// Resolve with the first registered endpoint that reports readiness.
    async fn first_ready(&self) -> CanResult<SourceHandle> {
        type Pending<'f> = Pin<Box<dyn Future<Output = CanResult<()>> + Send + 'f>>;

        let mut pending: Vec<(SourceHandle, Pending<'_>)> = self
            .endpoints
            .iter()
            .map(|ep| (ep.handle(), ep.readable()))
            .collect();

        poll_fn(|cx| {
            for (handle, fut) in pending.iter_mut() {
                if let Poll::Ready(result) = fut.as_mut().poll(cx) {
                    return Poll::Ready(result.map(|()| *handle));
                }
            }
            Poll::Pending
        })
        .await
    }
}
