//! Mock bus endpoint for testing.
//!
//! Supports scripted replies, frame injection, frame recording and linked
//! pairs that model two cross-wired interfaces. All tests use this instead
//! of real CAN hardware so the suite runs in CI on any platform.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use obdx_protocol::CanFrame;
use tokio::sync::Notify;

use crate::endpoint::{BusEndpoint, Received, RecvScratch, SourceHandle};
use crate::error::{CanError, CanResult};

/// Mock handles start well clear of real file descriptors.
static NEXT_HANDLE: AtomicI32 = AtomicI32::new(1000);

/// Frames waiting to be received, as (possibly truncated) wire images.
#[derive(Default)]
struct Inbox {
    frames: Mutex<VecDeque<Vec<u8>>>,
    notify: Notify,
}

impl Inbox {
    fn push(&self, wire: Vec<u8>) {
        self.frames.lock().unwrap().push_back(wire);
        self.notify.notify_one();
    }

    fn pop(&self) -> Option<Vec<u8>> {
        self.frames.lock().unwrap().pop_front()
    }

    fn has_pending(&self) -> bool {
        !self.frames.lock().unwrap().is_empty()
    }

    fn len(&self) -> usize {
        self.frames.lock().unwrap().len()
    }
}

/// Mock CAN endpoint with scripted replies and frame recording.
pub struct MockBusEndpoint {
    interface: String,
    handle: SourceHandle,
    inbox: Arc<Inbox>,
    /// Inbox of the cross-wired partner, if any. Sent frames land there.
    peer: Option<Arc<Inbox>>,
    /// Replies delivered to our own inbox, one per `send` (FIFO order).
    replies: Mutex<VecDeque<CanFrame>>,
    /// All frames passed to `send` (for test assertions).
    sent_frames: Mutex<Vec<CanFrame>>,
    /// When set, every `send` fails with a transport error.
    fail_sends: AtomicBool,
    scratch: Mutex<RecvScratch>,
}

impl MockBusEndpoint {
    /// Create a new mock bound to `interface` with nothing queued.
    pub fn new(interface: &str) -> Self {
        Self::with_inbox(interface, Arc::new(Inbox::default()), None)
    }

    /// Create a mock that answers each sent frame with the next scripted reply.
    pub fn with_replies(interface: &str, replies: Vec<CanFrame>) -> Self {
        let mock = Self::new(interface);
        mock.replies.lock().unwrap().extend(replies);
        mock
    }

    /// Two endpoints wired to each other: whatever one sends, the other receives.
    pub fn linked_pair(first: &str, second: &str) -> (Self, Self) {
        let a = Arc::new(Inbox::default());
        let b = Arc::new(Inbox::default());
        (
            Self::with_inbox(first, a.clone(), Some(b.clone())),
            Self::with_inbox(second, b, Some(a)),
        )
    }

    fn with_inbox(interface: &str, inbox: Arc<Inbox>, peer: Option<Arc<Inbox>>) -> Self {
        Self {
            interface: interface.to_string(),
            handle: SourceHandle(NEXT_HANDLE.fetch_add(1, Ordering::Relaxed)),
            inbox,
            peer,
            replies: Mutex::new(VecDeque::new()),
            sent_frames: Mutex::new(Vec::new()),
            fail_sends: AtomicBool::new(false),
            scratch: Mutex::new(RecvScratch::new()),
        }
    }

    /// Queue an additional scripted reply.
    pub fn queue_reply(&self, frame: CanFrame) {
        self.replies.lock().unwrap().push_back(frame);
    }

    /// Make a frame arrive on this endpoint as if another node sent it.
    pub fn inject(&self, frame: CanFrame) {
        self.inbox.push(frame.to_wire().to_vec());
    }

    /// Make a raw (possibly truncated) wire image arrive on this endpoint.
    pub fn inject_raw(&self, wire: &[u8]) {
        self.inbox.push(wire.to_vec());
    }

    /// Number of frames waiting to be received.
    pub fn pending(&self) -> usize {
        self.inbox.len()
    }

    /// Make every subsequent `send` fail (or succeed again).
    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::Relaxed);
    }

    /// Get copies of all frames that were sent.
    pub fn sent_frames(&self) -> Vec<CanFrame> {
        self.sent_frames.lock().unwrap().clone()
    }

    /// Get the last sent frame, if any.
    pub fn last_sent(&self) -> Option<CanFrame> {
        self.sent_frames.lock().unwrap().last().copied()
    }
}

#[async_trait]
impl BusEndpoint for MockBusEndpoint {
    fn handle(&self) -> SourceHandle {
        self.handle
    }

    fn interface(&self) -> &str {
        &self.interface
    }

    async fn send(&self, frame: &CanFrame) -> CanResult<()> {
        if self.fail_sends.load(Ordering::Relaxed) {
            return Err(CanError::io(
                format!("error sending on {}", self.interface),
                std::io::Error::from(std::io::ErrorKind::BrokenPipe),
            ));
        }

        self.sent_frames.lock().unwrap().push(*frame);
        if let Some(peer) = &self.peer {
            peer.push(frame.to_wire().to_vec());
        }
        let reply = self.replies.lock().unwrap().pop_front();
        if let Some(reply) = reply {
            self.inbox.push(reply.to_wire().to_vec());
        }
        Ok(())
    }

    async fn readable(&self) -> CanResult<()> {
        while !self.inbox.has_pending() {
            self.inbox.notify.notified().await;
        }
        Ok(())
    }

    async fn receive(&self) -> CanResult<Received> {
        loop {
            if let Some(wire) = self.inbox.pop() {
                let mut scratch = self.scratch.lock().unwrap();
                let n = scratch.absorb(&wire);
                return Ok(scratch.finish(&self.interface, self.handle, n));
            }
            self.inbox.notify.notified().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use obdx_protocol::{encode_request, encode_response};
    use std::time::Duration;

    #[tokio::test]
    async fn records_sent_frames() {
        let mock = MockBusEndpoint::new("can0");
        mock.send(&encode_request()).await.unwrap();

        let sent = mock.sent_frames();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].id(), 0x7DF);
        assert_eq!(mock.last_sent(), Some(encode_request()));
    }

    #[tokio::test]
    async fn scripted_reply_follows_send() {
        let mock = MockBusEndpoint::with_replies("can0", vec![encode_response(0x2A)]);
        assert_eq!(mock.pending(), 0);

        mock.send(&encode_request()).await.unwrap();
        assert_eq!(mock.pending(), 1);

        let received = mock.receive().await.unwrap();
        assert_eq!(received.frame, encode_response(0x2A));
        assert_eq!(received.source, mock.handle());
    }

    #[tokio::test]
    async fn linked_pair_crosses_frames() {
        let (query, ecu) = MockBusEndpoint::linked_pair("can0", "can1");
        query.send(&encode_request()).await.unwrap();

        assert_eq!(query.pending(), 0);
        assert_eq!(ecu.pending(), 1);
        let received = ecu.receive().await.unwrap();
        assert_eq!(received.frame, encode_request());

        ecu.send(&encode_response(7)).await.unwrap();
        assert_eq!(query.receive().await.unwrap().frame, encode_response(7));
    }

    #[tokio::test(start_paused = true)]
    async fn readable_pends_until_injected() {
        let mock = MockBusEndpoint::new("can1");
        let waited = tokio::time::timeout(Duration::from_millis(50), mock.readable()).await;
        assert!(waited.is_err());

        mock.inject(encode_request());
        mock.readable().await.unwrap();
        // Readiness does not consume the frame.
        assert_eq!(mock.pending(), 1);
    }

    #[tokio::test]
    async fn truncated_injection_is_short() {
        let mock = MockBusEndpoint::new("can1");
        mock.inject_raw(&encode_request().to_wire()[..10]);

        let received = mock.receive().await.unwrap();
        assert!(received.is_short());
        assert_eq!(received.wire_len, 10);
        assert_eq!(received.frame.payload()[..2], [0x03, 0x01]);
    }

    #[tokio::test]
    async fn failing_sends_are_io_errors() {
        let mock = MockBusEndpoint::new("can0");
        mock.fail_sends(true);
        let result = mock.send(&encode_request()).await;
        assert!(matches!(result, Err(CanError::Io { .. })));
        assert!(mock.sent_frames().is_empty());
    }

    #[test]
    fn handles_are_unique() {
        let a = MockBusEndpoint::new("can0");
        let b = MockBusEndpoint::new("can0");
        assert_ne!(a.handle(), b.handle());
    }
}
