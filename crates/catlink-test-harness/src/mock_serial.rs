//! Mock transport for deterministic testing of CAT exchanges.
//!
//! [`MockTransport`] implements the [`Transport`] trait from a script of
//! expected requests and canned outcomes. Clones share the same script and
//! send log, so a test can keep one handle after moving another into the
//! engine and inspect what was sent afterwards.
//!
//! # Example
//!
//! ```
//! use catlink_test_harness::MockTransport;
//!
//! let mock = MockTransport::new();
//! mock.expect(b"ID;", b"ID017;");
//! mock.expect_silence(b"K2;");
//! mock.expect(b"K2;", b"K22;");
//! assert_eq!(mock.remaining_expectations(), 3);
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use catlink_core::error::{Error, Result};
use catlink_core::transport::Transport;

/// What the mock does once the expected request has been sent.
#[derive(Debug, Clone)]
enum Outcome {
    /// Make these bytes available to `receive()`.
    Reply(Vec<u8>),
    /// Accept the write, then time out on every read.
    Silence,
    /// Fail the write itself.
    SendFailure,
}

#[derive(Debug, Clone)]
struct Expectation {
    request: Vec<u8>,
    outcome: Outcome,
}

#[derive(Debug)]
struct State {
    expectations: VecDeque<Expectation>,
    pending: Vec<u8>,
    cursor: usize,
    connected: bool,
    sent_log: Vec<Vec<u8>>,
    flushes: usize,
    read_chunk: usize,
}

/// A scripted [`Transport`] for testing without hardware.
///
/// Expectations are consumed in order, one per `send()`. A send that does
/// not match the next expectation, or arrives after the script is
/// exhausted, fails with [`Error::Transport`].
#[derive(Debug, Clone)]
pub struct MockTransport {
    state: Arc<Mutex<State>>,
}

impl MockTransport {
    /// Create a new mock transport in the connected state.
    pub fn new() -> Self {
        MockTransport {
            state: Arc::new(Mutex::new(State {
                expectations: VecDeque::new(),
                pending: Vec::new(),
                cursor: 0,
                connected: true,
                sent_log: Vec::new(),
                flushes: 0,
                read_chunk: usize::MAX,
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        // A panic inside a test holding the lock must not hide the original
        // failure behind a poison error.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn push(&self, request: &[u8], outcome: Outcome) {
        self.state().expectations.push_back(Expectation {
            request: request.to_vec(),
            outcome,
        });
    }

    /// Expect `request`; the following reads return `response`.
    ///
    /// A response without a terminator models a truncated frame.
    pub fn expect(&self, request: &[u8], response: &[u8]) {
        self.push(request, Outcome::Reply(response.to_vec()));
    }

    /// Expect `request`; the rig stays silent and every read times out.
    pub fn expect_silence(&self, request: &[u8]) {
        self.push(request, Outcome::Silence);
    }

    /// Expect `request`; the write itself fails with a transport error.
    pub fn expect_send_failure(&self, request: &[u8]) {
        self.push(request, Outcome::SendFailure);
    }

    /// Deliver replies at most `n` bytes per `receive()` call.
    pub fn set_read_chunk(&self, n: usize) {
        self.state().read_chunk = n.max(1);
    }

    /// All data sent through this transport, one element per `send()`.
    pub fn sent_data(&self) -> Vec<Vec<u8>> {
        self.state().sent_log.clone()
    }

    /// Number of `send()` calls observed.
    pub fn send_count(&self) -> usize {
        self.state().sent_log.len()
    }

    /// Number of `flush()` calls observed.
    pub fn flush_count(&self) -> usize {
        self.state().flushes
    }

    /// Number of expectations not yet consumed.
    pub fn remaining_expectations(&self) -> usize {
        self.state().expectations.len()
    }

    /// Set the connected state. A disconnected mock fails every call with
    /// [`Error::NotConnected`].
    pub fn set_connected(&self, connected: bool) {
        self.state().connected = connected;
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let mut state = self.state();
        if !state.connected {
            return Err(Error::NotConnected);
        }

        state.sent_log.push(data.to_vec());
        state.pending.clear();
        state.cursor = 0;

        let expectation = state
            .expectations
            .pop_front()
            .ok_or_else(|| Error::Transport("no more expectations in mock transport".into()))?;

        if data != expectation.request.as_slice() {
            return Err(Error::Transport(format!(
                "unexpected send data: expected {:?}, got {:?}",
                String::from_utf8_lossy(&expectation.request),
                String::from_utf8_lossy(data)
            )));
        }

        match expectation.outcome {
            Outcome::Reply(bytes) => {
                state.pending = bytes;
                Ok(())
            }
            Outcome::Silence => Ok(()),
            Outcome::SendFailure => Err(Error::Transport("simulated write failure".into())),
        }
    }

    async fn receive(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<usize> {
        let mut state = self.state();
        if !state.connected {
            return Err(Error::NotConnected);
        }

        let remaining = state.pending.len() - state.cursor;
        if remaining == 0 {
            return Err(Error::Timeout);
        }

        let n = remaining.min(buf.len()).min(state.read_chunk);
        let start = state.cursor;
        buf[..n].copy_from_slice(&state.pending[start..start + n]);
        state.cursor += n;
        Ok(n)
    }

    async fn flush(&mut self) -> Result<()> {
        let mut state = self.state();
        if !state.connected {
            return Err(Error::NotConnected);
        }
        state.flushes += 1;
        state.pending.clear();
        state.cursor = 0;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        let mut state = self.state();
        state.connected = false;
        state.pending.clear();
        state.cursor = 0;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.state().connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: Duration = Duration::from_millis(10);

    #[tokio::test]
    async fn send_then_receive_reply() {
        let mut mock = MockTransport::new();
        mock.expect(b"ID;", b"ID017;");

        mock.send(b"ID;").await.unwrap();
        let mut buf = [0u8; 64];
        let n = mock.receive(&mut buf, T).await.unwrap();
        assert_eq!(&buf[..n], b"ID017;");

        // Reply drained: the next read times out.
        assert!(matches!(mock.receive(&mut buf, T).await, Err(Error::Timeout)));
    }

    #[tokio::test]
    async fn clones_share_send_log() {
        let observer = MockTransport::new();
        observer.expect(b"K2;", b"K22;");
        observer.expect(b"K3;", b"K31;");

        let mut engine_side = observer.clone();
        engine_side.send(b"K2;").await.unwrap();
        engine_side.send(b"K3;").await.unwrap();

        assert_eq!(observer.send_count(), 2);
        assert_eq!(observer.sent_data()[1], b"K3;");
        assert_eq!(observer.remaining_expectations(), 0);
    }

    #[tokio::test]
    async fn silence_times_out() {
        let mut mock = MockTransport::new();
        mock.expect_silence(b"ID;");
        mock.send(b"ID;").await.unwrap();
        let mut buf = [0u8; 8];
        assert!(matches!(mock.receive(&mut buf, T).await, Err(Error::Timeout)));
    }

    #[tokio::test]
    async fn send_failure_is_transport_error() {
        let mut mock = MockTransport::new();
        mock.expect_send_failure(b"ID;");
        let result = mock.send(b"ID;").await;
        assert!(matches!(result, Err(Error::Transport(_))));
        assert_eq!(mock.send_count(), 1);
    }

    #[tokio::test]
    async fn wrong_data_errors() {
        let mut mock = MockTransport::new();
        mock.expect(b"ID;", b"ID017;");
        let result = mock.send(b"FA;").await;
        assert!(matches!(result, Err(Error::Transport(_))));
    }

    #[tokio::test]
    async fn exhausted_script_errors() {
        let mut mock = MockTransport::new();
        assert!(matches!(mock.send(b"ID;").await, Err(Error::Transport(_))));
    }

    #[tokio::test]
    async fn chunked_reads() {
        let mut mock = MockTransport::new();
        mock.set_read_chunk(2);
        mock.expect(b"ID;", b"ID017;");
        mock.send(b"ID;").await.unwrap();

        let mut buf = [0u8; 64];
        let mut collected = Vec::new();
        while let Ok(n) = mock.receive(&mut buf, T).await {
            assert!(n <= 2);
            collected.extend_from_slice(&buf[..n]);
        }
        assert_eq!(collected, b"ID017;");
    }

    #[tokio::test]
    async fn flush_discards_pending_reply() {
        let mut mock = MockTransport::new();
        mock.expect(b"ID;", b"ID017;");
        mock.send(b"ID;").await.unwrap();
        mock.flush().await.unwrap();
        assert_eq!(mock.flush_count(), 1);

        let mut buf = [0u8; 8];
        assert!(matches!(mock.receive(&mut buf, T).await, Err(Error::Timeout)));
    }

    #[tokio::test]
    async fn disconnect() {
        let mut mock = MockTransport::new();
        assert!(mock.is_connected());
        mock.close().await.unwrap();
        assert!(!mock.is_connected());
        assert!(matches!(mock.send(b"ID;").await, Err(Error::NotConnected)));

        let mut buf = [0u8; 8];
        assert!(matches!(
            mock.receive(&mut buf, T).await,
            Err(Error::NotConnected)
        ));
    }
}
