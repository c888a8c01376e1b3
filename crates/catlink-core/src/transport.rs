//! Transport trait for rig communication.
//!
//! The [`Transport`] trait abstracts over the physical link to a transceiver.
//! `catlink-transport` provides the serial implementation and
//! `catlink-test-harness` a scripted mock for deterministic tests.
//!
//! The transaction engine in `catlink-text-io` operates on a `Transport`
//! rather than directly on a serial port, so the same retry and framing
//! logic runs against real hardware and against the mock.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;

/// Asynchronous byte-level transport to a rig.
///
/// The serial link is half-duplex request/response: callers must not issue
/// overlapping exchanges on one transport. Implementations take `&mut self`
/// so the borrow checker enforces this.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send raw bytes to the rig.
    ///
    /// Implementations should block until all bytes have been written to
    /// the underlying transport.
    async fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Receive bytes from the rig into the provided buffer.
    ///
    /// Returns the number of bytes actually read. Will wait up to `timeout`
    /// for data to arrive; returns [`Error::Timeout`](crate::error::Error::Timeout)
    /// if no data is received within the deadline.
    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize>;

    /// Discard any unread input.
    ///
    /// Called before each transaction attempt so a late reply from an
    /// earlier attempt cannot be mistaken for the current one.
    async fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    /// Close the transport connection.
    ///
    /// After calling `close()`, subsequent `send()` and `receive()` calls
    /// should return [`Error::NotConnected`](crate::error::Error::NotConnected).
    async fn close(&mut self) -> Result<()>;

    /// Check whether the transport is currently connected.
    fn is_connected(&self) -> bool;
}
