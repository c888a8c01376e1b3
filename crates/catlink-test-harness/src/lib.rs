//! catlink-test-harness: Test utilities for catlink.
//!
//! This crate provides [`MockTransport`] for deterministic testing of the
//! transaction engine and negotiation layer without real radio hardware.
//! Scripts can include clean replies, silent (timed-out) attempts, partial
//! frames and failed writes, which is what the retry logic needs.

pub mod mock_serial;

pub use mock_serial::MockTransport;
