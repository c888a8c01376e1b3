//! Transport implementations for catlink.
//!
//! This crate provides [`SerialTransport`], the concrete
//! [`Transport`](catlink_core::Transport) for USB virtual COM ports and
//! RS-232 connections to CAT-controlled transceivers.
//!
//! # Example
//!
//! ```no_run
//! use catlink_transport::SerialTransport;
//! use catlink_core::transport::Transport;
//! use std::time::Duration;
//!
//! # async fn example() -> catlink_core::Result<()> {
//! // Elecraft K3 at its factory CAT baud rate
//! let mut transport = SerialTransport::open("/dev/ttyUSB0", 38_400).await?;
//!
//! transport.send(b"ID;").await?;
//!
//! let mut buf = [0u8; 64];
//! let n = transport.receive(&mut buf, Duration::from_millis(500)).await?;
//! # Ok(())
//! # }
//! ```

pub mod serial;

pub use serial::{DataBits, FlowControl, Parity, SerialConfig, SerialTransport, StopBits};
