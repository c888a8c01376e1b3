//! ElecraftBuilder -- fluent builder for opening [`ElecraftRig`] sessions.
//!
//! Separates configuration from construction so that callers can set up
//! serial port parameters, the retry policy and timeout values before the
//! transport is opened and the rig is negotiated.
//!
//! # Example
//!
//! ```no_run
//! use catlink_elecraft::builder::ElecraftBuilder;
//! use catlink_elecraft::models::k3;
//! use std::time::Duration;
//!
//! # async fn example() -> catlink_core::Result<()> {
//! let rig = ElecraftBuilder::new(k3())
//!     .serial_port("/dev/ttyUSB0")
//!     .command_timeout(Duration::from_millis(300))
//!     .max_attempts(5)
//!     .build()
//!     .await?;
//! println!("K3 extension level: {}", rig.extension_level(catlink_elecraft::SubDevice::K3));
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use catlink_core::error::{Error, Result};
use catlink_core::transport::Transport;
use catlink_text_io::transaction::DEFAULT_ATTEMPT_TIMEOUT;
use catlink_text_io::{RetryPolicy, Transactor};

use crate::models::ElecraftModel;
use crate::rig::ElecraftRig;

/// Fluent builder for [`ElecraftRig`].
///
/// All configuration has defaults derived from the [`ElecraftModel`], so the
/// simplest usage is:
///
/// ```ignore
/// let rig = ElecraftBuilder::new(k3())
///     .serial_port("/dev/ttyUSB0")
///     .build()
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct ElecraftBuilder {
    model: ElecraftModel,
    serial_port: Option<String>,
    baud_rate: Option<u32>,
    max_attempts: u32,
    retry_backoff: Duration,
    command_timeout: Duration,
}

impl ElecraftBuilder {
    /// Create a new builder for the given Elecraft model.
    pub fn new(model: ElecraftModel) -> Self {
        let policy = RetryPolicy::default();
        ElecraftBuilder {
            model,
            serial_port: None,
            baud_rate: None,
            max_attempts: policy.max_attempts(),
            retry_backoff: policy.backoff(),
            command_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }

    /// Set the serial port path (e.g. `/dev/ttyUSB0` or `COM3`).
    pub fn serial_port(mut self, port: &str) -> Self {
        self.serial_port = Some(port.to_string());
        self
    }

    /// Override the default baud rate for this model.
    pub fn baud_rate(mut self, baud: u32) -> Self {
        self.baud_rate = Some(baud);
        self
    }

    /// Total attempts per transaction, first one included (default: 3).
    pub fn max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = n;
        self
    }

    /// Linear backoff step between attempts (default: 20ms).
    pub fn retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Set the timeout for waiting for a response to a single CAT
    /// command attempt (default: 500ms).
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Check the engine settings and produce the retry policy.
    fn validate(&self) -> Result<RetryPolicy> {
        if self.command_timeout.is_zero() {
            return Err(Error::InvalidArgument(
                "command_timeout must be non-zero".into(),
            ));
        }
        RetryPolicy::new(self.max_attempts, self.retry_backoff)
    }

    /// Open an [`ElecraftRig`] over a caller-provided transport.
    ///
    /// This is the entry point for testing (pass a `MockTransport` from
    /// `catlink-test-harness`) and for callers that manage the transport
    /// lifecycle directly. Runs the full identification and negotiation
    /// sequence before returning.
    pub async fn build_with_transport(self, transport: Box<dyn Transport>) -> Result<ElecraftRig> {
        let policy = self.validate()?;
        let engine = Transactor::new(transport, self.model.family())
            .with_policy(policy)
            .with_attempt_timeout(self.command_timeout);
        ElecraftRig::open(engine, self.model).await
    }

    /// Open an [`ElecraftRig`] on a serial port.
    ///
    /// Requires that [`serial_port()`](Self::serial_port) has been called.
    /// The baud rate defaults to the model's default if not overridden.
    pub async fn build(self) -> Result<ElecraftRig> {
        self.validate()?;
        let port = self
            .serial_port
            .as_deref()
            .ok_or_else(|| Error::InvalidArgument("serial_port is required for build()".into()))?;
        let baud = self.baud_rate.unwrap_or(self.model.default_baud_rate);
        if baud == 0 {
            return Err(Error::InvalidArgument("baud_rate must be non-zero".into()));
        }
        let transport = catlink_transport::SerialTransport::open(port, baud).await?;
        self.build_with_transport(Box::new(transport)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::{ExtensionLevel, SubDevice};
    use crate::models::{k2, kx2};
    use catlink_test_harness::MockTransport;

    #[tokio::test]
    async fn builder_opens_and_negotiates() {
        let mock = MockTransport::new();
        mock.expect(b"ID;", b"ID017;");
        mock.expect(b"K2;", b"K20;");

        let rig = ElecraftBuilder::new(k2())
            .retry_backoff(Duration::from_millis(1))
            .build_with_transport(Box::new(mock.clone()))
            .await
            .unwrap();
        assert_eq!(rig.model().name, "K2");
        assert_eq!(rig.extension_level(SubDevice::K2), ExtensionLevel::K20);
    }

    #[tokio::test]
    async fn builder_applies_attempt_budget() {
        let mock = MockTransport::new();
        for _ in 0..5 {
            mock.expect_silence(b"ID;");
        }

        let err = ElecraftBuilder::new(kx2())
            .max_attempts(5)
            .retry_backoff(Duration::from_millis(1))
            .command_timeout(Duration::from_millis(10))
            .build_with_transport(Box::new(mock.clone()))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, Error::CommunicationFailure { attempts: 5, .. }));
        assert_eq!(mock.send_count(), 5);
    }

    #[tokio::test]
    async fn zero_attempts_rejected_before_io() {
        let mock = MockTransport::new();
        let err = ElecraftBuilder::new(k2())
            .max_attempts(0)
            .build_with_transport(Box::new(mock.clone()))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert_eq!(mock.send_count(), 0);
    }

    #[tokio::test]
    async fn zero_timeout_rejected() {
        let err = ElecraftBuilder::new(k2())
            .command_timeout(Duration::ZERO)
            .build_with_transport(Box::new(MockTransport::new()))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn build_requires_serial_port() {
        let err = ElecraftBuilder::new(k2()).build().await.err().unwrap();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn build_checks_timeout_before_opening_port() {
        // The port does not exist; reaching the open would yield a
        // transport error instead.
        let err = ElecraftBuilder::new(k2())
            .serial_port("/dev/catlink-no-such-port")
            .command_timeout(Duration::ZERO)
            .build()
            .await
            .err()
            .unwrap();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn build_checks_attempts_before_opening_port() {
        let err = ElecraftBuilder::new(k2())
            .serial_port("/dev/catlink-no-such-port")
            .max_attempts(0)
            .build()
            .await
            .err()
            .unwrap();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn build_missing_port_is_transport_error() {
        let err = ElecraftBuilder::new(k2())
            .serial_port("/dev/catlink-no-such-port")
            .build()
            .await
            .err()
            .unwrap();
        assert!(matches!(err, Error::Transport(_)));
    }

    #[tokio::test]
    async fn build_rejects_zero_baud() {
        let err = ElecraftBuilder::new(k2())
            .serial_port("/dev/null")
            .baud_rate(0)
            .build()
            .await
            .err()
            .unwrap();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }
}
