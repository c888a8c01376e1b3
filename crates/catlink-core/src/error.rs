//! Error types for catlink.
//!
//! All fallible operations across the library return [`Result<T>`], which
//! uses [`Error`] as the error type. The variants split into two groups:
//!
//! - **Caller-facing kinds** that the transaction engine and the open
//!   sequence surface: [`InvalidArgument`](Error::InvalidArgument),
//!   [`CommunicationFailure`](Error::CommunicationFailure),
//!   [`ProtocolViolation`](Error::ProtocolViolation) and
//!   [`UnsupportedModel`](Error::UnsupportedModel).
//! - **Link-level kinds** produced by [`Transport`](crate::Transport)
//!   implementations. The engine retries the transient ones and folds them
//!   into `CommunicationFailure` once the retry budget is spent.

/// The error type for all catlink operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required input was missing or malformed. Raised before any I/O.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The rig could not be reached after exhausting every retry.
    #[error("communication failure after {attempts} attempt(s): {reason}")]
    CommunicationFailure {
        /// Number of attempts made, including the first.
        attempts: u32,
        /// Description of the last transient failure.
        reason: String,
    },

    /// The rig answered with well-formed bytes that mean the wrong thing
    /// (bad length, unmatched echo, unknown identity code).
    ///
    /// Never retried: it indicates a model or firmware mismatch.
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    /// The rig model has no negotiation path in this library.
    #[error("unsupported model: {0}")]
    UnsupportedModel(String),

    /// A transport-level error (serial port open/configure failure).
    #[error("transport error: {0}")]
    Transport(String),

    /// Timed out waiting for bytes from the rig.
    ///
    /// This typically indicates the rig is powered off or the baud rate is
    /// wrong.
    #[error("timeout waiting for response")]
    Timeout,

    /// No connection to the rig has been established.
    #[error("not connected")]
    NotConnected,

    /// The connection to the rig was lost unexpectedly.
    #[error("connection lost")]
    ConnectionLost,

    /// An underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the transaction engine may retry after this error.
    ///
    /// Link-level hiccups are transient. Everything the engine or the
    /// caller raises deliberately, plus a closed transport, is not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::Transport(_) | Error::Timeout | Error::ConnectionLost | Error::Io(_)
        )
    }
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_invalid_argument() {
        let e = Error::InvalidArgument("empty command token".into());
        assert_eq!(e.to_string(), "invalid argument: empty command token");
    }

    #[test]
    fn error_display_communication_failure() {
        let e = Error::CommunicationFailure {
            attempts: 3,
            reason: "timeout waiting for response".into(),
        };
        assert_eq!(
            e.to_string(),
            "communication failure after 3 attempt(s): timeout waiting for response"
        );
    }

    #[test]
    fn error_display_protocol_violation() {
        let e = Error::ProtocolViolation("unexpected identity code 018".into());
        assert_eq!(
            e.to_string(),
            "protocol violation: unexpected identity code 018"
        );
    }

    #[test]
    fn error_display_unsupported_model() {
        let e = Error::UnsupportedModel("KX9".into());
        assert_eq!(e.to_string(), "unsupported model: KX9");
    }

    #[test]
    fn error_display_timeout() {
        assert_eq!(Error::Timeout.to_string(), "timeout waiting for response");
    }

    #[test]
    fn error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe broken");
        let e: Error = io_err.into();
        assert!(matches!(e, Error::Io(_)));
        assert!(e.to_string().contains("pipe broken"));
    }

    #[test]
    fn transient_classification() {
        assert!(Error::Timeout.is_transient());
        assert!(Error::ConnectionLost.is_transient());
        assert!(Error::Transport("framing".into()).is_transient());
        assert!(Error::Io(std::io::Error::other("x")).is_transient());

        assert!(!Error::NotConnected.is_transient());
        assert!(!Error::ProtocolViolation("x".into()).is_transient());
        assert!(!Error::UnsupportedModel("x".into()).is_transient());
        assert!(!Error::InvalidArgument("x".into()).is_transient());
        assert!(!Error::CommunicationFailure {
            attempts: 1,
            reason: "x".into()
        }
        .is_transient());
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}
        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
