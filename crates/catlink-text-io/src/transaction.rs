//! The transaction engine: one CAT request/reply exchange with bounded
//! retries.
//!
//! [`Transactor`] owns the transport exclusively. Each call to
//! [`Transactor::transact`] flushes stale input, writes the encoded frame and
//! reads until a terminator or the per-attempt timeout.
//!
//! Failures fall into two classes:
//!
//! - **Transient** -- link errors, timeouts, short or garbled frames, and the
//!   rig's `?;` busy reply. The partial read is discarded, the engine sleeps
//!   the policy backoff and tries again. Once [`RetryPolicy::max_attempts`]
//!   attempts have failed the caller gets
//!   [`Error::CommunicationFailure`].
//! - **Fatal** -- a complete frame that means the wrong thing (unmatched echo,
//!   wrong length), a closed transport, or invalid input. These surface
//!   immediately; retrying cannot fix a model or firmware mismatch.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, error, trace};

use catlink_core::error::{Error, Result};
use catlink_core::transport::Transport;
use catlink_core::RigFamily;

use crate::protocol::{DecodeResult, FrameCodec, Reply};

/// Default per-attempt read timeout.
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_millis(500);

/// How long [`Transactor::execute`] listens for a `?;` after a set command.
pub const DEFAULT_SET_DRAIN: Duration = Duration::from_millis(50);

/// Retry budget for a transaction.
///
/// `max_attempts` counts every attempt, including the first, and is never
/// zero. The delay before attempt `n` (1-based) is `backoff * (n - 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Duration,
}

impl RetryPolicy {
    /// Build a policy, rejecting a zero attempt budget.
    pub fn new(max_attempts: u32, backoff: Duration) -> Result<Self> {
        if max_attempts == 0 {
            return Err(Error::InvalidArgument(
                "retry policy needs at least one attempt".into(),
            ));
        }
        Ok(RetryPolicy {
            max_attempts,
            backoff,
        })
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn backoff(&self) -> Duration {
        self.backoff
    }

    fn delay_before(&self, attempt: u32) -> Duration {
        self.backoff * attempt.saturating_sub(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            backoff: Duration::from_millis(20),
        }
    }
}

/// An outgoing command and how its reply must look.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request<'a> {
    token: &'a str,
    params: &'a str,
    expected_len: Option<usize>,
    check_echo: bool,
    max_attempts: Option<u32>,
}

impl<'a> Request<'a> {
    /// A bare command (`<token>;`) whose reply must echo `token`.
    pub fn new(token: &'a str) -> Self {
        Request {
            token,
            params: "",
            expected_len: None,
            check_echo: true,
            max_attempts: None,
        }
    }

    /// Append parameters after the token.
    pub fn params(mut self, params: &'a str) -> Self {
        self.params = params;
        self
    }

    /// Require the reply frame to be exactly `len` bytes, terminator
    /// included.
    pub fn expect_len(mut self, len: usize) -> Self {
        self.expected_len = Some(len);
        self
    }

    /// Accept a reply that does not echo the token.
    pub fn bare_reply(mut self) -> Self {
        self.check_echo = false;
        self
    }

    /// Override the engine's attempt budget for this request only.
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    pub fn token(&self) -> &str {
        self.token
    }

    fn validate(&self, terminator: u8) -> Result<()> {
        if self.token.is_empty() {
            return Err(Error::InvalidArgument("command token is empty".into()));
        }
        for (what, text) in [("token", self.token), ("parameters", self.params)] {
            if !text.is_ascii() {
                return Err(Error::InvalidArgument(format!(
                    "command {what} must be ASCII: {text:?}"
                )));
            }
            if text.as_bytes().contains(&terminator) {
                return Err(Error::InvalidArgument(format!(
                    "command {what} contains the frame terminator: {text:?}"
                )));
            }
        }
        if self.expected_len == Some(0) {
            return Err(Error::InvalidArgument(
                "expected reply length must be non-zero".into(),
            ));
        }
        if self.max_attempts == Some(0) {
            return Err(Error::InvalidArgument(
                "attempt budget must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

/// Outcome of one failed attempt.
enum Fault {
    /// Worth another attempt.
    Transient(String),
    /// Surface to the caller immediately.
    Fatal(Error),
}

impl From<Error> for Fault {
    fn from(e: Error) -> Self {
        if e.is_transient() {
            Fault::Transient(e.to_string())
        } else {
            Fault::Fatal(e)
        }
    }
}

/// One kind of exchange the retry loop can drive.
trait Exchange {
    type Output;

    /// Name used in log events.
    const KIND: &'static str;

    async fn attempt(
        engine: &mut Transactor,
        frame: &[u8],
        request: &Request<'_>,
    ) -> std::result::Result<Self::Output, Fault>;

    fn finish(output: Self::Output, _attempts: u32) -> Self::Output {
        output
    }
}

/// Command with a reply.
struct Query;

impl Exchange for Query {
    type Output = Reply;
    const KIND: &'static str = "query";

    async fn attempt(
        engine: &mut Transactor,
        frame: &[u8],
        request: &Request<'_>,
    ) -> std::result::Result<Reply, Fault> {
        engine.read_reply(frame, request).await
    }

    fn finish(reply: Reply, attempts: u32) -> Reply {
        reply.with_attempts(attempts)
    }
}

/// Command with no reply on success.
struct Set;

impl Exchange for Set {
    type Output = ();
    const KIND: &'static str = "set";

    async fn attempt(
        engine: &mut Transactor,
        frame: &[u8],
        request: &Request<'_>,
    ) -> std::result::Result<(), Fault> {
        engine.drain_set(frame, request).await
    }
}

/// Request/reply engine over one exclusively owned transport.
pub struct Transactor {
    transport: Box<dyn Transport>,
    family: RigFamily,
    codec: FrameCodec,
    policy: RetryPolicy,
    attempt_timeout: Duration,
    set_drain: Duration,
}

impl Transactor {
    /// Create an engine speaking `family`'s framing with the default policy.
    pub fn new(transport: Box<dyn Transport>, family: RigFamily) -> Self {
        Transactor {
            transport,
            family,
            codec: FrameCodec::for_family(family),
            policy: RetryPolicy::default(),
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
            set_drain: DEFAULT_SET_DRAIN,
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    /// Override the window [`execute`](Self::execute) waits for a rejection.
    pub fn with_set_drain(mut self, drain: Duration) -> Self {
        self.set_drain = drain;
        self
    }

    pub fn family(&self) -> RigFamily {
        self.family
    }

    /// Close the underlying transport.
    pub async fn close(&mut self) -> Result<()> {
        self.transport.close().await
    }

    /// Perform one logical exchange.
    ///
    /// Returns the validated reply, or the first fatal error, or
    /// [`Error::CommunicationFailure`] once the attempt budget is spent.
    pub async fn transact(&mut self, request: &Request<'_>) -> Result<Reply> {
        self.run::<Query>(request).await
    }

    /// Send a command that produces no reply on success (a "set").
    ///
    /// After each write the engine listens for [`DEFAULT_SET_DRAIN`] (or the
    /// configured window). Silence or any other frame counts as acceptance;
    /// `?;` is retried like any transient fault.
    pub async fn execute(&mut self, request: &Request<'_>) -> Result<()> {
        self.run::<Set>(request).await
    }

    /// The retry loop shared by every exchange kind.
    async fn run<E: Exchange>(&mut self, request: &Request<'_>) -> Result<E::Output> {
        request.validate(self.codec.terminator())?;

        let frame = self.codec.encode(request.token, request.params);
        let max_attempts = request.max_attempts.unwrap_or(self.policy.max_attempts);
        let mut last_fault = String::new();

        for attempt in 1..=max_attempts {
            if attempt > 1 {
                let delay = self.policy.delay_before(attempt);
                debug!(
                    command = request.token,
                    exchange = E::KIND,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    reason = %last_fault,
                    "retrying CAT command"
                );
                tokio::time::sleep(delay).await;
            }

            match E::attempt(self, &frame, request).await {
                Ok(output) => {
                    trace!(
                        command = request.token,
                        exchange = E::KIND,
                        attempt,
                        "CAT transaction complete"
                    );
                    return Ok(E::finish(output, attempt));
                }
                Err(Fault::Transient(reason)) => last_fault = reason,
                Err(Fault::Fatal(e)) => {
                    error!(command = request.token, attempt, error = %e, "CAT transaction failed");
                    return Err(e);
                }
            }
        }

        error!(
            command = request.token,
            exchange = E::KIND,
            attempts = max_attempts,
            reason = %last_fault,
            "CAT transaction retries exhausted"
        );
        Err(Error::CommunicationFailure {
            attempts: max_attempts,
            reason: last_fault,
        })
    }

    /// One set-command cycle: write, then watch the drain window for `?;`.
    async fn drain_set(&mut self, frame: &[u8], request: &Request<'_>) -> std::result::Result<(), Fault> {
        self.transport.flush().await?;
        self.transport.send(frame).await?;

        let deadline = Instant::now() + self.set_drain;
        let mut recv_buf = [0u8; 64];
        let mut drain_buf = Vec::new();

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(());
            }

            match self.transport.receive(&mut recv_buf, remaining).await {
                Ok(0) | Err(Error::Timeout) => return Ok(()),
                Ok(n) => drain_buf.extend_from_slice(&recv_buf[..n]),
                Err(e) => return Err(e.into()),
            }

            match self.codec.decode(&drain_buf, None) {
                DecodeResult::Rejected(_) => {
                    return Err(Fault::Transient(format!(
                        "rig rejected {} (?;)",
                        request.token
                    )));
                }
                DecodeResult::Incomplete => {}
                _ => return Ok(()),
            }
        }
    }

    /// One send-and-read cycle.
    async fn read_reply(&mut self, frame: &[u8], request: &Request<'_>) -> std::result::Result<Reply, Fault> {
        self.transport.flush().await?;
        self.transport.send(frame).await?;

        let echo = request.check_echo.then_some(request.token);
        let deadline = Instant::now() + self.attempt_timeout;
        let mut recv_buf = [0u8; 64];
        let mut response_buf = Vec::new();

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(short_reply(&response_buf));
            }

            let n = match self.transport.receive(&mut recv_buf, remaining).await {
                Ok(0) => return Err(Fault::Transient("link returned end of stream".into())),
                Ok(n) => n,
                Err(Error::Timeout) => return Err(short_reply(&response_buf)),
                Err(e) => return Err(e.into()),
            };
            response_buf.extend_from_slice(&recv_buf[..n]);

            match self.codec.decode(&response_buf, echo) {
                DecodeResult::Frame { reply, .. } => {
                    if let Some(expected) = request.expected_len {
                        if reply.frame_len() != expected {
                            return Err(Fault::Fatal(Error::ProtocolViolation(format!(
                                "wrong reply length for {}: expected {expected}, got {} ({:?})",
                                request.token,
                                reply.frame_len(),
                                reply.body()
                            ))));
                        }
                    }
                    trace!(command = request.token, reply = reply.body(), "reply received");
                    return Ok(reply);
                }
                DecodeResult::EchoMismatch {
                    expected, received, ..
                } => {
                    return Err(Fault::Fatal(Error::ProtocolViolation(format!(
                        "reply {received:?} does not echo command {expected}"
                    ))));
                }
                DecodeResult::Rejected(_) => {
                    return Err(Fault::Transient(format!(
                        "rig rejected {} (?;)",
                        request.token
                    )));
                }
                DecodeResult::Garbled(_) => {
                    return Err(Fault::Transient(format!(
                        "garbled reply: {:?}",
                        String::from_utf8_lossy(&response_buf)
                    )));
                }
                DecodeResult::Incomplete => {}
            }
        }
    }
}

fn short_reply(partial: &[u8]) -> Fault {
    if partial.is_empty() {
        Fault::Transient(Error::Timeout.to_string())
    } else {
        Fault::Transient(format!(
            "short reply before timeout: {:?}",
            String::from_utf8_lossy(partial)
        ))
    }
}
