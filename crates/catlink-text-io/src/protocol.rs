//! Frame codec for semicolon-terminated CAT protocols.
//!
//! # Command format
//!
//! ```text
//! <token><params>;
//! ```
//!
//! - `token`: short ASCII mnemonic (`ID`, `FA`, `K2`).
//! - `params`: zero or more ASCII characters.
//! - Terminator: `;` (0x3B) for every family covered here.
//!
//! # Reply format
//!
//! Most replies echo the command token, followed by data, terminated with
//! `;`. Elecraft extension probes (`K2;`, `K3;`) are the exception: they
//! answer with a bare identity string that is not checked against the token.
//! The rig answers `?;` when it is busy or does not recognise a command.

use bytes::{BufMut, BytesMut};

use catlink_core::RigFamily;

/// CAT command/reply terminator byte.
pub const TERMINATOR: u8 = b';';

/// Body of the rig's rejection reply (`?;`).
pub const ERROR_RESPONSE: &[u8] = b"?";

/// Default byte budget for a single reply frame, terminator included.
///
/// The longest replies in the families covered (Kenwood `IF;`) are under 40
/// bytes.
pub const DEFAULT_MAX_FRAME: usize = 64;

/// A validated reply frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    body: String,
    attempts: u32,
}

impl Reply {
    /// Build a reply from its body (the text before the terminator).
    pub fn new(body: impl Into<String>) -> Self {
        Reply {
            body: body.into(),
            attempts: 1,
        }
    }

    pub(crate) fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    /// The reply text without the terminator (e.g. `"ID017"`, `"K22"`).
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Length of the frame on the wire, terminator included.
    pub fn frame_len(&self) -> usize {
        self.body.len() + 1
    }

    /// The body with the echoed `token` removed.
    ///
    /// Returns the whole body if it does not start with `token`.
    pub fn data(&self, token: &str) -> &str {
        self.body.strip_prefix(token).unwrap_or(&self.body)
    }

    /// How many attempts the transaction needed to obtain this reply.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

/// Result of attempting to decode one reply from a byte buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeResult {
    /// A complete, well-formed frame.
    Frame {
        reply: Reply,
        /// Bytes consumed from the input buffer, terminator included.
        consumed: usize,
    },

    /// The rig answered `?;`.
    Rejected(usize),

    /// The bytes cannot be a valid frame: non-ASCII content, or the byte
    /// budget was exceeded before a terminator arrived.
    Garbled(usize),

    /// A complete frame whose leading token differs from the one sent.
    EchoMismatch {
        expected: String,
        received: String,
        consumed: usize,
    },

    /// No terminator yet. More data is needed.
    Incomplete,
}

/// Encoder/decoder for one protocol family's frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameCodec {
    terminator: u8,
    max_frame: usize,
}

impl FrameCodec {
    /// A codec for the given terminator with the default byte budget.
    pub fn new(terminator: u8) -> Self {
        FrameCodec {
            terminator,
            max_frame: DEFAULT_MAX_FRAME,
        }
    }

    /// The codec a family's rigs speak.
    pub fn for_family(family: RigFamily) -> Self {
        Self::new(family.terminator())
    }

    pub fn terminator(&self) -> u8 {
        self.terminator
    }

    /// Encode a command into raw bytes ready for transmission.
    ///
    /// Concatenates the token, the parameters and the terminator. Parameter
    /// semantics are the caller's concern.
    ///
    /// # Example
    ///
    /// ```
    /// use catlink_text_io::protocol::FrameCodec;
    ///
    /// let codec = FrameCodec::new(b';');
    /// assert_eq!(codec.encode("ID", ""), b"ID;");
    /// assert_eq!(codec.encode("FA", "00014250000"), b"FA00014250000;");
    /// ```
    pub fn encode(&self, token: &str, params: &str) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(token.len() + params.len() + 1);
        buf.put_slice(token.as_bytes());
        buf.put_slice(params.as_bytes());
        buf.put_u8(self.terminator);
        buf.to_vec()
    }

    /// Attempt to decode one reply from `buf`.
    ///
    /// When `echo` is `Some(token)`, a complete frame must start with
    /// `token`; otherwise the frame body is accepted verbatim.
    ///
    /// # Example
    ///
    /// ```
    /// use catlink_text_io::protocol::{DecodeResult, FrameCodec};
    ///
    /// let codec = FrameCodec::new(b';');
    /// match codec.decode(b"ID017;", Some("ID")) {
    ///     DecodeResult::Frame { reply, consumed } => {
    ///         assert_eq!(reply.body(), "ID017");
    ///         assert_eq!(reply.data("ID"), "017");
    ///         assert_eq!(consumed, 6);
    ///     }
    ///     other => panic!("expected Frame, got {other:?}"),
    /// }
    /// ```
    pub fn decode(&self, buf: &[u8], echo: Option<&str>) -> DecodeResult {
        let term_pos = match buf.iter().position(|&b| b == self.terminator) {
            Some(pos) => pos,
            None if buf.len() >= self.max_frame => return DecodeResult::Garbled(buf.len()),
            None => return DecodeResult::Incomplete,
        };

        let consumed = term_pos + 1;
        if consumed > self.max_frame {
            return DecodeResult::Garbled(consumed);
        }

        let body = &buf[..term_pos];
        if body == ERROR_RESPONSE {
            return DecodeResult::Rejected(consumed);
        }
        let body = match std::str::from_utf8(body) {
            Ok(text) if text.is_ascii() => text.to_string(),
            _ => return DecodeResult::Garbled(consumed),
        };

        if let Some(token) = echo {
            if !body.starts_with(token) {
                return DecodeResult::EchoMismatch {
                    expected: token.to_string(),
                    received: body,
                    consumed,
                };
            }
        }

        DecodeResult::Frame {
            reply: Reply::new(body),
            consumed,
        }
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new(TERMINATOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> FrameCodec {
        FrameCodec::default()
    }

    fn frame(result: DecodeResult) -> (Reply, usize) {
        match result {
            DecodeResult::Frame { reply, consumed } => (reply, consumed),
            other => panic!("expected Frame, got {other:?}"),
        }
    }

    // ---------------------------------------------------------------
    // Encoding
    // ---------------------------------------------------------------

    #[test]
    fn encode_identify() {
        assert_eq!(codec().encode("ID", ""), b"ID;");
    }

    #[test]
    fn encode_extension_probe() {
        assert_eq!(codec().encode("K2", ""), b"K2;");
        assert_eq!(codec().encode("K3", ""), b"K3;");
    }

    #[test]
    fn encode_with_params() {
        assert_eq!(codec().encode("FA", "00007040000"), b"FA00007040000;");
    }

    #[test]
    fn encode_uses_family_terminator() {
        let codec = FrameCodec::for_family(RigFamily::Elecraft);
        assert_eq!(codec.terminator(), b';');
        assert_eq!(codec.encode("AI", "0"), b"AI0;");
    }

    // ---------------------------------------------------------------
    // Decoding
    // ---------------------------------------------------------------

    #[test]
    fn decode_identity_with_echo() {
        let (reply, consumed) = frame(codec().decode(b"ID017;", Some("ID")));
        assert_eq!(reply.body(), "ID017");
        assert_eq!(reply.frame_len(), 6);
        assert_eq!(consumed, 6);
    }

    #[test]
    fn decode_identity_with_space() {
        let (reply, _) = frame(codec().decode(b"ID 017;", Some("ID")));
        assert_eq!(reply.data("ID"), " 017");
    }

    #[test]
    fn decode_bare_probe_reply() {
        // Probe replies are not echo-checked: "K99" is still a frame.
        let (reply, consumed) = frame(codec().decode(b"K99;", None));
        assert_eq!(reply.body(), "K99");
        assert_eq!(consumed, 4);
    }

    #[test]
    fn decode_echo_mismatch() {
        assert_eq!(
            codec().decode(b"FA00014250000;", Some("ID")),
            DecodeResult::EchoMismatch {
                expected: "ID".into(),
                received: "FA00014250000".into(),
                consumed: 14,
            }
        );
    }

    #[test]
    fn decode_rejected() {
        let mut frame = ERROR_RESPONSE.to_vec();
        frame.push(TERMINATOR);
        assert_eq!(codec().decode(&frame, Some("ID")), DecodeResult::Rejected(2));
    }

    #[test]
    fn decode_incomplete() {
        assert_eq!(codec().decode(b"", None), DecodeResult::Incomplete);
        assert_eq!(codec().decode(b"ID01", Some("ID")), DecodeResult::Incomplete);
    }

    #[test]
    fn decode_non_ascii_is_garbled() {
        assert_eq!(
            codec().decode(&[0xFF, 0xFE, b';'], None),
            DecodeResult::Garbled(3)
        );
    }

    #[test]
    fn decode_over_budget_without_terminator() {
        let noise = vec![b'0'; DEFAULT_MAX_FRAME];
        assert_eq!(
            codec().decode(&noise, None),
            DecodeResult::Garbled(DEFAULT_MAX_FRAME)
        );
    }

    #[test]
    fn decode_terminator_past_budget() {
        let mut long = vec![b'0'; DEFAULT_MAX_FRAME];
        long.push(b';');
        assert_eq!(
            codec().decode(&long, None),
            DecodeResult::Garbled(DEFAULT_MAX_FRAME + 1)
        );
    }

    #[test]
    fn decode_longest_frame_within_budget() {
        let mut frame = vec![b'0'; DEFAULT_MAX_FRAME - 1];
        frame.push(b';');
        assert!(matches!(
            codec().decode(&frame, None),
            DecodeResult::Frame { consumed, .. } if consumed == DEFAULT_MAX_FRAME
        ));
    }

    #[test]
    fn decode_invalid_utf8_is_garbled() {
        // Lone continuation byte: not UTF-8, not ASCII.
        assert_eq!(
            codec().decode(&[b'I', b'D', 0x80, b';'], Some("ID")),
            DecodeResult::Garbled(4)
        );
    }

    #[test]
    fn decode_returns_first_of_several() {
        let (reply, consumed) = frame(codec().decode(b"K22;K31;", None));
        assert_eq!(reply.body(), "K22");
        assert_eq!(consumed, 4);
    }

    #[test]
    fn reply_data_without_echo_is_whole_body() {
        let reply = Reply::new("K22");
        assert_eq!(reply.data("ID"), "K22");
        assert_eq!(reply.attempts(), 1);
    }
}
