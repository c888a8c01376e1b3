//! Shared request/reply machinery for text-protocol rig backends (Kenwood,
//! Elecraft, Yaesu).
//!
//! All three families use semicolon-terminated ASCII frames and answer `ID;`
//! with a numeric identity code, so the framing, the retrying transaction
//! engine and the identification check live here once.
//!
//! # Architecture
//!
//! - [`protocol`] -- frame encode/decode with echo and byte-budget checks
//! - [`transaction`] -- one request/reply exchange with bounded retries
//! - [`identify`] -- `ID;` identity verification against a [`RigFamily`](catlink_core::RigFamily)

pub mod identify;
pub mod protocol;
pub mod transaction;

pub use identify::{verify_identity, IdentityCode};
pub use protocol::{DecodeResult, FrameCodec, Reply};
pub use transaction::{Request, RetryPolicy, Transactor};
