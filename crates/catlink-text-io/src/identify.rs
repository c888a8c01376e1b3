//! Rig identification via the `ID;` command.
//!
//! Kenwood-style rigs answer `ID;` with `ID<code>;`, where `<code>` is a
//! fixed-width numeric model code. Some firmware inserts one space after the
//! echo (`ID 017;`). An unexpected code means the wrong rig (or the wrong
//! backend) is on the port; that is a protocol violation, never a transient
//! fault.

use std::fmt;

use tracing::{debug, trace};

use catlink_core::error::{Error, Result};
use catlink_core::RigFamily;

use crate::transaction::{Request, Transactor};

/// The identification command token.
pub const IDENTIFY_COMMAND: &str = "ID";

/// A verified identity code (e.g. `"017"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityCode(String);

impl IdentityCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validate an `ID` reply body (terminator already stripped) for `family`.
///
/// The body must be at least the 2-character echo plus the family's code
/// width. One space after the echo is skipped, then the remainder must equal
/// one of the family's identity codes exactly.
pub fn parse_identity(body: &str, family: RigFamily) -> Result<IdentityCode> {
    let min_len = IDENTIFY_COMMAND.len() + family.identity_width();
    if body.len() < min_len || !body.is_ascii() {
        trace!(reply = body, "unknown ID type");
        return Err(Error::ProtocolViolation(format!(
            "identification reply {body:?} shorter than {min_len} characters"
        )));
    }

    let code = &body[IDENTIFY_COMMAND.len()..];
    let code = code.strip_prefix(' ').unwrap_or(code);

    if family.identity_codes().contains(&code) {
        trace!(reply = body, %family, "rig ID verified");
        Ok(IdentityCode(code.to_string()))
    } else {
        trace!(reply = body, %family, "rig ID not recognised");
        Err(Error::ProtocolViolation(format!(
            "rig reported ID {code:?}, which is not a {family} rig"
        )))
    }
}

/// Issue `ID;` through the engine and verify the reply against the
/// engine's rig family.
///
/// Retries happen inside the engine; nothing is retried here.
pub async fn verify_identity(engine: &mut Transactor) -> Result<IdentityCode> {
    let family = engine.family();
    debug!(%family, "verifying rig identity");

    let reply = engine.transact(&Request::new(IDENTIFY_COMMAND)).await?;
    parse_identity(reply.body(), family)
}
