//! Elecraft CAT request builders and reply parsers.
//!
//! All functions are pure: they produce [`Request`]s or consume reply data
//! without performing any I/O. Frequencies are always 11 ASCII digits in
//! hertz, zero-padded on the left.

use catlink_core::{Error, Result};
use catlink_text_io::Request;

use crate::extension::SubDevice;

/// Frame length of an extension probe reply (`K22;`), terminator included.
pub const PROBE_REPLY_LEN: usize = 4;

/// Number of digits in an `FA`/`FB` frequency field.
pub const FREQUENCY_DIGITS: usize = 11;

/// Largest frequency representable in [`FREQUENCY_DIGITS`] digits.
pub const MAX_FREQUENCY_HZ: u64 = 99_999_999_999;

/// `K2;` / `K3;` -- extension level probe.
///
/// Probe replies are a bare identity string checked only for length; a
/// string outside the capability table is a valid "no extension" answer.
pub fn cmd_probe_extension(sub: SubDevice) -> Request<'static> {
    Request::new(sub.probe_token())
        .bare_reply()
        .expect_len(PROBE_REPLY_LEN)
}

/// `FA;` -- read VFO-A frequency.
pub fn cmd_read_frequency_a() -> Request<'static> {
    Request::new("FA")
}

/// Format `freq_hz` as the 11-digit `FA`/`FB` parameter.
pub fn format_frequency(freq_hz: u64) -> Result<String> {
    if freq_hz > MAX_FREQUENCY_HZ {
        return Err(Error::InvalidArgument(format!(
            "frequency {freq_hz} Hz does not fit in {FREQUENCY_DIGITS} digits"
        )));
    }
    Ok(format!("{freq_hz:011}"))
}

/// `FA<11 digits>;` -- set VFO-A frequency. Takes the pre-formatted digits
/// from [`format_frequency`] so the request can borrow them.
pub fn cmd_set_frequency_a(digits: &str) -> Request<'_> {
    Request::new("FA").params(digits)
}

/// Parse the data portion of an `FA`/`FB` reply.
pub fn parse_frequency(data: &str) -> Result<u64> {
    if data.len() != FREQUENCY_DIGITS || !data.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::ProtocolViolation(format!(
            "expected {FREQUENCY_DIGITS} digits for frequency, got {data:?}"
        )));
    }
    data.parse::<u64>()
        .map_err(|e| Error::ProtocolViolation(format!("invalid frequency digits: {data:?} ({e})")))
}
