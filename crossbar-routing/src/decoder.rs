//! Identifier decoding.
//!
//! An identifier has the form `prefix:hexpayload`: an arbitrary prefix, one
//! `:` separator, and a base-16 payload of at most 64 bits. The payload is
//! parsed as unsigned hex and stored into a signed 64-bit key, so payloads
//! above `i64::MAX` wrap negative by two's complement. That wraparound is
//! part of the contract, not rejected here.

use std::fmt;

use crossbar_core::RouteKey;

/// Errors from identifier decoding.
///
/// Both variants are the malformed-identifier failure class: the input did
/// not match the `prefix:hexpayload` shape. Decoding failures are local and
/// synchronous; they indicate a malformed request, never a transient
/// condition, and are not retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The identifier did not split into exactly two `:`-separated parts.
    SeparatorCount {
        /// The identifier that failed to split.
        identifier: String,
        /// The number of parts found.
        parts: usize,
    },
    /// The payload is not valid unsigned 64-bit hexadecimal.
    InvalidPayload {
        /// The payload that failed to parse.
        payload: String,
    },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SeparatorCount { identifier, parts } => {
                write!(
                    f,
                    "malformed identifier {identifier:?}: expected 2 colon-separated parts, found {parts}"
                )
            }
            Self::InvalidPayload { payload } => {
                write!(f, "malformed identifier payload {payload:?}: not 64-bit hexadecimal")
            }
        }
    }
}

impl std::error::Error for DecodeError {}

/// Decodes a message identifier into its numeric routing key.
///
/// Pure function: equal inputs always produce equal keys.
///
/// # Errors
///
/// Returns `DecodeError::SeparatorCount` if the identifier does not contain
/// exactly one `:`, and `DecodeError::InvalidPayload` if the payload has
/// non-hex characters, a sign prefix, or overflows 64 bits.
pub fn decode_identifier(identifier: &str) -> Result<RouteKey, DecodeError> {
    let parts: Vec<&str> = identifier.split(':').collect();
    if parts.len() != 2 {
        return Err(DecodeError::SeparatorCount {
            identifier: identifier.to_string(),
            parts: parts.len(),
        });
    }

    let payload = parts[1];

    // `from_str_radix` tolerates a leading `+`; the payload is hex digits
    // only, so reject sign characters before parsing.
    if payload.starts_with('+') {
        return Err(DecodeError::InvalidPayload {
            payload: payload.to_string(),
        });
    }

    match u64::from_str_radix(payload, 16) {
        // Unsigned parse into a signed container: values above i64::MAX
        // appear negative by two's-complement wraparound.
        #[allow(clippy::cast_possible_wrap)]
        Ok(raw) => Ok(RouteKey::new(raw as i64)),
        Err(_) => Err(DecodeError::InvalidPayload {
            payload: payload.to_string(),
        }),
    }
}
