//! The routable message unit.
//!
//! A `RouteMessage` pairs the opaque textual identifier used for
//! classification with an opaque payload delivered to the addressed entity.
//! The routing layer reads the identifier and never touches the payload.

use bytes::Bytes;

/// A message entering the routing fabric.
///
/// The identifier has the form `prefix:hexpayload` where the prefix is
/// arbitrary and the payload is base-16. Decoding rules live in
/// `crossbar-routing`; this type carries the text verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMessage {
    /// The opaque textual identifier supplied by the caller.
    pub identifier: String,
    /// The payload, never inspected or rewritten by the routing layer.
    pub payload: Bytes,
}

impl RouteMessage {
    /// Creates a new route message.
    #[must_use]
    pub fn new(identifier: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            identifier: identifier.into(),
            payload: payload.into(),
        }
    }
}
